use rekog::{identify, Embedding, Gallery, MatchError, MatchParams, MatchResult};

fn emb(v: &[f32]) -> Embedding {
    Embedding::from_vec(v.to_vec())
}

fn gallery<const N: usize>(entries: &[(&str, [f32; N])]) -> Gallery {
    entries.iter().map(|(n, v)| (*n, emb(v))).collect()
}

#[test]
fn empty_gallery_is_unknown() {
    let params = MatchParams::default();
    for q in [vec![0.0f32; 3], vec![5.0; 128], vec![]] {
        let r = identify(&emb(&q), &Gallery::new(), &params).unwrap();
        assert_eq!(r, MatchResult::Unknown);
    }
}

#[test]
fn nearest_within_threshold_is_matched() {
    let g = gallery(&[("alice", [0.0, 0.0, 0.0]), ("bob", [10.0, 10.0, 10.0])]);
    let r = identify(&emb(&[0.1, 0.0, 0.0]), &g, &MatchParams::default()).unwrap();
    match r {
        MatchResult::Matched { name, distance } => {
            assert_eq!(name, "alice");
            assert!((distance - 0.1).abs() < 1e-6);
        }
        other => panic!("expected alice, got {:?}", other),
    }
}

#[test]
fn nearest_beyond_threshold_is_unknown() {
    let g = gallery(&[("alice", [5.0, 5.0, 5.0])]);
    let r = identify(&emb(&[0.0, 0.0, 0.0]), &g, &MatchParams::default()).unwrap();
    assert_eq!(r, MatchResult::Unknown);
    assert_eq!(r.to_string(), "Unknown");
}

#[test]
fn exact_match_returns_that_name() {
    let g = gallery(&[
        ("carol", [0.3, 0.2, 0.9]),
        ("dave", [0.1, -0.4, 0.5]),
        ("erin", [0.7, 0.7, 0.0]),
    ]);
    let r = identify(&emb(&[0.1, -0.4, 0.5]), &g, &MatchParams::default()).unwrap();
    assert_eq!(
        r,
        MatchResult::Matched {
            name: "dave".into(),
            distance: 0.0
        }
    );
}

#[test]
fn threshold_is_inclusive() {
    let params = MatchParams::default();
    let q = emb(&[0.0]);

    let at = gallery(&[("edge", [1.1])]);
    assert_eq!(identify(&q, &at, &params).unwrap().name(), Some("edge"));

    let past = gallery(&[("edge", [1.1000001])]);
    assert_eq!(identify(&q, &past, &params).unwrap(), MatchResult::Unknown);
}

#[test]
fn threshold_is_configurable() {
    let g = gallery(&[("alice", [5.0, 5.0, 5.0])]);
    let loose = MatchParams {
        threshold: 9.0,
        ..MatchParams::default()
    };
    let r = identify(&emb(&[0.0, 0.0, 0.0]), &g, &loose).unwrap();
    assert_eq!(r.name(), Some("alice"));
}

#[test]
fn matched_name_is_a_gallery_key_and_results_are_deterministic() {
    let g = gallery(&[
        ("a", [0.0, 1.0]),
        ("b", [1.0, 0.0]),
        ("c", [0.5, 0.5]),
        ("d", [-1.0, 0.2]),
    ]);
    let params = MatchParams::default();
    for q in [[0.1f32, 0.9], [0.9, 0.05], [0.4, 0.6], [-0.8, 0.1], [3.0, 3.0]] {
        let q = emb(&q);
        let first = identify(&q, &g, &params).unwrap();
        if let Some(name) = first.name() {
            assert!(g.contains(name));
        }
        for _ in 0..3 {
            assert_eq!(identify(&q, &g, &params).unwrap(), first);
        }
    }
}

#[test]
fn mismatched_dimensions_are_reported_not_matched() {
    let g = gallery(&[("alice", [0.0, 0.0, 0.0])]);
    let err = identify(&emb(&[0.0, 0.0]), &g, &MatchParams::default()).unwrap_err();
    let MatchError::DimensionMismatch {
        name,
        expected,
        found,
    } = err;
    assert_eq!((name.as_str(), expected, found), ("alice", 2, 3));
}

#[test]
fn inputs_are_left_untouched() {
    let g = gallery(&[("alice", [1.0, 2.0])]);
    let before = g.clone();
    let q = emb(&[1.0, 2.0]);
    identify(&q, &g, &MatchParams::default()).unwrap();
    assert_eq!(g, before);
    assert_eq!(q, emb(&[1.0, 2.0]));
}
