use serde::Serialize;
use std::fmt;

use crate::matcher::{self, MatchError, MatchParams, MatchResult};
use crate::{Embedding, FaceCrop, Gallery};

/// What happened to one detected face.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FaceOutcome {
    Matched { name: String, distance: f32 },
    Unknown,
    Error { message: String },
}

impl From<Result<MatchResult, MatchError>> for FaceOutcome {
    fn from(result: Result<MatchResult, MatchError>) -> Self {
        match result {
            Ok(MatchResult::Matched { name, distance }) => FaceOutcome::Matched { name, distance },
            Ok(MatchResult::Unknown) => FaceOutcome::Unknown,
            Err(e) => FaceOutcome::Error {
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceReport {
    pub bbox: [u32; 4],
    pub score: f32,
    #[serde(flatten)]
    pub outcome: FaceOutcome,
}

impl FaceReport {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, FaceOutcome::Error { .. })
    }
}

impl fmt::Display for FaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            FaceOutcome::Matched { name, distance } => {
                write!(f, "{:?} {} (distance {:.3})", self.bbox, name, distance)
            }
            FaceOutcome::Unknown => write!(f, "{:?} {}", self.bbox, matcher::UNKNOWN),
            FaceOutcome::Error { message } => write!(f, "{:?} error: {}", self.bbox, message),
        }
    }
}

/// Identify every face independently; a failure on one face does not
/// affect the others.
pub fn identify_faces(
    faces: &[(FaceCrop, Embedding)],
    gallery: &Gallery,
    params: &MatchParams,
) -> Vec<FaceReport> {
    faces
        .iter()
        .map(|(face, embedding)| {
            let result = matcher::identify(embedding, gallery, params);
            if let Err(e) = &result {
                log::warn!("face at {:?}: {}", face.bbox, e);
            }
            FaceReport {
                bbox: face.bbox,
                score: face.score,
                outcome: result.into(),
            }
        })
        .collect()
}
