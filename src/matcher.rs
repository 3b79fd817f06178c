use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::{gallery::Gallery, Embedding};

/// Label shown when no gallery entry is close enough.
pub const UNKNOWN: &str = "Unknown";

/// Acceptance rule for nearest-neighbour identification.
///
/// Both values depend on the embedding model that produced the gallery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchParams {
    /// Largest distance still accepted as the same person (inclusive).
    pub threshold: f32,
    /// Starting best distance for the scan. Entries at or beyond it are never
    /// considered.
    pub initial_distance: f32,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            threshold: 1.1,
            initial_distance: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    Matched { name: String, distance: f32 },
    Unknown,
}

impl MatchResult {
    pub fn name(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { name, .. } => Some(name),
            MatchResult::Unknown => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Matched { name, .. } => f.write_str(name),
            MatchResult::Unknown => f.write_str(UNKNOWN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("embedding for {name:?} has {found} dimensions, query has {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Nearest gallery entry closer than `initial_distance`, with its distance.
///
/// Ties keep the entry seen first.
pub fn nearest<'g>(
    query: &Embedding,
    gallery: &'g Gallery,
    initial_distance: f32,
) -> Result<Option<(&'g str, f32)>, MatchError> {
    let expected = query.dim();
    if let Some(bad) = gallery.iter().find(|e| e.embedding.dim() != expected) {
        return Err(MatchError::DimensionMismatch {
            name: bad.name.clone(),
            expected,
            found: bad.embedding.dim(),
        });
    }

    let mut best_distance = initial_distance;
    let mut best_name = None;
    for entry in gallery {
        let distance = query.euclidean_distance(&entry.embedding);
        if distance < best_distance {
            best_distance = distance;
            best_name = Some(entry.name.as_str());
        }
    }

    Ok(best_name.map(|name| (name, best_distance)))
}

/// Identify `query` against `gallery`.
pub fn identify(
    query: &Embedding,
    gallery: &Gallery,
    params: &MatchParams,
) -> Result<MatchResult, MatchError> {
    let result = match nearest(query, gallery, params.initial_distance)? {
        Some((name, distance)) if distance <= params.threshold => MatchResult::Matched {
            name: name.to_string(),
            distance,
        },
        _ => MatchResult::Unknown,
    };
    log::debug!("identify over {} entries: {:?}", gallery.len(), result);
    Ok(result)
}
