pub mod config;
pub mod gallery;
pub mod matcher;
pub mod media;
pub mod report;
pub mod storage;
pub mod timeline;
pub mod uploads;

// Re-export vision types for convenience
pub use gallery::Gallery;
pub use matcher::{identify, MatchError, MatchParams, MatchResult};
pub use rekog_vision::{crop, detector, embedder, model, pipeline, preprocess};
pub use rekog_vision::{Detection, Embedding, FaceCrop, Pipeline};
