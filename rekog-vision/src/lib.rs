pub mod crop;
pub mod detector;
pub mod embedder;
pub mod embedding;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod yunet;

// Re-export commonly used types
pub use crop::{CropParams, FaceCrop};
pub use detector::{DetectParams, Detection, FaceDetector};
pub use embedder::FaceEmbedder;
pub use embedding::Embedding;
pub use pipeline::Pipeline;
