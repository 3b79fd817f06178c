use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::Path;

use crate::{
    crop::{self, CropParams, FaceCrop},
    detector::{DetectParams, FaceDetector},
    embedder::FaceEmbedder,
    embedding::Embedding,
};

/// Full pipeline: detect faces → crop with margin → embed
pub struct Pipeline {
    pub detector: FaceDetector,
    pub embedder: FaceEmbedder,
    pub crop: CropParams,
}

impl Pipeline {
    pub fn load(
        detector_model: &Path,
        embedding_model: &Path,
        detect: DetectParams,
        crop: CropParams,
    ) -> Result<Self> {
        Ok(Self {
            detector: FaceDetector::load(detector_model, detect)?,
            embedder: FaceEmbedder::load(embedding_model, crop.image_size)?,
            crop,
        })
    }

    /// All faces in the image, strongest detection first.
    pub fn faces(&mut self, img: &DynamicImage) -> Result<Vec<FaceCrop>> {
        let detections = self.detector.detect(img).context("detecting faces")?;
        Ok(crop::crop_faces(img, &detections, self.crop))
    }

    pub fn embed(&mut self, face: &FaceCrop) -> Result<Embedding> {
        self.embedder.embed(&face.image).context("encoding face")
    }

    /// Detect, crop and embed every face in the image.
    pub fn process_image(&mut self, img: &DynamicImage) -> Result<Vec<(FaceCrop, Embedding)>> {
        let faces = self.faces(img)?;
        let mut out = Vec::with_capacity(faces.len());
        for face in faces {
            let embedding = self.embed(&face)?;
            out.push((face, embedding));
        }
        Ok(out)
    }

    /// Embedding of the strongest face in the image.
    pub fn best_face(&mut self, img: &DynamicImage) -> Result<(FaceCrop, Embedding)> {
        let face = self
            .faces(img)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No face detected in image"))?;
        let embedding = self.embed(&face)?;
        Ok((face, embedding))
    }
}
