use crate::{embedding::Embedding, preprocess};
use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;
use ort::{session::Session, value::Value};
use std::path::Path;

/// FaceNet-style embedding network.
///
/// Input is a prewhitened RGB crop laid out NHWC as `[1, S, S, 3]`; the first
/// output is taken as the embedding.
pub struct FaceEmbedder {
    session: Session,
    input_size: u32,
}

impl FaceEmbedder {
    pub fn new(session: Session, input_size: u32) -> Self {
        Self {
            session,
            input_size,
        }
    }

    pub fn load(model: &Path, input_size: u32) -> Result<Self> {
        let session = crate::model::load_session(model).context("load embedding model")?;
        Ok(Self::new(session, input_size))
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn embed(&mut self, face: &DynamicImage) -> Result<Embedding> {
        let input = Value::from_array(prepare_input(face, self.input_size)?)?;
        let outputs = self.session.run(ort::inputs![input])?;
        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;

        // [1, D] or [D]
        let dim = match shape.len() {
            2 => shape[1] as usize,
            _ => data.len(),
        };
        if dim == 0 || dim > data.len() {
            anyhow::bail!(
                "embedding model returned shape {:?}",
                shape.iter().collect::<Vec<_>>()
            );
        }
        Ok(Embedding::from_vec(data[..dim].to_vec()))
    }
}

/// Resize and prewhiten a face crop into a `[1, size, size, 3]` tensor.
pub fn prepare_input(face: &DynamicImage, size: u32) -> Result<Array4<f32>> {
    let resized = face.resize_exact(size, size, FilterType::Triangle);
    let whitened = preprocess::prewhiten(&preprocess::to_hwc(&resized)?);
    Ok(whitened.insert_axis(ndarray::Axis(0)))
}
