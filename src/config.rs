use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;
use rekog_vision::{CropParams, DetectParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::matcher::MatchParams;

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("", "", "rekog"));

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| match option_env!("REKOG_CONFIG_PATH") {
    Some(p) => PathBuf::from(p),
    None => PROJECT_DIRS
        .as_ref()
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("rekog.toml")),
});

pub static DATA_PREFIX: Lazy<PathBuf> = Lazy::new(|| match option_env!("REKOG_DATA_PREFIX") {
    Some(p) => PathBuf::from(p),
    None => PROJECT_DIRS
        .as_ref()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")),
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Largest euclidean distance still accepted as a match.
    pub threshold: f32,
    /// Distance the nearest-neighbour scan starts from.
    pub initial_distance: f32,
    pub embeddings_dir: PathBuf,
    pub media_root: PathBuf,
    pub detector_model: PathBuf,
    pub embedding_model: PathBuf,
    pub image_size: u32,
    pub margin: u32,
    pub min_face_size: u32,
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub allowed_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 1.1,
            initial_distance: 100.0,
            embeddings_dir: DATA_PREFIX.join("embeddings"),
            media_root: DATA_PREFIX.join("media"),
            detector_model: DATA_PREFIX.join("models/face_detection_yunet_2023mar.onnx"),
            embedding_model: DATA_PREFIX.join("models/facenet"),
            image_size: 160,
            margin: 44,
            min_face_size: 20,
            score_threshold: 0.6,
            nms_threshold: 0.3,
            allowed_extensions: ["png", "jpg", "jpeg", "gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn match_params(&self) -> MatchParams {
        MatchParams {
            threshold: self.threshold,
            initial_distance: self.initial_distance,
        }
    }

    pub fn crop_params(&self) -> CropParams {
        CropParams {
            margin: self.margin,
            image_size: self.image_size,
        }
    }

    pub fn detect_params(&self) -> DetectParams {
        DetectParams {
            score_threshold: self.score_threshold,
            nms_threshold: self.nms_threshold,
            min_face_size: self.min_face_size,
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.media_root.join("uploads")
    }

    fn expand_paths(mut self) -> Self {
        for p in [
            &mut self.embeddings_dir,
            &mut self.media_root,
            &mut self.detector_model,
            &mut self.embedding_model,
        ] {
            *p = expand_tilde(p);
        }
        self
    }
}

/// Replace a leading `~` with the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg.expand_paths())
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
