use anyhow::{Context, Result};
#[cfg(any(feature = "openvino", feature = "cuda"))]
use ort::ep::{self, ExecutionProvider};
use ort::session::{
    builder::{GraphOptimizationLevel, SessionBuilder},
    Session,
};
use std::path::{Path, PathBuf};

pub fn session_builder() -> Result<SessionBuilder> {
    #[allow(unused_mut)]
    let mut builder =
        Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

    #[cfg(feature = "openvino")]
    {
        let ep = ep::OpenVINO::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("openvino feature is enabled, onnx runtime not compiled with openvino")
        }
    }

    #[cfg(feature = "cuda")]
    {
        let ep = ep::CUDA::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("cuda feature is enabled, onnx runtime not compiled with cuda")
        }
    }

    Ok(builder)
}

/// Find the model file behind `path`.
///
/// A file is returned as-is. A directory must hold exactly one `.onnx` file.
pub fn resolve_model_file(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.is_dir() {
        anyhow::bail!("model path {} does not exist", path.display());
    }

    let mut found = Vec::new();
    for entry in
        std::fs::read_dir(path).with_context(|| format!("reading {}", path.display()))?
    {
        let candidate = entry?.path();
        let is_onnx = candidate
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("onnx"))
            .unwrap_or(false);
        if is_onnx && candidate.is_file() {
            found.push(candidate);
        }
    }

    match found.len() {
        0 => anyhow::bail!("no .onnx model found in {}", path.display()),
        1 => Ok(found.remove(0)),
        n => anyhow::bail!(
            "{} .onnx models found in {}, expected exactly one",
            n,
            path.display()
        ),
    }
}

/// Load an ONNX model from a file or a directory holding one.
pub fn load_session(path: &Path) -> Result<Session> {
    let file = resolve_model_file(path)?;
    log::debug!("loading model {}", file.display());
    session_builder()?
        .commit_from_file(&file)
        .with_context(|| format!("load model {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rekog-vision-model-{}-{}",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolve_file() {
        let dir = scratch_dir("file");
        let file = dir.join("detector.onnx");
        std::fs::write(&file, b"x").unwrap();
        assert_eq!(resolve_model_file(&file).unwrap(), file);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_resolve_directory_with_single_model() {
        let dir = scratch_dir("single");
        std::fs::write(dir.join("facenet.onnx"), b"x").unwrap();
        std::fs::write(dir.join("README.txt"), b"notes").unwrap();
        assert_eq!(resolve_model_file(&dir).unwrap(), dir.join("facenet.onnx"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_resolve_directory_rejects_ambiguous_or_empty() {
        let empty = scratch_dir("empty");
        assert!(resolve_model_file(&empty).is_err());

        let many = scratch_dir("many");
        std::fs::write(many.join("a.onnx"), b"x").unwrap();
        std::fs::write(many.join("b.onnx"), b"x").unwrap();
        assert!(resolve_model_file(&many).is_err());

        std::fs::remove_dir_all(&empty).unwrap();
        std::fs::remove_dir_all(&many).unwrap();
    }

    #[test]
    fn test_resolve_missing_path() {
        let missing = std::env::temp_dir().join("rekog-vision-model-does-not-exist.onnx");
        assert!(resolve_model_file(&missing).is_err());
    }
}
