use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Whether `filename` carries one of the `allowed` extensions (case-insensitive).
pub fn allowed_file<S: AsRef<str>>(filename: &str, allowed: &[S]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            allowed.iter().any(|a| a.as_ref() == ext)
        }
        None => false,
    }
}

/// `filename` without its last extension; directories are kept.
pub fn remove_file_extension(filename: &str) -> String {
    Path::new(filename)
        .with_extension("")
        .to_string_lossy()
        .into_owned()
}

/// Write `img` to `<dir>/<filename>`; the format follows the extension.
pub fn save_image(img: &DynamicImage, filename: &str, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(filename);
    img.save(&path)
        .with_context(|| format!("saving image {}", path.display()))?;
    Ok(path)
}

/// Location of the face crop stored under `id`.
pub fn face_path(media_root: &Path, id: &str) -> PathBuf {
    media_root.join("face").join(format!("{}.jpg", id))
}

/// Store a face crop as `<media_root>/face/<id>.jpg`.
pub fn save_face(img: &DynamicImage, media_root: &Path, id: &str) -> Result<PathBuf> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    save_image(&rgb, &format!("{}.jpg", id), &media_root.join("face"))
}

/// Returns whether a crop was removed.
pub fn remove_face(media_root: &Path, id: &str) -> Result<bool> {
    let path = face_path(media_root, id);
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
    Ok(true)
}
