use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{gallery::Gallery, Embedding};

/// Extension of persisted embedding files.
pub const EMBEDDING_EXT: &str = "emb";

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub vector: Vec<f32>,
}

/// Reject names that would escape the embeddings directory or hide the file.
fn check_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains(|c: char| c == '/' || c == '\\' || c == '\0')
    {
        anyhow::bail!("invalid identity name {:?}", name);
    }
    Ok(())
}

pub fn embedding_path(dir: &Path, name: &str) -> Result<PathBuf> {
    check_name(name)?;
    Ok(dir.join(format!("{}.{}", name, EMBEDDING_EXT)))
}

/// Persist `embedding` as `<dir>/<name>.emb`, replacing any previous file.
///
/// The record is written to a hidden temp file and renamed into place, so
/// readers see either the old or the new file and the directory's mtime moves.
pub fn save_embedding(dir: &Path, name: &str, embedding: &Embedding) -> Result<PathBuf> {
    let file = embedding_path(dir, name)?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let record = EmbeddingRecord {
        id: uuid::Uuid::new_v4().to_string(),
        vector: embedding.to_vec(),
    };
    let data = postcard::to_allocvec(&record)?;

    // `check_name` forbids a leading '.', so this never collides with an identity.
    let tmp = dir.join(format!(".{}.{}.tmp", name, EMBEDDING_EXT));
    std::fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, &file) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("replacing {}", file.display()));
    }
    log::debug!("saved {}-d embedding to {}", embedding.dim(), file.display());
    Ok(file)
}

pub fn load_embedding(path: &Path) -> Result<Embedding> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let record: EmbeddingRecord =
        postcard::from_bytes(&data).with_context(|| format!("decoding {}", path.display()))?;
    Ok(Embedding::from_vec(record.vector))
}

/// Every `*.emb` file directly inside `dir`, sorted by file name.
fn embedding_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |e| e == EMBEDDING_EXT) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Build a gallery from the embedding files in `dir`; the file stem is the
/// identity name. A missing directory yields an empty gallery.
pub fn load_gallery(dir: &Path) -> Result<Gallery> {
    let mut gallery = Gallery::new();
    if !dir.exists() {
        return Ok(gallery);
    }

    for file in embedding_files(dir)? {
        let Some(name) = file.file_stem().and_then(|s| s.to_str()) else {
            log::warn!("skipping non-utf8 embedding file {}", file.display());
            continue;
        };
        let embedding = load_embedding(&file)?;
        gallery.insert(name, embedding);
    }

    log::debug!("loaded {} embeddings from {}", gallery.len(), dir.display());
    Ok(gallery)
}

/// Returns whether a file was removed.
pub fn remove_embedding(dir: &Path, name: &str) -> Result<bool> {
    let file = embedding_path(dir, name)?;
    if !file.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&file).with_context(|| format!("removing {}", file.display()))?;
    Ok(true)
}

/// Gallery of one directory, re-scanned when the directory changes.
///
/// Change detection uses the directory's modification time, which moves
/// whenever an entry is created, removed or renamed. [`save_embedding`]
/// always renames into place, so re-enrolling an existing name is seen too.
#[derive(Debug)]
pub struct GalleryCache {
    dir: PathBuf,
    stamp: Option<SystemTime>,
    gallery: Option<Gallery>,
}

impl GalleryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stamp: None,
            gallery: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn invalidate(&mut self) {
        self.gallery = None;
    }

    fn current_stamp(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.dir).and_then(|m| m.modified()).ok()
    }

    /// The cached gallery, reloaded first if the directory changed.
    pub fn get(&mut self) -> Result<&Gallery> {
        let stamp = self.current_stamp();
        let stale = self.gallery.is_none() || stamp != self.stamp;
        if stale {
            log::debug!("rescanning {}", self.dir.display());
            self.gallery = Some(load_gallery(&self.dir)?);
            self.stamp = stamp;
        }
        Ok(self.gallery.get_or_insert_with(Gallery::new))
    }
}
