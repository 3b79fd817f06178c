use anyhow::{Context, Result};
use rand::Rng;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

const ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const DEFAULT_ID_LEN: usize = 30;

/// Random identifier of lowercase ASCII letters and digits.
pub fn id_generator(size: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..size)
        .map(|_| ID_CHARS[rng.gen_range(0..ID_CHARS.len())] as char)
        .collect()
}

/// Fresh random file name keeping the upload's extension.
///
/// A name without a dot is used whole as the extension.
pub fn unique_file_name(original: &str) -> String {
    let ext = original.rsplit('.').next().unwrap_or(original);
    format!("{}.{}", id_generator(DEFAULT_ID_LEN), ext)
}

/// Stream an uploaded body into `dest`, creating or truncating it.
/// Returns the number of bytes written.
pub fn store_upload<R: Read>(mut body: R, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file =
        std::fs::File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
    let mut out = BufWriter::new(file);
    let written = std::io::copy(&mut body, &mut out)
        .with_context(|| format!("writing upload to {}", dest.display()))?;
    out.flush()?;
    log::debug!("stored {} byte upload at {}", written, dest.display());
    Ok(written)
}
