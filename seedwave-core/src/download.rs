//! Saving a song's audio to disk.

use crate::catalogue::{CatalogueApi, SongSummary};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

const LOG_TARGET: &str = "seedwave::download";

const DEFAULT_EXTENSION: &str = "mp3";

/// Fetch `url` and save it in `dir` as `"{artist} - {title}.{ext}"`.
///
/// Bytes are written to a hidden partial file first and renamed into place,
/// so a failed download never leaves a truncated file under the final name.
///
/// # Errors
///
/// Returns an error if the fetch fails or the file cannot be written.
pub async fn download_audio(
    api: &dyn CatalogueApi,
    url: &Url,
    song: &SongSummary,
    dir: &Path,
) -> Result<PathBuf> {
    info!(target: LOG_TARGET, "Downloading {} from {}", song.download_stem(), url);
    let bytes = api.fetch_asset(url).await?;

    let file_name = format!(
        "{}.{}",
        sanitize_file_name(&song.download_stem()),
        extension_of(url)
    );
    let target = dir.join(&file_name);

    tokio::fs::create_dir_all(dir).await?;
    let partial = PartialFile::new(dir.join(format!(".{file_name}.part")));
    tokio::fs::write(partial.path(), &bytes).await?;
    partial.persist(&target).await?;

    info!(target: LOG_TARGET, "Saved {} bytes to {:?}", bytes.len(), target);
    Ok(target)
}

/// Replace characters that are not allowed in file names on common platforms.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').trim();
    if cleaned.is_empty() {
        "song".to_string()
    } else {
        cleaned.to_string()
    }
}

fn extension_of(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(char::is_alphanumeric))
        .map_or_else(|| DEFAULT_EXTENSION.to_string(), str::to_ascii_lowercase)
}

/// A file that is removed on drop unless persisted.
struct PartialFile {
    path: PathBuf,
    persisted: bool,
}

impl PartialFile {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(mut self, target: &Path) -> std::io::Result<()> {
        tokio::fs::rename(&self.path, target).await?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.persisted && self.path.exists() {
            debug!(target: LOG_TARGET, "Removing partial download {:?}", self.path);
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
