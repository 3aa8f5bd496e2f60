//! Exporting a generated artifact through the host's file-save primitive

use crate::error::Result;
use crate::qr::Artifact;
use bytes::Bytes;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};

/// Characters browsers refuse in download names.
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Host primitive that persists a file under a suggested name
pub trait SaveTarget: Send + Sync {
    /// Save `png` as `suggested_name`, returning where it landed when the host knows.
    fn save(&self, png: Bytes, suggested_name: &str) -> Result<Option<PathBuf>>;
}

/// Record of one completed export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReceipt {
    /// Name offered to the host (`{text}-QR.png`)
    pub file_name: String,
    /// Final location, if the host reports one
    pub location: Option<PathBuf>,
    /// Size of the saved PNG
    pub bytes: usize,
}

/// Save `artifact` as `{text}-QR.png`. Without an artifact this does nothing.
pub fn export<S: SaveTarget + ?Sized>(
    artifact: Option<&Artifact>,
    text: &str,
    target: &S,
) -> Result<Option<ExportReceipt>> {
    let Some(artifact) = artifact else {
        return Ok(None);
    };

    let file_name = format!("{text}-QR.png");
    let png = artifact.png().clone();
    let bytes = png.len();

    let location = target.save(png, &file_name).inspect_err(|err| {
        error!(error = %err, file_name = %file_name, "Failed to save QR code");
    })?;

    info!(file_name = %file_name, bytes, location = ?location, "Exported QR code");
    Ok(Some(ExportReceipt {
        file_name,
        location,
        bytes,
    }))
}

/// Writes downloads into a directory, like a browser's download folder
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    /// Save into `dir`, created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectorySaver {
    fn save(&self, png: Bytes, suggested_name: &str) -> Result<Option<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let path = unique_path(&self.dir, &sanitize_file_name(suggested_name));
        fs::write(&path, &png)?;
        Ok(Some(path))
    }
}

/// A file handed to a [`MemorySaver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Suggested name as received
    pub name: String,
    /// File contents
    pub png: Bytes,
}

/// Keeps saved files in memory
#[derive(Debug, Default)]
pub struct MemorySaver {
    saved: Mutex<Vec<SavedFile>>,
}

impl MemorySaver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every file saved so far, oldest first.
    pub fn saved(&self) -> Vec<SavedFile> {
        self.saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl SaveTarget for MemorySaver {
    fn save(&self, png: Bytes, suggested_name: &str) -> Result<Option<PathBuf>> {
        self.saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(SavedFile {
                name: suggested_name.to_string(),
                png,
            });
        Ok(None)
    }
}

/// Replace characters that cannot appear in a file name with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "download.png".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `dir/name`, or `dir/stem (n).ext` for the first free `n` if taken.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormSettings;
    use crate::qr::EncodedImage;

    fn artifact() -> Artifact {
        Artifact::new(
            EncodedImage {
                png: Bytes::from_static(b"\x89PNG-data"),
                width: 200,
                height: 200,
            },
            FormSettings::default(),
        )
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("qrgen-export-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_export_without_artifact_is_noop() {
        let saver = MemorySaver::new();
        let receipt = export(None, "https://example.com", &saver).unwrap();

        assert!(receipt.is_none());
        assert!(saver.saved().is_empty());
    }

    #[test]
    fn test_export_saves_once_with_text_name() {
        let saver = MemorySaver::new();
        let artifact = artifact();

        let receipt = export(Some(&artifact), "https://example.com", &saver)
            .unwrap()
            .unwrap();

        assert_eq!(receipt.file_name, "https://example.com-QR.png");
        assert_eq!(receipt.bytes, 9);
        let saved = saver.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "https://example.com-QR.png");
        assert_eq!(saved[0].png, *artifact.png());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("https://example.com-QR.png"),
            "https___example.com-QR.png"
        );
        assert_eq!(sanitize_file_name("a\tb"), "a_b");
        assert_eq!(sanitize_file_name(".."), "download.png");
    }

    #[test]
    fn test_directory_saver_writes_file() {
        let dir = temp_dir();
        let saver = DirectorySaver::new(&dir);

        let receipt = export(Some(&artifact()), "hello", &saver).unwrap().unwrap();

        let path = receipt.location.unwrap();
        assert_eq!(path, dir.join("hello-QR.png"));
        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG-data");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_directory_saver_does_not_overwrite() {
        let dir = temp_dir();
        let saver = DirectorySaver::new(&dir);
        let artifact = artifact();

        let first = export(Some(&artifact), "dup", &saver).unwrap().unwrap();
        let second = export(Some(&artifact), "dup", &saver).unwrap().unwrap();

        assert_eq!(first.location.unwrap(), dir.join("dup-QR.png"));
        assert_eq!(second.location.unwrap(), dir.join("dup-QR (1).png"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
