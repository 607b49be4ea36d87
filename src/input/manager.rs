//! Input manager for handling different file types

use crate::error::{Result, ResumeTailorError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{DocxExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

/// Size and modification time of a file when its text was cached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

pub struct InputManager {
    cache: HashMap<String, (FileStamp, String)>,
    enable_cache: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Extract text from a file, reusing the cached text while the file is unchanged
    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        let path_str = path.to_string_lossy().to_string();

        // Check the file exists before anything else
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                return Err(ResumeTailorError::InvalidInput(format!(
                    "File does not exist: {}",
                    path.display()
                )))
            }
        };
        let stamp = FileStamp {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        };

        // Check cache first; an edited file is read again
        if self.enable_cache {
            if let Some((cached_stamp, cached_text)) = self.cache.get(&path_str) {
                if *cached_stamp == stamp {
                    info!("Using cached text for: {}", path.display());
                    return Ok(cached_text.clone());
                }
                debug!("{} changed since it was cached", path.display());
            }
        }

        // Route to appropriate extractor
        let text = match FileType::from_path(path) {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Docx => {
                info!("Extracting paragraphs from DOCX: {}", path.display());
                DocxExtractor.extract(path).await?
            }
            FileType::Text | FileType::Markdown => {
                info!("Reading text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Unknown => return Err(unsupported(&path.display().to_string())),
        };

        // Cache the result
        if self.enable_cache {
            self.cache.insert(path_str, (stamp, text.clone()));
        }

        Ok(text)
    }

    /// Extract from an in-memory upload; `file_name` only drives format detection.
    pub fn extract_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        debug!("Extracting {} bytes from upload '{}'", bytes.len(), file_name);
        // The name only decides the format; nothing is cached for uploads
        match FileType::from_path(Path::new(file_name)) {
            FileType::Pdf => PdfExtractor.extract_bytes(bytes),
            FileType::Docx => DocxExtractor.extract_bytes(bytes),
            FileType::Text | FileType::Markdown => PlainTextExtractor.extract_bytes(bytes),
            FileType::Unknown => Err(unsupported(file_name)),
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

fn unsupported(name: &str) -> ResumeTailorError {
    ResumeTailorError::UnsupportedFormat(format!(
        "{} (supported: {})",
        name,
        FileType::supported_extensions().join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_edited_file_is_read_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        let mut manager = InputManager::new();

        std::fs::write(&path, "old resume").unwrap();
        assert_eq!(manager.extract_text(&path).await.unwrap(), "old resume");

        std::fs::write(&path, "edited resume").unwrap();
        assert_eq!(manager.extract_text(&path).await.unwrap(), "edited resume");
        assert_eq!(manager.cache_size(), 1);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = InputManager::new().extract_text(dir.path()).await.unwrap_err();
        assert!(matches!(err, ResumeTailorError::InvalidInput(_)));
    }
}
