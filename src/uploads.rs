//! Local filesystem store for images and documents sent as multipart fields.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use uuid::Uuid;

use crate::utils::AppError;

pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "pdf"];

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// A parsed multipart body: text fields by name, file fields by name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part for an untouched file input
                    if !bytes.is_empty() {
                        form.files.insert(name, UploadedFile { file_name, bytes });
                    }
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text value; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn require_text(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::ValidationError(format!("{} is required", name)))
    }

    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| AppError::ValidationError(format!("{} is invalid", name)))
            })
            .transpose()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Stores the file under a random name and returns its public URL.
    pub async fn save(&self, file: &UploadedFile) -> Result<String, AppError> {
        let extension = allowed_extension(&file.file_name).ok_or_else(|| {
            AppError::ValidationError(format!(
                "Unsupported file type for '{}'; allowed: {}",
                file.file_name,
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, &file.bytes).await.map_err(|e| {
            AppError::InternalServerError(format!("Failed to write upload {:?}: {}", path, e))
        })?;

        tracing::debug!(file = %stored_name, bytes = file.bytes.len(), "Stored upload");
        Ok(format!("{}/{}", PUBLIC_PREFIX, stored_name))
    }

    pub async fn save_optional(&self, file: Option<UploadedFile>) -> Result<Option<String>, AppError> {
        match file {
            Some(file) => self.save(&file).await.map(Some),
            None => Ok(None),
        }
    }

    /// Saves several optional files, keeping their order. If one is rejected
    /// the ones already written are removed again.
    pub async fn save_all(
        &self,
        files: Vec<Option<UploadedFile>>,
    ) -> Result<Vec<Option<String>>, AppError> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            match self.save_optional(file).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    let written: Vec<String> = urls.into_iter().flatten().collect();
                    self.discard(&written).await;
                    return Err(e);
                }
            }
        }
        Ok(urls)
    }

    /// Deletes stored files by public URL. Failures are only logged.
    pub async fn discard(&self, urls: &[String]) {
        for url in urls {
            let Some(path) = self.local_path(url) else {
                tracing::warn!(%url, "Not an upload URL, leaving it alone");
                continue;
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(file = ?path, "Discarded upload"),
                Err(e) => tracing::warn!(file = ?path, error = %e, "Failed to discard upload"),
            }
        }
    }

    /// Passes `result` through, removing `urls` first when it is an error.
    /// Used after saving files whose owning row could not be written.
    pub async fn discard_on_error<T, E>(&self, urls: &[String], result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            self.discard(urls).await;
        }
        result
    }

    fn local_path(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        let plain = Path::new(name).file_name() == Some(OsStr::new(name));
        plain.then(|| self.root.join(name))
    }
}

fn allowed_extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}
