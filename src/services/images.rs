//! Storage of event pictures (logos and banners).

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Failure while replacing a picture.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported picture format `{0}`")]
    UnsupportedFormat(String),
    #[error("Invalid picture destination `{0}`")]
    InvalidDestination(String),
    #[error("Failed to store picture: {0}")]
    Io(#[from] std::io::Error),
}

/// File already received by the HTTP layer and waiting to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Location of the uploaded file on the local disk.
    pub path: PathBuf,
    /// File name given by the client, used to pick the extension.
    pub original_name: String,
}

/// Request to update one picture slot of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReplacement {
    /// Path currently stored in the slot.
    pub previous: Option<String>,
    /// New picture, if any.
    pub upload: Option<ImageUpload>,
    /// Clear the slot. Ignored when an upload is given.
    pub delete: bool,
    /// Public path of the picture, without extension (`/events/{name}/logo`).
    pub destination: String,
    /// Largest diagonal the stored picture may have, in pixels.
    pub max_diagonal: u32,
}

impl ImageReplacement {
    /// Whether the request changes the slot at all.
    pub fn is_noop(&self) -> bool {
        self.upload.is_none() && !self.delete
    }
}

/// Picture storage backend. Returns the new value of the slot.
pub trait ImageStorage: Send + Sync {
    fn replace_image(
        &self,
        replacement: ImageReplacement,
    ) -> BoxFuture<'static, Result<Option<String>, ImageError>>;
}

/// [`ImageStorage`] writing pictures below a local directory served as-is.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, public_path: &str) -> Result<PathBuf, ImageError> {
        let relative = public_path.trim_start_matches('/');
        let safe = !relative.is_empty()
            && Path::new(relative)
                .components()
                .all(|c| matches!(c, std::path::Component::Normal(_)));
        if !safe {
            return Err(ImageError::InvalidDestination(public_path.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

fn extension_of(original_name: &str) -> Result<String, ImageError> {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ImageError::UnsupportedFormat(original_name.to_owned()))
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), ImageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

impl ImageStorage for LocalImageStorage {
    fn replace_image(
        &self,
        replacement: ImageReplacement,
    ) -> BoxFuture<'static, Result<Option<String>, ImageError>> {
        let storage = self.clone();
        Box::pin(async move {
            if replacement.is_noop() {
                return Ok(replacement.previous);
            }

            let previous = match replacement.previous.as_deref() {
                Some(path) => Some(storage.resolve(path)?),
                None => None,
            };

            let Some(upload) = replacement.upload else {
                if let Some(previous) = previous {
                    remove_if_exists(&previous).await?;
                    info!(path = %previous.display(), "picture deleted");
                }
                return Ok(None);
            };

            let extension = extension_of(&upload.original_name)?;
            let public_path = format!("{}.{extension}", replacement.destination);
            let target = storage.resolve(&public_path)?;
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            // Readers must never observe a partially written picture.
            let staging = target.with_extension(format!("{extension}.{}.tmp", Uuid::new_v4()));
            tokio::fs::copy(&upload.path, &staging).await?;
            if let Err(err) = tokio::fs::rename(&staging, &target).await {
                if let Err(cleanup) = remove_if_exists(&staging).await {
                    warn!(path = %staging.display(), error = %cleanup, "failed to remove staging picture");
                }
                return Err(err.into());
            }

            if let Some(previous) = previous.filter(|previous| *previous != target) {
                remove_if_exists(&previous).await?;
            }

            debug!(
                path = %target.display(),
                max_diagonal = replacement.max_diagonal,
                "picture stored without resizing"
            );
            info!(path = %public_path, "picture replaced");
            Ok(Some(public_path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacement(upload: Option<ImageUpload>, previous: Option<&str>) -> ImageReplacement {
        ImageReplacement {
            previous: previous.map(str::to_owned),
            upload,
            delete: false,
            destination: "/events/jam-1/logo".into(),
            max_diagonal: 1000,
        }
    }

    #[tokio::test]
    async fn upload_is_copied_below_root() {
        let root = tempfile::tempdir().unwrap();
        let incoming = root.path().join("incoming.bin");
        tokio::fs::write(&incoming, b"png-bytes").await.unwrap();
        let storage = LocalImageStorage::new(root.path().join("uploads"));

        let stored = storage
            .replace_image(replacement(
                Some(ImageUpload {
                    path: incoming,
                    original_name: "Logo.PNG".into(),
                }),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(stored.as_deref(), Some("/events/jam-1/logo.png"));
        let bytes = tokio::fs::read(root.path().join("uploads/events/jam-1/logo.png"))
            .await
            .unwrap();
        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn replacing_with_another_format_removes_previous_file() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(root.path());
        let old = root.path().join("events/jam-1/logo.gif");
        tokio::fs::create_dir_all(old.parent().unwrap()).await.unwrap();
        tokio::fs::write(&old, b"old").await.unwrap();
        let incoming = root.path().join("incoming.bin");
        tokio::fs::write(&incoming, b"new").await.unwrap();

        let stored = storage
            .replace_image(replacement(
                Some(ImageUpload {
                    path: incoming,
                    original_name: "logo.webp".into(),
                }),
                Some("/events/jam-1/logo.gif"),
            ))
            .await
            .unwrap();

        assert_eq!(stored.as_deref(), Some("/events/jam-1/logo.webp"));
        assert!(!old.exists());
    }

    #[tokio::test]
    async fn delete_clears_slot() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(root.path());
        let mut request = replacement(None, Some("/events/jam-1/logo.png"));
        request.delete = true;

        assert_eq!(storage.replace_image(request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn noop_keeps_previous_value() {
        let storage = LocalImageStorage::new("unused");
        let stored = storage
            .replace_image(replacement(None, Some("/events/jam-1/logo.png")))
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some("/events/jam-1/logo.png"));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let storage = LocalImageStorage::new("unused");
        let err = storage
            .replace_image(replacement(
                Some(ImageUpload {
                    path: "missing".into(),
                    original_name: "logo.exe".into(),
                }),
                None,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let storage = LocalImageStorage::new("unused");
        let mut request = replacement(None, Some("/../etc/passwd"));
        request.delete = true;
        let err = storage.replace_image(request).await.unwrap_err();
        assert!(matches!(err, ImageError::InvalidDestination(_)));
    }
}
