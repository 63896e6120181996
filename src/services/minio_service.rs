use crate::config::minio::MinIOSettings;
use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::video::MediaKind;

type StorageResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Object key for an upload belonging to `owner` (a clip or a reel).
/// `extension` may carry a leading dot.
pub fn media_object_key(prefix: &str, owner: Uuid, kind: MediaKind, extension: &str) -> Result<String, String> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    let allowed = match kind {
        MediaKind::Video => VIDEO_EXTENSIONS,
        MediaKind::Thumbnail => IMAGE_EXTENSIONS,
    };
    if !allowed.contains(&extension.as_str()) {
        return Err(format!("Invalid file type '.{}'. Allowed: {:?}", extension, allowed));
    }
    let folder = match kind {
        MediaKind::Video => "video",
        MediaKind::Thumbnail => "thumbnail",
    };
    Ok(format!("{}/{}/{}/{}.{}", prefix, owner, folder, Uuid::new_v4(), extension))
}

pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Clone, Debug)]
pub struct MinIOService {
    client: Arc<S3Client>,
    presigning_client: Arc<S3Client>,
    bucket_name: String,
}

impl MinIOService {
    pub fn new(settings: &MinIOSettings) -> Self {
        Self {
            client: Arc::new(settings.create_internal_s3_client()),
            presigning_client: Arc::new(settings.create_presigning_s3_client()),
            bucket_name: settings.bucket_name.clone(),
        }
    }

    pub async fn ensure_bucket(&self) -> StorageResult<()> {
        let exists = self.client.head_bucket().bucket(&self.bucket_name).send().await.is_ok();
        if exists {
            info!("MinIO bucket {} already exists", self.bucket_name);
            return Ok(());
        }
        info!("Creating MinIO bucket {}", self.bucket_name);
        self.client.create_bucket().bucket(&self.bucket_name).send().await?;
        Ok(())
    }

    pub async fn presigned_upload_url(&self, object_key: &str, content_type: &str, expires_in: Duration) -> StorageResult<String> {
        let request = self
            .presigning_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;
        Ok(request.uri().to_string())
    }

    pub async fn presigned_download_url(&self, object_key: &str, expires_in: Duration) -> StorageResult<String> {
        let request = self
            .presigning_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;
        Ok(request.uri().to_string())
    }

    pub async fn get_file(&self, object_key: &str) -> StorageResult<Bytes> {
        match self.client.get_object().bucket(&self.bucket_name).key(object_key).send().await {
            Ok(response) => {
                let bytes = response.body.collect().await?.into_bytes();
                info!("Fetched {} from MinIO ({} bytes)", object_key, bytes.len());
                Ok(bytes)
            }
            Err(e) => {
                warn!("Object {} not found in MinIO: {}", object_key, e);
                Err(Box::new(e))
            }
        }
    }

    /// Hex SHA-256 of the stored object.
    pub async fn object_sha256(&self, object_key: &str) -> StorageResult<String> {
        let bytes = self.get_file(object_key).await?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    pub async fn delete_file(&self, object_key: &str) -> StorageResult<()> {
        match self.client.delete_object().bucket(&self.bucket_name).key(object_key).send().await {
            Ok(_) => {
                info!("Deleted {} from MinIO", object_key);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete {} from MinIO: {}", object_key, e);
                Err(Box::new(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_grouped_by_owner_and_kind() {
        let clip = Uuid::new_v4();
        let key = media_object_key("clips", clip, MediaKind::Video, ".MP4").unwrap();
        assert!(key.starts_with(&format!("clips/{}/video/", clip)));
        assert!(key.ends_with(".mp4"));
    }

    #[test]
    fn thumbnails_must_be_images() {
        assert!(media_object_key("clips", Uuid::new_v4(), MediaKind::Thumbnail, "mp4").is_err());
        assert!(media_object_key("clips", Uuid::new_v4(), MediaKind::Thumbnail, "png").is_ok());
    }

    #[test]
    fn hash_format() {
        assert!(is_sha256_hex(&"a".repeat(64)));
        assert!(!is_sha256_hex("abc"));
        assert!(!is_sha256_hex(&"g".repeat(64)));
    }
}
