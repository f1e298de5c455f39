//! Course files service - facade over storage backends.
//!
//! Each course owns two small text blobs holding external URLs:
//! `{course_id}/content-url.txt` and `{course_id}/media-url.txt`.
//! Writes overwrite, reads of absent blobs yield `None`, deletes are
//! best-effort across both keys.

use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::storage::StorageBackend;

const CONTENT_BLOB: &str = "content-url.txt";
const MEDIA_BLOB: &str = "media-url.txt";

/// The two URL values stored for a course
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUrls {
    pub content_url: Option<String>,
    pub media_url: Option<String>,
}

/// Facade over the storage backend for per-course URL blobs
pub struct CourseFilesService {
    storage: Arc<dyn StorageBackend>,
}

impl CourseFilesService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    fn content_key(course_id: Uuid) -> String {
        format!("{}/{}", course_id, CONTENT_BLOB)
    }

    fn media_key(course_id: Uuid) -> String {
        format!("{}/{}", course_id, MEDIA_BLOB)
    }

    /// Store the provided URLs, overwriting previous values. Absent fields
    /// leave the corresponding blob untouched.
    pub async fn store_urls(
        &self,
        course_id: Uuid,
        content_url: Option<&str>,
        media_url: Option<&str>,
    ) -> Result<()> {
        if let Some(url) = content_url {
            self.storage
                .put(&Self::content_key(course_id), Bytes::from(url.to_owned()))
                .await?;
        }
        if let Some(url) = media_url {
            self.storage
                .put(&Self::media_key(course_id), Bytes::from(url.to_owned()))
                .await?;
        }
        Ok(())
    }

    /// Fetch both URLs for a course; absent blobs come back as `None`.
    pub async fn fetch_urls(&self, course_id: Uuid) -> Result<CourseUrls> {
        Ok(CourseUrls {
            content_url: self.read_optional(&Self::content_key(course_id)).await?,
            media_url: self.read_optional(&Self::media_key(course_id)).await?,
        })
    }

    /// Remove both URL blobs. Returns true when at least one existed.
    pub async fn delete_urls(&self, course_id: Uuid) -> Result<bool> {
        let mut deleted = false;
        for key in [Self::content_key(course_id), Self::media_key(course_id)] {
            if self.storage.exists(&key).await? {
                self.storage.delete(&key).await?;
                deleted = true;
            }
        }
        Ok(deleted)
    }

    /// Round-trip a throwaway blob to prove the backend accepts writes.
    pub async fn probe(&self) -> Result<()> {
        let key = format!("healthcheck/{}.txt", Uuid::new_v4());
        self.storage.put(&key, Bytes::from_static(b"ok")).await?;
        let content = self.storage.get(&key).await?;
        self.storage.delete(&key).await?;

        if content.as_ref() != b"ok" {
            return Err(AppError::Storage(
                "Storage probe read back unexpected content".to_string(),
            ));
        }
        Ok(())
    }

    /// Cheap reachability check for health reporting; no writes involved.
    pub async fn check_connectivity(&self) -> Result<()> {
        self.storage.exists("healthcheck/probe.txt").await?;
        Ok(())
    }

    async fn read_optional(&self, key: &str) -> Result<Option<String>> {
        match self.storage.get(key).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
