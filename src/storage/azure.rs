//! Azure Blob Storage backend.
//!
//! Talks to the Blob service REST API directly: writes and deletes are
//! authorized with a Shared Key signature, reads and existence checks go
//! through short-lived Shared Access Signature (SAS) URLs.
//!
//! ## Configuration
//!
//! ```bash
//! STORAGE_BACKEND=azure
//! AZURE_STORAGE_ACCOUNT=myaccount
//! AZURE_STORAGE_CONTAINER=course-files
//! AZURE_STORAGE_ACCESS_KEY=base64-encoded-key
//! ```

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::storage::StorageBackend;

type HmacSha256 = Hmac<Sha256>;

/// Blobs hold URL text, not binary payloads.
const BLOB_CONTENT_TYPE: &str = "text/plain";

/// Azure Blob Storage configuration
#[derive(Clone)]
pub struct AzureConfig {
    /// Storage account name
    pub account_name: String,
    /// Container name
    pub container_name: String,
    /// Storage account access key (base64 encoded)
    pub access_key: String,
    /// Optional custom endpoint (for Azure Government, China, etc.)
    pub endpoint: Option<String>,
}

redacted_debug!(AzureConfig {
    show account_name,
    show container_name,
    redact access_key,
    show endpoint,
});

impl AzureConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let account_name = std::env::var("AZURE_STORAGE_ACCOUNT")
            .map_err(|_| AppError::Config("AZURE_STORAGE_ACCOUNT not set".to_string()))?;

        let container_name = std::env::var("AZURE_STORAGE_CONTAINER")
            .map_err(|_| AppError::Config("AZURE_STORAGE_CONTAINER not set".to_string()))?;

        let access_key = std::env::var("AZURE_STORAGE_ACCESS_KEY")
            .map_err(|_| AppError::Config("AZURE_STORAGE_ACCESS_KEY not set".to_string()))?;

        let endpoint = std::env::var("AZURE_STORAGE_ENDPOINT").ok();

        Ok(Self {
            account_name,
            container_name,
            access_key,
            endpoint,
        })
    }
}

/// Azure Blob Storage backend
pub struct AzureBackend {
    config: AzureConfig,
    client: reqwest::Client,
    decoded_key: Vec<u8>,
}

impl AzureBackend {
    /// Create a new Azure Blob Storage backend
    pub fn new(config: AzureConfig) -> Result<Self> {
        let decoded_key = BASE64.decode(&config.access_key).map_err(|e| {
            AppError::Config(format!(
                "Invalid AZURE_STORAGE_ACCESS_KEY (not valid base64): {}",
                e
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            decoded_key,
        })
    }

    /// Get the base URL for the storage account
    fn base_url(&self) -> String {
        self.config.endpoint.clone().unwrap_or_else(|| {
            format!("https://{}.blob.core.windows.net", self.config.account_name)
        })
    }

    /// Get the full URL for a blob
    fn blob_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url(), self.config.container_name, key)
    }

    fn sign(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.decoded_key)
            .map_err(|e| AppError::Storage(format!("Failed to create HMAC: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Generate a SAS token for a blob
    ///
    /// Uses Service SAS with blob resource type.
    /// Reference: https://docs.microsoft.com/en-us/rest/api/storageservices/create-service-sas
    fn generate_sas_token(&self, key: &str, expires_in: Duration) -> Result<String> {
        let now = Utc::now();
        let expiry = now + ChronoDuration::seconds(expires_in.as_secs() as i64);

        let signed_version = "2021-06-08";
        let signed_resource = "b"; // blob
        let signed_permissions = "r"; // read only
        let signed_start = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let signed_expiry = expiry.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let signed_protocol = "https";

        // Canonicalized resource: /blob/{account}/{container}/{blob}
        let canonicalized_resource = format!(
            "/blob/{}/{}/{}",
            self.config.account_name, self.config.container_name, key
        );

        // String to sign (order matters!)
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}\n\n{}\n\n\n\n{}\n\n\n\n",
            signed_permissions,
            signed_start,
            signed_expiry,
            canonicalized_resource,
            signed_protocol,
            signed_version,
        );

        let signature = self.sign(&string_to_sign)?;

        let sas_token = format!(
            "sv={}&st={}&se={}&sr={}&sp={}&spr={}&sig={}",
            urlencoding::encode(signed_version),
            urlencoding::encode(&signed_start),
            urlencoding::encode(&signed_expiry),
            signed_resource,
            signed_permissions,
            signed_protocol,
            urlencoding::encode(&signature),
        );

        Ok(sas_token)
    }

    /// Generate a SAS URL for a blob
    pub fn generate_sas_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let sas_token = self.generate_sas_token(key, expires_in)?;
        Ok(format!("{}?{}", self.blob_url(key), sas_token))
    }
}

#[async_trait]
impl StorageBackend for AzureBackend {
    async fn put(&self, key: &str, content: Bytes) -> Result<()> {
        let url = self.blob_url(key);
        let now = Utc::now();
        let date_str = now.format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let content_length = content.len();
        let string_to_sign = format!(
            "PUT\n\n\n{}\n\n{}\n\n\n\n\n\n\nx-ms-blob-type:BlockBlob\nx-ms-date:{}\nx-ms-version:2021-06-08\n/{}/{}/{}",
            content_length,
            BLOB_CONTENT_TYPE,
            date_str,
            self.config.account_name,
            self.config.container_name,
            key
        );

        let signature = self.sign(&string_to_sign)?;
        let auth_header = format!("SharedKey {}:{}", self.config.account_name, signature);

        let response = self
            .client
            .put(&url)
            .header("Authorization", auth_header)
            .header("x-ms-date", &date_str)
            .header("x-ms-version", "2021-06-08")
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", BLOB_CONTENT_TYPE)
            .header("Content-Length", content_length)
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Azure upload failed with status {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let sas_url = self.generate_sas_url(key, Duration::from_secs(300))?;

        let response = self
            .client
            .get(&sas_url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure download failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(AppError::NotFound(format!("Blob not found: {}", key)));
            }
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Azure download failed with status {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read response: {}", e)))?;

        Ok(bytes)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let sas_url = self.generate_sas_url(key, Duration::from_secs(60))?;

        let response = self
            .client
            .head(&sas_url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure HEAD request failed: {}", e)))?;

        Ok(response.status().is_success())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let url = self.blob_url(key);
        let now = Utc::now();
        let date_str = now.format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let string_to_sign = format!(
            "DELETE\n\n\n\n\n\n\n\n\n\n\n\nx-ms-date:{}\nx-ms-version:2021-06-08\n/{}/{}/{}",
            date_str, self.config.account_name, self.config.container_name, key
        );

        let signature = self.sign(&string_to_sign)?;
        let auth_header = format!("SharedKey {}:{}", self.config.account_name, signature);

        let response = self
            .client
            .delete(&url)
            .header("Authorization", auth_header)
            .header("x-ms-date", &date_str)
            .header("x-ms-version", "2021-06-08")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure delete failed: {}", e)))?;

        // Deleting a blob that is already gone is fine
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Azure delete failed with status {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
