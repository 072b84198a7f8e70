//! Object storage client
//!
//! Uploads listing media and KYC files to a bucket over the storage HTTP API
//! and hands back public URLs. Multi-file submissions upload in parallel and
//! roll back stored objects when any part fails, so database rows are only
//! written for fully stored submissions.

use anyhow::{Context, Result};
use futures::future::join_all;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::Settings;
use crate::error::ApiError;

/// A buffered file ready to store under a resolved key
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A stored object and its public URL
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Client for the bucket's HTTP object API.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl StorageClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(bucket = %settings.storage_bucket, "Storage client initialized");

        Ok(Self {
            client,
            base_url: settings.storage_url.trim_end_matches('/').to_string(),
            bucket: settings.storage_bucket.clone(),
            service_key: settings.storage_service_key.clone(),
        })
    }

    /// Public URL for a stored key
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    /// Store one object and return its public URL
    pub async fn upload(&self, upload: &PendingUpload) -> Result<StoredObject, ApiError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, upload.key
        );

        debug!(key = %upload.key, bytes = upload.bytes.len(), "Storage upload");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("Content-Type", &upload.content_type)
            .header("x-upsert", "false")
            .body(upload.bytes.clone())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, key = %upload.key, "Storage request failed");
                ApiError::internal(format!("Storage unavailable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, key = %upload.key, body = %body, "Storage upload rejected");
            return Err(ApiError::internal(format!(
                "Storage upload failed with status {}",
                status
            )));
        }

        Ok(StoredObject {
            key: upload.key.clone(),
            url: self.public_url(&upload.key),
        })
    }

    /// Delete a stored object, logging failures instead of surfacing them.
    /// Used to roll back partially stored submissions.
    pub async fn delete_quiet(&self, key: &str) {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);
        match self
            .client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .send()
            .await
        {
            Ok(response) if !response.status().is_success() => {
                warn!(key = %key, status = %response.status(), "Storage rollback delete rejected");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Storage rollback delete failed");
            }
        }
    }

    /// Store a batch of objects in parallel. Either every object is stored
    /// and returned in input order, or the ones that made it are deleted
    /// again and the first failure is returned.
    pub async fn upload_all(
        &self,
        uploads: &[PendingUpload],
    ) -> Result<Vec<StoredObject>, ApiError> {
        let results = join_all(uploads.iter().map(|u| self.upload(u))).await;

        let mut stored = Vec::with_capacity(results.len());
        let mut first_failure = None;
        for result in results {
            match result {
                Ok(object) => stored.push(object),
                Err(e) if first_failure.is_none() => first_failure = Some(e),
                Err(_) => {}
            }
        }

        if let Some(failure) = first_failure {
            warn!(
                stored = stored.len(),
                total = uploads.len(),
                "Rolling back partially stored submission"
            );
            join_all(stored.iter().map(|o| self.delete_quiet(&o.key))).await;
            return Err(failure);
        }

        Ok(stored)
    }
}

/// Storage key builders for consistent key formats.
///
/// Prefixes are deterministic per entity; filenames get a random suffix so
/// repeated uploads of the same name never collide.
pub mod keys {
    use uuid::Uuid;

    /// Keep filenames URL-safe: alphanumerics, dot, dash, underscore
    fn sanitize(name: &str) -> String {
        let cleaned: String = name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        if cleaned.is_empty() {
            "file".to_string()
        } else {
            cleaned
        }
    }

    /// Agent profile photo key
    pub fn agent_profile_photo(file_name: &str) -> String {
        format!("agents/profile/{}-{}", Uuid::new_v4(), sanitize(file_name))
    }

    /// Agent KYC document key
    pub fn agent_kyc_document(file_name: &str) -> String {
        format!("agents/kyc/{}-{}", Uuid::new_v4(), sanitize(file_name))
    }

    /// Listing image key
    pub fn warehouse_image(user_id: Uuid, warehouse_id: Uuid, file_name: &str) -> String {
        format!(
            "{}/warehouses/{}/images/{}-{}",
            user_id,
            warehouse_id,
            Uuid::new_v4(),
            sanitize(file_name)
        )
    }

    /// Listing document key
    pub fn warehouse_document(user_id: Uuid, warehouse_id: Uuid, file_name: &str) -> String {
        format!(
            "{}/warehouses/{}/documents/{}-{}",
            user_id,
            warehouse_id,
            Uuid::new_v4(),
            sanitize(file_name)
        )
    }

    /// Agent banner key
    pub fn agent_banner(user_id: Uuid, file_name: &str) -> String {
        format!("banners/{}/{}-{}", user_id, Uuid::new_v4(), sanitize(file_name))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn keys_carry_their_prefixes() {
            assert!(agent_profile_photo("me.jpg").starts_with("agents/profile/"));
            assert!(agent_kyc_document("pan.pdf").starts_with("agents/kyc/"));

            let user = Uuid::new_v4();
            let warehouse = Uuid::new_v4();
            let image = warehouse_image(user, warehouse, "front.png");
            assert!(image.starts_with(&format!("{}/warehouses/{}/images/", user, warehouse)));
            let doc = warehouse_document(user, warehouse, "deed.pdf");
            assert!(doc.starts_with(&format!("{}/warehouses/{}/documents/", user, warehouse)));
            assert!(agent_banner(user, "banner.jpg").starts_with(&format!("banners/{}/", user)));
        }

        #[test]
        fn filenames_are_sanitized_and_randomized() {
            let key = agent_profile_photo("my photo (1).jpg");
            assert!(key.ends_with("my-photo--1-.jpg"));
            assert!(!key.contains(' '));

            // Same name twice gets different keys
            assert_ne!(agent_profile_photo("a.jpg"), agent_profile_photo("a.jpg"));
        }

        #[test]
        fn empty_filenames_fall_back() {
            assert!(agent_kyc_document("   ").ends_with("-file"));
        }
    }
}
