use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use super::error::StorageError;
use super::filename::strip_extension;
use super::traits::{ImageStore, StoredImage};
use crate::config::CloudinaryConfig;

/// Image store backed by the Cloudinary upload API.
///
/// Uploads are signed with the account's API secret and land in a fixed
/// folder. The service-assigned `public_id` is returned as the storage key.
pub struct CloudinaryImageStore {
    client: reqwest::Client,
    upload_url: String,
    destroy_url: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryImageStore {
    pub fn new(config: &CloudinaryConfig) -> Result<Self, StorageError> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(StorageError::Config(
                "cloud_name, api_key and api_secret are required for the cloudinary backend".into(),
            ));
        }

        let base = format!(
            "{}/{}/image",
            config.api_base.trim_end_matches('/'),
            config.cloud_name
        );

        Ok(Self {
            client: reqwest::Client::new(),
            upload_url: format!("{base}/upload"),
            destroy_url: format!("{base}/destroy"),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.trim_matches('/').to_string(),
        })
    }

    fn timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }
}

/// Compute a request signature: SHA-1 over the sorted `key=value` pairs joined
/// with `&`, immediately followed by the API secret.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

async fn error_body(res: reqwest::Response) -> StorageError {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    StorageError::Remote(format!("HTTP {status}: {body}"))
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn store(
        &self,
        car_id: i32,
        data: &[u8],
        original_filename: &str,
    ) -> Result<StoredImage, StorageError> {
        let timestamp = Self::timestamp();
        let signature = sign_params(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let file = Part::bytes(data.to_vec()).file_name(original_filename.to_string());
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let res = self.client.post(&self.upload_url).multipart(form).send().await?;
        if !res.status().is_success() {
            return Err(error_body(res).await);
        }

        let uploaded: UploadResponse = res.json().await?;
        tracing::debug!(car_id, public_id = %uploaded.public_id, "Uploaded image to hosted store");

        Ok(StoredImage {
            reference: uploaded.secure_url,
            key: uploaded.public_id,
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let timestamp = Self::timestamp();
        let signature = sign_params(
            &[("public_id", key), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let res = self
            .client
            .post(&self.destroy_url)
            .form(&[
                ("public_id", key),
                ("api_key", self.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(error_body(res).await);
        }

        let destroyed: DestroyResponse = res.json().await?;
        match destroyed.result.as_str() {
            "ok" => Ok(true),
            "not found" => Ok(false),
            other => Err(StorageError::Remote(format!(
                "unexpected destroy result for {key}: {other}"
            ))),
        }
    }

    fn display_url(&self, reference: &str) -> String {
        reference.to_string()
    }

    /// Best guess for records that predate stored keys: the folder plus the
    /// URL's final path segment without its extension. Only correct when the
    /// service did not rename the upload.
    fn key_for_reference(&self, reference: &str) -> String {
        let path = reference.split(['?', '#']).next().unwrap_or(reference);
        let segment = path.rsplit('/').next().unwrap_or(path);
        let id = strip_extension(segment);
        if self.folder.is_empty() {
            id.to_string()
        } else {
            format!("{}/{id}", self.folder)
        }
    }
}
