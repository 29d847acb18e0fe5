//! Google Drive store over the Drive v3 REST API
//!
//! Uploads use the multipart upload protocol: one `multipart/related` request
//! carrying the JSON metadata part followed by the raw media part. Sharing is
//! a separate permission grant of `reader` to `anyone`.

use super::traits::RemoteStore;
use crate::config::DriveConfig;
use crate::error::PublishError;
use async_trait::async_trait;
use serde::Deserialize;

/// Base of the public viewer URL for Drive files
const SHARE_URL_BASE: &str = "https://drive.google.com/file/d";

/// Response of `files.create` with `fields=id`
#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: Option<String>,
}

/// A [`RemoteStore`] backed by Google Drive
pub struct DriveStore {
    client: reqwest::Client,
    api_base: String,
    upload_base: String,
    access_token: Option<String>,
}

impl DriveStore {
    /// Create a store with its own HTTP client
    pub fn new(config: &DriveConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a store using an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: &DriveConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_base: config.upload_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl std::fmt::Debug for DriveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveStore")
            .field("api_base", &self.api_base)
            .field("upload_base", &self.upload_base)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Build a `multipart/related` body with a JSON metadata part and a media part
fn multipart_related(boundary: &str, metadata: &serde_json::Value, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Status plus whatever the server said, for error messages
async fn describe_failure(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => format!("HTTP {status}: {}", text.trim()),
        _ => format!("HTTP {status}"),
    }
}

#[async_trait]
impl RemoteStore for DriveStore {
    async fn upload(
        &self,
        content: Vec<u8>,
        name: &str,
        parent: &str,
    ) -> Result<String, PublishError> {
        let boundary = format!("file_relay_{}", uuid::Uuid::new_v4().simple());
        let metadata = serde_json::json!({ "name": name, "parents": [parent] });
        let body = multipart_related(&boundary, &metadata, &content);

        let request = self
            .client
            .post(format!("{}/drive/v3/files", self.upload_base))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PublishError::UploadFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PublishError::UploadFailed {
                name: name.to_string(),
                reason: describe_failure(response).await,
            });
        }

        let created: CreatedFile =
            response
                .json()
                .await
                .map_err(|e| PublishError::UploadFailed {
                    name: name.to_string(),
                    reason: format!("unreadable response: {e}"),
                })?;

        created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PublishError::MissingObjectId {
                name: name.to_string(),
            })
    }

    async fn set_public(&self, object_id: &str) -> Result<(), PublishError> {
        let request = self
            .client
            .post(format!(
                "{}/drive/v3/files/{}/permissions",
                self.api_base,
                urlencoding::encode(object_id)
            ))
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }));

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PublishError::PermissionFailed {
                object_id: object_id.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PublishError::PermissionFailed {
                object_id: object_id.to_string(),
                reason: describe_failure(response).await,
            });
        }

        Ok(())
    }

    fn share_url(&self, object_id: &str) -> String {
        format!("{SHARE_URL_BASE}/{object_id}/view?usp=sharing")
    }

    fn name(&self) -> &str {
        "google-drive"
    }
}
