//! Client for the Cloudinary upload API.
//!
//! Only the two calls the catalog needs are implemented: a signed image
//! upload and a signed destroy. Credentials are checked lazily so the server
//! starts without them and reports a configuration error on first use.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::CloudinaryConfig;
use crate::errors::{AppError, Result};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const MISSING_CREDENTIALS: &str = "Please define CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY, and CLOUDINARY_API_SECRET environment variables";

#[derive(Clone)]
pub struct Cloudinary {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

struct Credentials<'a> {
    cloud_name: &'a str,
    api_key: &'a str,
    api_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl Cloudinary {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Cloudinary { config, http })
    }

    pub fn folder(&self) -> &str {
        &self.config.folder
    }

    fn credentials(&self) -> Result<Credentials<'_>> {
        Ok(Credentials {
            cloud_name: credential(&self.config.cloud_name)?,
            api_key: credential(&self.config.api_key)?,
            api_secret: credential(&self.config.api_secret)?,
        })
    }

    /// Uploads an image into the configured folder and returns its HTTPS
    /// delivery URL.
    pub async fn upload(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        let creds = self.credentials()?;
        let public_id = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let params = [
            ("folder", self.config.folder.clone()),
            ("public_id", public_id),
            ("timestamp", timestamp),
        ];
        let signature = sign(&params, creds.api_secret);

        let file = Part::bytes(data)
            .file_name("upload")
            .mime_str(content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid content type: {}", e)))?;

        let mut form = Form::new()
            .text("api_key", creds.api_key.to_string())
            .text("signature", signature)
            .part("file", file);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = format!("{}/{}/image/upload", API_BASE, creds.cloud_name);
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Cloudinary upload request failed: {}", e);
                AppError::MediaHost {
                    status: 500,
                    message: format!("Failed to reach Cloudinary: {}", e),
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error.message)
                .ok();
            log::error!("Cloudinary upload failed with HTTP {}: {:?}", status, message);
            return Err(host_error(status, message));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            log::error!("Cloudinary returned an unreadable response: {}", e);
            AppError::MediaHost {
                status: 500,
                message: "Cloudinary returned an invalid response. Please verify your Cloudinary credentials and account status.".to_string(),
            }
        })?;

        body.secure_url.ok_or_else(|| AppError::MediaHost {
            status: 500,
            message: "Upload failed: No result from Cloudinary".to_string(),
        })
    }

    /// Removes a previously uploaded image. Failures are logged and swallowed:
    /// a stale image on the host must not block catalog changes.
    pub async fn delete(&self, image_url: &str) {
        if let Err(e) = self.try_delete(image_url).await {
            log::warn!("Could not delete image {} from Cloudinary: {}", image_url, e);
        }
    }

    async fn try_delete(&self, image_url: &str) -> Result<()> {
        let creds = self.credentials()?;
        let public_id = public_id_from_url(image_url)
            .ok_or_else(|| AppError::BadRequest("Not a Cloudinary delivery URL".to_string()))?;
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let params = [("public_id", public_id), ("timestamp", timestamp)];
        let signature = sign(&params, creds.api_secret);

        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("api_key", creds.api_key.to_string()));
        form.push(("signature", signature));

        let url = format!("{}/{}/image/destroy", API_BASE, creds.cloud_name);
        let response = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::MediaHost {
                status: 500,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(host_error(status, None));
        }

        let body: DestroyResponse = response.json().await.map_err(|e| AppError::MediaHost {
            status: 500,
            message: e.to_string(),
        })?;
        log::debug!("Cloudinary destroy of {}: {}", image_url, body.result);
        Ok(())
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as
/// `k=v&k=v`, the API secret appended, SHA-1 hex digest.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derives the public id from a delivery URL such as
/// `https://res.cloudinary.com/demo/image/upload/v1700000000/ecommerce-products/abc.jpg`,
/// yielding `ecommerce-products/abc`.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, path) = url.split_once("/upload/")?;
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or(path);

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let start = segments
        .iter()
        .position(|s| is_version(s))
        .map(|i| i + 1)
        .unwrap_or(0);
    let (last, dirs) = segments.get(start..)?.split_last()?;

    let stem = match last.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => *last,
    };

    let mut parts: Vec<&str> = dirs.to_vec();
    parts.push(stem);
    Some(parts.join("/"))
}

fn credential(value: &Option<String>) -> Result<&str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::MediaConfig(MISSING_CREDENTIALS.to_string())),
    }
}

fn is_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

fn host_error(status: u16, message: Option<String>) -> AppError {
    let message = match status {
        401 => "Cloudinary authentication failed. Please check your API key and secret.".to_string(),
        400 => format!(
            "Invalid request to Cloudinary: {}",
            message.unwrap_or_else(|| "Bad request".to_string())
        ),
        500 => "Cloudinary server error. This may be due to invalid credentials or account issues. Please verify your Cloudinary account and credentials.".to_string(),
        _ => message.unwrap_or_else(|| {
            format!("Failed to upload image to Cloudinary (HTTP {})", status)
        }),
    };
    AppError::MediaHost { status, message }
}
