//! Client for the external document-to-PDF conversion service
//!
//! Protocol: obtain an access token, create an input asset, upload the bytes to
//! the asset's upload URI, submit a create-PDF job, poll the job location until
//! it is done or failed, then download the result asset.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("conversion service is not configured")]
    Disabled,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("conversion service returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("conversion job failed: {0}")]
    JobFailed(String),
    #[error("conversion job not finished after {0} polls")]
    Timeout(u32),
    #[error("unexpected response from conversion service: {0}")]
    Protocol(String),
}

/// Turns an office/text document into PDF bytes
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, bytes: Vec<u8>, mime_type: &str) -> Result<Vec<u8>, ConvertError>;
}

/// Used when no conversion service is configured; only PDFs can be uploaded
pub struct DisabledConverter;

#[async_trait]
impl DocumentConverter for DisabledConverter {
    async fn convert(&self, _bytes: Vec<u8>, mime_type: &str) -> Result<Vec<u8>, ConvertError> {
        warn!(mime_type, "Conversion requested but no conversion service is configured");
        Err(ConvertError::Disabled)
    }
}

#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Service root, e.g. `https://pdf-services.example.com` (no trailing slash)
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

pub struct HttpConverter {
    client: reqwest::Client,
    config: ConverterConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssetRequest<'a> {
    media_type: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetResponse {
    #[serde(rename = "assetID")]
    asset_id: String,
    upload_uri: String,
}

#[derive(Serialize)]
struct CreatePdfRequest<'a> {
    #[serde(rename = "assetID")]
    asset_id: &'a str,
}

#[derive(Deserialize)]
struct JobStatus {
    status: String,
    asset: Option<ResultAsset>,
    error: Option<JobErrorBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultAsset {
    download_uri: String,
}

#[derive(Deserialize)]
struct JobErrorBody {
    message: String,
}

impl HttpConverter {
    pub fn new(mut config: ConverterConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn access_token(&self) -> Result<String, ConvertError> {
        let url = format!("{}/token", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;
        let token: TokenResponse = check(resp).await?.json().await?;
        Ok(token.access_token)
    }

    async fn create_asset(
        &self,
        token: &str,
        mime_type: &str,
    ) -> Result<AssetResponse, ConvertError> {
        let url = format!("{}/assets", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("X-API-Key", &self.config.client_id)
            .json(&AssetRequest {
                media_type: mime_type,
            })
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn upload_asset(
        &self,
        upload_uri: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), ConvertError> {
        let resp = self
            .client
            .put(upload_uri)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Submit the job; the service answers with its polling location
    async fn submit_job(&self, token: &str, asset_id: &str) -> Result<String, ConvertError> {
        let url = format!("{}/operation/createpdf", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("X-API-Key", &self.config.client_id)
            .json(&CreatePdfRequest { asset_id })
            .send()
            .await?;
        let resp = check(resp).await?;
        resp.headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ConvertError::Protocol("job submitted without a Location header".into()))
    }

    async fn wait_for_result(&self, token: &str, location: &str) -> Result<String, ConvertError> {
        for attempt in 1..=self.config.max_polls {
            let resp = self
                .client
                .get(location)
                .bearer_auth(token)
                .header("X-API-Key", &self.config.client_id)
                .send()
                .await?;
            let job: JobStatus = check(resp).await?.json().await?;
            debug!(attempt, status = %job.status, "Polled conversion job");

            match job.status.as_str() {
                "done" => {
                    return job
                        .asset
                        .map(|a| a.download_uri)
                        .ok_or_else(|| ConvertError::Protocol("finished job has no asset".into()));
                }
                "failed" => {
                    let message = job
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| "no reason given".into());
                    return Err(ConvertError::JobFailed(message));
                }
                _ => tokio::time::sleep(self.config.poll_interval).await,
            }
        }
        Err(ConvertError::Timeout(self.config.max_polls))
    }

    async fn download(&self, download_uri: &str) -> Result<Vec<u8>, ConvertError> {
        let resp = self.client.get(download_uri).send().await?;
        Ok(check(resp).await?.bytes().await?.to_vec())
    }
}

#[async_trait]
impl DocumentConverter for HttpConverter {
    async fn convert(&self, bytes: Vec<u8>, mime_type: &str) -> Result<Vec<u8>, ConvertError> {
        info!(mime_type, size = bytes.len(), "Converting document to PDF");
        let token = self.access_token().await?;
        let asset = self.create_asset(&token, mime_type).await?;
        self.upload_asset(&asset.upload_uri, bytes, mime_type)
            .await?;
        let location = self.submit_job(&token, &asset.asset_id).await?;
        let download_uri = self.wait_for_result(&token, &location).await?;
        let pdf = self.download(&download_uri).await?;
        info!(size = pdf.len(), "Conversion finished");
        Ok(pdf)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ConvertError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ConvertError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}
