//! Receipt OCR service client
//!
//! Two-call protocol: `process` uploads an image and returns a job token;
//! `poll_result` polls by token until the job reaches a terminal status,
//! bounded by a caller-supplied deadline. There is no retry layer; HTTP
//! failures propagate with the underlying message preserved.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;

use super::summary::{ScanPayload, ScanStatus};

const DEFAULT_PROCESS_URL: &str = "https://api.tabscanner.com/api/2/process";
const DEFAULT_RESULT_URL_BASE: &str = "https://api.tabscanner.com/api/result";

/// Request timeout for a single HTTP call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from the receipt service boundary
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("request to receipt service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not read image file: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload rejected: {detail}")]
    Rejected { detail: String },

    #[error("scan failed: {detail}")]
    Failed { detail: String },

    #[error("timed out after {waited:?} waiting for scan result")]
    Timeout { waited: Duration },
}

/// Opaque identifier for an in-flight scan job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobToken(String);

impl JobToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upload options for [`Client::process`]
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Region hint; improves date and number parsing
    pub region: String,
    pub document_type: String,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            region: "gb".to_string(),
            document_type: "receipt".to_string(),
        }
    }
}

/// Polling schedule for [`Client::poll_result`]
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Wait before the first poll; uploads are never ready immediately
    pub initial_wait: Duration,
    /// Fixed re-poll interval
    pub interval: Duration,
    /// Deadline, measured from the first poll
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_wait: Duration::from_secs(5),
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(90),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the receipt OCR service
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    process_url: String,
    result_url_base: String,
}

impl Client {
    /// Create a client with the given API key
    pub fn new(api_key: impl Into<String>) -> Result<Self, ReceiptError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            process_url: DEFAULT_PROCESS_URL.to_string(),
            result_url_base: DEFAULT_RESULT_URL_BASE.to_string(),
        })
    }

    /// Override the service endpoints (proxies, test servers)
    pub fn with_endpoints(
        mut self,
        process_url: impl Into<String>,
        result_url_base: impl Into<String>,
    ) -> Self {
        self.process_url = process_url.into();
        self.result_url_base = result_url_base.into();
        self
    }

    /// Upload a receipt image for processing and return the job token
    pub async fn process(
        &self,
        image: &Path,
        options: &ProcessOptions,
    ) -> Result<JobToken, ReceiptError> {
        tracing::info!(image = %image.display(), "Uploading receipt image");

        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "receipt.jpg".to_string());

        let form = multipart::Form::new()
            .text("documentType", options.document_type.clone())
            .text("region", options.region.clone())
            .part(
                "file",
                multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("image/jpeg")?,
            );

        let response = self
            .http
            .post(&self.process_url)
            .header("apikey", &self.api_key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let payload: ProcessResponse = response.json().await?;

        if payload.success == Some(false) && payload.token.is_none() {
            return Err(ReceiptError::Rejected {
                detail: payload
                    .message
                    .unwrap_or_else(|| "service reported failure".to_string()),
            });
        }

        match payload.token {
            Some(token) => {
                tracing::info!(token = %token, "Upload accepted");
                Ok(JobToken(token))
            }
            None => Err(ReceiptError::Rejected {
                detail: "no token returned".to_string(),
            }),
        }
    }

    /// Poll the result endpoint until the job reaches a terminal status
    ///
    /// `done` returns the payload; `failed` fails immediately without
    /// consuming the rest of the deadline; a deadline overrun is a distinct
    /// timeout error.
    pub async fn poll_result(
        &self,
        token: &JobToken,
        config: &PollConfig,
    ) -> Result<ScanPayload, ReceiptError> {
        let url = format!("{}/{}", self.result_url_base, token);
        tracing::info!(token = %token, "Polling for scan result");

        poll_with(config, || async {
            let response = self
                .http
                .get(&url)
                .header("apikey", &self.api_key)
                .send()
                .await?
                .error_for_status()?;
            Ok(response.json().await?)
        })
        .await
    }
}

/// Drive the poll schedule over an arbitrary fetch function
///
/// Factored out of [`Client::poll_result`] so the schedule can be exercised
/// against scripted payload sequences.
pub(crate) async fn poll_with<F, Fut>(
    config: &PollConfig,
    mut fetch: F,
) -> Result<ScanPayload, ReceiptError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ScanPayload, ReceiptError>>,
{
    tokio::time::sleep(config.initial_wait).await;
    let start = tokio::time::Instant::now();

    loop {
        let payload = fetch().await?;

        let failed = payload.status == ScanStatus::Failed || payload.success == Some(false);
        if failed {
            return Err(ReceiptError::Failed {
                detail: payload
                    .message
                    .unwrap_or_else(|| format!("status {:?}", payload.status)),
            });
        }
        if payload.status == ScanStatus::Done {
            return Ok(payload);
        }

        if start.elapsed() >= config.timeout {
            return Err(ReceiptError::Timeout {
                waited: config.timeout,
            });
        }
        tokio::time::sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::summary::Receipt;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn payload(status: ScanStatus) -> ScanPayload {
        ScanPayload {
            status,
            success: None,
            message: None,
            result: Some(Receipt::default()),
        }
    }

    // Zero-duration schedule so tests don't sleep
    fn instant_schedule(timeout: Duration) -> PollConfig {
        PollConfig {
            initial_wait: Duration::ZERO,
            interval: Duration::ZERO,
            timeout,
        }
    }

    fn scripted(
        payloads: Vec<ScanPayload>,
    ) -> impl FnMut() -> std::future::Ready<Result<ScanPayload, ReceiptError>> {
        let queue = Mutex::new(VecDeque::from(payloads));
        move || {
            let next = queue
                .lock()
                .unwrap()
                .pop_front()
                .expect("poller fetched past end of script");
            std::future::ready(Ok(next))
        }
    }

    #[tokio::test]
    async fn test_poller_waits_through_pending_to_done() {
        let result = poll_with(
            &instant_schedule(Duration::from_secs(60)),
            scripted(vec![
                payload(ScanStatus::Pending),
                payload(ScanStatus::Pending),
                payload(ScanStatus::Done),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(result.status, ScanStatus::Done);
        assert!(result.result.is_some());
    }

    #[tokio::test]
    async fn test_failed_status_errors_without_waiting_for_deadline() {
        let err = poll_with(
            &instant_schedule(Duration::from_secs(3600)),
            scripted(vec![payload(ScanStatus::Failed)]),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReceiptError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_explicit_success_false_is_a_failure() {
        let mut failed = payload(ScanStatus::Pending);
        failed.success = Some(false);
        failed.message = Some("unreadable image".to_string());

        let err = poll_with(&instant_schedule(Duration::from_secs(3600)), scripted(vec![failed]))
            .await
            .unwrap_err();

        match err {
            ReceiptError::Failed { detail } => assert_eq!(detail, "unreadable image"),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_overrun_is_a_timeout() {
        let err = poll_with(
            &instant_schedule(Duration::ZERO),
            scripted(vec![payload(ScanStatus::Pending)]),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReceiptError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_done_with_success_false_is_a_failure() {
        let mut done = payload(ScanStatus::Done);
        done.success = Some(false);

        let err = poll_with(&instant_schedule(Duration::from_secs(3600)), scripted(vec![done]))
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiptError::Failed { .. }));
    }
}
