//! Client for the transcript extraction service.
//!
//! One multipart upload, one JSON answer. The request carries a deadline and
//! is never retried; every failure maps onto a single [`ExtractionError`].

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{info, warn};

use crate::compute::percentage_from_average;
use crate::models::{CourseBreakdown, CourseRecord, ExtractionResponse};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/parse-pdf";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read transcript {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transcript must be a PDF file: {0}")]
    NotPdf(String),
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
    #[error("extraction request failed: {0}")]
    Transport(String),
    #[error("extraction service returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("extraction service reported an error: {0}")]
    Service(String),
    #[error("failed to decode extraction response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct ExtractionClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl ExtractionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub async fn extract_file(
        &self,
        path: &Path,
        scheme: Option<&str>,
    ) -> Result<ExtractionResponse, ExtractionError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("transcript.pdf")
            .to_string();
        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ExtractionError::NotPdf(file_name));
        }

        let bytes = tokio::fs::read(path).await.map_err(|source| ExtractionError::Read {
            path: path.display().to_string(),
            source,
        })?;

        self.extract(bytes, &file_name, scheme).await
    }

    pub async fn extract(
        &self,
        document: Vec<u8>,
        file_name: &str,
        scheme: Option<&str>,
    ) -> Result<ExtractionResponse, ExtractionError> {
        let part = reqwest::multipart::Part::bytes(document)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ExtractionError::Transport(e.to_string()))?;
        let mut form = reqwest::multipart::Form::new().part("pdf_file", part);
        if let Some(scheme) = scheme {
            form = form.text("scheme", scheme.to_string());
        }

        info!(endpoint = %self.endpoint, file = file_name, "sending transcript for extraction");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        decode_response(status, &body)
    }

    fn classify(&self, error: reqwest::Error) -> ExtractionError {
        if error.is_timeout() {
            warn!(timeout = ?self.timeout, "extraction request timed out");
            ExtractionError::Timeout(self.timeout)
        } else {
            warn!(%error, "extraction request failed");
            ExtractionError::Transport(error.to_string())
        }
    }
}

/// Interprets a raw service answer. A non-2xx status or an `error` field
/// fails the call even when the rest of the payload is usable.
pub fn decode_response(status: StatusCode, body: &str) -> Result<ExtractionResponse, ExtractionError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ExtractionResponse>(body)
            .ok()
            .and_then(|payload| payload.error)
            .unwrap_or_else(|| body.to_string());
        return Err(ExtractionError::Status {
            status,
            body: message,
        });
    }

    let payload: ExtractionResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::Decode(e.to_string()))?;
    if let Some(error) = payload.error {
        return Err(ExtractionError::Service(error));
    }
    Ok(payload)
}

/// Totals and breakdown for an extraction response. Service totals win when
/// present; the percentage is always derived locally.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTotals {
    pub total_credits: f64,
    pub total_weighted_points: f64,
    pub weighted_average: f64,
    pub derived_percentage: f64,
    pub breakdown: Vec<CourseBreakdown>,
}

pub fn summarize(response: &ExtractionResponse) -> ExtractedTotals {
    let breakdown: Vec<CourseBreakdown> = response
        .subjects
        .values()
        .map(|subject| CourseBreakdown {
            code: subject.code.clone(),
            name: subject.name.clone(),
            credits: credits_of(subject.credits),
            grade: subject.grade.clone(),
            points: subject.grade_point,
            weighted_points: subject.credits * subject.grade_point,
        })
        .collect();

    let total_credits = response
        .total_credits
        .unwrap_or_else(|| response.subjects.values().map(|s| s.credits).sum());
    let total_weighted_points = response
        .total_weighted_points
        .unwrap_or_else(|| breakdown.iter().map(|b| b.weighted_points).sum());
    let average = response.sgpa.unwrap_or_else(|| {
        if total_credits > 0.0 {
            total_weighted_points / total_credits
        } else {
            0.0
        }
    });

    ExtractedTotals {
        total_credits,
        total_weighted_points,
        weighted_average: average,
        derived_percentage: percentage_from_average(average),
        breakdown,
    }
}

/// Subjects as ledger records, ordered by subject code.
pub fn to_records(response: &ExtractionResponse) -> Vec<CourseRecord> {
    response
        .subjects
        .values()
        .map(|subject| CourseRecord {
            code: subject.code.clone(),
            name: subject.name.clone(),
            credits: credits_of(subject.credits),
            grade: subject.grade.clone(),
        })
        .collect()
}

fn credits_of(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}
