//! Extraction Adapter: turns free-form rejection feedback into a `RejectionRecord`.
//!
//! The backend is pluggable through the `Extractor` trait. The session controller
//! holds an `Arc<dyn Extractor>`; production wires `LlmExtractor`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::llm_client::{LlmClient, LlmError};
use crate::rejections::models::{RejectionRecord, Severity, Stage};
use crate::rejections::prompts::build_extract_prompt;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction service call failed: {0}")]
    Service(#[from] LlmError),

    #[error("extraction reply is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("extraction reply has invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },
}

impl ExtractionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExtractionError::Service(LlmError::Timeout(_)))
    }
}

#[async_trait]
pub trait Extractor: Send + Sync {
    /// `text` must already be non-empty after trimming.
    async fn extract(&self, text: &str) -> Result<RejectionRecord, ExtractionError>;
}

/// Extraction via the Anthropic Messages API.
pub struct LlmExtractor(pub LlmClient);

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, text: &str) -> Result<RejectionRecord, ExtractionError> {
        let prompt = build_extract_prompt(text);
        let raw: RawExtraction = self.0.call_json(&prompt).await?;
        let record = raw.into_record(text, Utc::now())?;
        info!(
            "Extracted rejection {} ({}, stage={})",
            record.id, record.company, record.stage
        );
        Ok(record)
    }
}

/// The JSON shape requested from the extraction service. Every field is
/// optional at the wire level; `into_record` decides what is defaulted and
/// what is required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtraction {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub explicit_reason: Option<String>,
    #[serde(default)]
    pub implicit_signals: Option<Vec<String>>,
    #[serde(default)]
    pub severity: Option<String>,
}

impl RawExtraction {
    /// Strict parse-with-defaults: company/role/signals/severity fall back to
    /// defaults, stage and explicitReason are required.
    pub fn into_record(
        self,
        raw_text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<RejectionRecord, ExtractionError> {
        let stage_value = non_blank(self.stage).ok_or(ExtractionError::MissingField("stage"))?;
        let stage: Stage = stage_value
            .parse()
            .map_err(|value| ExtractionError::InvalidField {
                field: "stage",
                value,
            })?;

        let explicit_reason = non_blank(self.explicit_reason)
            .ok_or(ExtractionError::MissingField("explicitReason"))?;

        let severity = match non_blank(self.severity) {
            Some(value) => value
                .parse::<Severity>()
                .map_err(|value| ExtractionError::InvalidField {
                    field: "severity",
                    value,
                })?,
            None => Severity::default(),
        };

        let implicit_signals = self
            .implicit_signals
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(RejectionRecord {
            id: Uuid::now_v7(),
            company: non_blank(self.company).unwrap_or_else(|| UNKNOWN.to_string()),
            role: non_blank(self.role).unwrap_or_else(|| UNKNOWN.to_string()),
            stage,
            explicit_reason,
            implicit_signals,
            severity,
            emotional_context: stage.emotional_context(),
            raw_text: raw_text.to_string(),
            created_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
