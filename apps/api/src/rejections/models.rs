use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Point in the hiring pipeline at which a rejection happened.
/// Declaration order follows the pipeline, which is also the map order in
/// `InsightSnapshot::stage_breakdown`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResumeScreen,
    Phone,
    Technical,
    Behavioral,
    Final,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ResumeScreen => "resume_screen",
            Stage::Phone => "phone",
            Stage::Technical => "technical",
            Stage::Behavioral => "behavioral",
            Stage::Final => "final",
        }
    }

    /// Human-readable label: word separators become spaces.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Technical and final-round rejections mark a gap as high priority.
    pub fn is_late_stage(&self) -> bool {
        matches!(self, Stage::Technical | Stage::Final)
    }

    pub fn emotional_context(&self) -> EmotionalContext {
        match self {
            Stage::Final => EmotionalContext::Devastating,
            Stage::ResumeScreen => EmotionalContext::Expected,
            _ => EmotionalContext::Surprising,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_enum_value(s).as_str() {
            "resume_screen" => Ok(Stage::ResumeScreen),
            "phone" => Ok(Stage::Phone),
            "technical" => Ok(Stage::Technical),
            "behavioral" => Ok(Stage::Behavioral),
            "final" => Ok(Stage::Final),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_enum_value(s).as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(s.to_string()),
        }
    }
}

/// Derived locally from the stage; never requested from the extraction service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalContext {
    Devastating,
    Expected,
    Surprising,
}

/// One rejection event. Immutable once created; the history only grows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RejectionRecord {
    pub id: Uuid,
    pub company: String,
    pub role: String,
    pub stage: Stage,
    pub explicit_reason: String,
    pub implicit_signals: Vec<String>,
    pub severity: Severity,
    pub emotional_context: EmotionalContext,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

/// `"Resume Screen"`, `"resume-screen"` and `"RESUME_SCREEN"` all normalize to `resume_screen`.
fn normalize_enum_value(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_from_str_is_lenient_about_case_and_separators() {
        assert_eq!("Resume Screen".parse::<Stage>(), Ok(Stage::ResumeScreen));
        assert_eq!("resume-screen".parse::<Stage>(), Ok(Stage::ResumeScreen));
        assert_eq!(" TECHNICAL ".parse::<Stage>(), Ok(Stage::Technical));
        assert!("onsite".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_label_replaces_underscores() {
        assert_eq!(Stage::ResumeScreen.label(), "resume screen");
        assert_eq!(Stage::Technical.label(), "technical");
    }

    #[test]
    fn test_emotional_context_follows_stage() {
        assert_eq!(Stage::Final.emotional_context(), EmotionalContext::Devastating);
        assert_eq!(Stage::ResumeScreen.emotional_context(), EmotionalContext::Expected);
        assert_eq!(Stage::Phone.emotional_context(), EmotionalContext::Surprising);
        assert_eq!(Stage::Technical.emotional_context(), EmotionalContext::Surprising);
        assert_eq!(Stage::Behavioral.emotional_context(), EmotionalContext::Surprising);
    }

    #[test]
    fn test_record_serializes_camel_case_with_snake_case_enums() {
        let record = RejectionRecord {
            id: Uuid::nil(),
            company: "Acme".to_string(),
            role: "Backend Engineer".to_string(),
            stage: Stage::ResumeScreen,
            explicit_reason: "experience".to_string(),
            implicit_signals: vec![],
            severity: Severity::Low,
            emotional_context: EmotionalContext::Expected,
            raw_text: "raw".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["stage"], "resume_screen");
        assert_eq!(json["explicitReason"], "experience");
        assert_eq!(json["emotionalContext"], "expected");
        assert!(json.get("implicitSignals").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
