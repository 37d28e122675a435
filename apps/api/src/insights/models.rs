use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rejections::models::Stage;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    StagePattern,
    SkillGap,
    InterviewPrep,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternSeverity {
    High,
    Critical,
}

/// A recurring signal detected across the rejection history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub message: String,
    pub severity: PatternSeverity,
    pub actionable: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    Critical,
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionItem {
    pub priority: ActionPriority,
    pub action: String,
    pub description: String,
    pub timeframe: String,
    pub impact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
}

/// Fully derived summary of the rejection history. Recomputed on every
/// history change, never edited in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightSnapshot {
    pub total_rejections: usize,
    pub patterns: Vec<Pattern>,
    pub stage_breakdown: BTreeMap<Stage, usize>,
    pub top_reasons: Vec<ReasonCount>,
    /// Percentage-point change in the share of rejections that got past the
    /// resume screen, second half of the history vs first. `None` below 4 records.
    pub improvement_rate: Option<f64>,
    pub next_actions: Vec<ActionItem>,
}
