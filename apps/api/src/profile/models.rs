use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    Identified,
    InProgress,
    /// Reserved: nothing in this service moves a gap here yet.
    #[allow(dead_code)]
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GapPriority {
    High,
    Medium,
}

/// One recurring rejection reason, keyed by `area` (the explicit reason text).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub area: String,
    pub evidence_count: u32,
    pub last_occurrence: DateTime<Utc>,
    pub remediation_status: RemediationStatus,
    pub priority: GapPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    Active,
    #[allow(dead_code)]
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementTrack {
    pub id: Uuid,
    pub gap: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub actions: Vec<String>,
    pub status: TrackStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub target_role: String,
    #[serde(default)]
    pub skill_gaps: Vec<SkillGap>,
    #[serde(default)]
    pub improvement_tracking: Vec<ImprovementTrack>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Job Seeker".to_string(),
            target_role: "Software Engineer".to_string(),
            skill_gaps: Vec::new(),
            improvement_tracking: Vec::new(),
        }
    }
}

#[cfg(test)]
impl UserProfile {
    pub fn gap(&self, area: &str) -> Option<&SkillGap> {
        self.skill_gaps.iter().find(|g| g.area == area)
    }
}
