use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::insights::aggregator::aggregate;
use crate::insights::models::InsightSnapshot;
use crate::profile::folding::{fold_record_into_profile, start_remediation, RemediationError};
use crate::profile::models::UserProfile;
use crate::rejections::models::RejectionRecord;

/// Everything one job seeker has: the append-only rejection history, the
/// insights derived from it, and the profile. This is also the persisted blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    #[serde(default)]
    pub rejections: Vec<RejectionRecord>,
    /// Written for readers of the blob but never read back; `load` recomputes it.
    #[serde(default, skip_deserializing)]
    pub insights: InsightSnapshot,
    #[serde(default)]
    pub profile: UserProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub target_role: Option<String>,
}

impl SessionState {
    /// Appends `record`, folds it into the profile and recomputes insights.
    pub fn with_record(mut self, record: RejectionRecord) -> Self {
        self.profile = fold_record_into_profile(self.profile, &record);
        self.rejections.push(record);
        self.insights = aggregate(&self.rejections);
        self
    }

    pub fn with_remediation_started(
        mut self,
        area: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, RemediationError> {
        self.profile = start_remediation(self.profile, area, now)?;
        Ok(self)
    }

    /// Blank or missing fields leave the current value in place.
    pub fn with_profile_update(mut self, update: ProfileUpdate) -> Self {
        if let Some(name) = update.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            self.profile.name = name;
        }
        if let Some(role) = update
            .target_role
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
        {
            self.profile.target_role = role;
        }
        self
    }

    /// Insights are derived data; after loading a blob written by an older
    /// build they are recomputed rather than trusted.
    pub fn with_fresh_insights(mut self) -> Self {
        self.insights = aggregate(&self.rejections);
        self
    }
}
