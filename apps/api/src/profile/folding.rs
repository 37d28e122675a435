//! Pure reducers over `UserProfile`: folding new rejections into skill gaps and
//! the `identified → in_progress` remediation transition.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::profile::models::{
    GapPriority, ImprovementTrack, RemediationStatus, SkillGap, TrackStatus, UserProfile,
};
use crate::rejections::models::RejectionRecord;

#[derive(Debug, Error, PartialEq)]
pub enum RemediationError {
    #[error("no skill gap named '{0}'")]
    UnknownGap(String),

    #[error("remediation for '{area}' already started (status: {status:?})")]
    AlreadyStarted {
        area: String,
        status: RemediationStatus,
    },
}

/// Counts `record` as evidence for the gap matching its explicit reason,
/// creating the gap on first sight.
pub fn fold_record_into_profile(mut profile: UserProfile, record: &RejectionRecord) -> UserProfile {
    match profile
        .skill_gaps
        .iter_mut()
        .find(|g| g.area == record.explicit_reason)
    {
        Some(gap) => {
            gap.evidence_count += 1;
            gap.last_occurrence = record.created_at;
        }
        None => profile.skill_gaps.push(SkillGap {
            area: record.explicit_reason.clone(),
            evidence_count: 1,
            last_occurrence: record.created_at,
            remediation_status: RemediationStatus::Identified,
            priority: if record.stage.is_late_stage() {
                GapPriority::High
            } else {
                GapPriority::Medium
            },
            started_date: None,
        }),
    }
    profile
}

/// Moves an identified gap to in_progress and opens an improvement track for it.
/// Gaps already past `identified` are rejected and the profile is left as is.
pub fn start_remediation(
    mut profile: UserProfile,
    area: &str,
    now: DateTime<Utc>,
) -> Result<UserProfile, RemediationError> {
    let gap = profile
        .skill_gaps
        .iter_mut()
        .find(|g| g.area == area)
        .ok_or_else(|| RemediationError::UnknownGap(area.to_string()))?;

    if gap.remediation_status != RemediationStatus::Identified {
        return Err(RemediationError::AlreadyStarted {
            area: area.to_string(),
            status: gap.remediation_status,
        });
    }

    gap.remediation_status = RemediationStatus::InProgress;
    gap.started_date = Some(now);

    profile.improvement_tracking.push(ImprovementTrack {
        id: Uuid::new_v4(),
        gap: area.to_string(),
        start_date: now,
        actions: Vec::new(),
        status: TrackStatus::Active,
    });
    Ok(profile)
}
