//! Insight Aggregator: pure recomputation of the `InsightSnapshot` from the
//! full rejection history.
//!
//! Algorithm:
//! 1. Count stages and explicit reasons in one pass, keeping first-seen order.
//! 2. Rank each table by count, descending; a stable sort keeps ties in first-seen order.
//! 3. Detect patterns: stage_pattern, skill_gap, interview_prep (in that order).
//! 4. Improvement rate: change in the share of rejections past the resume screen,
//!    second half of the history vs first half.
//! 5. Derive the action plan from the patterns.

use tracing::debug;

use crate::insights::action_plan::derive_actions;
use crate::insights::models::{InsightSnapshot, Pattern, PatternSeverity, PatternType, ReasonCount};
use crate::rejections::models::{RejectionRecord, Stage};

/// A stage or reason has to recur at least this often to count as a pattern.
const PATTERN_MIN_COUNT: usize = 2;
const RECENT_WINDOW: usize = 5;
const RECENT_TECHNICAL_THRESHOLD: usize = 3;
const MIN_RECORDS_FOR_TREND: usize = 4;
const TOP_REASONS_LIMIT: usize = 3;

const INTERVIEW_PREP_MESSAGE: &str =
    "Most of your recent rejections came at the technical stage. Focus on interview practice.";

pub fn aggregate(history: &[RejectionRecord]) -> InsightSnapshot {
    let stage_counts = rank(count_in_order(history.iter().map(|r| r.stage)));
    let reason_counts = rank(count_in_order(
        history.iter().map(|r| r.explicit_reason.as_str()),
    ));

    let patterns = detect_patterns(history, &stage_counts, &reason_counts);
    let next_actions = derive_actions(&patterns);

    let snapshot = InsightSnapshot {
        total_rejections: history.len(),
        stage_breakdown: stage_counts.iter().copied().collect(),
        top_reasons: reason_counts
            .iter()
            .take(TOP_REASONS_LIMIT)
            .map(|(reason, count)| ReasonCount {
                reason: reason.to_string(),
                count: *count,
            })
            .collect(),
        improvement_rate: improvement_rate(history),
        patterns,
        next_actions,
    };

    debug!(
        "Aggregated {} rejections into {} patterns, {} actions",
        snapshot.total_rejections,
        snapshot.patterns.len(),
        snapshot.next_actions.len()
    );
    snapshot
}

fn detect_patterns(
    history: &[RejectionRecord],
    ranked_stages: &[(Stage, usize)],
    ranked_reasons: &[(&str, usize)],
) -> Vec<Pattern> {
    let mut patterns = Vec::new();

    if let Some(&(stage, count)) = ranked_stages.first() {
        if count >= PATTERN_MIN_COUNT {
            patterns.push(Pattern {
                pattern_type: PatternType::StagePattern,
                message: format!("Rejected at the {} stage {} times", stage.label(), count),
                severity: PatternSeverity::High,
                actionable: true,
            });
        }
    }

    if let Some(&(reason, count)) = ranked_reasons.first() {
        if count >= PATTERN_MIN_COUNT {
            patterns.push(Pattern {
                pattern_type: PatternType::SkillGap,
                message: format!("\"{reason}\" was cited as the reason {count} times"),
                severity: PatternSeverity::Critical,
                actionable: true,
            });
        }
    }

    let recent_start = history.len().saturating_sub(RECENT_WINDOW);
    let recent_technical = history[recent_start..]
        .iter()
        .filter(|r| r.stage == Stage::Technical)
        .count();
    if recent_technical >= RECENT_TECHNICAL_THRESHOLD {
        patterns.push(Pattern {
            pattern_type: PatternType::InterviewPrep,
            message: INTERVIEW_PREP_MESSAGE.to_string(),
            severity: PatternSeverity::High,
            actionable: true,
        });
    }

    patterns
}

/// Percentage-point change in the interview rate, rounded to one decimal.
pub fn improvement_rate(history: &[RejectionRecord]) -> Option<f64> {
    if history.len() < MIN_RECORDS_FOR_TREND {
        return None;
    }
    let (first, second) = history.split_at(history.len() / 2);
    let delta = (interview_rate(second) - interview_rate(first)) * 100.0;
    // `+ 0.0` folds a rounded -0.0 into 0.0
    Some((delta * 10.0).round() / 10.0 + 0.0)
}

/// Share of records that made it past the resume screen. Callers never pass an empty slice.
fn interview_rate(records: &[RejectionRecord]) -> f64 {
    let interviewed = records
        .iter()
        .filter(|r| r.stage != Stage::ResumeScreen)
        .count();
    interviewed as f64 / records.len() as f64
}

fn count_in_order<K: PartialEq>(keys: impl IntoIterator<Item = K>) -> Vec<(K, usize)> {
    let mut counts: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

fn rank<K>(mut counts: Vec<(K, usize)>) -> Vec<(K, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
