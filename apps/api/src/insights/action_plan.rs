//! Action plan: maps detected patterns to concrete next steps.
//!
//! Matching is data: `ACTION_RULES` is scanned in order for each pattern and
//! the first rule whose pattern type matches and whose keyword occurs in the
//! lower-cased pattern message fires. At most one action per pattern.

use crate::insights::models::{ActionItem, ActionPriority, Pattern, PatternType};

/// Static description of an action, materialized into an `ActionItem` when a rule fires.
#[derive(Debug)]
pub struct ActionTemplate {
    pub priority: ActionPriority,
    pub action: &'static str,
    pub description: &'static str,
    pub timeframe: &'static str,
    pub impact: &'static str,
    pub resources: &'static [&'static str],
}

impl ActionTemplate {
    pub fn to_item(&self) -> ActionItem {
        ActionItem {
            priority: self.priority,
            action: self.action.to_string(),
            description: self.description.to_string(),
            timeframe: self.timeframe.to_string(),
            impact: self.impact.to_string(),
            resources: if self.resources.is_empty() {
                None
            } else {
                Some(self.resources.iter().map(|r| r.to_string()).collect())
            },
        }
    }
}

#[derive(Debug)]
pub struct ActionRule {
    pub pattern_type: PatternType,
    /// Lower-case substrings; any one matching is enough.
    pub keywords: &'static [&'static str],
    pub template: ActionTemplate,
}

impl ActionRule {
    fn matches(&self, pattern: &Pattern, lowered_message: &str) -> bool {
        self.pattern_type == pattern.pattern_type
            && self.keywords.iter().any(|k| lowered_message.contains(k))
    }
}

pub const ACTION_RULES: &[ActionRule] = &[
    ActionRule {
        pattern_type: PatternType::SkillGap,
        keywords: &["system design"],
        template: ActionTemplate {
            priority: ActionPriority::Critical,
            action: "Take a system design course",
            description: "Work through a structured system design curriculum and practice \
                designing a scalable service end to end every few days.",
            timeframe: "2 weeks",
            impact: "Targets your most frequently cited rejection reason",
            resources: &[
                "Grokking the System Design Interview",
                "Designing Data-Intensive Applications",
                "The System Design Primer",
            ],
        },
    },
    ActionRule {
        pattern_type: PatternType::SkillGap,
        keywords: &["algorithm"],
        template: ActionTemplate {
            priority: ActionPriority::Critical,
            action: "Practice structured problem sets",
            description: "Solve two to three problems a day from a curated list organized by \
                pattern, timing yourself and reviewing optimal solutions.",
            timeframe: "4 weeks",
            impact: "Builds the speed and pattern recognition coding rounds test for",
            resources: &["NeetCode 150", "Blind 75", "Elements of Programming Interviews"],
        },
    },
    ActionRule {
        pattern_type: PatternType::SkillGap,
        keywords: &["production", "experience"],
        template: ActionTemplate {
            priority: ActionPriority::High,
            action: "Ship a production project",
            description: "Build a small service with real users, deploy it with CI, \
                monitoring and a database, and write up the operational decisions you made.",
            timeframe: "3 weeks",
            impact: "Gives you concrete production stories to point to in interviews",
            resources: &["Fly.io or Render free tier", "GitHub Actions", "Grafana Cloud free tier"],
        },
    },
    ActionRule {
        pattern_type: PatternType::StagePattern,
        keywords: &["technical"],
        template: ActionTemplate {
            priority: ActionPriority::Critical,
            action: "Schedule mock technical interviews",
            description: "Do at least two mock technical interviews a week with peers or a \
                practice platform and debrief each one in writing.",
            timeframe: "2 weeks",
            impact: "Technical rounds are where most of your rejections happen",
            resources: &["Pramp", "interviewing.io"],
        },
    },
];

pub const FALLBACK_ACTION: ActionTemplate = ActionTemplate {
    priority: ActionPriority::Medium,
    action: "Expand your application pool",
    description: "No strong pattern yet. Keep applying broadly and log every rejection \
        so recurring signals can surface.",
    timeframe: "Ongoing",
    impact: "More data points make patterns visible sooner",
    resources: &[],
};

/// Derives the ordered action list for the given patterns (in detection order).
pub fn derive_actions(patterns: &[Pattern]) -> Vec<ActionItem> {
    derive_actions_with(patterns, ACTION_RULES)
}

pub fn derive_actions_with(patterns: &[Pattern], rules: &[ActionRule]) -> Vec<ActionItem> {
    let mut actions: Vec<ActionItem> = patterns
        .iter()
        .filter_map(|pattern| {
            let lowered = pattern.message.to_lowercase();
            rules
                .iter()
                .find(|rule| rule.matches(pattern, &lowered))
                .map(|rule| rule.template.to_item())
        })
        .collect();

    if actions.is_empty() {
        actions.push(FALLBACK_ACTION.to_item());
    }
    actions
}
