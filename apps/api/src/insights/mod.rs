// Insight engine: frequency tables, pattern detection, improvement trend, action plan.
// Everything here is a pure function of the rejection history.

pub mod action_plan;
pub mod aggregator;
pub mod handlers;
pub mod models;
