// User profile: skill gaps folded from rejections, remediation lifecycle.

pub mod folding;
pub mod handlers;
pub mod models;
