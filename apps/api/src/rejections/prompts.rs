// Rejection extraction prompt template.
// The feedback text is substituted for {feedback_text}; no system prompt is sent.

pub const REJECTION_EXTRACT_PROMPT: &str = r#"Analyze this job rejection feedback and extract structured data.

FEEDBACK:
{feedback_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "company": "string (use \"Unknown\" if not mentioned)",
  "role": "string (use \"Unknown\" if not mentioned)",
  "stage": "resume_screen" | "phone" | "technical" | "behavioral" | "final",
  "explicitReason": "string (the main stated reason, short, lowercase, e.g. \"system design\")",
  "implicitSignals": ["string"],
  "severity": "low" | "medium" | "high"
}

RULES:
1. Respond with a single JSON object only.
2. Do NOT include any text before or after the JSON.
3. Do NOT wrap the JSON in markdown code fences."#;

pub fn build_extract_prompt(feedback_text: &str) -> String {
    REJECTION_EXTRACT_PROMPT.replace("{feedback_text}", feedback_text)
}
