use serde::{Deserialize, Serialize};

/// Structured candidate profile produced by resume parsing.
/// Immutable once built; the pipeline threads it by reference into every
/// scoring call and into email dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Detected skills in the order they appear in the skill database scan.
    pub skills: Vec<String>,
    /// Extracted text, capped at `RAW_TEXT_CAP` characters.
    pub raw_text: String,
}

/// Upper bound on retained resume text. Keeps scoring prompts bounded.
pub const RAW_TEXT_CAP: usize = 5000;

impl ResumeProfile {
    /// Short display form used in log lines and email signatures.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Candidate"
        } else {
            &self.name
        }
    }
}
