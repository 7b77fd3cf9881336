//! Resume parsing stage — PDF/plain-text extraction plus basic-info mining.
//!
//! Extraction is heuristic by design: name from the first plausible header
//! line, phone/email by pattern, skills by a category keyword database
//! scan. An unreadable or empty document is a `StageError::Parse`.

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;

use crate::adapters::{ParseResume, StageError};
use crate::models::resume::{ResumeProfile, RAW_TEXT_CAP};

/// Skill keyword database, scanned in order so detected skills come out in
/// a stable, category-grouped sequence. Shared with the scraper, which
/// mines posting titles with the same list.
pub(crate) const SKILL_DATABASE: &[&str] = &[
    // languages
    "python", "java", "javascript", "typescript", "c++", "c#", "go", "rust", "swift", "kotlin",
    "scala", "php", "ruby",
    // frontend
    "react", "angular", "vue", "svelte", "next.js", "html", "css", "tailwind",
    // backend
    "node", "express", "django", "flask", "spring", "laravel",
    // data
    "sql", "mysql", "postgresql", "mongodb", "redis",
    // cloud / devops
    "aws", "azure", "gcp", "docker", "kubernetes", "terraform", "jenkins", "git",
];

pub struct PdfResumeParser;

#[async_trait]
impl ParseResume for PdfResumeParser {
    async fn parse(&self, input: Bytes, mime: &str) -> Result<ResumeProfile, StageError> {
        if input.is_empty() {
            return Err(StageError::Parse("resume input is empty".to_string()));
        }

        let is_pdf = mime == "application/pdf" || input.starts_with(b"%PDF");
        let text = if is_pdf {
            // pdf-extract is CPU-bound; keep it off the async executor.
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&input))
                .await
                .map_err(|e| StageError::Parse(format!("extraction task failed: {e}")))?
                .map_err(|e| StageError::Parse(format!("could not read PDF: {e}")))?
        } else {
            String::from_utf8_lossy(&input).into_owned()
        };

        let text = normalize(&text);
        if text.is_empty() {
            return Err(StageError::Parse(
                "no text could be extracted from the resume".to_string(),
            ));
        }

        Ok(extract_profile(&text))
    }
}

/// Trims lines, drops blank ones, and caps the retained text.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(RAW_TEXT_CAP));
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        if out.len() >= RAW_TEXT_CAP {
            break;
        }
    }
    if let Some((idx, _)) = out.char_indices().nth(RAW_TEXT_CAP) {
        out.truncate(idx);
    }
    out
}

fn extract_profile(text: &str) -> ResumeProfile {
    ResumeProfile {
        name: extract_name(text),
        phone: extract_phone(text),
        email: extract_email(text),
        skills: extract_skills(text),
        raw_text: text.to_string(),
    }
}

/// First line of 2–4 alphabetic words is taken as the candidate name.
fn extract_name(text: &str) -> String {
    for line in text.lines().take(5) {
        let words: Vec<&str> = line.split_whitespace().collect();
        if (2..=4).contains(&words.len())
            && words
                .iter()
                .all(|w| w.chars().all(|c| c.is_alphabetic() || c == '.' || c == '\''))
        {
            return line.trim().to_string();
        }
    }
    String::new()
}

fn extract_email(text: &str) -> Option<String> {
    let re = Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
    re.find(text).map(|m| m.as_str().to_string())
}

fn extract_phone(text: &str) -> Option<String> {
    let re = Regex::new(r"\+?\d[\d\s().-]{8,14}\d").unwrap();
    re.find(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|p| p.chars().filter(|c| c.is_ascii_digit()).count() >= 10)
}

/// Scans the skill database against the lowercased text. Word-ish boundary
/// check keeps "java" from matching inside "javascript".
pub(crate) fn extract_skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    SKILL_DATABASE
        .iter()
        .filter(|skill| contains_token(&lower, skill))
        .map(|s| s.to_string())
        .collect()
}

fn contains_token(haystack: &str, token: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(token) {
        let abs = start + pos;
        let before_ok = abs == 0
            || !haystack[..abs]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after = abs + token.len();
        let after_ok = after >= haystack.len()
            || !haystack[after..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = abs + token.len();
    }
    false
}
