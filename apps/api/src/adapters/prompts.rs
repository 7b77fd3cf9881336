// Prompt constants for the scoring stage. Each adapter that talks to the
// LLM keeps its prompts here, next to the code that fills them in.

/// System prompt enforcing JSON-only output for scoring calls.
pub const SCORE_SYSTEM: &str = "You are a precise job matching assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations.";

/// Per-posting scoring prompt. Placeholders: {resume_skills}, {resume_text},
/// {job_title}, {job_location}, {job_skills}.
pub const SCORE_PROMPT_TEMPLATE: &str = r#"Score how well this candidate fits one job posting.

CANDIDATE SKILLS: {resume_skills}
RESUME EXCERPT: {resume_text}

JOB TITLE: {job_title}
JOB LOCATION: {job_location}
JOB REQUIRED SKILLS: {job_skills}

Return ONLY this JSON shape:
{
  "score": 0-100 integer,
  "skill_gap": "one sentence naming what the posting asks for that the resume lacks",
  "improvements": "one or two concrete resume improvements for this posting, or null"
}

Rules:
- score reflects skill and location overlap, 0 = no fit, 100 = ideal fit
- integers only, no percent signs
- JSON only, no other text"#;
