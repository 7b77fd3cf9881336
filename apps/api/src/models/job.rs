use serde::{Deserialize, Serialize};

/// One job posting scraped from a company career page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub location: Option<String>,
    /// Required skills in the order the posting lists them.
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub apply_url: String,
    /// Company the posting was scraped from.
    pub company: String,
    #[serde(default)]
    pub seniority: Option<String>,
}

/// Priority bucket surfaced to the client alongside the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPriority {
    High,
    Medium,
    Low,
}

impl MatchPriority {
    /// Buckets a score: ≥80 high, ≥60 medium, otherwise low.
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=100 => MatchPriority::High,
            60..=79 => MatchPriority::Medium,
            _ => MatchPriority::Low,
        }
    }
}

/// Scoring verdict for one resume/posting pair. Created by the scoring
/// stage and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub posting: JobPosting,
    /// Match quality, always in [0, 100].
    pub score: u8,
    /// What the posting asks for that the resume does not show.
    pub skill_gap: String,
    pub priority: MatchPriority,
    #[serde(default)]
    pub improvements: Option<String>,
}

/// Orders match results best-first: score descending, ties keeping the
/// original scrape order. Callers pass results still carrying their scrape
/// index; the sort is stable so equal scores never swap.
pub fn rank_matches(mut results: Vec<MatchResult>) -> Vec<MatchResult> {
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(title: &str) -> JobPosting {
        JobPosting {
            title: title.to_string(),
            location: None,
            required_skills: vec![],
            apply_url: format!("https://jobs.example.com/{title}"),
            company: "Example".to_string(),
            seniority: None,
        }
    }

    fn result(title: &str, score: u8) -> MatchResult {
        MatchResult {
            posting: posting(title),
            score,
            skill_gap: String::new(),
            priority: MatchPriority::from_score(score),
            improvements: None,
        }
    }

    #[test]
    fn test_rank_matches_sorts_descending() {
        let ranked = rank_matches(vec![result("a", 40), result("b", 80), result("c", 60)]);
        let scores: Vec<u8> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![80, 60, 40]);
    }

    #[test]
    fn test_rank_matches_ties_keep_scrape_order() {
        let ranked = rank_matches(vec![result("first", 70), result("second", 70)]);
        assert_eq!(ranked[0].posting.title, "first");
        assert_eq!(ranked[1].posting.title, "second");
    }

    #[test]
    fn test_priority_buckets() {
        assert_eq!(MatchPriority::from_score(92), MatchPriority::High);
        assert_eq!(MatchPriority::from_score(80), MatchPriority::High);
        assert_eq!(MatchPriority::from_score(79), MatchPriority::Medium);
        assert_eq!(MatchPriority::from_score(60), MatchPriority::Medium);
        assert_eq!(MatchPriority::from_score(59), MatchPriority::Low);
        assert_eq!(MatchPriority::from_score(0), MatchPriority::Low);
    }
}
