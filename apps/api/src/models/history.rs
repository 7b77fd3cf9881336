use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Summary record of one completed analysis run. Appended once per
/// successful (or partially successful) run and never updated in place.
/// Duplicate user+company entries are allowed; de-duplication is left to
/// query time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub company: String,
    pub company_url: String,
    pub jobs_count: i32,
    /// Best score of the run. `None` when the run produced zero scores
    /// (e.g. the company listed no openings).
    pub top_match_score: Option<i32>,
}

impl HistoryEntry {
    pub fn new(
        user_id: &str,
        company: &str,
        company_url: &str,
        jobs_count: usize,
        top_match_score: Option<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            company: company.to_string(),
            company_url: company_url.to_string(),
            jobs_count: jobs_count as i32,
            top_match_score: top_match_score.map(i32::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_maps_score_to_option() {
        let with = HistoryEntry::new("user1", "Acme", "https://acme.dev", 3, Some(80));
        assert_eq!(with.top_match_score, Some(80));

        let without = HistoryEntry::new("user1", "Acme", "https://acme.dev", 0, None);
        assert_eq!(without.top_match_score, None);
        assert_eq!(without.jobs_count, 0);
    }

    #[test]
    fn test_entry_serializes_round_trip() {
        let entry = HistoryEntry::new("user1", "Acme", "https://acme.dev", 2, Some(91));
        let json = serde_json::to_string(&entry).unwrap();
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.company, "Acme");
        assert_eq!(back.top_match_score, Some(91));
    }
}
