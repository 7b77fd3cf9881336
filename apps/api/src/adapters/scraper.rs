//! Job scraping stage — fetches a company career page and mines postings
//! from its markup.
//!
//! Career pages share no schema, so extraction is heuristic: anchors whose
//! href looks like a posting link become `JobPosting`s, and the company
//! name is resolved from page metadata with the URL host as last resort.
//! Zero postings is a valid result; only fetch and URL problems are errors.

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::adapters::parser::extract_skills;
use crate::adapters::{ScrapeJobs, ScrapedJobs, StageError};
use crate::models::job::JobPosting;

/// Upper bound on postings taken from one page.
const MAX_POSTINGS: usize = 15;

/// href substrings that mark an anchor as a posting link.
const POSTING_HINTS: &[&str] = &["job", "career", "position", "opening", "vacanc", "role"];

const SENIORITY_LEVELS: &[&str] = &["intern", "junior", "senior", "staff", "principal", "lead"];

pub struct HtmlJobScraper {
    client: reqwest::Client,
}

impl HtmlJobScraper {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .user_agent("jobscout/0.1")
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ScrapeJobs for HtmlJobScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedJobs, StageError> {
        let base = Url::parse(url)
            .map_err(|e| StageError::Scrape(format!("invalid company URL '{url}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(StageError::Scrape(format!(
                "unsupported URL scheme '{}'",
                base.scheme()
            )));
        }

        let response = self
            .client
            .get(base.clone())
            .send()
            .await
            .map_err(|e| StageError::Scrape(format!("fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| StageError::Scrape(format!("career page returned error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| StageError::Scrape(format!("could not read page body: {e}")))?;

        // `scraper::Html` is not Send, so parsing stays inside this sync
        // call and never crosses an await point.
        Ok(parse_career_page(&html, &base))
    }
}

/// Pure extraction over fetched markup. Split out so tests run on fixtures
/// without a network.
fn parse_career_page(html: &str, base: &Url) -> ScrapedJobs {
    let doc = Html::parse_document(html);
    let company = resolve_company_name(&doc, base);

    let anchor_sel = Selector::parse("a[href]").unwrap();
    let mut postings = Vec::new();
    let mut seen_urls = Vec::new();

    for anchor in doc.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href_lower = href.to_lowercase();
        if !POSTING_HINTS.iter().any(|hint| href_lower.contains(hint)) {
            continue;
        }

        let title = anchor.text().collect::<String>().trim().to_string();
        if !(4..=120).contains(&title.len()) {
            continue;
        }

        let Ok(apply_url) = base.join(href) else {
            continue;
        };
        // Listing pages link the same posting more than once.
        if seen_urls.contains(&apply_url) {
            continue;
        }
        seen_urls.push(apply_url.clone());

        let title_lower = title.to_lowercase();
        postings.push(JobPosting {
            required_skills: extract_skills(&title),
            location: None,
            seniority: SENIORITY_LEVELS
                .iter()
                .find(|level| title_lower.contains(*level))
                .map(|s| s.to_string()),
            apply_url: apply_url.to_string(),
            company: company.clone(),
            title,
        });

        if postings.len() >= MAX_POSTINGS {
            break;
        }
    }

    ScrapedJobs { company, postings }
}

/// Company name, best source first: og:site_name, then the first segment of
/// the page title, then the URL host. No hardcoded company table.
fn resolve_company_name(doc: &Html, base: &Url) -> String {
    let og_sel = Selector::parse(r#"meta[property="og:site_name"]"#).unwrap();
    if let Some(name) = doc
        .select(&og_sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|s| s.len() > 1)
    {
        return name.to_string();
    }

    let title_sel = Selector::parse("title").unwrap();
    if let Some(title) = doc.select(&title_sel).next() {
        let text = title.text().collect::<String>();
        let first = text
            .split(['|', '-', '—', '·'])
            .next()
            .unwrap_or("")
            .trim();
        if first.len() > 2 {
            return first.to_string();
        }
    }

    host_to_name(base)
}

fn host_to_name(url: &Url) -> String {
    let host = url.host_str().unwrap_or("company");
    let stem = host
        .strip_prefix("www.")
        .unwrap_or(host)
        .split('.')
        .next()
        .unwrap_or(host);
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Company".to_string(),
    }
}
