//! Result sourcing: boundary traits for the evidence search provider and
//! the structured score feed, plus the query builder shared by both.

pub mod scoreboard;
pub mod search;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{BetRecord, Evidence, GameCandidate};
use crate::error::Result;

pub use scoreboard::ScoreboardClient;
pub use search::{SearchClient, SearchConfig};

/// Text/answer search capability. Treated as best-effort and unreliable:
/// results may be omitted, truncated, or mis-ranked.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Evidence>;
}

/// Structured scores feed, keyed by league and calendar date
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreFeed: Send + Sync {
    async fn games_for_date(&self, league: &str, date: NaiveDate) -> Result<Vec<GameCandidate>>;
}

/// Build the evidence query for one bet: event label, league and date,
/// with box-score phrasing when the selection carries a period marker
/// (quarter-level scores need quarter-level evidence).
pub fn build_evidence_query(bet: &BetRecord) -> String {
    let mut query = String::new();
    if !bet.league.trim().is_empty() {
        query.push_str(bet.league.trim());
        query.push(' ');
    }
    query.push_str(bet.event_label.trim());
    if let Some(date) = bet.match_date {
        query.push(' ');
        query.push_str(&date.format("%Y-%m-%d").to_string());
    }
    if bet.period_qualifier().is_some() {
        query.push_str(" box score quarter by quarter");
    } else {
        query.push_str(" final score result");
    }
    query
}

/// Fetch evidence for a bet, degrading any provider failure to empty
/// evidence. Empty evidence is ungradable downstream, never an error.
pub async fn fetch_evidence(provider: &dyn EvidenceProvider, bet: &BetRecord) -> Evidence {
    let query = build_evidence_query(bet);
    match provider.search(&query).await {
        Ok(evidence) => evidence,
        Err(e) => {
            warn!(
                row_ref = %bet.row_ref,
                error = %e,
                "evidence fetch failed, continuing with empty evidence"
            );
            Evidence::empty(&query)
        }
    }
}
