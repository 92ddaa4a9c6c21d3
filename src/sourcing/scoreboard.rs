//! Public scoreboard client.
//!
//! Fetches game results from ESPN's public scoreboard API, which needs no
//! API key. Output is `GameCandidate`s with scores left as raw strings; the
//! matcher resolves them.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::GameCandidate;
use crate::error::{Result, SettlerError};

const SCOREBOARD_BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports";

/// Map a league label from the ledger onto the feed's sport/league path.
/// None for leagues the feed does not carry.
fn league_path(league: &str) -> Option<&'static str> {
    match league.trim().to_ascii_uppercase().as_str() {
        "NBA" => Some("basketball/nba"),
        "WNBA" => Some("basketball/wnba"),
        "NCAAM" | "NCAAB" => Some("basketball/mens-college-basketball"),
        "NFL" => Some("football/nfl"),
        "NCAAF" => Some("football/college-football"),
        "MLB" => Some("baseball/mlb"),
        "NHL" => Some("hockey/nhl"),
        _ => None,
    }
}

// ── Scoreboard JSON deserialization structs ──────────────────────

#[derive(Debug, Deserialize)]
struct ScoreboardResponse {
    #[serde(default)]
    events: Vec<ScoreboardEvent>,
}

#[derive(Debug, Deserialize)]
struct ScoreboardEvent {
    competitions: Vec<Competition>,
}

#[derive(Debug, Deserialize)]
struct Competition {
    competitors: Vec<Competitor>,
    status: GameStatus,
}

#[derive(Debug, Deserialize)]
struct Competitor {
    team: TeamInfo,
    #[serde(rename = "homeAway")]
    home_away: String,
    score: Option<String>,
    linescores: Option<Vec<Linescore>>,
}

#[derive(Debug, Deserialize)]
struct TeamInfo {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Linescore {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct GameStatus {
    #[serde(rename = "type")]
    status_type: StatusType,
}

#[derive(Debug, Deserialize)]
struct StatusType {
    state: String,
}

// ── Client ──────────────────────────────────────────────────────

/// Date-scoped scoreboard client
pub struct ScoreboardClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoreboardClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SettlerError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: SCOREBOARD_BASE_URL.to_string(),
        })
    }

    /// Fetch all games for a league on a calendar date
    pub async fn fetch_games(&self, league: &str, date: NaiveDate) -> Result<Vec<GameCandidate>> {
        let path = league_path(league).ok_or_else(|| {
            SettlerError::ScoreFeed(format!("no scoreboard feed for league '{}'", league))
        })?;

        let url = format!("{}/{}/scoreboard", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .query(&[("dates", date.format("%Y%m%d").to_string())])
            .send()
            .await
            .map_err(SettlerError::Http)?;

        if !resp.status().is_success() {
            return Err(SettlerError::ScoreFeed(format!(
                "scoreboard returned {}",
                resp.status()
            )));
        }

        let data: ScoreboardResponse = resp
            .json()
            .await
            .map_err(|e| SettlerError::ScoreFeed(format!("scoreboard JSON parse failed: {}", e)))?;

        let candidates: Vec<GameCandidate> = data
            .events
            .iter()
            .filter_map(parse_event)
            .collect();

        debug!(
            league = %league,
            date = %date,
            games = candidates.len(),
            "scoreboard fetch completed"
        );
        Ok(candidates)
    }
}

fn parse_event(event: &ScoreboardEvent) -> Option<GameCandidate> {
    let comp = event.competitions.first()?;
    let home = comp.competitors.iter().find(|c| c.home_away == "home")?;
    let away = comp.competitors.iter().find(|c| c.home_away == "away")?;

    Some(GameCandidate {
        home_team: home.team.display_name.clone(),
        away_team: away.team.display_name.clone(),
        home_score: home.score.clone(),
        away_score: away.score.clone(),
        completed: comp.status.status_type.state == "post",
        home_period_scores: parse_linescores(&home.linescores),
        away_period_scores: parse_linescores(&away.linescores),
    })
}

fn parse_linescores(ls: &Option<Vec<Linescore>>) -> Vec<i32> {
    match ls {
        Some(scores) => scores.iter().map(|s| s.value.round() as i32).collect(),
        None => vec![],
    }
}

#[async_trait]
impl super::ScoreFeed for ScoreboardClient {
    async fn games_for_date(&self, league: &str, date: NaiveDate) -> Result<Vec<GameCandidate>> {
        self.fetch_games(league, date).await
    }
}
