//! Grok API client for real-time result search and outcome derivation.
//!
//! One client, two roles: it is the `EvidenceProvider` (search the open web
//! and X for a game result) and the `OutcomeDeriver` used by the consensus
//! pass (judge an outcome from already-fetched evidence). Both go through
//! the same chat-completions endpoint with real-time search enabled.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::consensus::{DerivedGrade, OutcomeDeriver};
use crate::domain::{BetRecord, Confidence, Evidence, Outcome};
use crate::error::{Result, SettlerError};

/// Search client configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// API key
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Request timeout
    pub timeout_secs: u64,
    /// Model to use
    pub model: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.x.ai/v1".to_string(),
            timeout_secs: 30,
            model: "grok-4-1-fast-reasoning".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("SETTLER_SEARCH_API_KEY").unwrap_or_default(),
            base_url: std::env::var("SETTLER_SEARCH_API_URL")
                .unwrap_or_else(|_| "https://api.x.ai/v1".to_string()),
            timeout_secs: 30,
            model: std::env::var("SETTLER_SEARCH_MODEL")
                .unwrap_or_else(|_| "grok-4-1-fast-reasoning".to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    /// Enable real-time search capability
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Search-backed evidence and derivation client
pub struct SearchClient {
    config: SearchConfig,
    http: Client,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SettlerError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SearchConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Send a chat message and return the raw text response
    async fn chat(&self, prompt: &str) -> Result<String> {
        if !self.is_configured() {
            return Err(SettlerError::Sourcing(
                "search API key not configured".to_string(),
            ));
        }

        debug!("sending request to search API");

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(0.2),
            max_tokens: Some(1000),
            search: Some(true),
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(SettlerError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("search API error: {} - {}", status, body);
            return Err(SettlerError::Sourcing(format!(
                "search API error: {} - {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| SettlerError::Sourcing(format!("failed to parse response: {}", e)))?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("search response received: {} chars", content.len());
        Ok(content)
    }
}

#[async_trait]
impl super::EvidenceProvider for SearchClient {
    async fn search(&self, query: &str) -> Result<Evidence> {
        let prompt = format!(
            r#"Search for: {}

Report what you find:
1. A one-line answer stating the final result if the game is over
2. Key facts as bullet points (final score, team names, whether the game went to overtime, quarter/half scores if asked for)

Only report scores you actually found. If the game has not finished or you cannot find it, say so plainly."#,
            query
        );

        let response = self.chat(prompt.as_str()).await?;

        Ok(Evidence {
            query: query.to_string(),
            answer_summary: Some(response.clone()),
            snippets: extract_bullet_points(&response),
        })
    }
}

// ── Outcome derivation ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DerivedJson {
    #[serde(default)]
    outcome: String,
    #[serde(default)]
    final_score: String,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    confidence: String,
}

/// Build the derivation prompt: the bet plus the evidence, nothing about
/// any earlier grading pass, so the judgment stays independent.
fn build_derivation_prompt(bet: &BetRecord, evidence: &Evidence) -> String {
    let mut prompt = format!(
        r#"You are grading a sports wager. Decide the outcome from the evidence below.

BET:
- Event: {event}
- League: {league}
- Selection: {selection}
- Bet type: {kind}
"#,
        event = bet.event_label,
        league = bet.league,
        selection = bet.selection,
        kind = bet.kind,
    );
    if let Some(line) = bet.line {
        prompt.push_str(&format!("- Line: {line}\n"));
    }
    if let Some(q) = bet.period_qualifier() {
        prompt.push_str(&format!(
            "- Period: {q} only; grade on the cumulative score through that period\n"
        ));
    }

    if evidence.is_empty() {
        prompt.push_str("\nEVIDENCE: none found.\n");
    } else {
        prompt.push_str("\nEVIDENCE:\n");
        if let Some(summary) = &evidence.answer_summary {
            prompt.push_str(summary);
            prompt.push('\n');
        }
        for snippet in &evidence.snippets {
            prompt.push_str("- ");
            prompt.push_str(snippet);
            prompt.push('\n');
        }
    }

    prompt.push_str(
        r#"
Show your arithmetic (scores, margin or total, comparison against the line).
If the evidence does not contain the needed score, the outcome is Pending.

Respond ONLY in JSON:
{
  "outcome": "Win" or "Loss" or "Push" or "Pending",
  "final_score": "Away 110 - 118 Home",
  "rationale": "the arithmetic in one or two sentences",
  "confidence": "high" or "medium" or "low"
}"#,
    );

    prompt
}

/// Parse the derivation response. Any parse failure defaults to Pending:
/// never grade on garbage.
fn parse_derivation_response(raw: &str) -> DerivedGrade {
    let json_str = extract_json_block(raw);

    match serde_json::from_str::<DerivedJson>(&json_str) {
        Ok(parsed) => DerivedGrade {
            outcome: Outcome::parse(&parsed.outcome),
            score_label: parsed.final_score,
            rationale: parsed.rationale,
            confidence: Confidence::parse(&parsed.confidence),
        },
        Err(e) => {
            warn!(error = %e, "failed to parse derivation JSON, defaulting to Pending");
            DerivedGrade {
                outcome: Outcome::Pending,
                score_label: String::new(),
                rationale: format!("Parse failure: {}", e),
                confidence: Confidence::Low,
            }
        }
    }
}

#[async_trait]
impl OutcomeDeriver for SearchClient {
    async fn derive(&self, bet: &BetRecord, evidence: &Evidence) -> Result<DerivedGrade> {
        let prompt = build_derivation_prompt(bet, evidence);
        let start = std::time::Instant::now();
        let raw = self.chat(&prompt).await?;
        debug!(
            row_ref = %bet.row_ref,
            duration_ms = start.elapsed().as_millis() as u64,
            response_len = raw.len(),
            "derivation query completed"
        );
        Ok(parse_derivation_response(&raw))
    }
}

// ── Response text helpers ──────────────────────────────────────

/// Extract JSON object from a response that may contain markdown fences
fn extract_json_block(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim().to_string();
        }
    }
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return block.to_string();
            }
        }
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                return trimmed[start..=end].to_string();
            }
        }
    }

    trimmed.to_string()
}

/// Extract bullet points from a text response
fn extract_bullet_points(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed.starts_with('-')
                || trimmed.starts_with('•')
                || trimmed.starts_with('*')
                || (trimmed.len() > 2
                    && trimmed
                        .chars()
                        .next()
                        .map(|c| c.is_ascii_digit())
                        .unwrap_or(false)
                    && trimmed.chars().nth(1) == Some('.'))
        })
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| {
                    c == '-' || c == '•' || c == '*' || c.is_ascii_digit() || c == '.'
                })
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BetKind;
    use rust_decimal_macros::dec;

    fn sample_bet() -> BetRecord {
        BetRecord {
            row_ref: "9".into(),
            match_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 15),
            league: "NBA".into(),
            event_label: "Magic vs Thunder".into(),
            selection: "Magic +36.5".into(),
            kind: BetKind::Spread,
            line: Some(dec!(36.5)),
            wager: dec!(100),
            potential_payout: dec!(190.91),
        }
    }

    #[test]
    fn test_config_from_env_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.base_url, "https://api.x.ai/v1");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_derivation_prompt_contains_bet_and_evidence() {
        let evidence = Evidence {
            query: "q".into(),
            answer_summary: Some("Thunder beat Magic 128-92".into()),
            snippets: vec!["Final: OKC 128, ORL 92".into()],
        };
        let prompt = build_derivation_prompt(&sample_bet(), &evidence);

        assert!(prompt.contains("Magic vs Thunder"));
        assert!(prompt.contains("Magic +36.5"));
        assert!(prompt.contains("Line: 36.5"));
        assert!(prompt.contains("Thunder beat Magic 128-92"));
        assert!(prompt.contains("Final: OKC 128, ORL 92"));
        // Must not reference any earlier pass
        assert!(!prompt.contains("first pass"));
    }

    #[test]
    fn test_derivation_prompt_flags_period_bets() {
        let mut bet = sample_bet();
        bet.selection = "Magic 1H +18".into();
        let prompt = build_derivation_prompt(&bet, &Evidence::empty("q"));
        assert!(prompt.contains("1H only"));
        assert!(prompt.contains("EVIDENCE: none found"));
    }

    #[test]
    fn test_parse_derivation_fenced_json() {
        let raw = r#"```json
{
  "outcome": "Win",
  "final_score": "Magic 92 - 128 Thunder",
  "rationale": "margin 36 < 36.5",
  "confidence": "high"
}
```"#;
        let derived = parse_derivation_response(raw);
        assert_eq!(derived.outcome, Outcome::Win);
        assert_eq!(derived.confidence, Confidence::High);
        assert!(derived.rationale.contains("36"));
    }

    #[test]
    fn test_parse_derivation_plain_json() {
        let raw = r#"{"outcome": "push", "final_score": "120-110", "rationale": "margin equals line", "confidence": "medium"}"#;
        let derived = parse_derivation_response(raw);
        assert_eq!(derived.outcome, Outcome::Push);
        assert_eq!(derived.confidence, Confidence::Medium);
    }

    #[test]
    fn test_parse_malformed_defaults_to_pending() {
        let derived = parse_derivation_response("could not find the game, sorry");
        assert_eq!(derived.outcome, Outcome::Pending);
        assert_eq!(derived.confidence, Confidence::Low);
        assert!(derived.rationale.contains("Parse failure"));
    }

    #[test]
    fn test_unknown_outcome_string_is_pending() {
        let raw = r#"{"outcome": "probably win", "rationale": "unsure", "confidence": "low"}"#;
        let derived = parse_derivation_response(raw);
        assert_eq!(derived.outcome, Outcome::Pending);
    }

    #[test]
    fn test_extract_bullet_points() {
        let text = r#"
Final result below:
- Thunder 128, Magic 92
- Game ended in regulation
• No overtime
Regular text not a bullet
"#;
        let points = extract_bullet_points(text);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], "Thunder 128, Magic 92");
    }
}
