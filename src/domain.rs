//! Core data model for the resolution engine.
//!
//! `BetRecord` rows come from the ledger, `GameCandidate`/`GameScore` come
//! from the score feed, and `GradeResult` is what the engine writes back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Verdict for one wagered selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Push,
    Pending,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "Win"),
            Outcome::Loss => write!(f, "Loss"),
            Outcome::Push => write!(f, "Push"),
            Outcome::Pending => write!(f, "Pending"),
        }
    }
}

impl Outcome {
    /// Parse a ledger cell value. Anything unrecognized is treated as Pending
    /// so a malformed row is never silently graded.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "win" | "won" | "w" => Outcome::Win,
            "loss" | "lost" | "lose" | "l" => Outcome::Loss,
            "push" | "tie" => Outcome::Push,
            _ => Outcome::Pending,
        }
    }
}

/// How much the engine trusts a grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

impl Confidence {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "low" => Confidence::Low,
            _ => Confidence::Medium,
        }
    }
}

/// Kind of wager, as extracted from the slip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetKind {
    Spread,
    Moneyline,
    Total,
    Parlay,
    Prop,
    Other,
}

impl BetKind {
    /// Map the free-text bet type from the slip ("Spread", "Over/Under",
    /// "Moneyline", "Teaser", ...) onto a gradable kind.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.contains("parlay") || lower.contains("teaser") {
            BetKind::Parlay
        } else if lower.contains("prop") {
            BetKind::Prop
        } else if lower.contains("moneyline") || lower == "ml" {
            BetKind::Moneyline
        } else if lower.contains("over") || lower.contains("under") || lower.contains("total") {
            BetKind::Total
        } else if lower.contains("spread") || lower.contains("straight") {
            BetKind::Spread
        } else {
            BetKind::Other
        }
    }
}

impl std::fmt::Display for BetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BetKind::Spread => write!(f, "Spread"),
            BetKind::Moneyline => write!(f, "Moneyline"),
            BetKind::Total => write!(f, "Total"),
            BetKind::Parlay => write!(f, "Parlay"),
            BetKind::Prop => write!(f, "Prop"),
            BetKind::Other => write!(f, "Other"),
        }
    }
}

/// Sub-interval of a game a wager is restricted to ("1H", "3Q", ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodQualifier {
    Q1,
    Q2,
    Q3,
    Q4,
    H1,
    H2,
}

impl PeriodQualifier {
    /// Scan the selection text for a period marker. Matches whole tokens only
    /// so "1H" in "Lakers 1H -3.5" hits but "H" inside a team name does not.
    pub fn detect(selection: &str) -> Option<Self> {
        for token in selection.split(|c: char| !c.is_ascii_alphanumeric()) {
            let q = match token.to_ascii_uppercase().as_str() {
                "1Q" | "Q1" => Some(PeriodQualifier::Q1),
                "2Q" | "Q2" => Some(PeriodQualifier::Q2),
                "3Q" | "Q3" => Some(PeriodQualifier::Q3),
                "4Q" | "Q4" => Some(PeriodQualifier::Q4),
                "1H" | "H1" => Some(PeriodQualifier::H1),
                "2H" | "H2" => Some(PeriodQualifier::H2),
                _ => None,
            };
            if q.is_some() {
                return q;
            }
        }
        None
    }

    /// Number of periods the cumulative score runs through
    pub fn periods(&self) -> usize {
        match self {
            PeriodQualifier::Q1 => 1,
            PeriodQualifier::Q2 | PeriodQualifier::H1 => 2,
            PeriodQualifier::Q3 => 3,
            PeriodQualifier::Q4 | PeriodQualifier::H2 => 4,
        }
    }
}

impl std::fmt::Display for PeriodQualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodQualifier::Q1 => write!(f, "1Q"),
            PeriodQualifier::Q2 => write!(f, "2Q"),
            PeriodQualifier::Q3 => write!(f, "3Q"),
            PeriodQualifier::Q4 => write!(f, "4Q"),
            PeriodQualifier::H1 => write!(f, "1H"),
            PeriodQualifier::H2 => write!(f, "2H"),
        }
    }
}

/// One wagered selection awaiting (or holding) an outcome.
///
/// `row_ref` is an opaque, stable handle into the ledger; the engine only
/// ever transitions the outcome of existing rows, it never creates or
/// deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRecord {
    pub row_ref: String,
    pub match_date: Option<NaiveDate>,
    pub league: String,
    /// Free text, e.g. "Lakers vs Celtics"
    pub event_label: String,
    /// Free text pick, may embed a period marker ("Jazz 1H +4.5")
    pub selection: String,
    pub kind: BetKind,
    /// Spread or total line; None for moneyline
    pub line: Option<Decimal>,
    pub wager: Decimal,
    pub potential_payout: Decimal,
}

impl BetRecord {
    /// Period marker embedded in the selection text, if any
    pub fn period_qualifier(&self) -> Option<PeriodQualifier> {
        PeriodQualifier::detect(&self.selection)
    }

    /// Net result for a settled outcome: profit on a win, stake lost on a
    /// loss, zero on push or pending.
    pub fn net_result(&self, outcome: Outcome) -> Decimal {
        match outcome {
            Outcome::Win => self.potential_payout - self.wager,
            Outcome::Loss => -self.wager,
            Outcome::Push | Outcome::Pending => Decimal::ZERO,
        }
    }
}

/// Raw search output for one query. Ephemeral, never persisted.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub query: String,
    pub answer_summary: Option<String>,
    pub snippets: Vec<String>,
}

impl Evidence {
    /// Empty evidence for a failed or timed-out fetch
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            answer_summary: None,
            snippets: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.answer_summary.is_none() && self.snippets.is_empty()
    }
}

/// One game as reported by the score feed, scores still unresolved.
///
/// Scores stay as raw strings here because the feed sometimes omits or
/// garbles them; the matcher resolves them and skips candidates it cannot.
#[derive(Debug, Clone)]
pub struct GameCandidate {
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<String>,
    pub away_score: Option<String>,
    pub completed: bool,
    pub home_period_scores: Vec<i32>,
    pub away_period_scores: Vec<i32>,
}

impl GameCandidate {
    /// Resolve both scores to integers, producing a bound `GameScore`.
    /// Returns None when either score is missing or unparseable.
    pub fn resolve(&self) -> Option<GameScore> {
        let home_score: i32 = self.home_score.as_deref()?.trim().parse().ok()?;
        let away_score: i32 = self.away_score.as_deref()?.trim().parse().ok()?;

        let period_scores = if !self.home_period_scores.is_empty()
            && self.home_period_scores.len() == self.away_period_scores.len()
        {
            Some(
                self.home_period_scores
                    .iter()
                    .zip(self.away_period_scores.iter())
                    .map(|(h, a)| (*h, *a))
                    .collect(),
            )
        } else {
            None
        };

        Some(GameScore {
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            home_score,
            away_score,
            completed: self.completed,
            period_scores,
        })
    }
}

/// A resolved, structured result for one real event. Never mutated once
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameScore {
    pub home_team: String,
    pub away_team: String,
    pub home_score: i32,
    pub away_score: i32,
    pub completed: bool,
    /// Per-period (home, away) points when period-level grading is needed
    pub period_scores: Option<Vec<(i32, i32)>>,
}

impl GameScore {
    /// Final (home, away) score pair
    pub fn final_pair(&self) -> (i32, i32) {
        (self.home_score, self.away_score)
    }

    /// Cumulative (home, away) score through the first `periods` periods.
    /// None when period-level scores are missing or too short.
    pub fn pair_through(&self, periods: usize) -> Option<(i32, i32)> {
        let scores = self.period_scores.as_ref()?;
        if scores.len() < periods {
            return None;
        }
        let (mut home, mut away) = (0, 0);
        for (h, a) in scores.iter().take(periods) {
            home += h;
            away += a;
        }
        Some((home, away))
    }

    /// Human-readable final score, away side first
    pub fn score_label(&self) -> String {
        format!(
            "{} {}-{} {}",
            self.away_team, self.away_score, self.home_score, self.home_team
        )
    }
}

/// The engine's verdict for one bet. Created fresh per grading attempt and
/// never partially written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeResult {
    pub outcome: Outcome,
    pub final_score: String,
    /// Shows the arithmetic performed; this is the primary audit artifact
    pub rationale: String,
    pub confidence: Confidence,
    /// Short machine-checkable score excerpt for audit
    pub verification: String,
}
