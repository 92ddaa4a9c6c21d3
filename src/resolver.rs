//! Resolution orchestrator: the one-shot pass that drives the full
//! pipeline over every pending ledger row.
//!
//! Per-bet failures are contained; a row that cannot be resolved this run
//! stays Pending and is retried on the next run. Only non-pending outcomes
//! are written back, so reruns over settled rows are no-ops.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::consensus::{self, OutcomeDeriver};
use crate::domain::{BetRecord, Confidence, Evidence, GameCandidate, GradeResult, Outcome};
use crate::error::Result;
use crate::grading;
use crate::ledger::BetLedger;
use crate::matcher::find_game_score;
use crate::sourcing::{build_evidence_query, fetch_evidence, EvidenceProvider, ScoreFeed};
use crate::teams::AliasTable;

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Timeout applied to each outbound sourcing call
    pub call_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 10,
        }
    }
}

/// Counts for one resolution pass
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    /// Pending rows examined
    pub scanned: usize,
    /// Rows settled with a terminal outcome this pass
    pub graded: usize,
    /// Rows left Pending (no result found, manual review, ties)
    pub not_found: usize,
    /// Rows that raised an error; the row stays Pending
    pub errored: usize,
    /// (row_ref, error) pairs for the errored rows
    pub errors: Vec<(String, String)>,
}

/// Drives matching, grading and verification over the ledger
pub struct Resolver {
    aliases: AliasTable,
    config: ResolverConfig,
    ledger: Arc<dyn BetLedger>,
    evidence: Arc<dyn EvidenceProvider>,
    scores: Arc<dyn ScoreFeed>,
    deriver: Arc<dyn OutcomeDeriver>,
}

impl Resolver {
    pub fn new(
        aliases: AliasTable,
        config: ResolverConfig,
        ledger: Arc<dyn BetLedger>,
        evidence: Arc<dyn EvidenceProvider>,
        scores: Arc<dyn ScoreFeed>,
        deriver: Arc<dyn OutcomeDeriver>,
    ) -> Self {
        Self {
            aliases,
            config,
            ledger,
            evidence,
            scores,
            deriver,
        }
    }

    /// Resolve every pending bet once. Never fails on a single bad row;
    /// only ledger enumeration errors abort the pass.
    pub async fn resolve_all(&self) -> Result<RunSummary> {
        let pending = self.ledger.list_pending_bets().await?;
        let mut summary = RunSummary {
            scanned: pending.len(),
            ..Default::default()
        };
        info!(pending = pending.len(), "resolution pass started");

        for bet in &pending {
            match self.resolve_one(bet).await {
                Ok(result) => {
                    if result.outcome == Outcome::Pending {
                        summary.not_found += 1;
                        continue;
                    }
                    let net = bet.net_result(result.outcome);
                    // The ledger carries no confidence column, so the tag
                    // rides in the note next to the arithmetic.
                    let note = format!(
                        "{} | confidence: {} | net: {}",
                        result.rationale, result.confidence, net
                    );
                    match self
                        .ledger
                        .update_bet_outcome(&bet.row_ref, result.outcome, &note, &result.verification)
                        .await
                    {
                        Ok(()) => {
                            info!(
                                row_ref = %bet.row_ref,
                                outcome = %result.outcome,
                                confidence = %result.confidence,
                                "bet settled"
                            );
                            summary.graded += 1;
                        }
                        Err(e) => {
                            warn!(row_ref = %bet.row_ref, error = %e, "ledger write failed");
                            summary.errored += 1;
                            summary.errors.push((bet.row_ref.clone(), e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    warn!(row_ref = %bet.row_ref, error = %e, "bet resolution failed");
                    summary.errored += 1;
                    summary.errors.push((bet.row_ref.clone(), e.to_string()));
                }
            }
        }

        info!(
            scanned = summary.scanned,
            graded = summary.graded,
            not_found = summary.not_found,
            errored = summary.errored,
            "resolution pass finished"
        );
        Ok(summary)
    }

    /// Resolve a single bet end to end. Sourcing failures degrade to empty
    /// inputs rather than erroring: an unreachable feed means "try again
    /// next run", not a failed pass.
    pub async fn resolve_one(&self, bet: &BetRecord) -> Result<GradeResult> {
        let per_call = Duration::from_secs(self.config.call_timeout_secs);

        let evidence = match timeout(per_call, fetch_evidence(self.evidence.as_ref(), bet)).await {
            Ok(evidence) => evidence,
            Err(_) => {
                warn!(row_ref = %bet.row_ref, "evidence fetch timed out");
                Evidence::empty(&build_evidence_query(bet))
            }
        };

        let date = bet.match_date.unwrap_or_else(|| Utc::now().date_naive());
        let candidates: Vec<GameCandidate> =
            match timeout(per_call, self.scores.games_for_date(&bet.league, date)).await {
                Ok(Ok(games)) => games,
                Ok(Err(e)) => {
                    warn!(row_ref = %bet.row_ref, error = %e, "score feed fetch failed");
                    Vec::new()
                }
                Err(_) => {
                    warn!(row_ref = %bet.row_ref, "score feed fetch timed out");
                    Vec::new()
                }
            };

        let score = match find_game_score(&self.aliases, bet, &candidates) {
            Some(score) => score,
            None => {
                debug!(row_ref = %bet.row_ref, event = %bet.event_label, "no completed game found");
                return Ok(GradeResult {
                    outcome: Outcome::Pending,
                    final_score: String::new(),
                    rationale: "result not found".into(),
                    confidence: Confidence::Low,
                    verification: String::new(),
                });
            }
        };

        let graded = grading::grade(
            &self.aliases,
            &bet.selection,
            bet.kind,
            bet.line,
            &score,
            bet.period_qualifier(),
        );

        let initial = GradeResult {
            outcome: graded.outcome,
            final_score: score.score_label(),
            rationale: graded.rationale,
            confidence: Confidence::Medium,
            verification: format!("{}-{}", score.away_score, score.home_score),
        };

        // The re-derivation is an outbound call like the other two and gets
        // the same timeout; elapse is handled like a failed derivation.
        let verified = timeout(
            per_call,
            consensus::verify(self.deriver.as_ref(), bet, initial.clone(), &evidence),
        )
        .await;
        match verified {
            Ok(result) => Ok(result),
            Err(_) => {
                warn!(row_ref = %bet.row_ref, "verification pass timed out");
                Ok(GradeResult {
                    rationale: format!(
                        "{} | verification unavailable: timed out",
                        initial.rationale
                    ),
                    confidence: Confidence::Medium,
                    ..initial
                })
            }
        }
    }
}
