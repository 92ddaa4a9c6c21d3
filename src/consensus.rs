//! Consensus verifier.
//!
//! Grading arithmetic derived from noisy evidence is error-prone, so every
//! non-pending grade is re-derived once, independently, from the same
//! evidence. Agreement upgrades confidence; disagreement is resolved in
//! favor of the re-derivation and tagged CORRECTED for the audit trail.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{BetRecord, Confidence, Evidence, GradeResult, Outcome};
use crate::error::Result;

/// One independently derived outcome for a bet
#[derive(Debug, Clone)]
pub struct DerivedGrade {
    pub outcome: Outcome,
    pub score_label: String,
    pub rationale: String,
    pub confidence: Confidence,
}

/// Abstract "derive an outcome from evidence" capability.
///
/// Modeled as a single trait callable any number of times so the consensus
/// pass stays testable with deterministic stand-ins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutcomeDeriver: Send + Sync {
    async fn derive(&self, bet: &BetRecord, evidence: &Evidence) -> Result<DerivedGrade>;
}

/// Reconcile an initial grade with one independent re-derivation.
///
/// Pending grades pass through untouched: there is nothing to corroborate.
/// A failed re-derivation never discards the initial grade, it only caps
/// confidence at Medium.
pub async fn verify(
    deriver: &dyn OutcomeDeriver,
    bet: &BetRecord,
    initial: GradeResult,
    evidence: &Evidence,
) -> GradeResult {
    if initial.outcome == Outcome::Pending {
        return initial;
    }

    let second = match deriver.derive(bet, evidence).await {
        Ok(second) => second,
        Err(e) => {
            warn!(
                row_ref = %bet.row_ref,
                error = %e,
                "verification pass failed, keeping initial grade at medium confidence"
            );
            return GradeResult {
                rationale: format!("{} | verification unavailable: {e}", initial.rationale),
                confidence: Confidence::Medium,
                ..initial
            };
        }
    };

    if second.outcome == initial.outcome {
        debug!(
            row_ref = %bet.row_ref,
            outcome = %initial.outcome,
            "consensus passes agree"
        );
        let verification = if second.score_label.is_empty() {
            initial.verification
        } else {
            second.score_label
        };
        return GradeResult {
            outcome: initial.outcome,
            final_score: initial.final_score,
            rationale: format!("{} | corroborated: {}", initial.rationale, second.rationale),
            confidence: Confidence::High,
            verification,
        };
    }

    // Disagreement: the re-derivation wins. Logged for operator visibility,
    // never fatal.
    warn!(
        row_ref = %bet.row_ref,
        first = %initial.outcome,
        second = %second.outcome,
        "consensus disagreement, trusting re-derivation"
    );
    let final_score = if second.score_label.is_empty() {
        initial.final_score
    } else {
        second.score_label.clone()
    };
    GradeResult {
        outcome: second.outcome,
        final_score,
        rationale: format!(
            "CORRECTED: first pass said {}, re-derivation says {}. {}",
            initial.outcome, second.outcome, second.rationale
        ),
        confidence: second.confidence,
        verification: second.score_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BetKind;
    use rust_decimal_macros::dec;

    fn sample_bet() -> BetRecord {
        BetRecord {
            row_ref: "12".into(),
            match_date: None,
            league: "NBA".into(),
            event_label: "Magic vs Thunder".into(),
            selection: "Magic +36.5".into(),
            kind: BetKind::Spread,
            line: Some(dec!(36.5)),
            wager: dec!(100),
            potential_payout: dec!(190.91),
        }
    }

    fn initial_grade(outcome: Outcome) -> GradeResult {
        GradeResult {
            outcome,
            final_score: "Orlando Magic 92-128 Oklahoma City Thunder".into(),
            rationale: "margin = 128 - 92 = 36; 36 < 36.5 -> Win".into(),
            confidence: Confidence::Medium,
            verification: "92-128".into(),
        }
    }

    fn derived(outcome: Outcome, confidence: Confidence) -> DerivedGrade {
        DerivedGrade {
            outcome,
            score_label: "Magic 92 - Thunder 128".into(),
            rationale: "re-derived margin 36 vs 36.5".into(),
            confidence,
        }
    }

    #[tokio::test]
    async fn test_pending_passes_through_without_derivation() {
        let deriver = MockOutcomeDeriver::new(); // panics if called
        let evidence = Evidence::empty("q");
        let result = verify(
            &deriver,
            &sample_bet(),
            initial_grade(Outcome::Pending),
            &evidence,
        )
        .await;
        assert_eq!(result.outcome, Outcome::Pending);
    }

    #[tokio::test]
    async fn test_agreement_yields_high_confidence() {
        let mut deriver = MockOutcomeDeriver::new();
        deriver
            .expect_derive()
            .times(1)
            .returning(|_, _| Ok(derived(Outcome::Win, Confidence::Medium)));

        let evidence = Evidence::empty("q");
        let result = verify(&deriver, &sample_bet(), initial_grade(Outcome::Win), &evidence).await;

        assert_eq!(result.outcome, Outcome::Win);
        assert_eq!(result.confidence, Confidence::High);
        assert!(result.rationale.contains("corroborated"));
    }

    #[tokio::test]
    async fn test_disagreement_trusts_second_pass() {
        let mut deriver = MockOutcomeDeriver::new();
        deriver
            .expect_derive()
            .times(1)
            .returning(|_, _| Ok(derived(Outcome::Loss, Confidence::Medium)));

        let evidence = Evidence::empty("q");
        let result = verify(&deriver, &sample_bet(), initial_grade(Outcome::Win), &evidence).await;

        assert_eq!(result.outcome, Outcome::Loss);
        assert_eq!(result.confidence, Confidence::Medium);
        assert!(result.rationale.starts_with("CORRECTED"));
    }

    #[tokio::test]
    async fn test_derivation_failure_keeps_initial_at_medium() {
        let mut deriver = MockOutcomeDeriver::new();
        deriver.expect_derive().times(1).returning(|_, _| {
            Err(crate::error::SettlerError::Sourcing("timeout".into()))
        });

        let evidence = Evidence::empty("q");
        let result = verify(&deriver, &sample_bet(), initial_grade(Outcome::Win), &evidence).await;

        assert_eq!(result.outcome, Outcome::Win);
        assert_eq!(result.confidence, Confidence::Medium);
        assert!(result.rationale.contains("verification unavailable"));
    }
}
