//! Bet ledger boundary.
//!
//! The engine reads pending rows and writes outcomes back; it never creates
//! or deletes rows. `MemoryLedger` is the in-process implementation used by
//! tests and embedders that keep their rows elsewhere.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{BetRecord, Outcome};
use crate::error::{Result, SettlerError};

/// System of record for wagered selections.
///
/// `update_bet_outcome` must be idempotent: writing the same outcome to the
/// same row twice is a no-op, and a row already settled stays settled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BetLedger: Send + Sync {
    /// Rows whose outcome is still Pending, in ledger order
    async fn list_pending_bets(&self) -> Result<Vec<BetRecord>>;

    /// Write the outcome for one row, keyed by its stable `row_ref`
    async fn update_bet_outcome(
        &self,
        row_ref: &str,
        outcome: Outcome,
        note: &str,
        verification: &str,
    ) -> Result<()>;
}

/// One ledger row with its current settlement state
#[derive(Debug, Clone)]
pub struct LedgerRow {
    pub bet: BetRecord,
    pub outcome: Outcome,
    pub note: String,
    pub verification: String,
}

impl LedgerRow {
    pub fn pending(bet: BetRecord) -> Self {
        Self {
            bet,
            outcome: Outcome::Pending,
            note: String::new(),
            verification: String::new(),
        }
    }
}

/// In-memory ledger keyed by row_ref
#[derive(Default)]
pub struct MemoryLedger {
    rows: RwLock<BTreeMap<String, LedgerRow>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, bet: BetRecord) {
        let mut rows = self.rows.write().await;
        rows.insert(bet.row_ref.clone(), LedgerRow::pending(bet));
    }

    pub async fn row(&self, row_ref: &str) -> Option<LedgerRow> {
        self.rows.read().await.get(row_ref).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl BetLedger for MemoryLedger {
    async fn list_pending_bets(&self) -> Result<Vec<BetRecord>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|row| row.outcome == Outcome::Pending)
            .map(|row| row.bet.clone())
            .collect())
    }

    async fn update_bet_outcome(
        &self,
        row_ref: &str,
        outcome: Outcome,
        note: &str,
        verification: &str,
    ) -> Result<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(row_ref)
            .ok_or_else(|| SettlerError::UnknownRow(row_ref.to_string()))?;

        if row.outcome != Outcome::Pending && row.outcome == outcome {
            debug!(row_ref = %row_ref, outcome = %outcome, "row already settled, skipping");
            return Ok(());
        }

        row.outcome = outcome;
        row.note = note.to_string();
        row.verification = verification.to_string();
        Ok(())
    }
}
