pub mod config;
pub mod consensus;
pub mod domain;
pub mod error;
pub mod grading;
pub mod ledger;
pub mod logging;
pub mod matcher;
pub mod resolver;
pub mod sourcing;
pub mod teams;

pub use config::AppConfig;
pub use consensus::{DerivedGrade, OutcomeDeriver};
pub use domain::{
    BetKind, BetRecord, Confidence, Evidence, GameCandidate, GameScore, GradeResult, Outcome,
    PeriodQualifier,
};
pub use error::{Result, SettlerError};
pub use grading::Grade;
pub use ledger::{BetLedger, LedgerRow, MemoryLedger};
pub use matcher::find_game_score;
pub use resolver::{Resolver, ResolverConfig, RunSummary};
pub use sourcing::{
    EvidenceProvider, ScoreFeed, ScoreboardClient, SearchClient, SearchConfig,
};
pub use teams::{split_event_label, AliasTable};
