//! Error types for the consensus engine
//!
//! Three layers:
//! - [`ConsensusError`]: the closed set of reasons a block is invalid, each
//!   with a stable reject code that callers forward unchanged.
//! - [`RuleError`]: what a single rule returns. Either a consensus verdict or a
//!   collaborator failure that prevented one.
//! - [`ChainError`]: what a block submission returns.

use shared_types::CollaboratorError;
use std::fmt;

/// Reasons a block is rejected by consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ConsensusError {
    #[error("incorrect proof of work")]
    BadDiffBits,

    #[error("block's timestamp is too early")]
    TimeTooOld,

    #[error("block timestamp too far in the future")]
    TimeTooNew,

    #[error("rejected nVersion block")]
    BadVersion,

    #[error("proof of work failed")]
    HighHash,

    #[error("hashMerkleRoot mismatch")]
    BadMerkleRoot,

    #[error("duplicate transaction")]
    BadTransactionsDuplicate,

    #[error("first tx is not coinbase")]
    BadCoinbaseMissing,

    #[error("more than one coinbase")]
    BadMultipleCoinbase,

    #[error("block height mismatch in coinbase")]
    BadCoinbaseHeight,

    #[error("coinbase script size out of range")]
    BadCoinbaseLength,

    #[error("coinbase pays too much")]
    BadCoinbaseAmount,

    #[error("size limits failed")]
    BadBlockLength,

    #[error("weight limit failed")]
    BadBlockWeight,

    #[error("out-of-bounds SigOpCount")]
    BadBlockSigOps,

    #[error("transaction has no inputs")]
    BadTxnsVinEmpty,

    #[error("transaction has no outputs")]
    BadTxnsVoutEmpty,

    #[error("transaction output value is negative")]
    BadTxnsVoutNegative,

    #[error("transaction output value too large")]
    BadTxnsVoutTooLarge,

    #[error("transaction output total too large")]
    BadTxnsTxoutTotalTooLarge,

    #[error("duplicate transaction inputs")]
    BadTxnsInputsDuplicate,

    #[error("null prevout in non-coinbase transaction")]
    BadTxnsPrevoutNull,

    #[error("contains a non-final transaction")]
    BadTxnsNonFinal,

    #[error("inputs missing or already spent")]
    BadTxnsInputsMissingOrSpent,

    #[error("tried to spend coinbase before maturity")]
    BadTxnsPrematureSpendOfCoinbase,

    #[error("value in is below value out")]
    BadTxnsInBelowOut,

    #[error("input values out of range")]
    BadTxnsInputValuesOutOfRange,

    #[error("previous block is unknown")]
    BadPrevBlock,

    #[error("block already known")]
    DuplicateBlock,

    #[error("block hash does not match checkpoint")]
    CheckpointMismatch,

    #[error("fork before last checkpoint")]
    ForkBeforeCheckpoint,
}

impl ConsensusError {
    /// Stable reject code. Never changes once published.
    pub fn code(&self) -> &'static str {
        match self {
            ConsensusError::BadDiffBits => "bad-diffbits",
            ConsensusError::TimeTooOld => "time-too-old",
            ConsensusError::TimeTooNew => "time-too-new",
            ConsensusError::BadVersion => "bad-version",
            ConsensusError::HighHash => "high-hash",
            ConsensusError::BadMerkleRoot => "bad-txnmrklroot",
            ConsensusError::BadTransactionsDuplicate => "bad-txns-duplicate",
            ConsensusError::BadCoinbaseMissing => "bad-cb-missing",
            ConsensusError::BadMultipleCoinbase => "bad-cb-multiple",
            ConsensusError::BadCoinbaseHeight => "bad-cb-height",
            ConsensusError::BadCoinbaseLength => "bad-cb-length",
            ConsensusError::BadCoinbaseAmount => "bad-cb-amount",
            ConsensusError::BadBlockLength => "bad-blk-length",
            ConsensusError::BadBlockWeight => "bad-blk-weight",
            ConsensusError::BadBlockSigOps => "bad-blk-sigops",
            ConsensusError::BadTxnsVinEmpty => "bad-txns-vin-empty",
            ConsensusError::BadTxnsVoutEmpty => "bad-txns-vout-empty",
            ConsensusError::BadTxnsVoutNegative => "bad-txns-vout-negative",
            ConsensusError::BadTxnsVoutTooLarge => "bad-txns-vout-toolarge",
            ConsensusError::BadTxnsTxoutTotalTooLarge => "bad-txns-txouttotal-toolarge",
            ConsensusError::BadTxnsInputsDuplicate => "bad-txns-inputs-duplicate",
            ConsensusError::BadTxnsPrevoutNull => "bad-txns-prevout-null",
            ConsensusError::BadTxnsNonFinal => "bad-txns-nonfinal",
            ConsensusError::BadTxnsInputsMissingOrSpent => "bad-txns-inputs-missingorspent",
            ConsensusError::BadTxnsPrematureSpendOfCoinbase => {
                "bad-txns-premature-spend-of-coinbase"
            }
            ConsensusError::BadTxnsInBelowOut => "bad-txns-in-belowout",
            ConsensusError::BadTxnsInputValuesOutOfRange => "bad-txns-inputvalues-outofrange",
            ConsensusError::BadPrevBlock => "bad-prevblk",
            ConsensusError::DuplicateBlock => "duplicate",
            ConsensusError::CheckpointMismatch => "checkpoint-mismatch",
            ConsensusError::ForkBeforeCheckpoint => "bad-fork-prior-to-checkpoint",
        }
    }

    /// The body does not match the header's commitment, so the same header
    /// may still arrive with a valid body.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ConsensusError::BadMerkleRoot | ConsensusError::BadTransactionsDuplicate
        )
    }

    /// Attach a human-readable detail.
    pub fn with_detail(self, detail: impl Into<String>) -> ConsensusFailure {
        ConsensusFailure {
            error: self,
            detail: Some(detail.into()),
        }
    }
}

/// A consensus rejection as handed to callers: the kind plus optional detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusFailure {
    pub error: ConsensusError,
    pub detail: Option<String>,
}

impl From<ConsensusError> for ConsensusFailure {
    fn from(error: ConsensusError) -> Self {
        Self {
            error,
            detail: None,
        }
    }
}

impl fmt::Display for ConsensusFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({}): {}", self.error.code(), self.error, detail),
            None => write!(f, "{} ({})", self.error.code(), self.error),
        }
    }
}

impl std::error::Error for ConsensusFailure {}

/// Outcome of a failed rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// The block is invalid.
    #[error("{0}")]
    Consensus(ConsensusFailure),

    /// A collaborator could not answer, so no verdict was reached.
    #[error("collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),
}

impl RuleError {
    pub fn consensus_error(&self) -> Option<ConsensusError> {
        match self {
            RuleError::Consensus(failure) => Some(failure.error),
            RuleError::Collaborator(_) => None,
        }
    }
}

impl From<ConsensusError> for RuleError {
    fn from(error: ConsensusError) -> Self {
        RuleError::Consensus(error.into())
    }
}

impl From<ConsensusFailure> for RuleError {
    fn from(failure: ConsensusFailure) -> Self {
        RuleError::Consensus(failure)
    }
}

/// Errors returned from block submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The block is invalid and will stay invalid.
    #[error("block rejected: {0}")]
    Rejected(ConsensusFailure),

    /// The block could not be evaluated. Resubmitting later may succeed.
    #[error("collaborator failure: {0}")]
    Collaborator(CollaboratorError),

    /// A previous rollback failed; the engine refuses further work.
    #[error("consensus engine halted awaiting intervention")]
    Halted,

    /// Chain state could not be restored after a failed reorganization.
    #[error("chain invariant violated: {0}")]
    Invariant(String),
}

impl ChainError {
    pub fn consensus_error(&self) -> Option<ConsensusError> {
        match self {
            ChainError::Rejected(failure) => Some(failure.error),
            _ => None,
        }
    }

    /// Reject code for consensus rejections.
    pub fn code(&self) -> Option<&'static str> {
        self.consensus_error().map(|e| e.code())
    }
}

impl From<RuleError> for ChainError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::Consensus(failure) => ChainError::Rejected(failure),
            RuleError::Collaborator(inner) => ChainError::Collaborator(inner),
        }
    }
}

impl From<ConsensusError> for ChainError {
    fn from(error: ConsensusError) -> Self {
        ChainError::Rejected(error.into())
    }
}

impl From<ConsensusFailure> for ChainError {
    fn from(failure: ConsensusFailure) -> Self {
        ChainError::Rejected(failure)
    }
}

/// Rule registration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("rule already registered: {0}")]
    DuplicateRule(&'static str),
}

/// Result type for block submission
pub type ChainResult<T> = Result<T, ChainError>;
