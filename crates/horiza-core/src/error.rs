use thiserror::Error;

use crate::types::{Address, Amount, Epoch, GaugeId, LockId, Timestamp};

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, HorizaError>;

/// Protocol-wide error types for the Horiza Protocol.
///
/// Every variant is a rejected operation: caller input or a state
/// precondition that does not hold. None of them are transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HorizaError {
    /// Zero amount, or an amount that cannot be represented.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Lock duration outside `1..=MAX_EPOCHS`.
    #[error("Invalid number of epochs: {0}")]
    InvalidNumberOfEpochs(u64),

    /// Extension of zero epochs, or one that would exceed `MAX_EPOCHS`.
    #[error("Invalid number of epochs to extend lock {lock_id}: {remaining} remaining, {requested} requested")]
    InvalidNumberOfEpochsToExtend {
        lock_id: LockId,
        remaining: u64,
        requested: u64,
    },

    /// The lock has fully decayed and can only be unlocked.
    #[error("Lock {0} has expired")]
    ExpiredLock(LockId),

    /// The lock still has epochs remaining.
    #[error("Lock {lock_id} cannot be unlocked: {epochs_remaining} epochs remaining")]
    ForbiddenToUnlock {
        lock_id: LockId,
        epochs_remaining: u64,
    },

    #[error("Unknown lock: {0}")]
    UnknownLock(LockId),

    #[error("Lock {lock_id} is not owned by {caller}")]
    NotLockOwner { lock_id: LockId, caller: Address },

    /// The same lock id was listed twice in one operation.
    #[error("Lock {0} listed more than once")]
    DuplicateLock(LockId),

    /// Malformed ballot (length mismatch, empty, zero weight sum).
    #[error("Invalid vote: {0}")]
    InvalidVote(String),

    #[error("Gauge already exists for strategy {0}")]
    GaugeAlreadyExists(Address),

    #[error("Unknown gauge: {0}")]
    UnknownGauge(GaugeId),

    /// A full epoch duration has not elapsed since the last advance.
    #[error("Epoch not elapsed: next epoch at {next_epoch_at}, now {now}")]
    EpochNotElapsed {
        next_epoch_at: Timestamp,
        now: Timestamp,
    },

    /// Emission distribution requested before the epoch was advanced, or an
    /// advance requested while the current epoch's emission is still owed.
    #[error("Epoch {0} is not ready: epoch advance and emission distribution out of order")]
    EpochNotReady(Epoch),

    #[error("Emission for epoch {0} was already distributed")]
    AlreadyDistributed(Epoch),

    /// Claim submitted against a root other than the current one.
    #[error("Stale Merkle root")]
    StaleRoot,

    #[error("Account {0} already claimed against the current root")]
    AlreadyClaimed(Address),

    #[error("Invalid Merkle proof")]
    InvalidProof,

    /// Claim larger than the holder pool.
    #[error("Claim of {requested} exceeds holder pool of {available}")]
    ClaimExceedsPool { requested: Amount, available: Amount },

    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized { caller: Address, action: String },

    /// Ledger debit larger than the account balance.
    #[error("Insufficient balance for {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: Address,
        requested: Amount,
        available: Amount,
    },

    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(String),

    /// Malformed external input (hex, addresses, amounts).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl HorizaError {
    /// Stable machine-readable name of the variant, used on the RPC wire.
    pub fn code(&self) -> &'static str {
        match self {
            HorizaError::InvalidAmount(_) => "InvalidAmount",
            HorizaError::InvalidNumberOfEpochs(_) => "InvalidNumberOfEpochs",
            HorizaError::InvalidNumberOfEpochsToExtend { .. } => "InvalidNumberOfEpochsToExtend",
            HorizaError::ExpiredLock(_) => "ExpiredLock",
            HorizaError::ForbiddenToUnlock { .. } => "ForbiddenToUnlock",
            HorizaError::UnknownLock(_) => "UnknownLock",
            HorizaError::NotLockOwner { .. } => "NotLockOwner",
            HorizaError::DuplicateLock(_) => "DuplicateLock",
            HorizaError::InvalidVote(_) => "InvalidVote",
            HorizaError::GaugeAlreadyExists(_) => "GaugeAlreadyExists",
            HorizaError::UnknownGauge(_) => "UnknownGauge",
            HorizaError::EpochNotElapsed { .. } => "EpochNotElapsed",
            HorizaError::EpochNotReady(_) => "EpochNotReady",
            HorizaError::AlreadyDistributed(_) => "AlreadyDistributed",
            HorizaError::StaleRoot => "StaleRoot",
            HorizaError::AlreadyClaimed(_) => "AlreadyClaimed",
            HorizaError::InvalidProof => "InvalidProof",
            HorizaError::ClaimExceedsPool { .. } => "ClaimExceedsPool",
            HorizaError::Unauthorized { .. } => "Unauthorized",
            HorizaError::InsufficientBalance { .. } => "InsufficientBalance",
            HorizaError::ArithmeticOverflow(_) => "ArithmeticOverflow",
            HorizaError::InvalidInput(_) => "InvalidInput",
            HorizaError::Serialization(_) => "Serialization",
            HorizaError::Io(_) => "Io",
        }
    }
}

impl From<serde_json::Error> for HorizaError {
    fn from(e: serde_json::Error) -> Self {
        HorizaError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for HorizaError {
    fn from(e: std::io::Error) -> Self {
        HorizaError::Io(e.to_string())
    }
}
