//! Error types for keeper input validation

use thiserror::Error;

/// Rejected caller input. The calculator itself never produces these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeeperInputError {
    #[error("Invalid season ID: {0}")]
    InvalidSeasonId(i64),

    #[error("Invalid player ID: {0}")]
    InvalidPlayerId(i64),

    #[error("Invalid manager ID: {0}")]
    InvalidManagerId(i64),

    #[error("Draft price must be between ${min} and ${max}, got {price}")]
    InvalidDraftPrice { price: i64, min: i64, max: i64 },

    #[error("Consecutive keeps must be between 0 and {max}, got {value}")]
    InvalidConsecutiveKeeps { value: i64, max: u32 },

    #[error("Invalid {field} parameter: {value:?}")]
    InvalidParameter { field: String, value: String },

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Manager {0} cannot trade with themselves")]
    SameManagerTrade(i64),

    #[error("Unknown self-trade policy: {0}")]
    UnknownSelfTradePolicy(String),
}
