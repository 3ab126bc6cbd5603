//! Error types for the league service

use keeper_cost::{KeeperInputError, TradeId, TradeStatus};
use league_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeagueServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] KeeperInputError),

    #[error("Season not found: {season_id}")]
    SeasonNotFound { season_id: i64 },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: i64 },

    #[error("Manager not found: {manager_id}")]
    ManagerNotFound { manager_id: i64 },

    #[error("Player {player_id} was already drafted in season {season_id}")]
    AlreadyDrafted { player_id: i64, season_id: i64 },

    #[error("Player {player_id} is already on a roster in season {season_id}")]
    AlreadyRostered { player_id: i64, season_id: i64 },

    #[error("Trade not found: {trade_id}")]
    TradeNotFound { trade_id: TradeId },

    #[error("Trade {trade_id} is {status}, expected {expected}")]
    InvalidTradeState { trade_id: TradeId, status: TradeStatus, expected: TradeStatus },

    #[error("No active season is set")]
    NoActiveSeason,

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl LeagueServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LeagueServiceError::SeasonNotFound { .. }
                | LeagueServiceError::PlayerNotFound { .. }
                | LeagueServiceError::ManagerNotFound { .. }
                | LeagueServiceError::TradeNotFound { .. }
                | LeagueServiceError::Store(StoreError::NotFound { .. })
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LeagueServiceError::AlreadyDrafted { .. }
                | LeagueServiceError::AlreadyRostered { .. }
                | LeagueServiceError::Store(StoreError::Conflict { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, LeagueServiceError>;
