//! Trade records and their player lists
//!
//! Player lists are kept as raw JSON because the store hands them back
//! untyped: a list may hold numbers or numeric strings, and older rows may
//! hold something that is not a list at all. [`parse_player_list`] is the one
//! place that decides what a usable player id is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub type PlayerId = i64;
pub type SeasonId = i64;
pub type ManagerId = i64;
pub type TradeId = i64;

/// Lifecycle state of a trade proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
    Canceled,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Accepted => "accepted",
            TradeStatus::Rejected => "rejected",
            TradeStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a trade a player list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Proposer,
    Receiver,
}

impl TradeSide {
    pub const BOTH: [TradeSide; 2] = [TradeSide::Proposer, TradeSide::Receiver];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Proposer => "proposer",
            TradeSide::Receiver => "receiver",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade between two managers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: TradeId,
    pub season_id: SeasonId,
    pub proposer_manager_id: ManagerId,
    pub receiver_manager_id: ManagerId,

    /// Players leaving the proposer's roster
    #[serde(default)]
    pub proposer_players: Value,

    /// Players leaving the receiver's roster
    #[serde(default)]
    pub receiver_players: Value,

    #[serde(default)]
    pub proposer_cash: i64,
    #[serde(default)]
    pub receiver_cash: i64,

    pub status: TradeStatus,

    /// Offseason trades never add a trade surcharge
    #[serde(default)]
    pub was_offseason: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,

    /// Season whose rosters the trade moved players on
    #[serde(default)]
    pub impacts_season_id: Option<SeasonId>,
}

impl TradeRecord {
    /// Create a new pending trade with no players attached
    pub fn new(
        id: TradeId,
        season_id: SeasonId,
        proposer_manager_id: ManagerId,
        receiver_manager_id: ManagerId,
    ) -> Self {
        Self {
            id,
            season_id,
            proposer_manager_id,
            receiver_manager_id,
            proposer_players: Value::Array(Vec::new()),
            receiver_players: Value::Array(Vec::new()),
            proposer_cash: 0,
            receiver_cash: 0,
            status: TradeStatus::Pending,
            was_offseason: false,
            created_at: Utc::now(),
            responded_at: None,
            impacts_season_id: None,
        }
    }

    pub fn with_players(mut self, proposer: &[PlayerId], receiver: &[PlayerId]) -> Self {
        self.proposer_players = Value::from(proposer.to_vec());
        self.receiver_players = Value::from(receiver.to_vec());
        self
    }

    pub fn with_status(mut self, status: TradeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn offseason(mut self, was_offseason: bool) -> Self {
        self.was_offseason = was_offseason;
        self
    }

    /// Accepted during the season, so it adds to keeper costs
    pub fn counts_toward_surcharge(&self) -> bool {
        self.status == TradeStatus::Accepted && !self.was_offseason
    }

    /// Raw player list for one side
    pub fn raw_players(&self, side: TradeSide) -> &Value {
        match side {
            TradeSide::Proposer => &self.proposer_players,
            TradeSide::Receiver => &self.receiver_players,
        }
    }

    /// Parsed player list for one side
    pub fn players(&self, side: TradeSide) -> PlayerList {
        parse_player_list(self.raw_players(side))
    }

    /// Manager who ends up with a side's players once the trade is accepted
    pub fn destination_manager(&self, side: TradeSide) -> ManagerId {
        match side {
            TradeSide::Proposer => self.receiver_manager_id,
            TradeSide::Receiver => self.proposer_manager_id,
        }
    }

    /// Manager a side's players started with
    pub fn origin_manager(&self, side: TradeSide) -> ManagerId {
        match side {
            TradeSide::Proposer => self.proposer_manager_id,
            TradeSide::Receiver => self.receiver_manager_id,
        }
    }

    /// Every usable player id on either side, proposer side first
    pub fn involved_players(&self) -> Vec<PlayerId> {
        TradeSide::BOTH.iter().flat_map(|side| self.players(*side).ids).collect()
    }
}

/// Player ids read from one side of a trade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerList {
    pub ids: Vec<PlayerId>,

    /// Entries that were neither integers nor numeric strings
    pub rejected: usize,

    /// The field was present but not a JSON array
    pub malformed: bool,
}

/// Read a raw player list. `null` is an empty list.
pub fn parse_player_list(value: &Value) -> PlayerList {
    match value {
        Value::Null => PlayerList::default(),
        Value::Array(items) => {
            let mut list = PlayerList::default();
            for item in items {
                match parse_player_id(item) {
                    Some(id) => list.ids.push(id),
                    None => list.rejected += 1,
                }
            }
            list
        }
        _ => PlayerList { malformed: true, ..PlayerList::default() },
    }
}

fn parse_player_id(value: &Value) -> Option<PlayerId> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
