//! Keeper Cost - escalation pricing for keeper leagues
//!
//! This crate holds the pure domain logic of the league: the consecutive-keep
//! escalation table, the keeper cost calculator, and the aggregator that turns
//! a season's accepted in-season trades into per-player trade counts.
//!
//! Nothing in here performs I/O. The league service composes these pieces with
//! the league store.

pub mod aggregator;
pub mod calculator;
pub mod error;
pub mod escalation;
pub mod trade;
pub mod validation;

pub use aggregator::{
    aggregate_trade_counts, trade_appearances, SelfTradePolicy, TradeAppearance,
    TradeCountAggregator, TradeCountMap, TradeCountReport,
};
pub use calculator::{
    compute_keeper_cost, format_keeper_cost, next_keep_year, KeeperCostInput, TRADE_SURCHARGE,
};
pub use error::KeeperInputError;
pub use escalation::{escalation_for, ESCALATION_TABLE, MAX_ESCALATION_YEAR};
pub use trade::{
    parse_player_list, ManagerId, PlayerId, PlayerList, SeasonId, TradeId, TradeRecord, TradeSide,
    TradeStatus,
};

// Result type alias
pub type Result<T> = std::result::Result<T, KeeperInputError>;
