//! Keeper cost calculation
//!
//! `cost = draft price + escalation[min(keeps, 10)] + trades * $5`
//!
//! The calculator is total: it never rejects input. Range checks belong to the
//! caller (see [`crate::validation`]).

use crate::escalation::escalation_for;
use serde::{Deserialize, Serialize};

/// Surcharge per in-season trade, in dollars.
pub const TRADE_SURCHARGE: i64 = 5;

/// Inputs to a single keeper cost calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeeperCostInput {
    /// Draft price the cost escalates from; absent prices count as $0
    pub draft_price: Option<i64>,

    /// Consecutive seasons kept (0 = first keep)
    #[serde(default)]
    pub consecutive_keeps: u32,

    /// Qualifying in-season trades
    #[serde(default)]
    pub trade_count: u32,
}

impl KeeperCostInput {
    pub fn new(draft_price: Option<i64>) -> Self {
        Self { draft_price, ..Self::default() }
    }

    pub fn with_keeps(mut self, consecutive_keeps: u32) -> Self {
        self.consecutive_keeps = consecutive_keeps;
        self
    }

    pub fn with_trades(mut self, trade_count: u32) -> Self {
        self.trade_count = trade_count;
        self
    }

    /// Compute the keeper cost for these inputs
    pub fn cost(&self) -> i64 {
        compute_keeper_cost(self.draft_price, self.consecutive_keeps, self.trade_count)
    }
}

/// Calculate the keeper cost for a player.
///
/// Saturates instead of overflowing on absurd draft prices.
pub fn compute_keeper_cost(draft_price: Option<i64>, consecutive_keeps: u32, trade_count: u32) -> i64 {
    let price = draft_price.unwrap_or(0);
    let trade_kicker = i64::from(trade_count).saturating_mul(TRADE_SURCHARGE);

    price.saturating_add(escalation_for(consecutive_keeps)).saturating_add(trade_kicker)
}

/// Escalation year to price when a rostered player is kept again.
///
/// A roster row with no keep history is priced as a first keep (year 0); a
/// row kept `k` times is priced at year `k + 1`.
pub fn next_keep_year(prior_consecutive_keeps: Option<u32>) -> u32 {
    prior_consecutive_keeps.map_or(0, |keeps| keeps.saturating_add(1))
}

/// Display form of a keeper cost: `$N`, or `-` when there is none.
pub fn format_keeper_cost(keeper_cost: Option<i64>) -> String {
    match keeper_cost {
        Some(cost) => format!("${cost}"),
        None => "-".to_string(),
    }
}
