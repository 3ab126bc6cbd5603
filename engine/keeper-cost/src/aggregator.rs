//! Trade-count aggregation
//!
//! Counts how many times each player appears in a season's qualifying trades.
//! The caller hands over trades that already count toward the surcharge
//! (accepted, in-season); this module does not filter them again.

use crate::error::KeeperInputError;
use crate::trade::{PlayerId, SeasonId, TradeId, TradeRecord, TradeSide};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::warn;

/// Player id -> number of qualifying trade appearances
pub type TradeCountMap = HashMap<PlayerId, u32>;

/// How to count a player listed on both sides of the same trade.
///
/// A real trade never has the same player on both sides, so this only
/// matters for bad rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfTradePolicy {
    /// Every list entry counts, so a self-trade counts twice
    #[default]
    CountEachList,

    /// A player counts at most once per trade
    CountOncePerTrade,
}

impl FromStr for SelfTradePolicy {
    type Err = KeeperInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "count_each_list" | "each_list" => Ok(SelfTradePolicy::CountEachList),
            "count_once_per_trade" | "once_per_trade" => Ok(SelfTradePolicy::CountOncePerTrade),
            other => Err(KeeperInputError::UnknownSelfTradePolicy(other.to_string())),
        }
    }
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeCountReport {
    pub counts: TradeCountMap,

    /// Trades examined
    pub trades_seen: usize,

    /// Player fields that were not lists and were skipped
    pub malformed_fields: usize,

    /// Individual entries that were not player ids
    pub rejected_ids: usize,

    /// Trades listing a player on both sides
    pub self_trades: usize,
}

impl TradeCountReport {
    /// Trade count for a player, 0 if it never appeared
    pub fn count_for(&self, player_id: PlayerId) -> u32 {
        self.counts.get(&player_id).copied().unwrap_or(0)
    }

    pub fn has_anomalies(&self) -> bool {
        self.malformed_fields > 0 || self.rejected_ids > 0 || self.self_trades > 0
    }
}

/// Aggregates per-player trade counts over a batch of trades
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeCountAggregator {
    policy: SelfTradePolicy,
}

impl TradeCountAggregator {
    pub fn new(policy: SelfTradePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelfTradePolicy {
        self.policy
    }

    /// Count trade appearances.
    ///
    /// With `tracked` set, every tracked id is present in the result (0 when
    /// it never traded) and other ids are ignored. Without it, every id seen
    /// in any trade is counted.
    pub fn aggregate(
        &self,
        trades: &[TradeRecord],
        tracked: Option<&HashSet<PlayerId>>,
    ) -> TradeCountReport {
        let mut report = TradeCountReport::default();
        if let Some(ids) = tracked {
            report.counts.extend(ids.iter().map(|id| (*id, 0)));
        }

        for trade in trades {
            report.trades_seen += 1;

            let proposer = trade.players(TradeSide::Proposer);
            let receiver = trade.players(TradeSide::Receiver);

            for (side, list) in [(TradeSide::Proposer, &proposer), (TradeSide::Receiver, &receiver)] {
                if list.malformed {
                    report.malformed_fields += 1;
                    warn!(trade_id = trade.id, %side, "Skipping non-list player field on trade");
                }
                if list.rejected > 0 {
                    report.rejected_ids += list.rejected;
                    warn!(
                        trade_id = trade.id,
                        %side,
                        rejected = list.rejected,
                        "Skipping non-numeric player ids on trade"
                    );
                }
            }

            let on_both_sides: HashSet<PlayerId> =
                proposer.ids.iter().filter(|id| receiver.ids.contains(id)).copied().collect();
            if !on_both_sides.is_empty() {
                report.self_trades += 1;
                warn!(
                    trade_id = trade.id,
                    players = ?on_both_sides,
                    policy = ?self.policy,
                    "Player listed on both sides of trade"
                );
            }

            let mut counted_this_trade = HashSet::new();
            for id in proposer.ids.iter().chain(receiver.ids.iter()).copied() {
                if self.policy == SelfTradePolicy::CountOncePerTrade
                    && !counted_this_trade.insert(id)
                {
                    continue;
                }
                match tracked {
                    Some(ids) if !ids.contains(&id) => {}
                    _ => *report.counts.entry(id).or_insert(0) += 1,
                }
            }
        }

        report
    }
}

/// Count trade appearances for a set of players using the default policy
pub fn aggregate_trade_counts(
    trades: &[TradeRecord],
    player_ids: &HashSet<PlayerId>,
) -> TradeCountMap {
    TradeCountAggregator::default().aggregate(trades, Some(player_ids)).counts
}

/// One player on one side of one trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeAppearance {
    pub trade_id: TradeId,
    pub season_id: SeasonId,
    pub side: TradeSide,
    pub player_id: PlayerId,
    pub created_at: DateTime<Utc>,
}

impl TradeAppearance {
    /// Stable row key, e.g. `12-proposer-301`
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.trade_id, self.side, self.player_id)
    }
}

/// Flatten trades into one row per player per side, in trade order
pub fn trade_appearances(trades: &[TradeRecord]) -> Vec<TradeAppearance> {
    trades
        .iter()
        .flat_map(|trade| {
            TradeSide::BOTH.into_iter().flat_map(move |side| {
                trade.players(side).ids.into_iter().map(move |player_id| TradeAppearance {
                    trade_id: trade.id,
                    season_id: trade.season_id,
                    side,
                    player_id,
                    created_at: trade.created_at,
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::TradeStatus;
    use serde_json::json;

    fn accepted(id: i64, proposer: &[PlayerId], receiver: &[PlayerId]) -> TradeRecord {
        TradeRecord::new(id, 19, 1, 2)
            .with_players(proposer, receiver)
            .with_status(TradeStatus::Accepted)
    }

    fn ids(values: &[PlayerId]) -> HashSet<PlayerId> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_empty_trades_default_to_zero() {
        let counts = aggregate_trade_counts(&[], &ids(&[1, 2, 3]));
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|count| *count == 0));
    }

    #[test]
    fn test_worked_example() {
        let trades = vec![accepted(1, &[1, 2], &[3]), accepted(2, &[3], &[1])];
        let counts = aggregate_trade_counts(&trades, &ids(&[1, 2, 3]));

        assert_eq!(counts[&1], 2);
        assert_eq!(counts[&2], 1);
        assert_eq!(counts[&3], 2);
    }

    #[test]
    fn test_order_does_not_matter() {
        let forward = vec![accepted(1, &[1, 2], &[3]), accepted(2, &[3], &[1])];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        assert_eq!(
            aggregate_trade_counts(&forward, &ids(&[1, 2, 3])),
            aggregate_trade_counts(&reversed, &ids(&[1, 2, 3]))
        );
    }

    #[test]
    fn test_untracked_players_are_ignored() {
        let trades = vec![accepted(1, &[1, 8], &[9])];
        let counts = aggregate_trade_counts(&trades, &ids(&[1]));

        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&1], 1);
    }

    #[test]
    fn test_no_filter_counts_everyone() {
        let trades = vec![accepted(1, &[1, 8], &[9]), accepted(2, &[9], &[4])];
        let report = TradeCountAggregator::default().aggregate(&trades, None);

        assert_eq!(report.counts.len(), 4);
        assert_eq!(report.count_for(9), 2);
        assert_eq!(report.count_for(42), 0);
        assert_eq!(report.trades_seen, 2);
    }

    #[test]
    fn test_self_trade_counts_each_list_by_default() {
        let trades = vec![accepted(1, &[7], &[7])];
        let report = TradeCountAggregator::default().aggregate(&trades, Some(&ids(&[7])));

        assert_eq!(report.count_for(7), 2);
        assert_eq!(report.self_trades, 1);
        assert!(report.has_anomalies());
    }

    #[test]
    fn test_self_trade_once_per_trade_policy() {
        let trades = vec![accepted(1, &[7], &[7]), accepted(2, &[7], &[5])];
        let report = TradeCountAggregator::new(SelfTradePolicy::CountOncePerTrade)
            .aggregate(&trades, Some(&ids(&[7, 5])));

        assert_eq!(report.count_for(7), 2);
        assert_eq!(report.count_for(5), 1);
    }

    #[test]
    fn test_malformed_records_are_skipped_not_fatal() {
        let mut broken = accepted(1, &[], &[3]);
        broken.proposer_players = json!("1,2");
        let mut partial = accepted(2, &[], &[]);
        partial.proposer_players = json!(["3", "not-a-player", 1]);
        let trades = vec![broken, partial, accepted(3, &[2], &[])];

        let report = TradeCountAggregator::default().aggregate(&trades, Some(&ids(&[1, 2, 3])));

        assert_eq!(report.count_for(1), 1);
        assert_eq!(report.count_for(2), 1);
        assert_eq!(report.count_for(3), 2);
        assert_eq!(report.malformed_fields, 1);
        assert_eq!(report.rejected_ids, 1);
        assert_eq!(report.trades_seen, 3);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("count_each_list".parse::<SelfTradePolicy>().unwrap(), SelfTradePolicy::CountEachList);
        assert_eq!(
            "ONCE_PER_TRADE".parse::<SelfTradePolicy>().unwrap(),
            SelfTradePolicy::CountOncePerTrade
        );
        assert!("sometimes".parse::<SelfTradePolicy>().is_err());
    }

    #[test]
    fn test_trade_appearances() {
        let trades = vec![accepted(12, &[301, 302], &[400])];
        let rows = trade_appearances(&trades);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].key(), "12-proposer-301");
        assert_eq!(rows[2].side, TradeSide::Receiver);
        assert_eq!(rows[2].player_id, 400);
    }
}
