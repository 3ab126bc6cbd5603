//! Trade acceptance and reversal

use crate::error::{LeagueServiceError, Result};
use crate::keeper::{KeeperCostService, RecalculationSummary};
use chrono::{DateTime, Utc};
use keeper_cost::validation::{
    validate_player_id, validate_season_id, validate_trade_cash, validate_trade_managers,
};
use keeper_cost::{ManagerId, PlayerId, SeasonId, TradeId, TradeRecord, TradeSide, TradeStatus};
use league_store::{LeagueStore, NewTrade};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Result of accepting or reverting a trade
#[derive(Debug, Clone, Serialize)]
pub struct TradeOutcome {
    pub trade: TradeRecord,

    /// Season whose rosters were changed
    pub season_id: SeasonId,
    pub players_moved: usize,

    /// `None` when the follow-up keeper cost recalculation failed
    pub keeper_costs: Option<RecalculationSummary>,
}

/// A player named on one side of a trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradePlayer {
    pub id: PlayerId,
    pub name: String,
}

/// A manager on one side of a trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeParty {
    pub id: ManagerId,
    pub manager_name: Option<String>,
    pub players: Vec<TradePlayer>,
    pub cash: i64,
}

/// A pending or accepted trade with names filled in
#[derive(Debug, Clone, Serialize)]
pub struct TradeSummary {
    pub id: TradeId,
    pub season_id: SeasonId,
    pub status: TradeStatus,
    pub was_offseason: bool,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub proposer: TradeParty,
    pub receiver: TradeParty,
}

/// Applies trade state changes to rosters and keeper costs
pub struct TradeDesk<S: LeagueStore> {
    keeper: KeeperCostService<S>,
}

impl<S: LeagueStore> TradeDesk<S> {
    pub fn new(keeper: KeeperCostService<S>) -> Self {
        Self { keeper }
    }

    async fn load_trade(&self, trade_id: TradeId, expected: TradeStatus) -> Result<TradeRecord> {
        let trade = self
            .keeper
            .store()
            .trade(trade_id)
            .await?
            .ok_or(LeagueServiceError::TradeNotFound { trade_id })?;

        if trade.status != expected {
            return Err(LeagueServiceError::InvalidTradeState {
                trade_id,
                status: trade.status,
                expected,
            });
        }
        Ok(trade)
    }

    async fn active_season_id(&self) -> Result<SeasonId> {
        self.keeper
            .store()
            .active_season()
            .await?
            .map(|season| season.id)
            .ok_or(LeagueServiceError::NoActiveSeason)
    }

    /// Move each side's players to `manager_for(side)` in a season
    async fn move_players<F>(&self, trade: &TradeRecord, season_id: SeasonId, manager_for: F) -> Result<usize>
    where
        F: Fn(&TradeRecord, TradeSide) -> i64,
    {
        let mut moved = 0;
        for side in TradeSide::BOTH {
            let list = trade.players(side);
            if list.malformed || list.rejected > 0 {
                warn!(
                    trade_id = trade.id,
                    %side,
                    rejected = list.rejected,
                    malformed = list.malformed,
                    "Moving only the usable player ids on trade"
                );
            }
            if list.ids.is_empty() {
                continue;
            }

            let manager_id = manager_for(trade, side);
            moved += self.keeper.store().transfer_players(season_id, &list.ids, manager_id).await?;
        }
        Ok(moved)
    }

    /// Recalculation after a trade never fails the trade itself
    async fn recalculate_best_effort(
        &self,
        trade: &TradeRecord,
        season_id: SeasonId,
    ) -> Option<RecalculationSummary> {
        let players = trade.involved_players();
        if players.is_empty() {
            return None;
        }

        match self.keeper.recalculate_keeper_costs(&players, season_id).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!(trade_id = trade.id, "Failed to recalculate keeper costs after trade: {}", e);
                None
            }
        }
    }

    /// Undo a claimed transition after a later step failed
    async fn restore_trade(&self, original: &TradeRecord, claimed: TradeStatus) {
        if let Err(e) = self.keeper.store().save_trade(original, claimed).await {
            error!(trade_id = original.id, "Failed to restore trade after error: {}", e);
        }
    }

    /// Accept a pending trade and move its players in the active season
    pub async fn accept_trade(&self, trade_id: TradeId) -> Result<TradeOutcome> {
        let original = self.load_trade(trade_id, TradeStatus::Pending).await?;
        let season_id = self.active_season_id().await?;

        let mut trade = original.clone();
        trade.status = TradeStatus::Accepted;
        trade.responded_at = Some(Utc::now());
        trade.impacts_season_id = Some(season_id);

        // Claim the transition before touching rosters; a concurrent accept
        // of the same trade fails here with a conflict
        self.keeper.store().save_trade(&trade, TradeStatus::Pending).await?;

        let players_moved = match self
            .move_players(&trade, season_id, |trade, side| trade.destination_manager(side))
            .await
        {
            Ok(moved) => moved,
            Err(e) => {
                self.restore_trade(&original, TradeStatus::Accepted).await;
                return Err(e);
            }
        };

        let keeper_costs = self.recalculate_best_effort(&trade, season_id).await;

        info!("Trade {} accepted, moved {} players in season {}", trade_id, players_moved, season_id);
        Ok(TradeOutcome { trade, season_id, players_moved, keeper_costs })
    }

    /// Undo an accepted trade: players go back and the trade is pending again
    pub async fn revert_trade(&self, trade_id: TradeId) -> Result<TradeOutcome> {
        let original = self.load_trade(trade_id, TradeStatus::Accepted).await?;
        let season_id = match original.impacts_season_id {
            Some(season_id) => season_id,
            None => self.active_season_id().await?,
        };

        let mut trade = original.clone();
        trade.status = TradeStatus::Pending;
        trade.responded_at = None;
        trade.impacts_season_id = None;

        // Saved before recalculation so the reverted trade no longer adds a surcharge
        self.keeper.store().save_trade(&trade, TradeStatus::Accepted).await?;

        let players_moved = match self
            .move_players(&trade, season_id, |trade, side| trade.origin_manager(side))
            .await
        {
            Ok(moved) => moved,
            Err(e) => {
                self.restore_trade(&original, TradeStatus::Pending).await;
                return Err(e);
            }
        };

        let keeper_costs = self.recalculate_best_effort(&trade, season_id).await;

        info!("Trade {} reverted, moved {} players back in season {}", trade_id, players_moved, season_id);
        Ok(TradeOutcome { trade, season_id, players_moved, keeper_costs })
    }

    /// Store a new pending trade between two managers
    pub async fn propose_trade(&self, proposal: &NewTrade) -> Result<TradeRecord> {
        validate_season_id(proposal.season_id)?;
        validate_trade_managers(proposal.proposer_manager_id, proposal.receiver_manager_id)?;
        validate_trade_cash("proposer_cash", proposal.proposer_cash)?;
        validate_trade_cash("receiver_cash", proposal.receiver_cash)?;
        for id in proposal.proposer_players.iter().chain(&proposal.receiver_players) {
            validate_player_id(*id)?;
        }

        self.keeper.require_season(proposal.season_id).await?;
        self.keeper.require_manager(proposal.proposer_manager_id).await?;
        self.keeper.require_manager(proposal.receiver_manager_id).await?;

        let trade = self.keeper.store().create_trade(proposal).await?;
        info!(
            trade_id = trade.id,
            season_id = trade.season_id,
            "Trade proposed by manager {} to manager {}",
            trade.proposer_manager_id,
            trade.receiver_manager_id
        );
        Ok(trade)
    }

    /// Pending and accepted trades for a season, newest first
    pub async fn season_trades(&self, season_id: SeasonId) -> Result<Vec<TradeSummary>> {
        validate_season_id(season_id)?;
        self.keeper.require_season(season_id).await?;

        let store = self.keeper.store();
        let trades = store
            .season_trades(season_id, &[TradeStatus::Accepted, TradeStatus::Pending])
            .await?;

        let mut player_ids: Vec<PlayerId> =
            trades.iter().flat_map(|trade| trade.involved_players()).collect();
        player_ids.sort_unstable();
        player_ids.dedup();
        let mut manager_ids: Vec<ManagerId> = trades
            .iter()
            .flat_map(|trade| [trade.proposer_manager_id, trade.receiver_manager_id])
            .collect();
        manager_ids.sort_unstable();
        manager_ids.dedup();

        let players: HashMap<PlayerId, String> = store
            .players(&player_ids)
            .await?
            .into_iter()
            .map(|player| (player.id, player.name))
            .collect();
        let managers: HashMap<ManagerId, String> = store
            .managers(&manager_ids)
            .await?
            .into_iter()
            .map(|manager| (manager.id, manager.manager_name))
            .collect();

        let party = |trade: &TradeRecord, side: TradeSide| {
            let manager_id = trade.origin_manager(side);
            TradeParty {
                id: manager_id,
                manager_name: managers.get(&manager_id).cloned(),
                players: trade
                    .players(side)
                    .ids
                    .into_iter()
                    .map(|id| TradePlayer {
                        id,
                        name: players.get(&id).cloned().unwrap_or_else(|| "Unknown Player".to_string()),
                    })
                    .collect(),
                cash: match side {
                    TradeSide::Proposer => trade.proposer_cash,
                    TradeSide::Receiver => trade.receiver_cash,
                },
            }
        };

        Ok(trades
            .iter()
            .map(|trade| TradeSummary {
                id: trade.id,
                season_id: trade.season_id,
                status: trade.status,
                was_offseason: trade.was_offseason,
                created_at: trade.created_at,
                responded_at: trade.responded_at,
                proposer: party(trade, TradeSide::Proposer),
                receiver: party(trade, TradeSide::Receiver),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_store;
    use keeper_cost::SelfTradePolicy;
    use league_store::{InMemoryLeagueStore, RosterFilter};
    use std::sync::Arc;

    fn desk() -> TradeDesk<InMemoryLeagueStore> {
        TradeDesk::new(KeeperCostService::new(Arc::new(sample_store()), SelfTradePolicy::default()))
    }

    async fn owner(desk: &TradeDesk<InMemoryLeagueStore>, player_id: i64) -> (i64, Option<i64>) {
        let rows = desk.keeper.store().rosters(2, &RosterFilter::players(&[player_id])).await.unwrap();
        (rows[0].manager_id, rows[0].keeper_cost)
    }

    #[tokio::test]
    async fn test_accept_moves_players_and_adds_surcharge() {
        let desk = desk();
        let outcome = desk.accept_trade(12).await.unwrap();

        assert_eq!(outcome.trade.status, TradeStatus::Accepted);
        assert_eq!(outcome.trade.impacts_season_id, Some(2));
        assert!(outcome.trade.responded_at.is_some());
        assert_eq!(outcome.players_moved, 1);

        // $30 draft + $10 + one trade
        assert_eq!(owner(&desk, 103).await, (2, Some(45)));
        assert_eq!(outcome.keeper_costs.unwrap().updated.len(), 1);
    }

    #[tokio::test]
    async fn test_revert_restores_rosters_and_cost() {
        let desk = desk();
        desk.accept_trade(12).await.unwrap();
        let outcome = desk.revert_trade(12).await.unwrap();

        assert_eq!(outcome.trade.status, TradeStatus::Pending);
        assert!(outcome.trade.responded_at.is_none());
        assert!(outcome.trade.impacts_season_id.is_none());
        assert_eq!(owner(&desk, 103).await, (1, Some(40)));
    }

    #[tokio::test]
    async fn test_revert_accepted_trade_without_impacts_uses_active_season() {
        let desk = desk();
        let outcome = desk.revert_trade(10).await.unwrap();

        assert_eq!(outcome.season_id, 2);
        assert_eq!(outcome.players_moved, 2);
        assert_eq!(owner(&desk, 101).await.0, 1);
        assert_eq!(owner(&desk, 102).await.0, 2);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_move_players_once() {
        let desk = desk();
        let (first, second) = tokio::join!(desk.accept_trade(12), desk.accept_trade(12));

        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        let failed = if first.is_err() { first } else { second };
        assert!(matches!(
            failed,
            Err(LeagueServiceError::InvalidTradeState { .. })
                | Err(LeagueServiceError::Store(league_store::StoreError::Conflict { .. }))
        ));
        assert_eq!(owner(&desk, 103).await, (2, Some(45)));
    }

    #[tokio::test]
    async fn test_stale_accept_is_a_conflict() {
        let desk = desk();
        let stale = desk.keeper.store().trade(12).await.unwrap().unwrap();
        desk.accept_trade(12).await.unwrap();

        let mut late = stale.clone();
        late.status = TradeStatus::Rejected;
        assert!(matches!(
            desk.keeper.store().save_trade(&late, TradeStatus::Pending).await,
            Err(league_store::StoreError::Conflict { id: 12, .. })
        ));
    }

    fn proposal(proposer: i64, receiver: i64) -> NewTrade {
        NewTrade {
            season_id: 2,
            proposer_manager_id: proposer,
            receiver_manager_id: receiver,
            proposer_players: vec![103],
            receiver_players: vec![102],
            proposer_cash: 0,
            receiver_cash: 3,
            was_offseason: false,
        }
    }

    #[tokio::test]
    async fn test_propose_then_accept() {
        let desk = desk();
        let trade = desk.propose_trade(&proposal(1, 2)).await.unwrap();

        assert_eq!(trade.id, 14);
        assert_eq!(trade.status, TradeStatus::Pending);

        let outcome = desk.accept_trade(trade.id).await.unwrap();
        assert_eq!(outcome.players_moved, 2);
        assert_eq!(owner(&desk, 102).await.0, 1);
    }

    #[tokio::test]
    async fn test_propose_rejects_bad_proposals() {
        let desk = desk();

        assert!(matches!(
            desk.propose_trade(&proposal(1, 1)).await,
            Err(LeagueServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            desk.propose_trade(&proposal(1, 9)).await,
            Err(LeagueServiceError::ManagerNotFound { manager_id: 9 })
        ));

        let mut negative = proposal(1, 2);
        negative.proposer_cash = -1;
        assert!(desk.propose_trade(&negative).await.is_err());

        let mut unknown_season = proposal(1, 2);
        unknown_season.season_id = 40;
        assert!(matches!(
            desk.propose_trade(&unknown_season).await,
            Err(LeagueServiceError::SeasonNotFound { season_id: 40 })
        ));
    }

    #[tokio::test]
    async fn test_season_trades_lists_pending_and_accepted() {
        let desk = desk();
        let trades = desk.season_trades(2).await.unwrap();

        // Trade 13 is accepted but offseason, so it is still listed
        let ids: Vec<TradeId> = trades.iter().map(|trade| trade.id).collect();
        assert_eq!(ids.len(), 4);
        let first = trades.iter().find(|trade| trade.id == 10).unwrap();
        assert_eq!(first.proposer.manager_name.as_deref(), Some("Haight"));
        assert_eq!(first.proposer.players[0].name, "Jalen Brunson");
        assert_eq!(first.receiver.players[0].id, 102);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let desk = desk();

        assert!(matches!(
            desk.accept_trade(10).await,
            Err(LeagueServiceError::InvalidTradeState { trade_id: 10, .. })
        ));
        assert!(matches!(
            desk.revert_trade(12).await,
            Err(LeagueServiceError::InvalidTradeState { expected: TradeStatus::Accepted, .. })
        ));
        assert!(matches!(
            desk.accept_trade(404).await,
            Err(LeagueServiceError::TradeNotFound { trade_id: 404 })
        ));
    }
}
