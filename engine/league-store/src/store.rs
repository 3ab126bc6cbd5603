//! Storage seam between the league service and wherever league data lives

use crate::error::Result;
use crate::types::{
    DraftResult, Manager, NewDraftPick, NewRosterEntry, NewTrade, Player, RosterEntry,
    RosterEntryId, RosterFilter, Season,
};
use keeper_cost::{ManagerId, PlayerId, SeasonId, TradeId, TradeRecord, TradeStatus};
use std::collections::HashMap;

/// Abstract trait for league data backends
///
/// Implementations own their own consistency; the league service issues one
/// call per step and does not hold locks across calls.
#[async_trait::async_trait]
pub trait LeagueStore: Send + Sync {
    /// Look up a season
    async fn season(&self, season_id: SeasonId) -> Result<Option<Season>>;

    /// The season currently being played
    async fn active_season(&self) -> Result<Option<Season>>;

    /// The season immediately before `season_id`, by year
    async fn previous_season(&self, season_id: SeasonId) -> Result<Option<Season>>;

    /// Every season, newest year first
    async fn seasons(&self) -> Result<Vec<Season>>;

    /// Players by id; unknown ids are left out
    async fn players(&self, player_ids: &[PlayerId]) -> Result<Vec<Player>>;

    /// Players whose name contains `query`, ignoring case, ordered by id
    async fn search_players(&self, query: &str) -> Result<Vec<Player>>;

    /// Managers by id; unknown ids are left out
    async fn managers(&self, manager_ids: &[ManagerId]) -> Result<Vec<Manager>>;

    /// Draft results for a season, optionally restricted to some players
    async fn draft_results(
        &self,
        season_id: SeasonId,
        player_ids: Option<&[PlayerId]>,
    ) -> Result<Vec<DraftResult>>;

    /// Draft results across every season, optionally for one player
    async fn draft_history(&self, player_id: Option<PlayerId>) -> Result<Vec<DraftResult>>;

    /// Store a draft pick and return it with its assigned id
    async fn record_draft_pick(&self, pick: &NewDraftPick) -> Result<DraftResult>;

    /// Draft price per player for a season. Players without a draft result
    /// are absent; players drafted without a price map to `None`.
    async fn draft_prices(
        &self,
        season_id: SeasonId,
        player_ids: &[PlayerId],
    ) -> Result<HashMap<PlayerId, Option<i64>>> {
        let results = self.draft_results(season_id, Some(player_ids)).await?;
        Ok(results.into_iter().map(|result| (result.player_id, result.draft_price)).collect())
    }

    /// Accepted, non-offseason trades for a season
    async fn accepted_in_season_trades(&self, season_id: SeasonId) -> Result<Vec<TradeRecord>>;

    /// Roster rows for a season
    async fn rosters(&self, season_id: SeasonId, filter: &RosterFilter) -> Result<Vec<RosterEntry>>;

    /// Add a roster row and return it with its assigned id
    async fn add_roster_entry(&self, entry: &NewRosterEntry) -> Result<RosterEntry>;

    /// Persist a computed keeper cost on a roster row
    async fn set_keeper_cost(&self, roster_id: RosterEntryId, keeper_cost: i64) -> Result<()>;

    /// Look up a trade
    async fn trade(&self, trade_id: TradeId) -> Result<Option<TradeRecord>>;

    /// Trades for a season in any of `statuses`, newest first
    async fn season_trades(
        &self,
        season_id: SeasonId,
        statuses: &[TradeStatus],
    ) -> Result<Vec<TradeRecord>>;

    /// Store a new pending trade and return it with its assigned id
    async fn create_trade(&self, trade: &NewTrade) -> Result<TradeRecord>;

    /// Replace a stored trade, but only while its stored status is still
    /// `expected`. Fails with [`StoreError::Conflict`] otherwise.
    ///
    /// [`StoreError::Conflict`]: crate::StoreError::Conflict
    async fn save_trade(&self, trade: &TradeRecord, expected: TradeStatus) -> Result<()>;

    /// Reassign roster rows for `player_ids` in a season to `manager_id`.
    /// Returns the number of rows moved.
    async fn transfer_players(
        &self,
        season_id: SeasonId,
        player_ids: &[PlayerId],
        manager_id: ManagerId,
    ) -> Result<usize>;
}
