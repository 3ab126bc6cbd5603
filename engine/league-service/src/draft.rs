//! Live draft entry and draft history
//!
//! Recording a pick also puts the player on the drafting manager's roster
//! with a keeper cost. Pricing failures propagate, so a pick is never
//! reported as entered with a missing cost.

use crate::error::{LeagueServiceError, Result};
use crate::keeper::KeeperCostService;
use keeper_cost::validation::{
    validate_draft_price, validate_manager_id, validate_player_id, validate_season_id,
};
use keeper_cost::{ManagerId, PlayerId, SeasonId};
use league_store::{
    DraftResult, LeagueStore, Manager, NewDraftPick, NewRosterEntry, Player, RosterEntryId,
    RosterFilter, Season,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Draft history entries returned per player
pub const PLAYER_HISTORY_LIMIT: usize = 20;

/// A recorded pick and the roster row it created
#[derive(Debug, Clone, Serialize)]
pub struct DraftEntry {
    pub pick: DraftResult,
    pub roster_id: RosterEntryId,
    pub consecutive_keeps: Option<u32>,
    pub keeper_cost: i64,
}

/// A draft result joined with player, manager and roster data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftPickView {
    pub id: i64,
    pub season_id: SeasonId,
    pub season_name: Option<String>,
    pub player_id: PlayerId,
    pub player_name: Option<String>,
    pub manager_id: ManagerId,
    pub manager_name: String,
    pub team_name: Option<String>,
    pub draft_price: Option<i64>,
    pub is_keeper: bool,
    pub is_topper: bool,

    /// From the season's roster row; only filled for single-season queries
    pub consecutive_keeps: Option<u32>,
}

/// How to find a player for [`DraftBoard::player_history`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerLookup {
    Id(PlayerId),
    /// Case-insensitive name fragment; the lowest-id match wins
    Name(String),
}

/// One season of a player's draft history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftHistoryEntry {
    pub season_id: SeasonId,
    pub season_name: Option<String>,
    pub year: Option<i32>,
    pub manager_id: ManagerId,
    pub manager_name: String,
    pub draft_price: Option<i64>,
    pub is_keeper: bool,
    pub is_topper: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerHistory {
    pub player: Option<Player>,
    pub draft_history: Vec<DraftHistoryEntry>,
}

impl PlayerHistory {
    fn empty() -> Self {
        Self { player: None, draft_history: Vec::new() }
    }
}

/// Draft entry and draft result queries over a league store
pub struct DraftBoard<S: LeagueStore> {
    keeper: KeeperCostService<S>,
}

impl<S: LeagueStore> DraftBoard<S> {
    pub fn new(keeper: KeeperCostService<S>) -> Self {
        Self { keeper }
    }

    async fn manager_names(&self, results: &[DraftResult]) -> Result<HashMap<ManagerId, Manager>> {
        let mut manager_ids: Vec<ManagerId> = results.iter().map(|r| r.manager_id).collect();
        manager_ids.sort_unstable();
        manager_ids.dedup();

        Ok(self
            .keeper
            .store()
            .managers(&manager_ids)
            .await?
            .into_iter()
            .map(|manager| (manager.id, manager))
            .collect())
    }

    async fn player_names(&self, results: &[DraftResult]) -> Result<HashMap<PlayerId, String>> {
        let player_ids: Vec<PlayerId> = results.iter().map(|r| r.player_id).collect();
        Ok(self
            .keeper
            .store()
            .players(&player_ids)
            .await?
            .into_iter()
            .map(|player| (player.id, player.name))
            .collect())
    }

    /// Record a live draft pick and roster the player with a keeper cost.
    ///
    /// Keeper picks continue last season's keep streak; everyone else is a
    /// fresh roster addition.
    pub async fn record_pick(&self, pick: &NewDraftPick) -> Result<DraftEntry> {
        validate_season_id(pick.season_id)?;
        validate_player_id(pick.player_id)?;
        validate_manager_id(pick.manager_id)?;
        validate_draft_price(pick.draft_price)?;

        self.keeper.require_season(pick.season_id).await?;
        self.keeper.require_player(pick.player_id).await?;
        self.keeper.require_manager(pick.manager_id).await?;

        let store = self.keeper.store();
        let (player_id, season_id) = (pick.player_id, pick.season_id);
        if !store.draft_results(season_id, Some(&[player_id][..])).await?.is_empty() {
            return Err(LeagueServiceError::AlreadyDrafted { player_id, season_id });
        }
        if !store.rosters(season_id, &RosterFilter::players(&[player_id])).await?.is_empty() {
            return Err(LeagueServiceError::AlreadyRostered { player_id, season_id });
        }

        let consecutive_keeps = if pick.is_keeper {
            Some(self.previous_keeps(player_id, season_id).await? + 1)
        } else {
            None
        };

        let recorded = store.record_draft_pick(pick).await?;

        let entry = if pick.is_keeper {
            let row = store
                .add_roster_entry(&NewRosterEntry {
                    player_id,
                    manager_id: pick.manager_id,
                    season_id,
                    keeper_cost: None,
                    consecutive_keeps,
                })
                .await?;
            let summary = self.keeper.recalculate_keeper_costs(&[player_id], season_id).await?;
            let keeper_cost = summary
                .updated
                .iter()
                .find(|update| update.roster_id == row.id)
                .map(|update| update.keeper_cost)
                .ok_or_else(|| league_store::StoreError::not_found("roster entry", row.id))?;

            DraftEntry { pick: recorded, roster_id: row.id, consecutive_keeps, keeper_cost }
        } else {
            let keeper_cost = self.keeper.keeper_cost_for_roster_addition(player_id, season_id).await?;
            let row = store
                .add_roster_entry(&NewRosterEntry {
                    player_id,
                    manager_id: pick.manager_id,
                    season_id,
                    keeper_cost: Some(keeper_cost),
                    consecutive_keeps: None,
                })
                .await?;

            DraftEntry { pick: recorded, roster_id: row.id, consecutive_keeps: None, keeper_cost }
        };

        info!(
            season_id,
            player_id,
            manager_id = pick.manager_id,
            "Draft pick recorded at ${} with keeper cost ${}",
            pick.draft_price,
            entry.keeper_cost
        );
        Ok(entry)
    }

    /// Keep streak on last season's roster row, 0 when there is none
    async fn previous_keeps(&self, player_id: PlayerId, season_id: SeasonId) -> Result<u32> {
        let store = self.keeper.store();
        let Some(previous) = store.previous_season(season_id).await? else {
            return Ok(0);
        };

        let rows = store.rosters(previous.id, &RosterFilter::players(&[player_id])).await?;
        Ok(rows.first().and_then(|row| row.consecutive_keeps).unwrap_or(0))
    }

    /// Picks for one season, most recent first
    pub async fn season_picks(&self, season_id: SeasonId) -> Result<Vec<DraftPickView>> {
        validate_season_id(season_id)?;
        let season = self.keeper.require_season(season_id).await?;

        let mut results = self.keeper.store().draft_results(season_id, None).await?;
        results.sort_by(|a, b| b.id.cmp(&a.id));

        self.join_views(results, &HashMap::from([(season.id, season)]), None).await
    }

    /// Draft results, most expensive first. With a season, each row carries
    /// the player's consecutive keeps from that season's roster.
    pub async fn draft_results(&self, season_id: Option<SeasonId>) -> Result<Vec<DraftPickView>> {
        let store = self.keeper.store();
        let (mut results, keeps) = match season_id {
            Some(season_id) => {
                validate_season_id(season_id)?;
                self.keeper.require_season(season_id).await?;

                let keeps: HashMap<PlayerId, Option<u32>> = store
                    .rosters(season_id, &RosterFilter::all())
                    .await?
                    .into_iter()
                    .map(|row| (row.player_id, row.consecutive_keeps))
                    .collect();
                (store.draft_results(season_id, None).await?, Some(keeps))
            }
            None => (store.draft_history(None).await?, None),
        };
        results.sort_by(|a, b| b.draft_price.cmp(&a.draft_price).then(a.id.cmp(&b.id)));

        let seasons: HashMap<SeasonId, Season> =
            store.seasons().await?.into_iter().map(|season| (season.id, season)).collect();
        self.join_views(results, &seasons, keeps.as_ref()).await
    }

    async fn join_views(
        &self,
        results: Vec<DraftResult>,
        seasons: &HashMap<SeasonId, Season>,
        keeps: Option<&HashMap<PlayerId, Option<u32>>>,
    ) -> Result<Vec<DraftPickView>> {
        let managers = self.manager_names(&results).await?;
        let players = self.player_names(&results).await?;

        Ok(results
            .into_iter()
            .map(|result| {
                let manager = managers.get(&result.manager_id);
                DraftPickView {
                    id: result.id,
                    season_id: result.season_id,
                    season_name: seasons.get(&result.season_id).map(|s| s.name.clone()),
                    player_id: result.player_id,
                    player_name: players.get(&result.player_id).cloned(),
                    manager_id: result.manager_id,
                    manager_name: manager
                        .map(|m| m.manager_name.clone())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    team_name: manager.and_then(|m| m.team_name.clone()),
                    draft_price: result.draft_price,
                    is_keeper: result.is_keeper,
                    is_topper: result.is_topper,
                    consecutive_keeps: keeps
                        .and_then(|keeps| keeps.get(&result.player_id).copied().flatten()),
                }
            })
            .collect())
    }

    /// A player's draft history, newest season first
    pub async fn player_history(&self, lookup: &PlayerLookup) -> Result<PlayerHistory> {
        let store = self.keeper.store();
        let player = match lookup {
            PlayerLookup::Id(player_id) => {
                self.keeper.require_player(validate_player_id(*player_id)?).await?
            }
            PlayerLookup::Name(name) => {
                match store.search_players(name.trim()).await?.into_iter().next() {
                    Some(player) => player,
                    None => return Ok(PlayerHistory::empty()),
                }
            }
        };

        let results = store.draft_history(Some(player.id)).await?;
        let seasons: HashMap<SeasonId, Season> =
            store.seasons().await?.into_iter().map(|season| (season.id, season)).collect();
        let managers = self.manager_names(&results).await?;

        let mut draft_history: Vec<DraftHistoryEntry> = results
            .into_iter()
            .map(|result| {
                let season = seasons.get(&result.season_id);
                DraftHistoryEntry {
                    season_id: result.season_id,
                    season_name: season.map(|s| s.name.clone()),
                    year: season.map(|s| s.year),
                    manager_id: result.manager_id,
                    manager_name: managers
                        .get(&result.manager_id)
                        .map(|m| m.manager_name.clone())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    draft_price: result.draft_price,
                    is_keeper: result.is_keeper,
                    is_topper: result.is_topper,
                }
            })
            .collect();
        draft_history.sort_by(|a, b| b.year.cmp(&a.year));
        draft_history.truncate(PLAYER_HISTORY_LIMIT);

        Ok(PlayerHistory { player: Some(player), draft_history })
    }
}
