//! In-memory league store backed by a JSON league file

use crate::error::{Result, StoreError};
use crate::store::LeagueStore;
use crate::types::{
    DraftResult, LeagueSnapshot, Manager, NewDraftPick, NewRosterEntry, NewTrade, Player,
    RosterEntry, RosterEntryId, RosterFilter, Season,
};
use keeper_cost::{ManagerId, PlayerId, SeasonId, TradeId, TradeRecord, TradeStatus};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// League store holding every table in memory
pub struct InMemoryLeagueStore {
    state: RwLock<LeagueSnapshot>,
}

impl InMemoryLeagueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self { state: RwLock::new(LeagueSnapshot::default()) }
    }

    /// Create a store from an existing snapshot
    pub fn from_snapshot(snapshot: LeagueSnapshot) -> Result<Self> {
        validate_snapshot(&snapshot)?;
        Ok(Self { state: RwLock::new(snapshot) })
    }

    /// Load league data from a JSON file
    pub async fn load_from_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        info!("Loading league data from: {:?}", file_path.as_ref());

        let json_content = tokio::fs::read_to_string(&file_path).await?;
        let snapshot: LeagueSnapshot = serde_json::from_str(&json_content)?;

        info!(
            "Loaded {} seasons, {} players, {} roster rows, {} trades",
            snapshot.seasons.len(),
            snapshot.players.len(),
            snapshot.rosters.len(),
            snapshot.trades.len()
        );

        Self::from_snapshot(snapshot)
    }

    /// Write the current league data to a JSON file
    pub async fn save_to_file<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let json_content = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)?
        };
        tokio::fs::write(&file_path, json_content).await?;

        info!("Saved league data to: {:?}", file_path.as_ref());
        Ok(())
    }

    /// Clone of the current league data
    pub async fn snapshot(&self) -> LeagueSnapshot {
        self.state.read().await.clone()
    }
}

impl Default for InMemoryLeagueStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_snapshot(snapshot: &LeagueSnapshot) -> Result<()> {
    let active = snapshot.seasons.iter().filter(|season| season.is_active).count();
    if active > 1 {
        return Err(StoreError::InvalidData(format!("{active} seasons are marked active")));
    }

    ensure_unique("season", snapshot.seasons.iter().map(|season| season.id))?;
    ensure_unique("draft result", snapshot.draft_results.iter().map(|result| result.id))?;
    ensure_unique("roster entry", snapshot.rosters.iter().map(|entry| entry.id))?;
    ensure_unique("trade", snapshot.trades.iter().map(|trade| trade.id))?;

    Ok(())
}

fn ensure_unique(entity: &str, ids: impl Iterator<Item = i64>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StoreError::InvalidData(format!("duplicate {entity} id {id}")));
        }
    }
    Ok(())
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

#[async_trait::async_trait]
impl LeagueStore for InMemoryLeagueStore {
    async fn season(&self, season_id: SeasonId) -> Result<Option<Season>> {
        let state = self.state.read().await;
        Ok(state.seasons.iter().find(|season| season.id == season_id).cloned())
    }

    async fn active_season(&self) -> Result<Option<Season>> {
        let state = self.state.read().await;
        Ok(state.seasons.iter().find(|season| season.is_active).cloned())
    }

    async fn previous_season(&self, season_id: SeasonId) -> Result<Option<Season>> {
        let state = self.state.read().await;
        let current = state
            .seasons
            .iter()
            .find(|season| season.id == season_id)
            .ok_or_else(|| StoreError::not_found("season", season_id))?;

        Ok(state
            .seasons
            .iter()
            .filter(|season| season.year < current.year)
            .max_by_key(|season| season.year)
            .cloned())
    }

    async fn seasons(&self) -> Result<Vec<Season>> {
        let state = self.state.read().await;
        let mut seasons = state.seasons.clone();
        seasons.sort_by(|a, b| b.year.cmp(&a.year));
        Ok(seasons)
    }

    async fn players(&self, player_ids: &[PlayerId]) -> Result<Vec<Player>> {
        let state = self.state.read().await;
        Ok(state.players.iter().filter(|player| player_ids.contains(&player.id)).cloned().collect())
    }

    async fn search_players(&self, query: &str) -> Result<Vec<Player>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        let mut found: Vec<Player> = state
            .players
            .iter()
            .filter(|player| player.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by_key(|player| player.id);
        Ok(found)
    }

    async fn managers(&self, manager_ids: &[ManagerId]) -> Result<Vec<Manager>> {
        let state = self.state.read().await;
        Ok(state
            .managers
            .iter()
            .filter(|manager| manager_ids.contains(&manager.id))
            .cloned()
            .collect())
    }

    async fn draft_results(
        &self,
        season_id: SeasonId,
        player_ids: Option<&[PlayerId]>,
    ) -> Result<Vec<DraftResult>> {
        let state = self.state.read().await;
        Ok(state
            .draft_results
            .iter()
            .filter(|result| result.season_id == season_id)
            .filter(|result| player_ids.map_or(true, |ids| ids.contains(&result.player_id)))
            .cloned()
            .collect())
    }

    async fn draft_history(&self, player_id: Option<PlayerId>) -> Result<Vec<DraftResult>> {
        let state = self.state.read().await;
        Ok(state
            .draft_results
            .iter()
            .filter(|result| player_id.map_or(true, |id| id == result.player_id))
            .cloned()
            .collect())
    }

    async fn record_draft_pick(&self, pick: &NewDraftPick) -> Result<DraftResult> {
        let mut state = self.state.write().await;
        let result = DraftResult {
            id: next_id(state.draft_results.iter().map(|result| result.id)),
            player_id: pick.player_id,
            manager_id: pick.manager_id,
            season_id: pick.season_id,
            draft_price: Some(pick.draft_price),
            is_keeper: pick.is_keeper,
            is_topper: pick.is_topper,
        };
        state.draft_results.push(result.clone());

        debug!("Recorded draft pick {} for player {}", result.id, result.player_id);
        Ok(result)
    }

    async fn accepted_in_season_trades(&self, season_id: SeasonId) -> Result<Vec<TradeRecord>> {
        let state = self.state.read().await;
        Ok(state
            .trades
            .iter()
            .filter(|trade| trade.season_id == season_id && trade.counts_toward_surcharge())
            .cloned()
            .collect())
    }

    async fn rosters(&self, season_id: SeasonId, filter: &RosterFilter) -> Result<Vec<RosterEntry>> {
        let state = self.state.read().await;
        Ok(state
            .rosters
            .iter()
            .filter(|entry| entry.season_id == season_id && filter.matches(entry))
            .cloned()
            .collect())
    }

    async fn add_roster_entry(&self, entry: &NewRosterEntry) -> Result<RosterEntry> {
        let mut state = self.state.write().await;
        let row = RosterEntry {
            id: next_id(state.rosters.iter().map(|row| row.id)),
            player_id: entry.player_id,
            manager_id: entry.manager_id,
            season_id: entry.season_id,
            keeper_cost: entry.keeper_cost,
            consecutive_keeps: entry.consecutive_keeps,
        };
        state.rosters.push(row.clone());
        Ok(row)
    }

    async fn set_keeper_cost(&self, roster_id: RosterEntryId, keeper_cost: i64) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .rosters
            .iter_mut()
            .find(|entry| entry.id == roster_id)
            .ok_or_else(|| StoreError::not_found("roster entry", roster_id))?;

        entry.keeper_cost = Some(keeper_cost);
        debug!("Stored keeper cost ${} on roster entry {}", keeper_cost, roster_id);
        Ok(())
    }

    async fn trade(&self, trade_id: TradeId) -> Result<Option<TradeRecord>> {
        let state = self.state.read().await;
        Ok(state.trades.iter().find(|trade| trade.id == trade_id).cloned())
    }

    async fn season_trades(
        &self,
        season_id: SeasonId,
        statuses: &[TradeStatus],
    ) -> Result<Vec<TradeRecord>> {
        let state = self.state.read().await;
        let mut trades: Vec<TradeRecord> = state
            .trades
            .iter()
            .filter(|trade| trade.season_id == season_id && statuses.contains(&trade.status))
            .cloned()
            .collect();
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(trades)
    }

    async fn create_trade(&self, trade: &NewTrade) -> Result<TradeRecord> {
        let mut state = self.state.write().await;
        let mut record = TradeRecord::new(
            next_id(state.trades.iter().map(|trade| trade.id)),
            trade.season_id,
            trade.proposer_manager_id,
            trade.receiver_manager_id,
        )
        .with_players(&trade.proposer_players, &trade.receiver_players)
        .offseason(trade.was_offseason);
        record.proposer_cash = trade.proposer_cash;
        record.receiver_cash = trade.receiver_cash;

        state.trades.push(record.clone());
        Ok(record)
    }

    async fn save_trade(&self, trade: &TradeRecord, expected: TradeStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .trades
            .iter_mut()
            .find(|stored| stored.id == trade.id)
            .ok_or_else(|| StoreError::not_found("trade", trade.id))?;

        if stored.status != expected {
            return Err(StoreError::Conflict { entity: "trade", id: trade.id });
        }
        *stored = trade.clone();
        Ok(())
    }

    async fn transfer_players(
        &self,
        season_id: SeasonId,
        player_ids: &[PlayerId],
        manager_id: ManagerId,
    ) -> Result<usize> {
        let mut state = self.state.write().await;
        let mut moved = 0;
        for entry in state
            .rosters
            .iter_mut()
            .filter(|entry| entry.season_id == season_id && player_ids.contains(&entry.player_id))
        {
            entry.manager_id = manager_id;
            moved += 1;
        }

        debug!("Moved {} roster rows in season {} to manager {}", moved, season_id, manager_id);
        Ok(moved)
    }
}
