//! League data model

use keeper_cost::{ManagerId, PlayerId, SeasonId, TradeRecord};
use serde::{Deserialize, Serialize};

pub type RosterEntryId = i64;

/// A league season (e.g. "2024-25")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub name: String,

    /// Starting year, used to order seasons
    pub year: i32,

    /// The season currently being played
    #[serde(default)]
    pub is_active: bool,

    /// The season whose budgets and rosters managers currently see
    #[serde(default)]
    pub is_active_assets: bool,
}

/// An NBA player known to the league
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

/// A league manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manager {
    pub id: ManagerId,
    pub manager_name: String,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// One pick from a season's auction draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftResult {
    pub id: i64,
    pub player_id: PlayerId,
    pub manager_id: ManagerId,
    pub season_id: SeasonId,
    pub draft_price: Option<i64>,
    #[serde(default)]
    pub is_keeper: bool,
    #[serde(default)]
    pub is_topper: bool,
}

/// A player on a manager's roster for one season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: RosterEntryId,
    pub player_id: PlayerId,
    pub manager_id: ManagerId,
    pub season_id: SeasonId,

    /// Stored price to keep this player next season
    #[serde(default)]
    pub keeper_cost: Option<i64>,

    /// Consecutive seasons this player has been kept; unset for non-keepers
    #[serde(default)]
    pub consecutive_keeps: Option<u32>,
}

/// Narrows a roster query within a season
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    pub player_ids: Option<Vec<PlayerId>>,
    pub manager_id: Option<ManagerId>,
}

impl RosterFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn players(player_ids: &[PlayerId]) -> Self {
        Self { player_ids: Some(player_ids.to_vec()), manager_id: None }
    }

    pub fn manager(manager_id: ManagerId) -> Self {
        Self { player_ids: None, manager_id: Some(manager_id) }
    }

    pub fn matches(&self, entry: &RosterEntry) -> bool {
        let player_ok = self.player_ids.as_ref().map_or(true, |ids| ids.contains(&entry.player_id));
        let manager_ok = self.manager_id.map_or(true, |id| id == entry.manager_id);
        player_ok && manager_ok
    }
}

/// A draft pick about to be recorded; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDraftPick {
    pub player_id: PlayerId,
    pub manager_id: ManagerId,
    pub season_id: SeasonId,
    pub draft_price: i64,
    #[serde(default)]
    pub is_keeper: bool,
    #[serde(default)]
    pub is_topper: bool,
}

/// A roster row about to be added; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRosterEntry {
    pub player_id: PlayerId,
    pub manager_id: ManagerId,
    pub season_id: SeasonId,
    pub keeper_cost: Option<i64>,
    pub consecutive_keeps: Option<u32>,
}

/// A trade proposal about to be stored as pending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrade {
    pub season_id: SeasonId,
    pub proposer_manager_id: ManagerId,
    pub receiver_manager_id: ManagerId,
    #[serde(default)]
    pub proposer_players: Vec<PlayerId>,
    #[serde(default)]
    pub receiver_players: Vec<PlayerId>,
    #[serde(default)]
    pub proposer_cash: i64,
    #[serde(default)]
    pub receiver_cash: i64,
    #[serde(default)]
    pub was_offseason: bool,
}

/// Every table the league service reads, as stored in the league file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub managers: Vec<Manager>,
    #[serde(default)]
    pub draft_results: Vec<DraftResult>,
    #[serde(default)]
    pub rosters: Vec<RosterEntry>,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
}
