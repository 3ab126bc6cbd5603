//! Shared league fixture for unit tests

use keeper_cost::{TradeRecord, TradeStatus};
use league_store::{
    DraftResult, InMemoryLeagueStore, LeagueSnapshot, Manager, Player, RosterEntry, Season,
};

fn season(id: i64, year: i32, is_active: bool) -> Season {
    Season {
        id,
        name: format!("{}-{:02}", year, (year + 1) % 100),
        year,
        is_active,
        is_active_assets: is_active,
    }
}

fn player(id: i64, name: &str, position: &str) -> Player {
    Player { id, name: name.to_string(), position: Some(position.to_string()), team: None }
}

fn drafted(id: i64, player_id: i64, manager_id: i64, price: i64, is_keeper: bool) -> DraftResult {
    DraftResult {
        id,
        player_id,
        manager_id,
        season_id: 2,
        draft_price: Some(price),
        is_keeper,
        is_topper: false,
    }
}

fn rostered(
    id: i64,
    player_id: i64,
    manager_id: i64,
    season_id: i64,
    consecutive_keeps: Option<u32>,
    keeper_cost: Option<i64>,
) -> RosterEntry {
    RosterEntry { id, player_id, manager_id, season_id, keeper_cost, consecutive_keeps }
}

/// Three seasons with season 2 active.
///
/// Season 2 trade counts: 101 -> 2, 102 -> 1, 103 -> 0 (its trades are
/// pending or offseason), 104 is never rostered.
pub fn sample_snapshot() -> LeagueSnapshot {
    LeagueSnapshot {
        seasons: vec![season(1, 2023, false), season(2, 2024, true), season(3, 2025, false)],
        players: vec![
            player(101, "Jalen Brunson", "PG"),
            player(102, "Bam Adebayo", "C"),
            player(103, "Tyrese Haliburton", "PG"),
            player(104, "Walker Kessler", "C"),
        ],
        managers: vec![
            Manager {
                id: 1,
                manager_name: "Haight".to_string(),
                team_name: Some("Knicks Tape".to_string()),
                is_admin: true,
            },
            Manager { id: 2, manager_name: "Bier".to_string(), team_name: None, is_admin: false },
        ],
        draft_results: vec![
            drafted(1, 101, 1, 50, false),
            drafted(2, 102, 2, 20, true),
            drafted(3, 103, 1, 30, false),
        ],
        rosters: vec![
            rostered(1, 101, 1, 2, None, None),
            rostered(2, 102, 2, 2, Some(1), None),
            rostered(3, 103, 1, 2, None, Some(42)),
            rostered(4, 101, 1, 1, None, Some(25)),
        ],
        trades: vec![
            TradeRecord::new(10, 2, 1, 2)
                .with_players(&[101], &[102])
                .with_status(TradeStatus::Accepted),
            TradeRecord::new(11, 2, 1, 2).with_players(&[101], &[]).with_status(TradeStatus::Accepted),
            TradeRecord::new(12, 2, 1, 2).with_players(&[103], &[]),
            TradeRecord::new(13, 2, 1, 2)
                .with_players(&[103], &[])
                .with_status(TradeStatus::Accepted)
                .offseason(true),
        ],
    }
}

pub fn sample_store() -> InMemoryLeagueStore {
    InMemoryLeagueStore::from_snapshot(sample_snapshot()).expect("valid fixture")
}
