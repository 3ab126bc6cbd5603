//! League Store - league data model and the storage seam
//!
//! The league service never talks to a database directly. It goes through the
//! [`LeagueStore`] trait; [`InMemoryLeagueStore`] is the bundled
//! implementation, backed by a JSON league file.

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::InMemoryLeagueStore;
pub use store::LeagueStore;
pub use types::{
    DraftResult, LeagueSnapshot, Manager, NewDraftPick, NewRosterEntry, NewTrade, Player,
    RosterEntry, RosterEntryId, RosterFilter, Season,
};

// Re-export the ids shared with the pricing crate
pub use keeper_cost::{ManagerId, PlayerId, SeasonId, TradeId, TradeRecord, TradeStatus};
