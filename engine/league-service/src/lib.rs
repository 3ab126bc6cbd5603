//! League Service - keeper pricing, rosters and trades over HTTP
//!
//! Wires the pricing crate to a league store and exposes pricing, live draft
//! entry, rosters and trades as a REST API. The `league-server` binary loads a league data file into an
//! in-memory store and serves it.

pub mod config;
pub mod draft;
pub mod error;
pub mod keeper;
pub mod logging;
pub mod rest_api;
pub mod signals;
pub mod trades;

#[cfg(test)]
mod test_support;

pub use config::{DataConfig, HttpConfig, KeeperConfig, LeagueServiceConfig, LoggingConfig};
pub use draft::{
    DraftBoard, DraftEntry, DraftHistoryEntry, DraftPickView, PlayerHistory, PlayerLookup,
};
pub use error::{LeagueServiceError, Result};
pub use keeper::{
    KeeperCostMap, KeeperCostService, KeeperCostUpdate, KeeperPriceQuote, QuoteSource,
    RecalculationSummary, RosterView, TradeLedgerRow,
};
pub use logging::initialize_logging_with_config;
pub use rest_api::create_routes;
pub use signals::setup_signal_handlers;
pub use trades::{TradeDesk, TradeOutcome, TradeParty, TradePlayer, TradeSummary};
