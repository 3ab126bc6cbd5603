//! Keeper cost orchestration
//!
//! Joins the league store with the pricing crate: fetch draft prices and the
//! season's qualifying trades, count trades per player, price each player.
//!
//! Error policy per entry point:
//! - single-player pricing and recalculation propagate store failures
//! - batch previews degrade to `None` for every player and log the failure

use crate::error::{LeagueServiceError, Result};
use chrono::{DateTime, Utc};
use keeper_cost::validation::{validate_manager_id, validate_player_id, validate_season_id};
use keeper_cost::{
    compute_keeper_cost, format_keeper_cost, next_keep_year, trade_appearances, ManagerId,
    PlayerId, SeasonId, SelfTradePolicy, TradeCountAggregator, TradeCountReport, TradeId,
    TradeSide,
};
use league_store::{LeagueStore, Manager, Player, RosterEntryId, RosterFilter, Season};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Player id -> keeper cost, `None` when the cost could not be computed
pub type KeeperCostMap = HashMap<PlayerId, Option<i64>>;

/// Draft prices and trade counts for one batch of players in one season
struct PricingContext {
    draft_prices: HashMap<PlayerId, Option<i64>>,
    trade_counts: TradeCountReport,
}

impl PricingContext {
    fn draft_price(&self, player_id: PlayerId) -> Option<i64> {
        self.draft_prices.get(&player_id).copied().flatten()
    }

    fn cost_for(&self, player_id: PlayerId, consecutive_keeps: u32) -> i64 {
        compute_keeper_cost(
            self.draft_price(player_id),
            consecutive_keeps,
            self.trade_counts.count_for(player_id),
        )
    }
}

/// One roster row whose keeper cost was rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperCostUpdate {
    pub roster_id: RosterEntryId,
    pub player_id: PlayerId,
    pub consecutive_keeps: u32,
    pub trade_count: u32,
    pub keeper_cost: i64,
}

/// Outcome of a recalculation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationSummary {
    pub season_id: SeasonId,
    pub updated: Vec<KeeperCostUpdate>,

    /// Requested players with no roster row in the season
    pub missing_players: Vec<PlayerId>,
}

/// Where a quoted keeper price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    /// Stored on last season's roster row
    Stored,
    /// Computed because the stored cost was never set
    Computed,
    /// Not on a roster last season, so not keepable
    Unavailable,
}

/// Price to keep a player into `season_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperPriceQuote {
    pub player_id: PlayerId,
    pub season_id: SeasonId,
    pub previous_season_id: Option<SeasonId>,
    pub keeper_price: Option<i64>,
    pub consecutive_keeps: u32,
    pub last_draft_price: Option<i64>,

    /// Trades folded into a computed price; 0 when the stored price is used
    /// because the stored price already includes them
    pub trade_count: u32,
    pub source: QuoteSource,
}

impl KeeperPriceQuote {
    fn unavailable(player_id: PlayerId, season_id: SeasonId, previous: Option<&Season>) -> Self {
        Self {
            player_id,
            season_id,
            previous_season_id: previous.map(|season| season.id),
            keeper_price: None,
            consecutive_keeps: 0,
            last_draft_price: None,
            trade_count: 0,
            source: QuoteSource::Unavailable,
        }
    }
}

/// A roster row joined with names, draft info and pricing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterView {
    pub roster_id: RosterEntryId,
    pub player_id: PlayerId,
    pub player_name: Option<String>,
    pub position: Option<String>,
    pub manager_id: ManagerId,
    pub manager_name: Option<String>,
    pub team_name: Option<String>,
    pub draft_price: Option<i64>,
    pub is_keeper: bool,
    pub consecutive_keeps: Option<u32>,
    pub trade_count: u32,

    /// Cost stored on the roster row
    pub keeper_cost: Option<i64>,

    /// Cost priced from current data for next season's keep
    pub computed_keeper_cost: i64,

    /// Stored cost as `$N`, or `-` when none is stored
    pub keeper_cost_display: String,
}

/// One player on one side of an accepted in-season trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLedgerRow {
    pub id: String,
    pub trade_id: TradeId,
    pub season_id: SeasonId,
    pub side: TradeSide,
    pub player_id: PlayerId,
    pub player_name: String,
    pub from_manager_id: ManagerId,
    pub to_manager_id: ManagerId,
    pub created_at: DateTime<Utc>,
}

/// Prices keepers against a league store
pub struct KeeperCostService<S: LeagueStore> {
    store: Arc<S>,
    aggregator: TradeCountAggregator,
}

impl<S: LeagueStore> Clone for KeeperCostService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), aggregator: self.aggregator }
    }
}

impl<S: LeagueStore> KeeperCostService<S> {
    pub fn new(store: Arc<S>, self_trade_policy: SelfTradePolicy) -> Self {
        Self { store, aggregator: TradeCountAggregator::new(self_trade_policy) }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) async fn require_season(&self, season_id: SeasonId) -> Result<Season> {
        self.store
            .season(season_id)
            .await?
            .ok_or(LeagueServiceError::SeasonNotFound { season_id })
    }

    pub(crate) async fn require_player(&self, player_id: PlayerId) -> Result<Player> {
        self.store
            .players(&[player_id])
            .await?
            .into_iter()
            .next()
            .ok_or(LeagueServiceError::PlayerNotFound { player_id })
    }

    pub(crate) async fn require_manager(&self, manager_id: ManagerId) -> Result<Manager> {
        self.store
            .managers(&[manager_id])
            .await?
            .into_iter()
            .next()
            .ok_or(LeagueServiceError::ManagerNotFound { manager_id })
    }

    async fn trade_counts(
        &self,
        season_id: SeasonId,
        player_ids: &[PlayerId],
    ) -> Result<TradeCountReport> {
        let trades = self.store.accepted_in_season_trades(season_id).await?;
        let tracked: HashSet<PlayerId> = player_ids.iter().copied().collect();
        let report = self.aggregator.aggregate(&trades, Some(&tracked));

        if report.has_anomalies() {
            warn!(
                season_id,
                malformed_fields = report.malformed_fields,
                rejected_ids = report.rejected_ids,
                self_trades = report.self_trades,
                policy = ?self.aggregator.policy(),
                "Trade data anomalies while counting trades"
            );
        }

        Ok(report)
    }

    async fn pricing_context(
        &self,
        season_id: SeasonId,
        player_ids: &[PlayerId],
    ) -> Result<PricingContext> {
        let draft_prices = self.store.draft_prices(season_id, player_ids).await?;
        let trade_counts = self.trade_counts(season_id, player_ids).await?;
        Ok(PricingContext { draft_prices, trade_counts })
    }

    /// Price a batch of players with explicit consecutive keeps per player.
    ///
    /// Players missing from `keep_years` are priced as fresh additions. Every
    /// requested player gets a cost; a missing draft price counts as 0.
    pub async fn compute_keeper_costs(
        &self,
        player_ids: &[PlayerId],
        season_id: SeasonId,
        keep_years: &HashMap<PlayerId, u32>,
    ) -> Result<HashMap<PlayerId, i64>> {
        if player_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let context = self.pricing_context(season_id, player_ids).await?;
        let costs = player_ids
            .iter()
            .map(|id| {
                let keeps = keep_years.get(id).copied().unwrap_or(0);
                (*id, context.cost_for(*id, keeps))
            })
            .collect();

        debug!("Priced {} players for season {}", player_ids.len(), season_id);
        Ok(costs)
    }

    /// Keeper cost for a player just added to a roster. Store failures propagate.
    pub async fn keeper_cost_for_roster_addition(
        &self,
        player_id: PlayerId,
        season_id: SeasonId,
    ) -> Result<i64> {
        validate_player_id(player_id)?;
        validate_season_id(season_id)?;

        let context = self.pricing_context(season_id, &[player_id]).await?;
        Ok(context.cost_for(player_id, 0))
    }

    /// Best-effort batch pricing for fresh additions.
    ///
    /// On a store failure every requested player maps to `None` so the
    /// surrounding operation can go ahead without keeper costs.
    pub async fn preview_keeper_costs(
        &self,
        player_ids: &[PlayerId],
        season_id: SeasonId,
    ) -> KeeperCostMap {
        match self.compute_keeper_costs(player_ids, season_id, &HashMap::new()).await {
            Ok(costs) => costs.into_iter().map(|(id, cost)| (id, Some(cost))).collect(),
            Err(e) => {
                error!(
                    season_id,
                    players = player_ids.len(),
                    "Keeper cost preview failed, returning empty costs: {}",
                    e
                );
                player_ids.iter().map(|id| (*id, None)).collect()
            }
        }
    }

    /// Reprice roster rows for `player_ids` in a season and store the result.
    ///
    /// Each row is priced for its next keep year. Store failures propagate;
    /// rows written before a failure stay written.
    pub async fn recalculate_keeper_costs(
        &self,
        player_ids: &[PlayerId],
        season_id: SeasonId,
    ) -> Result<RecalculationSummary> {
        let mut summary = RecalculationSummary { season_id, ..Default::default() };
        if player_ids.is_empty() {
            return Ok(summary);
        }

        let rows = self.store.rosters(season_id, &RosterFilter::players(player_ids)).await?;
        let on_roster: HashSet<PlayerId> = rows.iter().map(|row| row.player_id).collect();
        summary.missing_players =
            player_ids.iter().filter(|id| !on_roster.contains(id)).copied().collect();

        if rows.is_empty() {
            warn!(season_id, "No roster rows to recalculate for {:?}", player_ids);
            return Ok(summary);
        }

        let roster_players: Vec<PlayerId> = on_roster.into_iter().collect();
        let context = self.pricing_context(season_id, &roster_players).await?;

        for row in rows {
            let consecutive_keeps = next_keep_year(row.consecutive_keeps);
            let keeper_cost = context.cost_for(row.player_id, consecutive_keeps);
            self.store.set_keeper_cost(row.id, keeper_cost).await?;

            summary.updated.push(KeeperCostUpdate {
                roster_id: row.id,
                player_id: row.player_id,
                consecutive_keeps,
                trade_count: context.trade_counts.count_for(row.player_id),
                keeper_cost,
            });
        }

        info!(
            "Recalculated {} keeper costs in season {} ({} players not rostered)",
            summary.updated.len(),
            season_id,
            summary.missing_players.len()
        );
        Ok(summary)
    }

    /// What it costs to keep a player into `season_id`, based on last season
    pub async fn keeper_price_quote(
        &self,
        player_id: PlayerId,
        season_id: SeasonId,
    ) -> Result<KeeperPriceQuote> {
        validate_player_id(player_id)?;
        validate_season_id(season_id)?;
        self.require_season(season_id).await?;

        let Some(previous) = self.store.previous_season(season_id).await? else {
            return Ok(KeeperPriceQuote::unavailable(player_id, season_id, None));
        };

        let rows = self.store.rosters(previous.id, &RosterFilter::players(&[player_id])).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(KeeperPriceQuote::unavailable(player_id, season_id, Some(&previous)));
        };

        let last_draft_price = self
            .store
            .draft_prices(previous.id, &[player_id])
            .await?
            .get(&player_id)
            .copied()
            .flatten();
        let consecutive_keeps = row.consecutive_keeps.unwrap_or(0);

        let (keeper_price, trade_count, source) = match row.keeper_cost {
            Some(stored) => (stored, 0, QuoteSource::Stored),
            None => {
                let trade_count =
                    self.trade_counts(previous.id, &[player_id]).await?.count_for(player_id);
                let computed = compute_keeper_cost(
                    last_draft_price,
                    next_keep_year(row.consecutive_keeps),
                    trade_count,
                );
                (computed, trade_count, QuoteSource::Computed)
            }
        };

        Ok(KeeperPriceQuote {
            player_id,
            season_id,
            previous_season_id: Some(previous.id),
            keeper_price: Some(keeper_price),
            consecutive_keeps,
            last_draft_price,
            trade_count,
            source,
        })
    }

    /// Roster rows for a season, optionally for one manager
    pub async fn season_rosters(
        &self,
        season_id: SeasonId,
        manager_id: Option<ManagerId>,
    ) -> Result<Vec<RosterView>> {
        validate_season_id(season_id)?;
        self.require_season(season_id).await?;

        let filter = match manager_id {
            Some(id) => RosterFilter::manager(validate_manager_id(id)?),
            None => RosterFilter::all(),
        };
        let rows = self.store.rosters(season_id, &filter).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let player_ids: Vec<PlayerId> = rows.iter().map(|row| row.player_id).collect();
        let mut manager_ids: Vec<ManagerId> = rows.iter().map(|row| row.manager_id).collect();
        manager_ids.sort_unstable();
        manager_ids.dedup();

        let players: HashMap<_, _> = self
            .store
            .players(&player_ids)
            .await?
            .into_iter()
            .map(|player| (player.id, player))
            .collect();
        let managers: HashMap<_, _> = self
            .store
            .managers(&manager_ids)
            .await?
            .into_iter()
            .map(|manager| (manager.id, manager))
            .collect();
        let keeper_flags: HashMap<PlayerId, bool> = self
            .store
            .draft_results(season_id, Some(player_ids.as_slice()))
            .await?
            .into_iter()
            .map(|result| (result.player_id, result.is_keeper))
            .collect();
        let context = self.pricing_context(season_id, &player_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let player = players.get(&row.player_id);
                let manager = managers.get(&row.manager_id);
                let computed_keeper_cost =
                    context.cost_for(row.player_id, next_keep_year(row.consecutive_keeps));

                RosterView {
                    roster_id: row.id,
                    player_id: row.player_id,
                    player_name: player.map(|p| p.name.clone()),
                    position: player.and_then(|p| p.position.clone()),
                    manager_id: row.manager_id,
                    manager_name: manager.map(|m| m.manager_name.clone()),
                    team_name: manager.and_then(|m| m.team_name.clone()),
                    draft_price: context.draft_price(row.player_id),
                    is_keeper: keeper_flags.get(&row.player_id).copied().unwrap_or(false),
                    consecutive_keeps: row.consecutive_keeps,
                    trade_count: context.trade_counts.count_for(row.player_id),
                    keeper_cost: row.keeper_cost,
                    computed_keeper_cost,
                    keeper_cost_display: format_keeper_cost(row.keeper_cost),
                }
            })
            .collect())
    }

    /// Accepted in-season trades for a season, one row per traded player,
    /// newest trade first
    pub async fn trade_ledger(&self, season_id: SeasonId) -> Result<Vec<TradeLedgerRow>> {
        self.require_season(season_id).await?;

        let mut trades = self.store.accepted_in_season_trades(season_id).await?;
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let appearances = trade_appearances(&trades);
        let player_ids: Vec<PlayerId> = appearances.iter().map(|row| row.player_id).collect();
        let names: HashMap<PlayerId, String> = self
            .store
            .players(&player_ids)
            .await?
            .into_iter()
            .map(|player| (player.id, player.name))
            .collect();
        let by_id: HashMap<TradeId, _> = trades.iter().map(|trade| (trade.id, trade)).collect();

        Ok(appearances
            .into_iter()
            .filter_map(|row| {
                let trade = by_id.get(&row.trade_id)?;
                Some(TradeLedgerRow {
                    id: row.key(),
                    trade_id: row.trade_id,
                    season_id: row.season_id,
                    side: row.side,
                    player_id: row.player_id,
                    player_name: names
                        .get(&row.player_id)
                        .cloned()
                        .unwrap_or_else(|| "Unknown Player".to_string()),
                    from_manager_id: trade.origin_manager(row.side),
                    to_manager_id: trade.destination_manager(row.side),
                    created_at: row.created_at,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_store;
    use keeper_cost::{TradeRecord, TradeStatus};
    use league_store::{InMemoryLeagueStore, LeagueSnapshot};

    fn service(store: InMemoryLeagueStore) -> KeeperCostService<InMemoryLeagueStore> {
        KeeperCostService::new(Arc::new(store), SelfTradePolicy::default())
    }

    #[tokio::test]
    async fn test_roster_addition_uses_draft_price_and_trades() {
        let service = service(sample_store());

        // $50 draft, two in-season trades: 50 + 10 + 10
        assert_eq!(service.keeper_cost_for_roster_addition(101, 2).await.unwrap(), 70);
        // Never drafted, never traded
        assert_eq!(service.keeper_cost_for_roster_addition(104, 2).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_roster_addition_rejects_bad_ids() {
        let service = service(sample_store());
        assert!(matches!(
            service.keeper_cost_for_roster_addition(0, 2).await,
            Err(LeagueServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_compute_with_keep_years() {
        let service = service(sample_store());
        let keep_years = HashMap::from([(102, 3)]);

        let costs = service.compute_keeper_costs(&[101, 102, 104], 2, &keep_years).await.unwrap();
        assert_eq!(costs[&101], 70);
        // $20 draft, year 3 escalation $25, one trade
        assert_eq!(costs[&102], 50);
        assert_eq!(costs[&104], 10);
    }

    #[tokio::test]
    async fn test_compute_empty_request() {
        let service = service(sample_store());
        assert!(service.compute_keeper_costs(&[], 2, &HashMap::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_returns_some_for_every_player() {
        let service = service(sample_store());
        let preview = service.preview_keeper_costs(&[101, 104], 2).await;

        assert_eq!(preview.len(), 2);
        assert_eq!(preview[&101], Some(70));
        assert_eq!(preview[&104], Some(10));
    }

    #[tokio::test]
    async fn test_recalculate_persists_next_keep_year() {
        let service = service(sample_store());
        let summary = service.recalculate_keeper_costs(&[101, 102, 999], 2).await.unwrap();

        assert_eq!(summary.updated.len(), 2);
        assert_eq!(summary.missing_players, vec![999]);

        // Player 102 was kept once before: next year is 2 (escalation $15)
        let update = summary.updated.iter().find(|u| u.player_id == 102).unwrap();
        assert_eq!(update.consecutive_keeps, 2);
        assert_eq!(update.keeper_cost, 20 + 15 + 5);

        let rows = service.store().rosters(2, &RosterFilter::players(&[101])).await.unwrap();
        assert_eq!(rows[0].keeper_cost, Some(70));
    }

    #[tokio::test]
    async fn test_quote_uses_stored_cost() {
        let service = service(sample_store());
        let quote = service.keeper_price_quote(103, 3).await.unwrap();

        assert_eq!(quote.previous_season_id, Some(2));
        assert_eq!(quote.source, QuoteSource::Stored);
        assert_eq!(quote.keeper_price, Some(42));
        assert_eq!(quote.trade_count, 0);
    }

    #[tokio::test]
    async fn test_quote_computes_when_unset() {
        let service = service(sample_store());
        let quote = service.keeper_price_quote(101, 3).await.unwrap();

        assert_eq!(quote.source, QuoteSource::Computed);
        assert_eq!(quote.last_draft_price, Some(50));
        assert_eq!(quote.trade_count, 2);
        assert_eq!(quote.keeper_price, Some(70));
    }

    #[tokio::test]
    async fn test_quote_unavailable_without_previous_roster() {
        let service = service(sample_store());

        let quote = service.keeper_price_quote(104, 3).await.unwrap();
        assert_eq!(quote.source, QuoteSource::Unavailable);
        assert_eq!(quote.keeper_price, None);
        assert_eq!(quote.consecutive_keeps, 0);

        // Earliest season has nothing before it
        let quote = service.keeper_price_quote(101, 1).await.unwrap();
        assert_eq!(quote.previous_season_id, None);
        assert_eq!(quote.keeper_price, None);
    }

    #[tokio::test]
    async fn test_quote_unknown_season() {
        let service = service(sample_store());
        assert!(matches!(
            service.keeper_price_quote(101, 77).await,
            Err(LeagueServiceError::SeasonNotFound { season_id: 77 })
        ));
    }

    #[tokio::test]
    async fn test_season_rosters_joins_names_and_costs() {
        let service = service(sample_store());
        let rows = service.season_rosters(2, Some(1)).await.unwrap();

        assert_eq!(rows.len(), 2);
        let brunson = rows.iter().find(|row| row.player_id == 101).unwrap();
        assert_eq!(brunson.player_name.as_deref(), Some("Jalen Brunson"));
        assert_eq!(brunson.manager_name.as_deref(), Some("Haight"));
        assert_eq!(brunson.trade_count, 2);
        assert_eq!(brunson.computed_keeper_cost, 70);
        assert_eq!(brunson.keeper_cost, None);
        assert_eq!(brunson.keeper_cost_display, "-");

        let haliburton = rows.iter().find(|row| row.player_id == 103).unwrap();
        assert_eq!(haliburton.keeper_cost_display, "$42");
    }

    #[tokio::test]
    async fn test_season_rosters_empty_season() {
        let service = service(sample_store());
        assert!(service.season_rosters(3, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trade_ledger_rows() {
        let service = service(sample_store());
        let rows = service.trade_ledger(2).await.unwrap();

        // Pending and offseason trades are left out
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.trade_id == 10 || row.trade_id == 11));
        let row = rows.iter().find(|row| row.id == "10-proposer-101").unwrap();
        assert_eq!(row.player_name, "Jalen Brunson");
        assert_eq!(row.from_manager_id, 1);
        assert_eq!(row.to_manager_id, 2);
    }

    #[tokio::test]
    async fn test_self_trade_policy_changes_counts() {
        let mut snapshot: LeagueSnapshot = sample_store().snapshot().await;
        snapshot.trades.push(
            TradeRecord::new(30, 2, 1, 2)
                .with_players(&[104], &[104])
                .with_status(TradeStatus::Accepted),
        );

        let each_list = KeeperCostService::new(
            Arc::new(InMemoryLeagueStore::from_snapshot(snapshot.clone()).unwrap()),
            SelfTradePolicy::CountEachList,
        );
        let once = KeeperCostService::new(
            Arc::new(InMemoryLeagueStore::from_snapshot(snapshot).unwrap()),
            SelfTradePolicy::CountOncePerTrade,
        );

        assert_eq!(each_list.keeper_cost_for_roster_addition(104, 2).await.unwrap(), 20);
        assert_eq!(once.keeper_cost_for_roster_addition(104, 2).await.unwrap(), 15);
    }
}
