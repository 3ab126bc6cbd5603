//! REST API endpoints for keeper pricing, rosters and trades

use crate::draft::{DraftBoard, PlayerLookup};
use crate::error::LeagueServiceError;
use crate::keeper::KeeperCostService;
use crate::trades::TradeDesk;
use keeper_cost::validation::{
    parse_id_param, validate_consecutive_keeps, validate_draft_price, validate_player_id,
    validate_season_id,
};
use keeper_cost::{format_keeper_cost, KeeperCostInput, KeeperInputError, PlayerId, SeasonId};
use league_store::{LeagueStore, NewDraftPick, NewTrade};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter;

type QueryParams = HashMap<String, String>;

/// Error rejection carrying the HTTP status and JSON body
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl warp::reject::Reject for ApiError {}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(code: &str, message: String) -> Self {
        Self {
            error: ErrorDetail { code: code.to_string(), message, details: None },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl From<LeagueServiceError> for ApiError {
    fn from(e: LeagueServiceError) -> Self {
        let (status, code) = match &e {
            e if e.is_not_found() => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            e if e.is_conflict() => (StatusCode::CONFLICT, "CONFLICT"),
            LeagueServiceError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            LeagueServiceError::InvalidTradeState { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_TRADE_STATE")
            }
            LeagueServiceError::NoActiveSeason => (StatusCode::BAD_REQUEST, "NO_ACTIVE_SEASON"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", e);
        }

        Self { status, body: ErrorResponse::new(code, e.to_string()) }
    }
}

impl From<KeeperInputError> for ApiError {
    fn from(e: KeeperInputError) -> Self {
        LeagueServiceError::from(e).into()
    }
}

fn reject(e: impl Into<ApiError>) -> warp::Rejection {
    warp::reject::custom(e.into())
}

fn id_param(params: &QueryParams, field: &str) -> Result<i64, KeeperInputError> {
    parse_id_param(field, params.get(field).map(String::as_str))
}

/// Body for batch pricing endpoints
#[derive(Debug, Deserialize)]
pub struct KeeperBatchRequest {
    pub season_id: SeasonId,
    pub player_ids: Vec<PlayerId>,
}

impl KeeperBatchRequest {
    fn validate(&self) -> Result<(), KeeperInputError> {
        validate_season_id(self.season_id)?;
        for id in &self.player_ids {
            validate_player_id(*id)?;
        }
        Ok(())
    }
}

/// Calculator response
#[derive(Debug, Serialize, Deserialize)]
pub struct KeeperCostResponse {
    pub draft_price: Option<i64>,
    pub consecutive_keeps: u32,
    pub trade_count: u32,
    pub keeper_cost: i64,
    pub display: String,
}

/// Price a keeper from explicit inputs
pub fn calculate_keeper_cost(params: &QueryParams) -> Result<KeeperCostResponse, KeeperInputError> {
    let draft_price = match params.get("draft_price") {
        Some(raw) => Some(validate_draft_price(parse_number("draft_price", raw)?)?),
        None => None,
    };
    let consecutive_keeps = match params.get("consecutive_keeps") {
        Some(raw) => validate_consecutive_keeps(parse_number("consecutive_keeps", raw)?)?,
        None => 0,
    };
    let trade_count = match params.get("trade_count") {
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| KeeperInputError::InvalidParameter {
            field: "trade_count".to_string(),
            value: raw.clone(),
        })?,
        None => 0,
    };

    let keeper_cost =
        KeeperCostInput::new(draft_price).with_keeps(consecutive_keeps).with_trades(trade_count).cost();
    Ok(KeeperCostResponse {
        draft_price,
        consecutive_keeps,
        trade_count,
        keeper_cost,
        display: format_keeper_cost(Some(keeper_cost)),
    })
}

fn parse_number(field: &str, raw: &str) -> Result<i64, KeeperInputError> {
    raw.trim().parse().map_err(|_| KeeperInputError::InvalidParameter {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Get the price to keep a player into a season
pub async fn get_keeper_price<S: LeagueStore>(
    params: QueryParams,
    keeper: Arc<KeeperCostService<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let player_id = id_param(&params, "player_id").map_err(reject)?;
    let season_id = id_param(&params, "season_id").map_err(reject)?;

    let quote = keeper.keeper_price_quote(player_id, season_id).await.map_err(reject)?;
    Ok(warp::reply::json(&quote))
}

/// Best-effort keeper costs for players being added to rosters
pub async fn preview_keeper_costs<S: LeagueStore>(
    request: KeeperBatchRequest,
    keeper: Arc<KeeperCostService<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    request.validate().map_err(reject)?;

    let costs = keeper.preview_keeper_costs(&request.player_ids, request.season_id).await;
    Ok(warp::reply::json(&costs))
}

/// Recompute and store keeper costs for rostered players
pub async fn recalculate_keeper_costs<S: LeagueStore>(
    request: KeeperBatchRequest,
    keeper: Arc<KeeperCostService<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    request.validate().map_err(reject)?;

    let summary = keeper
        .recalculate_keeper_costs(&request.player_ids, request.season_id)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&summary))
}

/// Get a season's rosters, optionally for one manager
pub async fn get_rosters<S: LeagueStore>(
    params: QueryParams,
    keeper: Arc<KeeperCostService<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let season_id = id_param(&params, "season_id").map_err(reject)?;
    let manager_id = match params.get("manager_id") {
        Some(_) => Some(id_param(&params, "manager_id").map_err(reject)?),
        None => None,
    };

    let rosters = keeper.season_rosters(season_id, manager_id).await.map_err(reject)?;
    Ok(warp::reply::json(&rosters))
}

/// Get the per-player trade ledger for a season
pub async fn get_trade_ledger<S: LeagueStore>(
    params: QueryParams,
    keeper: Arc<KeeperCostService<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let season_id = id_param(&params, "season_id").map_err(reject)?;

    let rows = keeper.trade_ledger(season_id).await.map_err(reject)?;
    Ok(warp::reply::json(&rows))
}

/// Accept a pending trade
pub async fn accept_trade<S: LeagueStore>(
    raw_id: String,
    desk: Arc<TradeDesk<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let trade_id = parse_id_param("trade_id", Some(raw_id.as_str())).map_err(reject)?;

    let outcome = desk.accept_trade(trade_id).await.map_err(reject)?;
    Ok(warp::reply::json(&outcome))
}

/// Revert an accepted trade back to pending
pub async fn revert_trade<S: LeagueStore>(
    raw_id: String,
    desk: Arc<TradeDesk<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let trade_id = parse_id_param("trade_id", Some(raw_id.as_str())).map_err(reject)?;

    let outcome = desk.revert_trade(trade_id).await.map_err(reject)?;
    Ok(warp::reply::json(&outcome))
}

/// List a season's pending and accepted trades
pub async fn get_trades<S: LeagueStore>(
    params: QueryParams,
    desk: Arc<TradeDesk<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let season_id = id_param(&params, "season_id").map_err(reject)?;

    let trades = desk.season_trades(season_id).await.map_err(reject)?;
    Ok(warp::reply::json(&trades))
}

/// Propose a trade
pub async fn propose_trade<S: LeagueStore>(
    proposal: NewTrade,
    desk: Arc<TradeDesk<S>>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let trade = desk.propose_trade(&proposal).await.map_err(reject)?;
    Ok(warp::reply::with_status(warp::reply::json(&trade), StatusCode::CREATED))
}

/// List a season's draft picks
pub async fn get_draft_picks<S: LeagueStore>(
    params: QueryParams,
    board: Arc<DraftBoard<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let season_id = id_param(&params, "season_id").map_err(reject)?;

    let picks = board.season_picks(season_id).await.map_err(reject)?;
    Ok(warp::reply::json(&picks))
}

/// Record a live draft pick
pub async fn record_draft_pick<S: LeagueStore>(
    pick: NewDraftPick,
    board: Arc<DraftBoard<S>>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let entry = board.record_pick(&pick).await.map_err(reject)?;
    Ok(warp::reply::with_status(warp::reply::json(&entry), StatusCode::CREATED))
}

/// Draft results, for one season or all of them
pub async fn get_draft_results<S: LeagueStore>(
    params: QueryParams,
    board: Arc<DraftBoard<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let season_id = match params.get("season_id") {
        Some(_) => Some(id_param(&params, "season_id").map_err(reject)?),
        None => None,
    };

    let results = board.draft_results(season_id).await.map_err(reject)?;
    Ok(warp::reply::json(&results))
}

fn player_lookup(params: &QueryParams) -> Result<PlayerLookup, KeeperInputError> {
    if params.contains_key("player_id") {
        return id_param(params, "player_id").map(PlayerLookup::Id);
    }
    match params.get("player_name").map(|name| name.trim()) {
        Some(name) if !name.is_empty() => Ok(PlayerLookup::Name(name.to_string())),
        _ => Err(KeeperInputError::MissingParameter("player_id or player_name".to_string())),
    }
}

/// Draft history for one player, by id or name
pub async fn get_player_history<S: LeagueStore>(
    params: QueryParams,
    board: Arc<DraftBoard<S>>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let lookup = player_lookup(&params).map_err(reject)?;

    let history = board.player_history(&lookup).await.map_err(reject)?;
    Ok(warp::reply::json(&history))
}

/// Turn rejections into JSON error bodies
pub async fn handle_rejection(err: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, body) = if let Some(api_error) = err.find::<ApiError>() {
        (api_error.status, api_error.body.clone())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", "No such endpoint".to_string()))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, ErrorResponse::new("INVALID_BODY", e.to_string()))
    } else if let Some(e) = err.find::<warp::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, ErrorResponse::new("CORS_FORBIDDEN", e.to_string()))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorResponse::new("METHOD_NOT_ALLOWED", "Method not allowed".to_string()),
        )
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("INTERNAL_ERROR", "Internal server error".to_string()),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

/// Create all REST API routes
pub fn create_routes<S: LeagueStore + 'static>(
    keeper: Arc<KeeperCostService<S>>,
    desk: Arc<TradeDesk<S>>,
    board: Arc<DraftBoard<S>>,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let keeper_filter = warp::any().map(move || keeper.clone());
    let desk_filter = warp::any().map(move || desk.clone());
    let board_filter = warp::any().map(move || board.clone());

    // Keeper price quote endpoint
    let keeper_price = warp::path("api")
        .and(warp::path("keeper-price"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(keeper_filter.clone())
        .and_then(get_keeper_price::<S>);

    // Calculator endpoint
    let calculate = warp::path("api")
        .and(warp::path("keeper-costs"))
        .and(warp::path("calculate"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and_then(|params: QueryParams| async move {
            calculate_keeper_cost(&params).map(|response| warp::reply::json(&response)).map_err(reject)
        });

    // Batch preview endpoint
    let preview = warp::path("api")
        .and(warp::path("keeper-costs"))
        .and(warp::path("preview"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(keeper_filter.clone())
        .and_then(preview_keeper_costs::<S>);

    // Recalculation endpoint
    let recalculate = warp::path("api")
        .and(warp::path("keeper-costs"))
        .and(warp::path("recalculate"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(keeper_filter.clone())
        .and_then(recalculate_keeper_costs::<S>);

    // Rosters endpoint
    let rosters = warp::path("api")
        .and(warp::path("rosters"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(keeper_filter.clone())
        .and_then(get_rosters::<S>);

    // Trade ledger endpoint
    let ledger = warp::path("api")
        .and(warp::path("trades"))
        .and(warp::path("ledger"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(keeper_filter.clone())
        .and_then(get_trade_ledger::<S>);

    // Trade proposal endpoints
    let list_trades = warp::path("api")
        .and(warp::path("trades"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(desk_filter.clone())
        .and_then(get_trades::<S>);

    let create_trade = warp::path("api")
        .and(warp::path("trades"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(desk_filter.clone())
        .and_then(propose_trade::<S>);

    // Draft endpoints
    let list_picks = warp::path("api")
        .and(warp::path("draft-picks"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(board_filter.clone())
        .and_then(get_draft_picks::<S>);

    let create_pick = warp::path("api")
        .and(warp::path("draft-picks"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(board_filter.clone())
        .and_then(record_draft_pick::<S>);

    let draft_results = warp::path("api")
        .and(warp::path("draft-results"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(board_filter.clone())
        .and_then(get_draft_results::<S>);

    let player_history = warp::path("api")
        .and(warp::path("player-history"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(board_filter.clone())
        .and_then(get_player_history::<S>);

    // Trade state endpoints
    let accept = warp::path("api")
        .and(warp::path("trades"))
        .and(warp::path::param::<String>())
        .and(warp::path("accept"))
        .and(warp::path::end())
        .and(warp::post())
        .and(desk_filter.clone())
        .and_then(accept_trade::<S>);

    let revert = warp::path("api")
        .and(warp::path("trades"))
        .and(warp::path::param::<String>())
        .and(warp::path("revert"))
        .and(warp::path::end())
        .and(warp::post())
        .and(desk_filter.clone())
        .and_then(revert_trade::<S>);

    // Health check endpoint
    let health = warp::path("health").and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    });

    // Combine all routes
    keeper_price
        .or(calculate)
        .or(preview)
        .or(recalculate)
        .or(rosters)
        .or(ledger)
        .or(list_trades)
        .or(create_trade)
        .or(accept)
        .or(revert)
        .or(list_picks)
        .or(create_pick)
        .or(draft_results)
        .or(player_history)
        .or(health)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_headers(vec!["content-type"])
                .allow_methods(vec!["GET", "POST", "OPTIONS"]),
        )
        .recover(handle_rejection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_calculate_defaults() {
        let response = calculate_keeper_cost(&params(&[])).unwrap();
        assert_eq!(response.keeper_cost, 10);
        assert_eq!(response.display, "$10");
    }

    #[test]
    fn test_calculate_worked_example() {
        let response = calculate_keeper_cost(&params(&[
            ("draft_price", "50"),
            ("consecutive_keeps", "3"),
            ("trade_count", "2"),
        ]))
        .unwrap();
        assert_eq!(response.keeper_cost, 85);
    }

    #[test]
    fn test_calculate_rejects_out_of_range_inputs() {
        assert!(matches!(
            calculate_keeper_cost(&params(&[("consecutive_keeps", "11")])),
            Err(KeeperInputError::InvalidConsecutiveKeeps { value: 11, .. })
        ));
        assert!(calculate_keeper_cost(&params(&[("draft_price", "-5")])).is_err());
        assert!(calculate_keeper_cost(&params(&[("trade_count", "-1")])).is_err());
        assert!(calculate_keeper_cost(&params(&[("draft_price", "lots")])).is_err());
    }

    #[test]
    fn test_error_status_mapping() {
        let not_found: ApiError = LeagueServiceError::TradeNotFound { trade_id: 4 }.into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let bad: ApiError = KeeperInputError::MissingParameter("season_id".to_string()).into();
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.body.error.code, "INVALID_INPUT");

        let failed: ApiError =
            LeagueServiceError::Store(league_store::StoreError::Unavailable("down".into())).into();
        assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);

        let drafted: ApiError =
            LeagueServiceError::AlreadyDrafted { player_id: 3, season_id: 19 }.into();
        assert_eq!(drafted.status, StatusCode::CONFLICT);
        let raced: ApiError =
            LeagueServiceError::Store(league_store::StoreError::Conflict { entity: "trade", id: 5 })
                .into();
        assert_eq!(raced.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_player_lookup_params() {
        assert_eq!(player_lookup(&params(&[("player_id", "7")])), Ok(PlayerLookup::Id(7)));
        assert_eq!(
            player_lookup(&params(&[("player_name", " jokic ")])),
            Ok(PlayerLookup::Name("jokic".to_string()))
        );
        assert!(player_lookup(&params(&[("player_name", "  ")])).is_err());
        assert!(player_lookup(&params(&[("player_id", "x"), ("player_name", "jokic")])).is_err());
    }
}
