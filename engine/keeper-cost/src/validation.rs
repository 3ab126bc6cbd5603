//! Input rules applied by callers before pricing a keeper

use crate::error::KeeperInputError;
use crate::escalation::MAX_ESCALATION_YEAR;
use crate::trade::{ManagerId, PlayerId, SeasonId};
use crate::Result;

pub const MIN_DRAFT_PRICE: i64 = 1;
pub const MAX_DRAFT_PRICE: i64 = 1000;

pub fn validate_season_id(season_id: SeasonId) -> Result<SeasonId> {
    if season_id > 0 {
        Ok(season_id)
    } else {
        Err(KeeperInputError::InvalidSeasonId(season_id))
    }
}

pub fn validate_player_id(player_id: PlayerId) -> Result<PlayerId> {
    if player_id > 0 {
        Ok(player_id)
    } else {
        Err(KeeperInputError::InvalidPlayerId(player_id))
    }
}

pub fn validate_manager_id(manager_id: ManagerId) -> Result<ManagerId> {
    if manager_id > 0 {
        Ok(manager_id)
    } else {
        Err(KeeperInputError::InvalidManagerId(manager_id))
    }
}

pub fn validate_draft_price(price: i64) -> Result<i64> {
    if (MIN_DRAFT_PRICE..=MAX_DRAFT_PRICE).contains(&price) {
        Ok(price)
    } else {
        Err(KeeperInputError::InvalidDraftPrice {
            price,
            min: MIN_DRAFT_PRICE,
            max: MAX_DRAFT_PRICE,
        })
    }
}

/// Cash sweeteners on a trade cannot be negative
pub fn validate_trade_cash(field: &str, amount: i64) -> Result<i64> {
    if amount >= 0 {
        Ok(amount)
    } else {
        Err(KeeperInputError::InvalidParameter {
            field: field.to_string(),
            value: amount.to_string(),
        })
    }
}

/// Both managers of a trade must be valid and different
pub fn validate_trade_managers(proposer: ManagerId, receiver: ManagerId) -> Result<()> {
    validate_manager_id(proposer)?;
    validate_manager_id(receiver)?;
    if proposer == receiver {
        return Err(KeeperInputError::SameManagerTrade(proposer));
    }
    Ok(())
}

/// Accepts 0..=10 and narrows to the calculator's input type
pub fn validate_consecutive_keeps(value: i64) -> Result<u32> {
    match u32::try_from(value) {
        Ok(keeps) if keeps <= MAX_ESCALATION_YEAR => Ok(keeps),
        _ => Err(KeeperInputError::InvalidConsecutiveKeeps { value, max: MAX_ESCALATION_YEAR }),
    }
}

/// Parse a positive integer id from a query/path parameter
pub fn parse_id_param(field: &str, raw: Option<&str>) -> Result<i64> {
    let raw = raw.ok_or_else(|| KeeperInputError::MissingParameter(field.to_string()))?;
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(KeeperInputError::InvalidParameter {
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_must_be_positive() {
        assert_eq!(validate_season_id(19), Ok(19));
        assert_eq!(validate_season_id(0), Err(KeeperInputError::InvalidSeasonId(0)));
        assert!(validate_player_id(-4).is_err());
        assert!(validate_manager_id(3).is_ok());
    }

    #[test]
    fn test_draft_price_bounds() {
        assert!(validate_draft_price(1).is_ok());
        assert!(validate_draft_price(1000).is_ok());
        assert!(validate_draft_price(0).is_err());
        assert!(validate_draft_price(1001).is_err());
        assert!(validate_draft_price(-1).is_err());
    }

    #[test]
    fn test_trade_inputs() {
        assert_eq!(validate_trade_cash("proposer_cash", 0), Ok(0));
        assert!(validate_trade_cash("receiver_cash", -3).is_err());
        assert!(validate_trade_managers(1, 2).is_ok());
        assert_eq!(validate_trade_managers(4, 4), Err(KeeperInputError::SameManagerTrade(4)));
        assert!(validate_trade_managers(0, 2).is_err());
    }

    #[test]
    fn test_consecutive_keeps_bounds() {
        assert_eq!(validate_consecutive_keeps(0), Ok(0));
        assert_eq!(validate_consecutive_keeps(10), Ok(10));
        assert!(validate_consecutive_keeps(11).is_err());
        assert!(validate_consecutive_keeps(-1).is_err());
    }

    #[test]
    fn test_parse_id_param() {
        assert_eq!(parse_id_param("player_id", Some("42")), Ok(42));
        assert_eq!(
            parse_id_param("player_id", None),
            Err(KeeperInputError::MissingParameter("player_id".to_string()))
        );
        assert!(parse_id_param("season_id", Some("0")).is_err());
        assert!(parse_id_param("season_id", Some("nineteen")).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = validate_consecutive_keeps(12).unwrap_err();
        assert_eq!(err.to_string(), "Consecutive keeps must be between 0 and 10, got 12");
    }
}
