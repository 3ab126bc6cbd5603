//! Consecutive-keep escalation schedule

/// Highest escalation year with its own entry; later years reuse it.
pub const MAX_ESCALATION_YEAR: u32 = 10;

/// Dollar increment added to a keeper's price, indexed by consecutive keeps.
///
/// Index 0 is the first time a player is kept.
pub const ESCALATION_TABLE: [i64; MAX_ESCALATION_YEAR as usize + 1] =
    [10, 15, 15, 25, 30, 35, 40, 45, 50, 55, 60];

/// Escalation increment for a number of consecutive keeps, capped at year 10.
pub fn escalation_for(consecutive_keeps: u32) -> i64 {
    ESCALATION_TABLE[consecutive_keeps.min(MAX_ESCALATION_YEAR) as usize]
}
