use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Base currency used when no setting has been stored yet
pub const DEFAULT_BASE_CURRENCY: &str = "CNY";

/// Decimal precision for persisted monetary and NAV values
pub const DECIMAL_PRECISION: u32 = 10;

/// Timeout applied to a single quote lookup
pub const DEFAULT_QUOTE_TIMEOUT_SECS: u64 = 8;

/// Horizon of the upcoming auto-invest outflow projection
pub const DEFAULT_PROJECTION_DAYS: u32 = 30;

/// Starting unit NAV of every fund series
pub const INITIAL_UNIT_NAV: Decimal = dec!(1);

/// Below this share count the unit holding cost falls back to the initial NAV
pub const MIN_SHARES_FOR_UNIT_COST: Decimal = dec!(0.001);

/// A NAV at or above `peak * NEW_HIGH_TOLERANCE` counts as back at the peak
pub const NEW_HIGH_TOLERANCE: Decimal = dec!(0.9999);

/// Share of the portfolio that can be withdrawn each year without depleting it
pub const SAFE_WITHDRAWAL_RATE: Decimal = dec!(0.04);

/// Number of years covered by a FIRE projection
pub const DEFAULT_FIRE_PROJECTION_YEARS: u32 = 40;

/// Rebalance differences at or below this amount are not worth a trade
pub const REBALANCE_MIN_TRADE: Decimal = dec!(100);

/// Allowed distance of the summed target percentages from 100
pub const REBALANCE_TARGET_TOLERANCE: Decimal = dec!(0.01);

/// Settings keys
pub mod setting_keys {
    pub const BASE_CURRENCY: &str = "base_currency";
    pub const QUOTE_TIMEOUT_SECS: &str = "quote_timeout_secs";
}
