use rust_decimal::{Decimal, RoundingStrategy};

/// Quantizes a monetary value to 2 fractional digits using round-half-up.
///
/// Applied only where a value becomes ledger-facing; intermediate ratios and
/// products keep full precision.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
