use core_types::Regime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// ADX at or above this level is considered a trending market.
pub const ADX_TREND_THRESHOLD: Decimal = dec!(25);
/// ADX at or below this level, combined with a narrow Bollinger width,
/// classifies the market as range-bound.
pub const ADX_RANGE_MAX: Decimal = dec!(20);
/// Bollinger band width (as a percent of the middle band) below this is
/// considered "narrow" (supports a range classification).
pub const BB_NARROW_WIDTH_PCT: Decimal = dec!(3);
/// Bollinger band width above this is considered "wide" (supports a
/// volatile classification regardless of ADX).
pub const BB_WIDE_WIDTH_PCT: Decimal = dec!(6);

/// Classifies the current regime from ADX and Bollinger band width. Returns
/// the regime plus a short human-readable reason for diagnostics.
pub fn classify(adx: Decimal, bb_width_pct: Decimal) -> (Regime, String) {
    if adx >= ADX_TREND_THRESHOLD {
        return (Regime::Trend, format!("adx {adx} >= {ADX_TREND_THRESHOLD}"));
    }
    if bb_width_pct >= BB_WIDE_WIDTH_PCT {
        return (
            Regime::Volatile,
            format!("bb_width {bb_width_pct}% >= {BB_WIDE_WIDTH_PCT}%"),
        );
    }
    if adx <= ADX_RANGE_MAX && bb_width_pct <= BB_NARROW_WIDTH_PCT {
        return (
            Regime::Range,
            format!("adx {adx} <= {ADX_RANGE_MAX} and bb_width {bb_width_pct}% <= {BB_NARROW_WIDTH_PCT}%"),
        );
    }
    (Regime::Unknown, "no regime threshold satisfied".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_adx_is_trend() {
        let (regime, _) = classify(dec!(30), dec!(4));
        assert_eq!(regime, Regime::Trend);
    }

    #[test]
    fn narrow_bands_low_adx_is_range() {
        let (regime, _) = classify(dec!(15), dec!(2));
        assert_eq!(regime, Regime::Range);
    }

    #[test]
    fn wide_bands_is_volatile_even_with_low_adx() {
        let (regime, _) = classify(dec!(10), dec!(7));
        assert_eq!(regime, Regime::Volatile);
    }

    #[test]
    fn ambiguous_middle_ground_is_unknown() {
        let (regime, _) = classify(dec!(22), dec!(4.5));
        assert_eq!(regime, Regime::Unknown);
    }
}
