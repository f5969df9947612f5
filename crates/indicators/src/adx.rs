use core_types::Candle;
use rust_decimal::Decimal;

use crate::error::IndicatorError;

struct DirectionalMovement {
    plus_dm: Decimal,
    minus_dm: Decimal,
    tr: Decimal,
}

fn directional_movement(prev: &Candle, cur: &Candle) -> DirectionalMovement {
    let up_move = cur.high - prev.high;
    let down_move = prev.low - cur.low;

    let plus_dm = if up_move > down_move && up_move > Decimal::ZERO {
        up_move
    } else {
        Decimal::ZERO
    };
    let minus_dm = if down_move > up_move && down_move > Decimal::ZERO {
        down_move
    } else {
        Decimal::ZERO
    };

    let hl = cur.high - cur.low;
    let hc = (cur.high - prev.close).abs();
    let lc = (cur.low - prev.close).abs();
    let tr = hl.max(hc).max(lc);

    DirectionalMovement { plus_dm, minus_dm, tr }
}

/// ADX(period) using Wilder smoothing of +DM/-DM/TR, per the standard
/// Wilder construction: `DX = |+DI - -DI| / (+DI + -DI) * 100`, `ADX` is the
/// Wilder-smoothed average of `DX`.
pub fn adx_wilder(candles: &[Candle], period: usize) -> Result<Decimal, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(period));
    }
    // Need `period` DM/TR samples to seed, then `period` more DX samples to
    // seed the ADX average itself.
    if candles.len() < period * 2 + 1 {
        return Err(IndicatorError::InsufficientData {
            needed: period * 2 + 1,
            got: candles.len(),
        });
    }

    let moves: Vec<DirectionalMovement> = candles
        .windows(2)
        .map(|w| directional_movement(&w[0], &w[1]))
        .collect();

    let mut smoothed_plus_dm = moves[..period].iter().map(|m| m.plus_dm).sum::<Decimal>();
    let mut smoothed_minus_dm = moves[..period].iter().map(|m| m.minus_dm).sum::<Decimal>();
    let mut smoothed_tr = moves[..period].iter().map(|m| m.tr).sum::<Decimal>();

    let mut dx_values = Vec::with_capacity(moves.len() - period + 1);
    dx_values.push(dx_from_smoothed(smoothed_plus_dm, smoothed_minus_dm, smoothed_tr));

    for m in &moves[period..] {
        smoothed_plus_dm = smoothed_plus_dm - (smoothed_plus_dm / Decimal::from(period)) + m.plus_dm;
        smoothed_minus_dm = smoothed_minus_dm - (smoothed_minus_dm / Decimal::from(period)) + m.minus_dm;
        smoothed_tr = smoothed_tr - (smoothed_tr / Decimal::from(period)) + m.tr;
        dx_values.push(dx_from_smoothed(smoothed_plus_dm, smoothed_minus_dm, smoothed_tr));
    }

    let mut adx = dx_values[..period].iter().sum::<Decimal>() / Decimal::from(period);
    for dx in &dx_values[period..] {
        adx = (adx * Decimal::from(period - 1) + dx) / Decimal::from(period);
    }
    Ok(adx)
}

fn dx_from_smoothed(plus_dm: Decimal, minus_dm: Decimal, tr: Decimal) -> Decimal {
    if tr.is_zero() {
        return Decimal::ZERO;
    }
    let plus_di = plus_dm / tr * Decimal::from(100);
    let minus_di = minus_dm / tr * Decimal::from(100);
    let sum = plus_di + minus_di;
    if sum.is_zero() {
        return Decimal::ZERO;
    }
    (plus_di - minus_di).abs() / sum * Decimal::from(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::Interval;
    use rust_decimal_macros::dec;

    fn candle(high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle {
            open_ts: Utc::now(),
            interval: Interval::OneHour,
            open: close,
            high,
            low,
            close,
            volume: dec!(1),
            is_closed: true,
        }
    }

    #[test]
    fn flat_market_has_low_adx() {
        let candles: Vec<Candle> = (0..40).map(|_| candle(dec!(100), dec!(99), dec!(99.5))).collect();
        let adx = adx_wilder(&candles, 14).unwrap();
        assert_eq!(adx, Decimal::ZERO);
    }

    #[test]
    fn steadily_trending_market_has_high_adx() {
        let candles: Vec<Candle> = (0..40)
            .map(|i| {
                let base = Decimal::from(100 + i);
                candle(base + dec!(1), base - dec!(1), base)
            })
            .collect();
        let adx = adx_wilder(&candles, 14).unwrap();
        assert!(adx > dec!(30));
    }
}
