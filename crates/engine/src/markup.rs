use core_types::MarkupSample;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Samples below this count fall back to a fixed estimate instead of trusting
/// the EMA, since three or fewer fills are too noisy to correct sizing on.
pub const MIN_SAMPLES: u32 = 3;

const EMA_ALPHA: Decimal = dec!(0.3);
const FLOOR_PCT: Decimal = dec!(0.10);
const CAP_PCT: Decimal = dec!(5.00);

/// Folds one observed (`executedPrice`, `referenceMid`) pair into the
/// per-pair EMA, clamping the observed cost to `[0, cap]` before blending it
/// in and clamping the output to `[floor, cap]`.
pub fn update(sample: &mut MarkupSample, executed_price: Decimal, reference_mid: Decimal) {
    if reference_mid.is_zero() {
        return;
    }
    let observed_pct = ((executed_price - reference_mid) / reference_mid * dec!(100))
        .max(Decimal::ZERO)
        .min(CAP_PCT);

    sample.ema_pct = if sample.sample_count == 0 {
        observed_pct
    } else {
        EMA_ALPHA * observed_pct + (Decimal::ONE - EMA_ALPHA) * sample.ema_pct
    };
    sample.sample_count += 1;
    sample.ema_pct = sample.ema_pct.max(FLOOR_PCT).min(CAP_PCT);
}

/// The markup percentage to subtract when computing `effectivePrice` for
/// sizing. Below `MIN_SAMPLES`, a fixed fallback is used rather than trusting
/// the still-forming EMA.
pub fn estimate(sample: Option<&MarkupSample>, fallback_pct: Decimal) -> Decimal {
    match sample {
        Some(s) if s.sample_count >= MIN_SAMPLES => s.ema_pct,
        _ => fallback_pct.max(FLOOR_PCT).min(CAP_PCT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_min_samples_uses_fallback() {
        let sample = MarkupSample::seed("BTC/USD", dec!(0.2));
        assert_eq!(estimate(Some(&sample), dec!(0.2)), dec!(0.2));
    }

    #[test]
    fn first_sample_seeds_the_ema_directly() {
        let mut sample = MarkupSample::seed("BTC/USD", dec!(0.2));
        update(&mut sample, dec!(50050), dec!(50000));
        assert_eq!(sample.sample_count, 1);
        // (50050-50000)/50000*100 = 0.10%, at the floor already.
        assert_eq!(sample.ema_pct, FLOOR_PCT);
    }

    #[test]
    fn ema_blends_subsequent_samples() {
        let mut sample = MarkupSample::seed("BTC/USD", dec!(0.2));
        update(&mut sample, dec!(50100), dec!(50000)); // 0.20%
        update(&mut sample, dec!(50200), dec!(50000)); // 0.40%
        // 0.3*0.40 + 0.7*0.20 = 0.26
        assert_eq!(sample.ema_pct, dec!(0.260));
    }

    #[test]
    fn negative_spread_clamps_to_zero_before_blending() {
        let mut sample = MarkupSample::seed("BTC/USD", dec!(0.2));
        update(&mut sample, dec!(49900), dec!(50000));
        assert_eq!(sample.ema_pct, FLOOR_PCT);
    }

    #[test]
    fn estimate_trusts_ema_once_min_samples_reached() {
        let mut sample = MarkupSample::seed("BTC/USD", dec!(0.2));
        for _ in 0..MIN_SAMPLES {
            update(&mut sample, dec!(51000), dec!(50000));
        }
        let estimated = estimate(Some(&sample), dec!(0.2));
        assert_eq!(estimated, sample.ema_pct);
        assert!(estimated > dec!(1));
    }

    #[test]
    fn output_never_exceeds_cap() {
        let mut sample = MarkupSample::seed("BTC/USD", dec!(0.2));
        for _ in 0..10 {
            update(&mut sample, dec!(60000), dec!(50000));
        }
        assert_eq!(sample.ema_pct, CAP_PCT);
    }
}
