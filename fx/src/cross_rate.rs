//! Cross-rate derivation from anchor snapshots.

use fxquote_common::{AnchorSnapshot, CurrencyCode};

use crate::error::{FxError, FxResult};

/// Derive the `from -> to` rate from a table quoted against one anchor.
///
/// `rates[to] / rates[from]`, with the anchor's own factor fixed at 1. Plain
/// IEEE division; no rounding.
pub fn cross_rate(snapshot: &AnchorSnapshot, from: &CurrencyCode, to: &CurrencyCode) -> FxResult<f64> {
    let from_factor = factor(snapshot, from)?;
    let to_factor = factor(snapshot, to)?;

    let rate = to_factor / from_factor;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(FxError::InvalidRate {
            from: from.clone(),
            to: to.clone(),
            rate,
        });
    }

    Ok(rate)
}

fn factor(snapshot: &AnchorSnapshot, code: &CurrencyCode) -> FxResult<f64> {
    snapshot.factor(code).ok_or_else(|| FxError::MissingRate {
        currency: code.clone(),
        anchor: snapshot.anchor.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn eur_snapshot() -> AnchorSnapshot {
        let rates = HashMap::from([(code("EUR"), 1.0), (code("USD"), 1.08), (code("GBP"), 0.86)]);
        AnchorSnapshot::new(code("EUR"), rates, "TEST")
    }

    #[test]
    fn test_anchor_to_quote() {
        let rate = cross_rate(&eur_snapshot(), &code("EUR"), &code("USD")).unwrap();
        assert_eq!(rate, 1.08);
    }

    #[test]
    fn test_non_anchor_cross() {
        let rate = cross_rate(&eur_snapshot(), &code("GBP"), &code("USD")).unwrap();
        assert_eq!(rate, 1.08 / 0.86);
        assert!((rate - 1.2558).abs() < 1e-4);
    }

    #[test]
    fn test_anchor_missing_from_table_is_one() {
        let rates = HashMap::from([(code("USD"), 1.08)]);
        let snapshot = AnchorSnapshot::new(code("EUR"), rates, "TEST");

        assert_eq!(cross_rate(&snapshot, &code("EUR"), &code("USD")).unwrap(), 1.08);
        assert_eq!(cross_rate(&snapshot, &code("USD"), &code("EUR")).unwrap(), 1.0 / 1.08);
    }

    #[test]
    fn test_missing_rate() {
        let result = cross_rate(&eur_snapshot(), &code("JPY"), &code("USD"));
        match result {
            Err(FxError::MissingRate { currency, anchor }) => {
                assert_eq!(currency, code("JPY"));
                assert_eq!(anchor, code("EUR"));
            }
            other => panic!("expected MissingRate, got {:?}", other),
        }

        assert!(matches!(
            cross_rate(&eur_snapshot(), &code("USD"), &code("CHF")),
            Err(FxError::MissingRate { .. })
        ));
    }

    #[test]
    fn test_zero_from_factor_is_invalid() {
        let rates = HashMap::from([(code("USD"), 1.08), (code("XXX"), 0.0)]);
        let snapshot = AnchorSnapshot::new(code("EUR"), rates, "TEST");

        assert!(matches!(
            cross_rate(&snapshot, &code("XXX"), &code("USD")),
            Err(FxError::InvalidRate { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_cross_rate_is_ratio_and_inverse(a in 1e-4f64..1e6, b in 1e-4f64..1e6) {
            let rates = HashMap::from([(code("AAA"), a), (code("BBB"), b)]);
            let snapshot = AnchorSnapshot::new(code("EUR"), rates, "PROP");

            let ab = cross_rate(&snapshot, &code("AAA"), &code("BBB")).unwrap();
            let ba = cross_rate(&snapshot, &code("BBB"), &code("AAA")).unwrap();

            prop_assert_eq!(ab, b / a);
            prop_assert!((ab * ba - 1.0).abs() < 1e-12);
        }
    }
}
