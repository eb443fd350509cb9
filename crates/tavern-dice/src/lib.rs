//! Roll formulas and the dice resolver.
//!
//! A formula names how many dice of each standard size to roll plus a flat
//! bonus. Resolving a formula draws every die independently from the
//! process-wide rng and returns the total together with the individual
//! draws, grouped by die size. The resolver has no error conditions:
//! missing fields default to zero and die sizes outside the fixed set are
//! never rolled.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The seven die sizes a formula can roll, in ascending order.
///
/// Sizes outside this set may appear in an incoming formula (clients are
/// not validated) but contribute nothing to a resolution.
pub const DIE_SIZES: [u32; 7] = [2, 4, 6, 8, 10, 12, 20];

/// A dice-roll specification: a flat bonus plus per-size dice counts.
///
/// Wire shape: `{"bonus": 3, "dices": {"6": 2, "20": 1}}`. Both fields
/// default when absent, so `{}` is the valid zero formula. Die sizes are
/// keyed by their decimal string, exactly as they appear on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollFormula {
    /// Flat modifier added to the total. May be negative.
    #[serde(default)]
    pub bonus: i64,

    /// Die size (as a decimal string) to count of dice of that size.
    #[serde(default)]
    pub dices: BTreeMap<String, u32>,
}

/// Individual draw outcomes, grouped by die size.
///
/// After a resolve this holds an entry for every size in [`DIE_SIZES`],
/// with an empty sequence for sizes the formula did not roll.
pub type RollResults = BTreeMap<String, Vec<u32>>;

/// Resolves a formula against the process-wide random source.
///
/// Returns the total (bonus plus the sum of every draw) and the draws
/// per die size, in draw order.
pub fn resolve(formula: &RollFormula) -> (i64, RollResults) {
    resolve_with(formula, &mut rand::rng())
}

/// Resolves a formula using the supplied rng.
///
/// Split out from [`resolve`] so tests can pass a seeded rng and get
/// deterministic draws.
pub fn resolve_with<R: Rng + ?Sized>(
    formula: &RollFormula,
    rng: &mut R,
) -> (i64, RollResults) {
    let mut total = formula.bonus;
    let mut results = RollResults::new();

    for size in DIE_SIZES {
        let key = size.to_string();
        let count = formula.dices.get(&key).copied().unwrap_or(0);
        let mut draws = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let roll = rng.random_range(1..=size);
            total += i64::from(roll);
            draws.push(roll);
        }
        results.insert(key, draws);
    }

    (total, results)
}

/// Renders a formula as a human-readable string, e.g. `"2d6 1d20 +3"`.
///
/// Sizes with a nonzero count are rendered `<count>d<size>` in ascending
/// size order regardless of how the input map was built, joined by single
/// spaces. A nonzero bonus is appended as a signed token (`+3`, `-2`).
/// The all-zero formula renders as the empty string.
///
/// Callers key phrasing off the exact output: a formula that renders as
/// `"1d2"` is announced as a coin flip.
pub fn format_formula(formula: &RollFormula) -> String {
    let mut parts: Vec<String> = Vec::new();
    for size in DIE_SIZES {
        let count = formula
            .dices
            .get(&size.to_string())
            .copied()
            .unwrap_or(0);
        if count > 0 {
            parts.push(format!("{count}d{size}"));
        }
    }
    if formula.bonus != 0 {
        parts.push(format!("{:+}", formula.bonus));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn formula(bonus: i64, dices: &[(u32, u32)]) -> RollFormula {
        RollFormula {
            bonus,
            dices: dices
                .iter()
                .map(|&(size, count)| (size.to_string(), count))
                .collect(),
        }
    }

    // =====================================================================
    // resolve
    // =====================================================================

    #[test]
    fn test_resolve_total_is_bonus_plus_draws() {
        let f = formula(3, &[(6, 2), (20, 1)]);
        let mut rng = StdRng::seed_from_u64(7);

        let (total, results) = resolve_with(&f, &mut rng);

        let drawn: i64 = results
            .values()
            .flatten()
            .map(|&roll| i64::from(roll))
            .sum();
        assert_eq!(total, 3 + drawn);
    }

    #[test]
    fn test_resolve_draws_stay_within_die_bounds() {
        // Roll a lot of every size; every draw must land in [1, size].
        let counts: Vec<(u32, u32)> =
            DIE_SIZES.iter().map(|&size| (size, 50)).collect();
        let f = formula(0, &counts);

        let (_, results) = resolve(&f);

        for size in DIE_SIZES {
            let draws = &results[&size.to_string()];
            assert_eq!(draws.len(), 50);
            for &roll in draws {
                assert!(
                    (1..=size).contains(&roll),
                    "d{size} produced {roll}"
                );
            }
        }
    }

    #[test]
    fn test_resolve_zero_formula_yields_bonus_and_empty_sequences() {
        let (total, results) = resolve(&RollFormula::default());

        assert_eq!(total, 0);
        assert_eq!(results.len(), DIE_SIZES.len());
        assert!(results.values().all(Vec::is_empty));
    }

    #[test]
    fn test_resolve_populates_every_fixed_size() {
        // Even when only one size is rolled, the result carries an entry
        // (possibly empty) for each of the seven sizes.
        let f = formula(0, &[(6, 1)]);

        let (_, results) = resolve(&f);

        for size in DIE_SIZES {
            assert!(
                results.contains_key(&size.to_string()),
                "missing d{size} entry"
            );
        }
        assert_eq!(results["6"].len(), 1);
        assert!(results["20"].is_empty());
    }

    #[test]
    fn test_resolve_ignores_unknown_die_sizes() {
        // A d7 is not a thing here; it contributes nothing.
        let f = formula(1, &[(7, 100)]);

        let (total, results) = resolve(&f);

        assert_eq!(total, 1);
        assert!(results.values().all(Vec::is_empty));
        assert!(!results.contains_key("7"));
    }

    #[test]
    fn test_resolve_negative_bonus_can_go_below_zero() {
        let f = formula(-10, &[(2, 1)]);

        let (total, _) = resolve(&f);

        // One d2 draws 1 or 2, so the total is -9 or -8.
        assert!(total == -9 || total == -8, "got {total}");
    }

    #[test]
    fn test_resolve_with_is_deterministic_for_a_seed() {
        let f = formula(2, &[(6, 3), (12, 2)]);

        let a = resolve_with(&f, &mut StdRng::seed_from_u64(42));
        let b = resolve_with(&f, &mut StdRng::seed_from_u64(42));

        assert_eq!(a, b);
    }

    // =====================================================================
    // format_formula
    // =====================================================================

    #[test]
    fn test_format_orders_by_ascending_size() {
        // Lexical map order ("12" < "20" < "4") must not leak into the
        // output; the renderer walks the fixed numeric order.
        let f = formula(0, &[(20, 1), (4, 2), (12, 3)]);
        assert_eq!(format_formula(&f), "2d4 3d12 1d20");
    }

    #[test]
    fn test_format_appends_signed_bonus() {
        assert_eq!(format_formula(&formula(3, &[(6, 2)])), "2d6 +3");
        assert_eq!(format_formula(&formula(-2, &[(6, 2)])), "2d6 -2");
    }

    #[test]
    fn test_format_omits_zero_bonus() {
        assert_eq!(format_formula(&formula(0, &[(8, 1)])), "1d8");
    }

    #[test]
    fn test_format_skips_zero_counts() {
        let f = formula(0, &[(6, 0), (10, 2)]);
        assert_eq!(format_formula(&f), "2d10");
    }

    #[test]
    fn test_format_empty_formula_renders_empty_string() {
        assert_eq!(format_formula(&RollFormula::default()), "");
        assert_eq!(format_formula(&formula(0, &[(6, 0)])), "");
    }

    #[test]
    fn test_format_single_d2_is_the_coin_flip_form() {
        assert_eq!(format_formula(&formula(0, &[(2, 1)])), "1d2");
        // With a bonus it stops being a plain coin flip.
        assert_ne!(format_formula(&formula(1, &[(2, 1)])), "1d2");
    }

    // =====================================================================
    // serde shape
    // =====================================================================

    #[test]
    fn test_formula_deserializes_from_wire_shape() {
        let f: RollFormula =
            serde_json::from_str(r#"{"bonus": 3, "dices": {"6": 2, "20": 1}}"#)
                .unwrap();

        assert_eq!(f.bonus, 3);
        assert_eq!(f.dices.get("6"), Some(&2));
        assert_eq!(f.dices.get("20"), Some(&1));
    }

    #[test]
    fn test_formula_fields_default_when_missing() {
        let f: RollFormula = serde_json::from_str("{}").unwrap();
        assert_eq!(f, RollFormula::default());

        let f: RollFormula =
            serde_json::from_str(r#"{"dices": {"4": 1}}"#).unwrap();
        assert_eq!(f.bonus, 0);
        assert_eq!(f.dices.get("4"), Some(&1));
    }

    #[test]
    fn test_results_serialize_with_all_sizes_present() {
        let f = formula(0, &[(2, 1)]);
        let (_, results) = resolve(&f);

        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["2"].as_array().unwrap().len(), 1);
        assert!(json["20"].as_array().unwrap().is_empty());
    }
}
