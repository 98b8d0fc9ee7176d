//! Utilization sweep: re-price a facility across a range of drawn fractions.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RcfError;
use crate::rcf::economics::{compute, validate_facility_input, FacilityInput};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RcfResult;

/// Upper bound on grid size.
const MAX_SWEEP_POINTS: usize = 10_001;

fn default_max() -> Rate {
    Decimal::ONE
}

fn default_step() -> Rate {
    dec!(0.05)
}

/// Input for a utilization sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationSweepInput {
    /// Facility to re-price. Its own `drawn_fraction` is ignored.
    #[serde(default)]
    pub base: FacilityInput,
    #[serde(default)]
    pub min: Rate,
    #[serde(default = "default_max")]
    pub max: Rate,
    #[serde(default = "default_step")]
    pub step: Rate,
}

impl Default for UtilizationSweepInput {
    fn default() -> Self {
        Self {
            base: FacilityInput::default(),
            min: Decimal::ZERO,
            max: default_max(),
            step: default_step(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationPoint {
    pub drawn_fraction: Rate,
    pub drawn: Money,
    pub undrawn: Money,
    pub net_spread_drawn: Money,
    pub net_spread_undrawn: Money,
    pub total_income: Money,
    pub return_on_capital: Option<Decimal>,
}

/// Grid points bounding the break-even. A point whose income is exactly zero
/// is its own bracket (lower and upper coincide); otherwise the bracket is
/// the first adjacent pair with strictly opposite signs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvenBracket {
    pub lower_fraction: Rate,
    pub upper_fraction: Rate,
    pub lower_income: Money,
    pub upper_income: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationSweepOutput {
    pub points: Vec<UtilizationPoint>,
    /// Drawn fraction with the highest total income (first on ties).
    pub best_drawn_fraction: Rate,
    pub best_total_income: Money,
    pub break_even: Option<BreakEvenBracket>,
}

/// Run the sweep.
pub fn sweep_utilization(
    input: &UtilizationSweepInput,
) -> RcfResult<ComputationOutput<UtilizationSweepOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let fractions = generate_sweep_values(input.min, input.max, input.step)?;
    log::debug!(
        "utilization sweep: {} points over [{}, {}]",
        fractions.len(),
        input.min,
        input.max
    );

    let mut points: Vec<UtilizationPoint> = Vec::with_capacity(fractions.len());
    for fraction in fractions {
        let facility = FacilityInput {
            drawn_fraction: fraction,
            ..input.base.clone()
        };
        validate_facility_input(&facility)?;
        let r = compute(&facility)?;
        points.push(UtilizationPoint {
            drawn_fraction: fraction,
            drawn: r.drawn,
            undrawn: r.undrawn,
            net_spread_drawn: r.drawn_leg.net_spread,
            net_spread_undrawn: r.undrawn_leg.net_spread,
            total_income: r.total_income,
            return_on_capital: r.return_on_capital(),
        });
    }

    // The grid is never empty: generate_sweep_values always yields `min`.
    let (best_drawn_fraction, best_total_income) = points
        .iter()
        .fold(None::<&UtilizationPoint>, |best, p| match best {
            Some(b) if b.total_income >= p.total_income => Some(b),
            _ => Some(p),
        })
        .map(|p| (p.drawn_fraction, p.total_income))
        .unwrap_or((input.min, Decimal::ZERO));

    let break_even = find_break_even(&points);
    if break_even.is_none() {
        warnings.push("Total income neither reaches nor crosses zero over the swept range".into());
    }

    let output = UtilizationSweepOutput {
        points,
        best_drawn_fraction,
        best_total_income,
        break_even,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "RCF Utilization Sweep — total income across drawn fractions",
        &serde_json::json!({
            "min": input.min.to_string(),
            "max": input.max.to_string(),
            "step": input.step.to_string(),
            "facility_size": input.base.facility_size.to_string(),
            "cln_active": input.base.cln.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Sweep values from `min` to `max` by `step`, with `max` appended when the
/// step does not land on it.
fn generate_sweep_values(min: Rate, max: Rate, step: Rate) -> RcfResult<Vec<Rate>> {
    if step <= Decimal::ZERO {
        return Err(RcfError::InvalidInput {
            field: "step".into(),
            reason: "Step must be positive".into(),
        });
    }
    if min > max {
        return Err(RcfError::InvalidInput {
            field: "min".into(),
            reason: "Min must be <= max".into(),
        });
    }
    if min < Decimal::ZERO || max > Decimal::ONE {
        return Err(RcfError::InvalidInput {
            field: "max".into(),
            reason: "Drawn fraction bounds must lie within [0, 1]".into(),
        });
    }
    // Bounds the loop below; the exact count is checked once `max` is appended.
    if (max - min) / step >= Decimal::from(MAX_SWEEP_POINTS) {
        return Err(too_many_points());
    }

    let mut values = Vec::new();
    let mut current = min;
    while current <= max {
        values.push(current);
        current += step;
    }
    if let Some(&last) = values.last() {
        if last < max {
            values.push(max);
        }
    }
    if values.len() > MAX_SWEEP_POINTS {
        return Err(too_many_points());
    }

    Ok(values)
}

fn too_many_points() -> RcfError {
    RcfError::InvalidInput {
        field: "step".into(),
        reason: format!("Sweep would exceed {} points", MAX_SWEEP_POINTS),
    }
}

fn find_break_even(points: &[UtilizationPoint]) -> Option<BreakEvenBracket> {
    let bracket = |lo: &UtilizationPoint, hi: &UtilizationPoint| BreakEvenBracket {
        lower_fraction: lo.drawn_fraction,
        upper_fraction: hi.drawn_fraction,
        lower_income: lo.total_income,
        upper_income: hi.total_income,
    };
    for (i, p) in points.iter().enumerate() {
        if p.total_income.is_zero() {
            return Some(bracket(p, p));
        }
        if let Some(next) = points.get(i + 1) {
            let opposite = (p.total_income < Decimal::ZERO && next.total_income > Decimal::ZERO)
                || (p.total_income > Decimal::ZERO && next.total_income < Decimal::ZERO);
            if opposite {
                return Some(bracket(p, next));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_grid_has_21_points() {
        let values = generate_sweep_values(dec!(0), dec!(1), dec!(0.05)).unwrap();
        assert_eq!(values.len(), 21);
        assert_eq!(values[0], dec!(0));
        assert_eq!(values[7], dec!(0.35));
        assert_eq!(*values.last().unwrap(), dec!(1));
    }

    #[test]
    fn test_grid_appends_max_when_step_overshoots() {
        let values = generate_sweep_values(dec!(0), dec!(1), dec!(0.3)).unwrap();
        assert_eq!(values, vec![dec!(0), dec!(0.3), dec!(0.6), dec!(0.9), dec!(1)]);
    }

    #[test]
    fn test_grid_single_point() {
        let values = generate_sweep_values(dec!(0.4), dec!(0.4), dec!(0.1)).unwrap();
        assert_eq!(values, vec![dec!(0.4)]);
    }

    #[test]
    fn test_grid_rejects_bad_bounds() {
        assert!(generate_sweep_values(dec!(0), dec!(1), dec!(0)).is_err());
        assert!(generate_sweep_values(dec!(0.6), dec!(0.5), dec!(0.1)).is_err());
        assert!(generate_sweep_values(dec!(-0.1), dec!(0.5), dec!(0.1)).is_err());
        assert!(generate_sweep_values(dec!(0), dec!(1.2), dec!(0.1)).is_err());
        assert!(generate_sweep_values(dec!(0), dec!(1), dec!(0.00001)).is_err());
    }

    #[test]
    fn test_sweep_break_even_bracket() {
        // Drawn nets +42 bps (300 - 258), undrawn nets -50 bps (25 - 75):
        // income crosses zero at f = 0.005 / 0.0092 ~ 0.5435.
        let mut base = FacilityInput::default();
        base.drawn_rates.margin_bps = dec!(300);
        base.undrawn_rates.commitment_fee_bps = dec!(25);
        let input = UtilizationSweepInput {
            base,
            ..UtilizationSweepInput::default()
        };
        let out = sweep_utilization(&input).unwrap().result;
        let bracket = out.break_even.unwrap();
        assert_eq!(bracket.lower_fraction, dec!(0.50));
        assert_eq!(bracket.upper_fraction, dec!(0.55));
        assert!(bracket.lower_income < dec!(0));
        assert!(bracket.upper_income > dec!(0));
        assert_eq!(out.best_drawn_fraction, dec!(1));
    }

    #[test]
    fn test_sweep_points_reconcile() {
        let out = sweep_utilization(&UtilizationSweepInput::default())
            .unwrap()
            .result;
        for p in &out.points {
            assert_eq!(p.drawn + p.undrawn, dec!(2_000_000_000));
            assert_eq!(p.net_spread_drawn + p.net_spread_undrawn, p.total_income);
        }
    }

    #[test]
    fn test_sweep_without_sign_change_warns() {
        let mut base = FacilityInput::default();
        base.drawn_rates.margin_bps = dec!(400);
        base.undrawn_rates.commitment_fee_bps = dec!(100);
        let input = UtilizationSweepInput {
            base,
            min: dec!(0.1),
            ..UtilizationSweepInput::default()
        };
        let out = sweep_utilization(&input).unwrap();
        assert!(out.result.break_even.is_none());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_sweep_rejects_invalid_base_cln() {
        let mut base = FacilityInput::default();
        base.cln = Some(crate::rcf::economics::ClnInput {
            size: dec!(5_000_000_000),
            cost_bps: dec!(-70),
        });
        let input = UtilizationSweepInput {
            base,
            ..UtilizationSweepInput::default()
        };
        assert!(sweep_utilization(&input).is_err());
    }

    #[test]
    fn test_grid_rejects_appended_max_past_limit() {
        // 0.100005 / 0.00001 = 10000.5: 10001 stepped values plus max.
        match generate_sweep_values(dec!(0), dec!(0.100005), dec!(0.00001)) {
            Err(RcfError::InvalidInput { field, .. }) => assert_eq!(field, "step"),
            other => panic!("Expected InvalidInput, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn test_grid_accepts_exactly_max_points() {
        let values = generate_sweep_values(dec!(0), dec!(0.1), dec!(0.00001)).unwrap();
        assert_eq!(values.len(), MAX_SWEEP_POINTS);
        assert_eq!(*values.last().unwrap(), dec!(0.1));
    }

    fn point(fraction: Decimal, income: Decimal) -> UtilizationPoint {
        UtilizationPoint {
            drawn_fraction: fraction,
            drawn: Decimal::ZERO,
            undrawn: Decimal::ZERO,
            net_spread_drawn: income,
            net_spread_undrawn: Decimal::ZERO,
            total_income: income,
            return_on_capital: None,
        }
    }

    #[test]
    fn test_break_even_at_zero_point_from_below() {
        let points = vec![
            point(dec!(0.1), dec!(-5)),
            point(dec!(0.2), dec!(0)),
            point(dec!(0.3), dec!(-1)),
        ];
        let b = find_break_even(&points).unwrap();
        assert_eq!(b.lower_fraction, dec!(0.2));
        assert_eq!(b.upper_fraction, dec!(0.2));
        assert_eq!(b.lower_income, dec!(0));
    }

    #[test]
    fn test_break_even_at_zero_point_from_above() {
        let points = vec![
            point(dec!(0.1), dec!(5)),
            point(dec!(0.2), dec!(0)),
            point(dec!(0.3), dec!(3)),
        ];
        let b = find_break_even(&points).unwrap();
        assert_eq!((b.lower_fraction, b.upper_fraction), (dec!(0.2), dec!(0.2)));
    }

    #[test]
    fn test_break_even_first_point_zero_then_positive() {
        let points = vec![point(dec!(0), dec!(0)), point(dec!(0.5), dec!(7))];
        let b = find_break_even(&points).unwrap();
        assert_eq!((b.lower_fraction, b.upper_fraction), (dec!(0), dec!(0)));
    }

    #[test]
    fn test_break_even_strict_sign_change() {
        let points = vec![
            point(dec!(0.1), dec!(4)),
            point(dec!(0.2), dec!(2)),
            point(dec!(0.3), dec!(-1)),
        ];
        let b = find_break_even(&points).unwrap();
        assert_eq!((b.lower_fraction, b.upper_fraction), (dec!(0.2), dec!(0.3)));
        assert_eq!((b.lower_income, b.upper_income), (dec!(2), dec!(-1)));
    }

    #[test]
    fn test_break_even_none_without_zero_or_crossing() {
        let points = vec![point(dec!(0.1), dec!(-4)), point(dec!(0.2), dec!(-2))];
        assert!(find_break_even(&points).is_none());
    }

    #[test]
    fn test_default_sweep_breaks_even_when_undrawn() {
        // Default undrawn leg nets 0 bps, so income is zero only at f = 0.
        let out = sweep_utilization(&UtilizationSweepInput::default())
            .unwrap()
            .result;
        let b = out.break_even.unwrap();
        assert_eq!(b.lower_fraction, dec!(0));
        assert_eq!(b.upper_fraction, dec!(0));
    }
}
