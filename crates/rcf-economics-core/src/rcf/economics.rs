//! Revolving credit facility (RCF) economics with optional credit-linked note
//! (CLN) risk transfer.
//!
//! The facility is split into a drawn and an undrawn leg. Each leg is priced
//! from signed basis-point inputs (income positive, costs negative), the two
//! legs are blended per cost category, and when a CLN is attached the drawn
//! credit and capital cost is re-weighted by the share of the facility the
//! note leaves uncovered. All math uses `rust_decimal::Decimal`, so every
//! derived line reconciles exactly with the lines it is built from.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RcfError;
use crate::types::{with_metadata, Bps, ComputationOutput, Currency, Money, Rate};
use crate::RcfResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Basis points divisor
const BPS_DIVISOR: Decimal = dec!(10000);
const PERCENT: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Rates applied to the drawn balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawnRates {
    /// Lending margin earned on drawn amounts.
    pub margin_bps: Bps,
    pub funding_bps: Bps,
    pub credit_bps: Bps,
    pub capital_bps: Bps,
}

impl Default for DrawnRates {
    fn default() -> Self {
        Self {
            margin_bps: dec!(250),
            funding_bps: dec!(-114),
            credit_bps: dec!(-29),
            capital_bps: dec!(-115),
        }
    }
}

/// Rates applied to the undrawn balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndrawnRates {
    /// Commitment fee earned on undrawn amounts.
    pub commitment_fee_bps: Bps,
    pub funding_bps: Bps,
    pub credit_bps: Bps,
    pub capital_bps: Bps,
}

impl Default for UndrawnRates {
    fn default() -> Self {
        Self {
            commitment_fee_bps: dec!(75),
            funding_bps: dec!(-13),
            credit_bps: dec!(-12),
            capital_bps: dec!(-50),
        }
    }
}

/// A credit-linked note transferring credit and capital risk on a tranche
/// of the facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClnInput {
    /// Notional of the note. Must not exceed the facility size.
    pub size: Money,
    /// Running cost of the note, applied to `size`.
    pub cost_bps: Bps,
}

impl Default for ClnInput {
    fn default() -> Self {
        Self {
            size: dec!(300_000_000),
            cost_bps: dec!(-70),
        }
    }
}

/// Facility parameters for a single calculation.
///
/// Missing fields deserialize to the documented defaults (a ZAR 2bn facility,
/// 35% drawn, no CLN).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub currency: Currency,
    pub facility_size: Money,
    /// Fraction of `facility_size` currently drawn, in [0, 1].
    pub drawn_fraction: Rate,
    pub drawn_rates: DrawnRates,
    pub undrawn_rates: UndrawnRates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cln: Option<ClnInput>,
}

impl Default for FacilityInput {
    fn default() -> Self {
        Self {
            company: Some("Zeus Holdings".into()),
            currency: Currency::ZAR,
            facility_size: dec!(2_000_000_000),
            drawn_fraction: dec!(0.35),
            drawn_rates: DrawnRates::default(),
            undrawn_rates: UndrawnRates::default(),
            cln: None,
        }
    }
}

/// Monetary line items on the drawn balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnLeg {
    pub margin: Money,
    pub funding: Money,
    pub credit: Money,
    pub capital: Money,
    /// funding + credit + capital.
    pub total_cost: Money,
    /// margin + total_cost.
    pub net_spread: Money,
    pub total_cost_bps: Bps,
    pub net_spread_bps: Bps,
}

/// Monetary line items on the undrawn balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndrawnLeg {
    pub commitment_fee: Money,
    pub funding: Money,
    pub credit: Money,
    pub capital: Money,
    /// Sum of the four undrawn line items.
    pub net_spread: Money,
    pub net_spread_bps: Bps,
}

/// Drawn + undrawn contribution per category. The commitment fee blends
/// into the margin line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedEconomics {
    pub margin: Money,
    pub funding: Money,
    pub credit: Money,
    pub capital: Money,
}

/// Effect of the credit-linked note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClnImpact {
    pub size: Money,
    /// size / facility_size. `None` when the facility size is zero.
    pub cln_percentage: Option<Rate>,
    pub cln_cost: Money,
    /// Drawn credit cost on the uncovered share.
    pub adjusted_credit: Money,
    /// Drawn capital cost on the uncovered share.
    pub adjusted_capital: Money,
    /// blended margin + blended funding + cln_cost + adjusted credit + adjusted capital.
    pub total_with_cln: Money,
    /// Amount added to total income: cln_cost + credit delta + capital delta.
    pub income_adjustment: Money,
    /// (margin + funding + cln_cost + adjusted_credit) / -adjusted_capital, in
    /// percent. `None` when adjusted capital is zero.
    pub return_on_capital: Option<Decimal>,
}

/// Fully reconciled breakdown of a facility's economics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub currency: Currency,
    pub facility_size: Money,
    pub drawn_fraction: Rate,
    pub undrawn_fraction: Rate,
    pub drawn: Money,
    pub undrawn: Money,
    pub drawn_leg: DrawnLeg,
    pub undrawn_leg: UndrawnLeg,
    pub blended: BlendedEconomics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cln: Option<ClnImpact>,
    pub total_income: Money,
}

impl CalculationResult {
    /// Return on capital, present only when a CLN is active and the adjusted
    /// capital cost is non-zero.
    pub fn return_on_capital(&self) -> Option<Decimal> {
        self.cln.as_ref().and_then(|c| c.return_on_capital)
    }

    /// CLN coverage as a fraction of the facility, if a CLN is active and the
    /// ratio is defined.
    pub fn cln_percentage(&self) -> Option<Rate> {
        self.cln.as_ref().and_then(|c| c.cln_percentage)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the facility economics.
///
/// Pure: the input is not validated (see [`validate_facility_input`]).
/// Undefined ratios surface as `None`. Every line is priced with checked
/// arithmetic, so the only error is an amount that leaves the `Decimal`
/// range, reported as [`RcfError::InvalidInput`] against the field whose
/// line overflowed.
pub fn compute(facility: &FacilityInput) -> RcfResult<CalculationResult> {
    log::debug!(
        "rcf compute: facility_size={} drawn_fraction={} cln={}",
        facility.facility_size,
        facility.drawn_fraction,
        facility.cln.is_some()
    );

    let drawn = checked(
        facility.facility_size.checked_mul(facility.drawn_fraction),
        "facility_size",
    )?;
    let undrawn = checked(facility.facility_size.checked_sub(drawn), "facility_size")?;
    let undrawn_fraction = checked(
        Decimal::ONE.checked_sub(facility.drawn_fraction),
        "drawn_fraction",
    )?;

    let drawn_leg = price_drawn_leg(drawn, &facility.drawn_rates)?;
    let undrawn_leg = price_undrawn_leg(undrawn, &facility.undrawn_rates)?;

    let blended = BlendedEconomics {
        margin: sum(
            &[drawn_leg.margin, undrawn_leg.commitment_fee],
            "undrawn_rates.commitment_fee_bps",
        )?,
        funding: sum(
            &[drawn_leg.funding, undrawn_leg.funding],
            "undrawn_rates.funding_bps",
        )?,
        credit: sum(
            &[drawn_leg.credit, undrawn_leg.credit],
            "undrawn_rates.credit_bps",
        )?,
        capital: sum(
            &[drawn_leg.capital, undrawn_leg.capital],
            "undrawn_rates.capital_bps",
        )?,
    };

    let mut total_income = sum(
        &[drawn_leg.net_spread, undrawn_leg.net_spread],
        "total_income",
    )?;

    let cln = facility
        .cln
        .as_ref()
        .map(|note| apply_cln(note, facility.facility_size, &drawn_leg, &blended))
        .transpose()?;

    // Applied term by term, in this order, so callers can reproduce the
    // figure exactly.
    if let Some(ref impact) = cln {
        total_income = sum(
            &[
                total_income,
                impact.cln_cost,
                difference(impact.adjusted_credit, drawn_leg.credit, "cln.size")?,
                difference(impact.adjusted_capital, drawn_leg.capital, "cln.size")?,
            ],
            "total_income",
        )?;
    }

    Ok(CalculationResult {
        company: facility.company.clone(),
        currency: facility.currency.clone(),
        facility_size: facility.facility_size,
        drawn_fraction: facility.drawn_fraction,
        undrawn_fraction,
        drawn,
        undrawn,
        drawn_leg,
        undrawn_leg,
        blended,
        cln,
        total_income,
    })
}

/// Validate, compute, and wrap the result in the standard output envelope.
pub fn calculate_rcf_economics(
    input: &FacilityInput,
) -> RcfResult<ComputationOutput<CalculationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_facility_input(input)?;

    let result = compute(input)?;

    if input.facility_size.is_zero() {
        if input.cln.is_some() {
            warnings.push(
                "Facility size is zero; CLN percentage and return on capital are not applicable"
                    .into(),
            );
        } else {
            warnings.push("Facility size is zero; every line item is zero".into());
        }
    }
    if let Some(ref impact) = result.cln {
        if impact.size.is_zero() {
            warnings.push("CLN size is zero; credit and capital costs are unchanged".into());
        }
        if impact.return_on_capital.is_none() {
            warnings.push(
                "Adjusted capital cost is zero; return on capital is not applicable".into(),
            );
        }
    }
    if result.drawn_leg.net_spread < Decimal::ZERO {
        warnings.push(format!(
            "Drawn leg net spread is negative ({} bps)",
            result.drawn_leg.net_spread_bps
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "RCF-CLN Economics — drawn/undrawn spread, blended income, CLN risk transfer",
        &serde_json::json!({
            "company": input.company,
            "currency": input.currency.to_string(),
            "facility_size": input.facility_size.to_string(),
            "drawn_fraction": input.drawn_fraction.to_string(),
            "cln_active": input.cln.is_some(),
            "bps_convention": "amount x (bps / 10000)",
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Boundary check for callers that want a stronger contract than
/// [`compute`] offers. A zero facility size is accepted.
pub fn validate_facility_input(input: &FacilityInput) -> RcfResult<()> {
    if input.facility_size < Decimal::ZERO {
        return Err(RcfError::InvalidInput {
            field: "facility_size".into(),
            reason: "Facility size cannot be negative".into(),
        });
    }
    if input.drawn_fraction < Decimal::ZERO || input.drawn_fraction > Decimal::ONE {
        return Err(RcfError::InvalidInput {
            field: "drawn_fraction".into(),
            reason: "Drawn fraction must be between 0 and 1".into(),
        });
    }
    if let Some(ref note) = input.cln {
        if note.size < Decimal::ZERO {
            return Err(RcfError::InvalidInput {
                field: "cln.size".into(),
                reason: "CLN size cannot be negative".into(),
            });
        }
        if note.size > input.facility_size {
            return Err(RcfError::InvalidInput {
                field: "cln.size".into(),
                reason: "CLN size cannot exceed facility size".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn overflow(field: &str) -> RcfError {
    RcfError::InvalidInput {
        field: field.into(),
        reason: "amount exceeds decimal range".into(),
    }
}

fn checked(value: Option<Decimal>, field: &str) -> RcfResult<Decimal> {
    value.ok_or_else(|| overflow(field))
}

/// Left-to-right sum; the running total is checked at every step.
fn sum(terms: &[Decimal], field: &str) -> RcfResult<Decimal> {
    terms.iter().try_fold(Decimal::ZERO, |acc, t| {
        checked(acc.checked_add(*t), field)
    })
}

fn difference(a: Decimal, b: Decimal, field: &str) -> RcfResult<Decimal> {
    checked(a.checked_sub(b), field)
}

fn bps_amount(amount: Money, bps: Bps, field: &str) -> RcfResult<Money> {
    let rate = checked(bps.checked_div(BPS_DIVISOR), field)?;
    checked(amount.checked_mul(rate), field)
}

fn price_drawn_leg(drawn: Money, rates: &DrawnRates) -> RcfResult<DrawnLeg> {
    let margin = bps_amount(drawn, rates.margin_bps, "drawn_rates.margin_bps")?;
    let funding = bps_amount(drawn, rates.funding_bps, "drawn_rates.funding_bps")?;
    let credit = bps_amount(drawn, rates.credit_bps, "drawn_rates.credit_bps")?;
    let capital = bps_amount(drawn, rates.capital_bps, "drawn_rates.capital_bps")?;

    let total_cost = sum(&[funding, credit, capital], "drawn_rates")?;
    let total_cost_bps = sum(
        &[rates.funding_bps, rates.credit_bps, rates.capital_bps],
        "drawn_rates",
    )?;

    Ok(DrawnLeg {
        margin,
        funding,
        credit,
        capital,
        total_cost,
        net_spread: sum(&[margin, total_cost], "drawn_rates.margin_bps")?,
        total_cost_bps,
        net_spread_bps: sum(&[rates.margin_bps, total_cost_bps], "drawn_rates.margin_bps")?,
    })
}

fn price_undrawn_leg(undrawn: Money, rates: &UndrawnRates) -> RcfResult<UndrawnLeg> {
    let commitment_fee = bps_amount(
        undrawn,
        rates.commitment_fee_bps,
        "undrawn_rates.commitment_fee_bps",
    )?;
    let funding = bps_amount(undrawn, rates.funding_bps, "undrawn_rates.funding_bps")?;
    let credit = bps_amount(undrawn, rates.credit_bps, "undrawn_rates.credit_bps")?;
    let capital = bps_amount(undrawn, rates.capital_bps, "undrawn_rates.capital_bps")?;

    Ok(UndrawnLeg {
        commitment_fee,
        funding,
        credit,
        capital,
        net_spread: sum(&[commitment_fee, funding, credit, capital], "undrawn_rates")?,
        net_spread_bps: sum(
            &[
                rates.commitment_fee_bps,
                rates.funding_bps,
                rates.credit_bps,
                rates.capital_bps,
            ],
            "undrawn_rates",
        )?,
    })
}

fn apply_cln(
    note: &ClnInput,
    facility_size: Money,
    drawn_leg: &DrawnLeg,
    blended: &BlendedEconomics,
) -> RcfResult<ClnImpact> {
    let cln_percentage = if facility_size.is_zero() {
        None
    } else {
        Some(checked(note.size.checked_div(facility_size), "cln.size")?)
    };
    // With no defined coverage the drawn costs stand as they are.
    let uncovered = difference(
        Decimal::ONE,
        cln_percentage.unwrap_or(Decimal::ZERO),
        "cln.size",
    )?;

    let cln_cost = bps_amount(note.size, note.cost_bps, "cln.cost_bps")?;
    let adjusted_credit = checked(drawn_leg.credit.checked_mul(uncovered), "cln.size")?;
    let adjusted_capital = checked(drawn_leg.capital.checked_mul(uncovered), "cln.size")?;

    let total_with_cln = sum(
        &[
            blended.margin,
            blended.funding,
            cln_cost,
            adjusted_credit,
            adjusted_capital,
        ],
        "cln.cost_bps",
    )?;

    let income_adjustment = sum(
        &[
            cln_cost,
            difference(adjusted_credit, drawn_leg.credit, "cln.size")?,
            difference(adjusted_capital, drawn_leg.capital, "cln.size")?,
        ],
        "cln.cost_bps",
    )?;

    let return_on_capital = if adjusted_capital.is_zero() {
        None
    } else {
        let earnings = sum(
            &[drawn_leg.margin, drawn_leg.funding, cln_cost, adjusted_credit],
            "cln.cost_bps",
        )?;
        earnings
            .checked_div(-adjusted_capital)
            .and_then(|r| r.checked_mul(PERCENT))
    };

    Ok(ClnImpact {
        size: note.size,
        cln_percentage,
        cln_cost,
        adjusted_credit,
        adjusted_capital,
        total_with_cln,
        income_adjustment,
        return_on_capital,
    })
}
