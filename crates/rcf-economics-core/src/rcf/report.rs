//! Presentation-ready views of a [`CalculationResult`]: the ordered results
//! table, the CLN impact table and the facility summary.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rcf::economics::CalculationResult;
use crate::types::{Currency, Money, Rate};

/// One labelled line of a report table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub category: String,
    pub amount: Money,
}

impl ReportRow {
    fn new(category: &str, amount: Money) -> Self {
        Self {
            category: category.to_string(),
            amount,
        }
    }
}

/// Headline figures for a facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilitySummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub currency: Currency,
    pub facility_size: Money,
    pub drawn: Money,
    pub drawn_fraction: Rate,
    pub undrawn: Money,
    pub undrawn_fraction: Rate,
    pub total_income: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cln_size: Option<Money>,
    pub cln_percentage: Option<Rate>,
    pub return_on_capital: Option<Decimal>,
}

/// Full report: both tables plus the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityReport {
    pub results: Vec<ReportRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cln_impact: Option<Vec<ReportRow>>,
    pub summary: FacilitySummary,
}

/// Drawn and undrawn line items followed by total income.
pub fn results_table(result: &CalculationResult) -> Vec<ReportRow> {
    let d = &result.drawn_leg;
    let u = &result.undrawn_leg;
    vec![
        ReportRow::new("Drawn Margin", d.margin),
        ReportRow::new("Funding Cost", d.funding),
        ReportRow::new("Credit Cost", d.credit),
        ReportRow::new("Capital Cost", d.capital),
        ReportRow::new("Net Spread (Drawn)", d.net_spread),
        ReportRow::new("Commitment Fee", u.commitment_fee),
        ReportRow::new("CF Funding", u.funding),
        ReportRow::new("CF Credit", u.credit),
        ReportRow::new("CF Capital", u.capital),
        ReportRow::new("Net Spread (Undrawn)", u.net_spread),
        ReportRow::new("Total Income", result.total_income),
    ]
}

/// CLN lines, or `None` when no note is attached.
pub fn cln_impact_table(result: &CalculationResult) -> Option<Vec<ReportRow>> {
    result.cln.as_ref().map(|c| {
        vec![
            ReportRow::new("CLN Size", c.size),
            ReportRow::new("CLN Cost", c.cln_cost),
            ReportRow::new("Adjusted Credit", c.adjusted_credit),
            ReportRow::new("Adjusted Capital", c.adjusted_capital),
            ReportRow::new("Total with CLN", c.total_with_cln),
        ]
    })
}

pub fn summary(result: &CalculationResult) -> FacilitySummary {
    FacilitySummary {
        company: result.company.clone(),
        currency: result.currency.clone(),
        facility_size: result.facility_size,
        drawn: result.drawn,
        drawn_fraction: result.drawn_fraction,
        undrawn: result.undrawn,
        undrawn_fraction: result.undrawn_fraction,
        total_income: result.total_income,
        cln_size: result.cln.as_ref().map(|c| c.size),
        cln_percentage: result.cln_percentage(),
        return_on_capital: result.return_on_capital(),
    }
}

pub fn build_report(result: &CalculationResult) -> FacilityReport {
    FacilityReport {
        results: results_table(result),
        cln_impact: cln_impact_table(result),
        summary: summary(result),
    }
}

/// Two decimals with thousands separators, e.g. `-1,148,000.00`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Whole-number percentage of a fraction, e.g. 0.35 -> `35%`.
fn format_fraction(fraction: Rate) -> String {
    format!("{}%", (fraction * dec!(100)).round_dp(0).normalize())
}

impl fmt::Display for FacilitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ccy = &self.currency;
        if let Some(ref company) = self.company {
            writeln!(f, "Results for {}", company)?;
        }
        writeln!(
            f,
            "Total Facility: {} {}",
            ccy,
            format_amount(self.facility_size)
        )?;
        writeln!(
            f,
            "Drawn: {} {} ({})",
            ccy,
            format_amount(self.drawn),
            format_fraction(self.drawn_fraction)
        )?;
        writeln!(
            f,
            "Undrawn: {} {} ({})",
            ccy,
            format_amount(self.undrawn),
            format_fraction(self.undrawn_fraction)
        )?;
        write!(f, "Total Income: {} {}", ccy, format_amount(self.total_income))?;

        if let Some(size) = self.cln_size {
            let pct = self
                .cln_percentage
                .map(format_fraction)
                .unwrap_or_else(|| "n/a".to_string());
            write!(
                f,
                "\nCLN Impact: Using {} {} ({} of facility)",
                ccy,
                format_amount(size),
                pct
            )?;
            match self.return_on_capital {
                Some(roc) => write!(f, "\nReturn on Capital: {:.2}%", roc.round_dp(2))?,
                None => write!(f, "\nReturn on Capital: n/a")?,
            }
        }
        Ok(())
    }
}
