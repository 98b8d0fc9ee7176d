use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use rcf_economics_core::rcf::economics::{self, FacilityInput};
use rcf_economics_core::rcf::report;
use rcf_economics_core::rcf::utilization::{self, UtilizationSweepInput};

use crate::input;

/// Arguments for facility economics
#[derive(Args, Default)]
#[command(allow_hyphen_values = true)]
pub struct EconomicsArgs {
    /// Path to JSON or YAML input file (individual flags override its values)
    #[arg(long)]
    pub input: Option<String>,

    /// Borrower name
    #[arg(long)]
    pub company: Option<String>,

    /// Total facility size
    #[arg(long)]
    pub facility_size: Option<Decimal>,

    /// Fraction of the facility drawn, 0 to 1
    #[arg(long, alias = "drawn")]
    pub drawn_fraction: Option<Decimal>,

    /// Drawn margin (bps)
    #[arg(long)]
    pub margin_bps: Option<Decimal>,

    /// Drawn funding cost (bps)
    #[arg(long)]
    pub funding_bps: Option<Decimal>,

    /// Drawn credit cost (bps)
    #[arg(long)]
    pub credit_bps: Option<Decimal>,

    /// Drawn capital cost (bps)
    #[arg(long)]
    pub capital_bps: Option<Decimal>,

    /// Commitment fee on undrawn (bps)
    #[arg(long)]
    pub commitment_fee_bps: Option<Decimal>,

    /// Undrawn funding cost (bps)
    #[arg(long)]
    pub cf_funding_bps: Option<Decimal>,

    /// Undrawn credit cost (bps)
    #[arg(long)]
    pub cf_credit_bps: Option<Decimal>,

    /// Undrawn capital cost (bps)
    #[arg(long)]
    pub cf_capital_bps: Option<Decimal>,

    /// Include a CLN with default size and cost
    #[arg(long)]
    pub cln: bool,

    /// CLN notional (implies --cln)
    #[arg(long)]
    pub cln_size: Option<Decimal>,

    /// CLN running cost in bps (implies --cln)
    #[arg(long)]
    pub cln_cost_bps: Option<Decimal>,
}

/// Arguments for the facility report
#[derive(Args, Default)]
#[command(allow_hyphen_values = true)]
pub struct ReportArgs {
    #[command(flatten)]
    pub facility: EconomicsArgs,
}

/// Arguments for the utilization sweep
#[derive(Args, Default)]
pub struct SweepArgs {
    /// Path to JSON or YAML sweep input file
    #[arg(long)]
    pub input: Option<String>,

    /// Lowest drawn fraction
    #[arg(long)]
    pub min: Option<Decimal>,

    /// Highest drawn fraction
    #[arg(long)]
    pub max: Option<Decimal>,

    /// Drawn fraction increment
    #[arg(long)]
    pub step: Option<Decimal>,
}

pub fn run_economics(args: EconomicsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let facility = resolve_facility(&args)?;
    let result = economics::calculate_rcf_economics(&facility)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let facility = resolve_facility(&args.facility)?;
    economics::validate_facility_input(&facility)?;
    let result = economics::compute(&facility)?;
    let built = report::build_report(&result);
    let mut value = serde_json::to_value(&built)?;
    if let Value::Object(ref mut map) = value {
        map.insert(
            "summary_text".into(),
            Value::String(built.summary.to_string()),
        );
    }
    Ok(value)
}

pub fn run_sweep(args: SweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut sweep_input: UtilizationSweepInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        UtilizationSweepInput::default()
    };
    if let Some(min) = args.min {
        sweep_input.min = min;
    }
    if let Some(max) = args.max {
        sweep_input.max = max;
    }
    if let Some(step) = args.step {
        sweep_input.step = step;
    }
    let result = utilization::sweep_utilization(&sweep_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Input file, else piped stdin, else the documented defaults; then flags.
fn resolve_facility(args: &EconomicsArgs) -> Result<FacilityInput, Box<dyn std::error::Error>> {
    let base: FacilityInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        FacilityInput::default()
    };
    Ok(apply_overrides(base, args))
}

fn apply_overrides(mut f: FacilityInput, args: &EconomicsArgs) -> FacilityInput {
    if let Some(ref company) = args.company {
        f.company = Some(company.clone());
    }
    if let Some(v) = args.facility_size {
        f.facility_size = v;
    }
    if let Some(v) = args.drawn_fraction {
        f.drawn_fraction = v;
    }
    if let Some(v) = args.margin_bps {
        f.drawn_rates.margin_bps = v;
    }
    if let Some(v) = args.funding_bps {
        f.drawn_rates.funding_bps = v;
    }
    if let Some(v) = args.credit_bps {
        f.drawn_rates.credit_bps = v;
    }
    if let Some(v) = args.capital_bps {
        f.drawn_rates.capital_bps = v;
    }
    if let Some(v) = args.commitment_fee_bps {
        f.undrawn_rates.commitment_fee_bps = v;
    }
    if let Some(v) = args.cf_funding_bps {
        f.undrawn_rates.funding_bps = v;
    }
    if let Some(v) = args.cf_credit_bps {
        f.undrawn_rates.credit_bps = v;
    }
    if let Some(v) = args.cf_capital_bps {
        f.undrawn_rates.capital_bps = v;
    }

    if args.cln || args.cln_size.is_some() || args.cln_cost_bps.is_some() {
        let mut note = f.cln.take().unwrap_or_default();
        if let Some(v) = args.cln_size {
            note.size = v;
        }
        if let Some(v) = args.cln_cost_bps {
            note.cost_bps = v;
        }
        f.cln = Some(note);
    }
    f
}
