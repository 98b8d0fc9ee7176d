use napi::Result as NapiResult;
use napi_derive::napi;

use rcf_economics_core::rcf::{economics, report, utilization};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// RCF economics
// ---------------------------------------------------------------------------

#[napi]
pub fn rcf_economics(input_json: String) -> NapiResult<String> {
    let input: economics::FacilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = economics::calculate_rcf_economics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn rcf_report(input_json: String) -> NapiResult<String> {
    let input: economics::FacilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    economics::validate_facility_input(&input).map_err(to_napi_error)?;
    let result = economics::compute(&input).map_err(to_napi_error)?;
    serde_json::to_string(&report::build_report(&result)).map_err(to_napi_error)
}

#[napi]
pub fn utilization_sweep(input_json: String) -> NapiResult<String> {
    let input: utilization::UtilizationSweepInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = utilization::sweep_utilization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Formatted currency amount (two decimals, thousands separators) for display.
#[napi]
pub fn format_amount(amount: String) -> NapiResult<String> {
    let value: rust_decimal::Decimal = amount.trim().parse().map_err(to_napi_error)?;
    Ok(report::format_amount(value))
}
