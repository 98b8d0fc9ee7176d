//! Revolving credit facility economics.

pub mod economics;
pub mod report;

#[cfg(feature = "utilization")]
pub mod utilization;
