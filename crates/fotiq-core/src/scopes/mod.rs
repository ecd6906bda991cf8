//! Scope computation for rendered frames.

pub mod histogram;

pub use histogram::HistogramData;
