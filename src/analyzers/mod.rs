//! The curve normalization pipeline and the aggregations behind the
//! dashboard views.
//!
//! Raw observations are bucketed by daily case count, accumulated per
//! location over qualifying days, aligned into "days since threshold"
//! curves and restricted to the most affected locations. The remaining
//! modules derive the monthly, per-population and daily series.

pub mod accumulate;
pub mod align;
pub mod bucket;
pub mod curves;
pub mod daily;
pub mod monthly;
pub mod rank;
pub mod rates;
pub mod types;
