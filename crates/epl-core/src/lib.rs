// Shared foundations: configuration, the metric catalogue, and tabular
// parsing helpers used by the loaders in `epl-stats`.

pub mod config;
pub mod metric;
pub mod table;

pub use metric::{Metric, MetricValues};
