use crate::catalog::DEFAULT_BUCKETS;
use crate::labels::StandardLabels;

/// Construction options for a [`ConsumerExporter`](crate::ConsumerExporter).
///
/// Bucket overrides left as `None`, or set to an empty list, fall back to [`DEFAULT_BUCKETS`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerExporterOptions {
    pub standard_labels: StandardLabels,
    pub request_duration_buckets: Option<Vec<f64>>,
    pub batch_latency_buckets: Option<Vec<f64>>,
    pub batch_duration_buckets: Option<Vec<f64>>,
    pub fetch_latency_buckets: Option<Vec<f64>>,
    pub fetch_duration_buckets: Option<Vec<f64>>,
}

/// Construction options for a [`ProducerExporter`](crate::ProducerExporter).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProducerExporterOptions {
    pub standard_labels: StandardLabels,
    pub request_duration_buckets: Option<Vec<f64>>,
}

pub(crate) fn buckets_or_default(buckets: &Option<Vec<f64>>) -> &[f64] {
    match buckets.as_deref() {
        Some(buckets) if !buckets.is_empty() => buckets,
        _ => DEFAULT_BUCKETS,
    }
}
