use prometheus::{CounterVec, GaugeVec, HistogramVec};

use crate::error::Error;
use crate::labels::{merge_label_names, StandardLabels};
use crate::registry::{Metric, MetricKind, MetricSpec, MetricsRegistry};

/// Histogram buckets, in seconds, used when an exporter is not given an override.
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.020, 0.030, 0.040, 0.050, 0.100, 0.200, 0.500, 1.0, 2.0, 5.0, 10.0,
];

/// Static description of one exported metric, without standard labels.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub help: &'static str,
    pub label_names: &'static [&'static str],
}

impl MetricDef {
    pub const fn new(
        name: &'static str,
        help: &'static str,
        label_names: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            label_names,
        }
    }

    pub fn counter(
        &self,
        registry: &MetricsRegistry,
        standard: &StandardLabels,
    ) -> Result<CounterVec, Error> {
        match registry.get_or_register(&self.spec(MetricKind::Counter, standard, &[]))? {
            Metric::Counter(counter) => Ok(counter),
            other => Err(self.mismatch(MetricKind::Counter, other.kind())),
        }
    }

    pub fn gauge(
        &self,
        registry: &MetricsRegistry,
        standard: &StandardLabels,
    ) -> Result<GaugeVec, Error> {
        match registry.get_or_register(&self.spec(MetricKind::Gauge, standard, &[]))? {
            Metric::Gauge(gauge) => Ok(gauge),
            other => Err(self.mismatch(MetricKind::Gauge, other.kind())),
        }
    }

    pub fn histogram(
        &self,
        registry: &MetricsRegistry,
        standard: &StandardLabels,
        buckets: &[f64],
    ) -> Result<HistogramVec, Error> {
        match registry.get_or_register(&self.spec(MetricKind::Histogram, standard, buckets))? {
            Metric::Histogram(histogram) => Ok(histogram),
            other => Err(self.mismatch(MetricKind::Histogram, other.kind())),
        }
    }

    fn spec<'a>(
        &self,
        kind: MetricKind,
        standard: &StandardLabels,
        buckets: &'a [f64],
    ) -> MetricSpec<'a> {
        MetricSpec {
            name: self.name,
            help: self.help,
            kind,
            label_names: merge_label_names(self.label_names, standard),
            buckets,
        }
    }

    fn mismatch(&self, expected: MetricKind, found: MetricKind) -> Error {
        Error::KindMismatch {
            name: self.name.to_owned(),
            expected,
            found,
        }
    }
}

/// Milliseconds as reported by the client, converted to the seconds histograms observe.
pub(crate) fn ms_to_seconds(ms: f64) -> f64 {
    ms / 1000.0
}
