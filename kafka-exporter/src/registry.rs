use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, TextEncoder};
use tracing::{debug, warn};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        };
        f.write_str(kind)
    }
}

/// A labelled metric family stored in a [`MetricsRegistry`].
///
/// Cloning is cheap and every clone updates the same underlying series.
#[derive(Clone)]
pub enum Metric {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Histogram(_) => MetricKind::Histogram,
        }
    }

    pub fn label_names(&self) -> Vec<String> {
        let descs = match self {
            Metric::Counter(m) => m.desc(),
            Metric::Gauge(m) => m.desc(),
            Metric::Histogram(m) => m.desc(),
        };
        descs
            .first()
            .map(|desc| desc.variable_labels.clone())
            .unwrap_or_default()
    }

    fn collector(&self) -> Box<dyn Collector> {
        match self {
            Metric::Counter(m) => Box::new(m.clone()),
            Metric::Gauge(m) => Box::new(m.clone()),
            Metric::Histogram(m) => Box::new(m.clone()),
        }
    }
}

/// Everything needed to construct a metric family, including the standard label names.
#[derive(Debug, Clone)]
pub struct MetricSpec<'a> {
    pub name: &'a str,
    pub help: &'a str,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
    /// Only read for histograms.
    pub buckets: &'a [f64],
}

impl MetricSpec<'_> {
    fn build(&self) -> Result<Metric, prometheus::Error> {
        let label_names: Vec<&str> = self.label_names.iter().map(String::as_str).collect();

        let metric = match self.kind {
            MetricKind::Counter => {
                Metric::Counter(CounterVec::new(Opts::new(self.name, self.help), &label_names)?)
            }
            MetricKind::Gauge => {
                Metric::Gauge(GaugeVec::new(Opts::new(self.name, self.help), &label_names)?)
            }
            MetricKind::Histogram => Metric::Histogram(HistogramVec::new(
                HistogramOpts::new(self.name, self.help).buckets(self.buckets.to_vec()),
                &label_names,
            )?),
        };

        Ok(metric)
    }
}

struct Registered {
    metric: Metric,
    buckets: Option<Vec<f64>>,
}

#[derive(Default)]
struct Inner {
    registry: prometheus::Registry,
    metrics: Mutex<HashMap<String, Registered>>,
}

/// Shared store of metric families, addressable by name.
///
/// Clones share the same storage, so several exporters can report into one registry and a
/// scrape sees all of them.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<Inner>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing `prometheus` registry. Only metrics registered through this handle can
    /// be looked up by name.
    pub fn from_registry(registry: prometheus::Registry) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                metrics: Mutex::default(),
            }),
        }
    }

    pub fn prometheus(&self) -> &prometheus::Registry {
        &self.inner.registry
    }

    pub fn get_single_metric(&self, name: &str) -> Option<Metric> {
        self.metrics()
            .get(name)
            .map(|registered| registered.metric.clone())
    }

    /// Register a metric family built elsewhere. Fails if the name is already taken.
    pub fn register(&self, metric: Metric) -> Result<(), Error> {
        let mut metrics = self.metrics();
        self.insert(&mut metrics, metric, None)
    }

    /// Return the metric registered under `spec.name`, constructing and registering it first
    /// if it does not exist yet.
    ///
    /// An existing metric must match the expected kind and label names. Lookup and insertion
    /// happen under one lock, so exporters racing to construct the same metric end up sharing
    /// a single family.
    pub fn get_or_register(&self, spec: &MetricSpec<'_>) -> Result<Metric, Error> {
        let mut metrics = self.metrics();

        if let Some(existing) = metrics.get(spec.name) {
            let found = existing.metric.kind();
            if found != spec.kind {
                return Err(Error::KindMismatch {
                    name: spec.name.to_owned(),
                    expected: spec.kind,
                    found,
                });
            }

            let found_labels = existing.metric.label_names();
            if found_labels != spec.label_names {
                return Err(Error::LabelNamesMismatch {
                    name: spec.name.to_owned(),
                    expected: spec.label_names.clone(),
                    found: found_labels,
                });
            }

            if let Some(buckets) = &existing.buckets {
                if buckets.as_slice() != spec.buckets {
                    warn!(
                        name = spec.name,
                        registered = ?buckets,
                        requested = ?spec.buckets,
                        "histogram already registered with different buckets, keeping the registered ones"
                    );
                }
            }

            debug!(name = spec.name, kind = %found, "reusing registered metric");
            return Ok(existing.metric.clone());
        }

        let metric = spec.build()?;
        let buckets = (spec.kind == MetricKind::Histogram).then(|| spec.buckets.to_vec());
        self.insert(&mut metrics, metric.clone(), buckets)?;
        debug!(name = spec.name, kind = %spec.kind, "registered metric");

        Ok(metric)
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.inner.registry.gather()
    }

    /// Render every registered family in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn insert(
        &self,
        metrics: &mut HashMap<String, Registered>,
        metric: Metric,
        buckets: Option<Vec<f64>>,
    ) -> Result<(), Error> {
        let name = metric
            .collector()
            .desc()
            .first()
            .map(|desc| desc.fq_name.clone())
            .unwrap_or_default();

        self.inner.registry.register(metric.collector())?;
        metrics.insert(name, Registered { metric, buckets });

        Ok(())
    }

    fn metrics(&self) -> MutexGuard<'_, HashMap<String, Registered>> {
        self.inner
            .metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
