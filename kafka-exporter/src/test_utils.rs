use std::collections::BTreeMap;

use prometheus::proto::Metric;

use crate::registry::MetricsRegistry;

/// Find the series of `name` whose labels are exactly `labels`.
pub fn find_series(
    registry: &MetricsRegistry,
    name: &str,
    labels: &[(&str, &str)],
) -> Option<Metric> {
    let wanted: BTreeMap<&str, &str> = labels.iter().copied().collect();
    let family = registry
        .gather()
        .into_iter()
        .find(|family| family.get_name() == name)?;

    family
        .get_metric()
        .iter()
        .find(|metric| {
            let found: BTreeMap<&str, &str> = metric
                .get_label()
                .iter()
                .map(|pair| (pair.get_name(), pair.get_value()))
                .collect();
            found == wanted
        })
        .cloned()
}

pub fn counter_value(registry: &MetricsRegistry, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    find_series(registry, name, labels).map(|m| m.get_counter().get_value())
}

pub fn gauge_value(registry: &MetricsRegistry, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    find_series(registry, name, labels).map(|m| m.get_gauge().get_value())
}

/// Sample count and sum of a histogram series.
pub fn histogram_samples(
    registry: &MetricsRegistry,
    name: &str,
    labels: &[(&str, &str)],
) -> Option<(u64, f64)> {
    find_series(registry, name, labels).map(|m| {
        let histogram = m.get_histogram();
        (histogram.get_sample_count(), histogram.get_sample_sum())
    })
}
