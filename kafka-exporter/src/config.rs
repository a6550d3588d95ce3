use std::fmt;
use std::str::FromStr;

use envconfig::Envconfig;

use crate::labels::StandardLabels;
use crate::options::{ConsumerExporterOptions, ProducerExporterOptions};

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "KAFKA_METRICS_STANDARD_LABELS", default = "")]
    pub standard_labels: StandardLabels,

    /// Applies to both consumer and producer request histograms.
    #[envconfig(from = "KAFKA_METRICS_REQUEST_DURATION_BUCKETS")]
    pub request_duration_buckets: Option<Buckets>,

    #[envconfig(from = "KAFKA_METRICS_FETCH_LATENCY_BUCKETS")]
    pub fetch_latency_buckets: Option<Buckets>,

    #[envconfig(from = "KAFKA_METRICS_FETCH_DURATION_BUCKETS")]
    pub fetch_duration_buckets: Option<Buckets>,

    #[envconfig(from = "KAFKA_METRICS_BATCH_LATENCY_BUCKETS")]
    pub batch_latency_buckets: Option<Buckets>,

    #[envconfig(from = "KAFKA_METRICS_BATCH_DURATION_BUCKETS")]
    pub batch_duration_buckets: Option<Buckets>,
}

impl Config {
    pub fn consumer_options(&self) -> ConsumerExporterOptions {
        ConsumerExporterOptions {
            standard_labels: self.standard_labels.clone(),
            request_duration_buckets: Buckets::to_vec(&self.request_duration_buckets),
            batch_latency_buckets: Buckets::to_vec(&self.batch_latency_buckets),
            batch_duration_buckets: Buckets::to_vec(&self.batch_duration_buckets),
            fetch_latency_buckets: Buckets::to_vec(&self.fetch_latency_buckets),
            fetch_duration_buckets: Buckets::to_vec(&self.fetch_duration_buckets),
        }
    }

    pub fn producer_options(&self) -> ProducerExporterOptions {
        ProducerExporterOptions {
            standard_labels: self.standard_labels.clone(),
            request_duration_buckets: Buckets::to_vec(&self.request_duration_buckets),
        }
    }
}

/// Histogram bucket upper bounds in seconds, parsed from a comma-separated list.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets(pub Vec<f64>);

impl Buckets {
    fn to_vec(buckets: &Option<Buckets>) -> Option<Vec<f64>> {
        buckets.as_ref().map(|b| b.0.clone())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseBucketsError(pub String);

impl fmt::Display for ParseBucketsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid histogram buckets: {}", self.0)
    }
}

impl std::error::Error for ParseBucketsError {}

impl FromStr for Buckets {
    type Err = ParseBucketsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let buckets = s
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(|b| {
                b.parse::<f64>()
                    .map_err(|_| ParseBucketsError(format!("{b:?} is not a number")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if buckets.is_empty() {
            return Err(ParseBucketsError("no buckets given".to_owned()));
        }
        if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ParseBucketsError(format!(
                "{buckets:?} is not strictly increasing"
            )));
        }

        Ok(Buckets(buckets))
    }
}
