use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// A concrete label-name to label-value mapping for one metric mutation.
pub type Labels = HashMap<String, String>;

/// Labels applied to every metric an exporter touches, such as `env` or `service`.
///
/// Names are kept ordered so that the composed label-name list is stable across exporters
/// built from the same configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardLabels(BTreeMap<String, String>);

impl StandardLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for StandardLabels
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseStandardLabelsError(pub String);

impl fmt::Display for ParseStandardLabelsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid standard label pair {:?}, expected name=value", self.0)
    }
}

impl std::error::Error for ParseStandardLabelsError {}

/// Parses `name=value,name=value`. An empty string yields no labels.
impl FromStr for StandardLabels {
    type Err = ParseStandardLabelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut labels = BTreeMap::new();

        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| ParseStandardLabelsError(pair.to_owned()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ParseStandardLabelsError(pair.to_owned()));
            }
            labels.insert(name.to_owned(), value.trim().to_owned());
        }

        Ok(Self(labels))
    }
}

/// Full label-name list for a metric: its own names first, then the standard names.
///
/// Names are not deduplicated. An overlap is rejected by the registry when the metric is
/// constructed.
pub fn merge_label_names(label_names: &[&str], standard: &StandardLabels) -> Vec<String> {
    label_names
        .iter()
        .copied()
        .chain(standard.names())
        .map(str::to_owned)
        .collect()
}

/// Label values for a mutation: the standard labels plus the metric's own labels, the latter
/// winning on a name collision.
pub fn merge_labels<I, K, V>(labels: I, standard: &StandardLabels) -> Labels
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut merged: Labels = standard
        .iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    merged.extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
    merged
}

/// Borrowed view of `labels` in the shape the `prometheus` vec metrics expect.
pub(crate) fn as_label_refs(labels: &Labels) -> HashMap<&str, &str> {
    labels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}
