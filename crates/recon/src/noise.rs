use crate::config::FilterConfig;
use crate::model::SourceTable;

/// Drops vendor/metadata columns before classification.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    markers: Vec<String>,
}

impl NoiseFilter {
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.noise_markers.clone())
    }

    /// Raw, case-sensitive substring test. No trimming or folding.
    pub fn is_noise(&self, label: &str) -> bool {
        self.markers.iter().any(|m| label.contains(m.as_str()))
    }

    /// Labels that survive the filter, in their original order.
    pub fn retained_labels<'a>(&self, labels: &'a [String]) -> Vec<&'a str> {
        labels
            .iter()
            .filter(|l| !self.is_noise(l))
            .map(|l| l.as_str())
            .collect()
    }

    /// Remove noise columns (header and values). Returns the filtered table
    /// and the labels of the dropped columns.
    pub fn apply(&self, table: SourceTable) -> (SourceTable, Vec<String>) {
        let labels = table.labels();
        // Retained labels are an ordered subsequence of the columns, and a
        // noise label never equals a retained one.
        let mut retained = self.retained_labels(&labels).into_iter().peekable();
        let mut dropped = Vec::new();
        let table = table.retain_columns(|col| {
            if retained.next_if_eq(&col.label.as_str()).is_some() {
                true
            } else {
                dropped.push(col.label.clone());
                false
            }
        });
        if !dropped.is_empty() {
            log::debug!("dropped noise column(s): {:?}", dropped);
        }
        (table, dropped)
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}
