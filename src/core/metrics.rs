//! Run metrics
//!
//! The execution context owns one collector per run. Blocks and the engine
//! record raw samples under string ids; aggregation happens on read.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Type of aggregation to apply to collected metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationType {
    Sum,
    Avg,
    Min,
    Max,
    /// 50th percentile (median)
    P50,
    P95,
    P99,
}

/// Thread-safe collector of raw metric samples.
///
/// Clones share the underlying storage, so a collector handed to a block
/// records into the run's metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<HashMap<String, Vec<f64>>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a metric value
    ///
    /// # Examples
    /// ```
    /// use block_pipeline::core::metrics::MetricsCollector;
    ///
    /// let collector = MetricsCollector::new();
    /// collector.record("block.loader.execution_time_ms", 42.5);
    /// assert_eq!(collector.get_count("block.loader.execution_time_ms"), 1);
    /// ```
    pub fn record(&self, metric_id: &str, value: f64) {
        self.metrics
            .lock()
            .entry(metric_id.to_string())
            .or_default()
            .push(value);
    }

    /// Increment a counter metric by 1
    pub fn increment(&self, metric_id: &str) {
        self.record(metric_id, 1.0);
    }

    /// All recorded values for a metric, empty if none were recorded
    pub fn get_values(&self, metric_id: &str) -> Vec<f64> {
        self.metrics.lock().get(metric_id).cloned().unwrap_or_default()
    }

    /// Aggregate metric values; `None` if nothing was recorded
    ///
    /// # Examples
    /// ```
    /// use block_pipeline::core::metrics::{AggregationType, MetricsCollector};
    ///
    /// let collector = MetricsCollector::new();
    /// collector.record("layout.rows", 10.0);
    /// collector.record("layout.rows", 20.0);
    /// collector.record("layout.rows", 30.0);
    ///
    /// assert_eq!(collector.aggregate("layout.rows", AggregationType::Avg), Some(20.0));
    /// assert_eq!(collector.aggregate("layout.rows", AggregationType::Max), Some(30.0));
    /// ```
    pub fn aggregate(&self, metric_id: &str, agg_type: AggregationType) -> Option<f64> {
        let values = self.get_values(metric_id);
        if values.is_empty() {
            return None;
        }

        match agg_type {
            AggregationType::Sum => Some(values.iter().sum()),
            AggregationType::Avg => Some(values.iter().sum::<f64>() / values.len() as f64),
            AggregationType::Min => values.iter().copied().reduce(f64::min),
            AggregationType::Max => values.iter().copied().reduce(f64::max),
            AggregationType::P50 => Self::percentile(&values, 0.5),
            AggregationType::P95 => Self::percentile(&values, 0.95),
            AggregationType::P99 => Self::percentile(&values, 0.99),
        }
    }

    /// Percentile with linear interpolation between the nearest ranks
    fn percentile(values: &[f64], p: f64) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let idx = (sorted.len() as f64 - 1.0) * p;
        let idx_lower = idx.floor() as usize;
        let idx_upper = idx.ceil() as usize;

        if idx_lower == idx_upper {
            sorted.get(idx_lower).copied()
        } else {
            let lower = sorted[idx_lower];
            let upper = sorted[idx_upper];
            Some(lower + (upper - lower) * (idx - idx_lower as f64))
        }
    }

    pub fn clear(&self) {
        self.metrics.lock().clear();
    }

    /// Metric ids with at least one sample, sorted
    pub fn metric_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.metrics.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn get_count(&self, metric_id: &str) -> usize {
        self.metrics.lock().get(metric_id).map_or(0, Vec::len)
    }

    /// Sum of every metric, keyed by id
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.metrics
            .lock()
            .iter()
            .map(|(id, values)| (id.clone(), values.iter().sum()))
            .collect()
    }
}
