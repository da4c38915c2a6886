use std::collections::BTreeMap;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub max: f64,
    pub mean: f64,
    pub min: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
}
impl Snapshot {
    pub(crate) fn fields(&self) -> [(&'static str, f64); 10] {
        [
            ("max", self.max),
            ("mean", self.mean),
            ("min", self.min),
            ("stddev", self.stddev),
            ("p50", self.p50),
            ("p75", self.p75),
            ("p95", self.p95),
            ("p98", self.p98),
            ("p99", self.p99),
            ("p999", self.p999),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Histogram {
    pub count: i64,
    pub snapshot: Snapshot,
}

/// Rates are events per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Meter {
    pub count: i64,
    pub m1_rate: f64,
    pub m5_rate: f64,
    pub m15_rate: f64,
    pub mean_rate: f64,
}

/// Snapshot values are nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timer {
    pub snapshot: Snapshot,
    pub meter: Meter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// `None` when the gauge has no current reading.
    Gauge(Option<Value>),
    Counter(i64),
    Histogram(Histogram),
    Meter(Meter),
    Timer(Timer),
}

/// Source of the metrics reported in one cycle.
pub trait MetricSet {
    fn metrics(&self) -> Vec<(String, Metric)>;
}
impl MetricSet for BTreeMap<String, Metric> {
    fn metrics(&self) -> Vec<(String, Metric)> {
        self.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
impl<F> MetricSet for F
where
    F: Fn() -> Vec<(String, Metric)>,
{
    fn metrics(&self) -> Vec<(String, Metric)> {
        self()
    }
}

/// Joins name segments with `.`, skipping empty ones.
pub fn name(base: &str, suffix: &str) -> String {
    match (base.is_empty(), suffix.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => suffix.to_string(),
        (false, false) => format!("{base}.{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(name("http.requests", "count"), "http.requests.count");
        assert_eq!(name("", "count"), "count");
        assert_eq!(name("gauge", ""), "gauge");
    }

    #[test]
    fn map_is_a_metric_set() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Metric::Counter(2));
        map.insert("a".to_string(), Metric::Gauge(Some(Value::from(1))));
        let metrics = map.metrics();
        assert_eq!(metrics[0].0, "a");
        assert_eq!(metrics[1], ("b".to_string(), Metric::Counter(2)));
    }
}
