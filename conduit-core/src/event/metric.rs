//! 指标事件（MetricEvent）
//!
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 指标类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 指标事件：名称、数值、标签（键唯一）与指标类型，渲染为名称
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricEvent {
    name: String,
    value: f64,
    labels: BTreeMap<String, String>,
    kind: MetricKind,
}

impl MetricEvent {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        labels: BTreeMap<String, String>,
        kind: MetricKind,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            labels,
            kind,
        }
    }

    /// 无标签的计数器
    pub fn counter(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, BTreeMap::new(), MetricKind::Counter)
    }

    /// 无标签的仪表
    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, BTreeMap::new(), MetricKind::Gauge)
    }

    /// 追加一个标签，同名键覆盖
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn metric_kind(&self) -> MetricKind {
        self.kind
    }
}

impl fmt::Display for MetricEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_constructor_values() {
        let labels = BTreeMap::from([
            ("env".to_string(), "test".to_string()),
            ("service".to_string(), "api".to_string()),
        ]);
        let m = MetricEvent::new("test_metric", 42.0, labels.clone(), MetricKind::Counter);

        assert_eq!(m.name(), "test_metric");
        assert_eq!(m.value(), 42.0);
        assert_eq!(m.labels(), &labels);
        assert_eq!(m.metric_kind(), MetricKind::Counter);
        assert_eq!(m.to_string(), "test_metric");
    }

    #[test]
    fn label_keys_are_unique() {
        let m = MetricEvent::gauge("queue_depth", 3.0)
            .with_label("stage", "buffer")
            .with_label("stage", "map");

        assert_eq!(m.labels().len(), 1);
        assert_eq!(m.labels().get("stage").map(String::as_str), Some("map"));
    }

    #[test]
    fn kind_names() {
        assert_eq!(MetricKind::Counter.as_str(), "counter");
        assert_eq!(MetricKind::Gauge.as_str(), "gauge");
        assert_eq!(MetricKind::Histogram.as_str(), "histogram");
        assert_eq!(MetricKind::Summary.as_str(), "summary");
    }
}
