//! Metrics definitions for the event functions.

use shared::metrics_defs::{MetricDef, MetricType};

pub const DOWNSTREAM_DURATION: MetricDef = MetricDef {
    name: "functions.downstream.duration",
    metric_type: MetricType::Histogram,
    description: "Time for a downstream store call in seconds, by function and outcome",
};

pub const DOWNSTREAM_FAILURES: MetricDef = MetricDef {
    name: "functions.downstream.failures",
    metric_type: MetricType::Counter,
    description: "Downstream store calls that failed, by function",
};

pub const EVENTS_PROCESSED: MetricDef = MetricDef {
    name: "functions.events.processed",
    metric_type: MetricType::Counter,
    description: "Events handled successfully, by function",
};

pub const ALL_METRICS: &[MetricDef] = &[DOWNSTREAM_DURATION, DOWNSTREAM_FAILURES, EVENTS_PROCESSED];
