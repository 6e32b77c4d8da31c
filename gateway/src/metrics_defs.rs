//! Metrics definitions for the gateway.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "gateway.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time to answer a client request in seconds, by route and status",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "gateway.requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of client requests currently being handled",
};

pub const UPSTREAM_FAILURES: MetricDef = MetricDef {
    name: "gateway.upstream.failures",
    metric_type: MetricType::Counter,
    description: "Relayed calls that never got an upstream response, by route",
};

pub const AGGREGATE_LEG_DURATION: MetricDef = MetricDef {
    name: "gateway.aggregate.leg.duration",
    metric_type: MetricType::Histogram,
    description: "Time for a single aggregate leg in seconds, by leg",
};

pub const AGGREGATE_LEG_FAILURES: MetricDef = MetricDef {
    name: "gateway.aggregate.leg.failures",
    metric_type: MetricType::Counter,
    description: "Number of failed aggregate legs, by leg",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    UPSTREAM_FAILURES,
    AGGREGATE_LEG_DURATION,
    AGGREGATE_LEG_FAILURES,
];
