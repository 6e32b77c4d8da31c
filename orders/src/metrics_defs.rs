//! Metrics definitions for the orders store.

use shared::metrics_defs::{MetricDef, MetricType};

pub const ORDERS_CREATED: MetricDef = MetricDef {
    name: "orders.created",
    metric_type: MetricType::Counter,
    description: "Number of orders created",
};

pub const ORDERS_UPDATED: MetricDef = MetricDef {
    name: "orders.updated",
    metric_type: MetricType::Counter,
    description: "Number of orders updated, by resulting status",
};

pub const ORDERS_DELETED: MetricDef = MetricDef {
    name: "orders.deleted",
    metric_type: MetricType::Counter,
    description: "Number of orders deleted",
};

pub const ALL_METRICS: &[MetricDef] = &[ORDERS_CREATED, ORDERS_UPDATED, ORDERS_DELETED];
