//! Metrics definitions for the projects store.

use shared::metrics_defs::{MetricDef, MetricType};

pub const RECORDS_CREATED: MetricDef = MetricDef {
    name: "projects.records.created",
    metric_type: MetricType::Counter,
    description: "Number of projects and batches created, by kind",
};

pub const RECORDS_DELETED: MetricDef = MetricDef {
    name: "projects.records.deleted",
    metric_type: MetricType::Counter,
    description: "Number of projects and batches actually removed, by kind",
};

pub const ALL_METRICS: &[MetricDef] = &[RECORDS_CREATED, RECORDS_DELETED];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_unique() {
        shared::metrics_defs::assert_unique_names(ALL_METRICS);
    }
}
