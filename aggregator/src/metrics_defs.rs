use shared::metrics_defs::{MetricDef, MetricType};

pub const AGGREGATION_ROWS: MetricDef = MetricDef {
    name: "aggregation.rows",
    metric_type: MetricType::Counter,
    description: "Rows consumed by the fold engine.",
};

pub const AGGREGATION_FEATURES: MetricDef = MetricDef {
    name: "aggregation.features",
    metric_type: MetricType::Counter,
    description: "Feature configurations produced. Tagged with shape.",
};

pub const AGGREGATION_DURATION: MetricDef = MetricDef {
    name: "aggregation.duration",
    metric_type: MetricType::Histogram,
    description: "Aggregation duration in seconds. Tagged with shape.",
};

pub const AGGREGATION_ERRORS: MetricDef = MetricDef {
    name: "aggregation.errors",
    metric_type: MetricType::Counter,
    description: "Aggregation calls aborted by a data-integrity error.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    AGGREGATION_ROWS,
    AGGREGATION_FEATURES,
    AGGREGATION_DURATION,
    AGGREGATION_ERRORS,
];
