use shared::metrics_defs::{MetricDef, MetricType};

pub const DISPATCH_ACCEPTED: MetricDef = MetricDef {
    name: "dispatch.accepted",
    metric_type: MetricType::Counter,
    description: "Accept-list entries received by the dispatcher. Tagged with recognized.",
};

pub const PIPELINE_OUTCOME: MetricDef = MetricDef {
    name: "pipeline.outcome",
    metric_type: MetricType::Counter,
    description: "Finished pipelines. Tagged with function, outcome.",
};

pub const FETCH_DURATION: MetricDef = MetricDef {
    name: "fetch.duration",
    metric_type: MetricType::Histogram,
    description: "OData request duration in seconds, body included. Tagged with api.",
};

pub const ALL_METRICS: &[MetricDef] = &[DISPATCH_ACCEPTED, PIPELINE_OUTCOME, FETCH_DURATION];
