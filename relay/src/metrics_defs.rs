use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "relay.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time until response headers are sent, in seconds. Tagged with status.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "relay.requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of relay requests waiting on upstream headers",
};

pub const UPSTREAM_RANGE_RETRIES: MetricDef = MetricDef {
    name: "relay.upstream.range_retries",
    metric_type: MetricType::Counter,
    description: "Number of requests retried without Range after a 416",
};

pub const UPSTREAM_ERRORS: MetricDef = MetricDef {
    name: "relay.upstream.errors",
    metric_type: MetricType::Counter,
    description: "Failed relay attempts. Tagged with kind.",
};

pub const BYTES_RELAYED: MetricDef = MetricDef {
    name: "relay.bytes",
    metric_type: MetricType::Counter,
    description: "Media bytes streamed to clients",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    UPSTREAM_RANGE_RETRIES,
    UPSTREAM_ERRORS,
    BYTES_RELAYED,
];
