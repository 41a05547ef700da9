use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "lookup.request.duration",
    metric_type: MetricType::Histogram,
    description: "Lookup request duration in seconds. Tagged with endpoint, status.",
};

pub const CACHE_HIT: MetricDef = MetricDef {
    name: "lookup.cache.hit",
    metric_type: MetricType::Counter,
    description: "First-page profile lookups served from the cache",
};

pub const CACHE_MISS: MetricDef = MetricDef {
    name: "lookup.cache.miss",
    metric_type: MetricType::Counter,
    description: "First-page profile lookups that went to the lookup API",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUEST_DURATION, CACHE_HIT, CACHE_MISS];
