use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct RtcMetrics {
    registry: Registry,
    token_requests: IntCounterVec,
    token_lifetimes: HistogramVec,
}

impl RtcMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let token_requests = IntCounterVec::new(
            Opts::new(
                "rtc_token_requests_total",
                "Count of RTC token requests grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(token_requests.clone()))?;

        let token_lifetimes = HistogramVec::new(
            HistogramOpts::new(
                "rtc_token_lifetime_seconds",
                "Granted privilege lifetime of issued RTC tokens",
            )
            .buckets(vec![60.0, 300.0, 900.0, 3600.0, 14400.0, 86400.0, 604800.0]),
            &["role"],
        )?;
        registry.register(Box::new(token_lifetimes.clone()))?;

        Ok(Self {
            registry,
            token_requests,
            token_lifetimes,
        })
    }

    pub fn token_request(&self, outcome: &str) {
        self.token_requests.with_label_values(&[outcome]).inc();
    }

    pub fn token_issued(&self, role: &str, lifetime_seconds: u64) {
        self.token_requests.with_label_values(&["success"]).inc();
        self.token_lifetimes
            .with_label_values(&[role])
            .observe(lifetime_seconds as f64);
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
