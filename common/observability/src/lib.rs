use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Request-pipeline metrics. Cloning shares the underlying collectors, so one
/// handle can be threaded through every request without a global.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounter,
    errors: IntCounter,
    panics: IntCounter,
    in_flight: IntGauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounter::new("requests_total", "Requests entering the pipeline")?;
        registry.register(Box::new(requests.clone()))?;

        let errors = IntCounter::new(
            "errors_total",
            "Requests whose handler chain returned an error",
        )?;
        registry.register(Box::new(errors.clone()))?;

        let panics = IntCounter::new("panics_total", "Panics recovered by the pipeline")?;
        registry.register(Box::new(panics.clone()))?;

        let in_flight = IntGauge::new("requests_in_flight", "Requests currently being handled")?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self { registry, requests, errors, panics, in_flight })
    }

    pub fn add_requests(&self) {
        self.requests.inc();
    }

    pub fn add_errors(&self) {
        self.errors.inc();
    }

    pub fn add_panics(&self) {
        self.panics.inc();
    }

    pub fn requests(&self) -> u64 {
        self.requests.get()
    }

    pub fn errors(&self) -> u64 {
        self.errors.get()
    }

    pub fn panics(&self) -> u64 {
        self.panics.get()
    }

    pub fn requests_in_flight(&self) -> i64 {
        self.in_flight.get()
    }

    /// Marks a request as in flight until the returned guard is dropped.
    pub fn in_flight(&self) -> InFlightGuard {
        self.in_flight.inc();
        InFlightGuard { gauge: self.in_flight.clone() }
    }

    /// Prometheus text exposition of every collector in this handle's registry.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}

pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_counters() {
        let metrics = Metrics::new().expect("metrics");
        let clone = metrics.clone();
        clone.add_requests();
        clone.add_errors();
        metrics.add_panics();

        assert_eq!(metrics.requests(), 1);
        assert_eq!(metrics.errors(), 1);
        assert_eq!(clone.panics(), 1);
    }

    #[test]
    fn in_flight_guard_decrements_on_drop() {
        let metrics = Metrics::new().expect("metrics");
        {
            let _a = metrics.in_flight();
            let _b = metrics.in_flight();
            assert_eq!(metrics.requests_in_flight(), 2);
        }
        assert_eq!(metrics.requests_in_flight(), 0);
    }

    #[test]
    fn render_exposes_registered_collectors() {
        let metrics = Metrics::new().expect("metrics");
        metrics.add_requests();
        let text = metrics.render().expect("render");
        assert!(text.contains("requests_total 1"));
        assert!(text.contains("panics_total 0"));
    }

    #[test]
    fn separate_handles_do_not_collide() {
        let a = Metrics::new().expect("first");
        let b = Metrics::new().expect("second");
        a.add_requests();
        assert_eq!(b.requests(), 0);
    }
}
