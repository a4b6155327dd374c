use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::{Extensions, StatusCode};
use chrono::{DateTime, Utc};
use common_observability::Metrics;
use uuid::Uuid;

use crate::error::Error;

const MISSING_VALUES: &str = "web value missing from context";
const EMPTY_TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// State for a single in-flight request. Lives in that request's extensions
/// and nowhere else.
#[derive(Debug)]
pub struct RequestContext {
    pub trace_id: Uuid,
    pub now: DateTime<Utc>,
    started: Instant,
    status: AtomicU16,
}

impl RequestContext {
    fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            now: Utc::now(),
            started: Instant::now(),
            status: AtomicU16::new(0),
        }
    }

    /// Status recorded for the response, if one has been written.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status.load(Ordering::Relaxed)).ok()
    }

    pub fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Stamps a fresh context onto `req` and returns a handle to it.
pub fn begin(req: &mut Request) -> Arc<RequestContext> {
    let values = Arc::new(RequestContext::new());
    req.extensions_mut().insert(values.clone());
    values
}

/// The request's context. A missing context means the pipeline was wired
/// wrong, which is fatal.
pub fn get(extensions: &Extensions) -> Result<Arc<RequestContext>, Error> {
    extensions
        .get::<Arc<RequestContext>>()
        .cloned()
        .ok_or_else(|| Error::shutdown(MISSING_VALUES))
}

pub fn set_status(extensions: &Extensions, status: StatusCode) -> Result<(), Error> {
    get(extensions)?.set_status(status);
    Ok(())
}

/// Trace id for log lines; never fails.
pub fn trace_id(extensions: &Extensions) -> String {
    extensions
        .get::<Arc<RequestContext>>()
        .map(|values| values.trace_id.to_string())
        .unwrap_or_else(|| EMPTY_TRACE_ID.to_string())
}

/// Metrics handle the pipeline threaded into this request.
pub fn metrics(extensions: &Extensions) -> Option<&Metrics> {
    extensions.get::<Metrics>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn begin_stores_a_fresh_context() {
        let mut first = Request::new(Body::empty());
        let mut second = Request::new(Body::empty());
        let a = begin(&mut first);
        let b = begin(&mut second);

        assert_ne!(a.trace_id, b.trace_id);
        assert!(Arc::ptr_eq(&a, &get(first.extensions()).expect("context")));
        assert_eq!(a.status(), None);
    }

    #[test]
    fn missing_context_is_fatal() {
        let req = Request::new(Body::empty());
        let err = get(req.extensions()).expect_err("missing");
        assert!(err.is_shutdown());
        assert!(set_status(req.extensions(), StatusCode::OK).is_err());
        assert_eq!(trace_id(req.extensions()), EMPTY_TRACE_ID);
    }

    #[test]
    fn last_status_write_wins() {
        let mut req = Request::new(Body::empty());
        let values = begin(&mut req);
        set_status(req.extensions(), StatusCode::CREATED).expect("set");
        set_status(req.extensions(), StatusCode::NOT_FOUND).expect("set");
        assert_eq!(values.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(trace_id(req.extensions()), values.trace_id.to_string());
    }
}
