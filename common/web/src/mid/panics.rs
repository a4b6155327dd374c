use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use axum::extract::Request;
use futures_util::FutureExt;

use crate::context;
use crate::error::Error;
use crate::handler::{from_fn, Handler, Middleware};

thread_local! {
    static LAST_PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Installs a process-wide panic hook that records where a panic happened
/// while the panicking stack is still intact. [`panics`] attaches that trace to
/// the [`Error::Panic`] it produces. The previous hook keeps running, so the
/// default stderr report is unchanged. Calling this more than once is a no-op.
pub fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string());
            let trace = format!("panicked at {location}\n{}", Backtrace::force_capture());
            LAST_PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// Turns a panic anywhere inside the chain into [`Error::Panic`]. Must be the
/// outermost layer so nothing it wraps can take the task down.
pub fn panics() -> Middleware {
    from_fn(|req: Request, next: Handler| async move {
        let metrics = context::metrics(req.extensions()).cloned();

        // Drop anything left over from a panic this thread already handled.
        take_recorded_trace();

        match AssertUnwindSafe(async move { next(req).await }).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                if let Some(metrics) = metrics {
                    metrics.add_panics();
                }
                // The hook ran on this thread just before unwinding reached us.
                let trace = take_recorded_trace()
                    .unwrap_or_else(|| Backtrace::force_capture().to_string());
                Err(Error::Panic {
                    message: panic_message(payload.as_ref()),
                    trace,
                })
            }
        }
    })
}

fn take_recorded_trace() -> Option<String> {
    LAST_PANIC_TRACE.with(|slot| slot.borrow_mut().take())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
