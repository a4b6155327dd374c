use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

/// Write side of the shutdown channel, held by the pipeline.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

/// Read side, held by the run loop.
#[derive(Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownSignal, ShutdownListener) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSignal { tx: Arc::new(tx) }, ShutdownListener { rx })
}

impl ShutdownSignal {
    /// Requests a graceful shutdown. Never blocks; repeated calls are no-ops.
    pub fn signal(&self) {
        let already = self.tx.send_replace(true);
        if !already {
            warn!("shutdown requested by the request pipeline");
        }
    }

    pub fn is_signalled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl ShutdownListener {
    /// Resolves once a shutdown has been signalled. Pends forever if every
    /// [`ShutdownSignal`] is dropped first.
    pub async fn recv(&mut self) {
        if self.rx.wait_for(|signalled| *signalled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
