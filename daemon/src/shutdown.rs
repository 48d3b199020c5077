//! Stop token for the daemon's run loop.
//!
//! The node has no shutdown awareness of its own; this only decides when
//! `run` calls `destroy`. A `watch` channel holds a single stop bit, set
//! either by SIGINT/SIGTERM or by [`ShutdownController::trigger`].

use tokio::signal;
use tokio::sync::watch;

pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Request shutdown without a signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once shutdown was triggered or the process got SIGINT/SIGTERM.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        tokio::select! {
            _ = rx.wait_for(|stop| *stop) => {}
            _ = interrupt() => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate() => { tracing::info!("received SIGTERM, shutting down"); }
        }
        self.trigger();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Never resolves if the handler cannot be installed.
async fn interrupt() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install SIGINT handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
