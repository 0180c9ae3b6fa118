//! Process runner for the long-running service mode.
//!
//! Runs the worker future until it finishes or a shutdown signal arrives
//! (SIGTERM/SIGINT), cancels it via a `CancellationToken`, then executes
//! registered closers under a timeout. The in-flight message at shutdown
//! may be abandoned between receive and delete; at-least-once delivery
//! makes that a redelivery, not a loss.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type Process = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        + Send,
>;
type Closer = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send>;

pub struct Runner {
    process: Option<Process>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            process: None,
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Sets the process to run. It receives a cancellation token and is
    /// expected to stop promptly once the token fires.
    pub fn with_process<F, Fut>(mut self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.process = Some(Box::new(|token| Box::pin(process(token))));
        self
    }

    /// Adds a cleanup step, executed after the process has stopped
    /// regardless of how it stopped.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Replaces the cancellation token, giving callers (and tests)
    /// external control over shutdown.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs the process to completion or shutdown, then the closers.
    /// Returns the exit code for the caller to pass to `process::exit`.
    pub async fn run(self) -> i32 {
        let token = self.cancellation_token;
        spawn_signal_listeners(token.clone());

        let result = match self.process {
            Some(process) => process(token.clone()).await,
            None => Ok(()),
        };

        if let Err(e) = &result {
            tracing::error!("process exited with error: {:#}", e);
            token.cancel();
        }

        if !self.closers.is_empty() {
            tracing::info!(timeout = ?self.closer_timeout, "running closers");
            if tokio::time::timeout(self.closer_timeout, run_closers(self.closers))
                .await
                .is_err()
            {
                tracing::error!("closers timed out after {:?}", self.closer_timeout);
            }
        }

        match result {
            Ok(()) => {
                tracing::info!("exiting normally");
                0
            }
            Err(_) => 1,
        }
    }
}

fn spawn_signal_listeners(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received interrupt, shutting down");
                ctrl_c_token.cancel();
            }
            Err(e) => tracing::error!("failed to install interrupt handler: {}", e),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("received SIGTERM, shutting down");
                token.cancel();
            }
            Err(e) => tracing::error!("failed to install SIGTERM handler: {}", e),
        }
    });
}

async fn run_closers(closers: Vec<Closer>) {
    for closer in closers {
        if let Err(e) = closer().await {
            tracing::error!("closer failed: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn runs_process_to_completion() {
        let code = Runner::new()
            .with_process(|_ctx| async move { Ok(()) })
            .run()
            .await;
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn cancellation_stops_process_and_runs_closers() {
        let closed = Arc::new(AtomicBool::new(false));
        let closed_flag = closed.clone();
        let token = CancellationToken::new();
        let stop = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stop.cancel();
        });

        let code = Runner::new()
            .with_process(|ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || {
                let flag = closed_flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .with_cancellation_token(token)
            .run()
            .await;

        assert_eq!(code, 0);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failing_process_yields_nonzero_exit() {
        let code = Runner::new()
            .with_process(|_ctx| async move { Err(anyhow::anyhow!("boom")) })
            .run()
            .await;
        assert_eq!(code, 1);
    }
}
