use std::future::Future;

use anyhow::{Error, Result};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Runs named long-lived tasks; the first failure or ctrl-c cancels the rest.
pub struct Supervisor {
    shutdown: CancellationToken,
    tasks: JoinSet<(String, Result<()>)>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn<F, Fut>(&mut self, name: &'static str, factory: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let shutdown = self.shutdown.child_token();
        self.tasks.spawn(async move {
            let result = factory(shutdown).await;
            (name.to_string(), result)
        });
    }

    pub async fn run(mut self) -> Result<()> {
        let mut first_err: Option<Error> = None;

        while !self.tasks.is_empty() {
            tokio::select! {
                Some(outcome) = self.tasks.join_next() => {
                    self.handle_task_outcome(&mut first_err, outcome);
                }
                _ = tokio::signal::ctrl_c(), if !self.shutdown.is_cancelled() => {
                    tracing::info!("interrupt received, shutting down");
                    self.shutdown.cancel();
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn handle_task_outcome(
        &self,
        first_err: &mut Option<Error>,
        outcome: std::result::Result<(String, Result<()>), JoinError>,
    ) {
        match outcome {
            Ok((name, Ok(()))) => {
                tracing::info!("child `{name}` exited gracefully");
            }
            Ok((name, Err(err))) => {
                tracing::error!("child `{name}` exited with error: {err:#}");
                if first_err.is_none() {
                    *first_err = Some(err);
                }
                self.begin_shutdown();
            }
            Err(join_err) => {
                tracing::error!("child panicked: {join_err:?}");
                if first_err.is_none() {
                    *first_err = Some(join_err.into());
                }
                self.begin_shutdown();
            }
        }
    }

    fn begin_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::warn!("supervisor shutting down");
            self.shutdown.cancel();
        }
    }
}
