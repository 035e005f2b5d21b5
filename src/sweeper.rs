//! Periodic session expiry.
//!
//! Repositories never schedule their own sweeps. The sweeper owns that timer
//! and drives a [`PruneExpiredSessionsAction`] on a fixed interval, so it can
//! be stopped before the repository is closed.
//!
//! ```rust,ignore
//! use photosite::actions::PruneExpiredSessionsAction;
//! use photosite::spawn_sweeper;
//!
//! let action = PruneExpiredSessionsAction::from_config(sessions.clone(), &config);
//! let sweeper = spawn_sweeper(action, config.sweep_interval);
//!
//! // on shutdown
//! sweeper.stop().await;
//! sessions.close().await?;
//! ```

use chrono::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::SessionRepository;
use crate::actions::PruneExpiredSessionsAction;

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<u64>,
}

impl SweeperHandle {
    /// Stops the sweeper and waits for an in-flight sweep to finish.
    ///
    /// Returns the number of sweeps that completed successfully.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(sweeps) => sweeps,
            Err(e) => {
                log::error!(
                    target: "photosite::session",
                    "msg=\"sweeper task failed\", error={e}"
                );
                0
            }
        }
    }
}

/// Spawns a task that runs `action` every `interval`, starting immediately.
///
/// A failed sweep is logged and retried on the next tick. Dropping the
/// handle also stops the task. Must be called from within a tokio runtime.
pub fn spawn_sweeper<S>(action: PruneExpiredSessionsAction<S>, interval: Duration) -> SweeperHandle
where
    S: SessionRepository + 'static,
{
    let period = interval
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(60))
        .max(std::time::Duration::from_millis(1));
    let (shutdown, mut stopped) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sweeps = 0u64;

        loop {
            tokio::select! {
                _ = &mut stopped => break,
                _ = ticker.tick() => {
                    match action.execute().await {
                        Ok(_) => sweeps += 1,
                        Err(e) => log::error!(
                            target: "photosite::session",
                            "msg=\"session sweep failed\", error={e}"
                        ),
                    }
                }
            }
        }

        log::debug!(
            target: "photosite::session",
            "msg=\"sweeper stopped\", sweeps={sweeps}"
        );
        sweeps
    });

    SweeperHandle { shutdown, task }
}
