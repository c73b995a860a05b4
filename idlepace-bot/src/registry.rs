//! Spawns one task per agent, watches them, and performs the coordinated shutdown.
use idlepace_core::agent_seed;
use log::{error, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::agent::{Agent, AgentIdentity, AgentServices, BotControl};
use crate::channel::CommandChannel;
use crate::shutdown::{self, ShutdownTrigger};

/// Time agent tasks get to wind down before they are aborted.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Clean,
    Fault,
}

impl ExitStatus {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Fault => 1,
        }
    }
}

enum AgentExit {
    Stopped,
    InitFailed,
}

pub struct AgentRegistry {
    tasks: JoinSet<AgentExit>,
    controls: Vec<BotControl>,
    trigger: ShutdownTrigger,
    grace: Duration,
}

impl AgentRegistry {
    /// Spawn every agent. With `seed` set, each agent's RNG is derived from it
    /// and the agent name; otherwise it is seeded from entropy.
    #[must_use]
    pub fn spawn(
        agents: Vec<(AgentIdentity, Arc<dyn CommandChannel>)>,
        services: &Arc<AgentServices>,
        seed: Option<u64>,
    ) -> Self {
        let (trigger, shutdown) = shutdown::channel();
        let mut tasks = JoinSet::new();
        let mut controls = Vec::with_capacity(agents.len());

        for (identity, channel) in agents {
            let rng = match seed {
                Some(seed) => ChaCha20Rng::seed_from_u64(agent_seed(seed, &identity.name)),
                None => ChaCha20Rng::from_entropy(),
            };
            let control = BotControl::new(identity.name.clone(), channel);
            controls.push(control.clone());
            let services = Arc::clone(services);
            let mut shutdown = shutdown.clone();

            tasks.spawn(async move {
                let name = identity.name.clone();
                match Agent::initialize(identity, control, services, rng).await {
                    Ok(mut agent) => {
                        agent.run(&mut shutdown).await;
                        AgentExit::Stopped
                    }
                    Err(err) => {
                        error!("[{name}] Failed to initialize: {err}");
                        if let Some(source) = std::error::Error::source(&err) {
                            error!("[{name}] Caused by: {source}");
                        }
                        AgentExit::InitFailed
                    }
                }
            });
        }

        Self {
            tasks,
            controls,
            trigger,
            grace: SHUTDOWN_GRACE,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Run until SIGINT/SIGTERM or a fault, then shut down.
    pub async fn supervise(self) -> ExitStatus {
        self.supervise_until(wait_for_signal()).await
    }

    /// Run until `stop` resolves or a fault occurs, then shut down.
    pub async fn supervise_until(mut self, stop: impl Future<Output = ()>) -> ExitStatus {
        tokio::pin!(stop);
        let total = self.len();
        let mut init_failures = 0;
        let mut status = ExitStatus::Clean;

        loop {
            tokio::select! {
                () = &mut stop => {
                    warn!("Shutdown requested, stopping all active gaming sessions");
                    break;
                }
                joined = self.tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(AgentExit::Stopped)) => {}
                    Some(Ok(AgentExit::InitFailed)) => {
                        init_failures += 1;
                        if init_failures == total {
                            error!("Every agent failed to initialize");
                            status = ExitStatus::Fault;
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        error!("Agent task failed: {err}");
                        status = ExitStatus::Fault;
                        break;
                    }
                },
            }
        }

        self.shutdown().await;
        status
    }

    async fn shutdown(&mut self) {
        self.trigger.trigger();

        let tasks = &mut self.tasks;
        let drained = tokio::time::timeout(self.grace, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(err) = joined {
                    error!("Agent task failed during shutdown: {err}");
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                "Agents did not stop within {:?}, aborting remaining tasks",
                self.grace
            );
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }

        let mut stops = JoinSet::new();
        for control in self.controls.iter().filter(|c| c.is_playing()).cloned() {
            stops.spawn(async move {
                match control.stop().await {
                    Ok(()) => crate::success!("[{}] Game session finished", control.name()),
                    Err(err) => error!("[{}] Error stopping the game: {err}", control.name()),
                }
            });
        }
        let pending = stops.len();
        while stops.join_next().await.is_some() {}
        info!("Shutdown complete ({pending} session(s) stopped)");
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    () = ctrl_c() => {}
                    _ = terminate.recv() => info!("SIGTERM received"),
                }
            }
            Err(err) => {
                warn!("Unable to listen for SIGTERM: {err}");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("SIGINT received"),
        Err(err) => {
            error!("Unable to listen for SIGINT: {err}");
            std::future::pending::<()>().await;
        }
    }
}
