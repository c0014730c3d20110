//! Hedging strategy: races a primary attempt against speculative follow-ups spawned
//! after a delay, returning the first handled success and aborting every attempt
//! still in flight once a winner is found.

mod config;
mod events;

pub use config::{HedgeConfig, HedgeConfigBuilder, HedgeDelay};
pub use events::HedgeEvent;

use std::sync::Arc;
use std::time::{Duration, Instant};

use resilience_core::{ExecutionContext, Next, Outcome, PinFuture, ResilienceStrategy};

pub struct Hedge<T, E> {
    config: HedgeConfig<T, E>,
}

impl<T, E> Hedge<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: HedgeConfig<T, E>) -> Self {
        Self { config }
    }
}

impl<T, E> ResilienceStrategy<T, E> for Hedge<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn execute(&self, next: Arc<dyn Next<T, E>>, context: ExecutionContext) -> PinFuture<(Outcome<T, E>, ExecutionContext)> {
        let config = self.config.clone();

        Box::pin(async move {
            let started_at = Instant::now();
            let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, Outcome<T, E>)>(config.max_attempts.max(1));
            let mut handles = Vec::with_capacity(config.max_attempts);

            handles.push(spawn_attempt(0, next.clone(), context.child(), tx.clone()));
            let mut spawned = 1usize;
            let mut last_handled: Option<Outcome<T, E>> = None;
            let winner;

            loop {
                let more_to_spawn = spawned < config.max_attempts;
                let wait = if more_to_spawn {
                    config.delay.delay_for(spawned - 1)
                } else {
                    Duration::MAX
                };

                tokio::select! {
                    biased;
                    Some((attempt, outcome)) = rx.recv() => {
                        if !(config.should_handle)(&outcome) {
                            winner = Some((attempt, outcome));
                            break;
                        }
                        last_handled = Some(outcome);
                        if !more_to_spawn && handles.iter().all(|h: &tokio::task::JoinHandle<()>| h.is_finished()) {
                            winner = None;
                            break;
                        }
                    }
                    _ = tokio::time::sleep(wait), if more_to_spawn => {
                        let attempt_num = spawned;
                        spawned += 1;
                        config.event_listeners.emit(&HedgeEvent::HedgeStarted {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempt: attempt_num,
                            delay: wait,
                        });
                        handles.push(spawn_attempt(attempt_num, next.clone(), context.child(), tx.clone()));
                    }
                }
            }

            for handle in &handles {
                handle.abort();
            }

            match winner {
                Some((attempt, outcome)) => {
                    let duration = started_at.elapsed();
                    if attempt == 0 {
                        config.event_listeners.emit(&HedgeEvent::PrimarySucceeded {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            duration,
                            hedges_aborted: spawned - 1,
                        });
                    } else {
                        config.event_listeners.emit(&HedgeEvent::HedgeSucceeded {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempt,
                            duration,
                        });
                    }
                    (outcome, context)
                }
                None => {
                    config.event_listeners.emit(&HedgeEvent::AllAttemptsFailed {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts: spawned,
                    });
                    (last_handled.expect("at least the primary attempt reports an outcome"), context)
                }
            }
        })
    }
}

fn spawn_attempt<T, E>(
    attempt: usize,
    next: Arc<dyn Next<T, E>>,
    context: ExecutionContext,
    tx: tokio::sync::mpsc::Sender<(usize, Outcome<T, E>)>,
) -> tokio::task::JoinHandle<()>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let (outcome, _context) = next.call(context).await;
        let _ = tx.send((attempt, outcome)).await;
    })
}
