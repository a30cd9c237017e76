use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{ProviderError, SamplerError};
use crate::provider::TelemetryProvider;
use crate::sample::SamplingSession;

/// Handle to a running sampling loop.
///
/// The loop owns its `SamplingSession`; `join` moves the session back out
/// once the loop has exited, so there is never a reader and a writer alive
/// at the same time.
pub struct SamplerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<Result<SamplingSession, ProviderError>>,
}

/// Spawn the fixed-interval polling loop.
///
/// The first poll happens immediately (tick-then-wait), so even a command
/// that exits at once gets one attempted reading. `delay` postpones the
/// first tick and is interruptible by stop.
pub fn spawn(
    provider: Arc<dyn TelemetryProvider>,
    device_index: u32,
    interval: Duration,
    delay: Duration,
) -> SamplerHandle {
    let (stop, stop_rx) = watch::channel(false);
    let task = tokio::spawn(run_loop(provider, device_index, interval, delay, stop_rx));
    SamplerHandle { stop, task }
}

impl SamplerHandle {
    /// Signal the loop to stop at the next tick boundary. Idempotent; an
    /// in-flight poll always completes before the loop exits.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Wait for the loop to exit and take ownership of the session.
    pub async fn join(self) -> Result<SamplingSession, SamplerError> {
        match self.task.await {
            Ok(Ok(session)) => Ok(session),
            Ok(Err(provider_err)) => Err(SamplerError::Provider(provider_err)),
            Err(join_err) => Err(SamplerError::Task(join_err.to_string())),
        }
    }

    /// Resolves only if the loop dies before `stop` is signalled, i.e. on a
    /// fatal provider error (or a panic inside the loop).
    pub async fn aborted(&mut self) -> SamplerError {
        match (&mut self.task).await {
            Ok(Err(provider_err)) => SamplerError::Provider(provider_err),
            Ok(Ok(_)) => SamplerError::Task("sampling loop exited without a stop signal".into()),
            Err(join_err) => SamplerError::Task(join_err.to_string()),
        }
    }
}

async fn run_loop(
    provider: Arc<dyn TelemetryProvider>,
    device_index: u32,
    interval: Duration,
    delay: Duration,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<SamplingSession, ProviderError> {
    let mut session = SamplingSession::new(device_index, interval);

    if !delay.is_zero() {
        tokio::select! {
            _ = time::sleep(delay) => {}
            _ = stop_rx.changed() => return Ok(session),
        }
    }

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // Biased toward the tick so the immediate first tick wins even when
        // stop arrives during the same poll; stop is then observed on the
        // next iteration, within one interval.
        tokio::select! {
            biased;

            _ = ticker.tick() => {
                match provider.query(device_index) {
                    Ok(reading) => session.record(reading),
                    Err(e) if e.is_fatal() => {
                        warn!("aborting sampling: {}", e);
                        return Err(e);
                    }
                    Err(e) => {
                        warn!("skipping poll: {}", e);
                        session.record_failure();
                    }
                }
            }

            // Fires on stop, and also when the handle is dropped.
            _ = stop_rx.changed() => break,
        }
    }

    debug!(
        "sampling loop stopped after {} poll(s) ({} failed)",
        session.polls(),
        session.failed_polls()
    );
    Ok(session)
}
