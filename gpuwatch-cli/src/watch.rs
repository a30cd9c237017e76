use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gpuwatch_hardware::{sampler, summarize, SamplerError, TelemetryProvider, TelemetrySummary};
use tokio::signal;
use tracing::{info, warn};

use crate::error::WatchError;
use crate::runner::{spawn_child, ProcessResult};

/// Settings for one monitored run
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub device_index: u32,
    pub interval: Duration,
    pub delay: Duration,
}

/// Everything the reporter needs after a successful run
#[derive(Debug)]
pub struct WatchOutcome {
    pub process: ProcessResult,
    pub summary: TelemetrySummary,
}

enum RunEnd {
    Exited(ExitStatus),
    SamplerDied(SamplerError),
    Interrupted,
}

/// Run the command with concurrent telemetry sampling.
///
/// The child is spawned first so a launch failure never starts a sampling
/// loop. The two activities then run until the child exits; the sampler is
/// stopped and joined before aggregation, so the session is frozen by the
/// time it is read.
///
/// A fatal provider error ends the run early: the child is killed, the
/// partial session is discarded, and the device error is returned instead of
/// a summary.
pub async fn run(
    provider: Arc<dyn TelemetryProvider>,
    command: &str,
    args: &[String],
    opts: &WatchOptions,
) -> Result<WatchOutcome, WatchError> {
    let mut child = spawn_child(command, args)?;
    let started = Instant::now();

    let mut sampler = sampler::spawn(
        provider,
        opts.device_index,
        opts.interval,
        opts.delay,
    );

    let end = tokio::select! {
        status = child.wait() => RunEnd::Exited(status?),
        err = sampler.aborted() => RunEnd::SamplerDied(err),
        _ = signal::ctrl_c() => RunEnd::Interrupted,
    };

    let status = match end {
        RunEnd::Exited(status) => status,
        RunEnd::SamplerDied(err) => {
            warn!("device telemetry failed, terminating monitored command");
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(WatchError::Device(err));
        }
        RunEnd::Interrupted => {
            info!("interrupt received, terminating monitored command");
            let _ = child.start_kill();
            child.wait().await?
        }
    };

    let process = ProcessResult::from_status(status, started.elapsed());

    // Join barrier: the loop exits at its next tick boundary and hands the
    // frozen session back by move.
    sampler.stop();
    let session = sampler.join().await?;

    Ok(WatchOutcome {
        process,
        summary: summarize(&session),
    })
}
