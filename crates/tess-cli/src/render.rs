//! Async drivers: the frame-cadence render loop and the coherence field.
//!
//! The engine is moved into exactly one task. Everything else talks to it
//! through `SignalCell`s (inputs) and a `watch` channel (outputs).

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tess_core::{CoherenceField, Engine, EngineStatus, Frame, SignalCell};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Latest output of the render task.
#[derive(Clone, Debug)]
pub struct Published {
    pub status: EngineStatus,
    pub frame: Option<Frame>,
}

impl Published {
    pub fn idle(engine: &Engine) -> Self {
        Self {
            status: engine.status(),
            frame: None,
        }
    }
}

/// Tick `engine` every `period` until `cancel` fires or `max_ticks` is
/// reached. Each frame is handed to `on_frame` and published on `tx`.
/// Returns the engine so callers can inspect its final state.
pub async fn drive(
    mut engine: Engine,
    period: Duration,
    max_ticks: Option<u64>,
    cancel: CancellationToken,
    tx: watch::Sender<Published>,
    mut on_frame: impl FnMut(&Frame),
) -> Engine {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    engine.set_running(true);
    tracing::info!(
        "render loop started: {:.1} Hz, coherence={}, speed={}",
        1.0 / period.as_secs_f64(),
        engine.coherence(),
        engine.rotation_speed()
    );

    loop {
        if max_ticks.is_some_and(|max| engine.ticks() >= max) {
            break;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let frame = engine.tick();
                on_frame(&frame);
                let status = engine.status();
                tx.send_replace(Published { status, frame: Some(frame) });
            }
        }
    }

    engine.set_running(false);
    let status = engine.status();
    tx.send_modify(|p| p.status = status);
    tracing::info!("render loop stopped after {} ticks", engine.ticks());
    engine
}

/// Recompute the coherence field every `period` and publish it into `cell`.
pub async fn run_field(
    cell: SignalCell,
    initial: f64,
    period: Duration,
    seed: Option<u64>,
    cancel: CancellationToken,
) {
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let mut field = CoherenceField::new(initial);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let score = field.advance(&mut rng);
                cell.set(score);
                tracing::debug!("field update #{}: coherence={score:.3}", field.updates());
            }
        }
    }
}

/// Read coherence values, one per line, from stdin into `cell` on a
/// detached thread. Unparseable lines are logged and skipped; EOF ends the
/// reader. Blocking reads stay off the runtime so shutdown never waits on
/// an interactive terminal.
pub fn spawn_stdin_reader(cell: SignalCell) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("tess-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                match line {
                    Ok(line) => match parse_signal_line(&line) {
                        Some(v) => cell.set(v),
                        None => tracing::warn!("ignoring stdin line {line:?}: not a number"),
                    },
                    Err(e) => {
                        tracing::warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
            tracing::debug!("stdin signal closed");
        })
}

fn parse_signal_line(line: &str) -> Option<f64> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}
