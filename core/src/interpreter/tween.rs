//! Tweens and waits
//!
//! The only suspension points of the engine. Progress is derived from
//! wall-clock elapsed time, so animation speed does not depend on how often
//! frames are produced. Both primitives observe a `CancellationToken` and
//! return early when it fires.

use std::time::Duration;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/* ===================== Durations ===================== */

pub const MOVE_DURATION: Duration = Duration::from_millis(500);
pub const TURN_DURATION: Duration = Duration::from_millis(300);
pub const VISIBILITY_DURATION: Duration = Duration::from_millis(300);
pub const SPEECH_DURATION: Duration = Duration::from_millis(1000);
pub const UNKNOWN_OPERATION_DURATION: Duration = Duration::from_millis(200);

/// How a suspendable step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

impl Outcome {
    pub fn is_cancelled(self) -> bool {
        self == Outcome::Cancelled
    }
}

/* ===================== Interpolation ===================== */

/// `elapsed / duration` clamped to `[0, 1]`; a zero duration is already done
pub fn progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

/// Linear interpolation that lands exactly on `to` at `t >= 1`
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    if t >= 1.0 {
        to
    } else {
        from + (to - from) * t
    }
}

/// Convert a seconds parameter into a duration; negatives and NaN become zero,
/// values past the range of `Duration` saturate
pub fn seconds(value: f64) -> Duration {
    if value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/* ===================== Suspension ===================== */

/// Drive `on_frame` with increasing progress until it reaches 1
///
/// The first frame fires immediately with progress 0 (or 1 for a zero
/// duration). The last frame always carries exactly 1.0. Returning from this
/// function is the completion callback.
pub async fn tween<F>(
    duration: Duration,
    frame_interval: Duration,
    cancel: &CancellationToken,
    mut on_frame: F,
) -> Outcome
where
    F: FnMut(f64),
{
    let start = Instant::now();
    let mut ticker = interval(frame_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            _ = ticker.tick() => {}
        }

        let t = progress(start.elapsed(), duration);
        on_frame(t);
        if t >= 1.0 {
            return Outcome::Completed;
        }
    }
}

/// Suspend for `duration` without touching any state
pub async fn wait(duration: Duration, cancel: &CancellationToken) -> Outcome {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Outcome::Cancelled,
        _ = sleep(duration) => Outcome::Completed,
    }
}
