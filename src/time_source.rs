//! Clock abstraction so the service loop can run on real or simulated time.
//!
//! The resolver never reads the clock itself; the service loop asks this module
//! for `now` and hands it over. `solpaper simulate` installs a
//! [`SimulatedTimeSource`] before anything else runs, which lets a whole day of
//! wallpaper changes play out in seconds.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration as StdDuration, Instant};

static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Block for `duration` of this source's time.
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;

    /// Whether a simulation reached its end time. Always false for real time.
    fn is_ended(&self) -> bool {
        false
    }
}

pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Progress of a simulation, advanced only by `sleep`.
struct SimulationProgress {
    /// Simulated time consumed by completed sleeps.
    elapsed: ChronoDuration,
    /// Sleep currently in flight: real start instant and simulated length.
    in_flight: Option<(Instant, ChronoDuration)>,
}

/// Accelerated clock running from `start` to `end`.
///
/// With a multiplier, simulated time flows `multiplier` times faster than real
/// time. Without one (fast-forward), every sleep completes immediately.
pub struct SimulatedTimeSource {
    start: DateTime<Local>,
    end: DateTime<Local>,
    multiplier: Option<f64>,
    progress: Mutex<SimulationProgress>,
}

impl SimulatedTimeSource {
    /// `multiplier == 0.0` selects fast-forward; negative values fall back to 3600x.
    pub fn new(start: DateTime<Local>, end: DateTime<Local>, multiplier: f64) -> Self {
        let multiplier = if multiplier == 0.0 {
            None
        } else if multiplier < 0.0 {
            Some(3600.0)
        } else {
            Some(multiplier)
        };

        Self {
            start,
            end,
            multiplier,
            progress: Mutex::new(SimulationProgress {
                elapsed: ChronoDuration::zero(),
                in_flight: None,
            }),
        }
    }

    fn progress(&self) -> MutexGuard<'_, SimulationProgress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_time(&self) -> DateTime<Local> {
        let progress = self.progress();
        let mut elapsed = progress.elapsed;

        // Interpolate through an in-flight sleep so log timestamps move smoothly.
        if let (Some((started, length)), Some(multiplier)) = (progress.in_flight, self.multiplier) {
            let real = started.elapsed().as_secs_f64() * multiplier;
            let partial = ChronoDuration::milliseconds((real * 1000.0) as i64);
            elapsed += partial.min(length);
        }

        (self.start + elapsed).min(self.end)
    }

    fn remaining(&self) -> ChronoDuration {
        (self.end - self.current_time()).max(ChronoDuration::zero())
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Local> {
        self.current_time()
    }

    fn sleep(&self, duration: StdDuration) {
        let requested =
            ChronoDuration::from_std(duration).unwrap_or_else(|_| ChronoDuration::days(365));
        let step = requested.min(self.remaining());

        match self.multiplier {
            None => {
                self.progress().elapsed += step;
                // Give the signal and watcher threads a chance to run.
                std::thread::sleep(StdDuration::from_millis(1));
            }
            Some(multiplier) => {
                if step <= ChronoDuration::zero() {
                    return;
                }
                self.progress().in_flight = Some((Instant::now(), step));

                let real_secs = step.num_milliseconds() as f64 / 1000.0 / multiplier;
                std::thread::sleep(StdDuration::from_secs_f64(real_secs.max(0.0)));

                let mut progress = self.progress();
                progress.in_flight = None;
                progress.elapsed += step;
            }
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.current_time() >= self.end
    }
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource))
}

/// Install the global time source. Only the first call has an effect.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

pub fn now() -> DateTime<Local> {
    source().now()
}

pub fn sleep(duration: StdDuration) {
    source().sleep(duration)
}

pub fn is_simulated() -> bool {
    source().is_simulated()
}

pub fn simulation_ended() -> bool {
    source().is_ended()
}

/// Parse `YYYY-MM-DD HH:MM:SS` as a wall time in `tz`.
pub fn parse_datetime_in_tz(s: &str, tz: chrono_tz::Tz) -> Result<DateTime<chrono_tz::Tz>, String> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime '{s}': {e}. Use YYYY-MM-DD HH:MM:SS"))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("'{s}' does not exist in timezone {tz}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(s: &str) -> DateTime<Local> {
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_fast_forward_advances_by_requested_duration() {
        let start = local("2025-06-21 00:00:00");
        let end = local("2025-06-22 00:00:00");
        let clock = SimulatedTimeSource::new(start, end, 0.0);

        clock.sleep(StdDuration::from_secs(90 * 60));
        assert_eq!(clock.now(), start + ChronoDuration::minutes(90));
        assert!(!clock.is_ended());
    }

    #[test]
    fn test_fast_forward_stops_at_end() {
        let start = local("2025-06-21 00:00:00");
        let end = local("2025-06-21 01:00:00");
        let clock = SimulatedTimeSource::new(start, end, 0.0);

        clock.sleep(StdDuration::from_secs(5 * 3600));
        assert_eq!(clock.now(), end);
        assert!(clock.is_ended());
    }

    #[test]
    fn test_linear_multiplier_scales_sleep() {
        let start = local("2025-06-21 00:00:00");
        let end = local("2025-06-21 12:00:00");
        // One simulated hour per real millisecond.
        let clock = SimulatedTimeSource::new(start, end, 3_600_000.0);

        clock.sleep(StdDuration::from_secs(3600));
        assert_eq!(clock.now(), start + ChronoDuration::hours(1));
    }

    #[test]
    fn test_parse_datetime_in_tz() {
        let parsed = parse_datetime_in_tz("2025-03-09 12:30:00", chrono_tz::America::New_York)
            .expect("valid datetime");
        assert_eq!(parsed.format("%H:%M %Z").to_string(), "12:30 EDT");
    }

    #[test]
    fn test_parse_datetime_rejects_bad_format() {
        assert!(parse_datetime_in_tz("2025-03-09T12:30", chrono_tz::UTC).is_err());
    }

    #[test]
    fn test_parse_datetime_rejects_time_in_dst_gap() {
        let result = parse_datetime_in_tz("2025-03-09 02:30:00", chrono_tz::America::New_York);
        assert!(result.is_err());
    }
}
