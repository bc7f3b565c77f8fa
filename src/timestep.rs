//! Fixed-rate timing for running physics independently of the render loop.

use crate::error::{PhysicsError, Result};
use std::time::Duration;

// time snapping technique from Tyler Glaiel's blog post
// https://medium.com/@tglaiel/how-to-make-your-game-run-at-60fps-24c61210fe75
const NANOS_240FPS: u128 = 1_000_000_000 / 240;
const NANOS_180FPS: u128 = 1_000_000_000 / 180;
const NANOS_120FPS: u128 = 1_000_000_000 / 120;
const NANOS_60FPS: u128 = 1_000_000_000 / 60;
const NANOS_30FPS: u128 = 1_000_000_000 / 30;
const SNAP_TARGETS: [u128; 5] = [
    NANOS_240FPS,
    NANOS_180FPS,
    NANOS_120FPS,
    NANOS_60FPS,
    NANOS_30FPS,
];
const SNAP_THRESHOLD: u128 = 200_000;

const MAX_ACC_VALUE: u128 = 1_000_000_000 / 8;

fn should_snap(dt: u128, target: u128) -> bool {
    if dt < target {
        target - dt < SNAP_THRESHOLD
    } else {
        dt - target < SNAP_THRESHOLD
    }
}

/// The rates physics can run at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u32", into = "u32")
)]
pub enum PhysicsFramerate {
    #[default]
    Hz60,
    Hz120,
    Hz180,
    Hz240,
}

impl PhysicsFramerate {
    #[inline]
    pub fn hz(&self) -> u32 {
        match self {
            PhysicsFramerate::Hz60 => 60,
            PhysicsFramerate::Hz120 => 120,
            PhysicsFramerate::Hz180 => 180,
            PhysicsFramerate::Hz240 => 240,
        }
    }

    /// Length of one tick in seconds.
    #[inline]
    pub fn dt(&self) -> f64 {
        1.0 / self.hz() as f64
    }

    #[inline]
    fn nanos_per_tick(&self) -> u128 {
        1_000_000_000 / u128::from(self.hz())
    }
}

impl TryFrom<u32> for PhysicsFramerate {
    type Error = PhysicsError;

    fn try_from(hz: u32) -> Result<Self> {
        match hz {
            60 => Ok(PhysicsFramerate::Hz60),
            120 => Ok(PhysicsFramerate::Hz120),
            180 => Ok(PhysicsFramerate::Hz180),
            240 => Ok(PhysicsFramerate::Hz240),
            other => Err(PhysicsError::InvalidFramerate(other)),
        }
    }
}

impl From<PhysicsFramerate> for u32 {
    fn from(rate: PhysicsFramerate) -> u32 {
        rate.hz()
    }
}

/// Turns variable frame times into a whole number of fixed physics ticks.
///
/// Frame times within a fraction of a millisecond of a common refresh rate
/// are treated as exact, which stops vsynced games from occasionally
/// running two ticks in one frame and none in the next.
/// Leftover time is carried to the next frame, up to a limit
/// so that one long stall doesn't cause a burst of catch-up ticks.
#[derive(Clone, Copy, Debug)]
pub struct StepClock {
    framerate: PhysicsFramerate,
    acc: u128,
}

impl StepClock {
    pub fn new(framerate: PhysicsFramerate) -> Self {
        Self { framerate, acc: 0 }
    }

    #[inline]
    pub fn framerate(&self) -> PhysicsFramerate {
        self.framerate
    }

    /// Change the rate. Time already accumulated is kept.
    pub fn set_framerate(&mut self, framerate: PhysicsFramerate) {
        self.framerate = framerate;
    }

    /// Add elapsed time and get the number of ticks that should run now.
    pub fn ticks_for(&mut self, elapsed: Duration) -> usize {
        let mut dt_nanos = elapsed.as_nanos();
        // if vsynced, pretend frame timing is exact (see blog post mentioned above)
        if let Some(&target) = SNAP_TARGETS.iter().find(|&&t| should_snap(dt_nanos, t)) {
            dt_nanos = target;
            self.acc = 0;
        }

        self.acc += dt_nanos;
        // limit acc to prevent spiral of death
        if self.acc > MAX_ACC_VALUE {
            self.acc = MAX_ACC_VALUE;
        }

        let per_tick = self.framerate.nanos_per_tick();
        let ticks = self.acc / per_tick;
        self.acc -= ticks * per_tick;
        ticks as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_supported_rates() {
        assert_eq!(PhysicsFramerate::try_from(120), Ok(PhysicsFramerate::Hz120));
        assert_eq!(
            PhysicsFramerate::try_from(144),
            Err(PhysicsError::InvalidFramerate(144))
        );
        assert_eq!(u32::from(PhysicsFramerate::Hz240), 240);
    }

    #[test]
    fn vsynced_frames_give_steady_ticks() {
        let mut clock = StepClock::new(PhysicsFramerate::Hz120);
        for _ in 0..100 {
            // a bit off from exactly 1/60 s
            assert_eq!(clock.ticks_for(Duration::from_micros(16_700)), 2);
        }
    }

    #[test]
    fn leftover_time_carries_over() {
        let mut clock = StepClock::new(PhysicsFramerate::Hz60);
        // 10 ms, far enough from every snap target
        let frame = Duration::from_millis(10);
        let total: usize = (0..6).map(|_| clock.ticks_for(frame)).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn long_stalls_are_clamped() {
        let mut clock = StepClock::new(PhysicsFramerate::Hz240);
        let ticks = clock.ticks_for(Duration::from_secs(5));
        assert_eq!(ticks, 30);
    }
}
