use std::time::{Duration, Instant};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Back,
    Forward,
}

impl NudgeDirection {
    fn sign(self) -> f64 {
        match self {
            NudgeDirection::Back => -1.0,
            NudgeDirection::Forward => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    direction: NudgeDirection,
    next_fire: Instant,
}

/// Press-and-hold stepping of the playhead.
///
/// A press steps once; holding past the initial delay keeps stepping at the
/// repeat interval until pointer-up, pointer-leave or window blur.
#[derive(Debug)]
pub struct NudgeRepeater {
    step: f64,
    initial_delay: Duration,
    interval: Duration,
    hold: Option<Hold>,
}

impl NudgeRepeater {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            step: config.nudge_step_seconds,
            initial_delay: config.nudge_initial_delay(),
            interval: config.nudge_repeat_interval().max(Duration::from_millis(1)),
            hold: None,
        }
    }

    /// Starts a hold and returns the first step.
    pub fn press(&mut self, direction: NudgeDirection, now: Instant) -> f64 {
        self.hold = Some(Hold {
            direction,
            next_fire: now + self.initial_delay,
        });
        direction.sign() * self.step
    }

    /// Total step due since the last tick, if the hold is still on.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        let hold = self.hold.as_mut()?;
        let mut fired = 0u32;
        while hold.next_fire <= now {
            fired += 1;
            hold.next_fire += self.interval;
        }
        (fired > 0).then(|| hold.direction.sign() * self.step * f64::from(fired))
    }

    pub fn is_held(&self) -> bool {
        self.hold.is_some()
    }

    pub fn release(&mut self) {
        self.hold = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_steps_once_then_repeats_after_delay() {
        let mut nudge = NudgeRepeater::new(&EngineConfig::default());
        let t0 = Instant::now();
        assert_eq!(nudge.press(NudgeDirection::Forward, t0), 0.1);
        assert_eq!(nudge.tick(t0 + Duration::from_millis(349)), None);
        let first = nudge.tick(t0 + Duration::from_millis(350)).unwrap();
        assert!((first - 0.1).abs() < 1e-9);
        // Two more intervals elapse between ticks.
        let batch = nudge.tick(t0 + Duration::from_millis(470)).unwrap();
        assert!((batch - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_release_cancels_repeat() {
        let mut nudge = NudgeRepeater::new(&EngineConfig::default());
        let t0 = Instant::now();
        assert_eq!(nudge.press(NudgeDirection::Back, t0), -0.1);
        nudge.release();
        assert!(!nudge.is_held());
        assert_eq!(nudge.tick(t0 + Duration::from_secs(5)), None);
    }
}
