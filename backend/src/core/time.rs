//! Step clock for the simulation
//!
//! The market runs in discrete daily steps. The first `primer_steps` steps
//! are a seeding window: buy-side agents record history (NAV, index levels)
//! but nobody trades. Trading runs from `primer_steps` for `run_steps` days.

use serde::{Deserialize, Serialize};

/// Tracks the current simulated day
///
/// # Example
/// ```
/// use bond_market_simulator_core_rs::StepClock;
///
/// let mut clock = StepClock::new(8, 3);
/// assert_eq!(clock.current_step(), 8);
/// assert_eq!(clock.end_step(), 11);
///
/// clock.advance();
/// assert_eq!(clock.current_step(), 9);
/// assert_eq!(clock.steps_completed(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepClock {
    /// Next step to be executed
    current_step: usize,
    /// First trading step (end of the seeding window)
    start_step: usize,
    /// One past the last trading step
    end_step: usize,
}

impl StepClock {
    /// Create a clock that starts trading after `primer_steps` seeding steps
    pub fn new(primer_steps: usize, run_steps: usize) -> Self {
        Self {
            current_step: primer_steps,
            start_step: primer_steps,
            end_step: primer_steps + run_steps,
        }
    }

    /// Rebuild a clock positioned at `current_step` (checkpoint restore)
    pub fn resume(primer_steps: usize, run_steps: usize, current_step: usize) -> Self {
        let mut clock = Self::new(primer_steps, run_steps);
        clock.current_step = current_step.clamp(clock.start_step, clock.end_step);
        clock
    }

    /// Advance by one day
    pub fn advance(&mut self) {
        self.current_step += 1;
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn start_step(&self) -> usize {
        self.start_step
    }

    pub fn end_step(&self) -> usize {
        self.end_step
    }

    /// Seeding steps, `0..start_step`
    pub fn primer_steps(&self) -> std::ops::Range<usize> {
        0..self.start_step
    }

    /// True once every trading step has run
    ///
    /// # Example
    /// ```
    /// use bond_market_simulator_core_rs::StepClock;
    ///
    /// let mut clock = StepClock::new(2, 1);
    /// assert!(!clock.is_finished());
    /// clock.advance();
    /// assert!(clock.is_finished());
    /// ```
    pub fn is_finished(&self) -> bool {
        self.current_step >= self.end_step
    }

    pub fn steps_completed(&self) -> usize {
        self.current_step - self.start_step
    }

    pub fn steps_remaining(&self) -> usize {
        self.end_step.saturating_sub(self.current_step)
    }
}
