//! Tests for StepClock

use bond_market_simulator_core_rs::StepClock;

#[test]
fn test_clock_starts_after_priming() {
    let clock = StepClock::new(8, 252);
    assert_eq!(clock.current_step(), 8);
    assert_eq!(clock.start_step(), 8);
    assert_eq!(clock.end_step(), 260);
    assert_eq!(clock.steps_completed(), 0);
    assert_eq!(clock.steps_remaining(), 252);
}

#[test]
fn test_primer_range() {
    let clock = StepClock::new(8, 1);
    let steps: Vec<usize> = clock.primer_steps().collect();
    assert_eq!(steps, (0..8).collect::<Vec<_>>());
}

#[test]
fn test_advance_until_finished() {
    let mut clock = StepClock::new(2, 3);
    let mut seen = Vec::new();
    while !clock.is_finished() {
        seen.push(clock.current_step());
        clock.advance();
    }
    assert_eq!(seen, vec![2, 3, 4]);
    assert_eq!(clock.steps_completed(), 3);
    assert_eq!(clock.steps_remaining(), 0);
}

#[test]
fn test_zero_run_is_finished_immediately() {
    let clock = StepClock::new(8, 0);
    assert!(clock.is_finished());
}

#[test]
fn test_resume_clamps_into_trading_window() {
    let clock = StepClock::resume(8, 10, 12);
    assert_eq!(clock.current_step(), 12);
    assert_eq!(clock.steps_completed(), 4);

    // Before the window
    assert_eq!(StepClock::resume(8, 10, 3).current_step(), 8);
    // Past the end
    assert!(StepClock::resume(8, 10, 40).is_finished());
}
