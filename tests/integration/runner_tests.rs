//! Step scheduler lifecycle: threshold and timer completion, advance
//! idempotence, teardown isolation, blocked steps and operator control.

use std::time::Duration;

use brewrig::app::commands::RigCommand;
use brewrig::app::events::{RigEvent, Severity};
use brewrig::step::properties::StepProperties;
use brewrig::step::{StepPhase, TimerState};

use crate::mock_hw::{ActuatorCall, KETTLE, PROBE, PUMP, Rig, VALVE, config, step};

fn pause(name: &str) -> brewrig::config::RecipeStep {
    step(name, "manual", StepProperties::new().with("proceed", "Pause"))
}

fn chill(target: f64) -> brewrig::config::RecipeStep {
    step(
        "Chill",
        "chill",
        StepProperties::new()
            .with("kettle", 1u32)
            .with("target", target)
            .with("actor1", 2u32),
    )
}

fn timer(minutes: &str, actors: &[u32]) -> brewrig::config::RecipeStep {
    let mut props = StepProperties::new().with("timer", minutes);
    for (i, a) in actors.iter().enumerate() {
        props = props.with(&format!("actor{}", i + 1), *a);
    }
    step("Whirlpool", "actor_timer", props)
}

// ── Threshold completion ──────────────────────────────────────

#[test]
fn chill_advances_on_the_tick_the_threshold_is_crossed() {
    let rig = Rig::new();
    rig.sensors.script(PROBE, &[20.0, 10.0, 5.0, 3.5]);
    let mut svc = rig.service(&config(None, vec![chill(4.0), pause("Pitch")]));

    svc.start();
    assert!(rig.actuators.is_on(PUMP));
    assert_eq!(svc.supervisor().snapshot(KETTLE).unwrap().target_temp, 4.0);

    for _ in 0..3 {
        rig.tick(&mut svc, 60);
        assert_eq!(svc.runner().position(), Some(0));
    }
    rig.tick(&mut svc, 60);

    assert_eq!(svc.runner().position(), Some(1));
    assert_eq!(rig.events.finished_steps(), vec![0]);
    assert!(!rig.actuators.is_on(PUMP));

    let done: Vec<_> = rig
        .notifier
        .all()
        .into_iter()
        .filter(|n| n.title == "Chill complete")
        .collect();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].body, "Chill temp reached in 4:00");
}

#[test]
fn advance_happens_once_even_if_predicate_stays_true() {
    let rig = Rig::new();
    rig.sensors.script(PROBE, &[1.0]);
    let mut svc = rig.service(&config(None, vec![chill(4.0), pause("Pitch")]));

    svc.start();
    for _ in 0..5 {
        rig.tick(&mut svc, 1);
    }

    assert_eq!(rig.events.finished_steps(), vec![0]);
    assert_eq!(svc.runner().position(), Some(1));
    assert_eq!(
        rig.notifier.titles().iter().filter(|t| *t == "Chill complete").count(),
        1
    );
}

// ── Timer completion ──────────────────────────────────────────

#[test]
fn timer_step_arms_on_first_tick_and_finishes_at_one_minute() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![timer("1", &[2]), pause("Next")]));

    svc.start();
    let status = svc.runner().status().unwrap();
    assert_eq!(status.timer, TimerState::NotStarted);
    assert_eq!(status.phase, StepPhase::Initialized);

    rig.tick(&mut svc, 0);
    assert_eq!(
        svc.runner().status().unwrap().timer,
        TimerState::Running {
            remaining: Duration::from_secs(60)
        }
    );

    rig.tick(&mut svc, 30);
    rig.tick(&mut svc, 29);
    let status = svc.runner().status().unwrap();
    assert_eq!(status.position, 0);
    assert_eq!(status.phase, StepPhase::Executing);
    assert_eq!(
        status.timer,
        TimerState::Running {
            remaining: Duration::from_secs(1)
        }
    );

    rig.tick(&mut svc, 1);
    assert_eq!(svc.runner().position(), Some(1));
    assert_eq!(rig.events.finished_steps(), vec![0]);
    assert_eq!(
        rig.notifier.titles().iter().filter(|t| *t == "Whirlpool complete").count(),
        1
    );

    // The next step gets a fresh timer.
    assert_eq!(svc.runner().status().unwrap().timer, TimerState::NotStarted);
}

#[test]
fn reset_does_not_restart_a_running_timer() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![timer("1", &[]), pause("Next")]));

    svc.start();
    rig.tick(&mut svc, 0);
    rig.tick(&mut svc, 30);
    svc.handle_command(RigCommand::ResetStep).unwrap();
    rig.tick(&mut svc, 30);

    assert_eq!(svc.runner().position(), Some(1));
}

// ── Teardown ──────────────────────────────────────────────────

#[test]
fn teardown_attempts_every_actor_despite_failures() {
    let rig = Rig::new();
    rig.actuators.fail(PUMP);
    let mut svc = rig.service(&config(None, vec![timer("0", &[2, 3]), pause("Next")]));

    svc.start();
    rig.tick(&mut svc, 1);

    let calls = rig.actuators.calls();
    assert!(calls.contains(&ActuatorCall::On(PUMP)));
    assert!(calls.contains(&ActuatorCall::On(VALVE)));
    assert!(calls.contains(&ActuatorCall::Off(PUMP)));
    assert!(calls.contains(&ActuatorCall::Off(VALVE)));
    assert_eq!(svc.runner().position(), Some(1));
}

#[test]
fn stop_runs_teardown_and_goes_idle() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![timer("10", &[2])]));

    svc.start();
    assert!(rig.actuators.is_on(PUMP));
    svc.handle_command(RigCommand::Stop).unwrap();

    assert!(!rig.actuators.is_on(PUMP));
    assert!(svc.runner().is_idle());
    assert!(!svc.is_finished());
    assert_eq!(
        rig.events.count(|e| matches!(e, RigEvent::RecipeStopped { position: 0 })),
        1
    );

    // Ticks after stop do nothing.
    rig.tick(&mut svc, 600);
    assert!(rig.events.finished_steps().is_empty());
}

#[test]
fn status_only_reports_live_phases() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(
        None,
        vec![timer("1", &[2]), step("Mystery", "mash_in", StepProperties::new()), pause("End")],
    ));

    let mut seen = Vec::new();
    svc.start();
    seen.push(svc.runner().status().unwrap().phase);
    for _ in 0..4 {
        rig.tick(&mut svc, 30);
        seen.push(svc.runner().status().unwrap().phase);
    }

    assert!(seen.iter().all(|p| matches!(
        p,
        StepPhase::Initialized | StepPhase::Executing | StepPhase::Blocked
    )));
    assert_eq!(seen.first(), Some(&StepPhase::Initialized));
    assert_eq!(seen.last(), Some(&StepPhase::Blocked));
    // Completion of the timer step shows up as an event, not a phase.
    assert_eq!(rig.events.finished_steps(), vec![0]);
    assert_eq!(svc.runner().position(), Some(1));
}

// ── Chained completion ────────────────────────────────────────

#[test]
fn steps_completing_in_init_chain_within_one_call() {
    let rig = Rig::new();
    let target = |t: f64| {
        step(
            "Heat",
            "target",
            StepProperties::new().with("kettle", 1u32).with("target", t),
        )
    };
    let mut svc = rig.service(&config(None, vec![target(60.0), target(65.0), pause("Mash")]));

    svc.start();

    assert_eq!(svc.runner().position(), Some(2));
    assert_eq!(rig.events.finished_steps(), vec![0, 1]);
    assert_eq!(svc.supervisor().snapshot(KETTLE).unwrap().target_temp, 65.0);
}

#[test]
fn recipe_finishes_after_last_step() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(
        None,
        vec![step("Go", "manual", StepProperties::new().with("proceed", "Continue"))],
    ));

    svc.start();

    assert!(svc.is_finished());
    assert!(svc.runner().is_idle());
    assert_eq!(rig.events.count(|e| matches!(e, RigEvent::RecipeFinished)), 1);
}

// ── Blocked steps ─────────────────────────────────────────────

#[test]
fn misconfigured_step_blocks_until_skipped() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(
        None,
        vec![step("Mystery", "mash_in", StepProperties::new()), pause("Mash")],
    ));

    svc.start();
    for _ in 0..3 {
        rig.tick(&mut svc, 1);
    }

    let status = svc.runner().status().unwrap();
    assert_eq!(status.position, 0);
    assert_eq!(status.phase, StepPhase::Blocked);
    let errors = rig.notifier.with_severity(Severity::Danger);
    assert_eq!(errors.len(), 1, "reported exactly once");
    assert_eq!(errors[0].title, "Step configuration error");

    svc.handle_command(RigCommand::Next).unwrap();
    assert_eq!(svc.runner().position(), Some(1));
    // A skipped step never ran, so it never finished.
    assert!(rig.events.finished_steps().is_empty());
}

#[test]
fn invalid_property_blocks_the_step() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![timer("soon", &[2])]));

    svc.start();

    assert_eq!(svc.runner().status().unwrap().phase, StepPhase::Blocked);
    assert!(!rig.actuators.is_on(PUMP));
    assert_eq!(
        rig.events.count(|e| matches!(e, RigEvent::StepBlocked { position: 0, .. })),
        1
    );
}

#[test]
fn operator_next_advances_a_waiting_step() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![timer("90", &[2]), pause("Next")]));

    svc.start();
    rig.tick(&mut svc, 1);
    svc.handle_command(RigCommand::Next).unwrap();
    svc.handle_command(RigCommand::Next).unwrap();

    // Two presses, two steps: the second press finishes "Next" as well.
    assert_eq!(rig.events.finished_steps(), vec![0, 1]);
    assert!(!rig.actuators.is_on(PUMP));
    assert!(svc.is_finished());
}

#[test]
fn start_while_running_is_ignored() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![pause("One"), pause("Two")]));

    svc.start();
    svc.handle_command(RigCommand::Start).unwrap();

    assert_eq!(
        rig.events.count(|e| matches!(e, RigEvent::StepStarted { position: 0, .. })),
        1
    );
}

// ── Advance-once under arbitrary readings ─────────────────────

proptest::proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    /// However the probe behaves, a chill step finishes at most once and
    /// only after some reading reached the target.
    #[test]
    fn chill_finishes_once_iff_target_reached(
        readings in proptest::collection::vec(0.0f64..40.0, 1..20),
        target in 4.0f64..30.0,
    ) {
        let rig = Rig::new();
        rig.sensors.script(PROBE, &readings);
        let mut svc = rig.service(&config(None, vec![chill(target), pause("Pitch")]));

        svc.start();
        for _ in 0..readings.len() + 3 {
            rig.tick(&mut svc, 10);
        }

        let reached = readings.iter().any(|&r| r <= target);
        let expected: Vec<usize> = if reached { vec![0] } else { vec![] };
        proptest::prop_assert_eq!(rig.events.finished_steps(), expected);
        proptest::prop_assert_eq!(svc.runner().position(), Some(usize::from(reached)));
        proptest::prop_assert_eq!(rig.actuators.is_on(PUMP), !reached);
    }
}
