//! BrewService surface: construction checks, operator commands,
//! telemetry and shutdown.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use brewrig::app::commands::RigCommand;
use brewrig::app::events::Severity;
use brewrig::app::service::BrewService;
use brewrig::control::AutoMode;
use brewrig::error::{ConfigError, ControlError, Error};
use brewrig::kettle::KettleId;
use brewrig::step::properties::StepProperties;
use brewrig::step::{StepPhase, StepRegistry};

use crate::mock_hw::{CountingFactory, KETTLE, Rig, config, controllers, step, wait_until};

fn pause(name: &str) -> brewrig::config::RecipeStep {
    step(name, "manual", StepProperties::new().with("proceed", "Pause"))
}

#[test]
fn unknown_algorithm_is_rejected_at_construction() {
    let rig = Rig::new();
    let cfg = config(Some("fuzzy"), vec![pause("Mash")]);

    let result = BrewService::new(
        &cfg,
        rig.ports(&cfg),
        controllers(),
        StepRegistry::with_builtins(),
    );

    assert!(matches!(
        result,
        Err(ConfigError::UnknownAlgorithm(name)) if name == "fuzzy"
    ));
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let rig = Rig::new();
    let mut cfg = config(None, vec![pause("Mash")]);
    cfg.tick_interval_ms = 0;

    let result = BrewService::new(
        &cfg,
        rig.ports(&cfg),
        controllers(),
        StepRegistry::with_builtins(),
    );

    assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
}

#[test]
fn non_finite_target_is_rejected() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![pause("Mash")]));

    let err = svc
        .handle_command(RigCommand::SetTargetTemp {
            kettle: KETTLE,
            target: f64::NAN,
        })
        .unwrap_err();

    assert!(matches!(err, Error::Config(ConfigError::InvalidProperty { .. })));
    assert_eq!(svc.supervisor().snapshot(KETTLE).unwrap().target_temp, 20.0);
}

#[test]
fn commands_on_unknown_kettle_fail() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![pause("Mash")]));
    let ghost = KettleId(7);

    let err = svc
        .handle_command(RigCommand::SetAutoMode {
            kettle: ghost,
            mode: AutoMode::On,
        })
        .unwrap_err();
    assert_eq!(err, Error::Control(ControlError::UnknownKettle(ghost)));

    let err = svc
        .handle_command(RigCommand::SetTargetTemp {
            kettle: ghost,
            target: 50.0,
        })
        .unwrap_err();
    assert_eq!(err, Error::Control(ControlError::UnknownKettle(ghost)));
}

#[test]
fn operator_toggles_auto_mode() {
    let rig = Rig::new();
    let factory = CountingFactory::default();
    let exited = Arc::clone(&factory.exited);
    let mut reg = controllers();
    reg.register(Box::new(factory));
    let mut svc = rig.service_with(&config(Some("idle"), vec![pause("Mash")]), reg);

    svc.handle_command(RigCommand::SetAutoMode {
        kettle: KETTLE,
        mode: AutoMode::On,
    })
    .unwrap();
    assert!(svc.supervisor().is_running(KETTLE));
    assert!(svc.supervisor().snapshot(KETTLE).unwrap().has_instance);

    svc.handle_command(RigCommand::SetAutoMode {
        kettle: KETTLE,
        mode: AutoMode::Off,
    })
    .unwrap();
    assert!(!svc.supervisor().is_running(KETTLE));
    assert!(wait_until(|| exited.load(Ordering::SeqCst) == 1));
}

#[test]
fn failed_auto_mode_command_alerts_the_operator() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(Some("broken"), vec![pause("Mash")]));

    let err = svc
        .handle_command(RigCommand::SetAutoMode {
            kettle: KETTLE,
            mode: AutoMode::On,
        })
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Control(ControlError::StartFailed { kettle, .. }) if kettle == KETTLE
    ));
    assert!(!svc.supervisor().is_running(KETTLE));
    let alerts = rig.notifier.with_severity(Severity::Danger);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Error");
    assert_eq!(alerts[0].body, "Failed to set Auto mode ON");
}

#[test]
fn telemetry_reflects_step_and_kettles() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![pause("Mash"), pause("Boil")]));

    let idle = svc.build_telemetry();
    assert!(idle.step.is_none());
    assert!(!idle.finished);
    assert_eq!(idle.kettles.len(), 1);

    svc.start();
    svc.handle_command(RigCommand::Next).unwrap();
    rig.tick(&mut svc, 1);

    let t = svc.build_telemetry();
    let step = t.step.unwrap();
    assert_eq!(step.position, 1);
    assert_eq!(step.name, "Boil");
    assert_eq!(step.phase, StepPhase::Executing);
    assert_eq!(t.kettles[0].id, KETTLE);
    assert!(!t.kettles[0].running);
    assert_eq!(svc.tick_count(), 1);
}

#[test]
fn shutdown_stops_recipe_and_loops() {
    let rig = Rig::new();
    let factory = CountingFactory::default();
    let exited = Arc::clone(&factory.exited);
    let mut reg = controllers();
    reg.register(Box::new(factory));
    let heat = step(
        "Heat",
        "target",
        StepProperties::new()
            .with("kettle", 1u32)
            .with("target", 66.0)
            .with("auto_mode", "Set to ON"),
    );
    let mut svc = rig.service_with(&config(Some("idle"), vec![heat, pause("Mash")]), reg);

    svc.start();
    assert!(svc.supervisor().is_running(KETTLE));

    let failures = svc.shutdown();

    assert!(failures.is_empty());
    assert!(svc.runner().is_idle());
    assert!(!svc.supervisor().is_running(KETTLE));
    assert!(wait_until(|| exited.load(Ordering::SeqCst) == 1));
}

#[test]
fn restart_after_stop_begins_at_first_step() {
    let rig = Rig::new();
    let mut svc = rig.service(&config(None, vec![pause("Mash"), pause("Boil")]));

    svc.start();
    svc.handle_command(RigCommand::Next).unwrap();
    svc.handle_command(RigCommand::Stop).unwrap();
    svc.handle_command(RigCommand::Start).unwrap();

    assert_eq!(svc.runner().position(), Some(0));
}
