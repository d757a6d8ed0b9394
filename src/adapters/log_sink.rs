//! Log-based event sink and notifier adapters.
//!
//! Implement [`EventSink`] and [`Notifier`] by writing one structured
//! line per event or operator notification to the `log` facade (which
//! the host binary routes to stderr).  A web UI or MQTT adapter would
//! implement the same traits.

use log::{error, info, warn};

use crate::app::events::{Notification, RigEvent, Severity};
use crate::app::ports::{EventSink, Notifier};

/// Adapter that logs every [`RigEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &RigEvent) {
        match event {
            RigEvent::KettleUpdated(k) => {
                info!(
                    "KETTLE | {} '{}' | target={:.1}\u{00b0}C | auto={} | task={} | logic={}",
                    k.id,
                    k.name,
                    k.target_temp,
                    if k.running { "ON" } else { "OFF" },
                    if k.has_instance { "yes" } else { "no" },
                    k.logic.as_deref().unwrap_or("-"),
                );
            }
            RigEvent::StepStarted { position, name } => {
                info!("STEP | #{} '{}' started", position, name);
            }
            RigEvent::StepFinished { position, name } => {
                info!("STEP | #{} '{}' finished", position, name);
            }
            RigEvent::StepBlocked {
                position,
                name,
                reason,
            } => {
                warn!("STEP | #{} '{}' blocked: {}", position, name, reason);
            }
            RigEvent::RecipeFinished => {
                info!("STEP | recipe finished");
            }
            RigEvent::RecipeStopped { position } => {
                info!("STEP | recipe stopped at #{}", position);
            }
        }
    }
}

/// Adapter that logs every operator [`Notification`], at a level matching
/// its severity.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, n: &Notification) {
        let timeout = match n.timeout {
            Some(t) => format!("{}s", t.as_secs()),
            None => "sticky".to_string(),
        };
        match n.severity {
            Severity::Danger => error!("NOTIFY | {} | {} | {} | {}", n.severity.as_str(), n.title, n.body, timeout),
            Severity::Warning => warn!("NOTIFY | {} | {} | {} | {}", n.severity.as_str(), n.title, n.body, timeout),
            Severity::Success | Severity::Info => {
                info!("NOTIFY | {} | {} | {} | {}", n.severity.as_str(), n.title, n.body, timeout)
            }
        }
    }
}
