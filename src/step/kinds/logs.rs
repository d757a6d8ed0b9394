//! Log housekeeping steps.
//!
//! Both work on the per-device logs through the
//! [`LogArchive`](crate::app::ports::LogArchive) port; `app.log` and
//! already-archived copies are never touched.

use chrono::NaiveDate;
use log::{error, info};

use crate::app::events::{Notification, Severity};
use crate::error::ConfigError;
use crate::step::context::StepContext;
use crate::step::properties::StepProperties;
use crate::step::registry::StepKind;
use crate::step::Step;

/// Separates the brew name from the original log name in archive copies.
pub const ARCHIVE_SEPARATOR: &str = "-=-";

/// Application log, excluded from housekeeping.
pub const APP_LOG: &str = "app.log";

/// Characters stripped from brew names before they become file names.
const FORBIDDEN: &[char] = &['%', '#', '\'', '$', '´'];

pub const CLEAR_KIND: StepKind = StepKind {
    id: "clear_logs",
    name: "Clear logs",
    properties: &[],
    construct: construct_clear,
};

pub const SAVE_KIND: StepKind = StepKind {
    id: "save_logs",
    name: "Save logs",
    properties: &[],
    construct: construct_save,
};

/// `true` for per-device logs that housekeeping may clear or archive.
pub fn is_device_log(file_name: &str) -> bool {
    file_name.ends_with(".log") && file_name != APP_LOG && !file_name.contains(ARCHIVE_SEPARATOR)
}

/// Archive prefix for a brew: whitespace runs become `_`, the date is
/// appended as `_YYYY_MM_DD`, and file-name-hostile characters are
/// dropped.  Without a name the prefix is `Brew_YYYY_MM_DD`.
pub fn brew_name(configured: Option<&str>, today: NaiveDate) -> String {
    let date = today.format("%Y_%m_%d");
    let joined = configured
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join("_"))
        .unwrap_or_default();
    let name = if joined.is_empty() {
        format!("Brew_{date}")
    } else {
        format!("{joined}_{date}")
    };
    name.chars().filter(|c| !FORBIDDEN.contains(c)).collect()
}

// ---------------------------------------------------------------------------
// clear_logs
// ---------------------------------------------------------------------------

pub struct ClearLogsStep {
    cleared: bool,
}

fn construct_clear(_props: &StepProperties) -> Result<Box<dyn Step>, ConfigError> {
    Ok(Box::new(ClearLogsStep { cleared: false }))
}

impl Step for ClearLogsStep {
    fn init(&mut self, ctx: &mut StepContext<'_>) {
        match ctx.logs().clear_logs() {
            Ok(removed) => {
                info!("Removed {} device log(s)", removed);
                self.cleared = true;
            }
            Err(e) => {
                error!("Clearing logs failed: {}", e);
                ctx.send(
                    Notification::new("Clearing logs failed", e.to_string(), Severity::Danger)
                        .sticky(),
                );
            }
        }
    }

    fn execute(&mut self, ctx: &mut StepContext<'_>) {
        if self.cleared {
            ctx.notify("Logfiles Deleted!", "Starting the next step", Severity::Info);
            ctx.next();
        }
    }
}

// ---------------------------------------------------------------------------
// save_logs
// ---------------------------------------------------------------------------

pub struct SaveLogsStep {
    /// Set after a failed attempt so the operator is told only once.
    failed: bool,
}

fn construct_save(_props: &StepProperties) -> Result<Box<dyn Step>, ConfigError> {
    Ok(Box::new(SaveLogsStep { failed: false }))
}

impl Step for SaveLogsStep {
    fn execute(&mut self, ctx: &mut StepContext<'_>) {
        if self.failed {
            return;
        }
        let name = brew_name(ctx.parameter("brew_name").as_deref(), ctx.today());
        match ctx.logs().archive_logs(&name) {
            Ok(copied) => {
                info!("Archived {} device log(s) as '{}'", copied, name);
                ctx.notify(
                    "Logfiles Saved!",
                    format!("Name: {name} Starting the next step"),
                    Severity::Info,
                );
                ctx.next();
            }
            Err(e) => {
                error!("Saving logs as '{}' failed: {}", name, e);
                self.failed = true;
                ctx.send(
                    Notification::new("Saving logs failed", e.to_string(), Severity::Danger)
                        .sticky(),
                );
            }
        }
    }

    fn reset(&mut self, _ctx: &mut StepContext<'_>) {
        self.failed = false;
    }
}
