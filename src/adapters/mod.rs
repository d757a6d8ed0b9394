//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements          | Connects to                 |
//! |---------------|---------------------|-----------------------------|
//! | `config_file` | ConfigPort          | JSON file on disk           |
//! | `log_archive` | LogArchive          | Log directory               |
//! | `log_sink`    | EventSink, Notifier | `log` facade                |
//! | `sim`         | ActuatorPort        | Simulated thermal model     |
//! |               | SensorPort          |                             |
//! | `time`        | Clock               | `Instant` + local calendar  |

pub mod config_file;
pub mod log_archive;
pub mod log_sink;
pub mod sim;
pub mod time;
