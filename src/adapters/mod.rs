//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements        | Connects to                  |
//! |--------------|-------------------|------------------------------|
//! | `serial`     | TelemetryChannel  | USB serial controller board  |
//! | `log_sink`   | EventSink         | `log` facade                 |
//! | `clock`      | Clock             | Local system time            |
//! | `camera`     | CapturePort       | External capture command     |
//! | `classifier` | ClassifierPort    | External classifier command  |
//! | `console`    | (driving)         | Operator stdin               |
//!
//! The CSV [`Journal`](crate::journal::Journal) implements `JournalPort`
//! directly.

pub mod camera;
pub mod classifier;
pub mod clock;
pub mod console;
pub mod log_sink;
pub mod serial;
pub(super) mod utils;
