pub mod telemetry;

pub use telemetry::{encode_payload, CycleStats, TelemetryAgent};
