pub mod session;
pub mod store;
pub mod supervisor;

pub use session::{SessionEnd, TelemetrySource, WsTelemetrySource};
pub use store::{SnapshotObserver, TelemetrySnapshot, TelemetryStore};
pub use supervisor::{ReconnectSupervisor, RetryPolicy};
