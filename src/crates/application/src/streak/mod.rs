pub mod progress;
pub mod supervisor;

pub use progress::{progress_channel, ProgressSink, ProgressStream, StreakBoard, StreakState};
pub use supervisor::{CalculationOutcome, RejectReason, StreakRun, StreakSupervisor};
