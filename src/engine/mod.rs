//! Worker fan-out and the run boundary around it.
mod manager;
mod report;
mod runner;
mod state;


pub use manager::{Manager, ManagerReport, WorkerGauge, Workload};
pub use report::{RunReport, RunSummary};
pub use runner::ScenarioRunner;
pub use state::{RunState, RunStatus};
