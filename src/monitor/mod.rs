pub mod controller;
pub mod loop_worker;

pub use controller::{MonitorController, MonitorState};
pub use loop_worker::{log_report, monitor_loop, run_tick, TickReport};
