//! Sensor-to-event pipeline: collector, scheduler and classifier wired
//! together behind three commands (`start`, `stop`, `simulate`) and three
//! signals (state, last event, diagnostics).

mod dispatch;
mod lifecycle;
mod orchestrator;


pub use orchestrator::PipelineOrchestrator;
