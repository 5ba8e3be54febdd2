pub mod collector;
pub mod printer;

pub use collector::MetricsCollector;
