pub mod completion;
pub mod config;
pub mod explain;
pub mod generate;
pub mod metrics;
