// Application layer: wires config, adapters and the pipeline together for the binaries.

pub mod runner;

pub use runner::run_connector;
