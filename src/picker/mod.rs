//! Pickers gather the run configuration and the tests to run.
pub mod toml;
