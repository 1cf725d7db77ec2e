//! File system glue around the generators: a YAML manifest of jobs, the
//! Kubernetes types available without a schema document and the writing of
//! generated Go units.
pub mod builtin;
pub mod generate;
pub mod logging;
pub mod manifest;
pub mod yaml;
