//! Server module for Conductor
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration and catalog loading from files and environment
//! - `init`: Engine construction and the HTTP run loop

pub mod config;
mod init;
mod loader;

pub use init::{build_engine, run};
pub use loader::{load_benchmarks, load_config, load_skills};
