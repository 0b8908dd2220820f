//! Core types and shared functionality for pagesift.
//!
//! This crate provides:
//! - Unified error types
//! - Layered configuration
//! - Domain types shared by the extraction pipeline and its collaborators
//! - The logging port injected into pipeline components

pub mod config;
pub mod error;
pub mod log;
pub mod types;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use log::{Log, LogLevel, MemoryLog, TracingLog};
pub use types::{
    BatchReport, ExtendedMetadata, Metadata, OutputFormat, OutputKind, RouteFailure, RouteResult, UnknownFormat,
};
