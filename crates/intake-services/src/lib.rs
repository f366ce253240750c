//! Intake Services Layer
//!
//! Adapters around the processing pipeline: ClamAV scanners implementing
//! [`intake_processing::VirusScanner`], the configuration-driven scanner factory, and the
//! background sweeper that removes orphaned quarantine files.

pub mod services;

#[cfg(feature = "cleanup")]
pub mod cleanup;

#[cfg(feature = "cleanup")]
pub use cleanup::QuarantineSweeper;
#[cfg(feature = "clamd")]
pub use services::clamav::ClamdScanner;
pub use services::clamav::ClamScanCommand;
pub use services::scanner_from_config;
