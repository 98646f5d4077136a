//! Baseline Persistence for WindGuard
//!
//! ## Overview
//!
//! A fitted [`Baseline`](windguard_core::Baseline) is only useful if the
//! edge device can load exactly the statistics the training run produced,
//! and only under the configuration they were produced for. This crate
//! stores the baseline together with that configuration and its
//! fingerprint, in one of two encodings:
//!
//! - **JSON**: readable, diffable, for workstations and review
//! - **Avro**: compact object container carrying its own schema
//!   (`io.windguard.baseline.v1.Baseline`), for shipping to devices
//!
//! ## Loading Is Validation
//!
//! Nothing read from disk is trusted. Loading re-parses every name,
//! re-validates the configuration, recomputes the fingerprint from it and
//! rebuilds every channel entry through the same checks as a fresh fit.
//! A stored file whose configuration was edited after the fact fails with
//! [`SchemaError::FingerprintMismatch`].
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::path::Path;
//! use windguard_core::{Pipeline, PipelineConfig};
//!
//! # fn reference() -> Vec<windguard_core::Sample> { Vec::new() }
//! let config = PipelineConfig::builder().blocked(400).build()?;
//! let pipeline = Pipeline::new(config.clone())?;
//! let baseline = pipeline.fit(&reference())?;
//!
//! windguard_schemas::save(Path::new("wt07.avro"), &config, &baseline)?;
//! let (config, baseline) = windguard_schemas::load(Path::new("wt07.avro"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use windguard_core::PipelineError;

pub mod record;
pub mod schemas;
pub mod store;

pub use record::{BaselineRecord, ConfigRecord, StatRecord};
pub use store::{from_avro, from_json, load, save, to_avro, to_json, Format};

/// Schema and persistence errors
#[derive(Debug, thiserror_no_std::Error)]
pub enum SchemaError {
    /// Stored bytes are not a readable record
    #[error("Failed to parse: {0}")]
    ParseError(String),

    /// Record could not be serialized
    #[error("Failed to encode: {0}")]
    EncodeError(String),

    /// File could not be read or written
    #[error("I/O error: {0}")]
    IoError(String),

    /// Container holds no record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Integer field out of range for its encoding
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Stored configuration or statistics fail the pipeline's checks
    #[error("Invalid baseline: {0}")]
    InvalidBaseline(PipelineError),

    /// Stored fingerprint does not hash from the stored configuration
    #[error("Fingerprint mismatch: stored {stored}, configuration hashes to {computed}")]
    FingerprintMismatch {
        /// Fingerprint as written in the file
        stored: String,
        /// Fingerprint of the restored configuration
        computed: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use windguard_core::Channel;

    #[test]
    fn errors_render_their_cause() {
        let err = SchemaError::InvalidBaseline(PipelineError::MissingChannel { channel: Channel::Pitch });
        assert_eq!(err.to_string(), "Invalid baseline: Baseline has no statistics for channel pitch");

        let err = SchemaError::NotFound("baseline record".to_string());
        assert_eq!(err.to_string(), "Not found: baseline record");
    }
}
