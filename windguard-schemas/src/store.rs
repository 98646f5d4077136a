//! Reading and writing baseline files

use std::fs;
use std::path::Path;

use apache_avro::{Reader, Writer};
use windguard_core::{Baseline, PipelineConfig};

use crate::record::BaselineRecord;
use crate::schemas::baseline_v1;
use crate::SchemaError;

/// On-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Pretty-printed JSON
    Json,
    /// Avro object container with the embedded `Baseline` schema
    Avro,
}

impl Format {
    /// `.avro` files are Avro, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("avro") => Format::Avro,
            _ => Format::Json,
        }
    }
}

/// Encode one record as pretty-printed JSON
pub fn to_json(record: &BaselineRecord) -> Result<String, SchemaError> {
    serde_json::to_string_pretty(record).map_err(|e| SchemaError::EncodeError(e.to_string()))
}

/// Decode one JSON record
pub fn from_json(text: &str) -> Result<BaselineRecord, SchemaError> {
    serde_json::from_str(text).map_err(|e| SchemaError::ParseError(e.to_string()))
}

/// Encode one record as an Avro object container
pub fn to_avro(record: &BaselineRecord) -> Result<Vec<u8>, SchemaError> {
    let schema = baseline_v1()?;
    let mut writer = Writer::new(&schema, Vec::new());
    writer.append_ser(record).map_err(|e| SchemaError::EncodeError(e.to_string()))?;
    writer.into_inner().map_err(|e| SchemaError::EncodeError(e.to_string()))
}

/// Decode the first record of an Avro object container
pub fn from_avro(bytes: &[u8]) -> Result<BaselineRecord, SchemaError> {
    let schema = baseline_v1()?;
    let mut reader = Reader::with_schema(&schema, bytes).map_err(|e| SchemaError::ParseError(e.to_string()))?;
    let value = reader
        .next()
        .ok_or_else(|| SchemaError::NotFound("baseline record".to_string()))?
        .map_err(|e| SchemaError::ParseError(e.to_string()))?;
    apache_avro::from_value::<BaselineRecord>(&value).map_err(|e| SchemaError::ParseError(e.to_string()))
}

/// Persist `baseline` with its configuration, format chosen by extension.
pub fn save(path: &Path, config: &PipelineConfig, baseline: &Baseline) -> Result<(), SchemaError> {
    let record = BaselineRecord::new(config, baseline)?;
    let bytes = match Format::from_path(path) {
        Format::Json => to_json(&record)?.into_bytes(),
        Format::Avro => to_avro(&record)?,
    };
    fs::write(path, bytes).map_err(|e| SchemaError::IoError(format!("{}: {}", path.display(), e)))?;
    log::info!("saved baseline {} to {}", record.fingerprint, path.display());
    Ok(())
}

/// Load and verify a baseline file.
pub fn load(path: &Path) -> Result<(PipelineConfig, Baseline), SchemaError> {
    let bytes = fs::read(path).map_err(|e| SchemaError::IoError(format!("{}: {}", path.display(), e)))?;
    let record = match Format::from_path(path) {
        Format::Json => {
            let text = std::str::from_utf8(&bytes).map_err(|e| SchemaError::ParseError(e.to_string()))?;
            from_json(text)?
        }
        Format::Avro => from_avro(&bytes)?,
    };

    match record.restore() {
        Ok(restored) => {
            log::debug!("loaded baseline {} from {}", record.fingerprint, path.display());
            Ok(restored)
        }
        Err(e) => {
            log::warn!("rejected baseline in {}: {}", path.display(), e);
            Err(e)
        }
    }
}
