//! WindGuard Avro schemas
//!
//! Field names match the serde names of [`crate::BaselineRecord`] so that
//! records go through `append_ser` / `from_value` without a mapping layer.

use apache_avro::Schema;
use serde_json::json;

use crate::SchemaError;

/// Fully qualified name of the baseline record
pub const BASELINE_V1: &str = "io.windguard.baseline.v1.Baseline";

/// Frozen baseline schema v1
pub fn baseline_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": "io.windguard.baseline.v1",
        "type": "record",
        "name": "Baseline",
        "doc": "Per-channel z-score statistics bound to a preprocessing configuration",
        "fields": [
            {
                "name": "fingerprint",
                "type": "string",
                "doc": "MD5 of the canonical configuration, 32 lowercase hex digits"
            },
            {
                "name": "config",
                "type": {
                    "type": "record",
                    "name": "Config",
                    "fields": [
                        {
                            "name": "channels",
                            "type": {"type": "array", "items": "string"},
                            "doc": "Channel names in tensor order"
                        },
                        {"name": "wavelet", "type": "string"},
                        {"name": "levels", "type": "long"},
                        {
                            "name": "block_len",
                            "type": "long",
                            "doc": "Denoising block length, 0 for whole-sequence"
                        },
                        {"name": "noise_scale", "type": "string"},
                        {"name": "window_len", "type": "long"},
                        {"name": "rows", "type": "long"},
                        {"name": "cols", "type": "long"},
                        {"name": "stride", "type": "long"}
                    ]
                }
            },
            {
                "name": "stats",
                "type": {
                    "type": "array",
                    "items": {
                        "type": "record",
                        "name": "ChannelStats",
                        "fields": [
                            {"name": "channel", "type": "string"},
                            {"name": "mean", "type": "double"},
                            {"name": "std_dev", "type": "double"}
                        ]
                    }
                }
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_schema_parses() {
        let schema = baseline_v1().unwrap();
        match schema {
            Schema::Record(record) => {
                assert_eq!(record.name.fullname(None), BASELINE_V1);
                assert_eq!(record.fields.len(), 3);
            }
            other => panic!("expected a record schema, got {:?}", other),
        }
    }
}
