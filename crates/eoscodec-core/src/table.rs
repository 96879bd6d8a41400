//! Decoding contract table rows delivered as hex strings.

use crate::codec;
use crate::descriptor::RecordDescriptor;
use crate::error::CodecError;
use crate::hex_bytes::HexBytes;
use crate::value::Record;
use serde::Deserialize;
use tracing::warn;

/// Row listing as a node returns it: either a bare array of hex rows, or an
/// object carrying them under `rows`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RowListing {
    Bare(Vec<String>),
    Wrapped {
        rows: Vec<String>,
        #[serde(default)]
        #[allow(dead_code)]
        more: bool,
    },
}

/// Decodes hex-encoded rows of one table layout.
///
/// Decoding is all-or-nothing: the first bad row fails the whole batch.
#[derive(Debug, Clone)]
pub struct TableRowDecoder {
    descriptor: RecordDescriptor,
}

impl TableRowDecoder {
    pub fn new(descriptor: RecordDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &RecordDescriptor {
        &self.descriptor
    }

    /// Decode one row. A `0x` prefix is tolerated.
    pub fn decode_row(&self, row: &str) -> Result<Record, CodecError> {
        let bytes = HexBytes::from_hex(row)?;
        codec::unpack(&self.descriptor, &bytes)
    }

    /// Decode rows in order.
    pub fn decode<S: AsRef<str>>(&self, rows: &[S]) -> Result<Vec<Record>, CodecError> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                self.decode_row(row.as_ref()).map_err(|e| {
                    warn!(table = self.descriptor.name(), index, error = %e, "row decode failed");
                    e
                })
            })
            .collect()
    }

    /// Decode from a JSON listing: `["..", ..]` or `{"rows": ["..", ..]}`.
    pub fn decode_json(&self, json: &str) -> Result<Vec<Record>, CodecError> {
        let rows = match serde_json::from_str::<RowListing>(json)? {
            RowListing::Bare(rows) | RowListing::Wrapped { rows, .. } => rows,
        };
        self.decode(&rows)
    }
}
