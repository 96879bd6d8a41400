//! # eoscodec-core
//!
//! Name encoding, the binary ABI packer/unpacker, action envelopes and
//! table-row decoding for EOSIO-family chains. Registries, the CLI and the
//! logging setup are built on top of the types defined here.

pub mod codec;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod hex_bytes;
pub mod interchange;
pub mod name;
pub mod primitive;
pub mod registry;
pub mod symbol;
pub mod table;
pub mod value;

pub use descriptor::{FieldKind, FieldSpec, IntWidth, RecordDescriptor, RecordDescriptorBuilder};
pub use envelope::{ActionEnvelope, Resolution};
pub use error::{CodecError, RegistryError};
pub use hex_bytes::HexBytes;
pub use name::{name_to_string, string_to_name, AccountName, ActionName, Name};
pub use primitive::{Reader, Writer};
pub use registry::{ActionRegistry, NoPayloads};
pub use symbol::Symbol;
pub use table::TableRowDecoder;
pub use value::{Record, Value};
