//! # eoscodec-registry
//!
//! Contract registry for EOSCodec.
//!
//! ABI definitions are YAML documents (one contract per document) parsed by
//! [`AbiParser`] into record descriptors, and stored in a [`MemoryRegistry`]
//! that can be handed to the envelope codec as an `ActionRegistry`.

pub mod abi;
pub mod memory;

pub use abi::{AbiParser, ContractAbi};
pub use memory::MemoryRegistry;
