//! The payload-type lookup the envelope codec consults.
//!
//! Concrete implementations live in `eoscodec-registry`. Any
//! `Fn(Name, Name) -> Option<RecordDescriptor>` closure also works, so callers
//! can inject a plain function or a match statement.

use crate::descriptor::RecordDescriptor;
use crate::name::{AccountName, ActionName};

/// Resolves (contract, action) to the payload layout of that action.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`. If an implementation is populated
/// while lookups are running, it is responsible for its own synchronization.
pub trait ActionRegistry: Send + Sync {
    fn resolve(&self, contract: AccountName, action: ActionName) -> Option<RecordDescriptor>;
}

/// Blanket impl so closures can be used as registries.
impl<F> ActionRegistry for F
where
    F: Fn(AccountName, ActionName) -> Option<RecordDescriptor> + Send + Sync,
{
    fn resolve(&self, contract: AccountName, action: ActionName) -> Option<RecordDescriptor> {
        self(contract, action)
    }
}

/// A registry that knows no payload types.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPayloads;

impl ActionRegistry for NoPayloads {
    fn resolve(&self, _contract: AccountName, _action: ActionName) -> Option<RecordDescriptor> {
        None
    }
}
