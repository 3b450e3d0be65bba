use super::DomainObject;
use crate::dispatch::DispatchError;

/// Looks up the domain object an outbox entry refers to.
///
/// `Ok(None)` means the object does not exist; errors are treated as
/// dispatch failures and retried.
pub trait ModelResolver: Send + Sync {
    fn find(
        &self,
        resource_class: &str,
        resource_id: &str,
    ) -> Result<Option<DomainObject>, DispatchError>;
}
