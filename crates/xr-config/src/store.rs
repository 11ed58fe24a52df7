//! Record store port.
//!
//! The compiler never owns records: every compile call receives the store
//! explicitly and reads one snapshot from it. Consistency of that snapshot
//! (one transaction per call) is the store's job.

use crate::model::InboundRecord;
use std::sync::Arc;
use xr_types::StoreError;

/// Read-only access to the stored listeners.
pub trait InboundStore: Send + Sync {
    /// All listener records in stable stored order.
    fn inbounds(&self) -> Result<Vec<InboundRecord>, StoreError>;
}

impl InboundStore for [InboundRecord] {
    fn inbounds(&self) -> Result<Vec<InboundRecord>, StoreError> {
        Ok(self.to_vec())
    }
}

impl InboundStore for Vec<InboundRecord> {
    fn inbounds(&self) -> Result<Vec<InboundRecord>, StoreError> {
        Ok(self.clone())
    }
}

impl<S: InboundStore + ?Sized> InboundStore for &S {
    fn inbounds(&self) -> Result<Vec<InboundRecord>, StoreError> {
        (**self).inbounds()
    }
}

impl<S: InboundStore + ?Sized> InboundStore for Arc<S> {
    fn inbounds(&self) -> Result<Vec<InboundRecord>, StoreError> {
        (**self).inbounds()
    }
}
