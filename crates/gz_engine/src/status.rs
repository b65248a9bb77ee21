//! crates/gz_engine/src/status.rs
//! Farmer-driven status mutations outside the approval path. A rejected
//! allocation drops out of overlap history; feedback marks the proposal
//! `modified` and keeps the text on the record.

use gz_core::clock::Clock;
use gz_core::entities::AllocationStatus;
use gz_core::ids::AllocationId;

use crate::{Engine, EngineResult};

impl<C: Clock> Engine<C> {
    /// Marks an allocation rejected. Its geometry is thereafter excluded
    /// from overlap resolution for later proposals.
    pub fn reject_allocation(
        &mut self,
        id: &AllocationId,
        rejected_by: impl Into<String>,
    ) -> EngineResult<()> {
        let today = self.today();
        let mut allocation = self.store().allocation(id)?.clone();
        allocation.status = AllocationStatus::Rejected;
        allocation.feedback = Some(format!("rejected by {}", rejected_by.into()));
        allocation.updated_on = today;
        self.store_mut().update_allocation(allocation)?;
        Ok(())
    }

    /// Records farmer feedback on a proposal and marks it modified.
    pub fn record_feedback(
        &mut self,
        id: &AllocationId,
        feedback: impl Into<String>,
    ) -> EngineResult<()> {
        let today = self.today();
        let mut allocation = self.store().allocation(id)?.clone();
        allocation.status = AllocationStatus::Modified;
        allocation.feedback = Some(feedback.into());
        allocation.updated_on = today;
        self.store_mut().update_allocation(allocation)?;
        Ok(())
    }
}
