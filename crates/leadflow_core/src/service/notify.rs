//! Post-save notification seam.
//!
//! Observers run after the lead and its events are durable. A failing
//! observer is logged by the caller and never unwinds the save.

use crate::model::event::LeadEvent;
use crate::model::lead::Lead;
use std::error::Error;

pub type ObserverError = Box<dyn Error + Send + Sync>;

/// Receives every durably saved lead, e.g. to forward it to a webhook.
pub trait LeadObserver: Send + Sync {
    fn lead_saved(&self, lead: &Lead, events: &[LeadEvent]) -> Result<(), ObserverError>;
}

/// Observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LeadObserver for NoopObserver {
    fn lead_saved(&self, _lead: &Lead, _events: &[LeadEvent]) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Per-save switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Skip observer notification for this save.
    pub skip_hooks: bool,
}
