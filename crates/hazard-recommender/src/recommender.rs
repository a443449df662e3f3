//! The recommender contract

use crate::error::Result;
use crate::metadata::{DialogDescriptor, ScriptMetadata};
use hazard_core::{EventSet, ValueMap, VisualFeature};

/// A short script that reads a snapshot of the session and returns event deltas
///
/// Recommenders are stateless across calls. The runtime hands `execute` a
/// copy of the selected events; nothing reaches the session until the
/// returned set has been validated as a whole.
pub trait Recommender: Send + Sync {
    fn metadata(&self) -> ScriptMetadata;

    /// Dialog to show before `execute`, if the recommender needs one
    fn define_dialog(&self, _events: &EventSet) -> Option<DialogDescriptor> {
        None
    }

    /// Features the forecaster manipulates before `execute`
    fn define_spatial_info(&self) -> Vec<VisualFeature> {
        Vec::new()
    }

    fn execute(
        &self,
        events: &EventSet,
        dialog_input: &ValueMap,
        spatial_input: &[VisualFeature],
    ) -> Result<EventSet>;
}
