//! Hazard Recommender - runtime for short event-recommending scripts
//!
//! Provides:
//! - Script metadata, dialog descriptors and the cancel convention
//! - The `Recommender` trait and the shipped recommenders
//! - A runtime that applies results atomically and honours result flags
//! - A scheduler for time-interval, frame-change and data-layer triggers

mod error;
mod metadata;
mod recommender;
pub mod recommenders;
mod runtime;
mod scheduler;
mod write_set;

pub use error::{Error, Result};
pub use metadata::{dismiss_choice, DialogButton, DialogDescriptor, ScriptMetadata, DISMISS_CHOICE_KEY};
pub use recommender::Recommender;
pub use runtime::{RecommenderInput, RecommenderOutcome, RecommenderRuntime, Trigger};
pub use scheduler::{EventDrivenScheduler, ScheduledRun};
pub use write_set::{PendingWrite, WriteSet};
