//! Undo/redo history for schema-partitioned models.
//!
//! A model edited in the meditor is split into a *basic* and a *complex*
//! sub-model (see [`schema`](crate::schema)), each rendered by its own form.
//! The [`Tracker`] records every field-level change to either of them in a
//! single linear log and can walk that log backwards and forwards:
//!
//! ```
//! use meditor::{Model, model, transaction::{ApplyModel, Partition, Tracker}};
//!
//! struct Forms {
//!     basic: Model,
//!     complex: Model,
//! }
//!
//! impl ApplyModel for Forms {
//!     fn apply_basic_model(&mut self, model: &Model) {
//!         self.basic = model.clone();
//!     }
//!
//!     fn apply_complex_model(&mut self, model: &Model) {
//!         self.complex = model.clone();
//!     }
//! }
//!
//! let mut forms = Forms {
//!     basic: model!({"name": "A", "license": []}),
//!     complex: model!({"contributor": []}),
//! };
//! let mut tracker = Tracker::new(&forms.basic, &forms.complex);
//!
//! // one form change touching two fields records two transactions
//! tracker.add(&model!({"name": "B", "license": ["spdx:CC0-1.0"]}), Partition::Basic);
//! tracker.add(&model!({"contributor": [{"name": "Doe, Jane"}]}), Partition::Complex);
//! assert_eq!(tracker.transaction_pointer(), 2);
//!
//! assert_eq!(tracker.undo(&mut forms), Some(Partition::Complex));
//! assert_eq!(forms.complex, model!({"contributor": []}));
//! assert_eq!(tracker.undo(&mut forms), Some(Partition::Basic));
//! assert_eq!(forms.basic, model!({"name": "B", "license": []}));
//!
//! assert_eq!(tracker.redo(&mut forms), Some(Partition::Basic));
//! assert!(tracker.are_transactions_ahead());
//! ```
//!
//! # Granularity
//!
//! Undo and redo work on single fields, not on the form change that produced
//! them. A change to several fields at once is undone in several steps.
//!
//! # Return values
//!
//! [`Tracker::undo`] and [`Tracker::redo`] return `None` when there is nothing
//! to do, and otherwise the [`Partition`] they touched so that the caller can
//! re-render and re-validate the right form.

mod record;
mod tracker;

pub use record::{Partition, Transaction};
pub use tracker::{ApplyModel, RestoreError, Tracker};
