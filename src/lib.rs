// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # meditor: undo/redo for schema-driven metadata editing
//!
//! This crate holds the model side of a metadata editor for JSON documents
//! described by a JSON Schema (draft 7). The editor renders a document with
//! two kinds of forms, and the crate provides what sits behind them:
//!
//! - [`schema`]: splitting a schema into a *basic* half (scalars, enums,
//!   arrays of those), edited in one flat form, and a *complex* half (nested
//!   objects, arrays of objects), where every field gets a dedicated editor.
//!   Models are filtered into matching sub-models and written back.
//! - [`transaction`]: the [`Tracker`](transaction::Tracker), a bounded,
//!   linear undo/redo log of field-level edits to both sub-models.
//! - [`persistence`]: crash recovery. The log, its pointer and the model are
//!   written to a [`SessionStore`](persistence::SessionStore) so an
//!   interrupted session can be resumed.
//! - [`editor`]: the [`Editor`](editor::Editor), which ties the above
//!   together for one document.
//! - [`config`]: tunables such as the history bound.
//!
//! ## Getting Started
//!
//! ```rust
//! use meditor::{editor::Editor, model, transaction::Partition};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": {
//!         "name": {"type": "string"},
//!         "license": {"type": "array", "items": {"type": "string", "enum": ["spdx:CC0-1.0"]}},
//!         "contributor": {"type": "array", "items": {"type": "object", "properties": {}}},
//!     },
//! });
//! let mut editor = Editor::new(&schema, &model!({"name": "Brain atlas"}));
//! assert_eq!(editor.basic_model(), &model!({"name": "Brain atlas", "license": []}));
//!
//! // the basic form reports its whole content after every change
//! let mut form = editor.basic_model().clone();
//! form.insert("license".into(), json!(["spdx:CC0-1.0"]));
//! assert_eq!(editor.edit_basic(form), 1);
//!
//! assert_eq!(editor.undo(), Some(Partition::Basic));
//! assert_eq!(editor.model()["license"], json!([]));
//! assert_eq!(editor.redo(), Some(Partition::Basic));
//! assert!(editor.is_modified());
//! ```
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]: history changes at `debug` level, and
//! failed session writes at `warn` level. Install a subscriber to see them.
//!
//! ## Features
//!
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for transactions and
//!   partitions, useful for property-based testing.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

/// A JSON object being edited, or one of its sub-models.
///
/// Keys keep their insertion order, which determines the order in which a
/// multi-field edit is recorded.
pub type Model = serde_json::Map<String, serde_json::Value>;

pub mod config;
pub mod editor;
/// Macros usable for tests and initialization
pub mod macros;
pub mod persistence;
pub mod schema;
pub mod transaction;

// re-export for the model macro
#[doc(hidden)]
pub use serde_json;
