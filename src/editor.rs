// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The editor interface: the glue between a full model, its schema, the two
//! sub-model forms and the undo/redo history.
//!
//! An [`Editor`] takes a model and its JSON Schema, splits both into basic and
//! complex halves (see [`schema`](crate::schema)), and keeps one live
//! sub-model per half. Form changes go through the `edit_*` methods, which
//! record them in the [`Tracker`]; [`Editor::undo`] and [`Editor::redo`] push
//! history back into the live sub-models. [`Editor::model`] reassembles the
//! full model.
//!
//! ```
//! use meditor::{editor::Editor, model, transaction::Partition};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": {"type": "string"},
//!         "contributor": {"type": "array", "items": {"type": "object"}},
//!     },
//! });
//! let mut editor = Editor::new(&schema, &model!({"name": "Brain atlas"}));
//! assert_eq!(editor.complex_model(), &model!({"contributor": []}));
//!
//! editor.edit_complex_prop("contributor", json!([{"name": "Doe, Jane"}]));
//! editor.edit_basic(model!({"name": "Mouse brain atlas"}));
//! assert_eq!(editor.model()["name"], "Mouse brain atlas");
//!
//! assert_eq!(editor.undo(), Some(Partition::Basic));
//! assert_eq!(editor.undo(), Some(Partition::Complex));
//! assert_eq!(editor.undo(), None);
//! assert_eq!(
//!     editor.model(),
//!     &model!({"name": "Brain atlas", "contributor": []})
//! );
//! ```
//!
//! # Sessions
//!
//! With a [`SessionStore`] attached, the editor saves the full model after
//! every change (and the tracker saves the history), so that an interrupted
//! session can be resumed with [`Editor::restore_session`].

use crate::{
    Model,
    config::TrackerConfig,
    persistence::{NoPersistence, SessionKey, SessionStore},
    schema::{
        compute_basic_schema, compute_complex_schema, filter_model_with_schema,
        populate_empty_arrays, write_sub_model_to_master,
    },
    transaction::{ApplyModel, Partition, RestoreError, Tracker},
};
use ahash::RandomState;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Error returned when a saved session cannot be resumed.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to read the saved session")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("saved session has an invalid history")]
    History(#[from] RestoreError),
}

/// The sub-models currently shown in the forms.
#[derive(Debug, Clone, Default)]
struct LiveModels {
    basic: Model,
    complex: Model,
}

/// Entries are merged in; keys absent from `from` are left alone.
fn merge(into: &mut Model, from: &Model) {
    for (key, value) in from {
        into.insert(key.clone(), value.clone());
    }
}

impl ApplyModel for LiveModels {
    fn apply_basic_model(&mut self, model: &Model) {
        merge(&mut self.basic, model);
    }

    fn apply_complex_model(&mut self, model: &Model) {
        merge(&mut self.complex, model);
    }
}

/// Owns a model being edited, split into basic and complex sub-models.
#[derive(Debug)]
pub struct Editor<P = NoPersistence> {
    // only up to date right after sync_model
    model: Model,
    schema: Value,
    basic_schema: Value,
    complex_schema: Value,
    live: LiveModels,
    basic_model_valid: bool,
    complex_model_validation: HashMap<String, bool, RandomState>,
    tracker: Tracker<P>,
}

impl Editor {
    /// Starts editing `model` against `schema`.
    ///
    /// Array fields that are missing or `null` are initialised to `[]` first,
    /// so that their forms have something to append to.
    pub fn new(schema: &Value, model: &Model) -> Self {
        let mut model = model.clone();
        let schema = schema.clone();
        populate_empty_arrays(&schema, &mut model);

        let basic_schema = compute_basic_schema(&schema);
        let complex_schema = compute_complex_schema(&schema);

        let live = LiveModels {
            basic: filter_model_with_schema(&model, &basic_schema),
            complex: filter_model_with_schema(&model, &complex_schema),
        };
        let complex_model_validation = live
            .complex
            .keys()
            .map(|key| (key.clone(), true))
            .collect();
        let tracker = Tracker::new(&live.basic, &live.complex);

        Self {
            model,
            schema,
            basic_schema,
            complex_schema,
            live,
            basic_model_valid: false,
            complex_model_validation,
            tracker,
        }
    }
}

impl<P: SessionStore> Editor<P> {
    /// Saves the session to `store` under `session` from now on.
    pub fn with_session<Q: SessionStore>(self, store: Q, session: SessionKey) -> Editor<Q> {
        Editor {
            model: self.model,
            schema: self.schema,
            basic_schema: self.basic_schema,
            complex_schema: self.complex_schema,
            live: self.live,
            basic_model_valid: self.basic_model_valid,
            complex_model_validation: self.complex_model_validation,
            tracker: self.tracker.with_persistence(store, session),
        }
    }

    pub fn with_tracker_config(mut self, config: TrackerConfig) -> Self {
        self.tracker = self.tracker.with_config(config);
        self
    }

    /// Resumes the session saved in `store` under `session`, or starts a new
    /// one from `model` if there is none.
    ///
    /// Use [`SessionStore::has_session`] beforehand to let the user choose
    /// between the two, and [`Editor::clear_session`] to discard a saved session.
    pub fn restore_session(
        schema: &Value,
        model: &Model,
        store: P,
        session: SessionKey,
    ) -> Result<Self, SessionError> {
        let saved_model = store.load_model(&session).map_err(boxed)?;
        let saved_history = store.load(&session).map_err(boxed)?;

        let (Some(saved_model), Some(saved_history)) = (saved_model, saved_history) else {
            debug!(%session, "no saved session, starting afresh");
            return Ok(Editor::new(schema, model).with_session(store, session));
        };

        let mut editor = Editor::new(schema, &saved_model).with_session(store, session);
        editor.tracker.restore(saved_history)?;
        debug!(
            session = %editor.tracker.session(),
            pointer = editor.tracker.transaction_pointer(),
            "resumed saved session"
        );
        Ok(editor)
    }

    /// Removes the saved session from the store.
    pub fn clear_session(&mut self) -> Result<(), P::Error> {
        let session = self.tracker.session().clone();
        self.tracker.store_mut().clear(&session)
    }

    /// Replaces the live sub-models with the matching parts of `model`.
    ///
    /// This is not recorded as an edit.
    pub fn set_model(&mut self, model: &Model) {
        self.set_basic_model(&filter_model_with_schema(model, &self.basic_schema));
        self.set_complex_model(&filter_model_with_schema(model, &self.complex_schema));
    }

    /// Writes the live sub-models back into the full model.
    pub fn sync_model(&mut self) {
        write_sub_model_to_master(&self.live.basic, &self.basic_schema, &mut self.model);
        write_sub_model_to_master(&self.live.complex, &self.complex_schema, &mut self.model);
    }

    /// The full model, including every change made so far.
    pub fn model(&mut self) -> &Model {
        self.sync_model();
        &self.model
    }

    /// Merges `model` into the live basic sub-model without recording it.
    pub fn set_basic_model(&mut self, model: &Model) {
        self.live.apply_basic_model(model);
    }

    /// Merges `model` into the live complex sub-model without recording it.
    pub fn set_complex_model(&mut self, model: &Model) {
        self.live.apply_complex_model(model);
    }

    /// Sets one field of the live complex sub-model without recording it.
    pub fn set_complex_model_prop(&mut self, key: impl Into<String>, value: Value) {
        self.live.complex.insert(key.into(), value);
    }

    /// Records a change of the basic form, whose full content is now `model`.
    ///
    /// Returns the number of fields that changed.
    pub fn edit_basic(&mut self, model: Model) -> usize {
        let recorded = self.tracker.add(&model, Partition::Basic);
        self.live.basic = model;
        self.save_model();
        recorded
    }

    /// Records a change of the complex sub-model, whose full content is now
    /// `model`.
    pub fn edit_complex(&mut self, model: Model) -> usize {
        let recorded = self.tracker.add(&model, Partition::Complex);
        self.live.complex = model;
        self.save_model();
        recorded
    }

    /// Records a change of a single complex field, as made by its dedicated
    /// editor.
    pub fn edit_complex_prop(&mut self, key: impl Into<String>, value: Value) -> usize {
        self.set_complex_model_prop(key, value);
        let recorded = self.tracker.add(&self.live.complex, Partition::Complex);
        self.save_model();
        recorded
    }

    /// Reverts the latest change, see [`Tracker::undo`].
    pub fn undo(&mut self) -> Option<Partition> {
        let partition = self.tracker.undo(&mut self.live)?;
        self.save_model();
        Some(partition)
    }

    /// Reapplies the latest reverted change, see [`Tracker::redo`].
    pub fn redo(&mut self) -> Option<Partition> {
        let partition = self.tracker.redo(&mut self.live)?;
        self.save_model();
        Some(partition)
    }

    /// Drops the undo/redo history, keeping the current state.
    pub fn reset_history(&mut self) {
        self.tracker.reset();
    }

    pub fn is_modified(&self) -> bool {
        self.tracker.is_modified()
    }

    pub fn tracker(&self) -> &Tracker<P> {
        &self.tracker
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn basic_schema(&self) -> &Value {
        &self.basic_schema
    }

    pub fn complex_schema(&self) -> &Value {
        &self.complex_schema
    }

    pub fn basic_model(&self) -> &Model {
        &self.live.basic
    }

    pub fn complex_model(&self) -> &Model {
        &self.live.complex
    }

    /// Reported by the basic form after validating its content.
    pub fn set_basic_model_valid(&mut self, valid: bool) {
        self.basic_model_valid = valid;
    }

    /// Reported by the editor of one complex field after validating it.
    pub fn set_complex_field_valid(&mut self, key: impl Into<String>, valid: bool) {
        self.complex_model_validation.insert(key.into(), valid);
    }

    pub fn basic_model_valid(&self) -> bool {
        self.basic_model_valid
    }

    pub fn complex_model_valid(&self) -> bool {
        self.complex_model_validation.values().all(|&valid| valid)
    }

    /// True once the basic form and every complex field reported valid.
    pub fn model_valid(&self) -> bool {
        self.basic_model_valid() && self.complex_model_valid()
    }

    fn save_model(&mut self) {
        self.sync_model();
        let session = self.tracker.session().clone();
        if let Err(err) = self.tracker.store_mut().save_model(&session, &self.model) {
            warn!(%session, %err, "failed to persist model");
        }
    }
}

fn boxed<E: std::error::Error + Send + Sync + 'static>(err: E) -> SessionError {
    SessionError::Store(Box::new(err))
}
