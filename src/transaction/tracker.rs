use super::{Partition, Transaction};
use crate::{
    Model,
    config::TrackerConfig,
    persistence::{NoPersistence, SavedHistory, SessionKey, SessionStore},
};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Receives sub-models reverted or reapplied by [`Tracker::undo`] and
/// [`Tracker::redo`].
///
/// This is the hook through which the tracker pushes history back into the
/// live, rendered form state. It is typically implemented by whatever owns the
/// live sub-models, see [`Editor`](crate::editor::Editor).
pub trait ApplyModel {
    /// Make `model` the current basic sub-model.
    fn apply_basic_model(&mut self, model: &Model);

    /// Make `model` the current complex sub-model.
    fn apply_complex_model(&mut self, model: &Model);
}

/// Error returned by [`Tracker::restore`] for a history the tracker could not
/// have produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("transaction pointer {pointer} is out of range for {len} transactions")]
    PointerOutOfRange { pointer: isize, len: usize },

    #[error("{len} transactions exceed the history bound of {max}")]
    TooManyTransactions { len: usize, max: usize },

    #[error("transaction {index} does not change field {field}")]
    NoOpTransaction { index: usize, field: String },
}

/// A bounded undo/redo history of field-level edits to a basic and a complex
/// sub-model.
///
/// The tracker keeps its own copy of the last known state of each sub-model.
/// [`add`](Tracker::add) diffs a new version of a sub-model against that copy
/// and records one [`Transaction`] per changed field; [`undo`](Tracker::undo)
/// and [`redo`](Tracker::redo) walk that log one field at a time.
///
/// # Pointer
///
/// The *transaction pointer* is the index of the current transaction in the
/// log, `-1` before the first one. Transactions past the pointer form the redo
/// branch, which the next [`add`](Tracker::add) discards.
///
/// # Bounded history
///
/// When the log reaches [`TrackerConfig::max_transaction_stack_size`] the
/// oldest transaction is evicted. From then on the tracker reports itself as
/// [modified](Tracker::is_modified) even when everything left has been undone,
/// since the evicted edits can no longer be reverted.
///
/// # Persistence
///
/// Whenever the log or the pointer changes, both are written to the tracker's
/// [`SessionStore`]. Failed writes are logged and otherwise ignored.
///
/// # Example
///
/// ```
/// use meditor::{Model, model, transaction::{ApplyModel, Partition, Tracker}};
///
/// #[derive(Default)]
/// struct Form {
///     basic: Model,
/// }
///
/// impl ApplyModel for Form {
///     fn apply_basic_model(&mut self, model: &Model) {
///         self.basic = model.clone();
///     }
///
///     fn apply_complex_model(&mut self, _model: &Model) {}
/// }
///
/// let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new());
/// tracker.add(&model!({"name": "B"}), Partition::Basic);
///
/// let mut form = Form::default();
/// assert_eq!(tracker.undo(&mut form), Some(Partition::Basic));
/// assert_eq!(form.basic, model!({"name": "A"}));
/// assert_eq!(tracker.undo(&mut form), None);
/// ```
#[derive(Debug, Clone)]
pub struct Tracker<P = NoPersistence> {
    transactions: VecDeque<Transaction>,
    // number of transactions currently applied, i.e. pointer + 1
    applied: usize,
    // true once a transaction has been evicted to honor the history bound
    lost_transactions: bool,
    basic_model: Model,
    complex_model: Model,
    config: TrackerConfig,
    store: P,
    session: SessionKey,
}

impl Tracker {
    /// Creates a pristine tracker from copies of the initial sub-models.
    pub fn new(basic_model: &Model, complex_model: &Model) -> Self {
        Self {
            transactions: VecDeque::new(),
            applied: 0,
            lost_transactions: false,
            basic_model: basic_model.clone(),
            complex_model: complex_model.clone(),
            config: TrackerConfig::default(),
            store: NoPersistence,
            session: SessionKey::default(),
        }
    }
}

impl<P: SessionStore> Tracker<P> {
    /// Replaces the configuration.
    ///
    /// If the current log does not fit the new bound, its oldest transactions
    /// are evicted.
    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        let mut evicted = false;
        while self.transactions.len() >= config.max_transaction_stack_size() {
            self.transactions.pop_front();
            self.applied = self.applied.saturating_sub(1);
            self.lost_transactions = true;
            evicted = true;
        }
        if evicted {
            self.persist();
        }
        self
    }

    /// Writes the history to `store` under `session` from now on.
    ///
    /// Nothing is written until the history next changes.
    pub fn with_persistence<Q: SessionStore>(self, store: Q, session: SessionKey) -> Tracker<Q> {
        Tracker {
            transactions: self.transactions,
            applied: self.applied,
            lost_transactions: self.lost_transactions,
            basic_model: self.basic_model,
            complex_model: self.complex_model,
            config: self.config,
            store,
            session,
        }
    }

    /// Records the changes between the tracker's copy of the `partition`
    /// sub-model and `new_model`, and returns how many transactions were
    /// recorded.
    ///
    /// Every field of the old sub-model whose value differs from the one in
    /// `new_model` yields its own transaction, in key order. Fields missing from
    /// `new_model` are not edits: schema filtering drops empty fields when a
    /// model is loaded, and that must not show up in the history.
    ///
    /// Any redo branch is discarded first, whether or not anything changed.
    pub fn add(&mut self, new_model: &Model, partition: Partition) -> usize {
        let len_before = self.transactions.len();
        let applied_before = self.applied;
        self.transactions.truncate(self.applied);
        let truncated = self.transactions.len() != len_before;

        let max = self.config.max_transaction_stack_size();
        let old_model = match partition {
            Partition::Basic => &self.basic_model,
            Partition::Complex => &self.complex_model,
        };

        let mut recorded = 0;
        for (field, old_value) in old_model {
            let Some(new_value) = new_model.get(field) else {
                continue;
            };
            if old_value == new_value {
                continue;
            }

            self.transactions.push_back(Transaction::new(
                field.clone(),
                old_value.clone(),
                new_value.clone(),
                partition,
            ));
            recorded += 1;

            if self.transactions.len() == max {
                // the pointer keeps designating the newest transaction
                self.transactions.pop_front();
                self.lost_transactions = true;
                debug!(max, "transaction history full, evicted oldest transaction");
            } else {
                self.applied += 1;
            }
        }

        *snapshot_mut(&mut self.basic_model, &mut self.complex_model, partition) =
            new_model.clone();

        if recorded > 0 || truncated {
            debug!(
                ?partition,
                recorded,
                discarded = len_before - applied_before.min(len_before),
                pointer = self.transaction_pointer(),
                "recorded edit"
            );
            self.persist();
        }
        recorded
    }

    /// Reverts the current transaction.
    ///
    /// Returns the partition of the reverted transaction so that the caller
    /// knows which form to refresh, or `None` if there is nothing to undo.
    pub fn undo(&mut self, target: &mut impl ApplyModel) -> Option<Partition> {
        let index = self.applied.checked_sub(1)?;
        let transaction = &self.transactions[index];
        let partition = transaction.partition;

        let snapshot = snapshot_mut(&mut self.basic_model, &mut self.complex_model, partition);
        snapshot.insert(transaction.field.clone(), transaction.old_value.clone());
        apply(target, partition, snapshot);

        self.applied = index;
        debug!(field = %transaction.field, ?partition, pointer = self.transaction_pointer(), "undo");
        self.persist();
        Some(partition)
    }

    /// Reapplies the transaction after the current one.
    ///
    /// Returns the partition of the reapplied transaction, or `None` if the
    /// pointer is already at the newest transaction.
    pub fn redo(&mut self, target: &mut impl ApplyModel) -> Option<Partition> {
        let transaction = self.transactions.get(self.applied)?;
        let partition = transaction.partition;

        let snapshot = snapshot_mut(&mut self.basic_model, &mut self.complex_model, partition);
        snapshot.insert(transaction.field.clone(), transaction.new_value.clone());
        apply(target, partition, snapshot);

        self.applied += 1;
        debug!(field = %transaction.field, ?partition, pointer = self.transaction_pointer(), "redo");
        self.persist();
        Some(partition)
    }

    /// True if [`redo`](Tracker::redo) would do something.
    pub fn are_transactions_ahead(&self) -> bool {
        self.applied < self.transactions.len()
    }

    /// True if [`undo`](Tracker::undo) would do something.
    pub fn are_transactions_behind(&self) -> bool {
        self.applied > 0
    }

    /// True if the sub-models may differ from their initial state.
    ///
    /// This stays true after evictions even once every remaining transaction
    /// has been undone.
    pub fn is_modified(&self) -> bool {
        self.applied > 0 || self.lost_transactions
    }

    /// True once a transaction was evicted to honor the history bound.
    pub fn lost_transactions(&self) -> bool {
        self.lost_transactions
    }

    /// Index of the current transaction, `-1` if none is applied.
    pub fn transaction_pointer(&self) -> isize {
        // the log is bounded by the configured stack size, far below isize::MAX
        self.applied as isize - 1
    }

    /// The whole log, including the redo branch.
    pub fn transactions(&self) -> &VecDeque<Transaction> {
        &self.transactions
    }

    /// The tracker's copy of the basic sub-model.
    pub fn basic_model(&self) -> &Model {
        &self.basic_model
    }

    /// The tracker's copy of the complex sub-model.
    pub fn complex_model(&self) -> &Model {
        &self.complex_model
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut P {
        &mut self.store
    }

    /// Forgets the whole history.
    ///
    /// The tracker's copies of the sub-models are kept as they are, so the
    /// next [`add`](Tracker::add) diffs against the current state.
    pub fn reset(&mut self) {
        self.transactions.clear();
        self.applied = 0;
        self.lost_transactions = false;
        debug!("history reset");
        self.persist();
    }

    /// Replaces the history with one read back from a [`SessionStore`].
    ///
    /// The sub-model copies are expected to already reflect `saved.pointer`,
    /// which is the case when the tracker was built from the model saved with
    /// the same session.
    ///
    /// Histories the tracker could not have recorded are rejected: a pointer
    /// outside the log, a log reaching the history bound, or a transaction
    /// whose old and new values are equal.
    pub fn restore(&mut self, saved: SavedHistory) -> Result<(), RestoreError> {
        let SavedHistory {
            transactions,
            pointer,
        } = saved;
        let len = transactions.len();
        let max = self.config.max_transaction_stack_size();
        if len >= max {
            return Err(RestoreError::TooManyTransactions { len, max });
        }
        let applied = pointer
            .checked_add(1)
            .and_then(|applied| usize::try_from(applied).ok())
            .filter(|&applied| applied <= len)
            .ok_or(RestoreError::PointerOutOfRange { pointer, len })?;
        if let Some((index, tx)) = transactions
            .iter()
            .enumerate()
            .find(|(_, tx)| tx.old_value == tx.new_value)
        {
            return Err(RestoreError::NoOpTransaction {
                index,
                field: tx.field.clone(),
            });
        }

        self.transactions = transactions.into();
        self.applied = applied;
        self.lost_transactions = false;
        debug!(len, pointer, "restored transaction history");
        Ok(())
    }

    fn persist(&mut self) {
        let pointer = self.transaction_pointer();
        let transactions = self.transactions.make_contiguous();
        if let Err(err) = self.store.save(&self.session, transactions, pointer) {
            warn!(session = %self.session, %err, "failed to persist transaction history");
        }
    }
}

fn snapshot_mut<'a>(
    basic_model: &'a mut Model,
    complex_model: &'a mut Model,
    partition: Partition,
) -> &'a mut Model {
    match partition {
        Partition::Basic => basic_model,
        Partition::Complex => complex_model,
    }
}

fn apply(target: &mut impl ApplyModel, partition: Partition, model: &Model) {
    match partition {
        Partition::Basic => target.apply_basic_model(model),
        Partition::Complex => target.apply_complex_model(model),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MAX_TRANSACTION_STACK_SIZE,
        model,
        persistence::test::{FailingStore, RecordingStore},
    };
    use quickcheck::{Arbitrary, Gen};
    use serde_json::json;

    /// Stands in for the live form state.
    #[derive(Debug, Default)]
    struct Forms {
        basic: Option<Model>,
        complex: Option<Model>,
        applied: usize,
    }

    impl ApplyModel for Forms {
        fn apply_basic_model(&mut self, model: &Model) {
            self.basic = Some(model.clone());
            self.applied += 1;
        }

        fn apply_complex_model(&mut self, model: &Model) {
            self.complex = Some(model.clone());
            self.applied += 1;
        }
    }

    fn small_config(max: usize) -> TrackerConfig {
        TrackerConfig::new(max).unwrap()
    }

    #[test]
    fn single_field_undo_redo() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new());
        let mut forms = Forms::default();

        assert_eq!(tracker.add(&model!({"name": "B"}), Partition::Basic), 1);
        assert_eq!(
            tracker.transactions().iter().collect::<Vec<_>>(),
            [&Transaction::new("name", json!("A"), json!("B"), Partition::Basic)]
        );
        assert_eq!(tracker.transaction_pointer(), 0);

        assert_eq!(tracker.undo(&mut forms), Some(Partition::Basic));
        assert_eq!(tracker.basic_model(), &model!({"name": "A"}));
        assert_eq!(forms.basic, Some(model!({"name": "A"})));
        assert_eq!(tracker.transaction_pointer(), -1);

        assert_eq!(tracker.redo(&mut forms), Some(Partition::Basic));
        assert_eq!(tracker.basic_model(), &model!({"name": "B"}));
        assert_eq!(forms.basic, Some(model!({"name": "B"})));
        assert_eq!(tracker.transaction_pointer(), 0);
        assert_eq!(forms.complex, None);
    }

    #[test]
    fn multi_field_edit_records_each_field_in_key_order() {
        let mut tracker = Tracker::new(&Model::new(), &model!({"a": 0, "b": 0}));
        assert_eq!(tracker.add(&model!({"a": 1, "b": 2}), Partition::Complex), 2);
        assert_eq!(tracker.transaction_pointer(), 1);

        let fields: Vec<_> = tracker
            .transactions()
            .iter()
            .map(|tx| (tx.field.as_str(), tx.partition))
            .collect();
        assert_eq!(
            fields,
            [("a", Partition::Complex), ("b", Partition::Complex)]
        );

        // undo walks back one field at a time
        let mut forms = Forms::default();
        tracker.undo(&mut forms);
        assert_eq!(forms.complex, Some(model!({"a": 1, "b": 0})));
        tracker.undo(&mut forms);
        assert_eq!(forms.complex, Some(model!({"a": 0, "b": 0})));
    }

    #[test]
    fn key_order_follows_the_old_model() {
        let mut tracker = Tracker::new(&model!({"zeta": 0, "alpha": 0}), &Model::new());
        tracker.add(&model!({"alpha": 1, "zeta": 1}), Partition::Basic);
        let fields: Vec<_> = tracker.transactions().iter().map(|tx| &tx.field).collect();
        assert_eq!(fields, ["zeta", "alpha"]);
    }

    #[test]
    fn dropped_keys_are_not_edits() {
        let mut tracker = Tracker::new(&model!({"a": 1, "b": 2}), &Model::new());
        assert_eq!(tracker.add(&model!({"a": 1}), Partition::Basic), 0);
        assert_eq!(tracker.transaction_pointer(), -1);
        assert!(!tracker.is_modified());
        // the snapshot still follows the new model
        assert_eq!(tracker.basic_model(), &model!({"a": 1}));
    }

    #[test]
    fn null_is_an_edit() {
        let mut tracker = Tracker::new(&model!({"description": "x"}), &Model::new());
        assert_eq!(tracker.add(&model!({"description": null}), Partition::Basic), 1);
    }

    #[test]
    fn new_keys_are_not_recorded() {
        let mut tracker = Tracker::new(&model!({"a": 1}), &Model::new());
        assert_eq!(tracker.add(&model!({"a": 1, "b": 2}), Partition::Basic), 0);
        // but are diffed against next time
        assert_eq!(tracker.add(&model!({"a": 1, "b": 3}), Partition::Basic), 1);
    }

    #[test]
    fn deep_equality_on_nested_values() {
        let contributors = json!([{"name": "Doe, Jane", "roleName": ["dcite:Author"]}]);
        let mut tracker = Tracker::new(
            &Model::new(),
            &model!({"contributor": contributors.clone()}),
        );
        assert_eq!(
            tracker.add(&model!({"contributor": contributors}), Partition::Complex),
            0
        );
        assert_eq!(
            tracker.add(
                &model!({"contributor": [{"name": "Doe, Jane", "roleName": ["dcite:Creator"]}]}),
                Partition::Complex
            ),
            1
        );
    }

    #[test]
    fn partitions_are_diffed_independently() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &model!({"about": []}));
        tracker.add(&model!({"about": [{"name": "brain"}]}), Partition::Complex);
        tracker.add(&model!({"name": "B"}), Partition::Basic);

        let mut forms = Forms::default();
        assert_eq!(tracker.undo(&mut forms), Some(Partition::Basic));
        assert_eq!(tracker.undo(&mut forms), Some(Partition::Complex));
        assert_eq!(forms.basic, Some(model!({"name": "A"})));
        assert_eq!(forms.complex, Some(model!({"about": []})));
        assert_eq!(tracker.undo(&mut forms), None);
    }

    #[test]
    fn boundaries_are_no_ops() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new());
        let mut forms = Forms::default();
        assert_eq!(tracker.undo(&mut forms), None);
        assert_eq!(tracker.redo(&mut forms), None);
        assert_eq!(forms.applied, 0);
        assert_eq!(tracker.basic_model(), &model!({"name": "A"}));

        tracker.add(&model!({"name": "B"}), Partition::Basic);
        assert_eq!(tracker.redo(&mut forms), None);
        assert_eq!(forms.applied, 0);
        assert_eq!(tracker.transaction_pointer(), 0);
    }

    #[test]
    fn new_edit_discards_redo_branch() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new());
        let mut forms = Forms::default();
        tracker.add(&model!({"name": "B"}), Partition::Basic);
        tracker.add(&model!({"name": "C"}), Partition::Basic);
        tracker.undo(&mut forms);
        assert!(tracker.are_transactions_ahead());

        tracker.add(&model!({"name": "D"}), Partition::Basic);
        assert_eq!(tracker.transactions().len(), 2);
        assert_eq!(tracker.transactions()[1].new_value, json!("D"));
        assert_eq!(tracker.transactions()[1].old_value, json!("B"));
        assert!(!tracker.are_transactions_ahead());
        assert_eq!(tracker.redo(&mut forms), None);
    }

    #[test]
    fn no_op_edit_still_discards_redo_branch() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new());
        let mut forms = Forms::default();
        tracker.add(&model!({"name": "B"}), Partition::Basic);
        tracker.undo(&mut forms);
        assert_eq!(tracker.add(&model!({"name": "A"}), Partition::Basic), 0);
        assert!(tracker.transactions().is_empty());
        assert_eq!(tracker.redo(&mut forms), None);
    }

    #[test]
    fn eviction_keeps_pointer_in_bounds() {
        let mut tracker = Tracker::new(&model!({"n": 0}), &Model::new());
        for n in 1..MAX_TRANSACTION_STACK_SIZE {
            tracker.add(&model!({ "n": n }), Partition::Basic);
        }
        assert_eq!(tracker.transactions().len(), MAX_TRANSACTION_STACK_SIZE - 1);
        assert!(!tracker.lost_transactions());

        tracker.add(&model!({ "n": MAX_TRANSACTION_STACK_SIZE }), Partition::Basic);
        // the push that reaches the bound evicts the oldest transaction
        assert_eq!(tracker.transactions().len(), MAX_TRANSACTION_STACK_SIZE - 1);
        assert!(tracker.lost_transactions());
        assert_eq!(
            tracker.transaction_pointer(),
            MAX_TRANSACTION_STACK_SIZE as isize - 2
        );

        for n in 0..100 {
            tracker.add(&model!({ "n": 1000 + n }), Partition::Basic);
            assert!(tracker.transaction_pointer() <= MAX_TRANSACTION_STACK_SIZE as isize - 1);
            assert_eq!(
                tracker.transaction_pointer(),
                tracker.transactions().len() as isize - 1
            );
        }
        // the oldest surviving transaction no longer starts from the initial value
        assert_ne!(tracker.transactions()[0].old_value, json!(0));
        assert_eq!(tracker.transactions().back().unwrap().new_value, json!(1099));
    }

    #[test]
    fn modified_after_eviction_even_when_fully_undone() {
        let mut tracker =
            Tracker::new(&model!({"n": 0}), &Model::new()).with_config(small_config(3));
        let mut forms = Forms::default();
        assert!(!tracker.is_modified());
        for n in 1..=5 {
            tracker.add(&model!({ "n": n }), Partition::Basic);
        }
        assert_eq!(tracker.transactions().len(), 2);
        while tracker.undo(&mut forms).is_some() {}
        assert_eq!(tracker.transaction_pointer(), -1);
        assert!(tracker.is_modified());
        // undoing everything that is left does not reach the initial value
        assert_eq!(forms.basic, Some(model!({"n": 3})));

        tracker.reset();
        assert!(!tracker.is_modified());
    }

    #[test]
    fn modified_tracks_pointer() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new());
        let mut forms = Forms::default();
        tracker.add(&model!({"name": "B"}), Partition::Basic);
        assert!(tracker.is_modified());
        assert!(tracker.are_transactions_behind());
        tracker.undo(&mut forms);
        assert!(!tracker.is_modified());
        assert!(!tracker.are_transactions_behind());
    }

    #[test]
    fn reset_keeps_snapshots() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new());
        tracker.add(&model!({"name": "B"}), Partition::Basic);
        tracker.reset();
        assert!(tracker.transactions().is_empty());
        assert_eq!(tracker.transaction_pointer(), -1);
        assert_eq!(tracker.basic_model(), &model!({"name": "B"}));
        assert_eq!(tracker.add(&model!({"name": "B"}), Partition::Basic), 0);
    }

    #[test]
    fn shrinking_config_evicts() {
        let mut tracker = Tracker::new(&model!({"n": 0}), &Model::new());
        for n in 1..=10 {
            tracker.add(&model!({ "n": n }), Partition::Basic);
        }
        let tracker = tracker.with_config(small_config(4));
        assert_eq!(tracker.transactions().len(), 3);
        assert_eq!(tracker.transaction_pointer(), 2);
        assert!(tracker.lost_transactions());
    }

    #[test]
    fn persists_on_every_pointer_move() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new())
            .with_persistence(RecordingStore::default(), SessionKey::anonymous("x"));
        let mut forms = Forms::default();

        tracker.add(&model!({"name": "A"}), Partition::Basic);
        assert!(tracker.store().saves.is_empty());

        tracker.add(&model!({"name": "B"}), Partition::Basic);
        tracker.undo(&mut forms);
        tracker.redo(&mut forms);
        tracker.undo(&mut forms);
        let pointers: Vec<_> = tracker.store().saves.iter().map(|s| s.pointer).collect();
        assert_eq!(pointers, [0, -1, 0, -1]);
        assert_eq!(tracker.store().saves[0].transactions.len(), 1);

        // truncating the redo branch is saved even though nothing was recorded
        tracker.add(&model!({"name": "A"}), Partition::Basic);
        let last = tracker.store().saves.last().unwrap();
        assert_eq!((last.pointer, last.transactions.len()), (-1, 0));
    }

    #[test]
    fn persistence_failures_are_swallowed() {
        let mut tracker = Tracker::new(&model!({"name": "A"}), &Model::new())
            .with_persistence(FailingStore::default(), SessionKey::anonymous("x"));
        let mut forms = Forms::default();
        tracker.add(&model!({"name": "B"}), Partition::Basic);
        assert_eq!(tracker.undo(&mut forms), Some(Partition::Basic));
        assert_eq!(tracker.redo(&mut forms), Some(Partition::Basic));
        assert_eq!(tracker.transaction_pointer(), 0);
        assert_eq!(tracker.store().attempts.get(), 3);
    }

    #[test]
    fn restore_validates_history() {
        let mut tracker =
            Tracker::new(&model!({"name": "B"}), &Model::new()).with_config(small_config(3));
        let tx = Transaction::new("name", json!("A"), json!("B"), Partition::Basic);

        let err = tracker
            .restore(SavedHistory {
                transactions: vec![tx.clone()],
                pointer: 1,
            })
            .unwrap_err();
        assert_eq!(err, RestoreError::PointerOutOfRange { pointer: 1, len: 1 });
        for pointer in [-2, isize::MIN, isize::MAX] {
            assert_eq!(
                tracker.restore(SavedHistory {
                    transactions: vec![],
                    pointer,
                }),
                Err(RestoreError::PointerOutOfRange { pointer, len: 0 })
            );
        }
        let unchanged = Transaction::new("name", json!("B"), json!("B"), Partition::Basic);
        assert_eq!(
            tracker.restore(SavedHistory {
                transactions: vec![tx.clone(), unchanged],
                pointer: 1,
            }),
            Err(RestoreError::NoOpTransaction {
                index: 1,
                field: "name".into(),
            })
        );
        // rejected histories leave the tracker untouched
        assert!(tracker.transactions().is_empty());
        assert_eq!(
            tracker.restore(SavedHistory {
                transactions: vec![tx.clone(), tx.clone(), tx.clone()],
                pointer: 0,
            }),
            Err(RestoreError::TooManyTransactions { len: 3, max: 3 })
        );

        tracker
            .restore(SavedHistory {
                transactions: vec![tx],
                pointer: 0,
            })
            .unwrap();
        let mut forms = Forms::default();
        assert_eq!(tracker.undo(&mut forms), Some(Partition::Basic));
        assert_eq!(forms.basic, Some(model!({"name": "A"})));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Edit {
            field: u8,
            value: u8,
            partition: Partition,
        },
        Undo,
        Redo,
        Reset,
    }

    impl Arbitrary for Op {
        fn arbitrary(g: &mut Gen) -> Self {
            match u8::arbitrary(g) % 8 {
                0..=3 => Op::Edit {
                    field: u8::arbitrary(g) % 3,
                    value: u8::arbitrary(g) % 4,
                    partition: Partition::arbitrary(g),
                },
                4 | 5 => Op::Undo,
                6 => Op::Redo,
                _ => Op::Reset,
            }
        }
    }

    fn initial() -> Model {
        model!({"f0": 0, "f1": 0, "f2": 0})
    }

    fn edited(model: &Model, field: u8, value: u8) -> Model {
        let mut model = model.clone();
        model.insert(format!("f{field}"), json!(value));
        model
    }

    #[quickcheck]
    fn qc_invariants_hold(ops: Vec<Op>, max: u8) {
        let config = small_config(usize::from(max % 8) + 2);
        let mut tracker = Tracker::new(&initial(), &initial()).with_config(config);
        let mut forms = Forms::default();
        for op in ops {
            let before = tracker.transactions().len();
            match op {
                Op::Edit {
                    field,
                    value,
                    partition,
                } => {
                    let current = match partition {
                        Partition::Basic => tracker.basic_model().clone(),
                        Partition::Complex => tracker.complex_model().clone(),
                    };
                    let recorded = tracker.add(&edited(&current, field, value), partition);
                    assert!(recorded <= 1);
                    assert!(!tracker.are_transactions_ahead());
                }
                Op::Undo => {
                    let behind = tracker.are_transactions_behind();
                    assert_eq!(tracker.undo(&mut forms).is_some(), behind);
                }
                Op::Redo => {
                    let ahead = tracker.are_transactions_ahead();
                    assert_eq!(tracker.redo(&mut forms).is_some(), ahead);
                }
                Op::Reset => tracker.reset(),
            }
            let pointer = tracker.transaction_pointer();
            let len = tracker.transactions().len();
            assert!(-1 <= pointer && pointer <= len as isize - 1);
            assert!(len < config.max_transaction_stack_size());
            assert!(len <= before + 1);
            assert_eq!(
                tracker.is_modified(),
                pointer > -1 || tracker.lost_transactions()
            );
            for tx in tracker.transactions() {
                assert_ne!(tx.old_value, tx.new_value);
            }
        }
    }

    #[quickcheck]
    fn qc_no_op_add_records_nothing(values: Vec<(u8, u8)>, partition: Partition) {
        let mut model = Model::new();
        for (field, value) in values {
            model.insert(format!("f{field}"), json!(value));
        }
        let mut tracker = Tracker::new(&model, &model);
        assert_eq!(tracker.add(&model, partition), 0);
        assert_eq!(tracker.transaction_pointer(), -1);
        assert!(tracker.transactions().is_empty());
    }

    #[quickcheck]
    fn qc_redo_inverts_undo(edits: Vec<(u8, u8, Partition)>) {
        let mut tracker = Tracker::new(&initial(), &initial());
        for (field, value, partition) in edits {
            let current = match partition {
                Partition::Basic => tracker.basic_model().clone(),
                Partition::Complex => tracker.complex_model().clone(),
            };
            tracker.add(&edited(&current, field % 3, value), partition);
        }
        let basic = tracker.basic_model().clone();
        let complex = tracker.complex_model().clone();
        let pointer = tracker.transaction_pointer();

        let mut forms = Forms::default();
        let undone = tracker.undo(&mut forms);
        let redone = tracker.redo(&mut forms);
        assert_eq!(undone, redone);
        assert_eq!(tracker.basic_model(), &basic);
        assert_eq!(tracker.complex_model(), &complex);
        assert_eq!(tracker.transaction_pointer(), pointer);
    }

    #[quickcheck]
    fn qc_undo_all_restores_initial_models(edits: Vec<(u8, u8, Partition)>) {
        let mut tracker = Tracker::new(&initial(), &initial());
        for (field, value, partition) in edits {
            let current = match partition {
                Partition::Basic => tracker.basic_model().clone(),
                Partition::Complex => tracker.complex_model().clone(),
            };
            tracker.add(&edited(&current, field % 3, value), partition);
        }
        let mut forms = Forms::default();
        while tracker.undo(&mut forms).is_some() {}
        assert_eq!(tracker.basic_model(), &initial());
        assert_eq!(tracker.complex_model(), &initial());
    }

    #[quickcheck]
    fn qc_restore_accepts_consistent_history(transactions: Vec<Transaction>, pointer: usize) {
        let mut transactions = transactions;
        transactions.truncate(MAX_TRANSACTION_STACK_SIZE - 1);
        let pointer = (pointer % (transactions.len() + 1)) as isize - 1;
        let len = transactions.len();

        let mut tracker = Tracker::new(&Model::new(), &Model::new());
        tracker
            .restore(SavedHistory {
                transactions,
                pointer,
            })
            .unwrap();
        assert_eq!(tracker.transaction_pointer(), pointer);
        assert_eq!(tracker.are_transactions_ahead(), pointer < len as isize - 1);
        assert_eq!(tracker.are_transactions_behind(), pointer > -1);
        assert_eq!(tracker.is_modified(), pointer > -1);
    }
}
