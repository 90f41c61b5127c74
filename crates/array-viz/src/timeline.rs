//! Linear step log with a cursor.
//!
//! The timeline stores one [`OperationRecord`] per recorded mutation. `cursor` counts how many
//! records are currently applied to the store:
//!
//! ```text
//! records:  [r0] [r1] [r2] [r3]
//!                          ^ cursor = 3 (r0..r2 applied, r3 undone)
//! ```
//!
//! Stepping forward re-executes `records[cursor].forward`. Stepping backward executes
//! `records[cursor - 1].inverse`. Appending while the cursor is behind the end discards the
//! abandoned tail first; history never branches.

use crate::error::{ArrayError, ArrayResult};
use crate::ops::{ArrayOp, OperationKind, Recordable};
use crate::store::CellStore;

/// One recorded mutation and its captured inverse. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    kind: OperationKind,
    forward: ArrayOp,
    inverse: ArrayOp,
}

impl OperationRecord {
    /// Pair a forward operation with the inverse captured when it was first applied.
    pub fn new(forward: ArrayOp, inverse: ArrayOp) -> Self {
        Self {
            kind: forward.kind(),
            forward,
            inverse,
        }
    }

    /// Mutator name.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Arguments that redo the effect.
    pub fn forward(&self) -> &ArrayOp {
        &self.forward
    }

    /// Arguments that undo the effect.
    pub fn inverse(&self) -> &ArrayOp {
        &self.inverse
    }

    fn redo(&self, store: &mut CellStore) -> ArrayResult<()> {
        self.forward.apply(store).map(|_| ())
    }

    fn undo(&self, store: &mut CellStore) -> ArrayResult<()> {
        self.inverse.apply(store).map(|_| ())
    }
}

/// Ordered log of records plus the applied-step cursor.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    records: Vec<OperationRecord>,
    cursor: usize,
}

impl Timeline {
    /// An empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of steps currently applied.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Whether [`step_forward`](Self::step_forward) would do anything.
    pub fn can_step_forward(&self) -> bool {
        self.cursor < self.records.len()
    }

    /// Whether [`step_backward`](Self::step_backward) would do anything.
    pub fn can_step_backward(&self) -> bool {
        self.cursor > 0
    }

    /// Append a record at the cursor, discarding any records after it.
    pub fn append(&mut self, record: OperationRecord) {
        if self.cursor < self.records.len() {
            tracing::debug!(
                target: "array_viz.timeline",
                discarded = self.records.len() - self.cursor,
                cursor = self.cursor,
                "truncating redo tail"
            );
            self.records.truncate(self.cursor);
        }
        self.records.push(record);
        self.cursor = self.records.len();
    }

    /// Re-apply the next record. Returns its kind, or `None` at the end of the timeline.
    pub fn step_forward(&mut self, store: &mut CellStore) -> ArrayResult<Option<OperationKind>> {
        let Some(record) = self.records.get(self.cursor) else {
            return Ok(None);
        };
        record.redo(store)?;
        self.cursor += 1;
        Ok(Some(record.kind()))
    }

    /// Undo the last applied record. Returns its kind, or `None` at the start of the timeline.
    pub fn step_backward(&mut self, store: &mut CellStore) -> ArrayResult<Option<OperationKind>> {
        let Some(index) = self.cursor.checked_sub(1) else {
            return Ok(None);
        };
        let record = &self.records[index];
        record.undo(store)?;
        self.cursor = index;
        Ok(Some(record.kind()))
    }

    /// Step until `cursor == target`, calling `on_step` after every individual step.
    ///
    /// Fails with [`ArrayError::StepOutOfRange`] (moving nothing) if `target > len`.
    pub fn jump_to<F>(
        &mut self,
        store: &mut CellStore,
        target: usize,
        mut on_step: F,
    ) -> ArrayResult<()>
    where
        F: FnMut(&CellStore, OperationKind) -> ArrayResult<()>,
    {
        if target > self.records.len() {
            return Err(ArrayError::StepOutOfRange {
                target,
                len: self.records.len(),
            });
        }

        while self.cursor < target {
            if let Some(kind) = self.step_forward(store)? {
                on_step(store, kind)?;
            }
        }
        while self.cursor > target {
            if let Some(kind) = self.step_backward(store)? {
                on_step(store, kind)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{SetValue, Swap};
    use crate::value::CellValue;

    fn record(store: &mut CellStore, op: impl Into<ArrayOp>) -> OperationRecord {
        let op = op.into();
        let inverse = op.apply(store).unwrap();
        OperationRecord::new(op, inverse)
    }

    #[test]
    fn test_step_at_ends_is_noop() {
        let mut store = CellStore::new([1, 2]);
        let mut timeline = Timeline::new();
        assert_eq!(timeline.step_backward(&mut store).unwrap(), None);
        assert_eq!(timeline.step_forward(&mut store).unwrap(), None);
        assert_eq!(timeline.cursor(), 0);
    }

    #[test]
    fn test_append_truncates_redo_tail() {
        let mut store = CellStore::new([1, 2, 3, 4]);
        let mut timeline = Timeline::new();
        for i in 0..3 {
            let r = record(&mut store, Swap { first: i, second: i + 1 });
            timeline.append(r);
        }
        assert_eq!(timeline.len(), 3);

        timeline.step_backward(&mut store).unwrap();
        timeline.step_backward(&mut store).unwrap();
        assert_eq!(timeline.cursor(), 1);

        let r = record(
            &mut store,
            SetValue {
                index: 0,
                value: CellValue::from(9),
            },
        );
        timeline.append(r);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.cursor(), 2);
        assert!(!timeline.can_step_forward());
        assert_eq!(timeline.records()[1].kind(), OperationKind::SetValue);
    }

    #[test]
    fn test_jump_to_bounds() {
        let mut store = CellStore::new([1, 2]);
        let mut timeline = Timeline::new();
        let r = record(&mut store, Swap { first: 0, second: 1 });
        timeline.append(r);

        let mut steps = 0;
        timeline
            .jump_to(&mut store, 0, |_, _| {
                steps += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(steps, 1);
        assert_eq!(store.values(), &[CellValue::from(1), CellValue::from(2)]);

        let err = timeline.jump_to(&mut store, 2, |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, ArrayError::StepOutOfRange { target: 2, len: 1 }));
        assert_eq!(timeline.cursor(), 0);
    }
}
