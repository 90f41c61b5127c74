//! Reversible array operations.
//!
//! Every mutation that should appear on the timeline is an operation implementing
//! [`Recordable`]. Applying an operation mutates the [`CellStore`] and returns the operation
//! that undoes it. The inverse is computed from the state *before* the mutation, which is the
//! only point where that state still exists (an overwritten value is gone afterwards).
//!
//! Operations validate everything up front. If `apply` fails, the store is untouched.
//!
//! | Operation | Inverse |
//! |---|---|
//! | [`SetValue`] `(i, v)` | `SetValue (i, previous)` |
//! | [`Swap`] `(i, j)` | itself |
//! | [`ToggleDecoration`] `(indices, tag)` | itself |
//! | [`SetStyle`] `(changes)` | previous value of every changed property |
//! | [`ToggleLine`] `(i, line)` | `ToggleLine (i, removed or inserted line)` |

use crate::error::ArrayResult;
use crate::store::{CellStore, MarkLine};
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a recorded mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    /// [`SetValue`]
    SetValue,
    /// [`Swap`]
    Swap,
    /// [`ToggleDecoration`]
    ToggleDecoration,
    /// [`SetStyle`]
    SetStyle,
    /// [`ToggleLine`]
    ToggleLine,
}

impl OperationKind {
    /// Stable name, as used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::SetValue => "setValue",
            OperationKind::Swap => "swap",
            OperationKind::ToggleDecoration => "toggleDecoration",
            OperationKind::SetStyle => "setStyle",
            OperationKind::ToggleLine => "toggleLine",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutation that knows how to capture its own inverse.
pub trait Recordable {
    /// Which mutator this is.
    fn kind(&self) -> OperationKind;

    /// Mutate `store` and return the operation that undoes the mutation.
    ///
    /// On error the store must be left unchanged.
    fn apply(&self, store: &mut CellStore) -> ArrayResult<ArrayOp>;
}

/// Write a value, growing the array if needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetValue {
    /// Target index.
    pub index: usize,
    /// New value.
    pub value: CellValue,
}

impl Recordable for SetValue {
    fn kind(&self) -> OperationKind {
        OperationKind::SetValue
    }

    fn apply(&self, store: &mut CellStore) -> ArrayResult<ArrayOp> {
        let previous = store.set(self.index, self.value.clone())?;
        // Growth is not rolled back: the inverse only restores the value.
        Ok(ArrayOp::SetValue(SetValue {
            index: self.index,
            value: previous,
        }))
    }
}

/// Exchange two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    /// First index.
    pub first: usize,
    /// Second index.
    pub second: usize,
}

impl Recordable for Swap {
    fn kind(&self) -> OperationKind {
        OperationKind::Swap
    }

    fn apply(&self, store: &mut CellStore) -> ArrayResult<ArrayOp> {
        store.swap(self.first, self.second)?;
        Ok(ArrayOp::Swap(*self))
    }
}

/// Flip a decoration tag on a set of indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleDecoration {
    /// Indices to flip.
    pub indices: Vec<usize>,
    /// Decoration tag.
    pub tag: String,
}

impl Recordable for ToggleDecoration {
    fn kind(&self) -> OperationKind {
        OperationKind::ToggleDecoration
    }

    fn apply(&self, store: &mut CellStore) -> ArrayResult<ArrayOp> {
        for &index in &self.indices {
            store.check(index)?;
        }
        for &index in &self.indices {
            store.toggle_decoration(index, &self.tag)?;
        }
        Ok(ArrayOp::ToggleDecoration(self.clone()))
    }
}

/// What a [`StyleChange`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleTarget {
    /// A single cell.
    Cell(usize),
    /// The array container.
    Array,
}

/// One style property assignment. `value: None` removes the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleChange {
    /// Cell or array.
    pub target: StyleTarget,
    /// Property name.
    pub property: String,
    /// New value.
    pub value: Option<String>,
}

/// Set style properties on cells and/or the array container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStyle {
    /// Changes, applied in order.
    pub changes: Vec<StyleChange>,
}

impl Recordable for SetStyle {
    fn kind(&self) -> OperationKind {
        OperationKind::SetStyle
    }

    fn apply(&self, store: &mut CellStore) -> ArrayResult<ArrayOp> {
        for change in &self.changes {
            if let StyleTarget::Cell(index) = change.target {
                store.check(index)?;
            }
        }

        let mut inverse = Vec::with_capacity(self.changes.len());
        for change in &self.changes {
            let previous = match change.target {
                StyleTarget::Cell(index) => {
                    store.set_style(index, &change.property, change.value.clone())?
                }
                StyleTarget::Array => store.set_array_style(&change.property, change.value.clone()),
            };
            inverse.push(StyleChange {
                target: change.target,
                property: change.property.clone(),
                value: previous,
            });
        }
        // Undo in reverse so repeated (target, property) pairs unwind correctly.
        inverse.reverse();

        Ok(ArrayOp::SetStyle(SetStyle { changes: inverse }))
    }
}

/// Add or remove the marker line of a bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleLine {
    /// Marked index.
    pub index: usize,
    /// Line to insert when no line exists yet.
    pub line: MarkLine,
}

impl Recordable for ToggleLine {
    fn kind(&self) -> OperationKind {
        OperationKind::ToggleLine
    }

    fn apply(&self, store: &mut CellStore) -> ArrayResult<ArrayOp> {
        let removed = store.toggle_mark(self.index, self.line.clone())?;
        Ok(ArrayOp::ToggleLine(ToggleLine {
            index: self.index,
            line: removed.unwrap_or_else(|| self.line.clone()),
        }))
    }
}

/// Any recordable operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ArrayOp {
    /// [`SetValue`]
    SetValue(SetValue),
    /// [`Swap`]
    Swap(Swap),
    /// [`ToggleDecoration`]
    ToggleDecoration(ToggleDecoration),
    /// [`SetStyle`]
    SetStyle(SetStyle),
    /// [`ToggleLine`]
    ToggleLine(ToggleLine),
}

impl Recordable for ArrayOp {
    fn kind(&self) -> OperationKind {
        match self {
            ArrayOp::SetValue(op) => op.kind(),
            ArrayOp::Swap(op) => op.kind(),
            ArrayOp::ToggleDecoration(op) => op.kind(),
            ArrayOp::SetStyle(op) => op.kind(),
            ArrayOp::ToggleLine(op) => op.kind(),
        }
    }

    fn apply(&self, store: &mut CellStore) -> ArrayResult<ArrayOp> {
        match self {
            ArrayOp::SetValue(op) => op.apply(store),
            ArrayOp::Swap(op) => op.apply(store),
            ArrayOp::ToggleDecoration(op) => op.apply(store),
            ArrayOp::SetStyle(op) => op.apply(store),
            ArrayOp::ToggleLine(op) => op.apply(store),
        }
    }
}

impl From<SetValue> for ArrayOp {
    fn from(op: SetValue) -> Self {
        ArrayOp::SetValue(op)
    }
}

impl From<Swap> for ArrayOp {
    fn from(op: Swap) -> Self {
        ArrayOp::Swap(op)
    }
}

impl From<ToggleDecoration> for ArrayOp {
    fn from(op: ToggleDecoration) -> Self {
        ArrayOp::ToggleDecoration(op)
    }
}

impl From<SetStyle> for ArrayOp {
    fn from(op: SetStyle) -> Self {
        ArrayOp::SetStyle(op)
    }
}

impl From<ToggleLine> for ArrayOp {
    fn from(op: ToggleLine) -> Self {
        ArrayOp::ToggleLine(op)
    }
}
