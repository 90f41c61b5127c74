//! Checkpoints and pre-built structure import.
//!
//! [`ArrayCheckpoint`] is what [`VisualArray::state`] exports: the values plus the visual
//! snapshot (the last geometry). Restoring one is a hard reset. The store and the visual are
//! replaced, and the timeline is left alone.
//!
//! [`ExistingStructure`] describes an array that was already built elsewhere, e.g. markup
//! authored by hand. Its cells carry raw text and a value-type hint that is parsed into the
//! [`CellValue`] model.
//!
//! [`VisualArray::state`]: crate::VisualArray::state

use crate::error::ArrayResult;
use crate::layout::Geometry;
use crate::store::{CellStore, MarkLine};
use crate::value::{CellValue, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Exported array state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayCheckpoint {
    /// Values in index order.
    pub values: Vec<CellValue>,
    /// Visual snapshot. `None` if the array could not be laid out when the checkpoint was taken.
    pub visual: Option<Geometry>,
}

impl ArrayCheckpoint {
    /// Serialize to JSON.
    pub fn to_json(&self) -> ArrayResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> ArrayResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write this checkpoint into `store`.
    ///
    /// Values are replaced. Decorations, styles and marks are rebuilt from the visual snapshot
    /// when there is one, and kept otherwise.
    pub(crate) fn restore_into(&self, store: &mut CellStore) {
        store.replace_values(self.values.clone());

        let Some(visual) = &self.visual else {
            return;
        };
        if visual.cells.len() != self.values.len() {
            tracing::warn!(
                target: "array_viz.checkpoint",
                values = self.values.len(),
                cells = visual.cells.len(),
                "checkpoint visual does not match its values"
            );
        }

        let len = self.values.len();
        let mut decorations = vec![BTreeSet::new(); len];
        let mut styles = vec![BTreeMap::new(); len];
        for cell in visual.cells.iter().filter(|c| c.index < len) {
            decorations[cell.index] = cell.decorations.iter().cloned().collect();
            styles[cell.index] = cell.styles.clone();
        }
        let marks: BTreeMap<usize, MarkLine> = visual
            .marks
            .iter()
            .map(|mark| (mark.index, mark.line.clone()))
            .collect();

        store.replace_visual_state(decorations, styles, visual.styles.clone(), marks);
    }
}

/// One cell of a pre-built structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExistingCell {
    /// Displayed text of the cell.
    pub text: String,
    /// Explicit value (takes precedence over `text`).
    pub data_value: Option<String>,
    /// Value-type hint name (`number`, `string`, ...). Defaults to text.
    pub value_type: Option<String>,
    /// Decoration tags already present on the cell.
    pub decorations: Vec<String>,
}

impl ExistingCell {
    /// A plain text cell.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A cell whose value is parsed according to `value_type`.
    pub fn typed(value: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            data_value: Some(value.into()),
            value_type: Some(value_type.into()),
            ..Self::default()
        }
    }

    /// Parse the cell's value.
    pub fn value(&self) -> ArrayResult<CellValue> {
        let raw = self.data_value.as_deref().unwrap_or(&self.text);
        let hint = self
            .value_type
            .as_deref()
            .map(ValueType::from_name)
            .unwrap_or_default();
        CellValue::parse(raw, hint)
    }
}

/// A pre-built array to reconcile into a [`CellStore`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExistingStructure {
    /// `data-*` attributes of the container. Recognized option keys override the options.
    pub data: BTreeMap<String, String>,
    /// Cells in index order.
    pub cells: Vec<ExistingCell>,
}

impl ExistingStructure {
    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> ArrayResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the store described by this structure.
    pub fn to_store(&self) -> ArrayResult<CellStore> {
        let values = self
            .cells
            .iter()
            .map(ExistingCell::value)
            .collect::<ArrayResult<Vec<_>>>()?;
        let mut store = CellStore::new(values);
        for (index, cell) in self.cells.iter().enumerate() {
            for tag in &cell.decorations {
                store.add_decoration(index, tag)?;
            }
        }
        Ok(store)
    }
}
