//! The public array surface.
//!
//! [`VisualArray`] combines a [`CellStore`], its [`ArrayOptions`] and an
//! [`OperationRecorder`]. Reads go straight to the store. Every mutation goes through the
//! recorder, so it lands on the timeline with its inverse and is handed to the renderer.
//!
//! # Example
//!
//! ```rust
//! use array_viz::{ArrayOptions, CellValue, VisualArray};
//!
//! let mut array = VisualArray::new([3, 1, 4], ArrayOptions::default());
//! array.swap(0, 2).unwrap().set_value(1, 9).unwrap();
//! assert_eq!(array.values(), &[CellValue::from(4), CellValue::from(9), CellValue::from(3)]);
//!
//! array.step_backward().unwrap();
//! array.step_backward().unwrap();
//! assert_eq!(array.values(), &[CellValue::from(3), CellValue::from(1), CellValue::from(4)]);
//!
//! array.step_forward().unwrap();
//! array.step_forward().unwrap();
//! assert_eq!(array.values(), &[CellValue::from(4), CellValue::from(9), CellValue::from(3)]);
//! ```

use crate::checkpoint::{ArrayCheckpoint, ExistingStructure};
use crate::config::{ArrayOptions, PlaybackMode, PlaybackOptions};
use crate::error::{ArrayError, ArrayResult};
use crate::layout::{Geometry, LayoutEngine};
use crate::ops::{SetStyle, SetValue, StyleChange, StyleTarget, Swap, ToggleDecoration, ToggleLine};
use crate::recorder::OperationRecorder;
use crate::render::{Logger, NullRenderer, Renderer};
use crate::store::{CellStore, MarkLine};
use crate::timeline::Timeline;
use crate::value::CellValue;
use std::ops::Range;
use std::time::Duration;

/// Decoration tag used by [`VisualArray::highlight`].
pub const HIGHLIGHT: &str = "highlight";
/// Decoration tag used by [`VisualArray::toggle_arrow`].
pub const ARROW: &str = "arrow";

/// A selection of indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    /// A single index.
    One(usize),
    /// An explicit list.
    Many(Vec<usize>),
    /// A half-open range.
    Range(Range<usize>),
    /// Every index.
    All,
}

impl Indices {
    /// Resolve against an array of `len` slots. Every resolved index must be addressable.
    fn resolve(&self, len: usize) -> ArrayResult<Vec<usize>> {
        let indices: Vec<usize> = match self {
            Indices::One(index) => vec![*index],
            Indices::Many(indices) => indices.clone(),
            Indices::Range(range) => range.clone().collect(),
            Indices::All => (0..len).collect(),
        };
        if let Some(&bad) = indices.iter().find(|&&index| index >= len) {
            return Err(ArrayError::IndexOutOfRange { index: bad, len });
        }
        Ok(indices)
    }
}

impl From<usize> for Indices {
    fn from(index: usize) -> Self {
        Indices::One(index)
    }
}

impl From<Vec<usize>> for Indices {
    fn from(indices: Vec<usize>) -> Self {
        Indices::Many(indices)
    }
}

impl From<&[usize]> for Indices {
    fn from(indices: &[usize]) -> Self {
        Indices::Many(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Indices {
    fn from(indices: [usize; N]) -> Self {
        Indices::Many(indices.to_vec())
    }
}

impl From<Range<usize>> for Indices {
    fn from(range: Range<usize>) -> Self {
        Indices::Range(range)
    }
}

/// What [`VisualArray::equals`] compares.
///
/// With no options, only values are compared. Naming css properties or decoration tags switches
/// value comparison off unless `value` is set explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EqualsOptions {
    /// Force value comparison on or off.
    pub value: Option<bool>,
    /// Cell style properties to compare.
    pub css: Vec<String>,
    /// Decoration tags to compare.
    pub decorations: Vec<String>,
}

impl EqualsOptions {
    /// Compare one style property only.
    pub fn css(property: impl Into<String>) -> Self {
        Self {
            css: vec![property.into()],
            ..Self::default()
        }
    }

    /// Compare one decoration tag only.
    pub fn decoration(tag: impl Into<String>) -> Self {
        Self {
            decorations: vec![tag.into()],
            ..Self::default()
        }
    }

    /// Also compare values.
    pub fn with_values(mut self) -> Self {
        self.value = Some(true);
        self
    }

    fn compares_values(&self) -> bool {
        self.value
            .unwrap_or(self.css.is_empty() && self.decorations.is_empty())
    }
}

/// An array whose every mutation is recorded and can be replayed or undone.
#[derive(Debug)]
pub struct VisualArray {
    store: CellStore,
    options: ArrayOptions,
    recorder: OperationRecorder,
}

impl VisualArray {
    /// Create a headless array (output goes to a [`NullRenderer`]).
    pub fn new<I, V>(values: I, options: ArrayOptions) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self::with_renderer(values, options, NullRenderer)
    }

    /// Create an array that draws through `renderer`.
    pub fn with_renderer<I, V>(
        values: I,
        options: ArrayOptions,
        renderer: impl Renderer + 'static,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self::from_store(CellStore::new(values), options, Box::new(renderer))
    }

    /// Reconcile a pre-built structure into a new array.
    ///
    /// Recognized `data` attributes of the structure override `options`.
    pub fn from_structure(
        structure: &ExistingStructure,
        mut options: ArrayOptions,
        renderer: impl Renderer + 'static,
    ) -> ArrayResult<Self> {
        options.merge_attributes(&structure.data);
        let store = structure.to_store()?;
        Ok(Self::from_store(store, options, Box::new(renderer)))
    }

    fn from_store(store: CellStore, options: ArrayOptions, renderer: Box<dyn Renderer>) -> Self {
        let recorder = OperationRecorder::new(
            LayoutEngine::default(),
            PlaybackOptions::default(),
            renderer,
        );
        let mut array = Self {
            store,
            options,
            recorder,
        };
        array.reset_visual();
        array
    }

    /// Attach a diagnostic logger.
    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.recorder.set_logger(Box::new(logger));
        self
    }

    /// Use a specific layout engine (e.g. one sharing a custom registry).
    pub fn with_layout_engine(mut self, engine: LayoutEngine) -> Self {
        self.recorder.set_layout_engine(engine);
        self.reset_visual();
        self
    }

    /// Apply playback settings.
    pub fn with_playback(mut self, playback: PlaybackOptions) -> Self {
        self.recorder.set_speed(playback.speed());
        self.recorder.set_mode(playback.mode);
        self
    }

    // Layout failures at construction are deferred: the same error resurfaces on the next
    // layout, where callers can handle it.
    fn reset_visual(&mut self) {
        if let Err(err) = self.recorder.reset_visual(&self.store, &self.options) {
            tracing::warn!(
                target: "array_viz.array",
                layout = %self.options.layout,
                error = %err,
                "initial layout failed"
            );
        }
    }

    // ---- reads ------------------------------------------------------------------------------

    /// Value at `index`.
    pub fn value(&self, index: usize) -> ArrayResult<&CellValue> {
        self.store.get(index)
    }

    /// All values in index order.
    pub fn values(&self) -> &[CellValue] {
        self.store.values()
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.store.size()
    }

    /// Returns `true` if every slot holds [`CellValue::Empty`].
    pub fn is_empty(&self) -> bool {
        self.store.is_blank()
    }

    /// The underlying store.
    pub fn store(&self) -> &CellStore {
        &self.store
    }

    /// Whether `index` carries `tag`.
    pub fn has_decoration(&self, index: usize, tag: &str) -> bool {
        self.store.has_decoration(index, tag)
    }

    /// Whether `index` is highlighted.
    pub fn is_highlight(&self, index: usize) -> bool {
        self.store.has_decoration(index, HIGHLIGHT)
    }

    /// Style property of a cell.
    pub fn css(&self, index: usize, property: &str) -> Option<&str> {
        self.store.style(index, property)
    }

    /// Style property of the array container.
    pub fn array_css(&self, property: &str) -> Option<&str> {
        self.store.array_style(property)
    }

    /// Indices whose value satisfies `predicate`, evaluated now.
    pub fn indices_where(&self, predicate: impl Fn(usize, &CellValue) -> bool) -> Vec<usize> {
        self.store
            .values()
            .iter()
            .enumerate()
            .filter(|(index, value)| predicate(*index, value))
            .map(|(index, _)| index)
            .collect()
    }

    /// Geometry currently shown.
    pub fn geometry(&self) -> Option<&Geometry> {
        self.recorder.visual()
    }

    /// Current options.
    pub fn options(&self) -> &ArrayOptions {
        &self.options
    }

    /// Step log.
    pub fn timeline(&self) -> &Timeline {
        self.recorder.timeline()
    }

    // ---- playback ---------------------------------------------------------------------------

    /// Current playback mode.
    pub fn playback_mode(&self) -> PlaybackMode {
        self.recorder.mode()
    }

    /// Switch playback mode. Switching to scrub settles a running animation.
    pub fn set_playback_mode(&mut self, mode: PlaybackMode) {
        self.recorder.set_mode(mode);
    }

    /// Animation duration.
    pub fn speed(&self) -> Duration {
        self.recorder.speed()
    }

    /// Set the animation duration.
    pub fn set_speed(&mut self, speed: Duration) {
        self.recorder.set_speed(speed);
    }

    /// Replace the renderer. The current geometry is pushed to it right away.
    pub fn set_renderer(&mut self, renderer: impl Renderer + 'static) {
        self.recorder.set_renderer(Box::new(renderer));
        if let Some(visual) = self.recorder.visual().cloned() {
            self.recorder.adopt_visual(visual);
        }
    }

    // ---- recorded mutations -----------------------------------------------------------------

    /// Write a value, growing the array with empty slots if `index` is past the end.
    pub fn set_value(
        &mut self,
        index: usize,
        value: impl Into<CellValue>,
    ) -> ArrayResult<&mut Self> {
        let op = SetValue {
            index,
            value: value.into(),
        };
        self.recorder.record(&mut self.store, &self.options, op)?;
        Ok(self)
    }

    /// Exchange two values.
    pub fn swap(&mut self, first: usize, second: usize) -> ArrayResult<&mut Self> {
        self.recorder
            .record(&mut self.store, &self.options, Swap { first, second })?;
        Ok(self)
    }

    /// Attach `tag` to the selected cells. Cells that already carry it are left alone. If
    /// nothing would change, nothing is recorded.
    pub fn decorate(&mut self, indices: impl Into<Indices>, tag: &str) -> ArrayResult<&mut Self> {
        let indices: Vec<usize> = indices
            .into()
            .resolve(self.size())?
            .into_iter()
            .filter(|&index| !self.store.has_decoration(index, tag))
            .collect();
        self.toggle_resolved(dedup(indices), tag)
    }

    /// Detach `tag` from the selected cells. If nothing would change, nothing is recorded.
    pub fn undecorate(&mut self, indices: impl Into<Indices>, tag: &str) -> ArrayResult<&mut Self> {
        let indices: Vec<usize> = indices
            .into()
            .resolve(self.size())?
            .into_iter()
            .filter(|&index| self.store.has_decoration(index, tag))
            .collect();
        self.toggle_resolved(dedup(indices), tag)
    }

    /// Flip `tag` on the selected cells. Its own inverse.
    pub fn toggle_decoration(
        &mut self,
        indices: impl Into<Indices>,
        tag: &str,
    ) -> ArrayResult<&mut Self> {
        let indices = indices.into().resolve(self.size())?;
        self.toggle_resolved(indices, tag)
    }

    /// Highlight the selected cells.
    pub fn highlight(&mut self, indices: impl Into<Indices>) -> ArrayResult<&mut Self> {
        self.decorate(indices, HIGHLIGHT)
    }

    /// Remove the highlight from the selected cells.
    pub fn unhighlight(&mut self, indices: impl Into<Indices>) -> ArrayResult<&mut Self> {
        self.undecorate(indices, HIGHLIGHT)
    }

    /// Flip the arrow marker on the selected cells.
    pub fn toggle_arrow(&mut self, indices: impl Into<Indices>) -> ArrayResult<&mut Self> {
        self.toggle_decoration(indices, ARROW)
    }

    fn toggle_resolved(&mut self, indices: Vec<usize>, tag: &str) -> ArrayResult<&mut Self> {
        if indices.is_empty() {
            return Ok(self);
        }
        let op = ToggleDecoration {
            indices,
            tag: tag.to_string(),
        };
        self.recorder.record(&mut self.store, &self.options, op)?;
        Ok(self)
    }

    /// Set style properties on the selected cells.
    pub fn set_css<K, V>(
        &mut self,
        indices: impl Into<Indices>,
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> ArrayResult<&mut Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let indices = indices.into().resolve(self.size())?;
        let properties: Vec<(String, String)> = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let changes = indices
            .iter()
            .flat_map(|&index| {
                properties.iter().map(move |(property, value)| StyleChange {
                    target: StyleTarget::Cell(index),
                    property: property.clone(),
                    value: Some(value.clone()),
                })
            })
            .collect();
        self.record_styles(changes)
    }

    /// Remove style properties from the selected cells.
    pub fn remove_css<K>(
        &mut self,
        indices: impl Into<Indices>,
        properties: impl IntoIterator<Item = K>,
    ) -> ArrayResult<&mut Self>
    where
        K: Into<String>,
    {
        let indices = indices.into().resolve(self.size())?;
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();

        let changes = indices
            .iter()
            .flat_map(|&index| {
                properties.iter().map(move |property| StyleChange {
                    target: StyleTarget::Cell(index),
                    property: property.clone(),
                    value: None,
                })
            })
            .collect();
        self.record_styles(changes)
    }

    /// Set style properties on the array container.
    pub fn set_array_css<K, V>(
        &mut self,
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> ArrayResult<&mut Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let changes = properties
            .into_iter()
            .map(|(property, value)| StyleChange {
                target: StyleTarget::Array,
                property: property.into(),
                value: Some(value.into()),
            })
            .collect();
        self.record_styles(changes)
    }

    fn record_styles(&mut self, changes: Vec<StyleChange>) -> ArrayResult<&mut Self> {
        if changes.is_empty() {
            return Ok(self);
        }
        self.recorder
            .record(&mut self.store, &self.options, SetStyle { changes })?;
        Ok(self)
    }

    /// Toggle the marker line above the bar at `index`.
    ///
    /// Only bar layouts have marker lines. With any other layout, or for an index that does not
    /// exist, this does nothing.
    pub fn toggle_line(&mut self, index: usize, line: MarkLine) -> ArrayResult<&mut Self> {
        if !self.options.is_bar_layout() || index >= self.size() {
            tracing::trace!(
                target: "array_viz.array",
                index,
                layout = %self.options.layout,
                "toggle_line ignored"
            );
            return Ok(self);
        }
        self.recorder
            .record(&mut self.store, &self.options, ToggleLine { index, line })?;
        Ok(self)
    }

    // ---- timeline ---------------------------------------------------------------------------

    /// Replay the next recorded step. Returns `false` at the end of the timeline.
    pub fn step_forward(&mut self) -> ArrayResult<bool> {
        self.recorder.step_forward(&mut self.store, &self.options)
    }

    /// Undo the last applied step. Returns `false` at the start of the timeline.
    pub fn step_backward(&mut self) -> ArrayResult<bool> {
        self.recorder.step_backward(&mut self.store, &self.options)
    }

    /// Move the timeline cursor to `target` (`0..=len`), rendering instantly.
    pub fn jump_to(&mut self, target: usize) -> ArrayResult<()> {
        self.recorder.jump_to(&mut self.store, &self.options, target)
    }

    /// Undo every applied step.
    pub fn rewind(&mut self) -> ArrayResult<()> {
        self.jump_to(0)
    }

    /// Apply every recorded step.
    pub fn fast_forward(&mut self) -> ArrayResult<()> {
        let len = self.timeline().len();
        self.jump_to(len)
    }

    // ---- layout -----------------------------------------------------------------------------

    /// Recompute the geometry of the current state. The renderer is reset if it changed.
    pub fn layout(&mut self) -> ArrayResult<Geometry> {
        self.recorder.relayout(&self.store, &self.options)
    }

    /// Switch the layout policy and lay out again. The store is not touched, and the renderer
    /// is reset to the new geometry.
    ///
    /// If `name` is not a registered policy, the previous policy is kept and
    /// [`ArrayError::UnknownLayout`] is returned.
    pub fn set_layout(&mut self, name: impl Into<String>) -> ArrayResult<Geometry> {
        let previous = std::mem::replace(&mut self.options.layout, name.into());
        match self.recorder.relayout(&self.store, &self.options) {
            Ok(geometry) => Ok(geometry),
            Err(err) => {
                self.options.layout = previous;
                Err(err)
            }
        }
    }

    // ---- comparison -------------------------------------------------------------------------

    /// Compare with another array. The timeline is never consulted.
    pub fn equals(&self, other: &VisualArray, options: &EqualsOptions) -> bool {
        let len = self.size();
        if len != other.size() {
            return false;
        }
        if options.compares_values()
            && !self
                .values()
                .iter()
                .zip(other.values())
                .all(|(a, b)| a.loosely_equals(b))
        {
            return false;
        }
        let css_equal = options
            .css
            .iter()
            .all(|property| (0..len).all(|i| self.css(i, property) == other.css(i, property)));
        let decorations_equal = options.decorations.iter().all(|tag| {
            (0..len).all(|i| self.has_decoration(i, tag) == other.has_decoration(i, tag))
        });
        css_equal && decorations_equal
    }

    /// Compare with plain values.
    ///
    /// Values are compared loosely. A named css property is compared against the display
    /// string of the corresponding value. Decoration options do not apply to plain values.
    pub fn equals_slice(&self, other: &[CellValue], options: &EqualsOptions) -> bool {
        if self.size() != other.len() {
            return false;
        }
        if options.compares_values()
            && !self
                .values()
                .iter()
                .zip(other)
                .all(|(a, b)| a.loosely_equals(b))
        {
            return false;
        }
        options.css.iter().all(|property| {
            other
                .iter()
                .enumerate()
                .all(|(i, expected)| {
                    self.css(i, property).unwrap_or_default() == expected.to_string()
                })
        })
    }

    // ---- clone & checkpoints ----------------------------------------------------------------

    /// Copy the current state into a new, hidden array.
    ///
    /// The copy has its own empty timeline and renders nowhere. It shares the layout engine.
    pub fn clone_detached(&self) -> VisualArray {
        let mut copy = VisualArray {
            store: self.store.snapshot().into_store(),
            options: self.options.clone(),
            recorder: self.recorder.detached(),
        };
        copy.reset_visual();
        copy
    }

    /// Export the values and the visual snapshot.
    pub fn state(&self) -> ArrayCheckpoint {
        ArrayCheckpoint {
            values: self.store.values().to_vec(),
            visual: self.recorder.visual().cloned(),
        }
    }

    /// Hard-reset to a checkpoint. Not recorded, and the timeline is left as it is.
    pub fn restore_state(&mut self, checkpoint: &ArrayCheckpoint) {
        checkpoint.restore_into(&mut self.store);
        match &checkpoint.visual {
            Some(visual) => self.recorder.adopt_visual(visual.clone()),
            None => self.reset_visual(),
        }
        tracing::debug!(
            target: "array_viz.array",
            size = self.size(),
            cursor = self.timeline().cursor(),
            "checkpoint restored"
        );
    }
}

fn dedup(mut indices: Vec<usize>) -> Vec<usize> {
    indices.sort_unstable();
    indices.dedup();
    indices
}
