//! Headless layout engine.
//!
//! A layout policy turns the logical state of a [`CellStore`] into a [`Geometry`]: container
//! size, one [`CellGeometry`] per index and, for bar layouts, marker line placement. The
//! geometry is what the [`Renderer`](crate::Renderer) receives. The core never draws anything.
//!
//! Policies are looked up by name in a [`LayoutRegistry`]. The registry is built once, then
//! frozen and shared behind an `Arc`, so swapping the policy of an array is a name change and
//! never touches the store.
//!
//! Label widths are measured in display cells (UAX #11), so CJK and emoji labels get
//! double-width cells.

use crate::error::{ArrayError, ArrayResult};
use crate::store::{CellStore, MarkLine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use unicode_width::UnicodeWidthStr;

/// Row of cells.
pub const LINEAR: &str = "linear";
/// Row of cells with index captions.
pub const LINEAR_INDEXED: &str = "linear-indexed";
/// Row of bars whose height follows the value.
pub const BAR: &str = "bar";
/// Row of bars with index captions.
pub const BAR_INDEXED: &str = "bar-indexed";
/// Column of cells.
pub const VERTICAL: &str = "vertical";
/// Column of cells with an index caption column.
pub const VERTICAL_INDEXED: &str = "vertical-indexed";
/// Suffix selecting the captioned variant of a policy.
pub const INDEXED_SUFFIX: &str = "-indexed";

/// Headroom factor applied to the largest value so the tallest bar never fills the container.
pub const BAR_MARGIN: f64 = 1.15;

/// Cell sizing, in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    /// Narrowest a cell may be.
    pub min_cell_width: u32,
    /// Horizontal padding on each side of a label.
    pub padding: u32,
    /// Space between neighbouring cells.
    pub gap: u32,
    /// Height of a value cell (or of the value label row under a bar).
    pub cell_height: u32,
    /// Height reserved for index captions.
    pub caption_height: u32,
    /// Extent of a bar holding the largest value (before the headroom factor).
    pub bar_max_extent: u32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            min_cell_width: 3,
            padding: 1,
            gap: 1,
            cell_height: 1,
            caption_height: 1,
            bar_max_extent: 10,
        }
    }
}

/// Options passed to a layout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    /// Rendering hint copied into [`Geometry::centered`].
    pub centered: bool,
    /// Cell sizing.
    pub metrics: LayoutMetrics,
}

/// Main axis of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Cells run left to right.
    Horizontal,
    /// Cells run top to bottom.
    Vertical,
}

/// Geometry of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGeometry {
    /// Array index.
    pub index: usize,
    /// Left edge relative to the container.
    pub x: u32,
    /// Top edge relative to the container.
    pub y: u32,
    /// Cell width.
    pub width: u32,
    /// Cell height.
    pub height: u32,
    /// Value label.
    pub label: String,
    /// Index caption (indexed policies only).
    pub caption: Option<String>,
    /// Bar extent (bar policies only).
    pub bar_extent: Option<u32>,
    /// Decoration tags, sorted.
    pub decorations: Vec<String>,
    /// Style properties.
    pub styles: BTreeMap<String, String>,
}

/// Placement of a bar marker line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkGeometry {
    /// Index the mark belongs to.
    pub index: usize,
    /// Left end of the line.
    pub x_start: u32,
    /// Right end of the line.
    pub x_end: u32,
    /// Vertical position (top of the marked bar).
    pub y: u32,
    /// The marker line definition.
    pub line: MarkLine,
}

/// Complete visual description of an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Policy that produced this geometry.
    pub policy: String,
    /// Main axis.
    pub orientation: Orientation,
    /// Container width.
    pub width: u32,
    /// Container height.
    pub height: u32,
    /// Rendering hint: center the container.
    pub centered: bool,
    /// Per-cell geometry, in index order.
    pub cells: Vec<CellGeometry>,
    /// Bar marker lines, in index order.
    pub marks: Vec<MarkGeometry>,
    /// Whole-array style properties.
    pub styles: BTreeMap<String, String>,
}

impl Geometry {
    /// Geometry of a single cell.
    pub fn cell(&self, index: usize) -> Option<&CellGeometry> {
        self.cells.get(index)
    }
}

/// A named, stateless layout algorithm.
pub trait LayoutPolicy: Send + Sync {
    /// Compute the geometry for the current store content.
    ///
    /// Implementations must be pure: the same store and options always produce equal geometry.
    fn layout(&self, store: &CellStore, options: &LayoutOptions) -> Geometry;
}

/// Row layout (`linear`, `linear-indexed`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearLayout {
    /// Emit index captions.
    pub indexed: bool,
}

impl LayoutPolicy for LinearLayout {
    fn layout(&self, store: &CellStore, options: &LayoutOptions) -> Geometry {
        let m = options.metrics;
        let mut cells = base_cells(store, &m, self.indexed);
        let width = place_in_row(&mut cells, m.gap);
        for cell in &mut cells {
            cell.height = m.cell_height;
        }

        Geometry {
            policy: policy_name(LINEAR, self.indexed),
            orientation: Orientation::Horizontal,
            width,
            height: m.cell_height + caption_height(&m, self.indexed),
            centered: options.centered,
            cells,
            marks: Vec::new(),
            styles: store.array_styles().clone(),
        }
    }
}

/// Column layout (`vertical`, `vertical-indexed`).
#[derive(Debug, Clone, Copy, Default)]
pub struct VerticalLayout {
    /// Emit index captions (in a column left of the cells).
    pub indexed: bool,
}

impl LayoutPolicy for VerticalLayout {
    fn layout(&self, store: &CellStore, options: &LayoutOptions) -> Geometry {
        let m = options.metrics;
        let mut cells = base_cells(store, &m, self.indexed);

        let caption_column = if self.indexed {
            cells
                .iter()
                .filter_map(|c| c.caption.as_deref())
                .map(|caption| display_width(caption) + m.padding)
                .max()
                .unwrap_or(0)
        } else {
            0
        };
        let column_width = cells
            .iter()
            .map(|c| c.width)
            .max()
            .unwrap_or(m.min_cell_width);

        let mut y = 0u32;
        for (i, cell) in cells.iter_mut().enumerate() {
            if i > 0 {
                y += m.gap;
            }
            cell.x = caption_column;
            cell.y = y;
            cell.width = column_width;
            cell.height = m.cell_height;
            y += m.cell_height;
        }

        Geometry {
            policy: policy_name(VERTICAL, self.indexed),
            orientation: Orientation::Vertical,
            width: caption_column + column_width,
            height: y,
            centered: options.centered,
            cells,
            marks: Vec::new(),
            styles: store.array_styles().clone(),
        }
    }
}

/// Bar chart layout (`bar`, `bar-indexed`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BarLayout {
    /// Emit index captions.
    pub indexed: bool,
}

impl LayoutPolicy for BarLayout {
    fn layout(&self, store: &CellStore, options: &LayoutOptions) -> Geometry {
        let m = options.metrics;
        let mut cells = base_cells(store, &m, self.indexed);
        let width = place_in_row(&mut cells, m.gap);

        let extents = bar_extents(store, m.bar_max_extent);
        for (cell, extent) in cells.iter_mut().zip(extents) {
            cell.height = m.bar_max_extent + m.cell_height;
            cell.bar_extent = Some(extent);
        }

        let marks = mark_geometry(store, &cells, m.bar_max_extent);

        Geometry {
            policy: policy_name(BAR, self.indexed),
            orientation: Orientation::Horizontal,
            width,
            height: m.bar_max_extent + m.cell_height + caption_height(&m, self.indexed),
            centered: options.centered,
            cells,
            marks,
            styles: store.array_styles().clone(),
        }
    }
}

/// Bar extent of every cell.
///
/// The largest numeric value is scaled by [`BAR_MARGIN`], and each bar is
/// `round(max_extent * value / scaled_max)`. Non-numeric cells and negative values get `0`.
/// If there is no positive maximum, every extent is `0`.
pub fn bar_extents(store: &CellStore, max_extent: u32) -> Vec<u32> {
    let numbers: Vec<Option<f64>> = store
        .values()
        .iter()
        .map(|v| v.as_number().filter(|n| n.is_finite()))
        .collect();

    let max_value = numbers
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
        * BAR_MARGIN;

    if !max_value.is_finite() || max_value <= 0.0 {
        return vec![0; numbers.len()];
    }

    let full = f64::from(max_extent);
    numbers
        .into_iter()
        .map(|n| match n {
            Some(n) => (full * (n / max_value)).round().clamp(0.0, full) as u32,
            None => 0,
        })
        .collect()
}

/// Display width of a label, in layout units.
pub fn display_width(label: &str) -> u32 {
    u32::try_from(UnicodeWidthStr::width(label)).unwrap_or(u32::MAX)
}

fn policy_name(base: &str, indexed: bool) -> String {
    if indexed {
        format!("{base}{INDEXED_SUFFIX}")
    } else {
        base.to_string()
    }
}

fn caption_height(m: &LayoutMetrics, indexed: bool) -> u32 {
    if indexed { m.caption_height } else { 0 }
}

fn base_cells(store: &CellStore, m: &LayoutMetrics, indexed: bool) -> Vec<CellGeometry> {
    store
        .values()
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let label = value.to_string();
            let width = (display_width(&label) + 2 * m.padding).max(m.min_cell_width);
            CellGeometry {
                index,
                x: 0,
                y: 0,
                width,
                height: 0,
                label,
                caption: indexed.then(|| index.to_string()),
                bar_extent: None,
                decorations: store
                    .decorations(index)
                    .map(|tags| tags.iter().cloned().collect())
                    .unwrap_or_default(),
                styles: store.styles(index).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

/// Lay cells out left to right. Returns the total width.
fn place_in_row(cells: &mut [CellGeometry], gap: u32) -> u32 {
    let mut x = 0u32;
    for (i, cell) in cells.iter_mut().enumerate() {
        if i > 0 {
            x += gap;
        }
        cell.x = x;
        x += cell.width;
    }
    x
}

fn mark_geometry(store: &CellStore, cells: &[CellGeometry], max_extent: u32) -> Vec<MarkGeometry> {
    let Some(last) = cells.len().checked_sub(1) else {
        return Vec::new();
    };

    store
        .marks()
        .iter()
        .filter_map(|(&index, line)| {
            let cell = cells.get(index)?;
            let start = line.start_index.min(last);
            let end = line.end_index.unwrap_or(last).min(last).max(start);
            Some(MarkGeometry {
                index,
                x_start: cells[start].x,
                x_end: cells[end].x + cells[end].width,
                y: max_extent - cell.bar_extent.unwrap_or(0).min(max_extent),
                line: line.clone(),
            })
        })
        .collect()
}

/// Immutable table of layout policies, keyed by name.
pub struct LayoutRegistry {
    policies: BTreeMap<String, Box<dyn LayoutPolicy>>,
}

impl LayoutRegistry {
    /// A registry holding the six built-in policies.
    pub fn with_builtins() -> Self {
        LayoutRegistryBuilder::with_builtins().build()
    }

    /// Start building a registry from the built-in policies.
    pub fn builder() -> LayoutRegistryBuilder {
        LayoutRegistryBuilder::with_builtins()
    }

    /// Look up a policy.
    pub fn get(&self, name: &str) -> Option<&dyn LayoutPolicy> {
        self.policies.get(name).map(|p| p.as_ref())
    }

    /// Registered policy names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutRegistry")
            .field("policies", &self.policies.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`LayoutRegistry`].
pub struct LayoutRegistryBuilder {
    policies: BTreeMap<String, Box<dyn LayoutPolicy>>,
}

impl LayoutRegistryBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self {
            policies: BTreeMap::new(),
        }
    }

    /// A builder pre-populated with the built-in policies.
    pub fn with_builtins() -> Self {
        Self::new()
            .register(LINEAR, LinearLayout { indexed: false })
            .register(LINEAR_INDEXED, LinearLayout { indexed: true })
            .register(BAR, BarLayout { indexed: false })
            .register(BAR_INDEXED, BarLayout { indexed: true })
            .register(VERTICAL, VerticalLayout { indexed: false })
            .register(VERTICAL_INDEXED, VerticalLayout { indexed: true })
    }

    /// Add (or replace) a policy.
    pub fn register(
        mut self,
        name: impl Into<String>,
        policy: impl LayoutPolicy + 'static,
    ) -> Self {
        self.policies.insert(name.into(), Box::new(policy));
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> LayoutRegistry {
        LayoutRegistry {
            policies: self.policies,
        }
    }
}

impl Default for LayoutRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes geometry through a shared [`LayoutRegistry`].
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    registry: Arc<LayoutRegistry>,
}

impl LayoutEngine {
    /// Create an engine over an existing registry.
    pub fn new(registry: Arc<LayoutRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this engine resolves names against.
    pub fn registry(&self) -> &Arc<LayoutRegistry> {
        &self.registry
    }

    /// Look up the policy called `policy_name`.
    pub fn resolve(&self, policy_name: &str) -> ArrayResult<&dyn LayoutPolicy> {
        self.registry
            .get(policy_name)
            .ok_or_else(|| ArrayError::UnknownLayout(policy_name.to_string()))
    }

    /// Compute the geometry of `store` under the policy called `policy_name`.
    ///
    /// Fails with [`ArrayError::UnknownLayout`] if the name is not registered. The store is
    /// never modified.
    pub fn compute_layout(
        &self,
        store: &CellStore,
        policy_name: &str,
        options: &LayoutOptions,
    ) -> ArrayResult<Geometry> {
        let policy = self.resolve(policy_name)?;

        let mut geometry = policy.layout(store, options);
        geometry.policy = policy_name.to_string();

        tracing::trace!(
            target: "array_viz.layout",
            policy = policy_name,
            cells = geometry.cells.len(),
            width = geometry.width,
            height = geometry.height,
            "layout computed"
        );

        Ok(geometry)
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(Arc::new(LayoutRegistry::with_builtins()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;
    use pretty_assertions::assert_eq;

    fn options() -> LayoutOptions {
        LayoutOptions {
            centered: true,
            metrics: LayoutMetrics {
                min_cell_width: 3,
                padding: 1,
                gap: 1,
                cell_height: 2,
                caption_height: 1,
                bar_max_extent: 100,
            },
        }
    }

    #[test]
    fn test_linear_row_positions() {
        let store = CellStore::new([CellValue::from(3), CellValue::from(1000), CellValue::Empty]);
        let g = LayoutEngine::default()
            .compute_layout(&store, LINEAR, &options())
            .unwrap();

        let xs: Vec<u32> = g.cells.iter().map(|c| c.x).collect();
        let widths: Vec<u32> = g.cells.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![3, 6, 3]);
        assert_eq!(xs, vec![0, 4, 11]);
        assert_eq!(g.width, 14);
        assert_eq!(g.height, 2);
        assert!(g.cells.iter().all(|c| c.caption.is_none()));
        assert_eq!(g.orientation, Orientation::Horizontal);
    }

    #[test]
    fn test_indexed_captions() {
        let store = CellStore::new([5, 6]);
        let g = LayoutEngine::default()
            .compute_layout(&store, LINEAR_INDEXED, &options())
            .unwrap();

        let captions: Vec<Option<String>> = g.cells.iter().map(|c| c.caption.clone()).collect();
        assert_eq!(captions, vec![Some("0".to_string()), Some("1".to_string())]);
        assert_eq!(g.height, 3);
    }

    #[test]
    fn test_wide_labels_measure_display_cells() {
        let store = CellStore::new(["你好", "a"]);
        let g = LayoutEngine::default()
            .compute_layout(&store, LINEAR, &options())
            .unwrap();
        assert_eq!(g.cells[0].width, 6);
        assert_eq!(g.cells[1].width, 3);
    }

    #[test]
    fn test_bar_scaling() {
        let store = CellStore::new([10, 5, 0]);
        let g = LayoutEngine::default()
            .compute_layout(&store, BAR, &options())
            .unwrap();
        let extents: Vec<Option<u32>> = g.cells.iter().map(|c| c.bar_extent).collect();
        // max = 10 * 1.15 = 11.5
        assert_eq!(extents, vec![Some(87), Some(43), Some(0)]);
    }

    #[test]
    fn test_bar_all_zero_and_empty() {
        let zeros = CellStore::new([0, 0, 0]);
        assert_eq!(bar_extents(&zeros, 100), vec![0, 0, 0]);

        let blanks = CellStore::new([CellValue::Empty, CellValue::from("x")]);
        assert_eq!(bar_extents(&blanks, 100), vec![0, 0]);

        assert!(bar_extents(&CellStore::default(), 100).is_empty());
    }

    #[test]
    fn test_bar_marks_follow_bar_top() {
        let mut store = CellStore::new([10, 5, 0]);
        store.toggle_mark(1, MarkLine::spanning(0, 2)).unwrap();
        let g = LayoutEngine::default()
            .compute_layout(&store, BAR, &options())
            .unwrap();

        assert_eq!(g.marks.len(), 1);
        let mark = &g.marks[0];
        assert_eq!(mark.index, 1);
        assert_eq!(mark.y, 100 - 43);
        assert_eq!(mark.x_start, 0);
        assert_eq!(mark.x_end, g.width);
    }

    #[test]
    fn test_vertical_stack() {
        let store = CellStore::new([1, 22, 333]);
        let g = LayoutEngine::default()
            .compute_layout(&store, VERTICAL_INDEXED, &options())
            .unwrap();

        let ys: Vec<u32> = g.cells.iter().map(|c| c.y).collect();
        assert_eq!(ys, vec![0, 3, 6]);
        assert!(g.cells.iter().all(|c| c.width == 5 && c.x == 2));
        assert_eq!(g.width, 7);
        assert_eq!(g.height, 8);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let mut store = CellStore::new([4, 8, 15, 16, 23, 42]);
        store.add_decoration(2, "highlight").unwrap();
        let engine = LayoutEngine::default();
        for name in [LINEAR, LINEAR_INDEXED, BAR, BAR_INDEXED, VERTICAL, VERTICAL_INDEXED] {
            let first = engine.compute_layout(&store, name, &options()).unwrap();
            let second = engine.compute_layout(&store, name, &options()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_unknown_policy() {
        let store = CellStore::new([1]);
        let err = LayoutEngine::default()
            .compute_layout(&store, "spiral", &options())
            .unwrap_err();
        assert!(matches!(err, ArrayError::UnknownLayout(name) if name == "spiral"));
    }

    #[test]
    fn test_custom_policy_registration() {
        struct Flat;
        impl LayoutPolicy for Flat {
            fn layout(&self, store: &CellStore, options: &LayoutOptions) -> Geometry {
                LinearLayout { indexed: false }.layout(store, options)
            }
        }

        let registry = LayoutRegistry::builder().register("flat", Flat).build();
        let engine = LayoutEngine::new(Arc::new(registry));
        let g = engine
            .compute_layout(&CellStore::new([1]), "flat", &options())
            .unwrap();
        assert_eq!(g.policy, "flat");
        assert!(engine.registry().names().any(|n| n == BAR));
    }
}
