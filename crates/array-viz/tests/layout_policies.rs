//! Layout policy selection tests

use array_viz::{
    ArrayError, ArrayOptions, CellStore, CellValue, Geometry, LayoutEngine, LayoutOptions,
    LayoutPolicy, LayoutRegistry, LinearLayout, MarkLine, OperationKind, Orientation, VisualArray,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Lays cells out right to left.
struct MirroredLayout;

impl LayoutPolicy for MirroredLayout {
    fn layout(&self, store: &CellStore, options: &LayoutOptions) -> Geometry {
        let mut geometry = LinearLayout { indexed: false }.layout(store, options);
        let width = geometry.width;
        for cell in &mut geometry.cells {
            cell.x = width - cell.x - cell.width;
        }
        geometry
    }
}

#[test]
fn test_default_linear_geometry() {
    let array = VisualArray::new([3, 1, 4], ArrayOptions::default());
    let g = array.geometry().unwrap();
    assert_eq!(g.policy, "linear");
    assert_eq!(g.orientation, Orientation::Horizontal);
    assert_eq!(g.cells.iter().map(|c| c.x).collect::<Vec<_>>(), vec![0, 4, 8]);
    assert_eq!(g.width, 11);
    assert_eq!(g.height, 1);
    assert!(g.centered);
}

#[test]
fn test_indexed_option_adds_captions() {
    let array = VisualArray::new([3, 1], ArrayOptions::default().with_indexed(true));
    let g = array.geometry().unwrap();
    assert_eq!(g.policy, "linear-indexed");
    assert_eq!(g.cells[1].caption.as_deref(), Some("1"));
    assert_eq!(g.height, 2);
}

#[test]
fn test_unknown_layout_fails_at_layout_time() {
    let mut array = VisualArray::new([1, 2], ArrayOptions::default().with_layout("spiral"));
    assert!(array.geometry().is_none());

    let err = array.layout().unwrap_err();
    assert!(matches!(err, ArrayError::UnknownLayout(name) if name == "spiral"));

    // Nothing that cannot be laid out is recorded.
    assert!(array.swap(0, 1).is_err());
    assert!(array.timeline().is_empty());
    assert_eq!(array.values(), &[CellValue::from(1), CellValue::from(2)]);
}

#[test]
fn test_unknown_layout_rejects_growth_without_backfill() {
    let mut array = VisualArray::new([1, 2], ArrayOptions::default().with_layout("spiral"));

    let err = array.set_value(5, "x").unwrap_err();
    assert!(matches!(err, ArrayError::UnknownLayout(_)));
    assert_eq!(array.size(), 2);
    assert_eq!(array.values(), &[CellValue::from(1), CellValue::from(2)]);
    assert!(array.timeline().is_empty());

    // Once the layout resolves, the same write goes through.
    array.set_layout("linear").unwrap();
    array.set_value(5, "x").unwrap();
    assert_eq!(array.size(), 6);
    assert_eq!(array.timeline().len(), 1);
}

#[test]
fn test_set_layout_switches_policy_without_touching_store() {
    let mut array = VisualArray::new([3, 1, 4], ArrayOptions::default());
    array.swap(0, 2).unwrap();
    let before = array.store().clone();

    let g = array.set_layout("vertical").unwrap();
    assert_eq!(g.orientation, Orientation::Vertical);
    assert_eq!(g.cells.iter().map(|c| c.y).collect::<Vec<_>>(), vec![0, 2, 4]);
    assert_eq!(array.geometry().unwrap().policy, "vertical");
    assert_eq!(array.store(), &before);
    assert_eq!(array.timeline().len(), 1);

    let err = array.set_layout("nope").unwrap_err();
    assert!(matches!(err, ArrayError::UnknownLayout(_)));
    assert_eq!(array.options().layout, "vertical");
}

#[test]
fn test_custom_policy_through_shared_registry() {
    let registry = Arc::new(
        LayoutRegistry::builder()
            .register("mirrored", MirroredLayout)
            .build(),
    );
    let engine = LayoutEngine::new(registry.clone());
    assert!(registry.names().any(|name| name == "mirrored"));
    assert!(registry.names().any(|name| name == "bar-indexed"));

    let array = VisualArray::new([1, 2, 3], ArrayOptions::default().with_layout("mirrored"))
        .with_layout_engine(engine);
    let g = array.geometry().unwrap();
    assert_eq!(g.policy, "mirrored");
    assert_eq!(g.cells.iter().map(|c| c.x).collect::<Vec<_>>(), vec![8, 4, 0]);

    // Clones share the engine.
    let copy = array.clone_detached();
    assert_eq!(copy.geometry().unwrap().policy, "mirrored");
}

#[test]
fn test_toggle_line_only_affects_bar_layouts() {
    let mut linear = VisualArray::new([1, 2, 3], ArrayOptions::default());
    linear.toggle_line(1, MarkLine::default()).unwrap();
    assert!(linear.timeline().is_empty());
    assert!(linear.store().marks().is_empty());

    let mut bars = VisualArray::new([1, 2, 3], ArrayOptions::default().with_layout("bar"));
    bars.toggle_line(7, MarkLine::default()).unwrap();
    assert!(bars.timeline().is_empty());

    bars.toggle_line(1, MarkLine::spanning(0, 2)).unwrap();
    assert_eq!(bars.timeline().records()[0].kind(), OperationKind::ToggleLine);
    let g = bars.geometry().unwrap();
    assert_eq!(g.marks.len(), 1);
    assert_eq!(g.marks[0].index, 1);
    assert_eq!(g.marks[0].x_start, 0);
    assert_eq!(g.marks[0].x_end, g.width);

    bars.step_backward().unwrap();
    assert!(bars.store().mark(1).is_none());
    assert!(bars.geometry().unwrap().marks.is_empty());

    bars.step_forward().unwrap();
    assert_eq!(bars.store().mark(1), Some(&MarkLine::spanning(0, 2)));
}

#[test]
fn test_bar_extents_follow_values() {
    let mut array = VisualArray::new([10, 5, 0], ArrayOptions::default().with_layout("bar"));
    let extents = |g: &Geometry| g.cells.iter().map(|c| c.bar_extent).collect::<Vec<_>>();

    // 10 * 10 / 11.5 = 8.69..., 10 * 5 / 11.5 = 4.34...
    assert_eq!(extents(array.geometry().unwrap()), vec![Some(9), Some(4), Some(0)]);

    array.swap(0, 2).unwrap();
    assert_eq!(extents(array.geometry().unwrap()), vec![Some(0), Some(4), Some(9)]);
}

#[test]
fn test_autoresize_off_keeps_container_size() {
    let mut array = VisualArray::new([1, 2], ArrayOptions::default().with_autoresize(false));
    let width = array.geometry().unwrap().width;

    array.set_value(4, 5).unwrap();
    let g = array.geometry().unwrap();
    assert_eq!(g.cells.len(), 5);
    assert_eq!(g.width, width);

    let mut resizing = VisualArray::new([1, 2], ArrayOptions::default());
    resizing.set_value(4, 5).unwrap();
    assert!(resizing.geometry().unwrap().width > width);
}
