//! Equality, clone, checkpoint and structure import tests

use array_viz::{
    ArrayCheckpoint, ArrayError, ArrayOptions, CellValue, EqualsOptions, ExistingCell,
    ExistingStructure, NullRenderer, VisualArray,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[test]
fn test_equals_compares_values_loosely() {
    let a = VisualArray::new([1, 2, 3], ArrayOptions::default());
    let b = VisualArray::new(["1", "2", "3"], ArrayOptions::default());
    let c = VisualArray::new([1, 2], ArrayOptions::default());

    assert!(a.equals(&b, &EqualsOptions::default()));
    assert!(!a.equals(&c, &EqualsOptions::default()));
    assert!(a.equals_slice(&[1.into(), "2".into(), 3.into()], &EqualsOptions::default()));
}

#[test]
fn test_equals_with_css_ignores_values() {
    let mut a = VisualArray::new([1, 2, 3], ArrayOptions::default());
    let mut b = VisualArray::new([7, 8, 9], ArrayOptions::default());
    a.set_css(1, [("color", "red")]).unwrap();
    b.set_css(1, [("color", "red")]).unwrap();

    assert!(a.equals(&b, &EqualsOptions::css("color")));
    assert!(!a.equals(&b, &EqualsOptions::css("color").with_values()));

    b.set_css(2, [("color", "red")]).unwrap();
    assert!(!a.equals(&b, &EqualsOptions::css("color")));

    let explicit = EqualsOptions {
        value: Some(false),
        ..EqualsOptions::default()
    };
    assert!(a.equals(&b, &explicit));
}

#[test]
fn test_equals_slice_css_against_display_strings() {
    let mut array = VisualArray::new([0, 0], ArrayOptions::default());
    array.set_css(0, [("width", "10")]).unwrap();
    array.set_css(1, [("width", "20")]).unwrap();

    assert!(array.equals_slice(&[10.into(), 20.into()], &EqualsOptions::css("width")));
    assert!(!array.equals_slice(&[10.into(), 30.into()], &EqualsOptions::css("width")));
}

#[test]
fn test_equals_decorations() {
    let mut a = VisualArray::new([1, 2], ArrayOptions::default());
    let mut b = VisualArray::new([3, 4], ArrayOptions::default());
    a.highlight(0).unwrap();
    assert!(!a.equals(&b, &EqualsOptions::decoration("highlight")));
    b.highlight(0).unwrap();
    assert!(a.equals(&b, &EqualsOptions::decoration("highlight")));
}

#[test]
fn test_is_empty_means_all_empty_values() {
    let mut array = VisualArray::new(Vec::<CellValue>::new(), ArrayOptions::default());
    assert!(array.is_empty());

    array.set_value(2, CellValue::Empty).unwrap();
    assert_eq!(array.size(), 3);
    assert!(array.is_empty());

    array.set_value(1, "x").unwrap();
    assert!(!array.is_empty());
}

#[test]
fn test_indices_where() {
    let array = VisualArray::new([5, 1, 7, 3], ArrayOptions::default());
    let big = array.indices_where(|_, v| v.as_number().is_some_and(|n| n > 4.0));
    assert_eq!(big, vec![0, 2]);
}

#[test]
fn test_clone_detached_has_fresh_timeline() {
    let mut array = VisualArray::new([2, 1], ArrayOptions::default().with_layout("bar"));
    array.swap(0, 1).unwrap();
    array.highlight(1).unwrap();

    let mut copy = array.clone_detached();
    assert!(copy.timeline().is_empty());
    assert_eq!(copy.values(), array.values());
    assert!(copy.is_highlight(1));
    assert_eq!(copy.options(), array.options());
    assert_eq!(copy.geometry(), array.geometry());

    copy.set_value(0, 9).unwrap();
    assert_eq!(array.value(0).unwrap(), &CellValue::from(1));
    assert_eq!(array.timeline().len(), 2);
    assert_eq!(copy.timeline().len(), 1);
}

#[test]
fn test_restore_state_is_not_recorded() {
    let mut array = VisualArray::new([1, 2, 3], ArrayOptions::default());
    array.set_css(0, [("color", "red")]).unwrap();
    let checkpoint = array.state();

    array.swap(0, 2).unwrap();
    array.highlight(1).unwrap();
    array.set_css(0, [("color", "blue")]).unwrap();
    let cursor = array.timeline().cursor();

    array.restore_state(&checkpoint);
    assert_eq!(array.values(), checkpoint.values.as_slice());
    assert_eq!(array.css(0, "color"), Some("red"));
    assert!(!array.is_highlight(1));
    assert_eq!(array.timeline().cursor(), cursor);
    assert_eq!(array.timeline().len(), 4);
    assert_eq!(array.geometry(), checkpoint.visual.as_ref());
}

#[test]
fn test_checkpoint_json_round_trip() {
    let mut array = VisualArray::new([1, 2], ArrayOptions::default());
    array.set_value(3, "x").unwrap();
    array.toggle_arrow(0).unwrap();
    let checkpoint = array.state();

    let json = checkpoint.to_json().unwrap();
    let parsed = ArrayCheckpoint::from_json(&json).unwrap();
    assert_eq!(parsed, checkpoint);

    let mut other = VisualArray::new([0], ArrayOptions::default());
    other.restore_state(&parsed);
    assert!(other.equals(&array, &EqualsOptions::default()));
    assert!(other.has_decoration(0, "arrow"));
}

#[test]
fn test_from_structure_parses_typed_cells() {
    let structure = ExistingStructure {
        data: BTreeMap::from([
            ("layout".to_string(), "bar".to_string()),
            ("indexed".to_string(), "true".to_string()),
            ("unknown".to_string(), "whatever".to_string()),
        ]),
        cells: vec![
            ExistingCell::typed("12", "number"),
            ExistingCell::text("abc"),
            ExistingCell {
                text: "5".to_string(),
                value_type: Some("number".to_string()),
                decorations: vec!["highlight".to_string()],
                ..ExistingCell::default()
            },
            ExistingCell::text(""),
        ],
    };

    let array =
        VisualArray::from_structure(&structure, ArrayOptions::default(), NullRenderer).unwrap();
    assert_eq!(
        array.values(),
        &[
            CellValue::from(12),
            CellValue::from("abc"),
            CellValue::from(5),
            CellValue::Empty
        ]
    );
    assert!(array.is_highlight(2));
    assert_eq!(array.options().policy_name(), "bar-indexed");
    assert_eq!(array.geometry().unwrap().policy, "bar-indexed");
    assert!(array.timeline().is_empty());
}

#[test]
fn test_from_structure_rejects_bad_numbers() {
    let structure = ExistingStructure {
        cells: vec![ExistingCell::typed("twelve", "number")],
        ..ExistingStructure::default()
    };
    let err =
        VisualArray::from_structure(&structure, ArrayOptions::default(), NullRenderer).unwrap_err();
    assert!(matches!(err, ArrayError::InvalidValue { hint: "number", .. }));
}

#[test]
fn test_structure_from_json() {
    let structure = ExistingStructure::from_json(
        r#"{
            "data": {"layout": "vertical"},
            "cells": [{"text": "a"}, {"data_value": "3", "value_type": "number"}]
        }"#,
    )
    .unwrap();
    let array =
        VisualArray::from_structure(&structure, ArrayOptions::default(), NullRenderer).unwrap();
    assert_eq!(array.values(), &[CellValue::from("a"), CellValue::from(3)]);
    assert_eq!(array.geometry().unwrap().policy, "vertical");
}
