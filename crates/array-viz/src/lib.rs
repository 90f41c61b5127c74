#![warn(missing_docs)]
//! Array Viz - Headless Array Visualization Kernel
//!
//! # Overview
//!
//! `array-viz` models a one-dimensional array whose every mutation is recorded as a reversible
//! step. The recorded steps form a timeline that can be walked forward and backward, so an
//! algorithm can be run once and then replayed or scrubbed like a slideshow.
//!
//! The crate never draws. It computes a [`Geometry`] (cell boxes, labels, bar extents, marker
//! lines) through a pluggable [`LayoutPolicy`] and hands `old -> new` transitions to a
//! [`Renderer`] supplied by the upper layer.
//!
//! # Core Features
//!
//! - **Reversible operations**: every mutation captures its inverse when it is first applied
//! - **Linear timeline**: step, jump, rewind; recording after an undo discards the redo tail
//! - **Pluggable layouts**: linear, vertical and bar built in, more through [`LayoutRegistry`]
//! - **Play / scrub playback**: animated transitions, or instant ones while scrubbing
//! - **Checkpoints**: export values plus the visual snapshot and hard-reset to them later
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  VisualArray                                │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  OperationRecorder  ──►  Renderer / Logger  │  ← Recording & Presentation
//! ├─────────────────────────────────────────────┤
//! │  Timeline (records + cursor)                │  ← Step Log
//! ├─────────────────────────────────────────────┤
//! │  Operations (forward + captured inverse)    │  ← Reversible Mutations
//! ├─────────────────────────────────────────────┤
//! │  LayoutEngine (registry of policies)        │  ← Geometry
//! ├─────────────────────────────────────────────┤
//! │  CellStore                                  │  ← Logical State
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use array_viz::{ArrayOptions, CellValue, EqualsOptions, VisualArray};
//!
//! let mut array = VisualArray::new([3, 1, 4], ArrayOptions::default());
//!
//! // Record a few steps.
//! array.highlight(0).unwrap();
//! array.swap(0, 1).unwrap();
//! array.set_value(5, 9).unwrap();
//! assert_eq!(array.size(), 6);
//! assert_eq!(array.timeline().len(), 3);
//!
//! // Scrub back to the start.
//! array.rewind().unwrap();
//! assert!(array.equals_slice(
//!     &[3.into(), 1.into(), 4.into(), CellValue::Empty, CellValue::Empty, CellValue::Empty],
//!     &EqualsOptions::default(),
//! ));
//! assert!(!array.is_highlight(0));
//! ```
//!
//! # Module Description
//!
//! - [`value`] - Cell value model and typed parsing
//! - [`store`] - Logical array state
//! - [`ops`] - Reversible operations
//! - [`timeline`] - Step log with a cursor
//! - [`layout`] - Layout policies, registry and engine
//! - [`recorder`] - Operation recording and transition dispatch
//! - [`render`] - Renderer and logger interfaces
//! - [`checkpoint`] - State export and pre-built structure import
//! - [`config`] - Array and playback options
//! - [`array`] - The [`VisualArray`] facade

pub mod array;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod layout;
pub mod ops;
pub mod recorder;
pub mod render;
pub mod store;
pub mod timeline;
pub mod value;

pub use array::{ARROW, EqualsOptions, HIGHLIGHT, Indices, VisualArray};
pub use checkpoint::{ArrayCheckpoint, ExistingCell, ExistingStructure};
pub use config::{ArrayOptions, PlaybackMode, PlaybackOptions};
pub use error::{ArrayError, ArrayResult};
pub use layout::{
    BarLayout, CellGeometry, Geometry, LayoutEngine, LayoutMetrics, LayoutOptions, LayoutPolicy,
    LayoutRegistry, LayoutRegistryBuilder, LinearLayout, MarkGeometry, Orientation, VerticalLayout,
};
pub use ops::{
    ArrayOp, OperationKind, Recordable, SetStyle, SetValue, StyleChange, StyleTarget, Swap,
    ToggleDecoration, ToggleLine,
};
pub use recorder::OperationRecorder;
pub use render::{Logger, NullRenderer, Renderer, TracingLogger, TransitionOptions};
pub use store::{CellStore, IndexedSequence, MarkLine, StoreSnapshot};
pub use timeline::{OperationRecord, Timeline};
pub use value::{CellValue, ValueType};
