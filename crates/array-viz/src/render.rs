//! Collaborator interfaces.
//!
//! The core never draws. After every recorded step it hands the old and new [`Geometry`] to a
//! [`Renderer`], together with whether the transition should be animated. Diagnostic events go
//! to an optional [`Logger`].

use crate::layout::Geometry;
use crate::ops::OperationKind;
use std::time::Duration;

/// How a transition should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOptions {
    /// Animate gradually (`true`) or jump to the end state (`false`).
    pub animate: bool,
    /// Duration of the animation.
    pub speed: Duration,
}

/// Draws geometry transitions.
///
/// Implementations must be idempotent for identical transitions. When `options.animate` is
/// `false` they must show `new` before returning.
pub trait Renderer {
    /// Present the change from `old` to `new` caused by a `kind` operation.
    fn apply_transition(
        &mut self,
        kind: OperationKind,
        old: &Geometry,
        new: &Geometry,
        options: TransitionOptions,
    );

    /// Replace whatever is shown with `visual`, without a transition.
    ///
    /// Called for the initial layout and when a checkpoint is restored.
    fn reset(&mut self, _visual: &Geometry) {}
}

/// Renderer that discards everything (hidden arrays, clones, headless recording).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn apply_transition(
        &mut self,
        _kind: OperationKind,
        _old: &Geometry,
        _new: &Geometry,
        _options: TransitionOptions,
    ) {
    }
}

/// Fire-and-forget diagnostic hook.
pub trait Logger {
    /// Record one event.
    fn record(&mut self, event: &str, payload: &serde_json::Value);
}

/// [`Logger`] that forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn record(&mut self, event: &str, payload: &serde_json::Value) {
        tracing::info!(target: "array_viz.events", event, %payload, "array event");
    }
}
