//! Operation recorder.
//!
//! The recorder sits between the public array surface and the store. For every mutation it
//! runs the same sequence:
//!
//! 1. apply the operation and capture its inverse (failures stop here, nothing is recorded)
//! 2. recompute the geometry through the [`LayoutEngine`] (a failure rolls the store back)
//! 3. append the record to the [`Timeline`]
//! 4. hand `old -> new` to the [`Renderer`], animated in [`PlaybackMode::Play`] and instant
//!    in [`PlaybackMode::Scrub`]
//!
//! Timeline navigation goes through the same render path, so stepping back animates exactly
//! like stepping forward.

use crate::config::{ArrayOptions, PlaybackMode, PlaybackOptions};
use crate::error::ArrayResult;
use crate::layout::{Geometry, LayoutEngine};
use crate::ops::{ArrayOp, OperationKind, Recordable};
use crate::render::{Logger, NullRenderer, Renderer, TransitionOptions};
use crate::store::CellStore;
use crate::timeline::{OperationRecord, Timeline};
use serde_json::json;
use std::fmt;
use std::time::Duration;

/// Records operations onto a timeline and drives the renderer.
pub struct OperationRecorder {
    timeline: Timeline,
    layout: LayoutEngine,
    playback: PlaybackOptions,
    renderer: Box<dyn Renderer>,
    logger: Option<Box<dyn Logger>>,
    /// Geometry currently shown (or about to be shown) by the renderer.
    visual: Option<Geometry>,
    /// Kind of the last transition if it was animated and may still be running.
    pending_animation: Option<OperationKind>,
}

impl OperationRecorder {
    /// Create a recorder with an empty timeline.
    pub fn new(
        layout: LayoutEngine,
        playback: PlaybackOptions,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            timeline: Timeline::new(),
            layout,
            playback,
            renderer,
            logger: None,
            visual: None,
            pending_animation: None,
        }
    }

    /// A headless recorder sharing this recorder's layout engine and playback settings.
    ///
    /// The timeline starts empty, and output goes to a [`NullRenderer`].
    pub fn detached(&self) -> Self {
        Self::new(self.layout.clone(), self.playback, Box::new(NullRenderer))
    }

    /// The step log.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The layout engine.
    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Replace the layout engine. Takes effect on the next layout.
    pub fn set_layout_engine(&mut self, layout: LayoutEngine) {
        self.layout = layout;
    }

    /// The geometry last handed to the renderer.
    pub fn visual(&self) -> Option<&Geometry> {
        self.visual.as_ref()
    }

    /// Current playback mode.
    pub fn mode(&self) -> PlaybackMode {
        self.playback.mode
    }

    /// Switch playback mode.
    ///
    /// Leaving [`PlaybackMode::Play`] while an animation may still be running asks the
    /// renderer to show the end state immediately. The logical state is already final, so
    /// this only removes visual lag.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.playback.mode = mode;
        if mode == PlaybackMode::Scrub
            && let Some(kind) = self.pending_animation.take()
            && let Some(visual) = &self.visual
        {
            tracing::debug!(
                target: "array_viz.recorder",
                kind = %kind,
                "settling pending animation"
            );
            self.renderer.apply_transition(
                kind,
                visual,
                visual,
                TransitionOptions {
                    animate: false,
                    speed: Duration::ZERO,
                },
            );
        }
    }

    /// Animation duration.
    pub fn speed(&self) -> Duration {
        self.playback.speed()
    }

    /// Set the animation duration.
    pub fn set_speed(&mut self, speed: Duration) {
        self.playback.speed_ms = u64::try_from(speed.as_millis()).unwrap_or(u64::MAX);
    }

    /// Replace the renderer.
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = renderer;
        self.pending_animation = None;
    }

    /// Install a diagnostic logger.
    pub fn set_logger(&mut self, logger: Box<dyn Logger>) {
        self.logger = Some(logger);
    }

    /// Lay out `store` and show the result without a transition.
    pub fn reset_visual(&mut self, store: &CellStore, options: &ArrayOptions) -> ArrayResult<()> {
        self.visual = None;
        let geometry = self.compute(store, options)?;
        self.adopt_visual(geometry);
        Ok(())
    }

    /// Show `geometry` as-is without a transition (checkpoint restore).
    pub fn adopt_visual(&mut self, geometry: Geometry) {
        self.pending_animation = None;
        self.renderer.reset(&geometry);
        self.visual = Some(geometry);
    }

    /// Recompute the geometry without recording anything.
    ///
    /// The result becomes the current visual. If it differs from what the renderer shows, the
    /// renderer is reset to it.
    pub fn relayout(&mut self, store: &CellStore, options: &ArrayOptions) -> ArrayResult<Geometry> {
        let geometry = self.compute(store, options)?;
        if self.visual.as_ref() != Some(&geometry) {
            self.adopt_visual(geometry.clone());
        }
        Ok(geometry)
    }

    /// Apply `op`, record it with its inverse, and render the transition.
    ///
    /// If the operation fails, nothing changes. An unknown layout policy is rejected before the
    /// store is touched. If the result still cannot be laid out, the operation is reverted
    /// through its inverse, any slots it added are dropped, and nothing is recorded.
    pub fn record(
        &mut self,
        store: &mut CellStore,
        options: &ArrayOptions,
        op: impl Into<ArrayOp>,
    ) -> ArrayResult<()> {
        let op = op.into();
        self.layout.resolve(&options.policy_name())?;

        let size = store.size();
        let inverse = op.apply(store)?;
        let geometry = match self.compute(store, options) {
            Ok(geometry) => geometry,
            Err(err) => {
                inverse.apply(store)?;
                store.truncate(size);
                return Err(err);
            }
        };
        let record = OperationRecord::new(op, inverse);
        let kind = record.kind();

        let payload = json!({
            "kind": kind.as_str(),
            "cursor": self.timeline.cursor(),
            "len": self.timeline.len(),
            "forward": serde_json::to_value(record.forward()).unwrap_or_default(),
        });
        self.timeline.append(record);

        tracing::debug!(
            target: "array_viz.recorder",
            kind = %kind,
            cursor = self.timeline.cursor(),
            mode = ?self.playback.mode,
            "operation recorded"
        );
        self.log(&format!("array.{}", kind.as_str()), &payload);

        self.show(kind, geometry, self.animating());
        Ok(())
    }

    /// Re-apply the next recorded step. Returns `false` at the end of the timeline.
    pub fn step_forward(
        &mut self,
        store: &mut CellStore,
        options: &ArrayOptions,
    ) -> ArrayResult<bool> {
        match self.timeline.step_forward(store)? {
            Some(kind) => {
                self.log_step("array.stepForward", kind);
                self.present(store, options, kind, self.animating())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Undo the last applied step. Returns `false` at the start of the timeline.
    pub fn step_backward(
        &mut self,
        store: &mut CellStore,
        options: &ArrayOptions,
    ) -> ArrayResult<bool> {
        match self.timeline.step_backward(store)? {
            Some(kind) => {
                self.log_step("array.stepBackward", kind);
                self.present(store, options, kind, self.animating())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move the cursor to `target`. Every intermediate step is rendered instantly.
    pub fn jump_to(
        &mut self,
        store: &mut CellStore,
        options: &ArrayOptions,
        target: usize,
    ) -> ArrayResult<()> {
        let from = self.timeline.cursor();
        let mut timeline = std::mem::take(&mut self.timeline);
        let result = timeline.jump_to(store, target, |store, kind| {
            self.present(store, options, kind, false)
        });
        self.timeline = timeline;

        tracing::debug!(
            target: "array_viz.recorder",
            from,
            to = self.timeline.cursor(),
            "timeline jump"
        );
        self.log(
            "array.jump",
            &json!({ "from": from, "to": self.timeline.cursor(), "len": self.timeline.len() }),
        );
        result
    }

    fn animating(&self) -> bool {
        self.playback.mode == PlaybackMode::Play
    }

    fn present(
        &mut self,
        store: &CellStore,
        options: &ArrayOptions,
        kind: OperationKind,
        animate: bool,
    ) -> ArrayResult<()> {
        let new = self.compute(store, options)?;
        self.show(kind, new, animate);
        Ok(())
    }

    fn show(&mut self, kind: OperationKind, new: Geometry, animate: bool) {
        let old = self.visual.take().unwrap_or_else(|| new.clone());

        self.renderer.apply_transition(
            kind,
            &old,
            &new,
            TransitionOptions {
                animate,
                speed: if animate { self.playback.speed() } else { Duration::ZERO },
            },
        );
        self.pending_animation = animate.then_some(kind);
        self.visual = Some(new);
    }

    fn compute(&self, store: &CellStore, options: &ArrayOptions) -> ArrayResult<Geometry> {
        let mut geometry =
            self.layout
                .compute_layout(store, &options.policy_name(), &options.layout_options())?;
        if !options.autoresize
            && let Some(previous) = &self.visual
        {
            geometry.width = previous.width;
            geometry.height = previous.height;
        }
        Ok(geometry)
    }

    fn log_step(&mut self, event: &str, kind: OperationKind) {
        tracing::debug!(
            target: "array_viz.recorder",
            event,
            kind = %kind,
            cursor = self.timeline.cursor(),
            "timeline step"
        );
        let payload = json!({
            "kind": kind.as_str(),
            "cursor": self.timeline.cursor(),
            "len": self.timeline.len(),
        });
        self.log(event, &payload);
    }

    fn log(&mut self, event: &str, payload: &serde_json::Value) {
        if let Some(logger) = self.logger.as_mut() {
            logger.record(event, payload);
        }
    }
}

impl fmt::Debug for OperationRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRecorder")
            .field("timeline", &self.timeline)
            .field("playback", &self.playback)
            .field("has_logger", &self.logger.is_some())
            .field("pending_animation", &self.pending_animation)
            .finish()
    }
}
