//! Array and playback configuration.
//!
//! Options are plain structs with documented defaults. They deserialize from JSON with
//! `serde`. Missing fields take their defaults, and unknown keys are ignored.

use crate::error::ArrayResult;
use crate::layout::{self, LayoutMetrics, LayoutOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-array configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayOptions {
    /// Layout policy name (`linear`, `bar`, `vertical`, optionally with `-indexed`, or any
    /// name registered in the layout registry). Unknown names fail at layout time.
    pub layout: String,
    /// Recompute the container size after mutations. When `false` the container keeps its
    /// previous width/height and only cell geometry changes.
    pub autoresize: bool,
    /// Rendering hint: center the array in its container.
    pub center: bool,
    /// Show index captions under each cell.
    pub indexed: bool,
    /// Cell sizing used by the built-in policies.
    pub metrics: LayoutMetrics,
}

impl Default for ArrayOptions {
    fn default() -> Self {
        Self {
            layout: layout::LINEAR.to_string(),
            autoresize: true,
            center: true,
            indexed: false,
            metrics: LayoutMetrics::default(),
        }
    }
}

impl ArrayOptions {
    /// Parse options from JSON. Unknown keys are ignored.
    pub fn from_json(json: &str) -> ArrayResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Options with the given layout policy name.
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Options with index captions switched on or off.
    pub fn with_indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Options with autoresize switched on or off.
    pub fn with_autoresize(mut self, autoresize: bool) -> Self {
        self.autoresize = autoresize;
        self
    }

    /// Whether index captions are shown, either explicitly or through an `-indexed` policy name.
    pub fn is_indexed(&self) -> bool {
        self.indexed || self.layout.ends_with(layout::INDEXED_SUFFIX)
    }

    /// The registry key to look up.
    ///
    /// `array` is accepted as an alias of `linear`, and `indexed: true` selects the
    /// `-indexed` variant of the policy.
    pub fn policy_name(&self) -> String {
        let base = match self.layout.as_str() {
            "array" => layout::LINEAR,
            "array-indexed" => layout::LINEAR_INDEXED,
            other => other,
        };
        if self.indexed && !base.ends_with(layout::INDEXED_SUFFIX) {
            format!("{base}{}", layout::INDEXED_SUFFIX)
        } else {
            base.to_string()
        }
    }

    /// Whether the selected policy draws bars.
    pub fn is_bar_layout(&self) -> bool {
        self.policy_name().starts_with(layout::BAR)
    }

    /// Options handed to the layout engine.
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            centered: self.center,
            metrics: self.metrics,
        }
    }

    /// Merge `data-*` style attributes from a pre-built structure.
    ///
    /// Only `layout`, `autoresize`, `center` and `indexed` are recognized. Anything else,
    /// including malformed booleans, is ignored.
    pub fn merge_attributes(&mut self, attributes: &BTreeMap<String, String>) {
        for (key, value) in attributes {
            match key.as_str() {
                "layout" => self.layout = value.clone(),
                "autoresize" | "center" | "indexed" => {
                    let Some(flag) = parse_flag(value) else {
                        tracing::warn!(
                            target: "array_viz.config",
                            key = %key,
                            value = %value,
                            "ignoring non-boolean attribute"
                        );
                        continue;
                    };
                    match key.as_str() {
                        "autoresize" => self.autoresize = flag,
                        "center" => self.center = flag,
                        _ => self.indexed = flag,
                    }
                }
                _ => {}
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Whether recorded operations are animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Animate transitions at the configured speed.
    Play,
    /// Apply transitions instantly (recording, scrubbing, fast-forwarding).
    #[default]
    Scrub,
}

/// Playback configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackOptions {
    /// Initial playback mode.
    pub mode: PlaybackMode,
    /// Duration of one animated transition, in milliseconds.
    pub speed_ms: u64,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Scrub,
            speed_ms: 400,
        }
    }
}

impl PlaybackOptions {
    /// Transition duration.
    pub fn speed(&self) -> Duration {
        Duration::from_millis(self.speed_ms)
    }
}
