use crate::layout::LayoutOptions;
use serde::{Deserialize, Serialize};
use trail_common::Size;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrailConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub similarity: SimilarityWeights,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Delay between scrolling a target into view and showing the step.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Interval of the async driver's clock.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_keyboard")]
    pub keyboard: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            tick_ms: default_tick_ms(),
            keyboard: default_keyboard(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    300
}

fn default_tick_ms() -> u64 {
    16
}

fn default_keyboard() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Space left around the target inside the spotlight cut-out.
    #[serde(default = "default_padding")]
    pub spotlight_padding: f32,
    /// Minimum distance kept between the tooltip and the viewport edge.
    #[serde(default = "default_padding")]
    pub viewport_padding: f32,
    /// Gap between the target and the tooltip.
    #[serde(default = "default_offset")]
    pub offset: f32,
    #[serde(default = "default_padding")]
    pub arrow_padding: f32,
    #[serde(default = "default_tooltip_width")]
    pub tooltip_width: f32,
    #[serde(default = "default_tooltip_height")]
    pub tooltip_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spotlight_padding: default_padding(),
            viewport_padding: default_padding(),
            offset: default_offset(),
            arrow_padding: default_padding(),
            tooltip_width: default_tooltip_width(),
            tooltip_height: default_tooltip_height(),
        }
    }
}

impl LayoutConfig {
    pub fn tooltip_size(&self) -> Size {
        Size::new(self.tooltip_width, self.tooltip_height)
    }

    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            offset: self.offset,
            padding: self.viewport_padding,
            arrow_padding: self.arrow_padding,
        }
    }
}

fn default_padding() -> f32 {
    8.0
}

fn default_offset() -> f32 {
    12.0
}

fn default_tooltip_width() -> f32 {
    320.0
}

fn default_tooltip_height() -> f32 {
    160.0
}

/// Weights for the repair matcher.
///
/// Ranking picks candidates; confidence is the number shown to the user.
/// The two are computed independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    #[serde(default = "default_rank_attribute")]
    pub rank_attribute: f32,
    #[serde(default = "default_rank_aria_label")]
    pub rank_aria_label: f32,
    #[serde(default = "default_rank_classes")]
    pub rank_classes: f32,
    #[serde(default = "default_rank_text_exact")]
    pub rank_text_exact: f32,
    #[serde(default = "default_rank_text_partial")]
    pub rank_text_partial: f32,
    /// Candidates scoring at or below this are discarded.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    #[serde(default = "default_confidence_base")]
    pub confidence_base: f32,
    #[serde(default = "default_confidence_tag")]
    pub confidence_tag: f32,
    #[serde(default = "default_confidence_attribute")]
    pub confidence_attribute: f32,
    #[serde(default = "default_confidence_attribute")]
    pub confidence_aria_label: f32,
    #[serde(default = "default_confidence_attribute")]
    pub confidence_classes: f32,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            rank_attribute: default_rank_attribute(),
            rank_aria_label: default_rank_aria_label(),
            rank_classes: default_rank_classes(),
            rank_text_exact: default_rank_text_exact(),
            rank_text_partial: default_rank_text_partial(),
            min_score: default_min_score(),
            max_suggestions: default_max_suggestions(),
            confidence_base: default_confidence_base(),
            confidence_tag: default_confidence_tag(),
            confidence_attribute: default_confidence_attribute(),
            confidence_aria_label: default_confidence_attribute(),
            confidence_classes: default_confidence_attribute(),
        }
    }
}

fn default_rank_attribute() -> f32 {
    0.5
}

fn default_rank_aria_label() -> f32 {
    0.4
}

fn default_rank_classes() -> f32 {
    0.3
}

fn default_rank_text_exact() -> f32 {
    0.3
}

fn default_rank_text_partial() -> f32 {
    0.15
}

fn default_min_score() -> f32 {
    0.1
}

fn default_max_suggestions() -> usize {
    5
}

fn default_confidence_base() -> f32 {
    0.3
}

fn default_confidence_tag() -> f32 {
    0.1
}

fn default_confidence_attribute() -> f32 {
    0.2
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Collector URL; analytics are dropped when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Log delivery failures instead of swallowing them silently.
    #[serde(default)]
    pub debug: bool,
}
