pub mod config;
pub mod dom;
pub mod generator;
pub mod layout;
pub mod query;
pub mod repair;
pub mod validator;

pub use config::{SimilarityWeights, TrailConfig};
pub use dom::{
    ComputedStyle, Document, Dom, ElementSpec, ListenerId, ListenerKind, NodeId, OverlayLayer,
    OverlayPatch, PageSnapshot, PageSurface, ScrollBehavior, TooltipContent,
};
pub use generator::{GeneratedSelector, SelectorGenerator, SelectorStrategy, generate_selector};
pub use layout::{ArrowOffset, ComputedPosition, LayoutOptions, compute_position};
pub use query::{
    TargetError, find_all, find_element, is_element_visible, resolve_target, scroll_to_element,
};
pub use repair::{RepairEngine, ScoredCandidate, SelectorContext, SelectorSuggestion, suggest_repairs};
pub use validator::{
    ValidationError, ValidationErrorKind, ValidationResult, ValidationWarning,
    ValidationWarningKind, selector_fragility, validate_trail,
};
