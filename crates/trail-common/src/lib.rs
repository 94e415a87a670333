pub mod error;
pub mod geometry;
pub mod protocol;
pub mod trail;

pub use error::TrailError;
pub use geometry::{Point, Rect, Size};
pub use protocol::{AnalyticsEvent, AnalyticsEventType, PlaybackState, StepErrorKind};
pub use trail::{AdvanceTrigger, Placement, Step, StepAction, Trail};
