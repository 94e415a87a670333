pub mod schema;

pub use schema::{AnalyticsConfig, LayoutConfig, PlaybackConfig, SimilarityWeights, TrailConfig};
