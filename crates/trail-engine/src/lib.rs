pub mod analytics;
pub mod config;
pub mod driver;
pub mod engine;
pub mod keyboard;
pub mod manager;
pub mod observer;
pub mod progress;
pub mod render;
pub mod session;

pub use analytics::{
    AnalyticsDispatcher, AnalyticsError, AnalyticsSink, AnalyticsTransport, HttpTransport,
    NoopSink, RecordingSink,
};
pub use config::loader::{ConfigError, ConfigLoader};
pub use driver::run_playback;
pub use engine::{PageEvent, TourEngine};
pub use keyboard::{Key, KeyCommand};
pub use manager::TourManager;
pub use observer::{NoopObserver, TourObserver};
pub use progress::{FileProgressStore, MemoryProgressStore, ProgressError, ProgressStore};
