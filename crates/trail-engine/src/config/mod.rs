pub mod loader;

pub use trail_core::config::schema;
