mod health;
mod metrics;
mod profile;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use profile::{client_key, profile_by_path_handler, profile_by_query_handler};
