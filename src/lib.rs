pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod janitor;
pub mod lookup;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod rate_limit;
pub mod router;
pub mod state;
pub mod upstream;

pub use error::LookupError;
pub use lookup::LookupService;
pub use models::NormalizedProfile;
