use std::sync::Arc;

use crate::lookup::LookupService;

// app's shared state
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<LookupService>,
    // honour x-real-ip / x-forwarded-for when keying the rate limiter
    pub trust_proxy_headers: bool,
}
