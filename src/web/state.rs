use std::sync::Arc;

use crate::auth::AuthManager;
use crate::facade::Platform;

#[derive(Clone)]
pub struct AppState {
    pub platform: Platform,
    pub auth: Arc<AuthManager>,
}

impl AppState {
    pub fn new(platform: Platform, auth: Arc<AuthManager>) -> Self {
        Self { platform, auth }
    }
}
