use std::{sync::Arc, time::Duration};

use greenlight_dal::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner { app_config, pool }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
}

pub struct AppConfig {
    /// Deployment environment name, reported by the healthcheck.
    pub env: String,
    pub version: String,
    pub query_timeout: Duration,
    pub default_page_size: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: "development".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            query_timeout: greenlight_dal::DEFAULT_QUERY_TIMEOUT,
            default_page_size: 20,
        }
    }
}
