use crate::dashboard_config::DashboardConfig;

/// Read-only after startup; every request resamples from scratch.
pub struct AppState {
    pub presets: DashboardConfig,
}

impl AppState {
    pub fn new(presets: DashboardConfig) -> Self {
        AppState { presets }
    }
}
