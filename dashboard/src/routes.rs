use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use maud::{Markup, html};
use resample::{ResampleConfig, ResampleResult, ServerAggregates, samples_from_value};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::charts::{self, svg};
use crate::dashboard_config::{ChartPreset, ChartType};
use crate::state::AppState;
use crate::styles::Charts as ChartClass;
use crate::views;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(views::index))
        .route("/styles.css", get(views::styles))
        .route("/presets", get(presets))
        .route("/resample", post(resample_series))
        .route("/chart", post(chart))
        .with_state(state)
}

/// Body shared by `/resample` and `/chart`.
///
/// `preset` names a configured chart; fields set in `config` override it.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ResampleBody {
    samples: Value,
    config: Option<ResampleConfig>,
    preset: Option<String>,
    chart_type: Option<ChartType>,
    #[serde(flatten)]
    server: ServerAggregates,
}

impl ResampleBody {
    fn resolve<'a>(
        &self,
        state: &'a AppState,
    ) -> Result<(ResampleConfig, Option<&'a ChartPreset>), StatusCode> {
        let preset = match self.preset.as_deref() {
            Some(name) => Some(state.presets.preset(name).ok_or_else(|| {
                warn!(preset = name, "unknown chart preset");
                StatusCode::NOT_FOUND
            })?),
            None => None,
        };
        let config = match (self.config.clone(), preset) {
            (Some(config), Some(preset)) => config.or(&preset.config),
            (Some(config), None) => config,
            (None, Some(preset)) => preset.config.clone(),
            (None, None) => ResampleConfig::default(),
        };
        Ok((config, preset))
    }

    fn run(&self, config: &ResampleConfig) -> ResampleResult {
        let samples = samples_from_value(&self.samples);
        let result = resample::resample(&samples, config, Some(&self.server));
        if result.skipped > 0 {
            debug!(
                skipped = result.skipped,
                total = samples.len(),
                "samples without a bucket"
            );
        }
        result
    }
}

pub async fn presets(State(state): State<Arc<AppState>>) -> Json<Vec<ChartPreset>> {
    Json(state.presets.charts.clone())
}

pub async fn resample_series(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResampleBody>,
) -> Result<Json<ResampleResult>, StatusCode> {
    let (config, _) = body.resolve(&state)?;
    Ok(Json(body.run(&config)))
}

pub async fn chart(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResampleBody>,
) -> Result<Markup, StatusCode> {
    let (config, preset) = body.resolve(&state)?;
    let result = body.run(&config);

    let chart_type = body
        .chart_type
        .or(preset.map(|p| p.chart_type))
        .unwrap_or_default();
    let title = preset
        .and_then(|p| p.title.clone())
        .unwrap_or_else(|| charts::default_title(&config.normalize()));

    let points = charts::points(&result);
    let svg = match chart_type {
        ChartType::Bar => svg::render_bar_chart(&points, &title),
        ChartType::Line => svg::render_line_chart(&points, &title),
    };
    Ok(html! {
        div.(ChartClass::CHART_CONTAINER) { (svg) }
    })
}
