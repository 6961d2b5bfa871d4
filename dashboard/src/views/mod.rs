use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use maud::{DOCTYPE, Markup, html};

use crate::state::AppState;
use crate::styles::{self, Charts as ChartClass};

pub fn page_shell(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                link rel="stylesheet" href="/styles.css";
            }
            body {
                main { (content) }
            }
        }
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Markup {
    let charts = &state.presets.charts;
    let content = html! {
        h1 { "> chart presets" }
        @if charts.is_empty() {
            p { "No presets configured." }
        } @else {
            table.(ChartClass::PRESET_TABLE) {
                tr { th { "name" } th { "type" } th { "config" } }
                @for preset in charts {
                    tr {
                        td { (preset.name) }
                        td { (preset.chart_type.display_name()) }
                        td.(ChartClass::PRESET_CONFIG) {
                            (serde_json::to_string(&preset.config).unwrap_or_default())
                        }
                    }
                }
            }
        }
        p {
            "POST samples to " code { "/resample" } " for JSON or " code { "/chart" } " for SVG."
        }
    };
    page_shell("Charts | Dashboard", content)
}

pub async fn styles() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], styles::ALL.as_str())
}
