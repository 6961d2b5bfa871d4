mod global {
    turf::style_sheet!("assets/global.css");
}

mod charts {
    turf::style_sheet!("assets/charts.css");
}

pub use charts::ClassName as Charts;

use std::sync::LazyLock;

pub static ALL: LazyLock<String> =
    LazyLock::new(|| [global::STYLE_SHEET, charts::STYLE_SHEET].join("\n"));
