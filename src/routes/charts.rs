use std::str::FromStr;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Dataset, Reading, SharedState};

// ---

pub fn router() -> Router<SharedState> {
    // ---
    Router::new().route("/api/charts", get(handler))
}

/// Window of recent data shown on the charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    OneHour,
    SixHours,
    #[default]
    Day,
    Week,
}

impl TimeRange {
    pub fn span(self) -> TimeDelta {
        match self {
            TimeRange::OneHour => TimeDelta::hours(1),
            TimeRange::SixHours => TimeDelta::hours(6),
            TimeRange::Day => TimeDelta::days(1),
            TimeRange::Week => TimeDelta::days(7),
        }
    }

    /// Earliest timestamp inside the window ending at `now`.
    pub fn start(self, now: NaiveDateTime) -> NaiveDateTime {
        now.checked_sub_signed(self.span()).unwrap_or(NaiveDateTime::MIN)
    }
}

/// Parses `1H`, `6H`, `24H`, `7D`. Any other value selects the week view.
impl FromStr for TimeRange {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "1H" => TimeRange::OneHour,
            "6H" => TimeRange::SixHours,
            "24H" => TimeRange::Day,
            _ => TimeRange::Week,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartsQuery {
    range: Option<String>,
}

pub(crate) fn parse_range(raw: Option<&str>) -> TimeRange {
    raw.map(|r| r.parse().unwrap_or_default()).unwrap_or_default()
}

/// Plotly-shaped figure. Serializes to `{}` when there is nothing to plot.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Figure {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Trace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Trace {
    pub x: Vec<NaiveDateTime>,
    pub y: Vec<f64>,
    pub name: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Axis {
    pub title: Title,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub yaxis2: Axis,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartsResponse {
    pub quality: Figure,
    pub flow: Figure,
}

async fn handler(
    Query(params): Query<ChartsQuery>,
    State(state): State<SharedState>,
) -> Json<ChartsResponse> {
    // ---
    let range = parse_range(params.range.as_deref());
    let dataset = state.snapshot().await.dataset;
    debug!("GET /api/charts - range {:?}", range);

    let charts = match dataset {
        Some(dataset) => build_charts(&dataset, range, Local::now().naive_local()),
        None => ChartsResponse::default(),
    };
    Json(charts)
}

/// Build the water quality and flow figures for readings within `range`
/// of `now`.
pub(crate) fn build_charts(dataset: &Dataset, range: TimeRange, now: NaiveDateTime) -> ChartsResponse {
    // ---
    let window = dataset.since(range.start(now));
    if window.is_empty() {
        return ChartsResponse::default();
    }

    ChartsResponse {
        quality: dual_axis_figure(
            window,
            "Water Quality Metrics",
            ("pH", "pH", |r| r.ph),
            ("TDS", "TDS (ppm)", |r| r.tds),
        ),
        flow: dual_axis_figure(
            window,
            "Flow and Depth Metrics",
            ("Flow", "Flow Rate", |r| r.flow),
            ("Depth", "Depth (ft)", |r| r.depth),
        ),
    }
}

type Series = (&'static str, &'static str, fn(&Reading) -> f64);

fn dual_axis_figure(readings: &[Reading], title: &str, primary: Series, secondary: Series) -> Figure {
    // ---
    let trace = |(name, _, get): Series, yaxis: Option<&str>| Trace {
        x: readings.iter().map(|r| r.timestamp).collect(),
        y: readings.iter().map(get).collect(),
        name: name.to_string(),
        mode: "lines+markers".to_string(),
        kind: "scatter".to_string(),
        yaxis: yaxis.map(String::from),
    };
    let axis = |text: &str| Axis {
        title: Title { text: text.to_string() },
        overlaying: None,
        side: None,
    };

    Figure {
        data: vec![trace(primary, None), trace(secondary, Some("y2"))],
        layout: Some(Layout {
            title: Title { text: title.to_string() },
            xaxis: axis("Time"),
            yaxis: axis(primary.1),
            yaxis2: Axis {
                overlaying: Some("y".to_string()),
                side: Some("right".to_string()),
                ..axis(secondary.1)
            },
        }),
    }
}
