//! Plotly figure JSON for the price, ATM straddle and comparison charts.

use optchain_core::{Dte, minute_label};
use optchain_service::{ChartData, Compare, StraddleSeries};
use serde::Serialize;

const HOUR_TICKS: [&str; 8] =
    ["13:00", "14:00", "15:00", "16:00", "17:00", "18:00", "19:00", "20:00"];

const PRICE_COLOR: &str = "#0066ff";
const STRADDLE_COLORS: [&str; 3] = ["#ea170c", "#2e21e0", "#2edb2e"];
const COMPARE_COLORS: [&str; 3] = ["#d83813", "#1934cd", "#52ff33"];

const STRADDLE_HOVER: &str = "<b>Time:</b> %{x}<br><b>Straddle:</b> $%{y:.2f}<br>\
    <b>Underlying:</b> $%{customdata[0]:.2f}<br><b>Strike:</b> %{customdata[1]}<extra></extra>";

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub name: String,
    pub x: Vec<String>,
    /// `null` entries render as gaps.
    pub y: Vec<Option<f64>>,
    pub line: Line,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Vec<(f64, Option<f64>)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: &'static str,
    pub width: u32,
    pub shape: &'static str,
    pub smoothing: f64,
}

impl Line {
    fn spline(color: &'static str, width: u32) -> Self {
        Self { color, width, shape: "spline", smoothing: 1.3 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<&'static str>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub orientation: &'static str,
    pub yanchor: &'static str,
    pub y: f64,
    pub xanchor: &'static str,
    pub x: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub height: u32,
    pub hovermode: &'static str,
    pub showlegend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    pub plot_bgcolor: &'static str,
}

impl Layout {
    fn new(title: String, y_title: &str, height: u32, legend: bool) -> Self {
        Self {
            title: Title { text: title },
            xaxis: Axis {
                title: Title { text: "Time (UTC)".to_owned() },
                tickmode: Some("array"),
                tickvals: Some(HOUR_TICKS.to_vec()),
            },
            yaxis: Axis { title: Title { text: y_title.to_owned() }, tickmode: None, tickvals: None },
            height,
            hovermode: "x unified",
            showlegend: legend,
            legend: legend.then_some(Legend {
                orientation: "h",
                yanchor: "bottom",
                y: 1.02,
                xanchor: "right",
                x: 1.0,
            }),
            plot_bgcolor: "white",
        }
    }
}

fn dte_index(dte: Dte) -> usize {
    Dte::ALL.iter().position(|d| *d == dte).unwrap_or(0)
}

fn chart_date(data: &ChartData) -> String {
    data.date.format("%d %b %Y").to_string()
}

fn labels(data: &ChartData) -> Vec<String> {
    data.session.iter().map(|bar| minute_label(bar.ts)).collect()
}

fn straddle_trace(series: &StraddleSeries, x: Vec<String>, color: &'static str, width: u32) -> Trace {
    Trace {
        kind: "scatter",
        mode: "lines",
        name: format!("{} ATM Straddle", series.dte.label()),
        x,
        y: series.points.iter().map(|p| p.price).collect(),
        line: Line::spline(color, width),
        visible: None,
        customdata: Some(series.points.iter().map(|p| (p.underlying, p.strike)).collect()),
        hovertemplate: Some(STRADDLE_HOVER),
    }
}

/// Index open over the session.
pub fn price_figure(data: &ChartData) -> Figure {
    let trace = Trace {
        kind: "scatter",
        mode: "lines",
        name: "SPY Price".to_owned(),
        x: labels(data),
        y: data.session.iter().map(|bar| Some(bar.open)).collect(),
        line: Line::spline(PRICE_COLOR, 3),
        visible: None,
        customdata: None,
        hovertemplate: None,
    };
    Figure {
        data: vec![trace],
        layout: Layout::new(
            format!("SPY Price \u{2013} {} (13:30\u{2013}20:15 UTC)", chart_date(data)),
            "Price ($)",
            600,
            false,
        ),
    }
}

/// One trace per DTE; only 0DTE is visible until toggled in the legend.
pub fn straddle_figure(data: &ChartData) -> Figure {
    let x = labels(data);
    let traces = data
        .straddles
        .iter()
        .map(|series| {
            let mut trace =
                straddle_trace(series, x.clone(), STRADDLE_COLORS[dte_index(series.dte)], 3);
            trace.visible = Some(series.dte == Dte::Zero);
            trace
        })
        .collect();
    Figure {
        data: traces,
        layout: Layout::new(
            format!("ATM Straddle Mid Price \u{2013} {}", chart_date(data)),
            "Price ($)",
            650,
            true,
        ),
    }
}

pub fn comparison_figure(data: &ChartData, compare: Compare) -> Figure {
    let x = labels(data);
    let traces = compare
        .dtes()
        .iter()
        .filter_map(|dte| data.series(*dte))
        .map(|series| straddle_trace(series, x.clone(), COMPARE_COLORS[dte_index(series.dte)], 4))
        .collect();
    Figure {
        data: traces,
        layout: Layout::new(
            format!("ATM Straddle Comparison ({}) \u{2013} {}", compare.title(), chart_date(data)),
            "Straddle Price ($)",
            680,
            true,
        ),
    }
}

/// Serialize for embedding inside a `<script>` element.
pub fn to_script_json(figure: &Figure) -> String {
    serde_json::to_string(figure).map_or_else(|_| "null".to_owned(), |json| json.replace("</", "<\\/"))
}
