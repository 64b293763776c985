//! HTML pages: upload form, data preview and the option chain with charts.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::NaiveDate;
use optchain_core::{Dte, MAX_STRIKE_STEPS, minute_label};
use optchain_service::{BatchReport, ChainView, ChartData, Compare, DayView, ServiceError};

use crate::AppState;
use crate::api_error::ApiError;
use crate::handlers::upload::{batch_status, read_upload_form};
use crate::query_types::{ChainParams, ChainQuery, PreviewQuery};
use crate::render::charts::{comparison_figure, price_figure, straddle_figure, to_script_json};
use crate::render::tables::{chain_table, index_table, options_table, pagination};
use crate::render::{PLOTLY_JS, alert, escape, layout};

/// An [`ApiError`] rendered as an HTML page with the same status.
#[derive(Debug)]
pub struct PageError(ApiError);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let message = escape(&self.0.into_public_message());
        let body = format!(
            r#"{}<a class="btn btn-outline-secondary" href="/">Back to upload</a>"#,
            alert("danger", &format!("<strong>{}</strong><br>{message}", status.as_u16()))
        );
        (status, Html(layout("Error", "", &[], &body))).into_response()
    }
}

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<ServiceError> for PageError {
    fn from(err: ServiceError) -> Self {
        Self(err.into())
    }
}

fn upload_page(banner: Option<&str>) -> String {
    let body = format!(
        r#"<h1 class="h3 mb-4">Upload CSV data</h1>
{banner}
<form method="post" action="/" enctype="multipart/form-data" class="card card-body">
<div class="mb-3">
<span class="form-label d-block">Dataset</span>
<div class="form-check form-check-inline"><input class="form-check-input" type="radio" name="upload_type" id="type-index" value="index" checked><label class="form-check-label" for="type-index">Index (datetime_UTC, open)</label></div>
<div class="form-check form-check-inline"><input class="form-check-input" type="radio" name="upload_type" id="type-options" value="options"><label class="form-check-label" for="type-options">Options (UTC_MINUTE, EXPIRY_DATE, STRIKE, OPTION_TYPE, bid_open, ask_open)</label></div>
</div>
<div class="mb-3">
<label class="form-label" for="policy">Malformed rows</label>
<select class="form-select" name="policy" id="policy">
<option value="reject" selected>Reject the whole file</option>
<option value="skip">Skip and report</option>
</select>
</div>
<div class="mb-3">
<label class="form-label" for="file">CSV files</label>
<input class="form-control" type="file" name="file" id="file" accept=".csv" multiple>
</div>
<button type="submit" class="btn btn-primary">Upload</button>
</form>"#,
        banner = banner.unwrap_or_default(),
    );
    layout("Upload", "/", &[], &body)
}

fn upload_banner(batch: &BatchReport) -> String {
    let mut details = Vec::with_capacity(batch.outcomes.len());
    for outcome in &batch.outcomes {
        let line = match &outcome.result {
            Ok(report) => {
                let mut line = format!("\u{2705} {}", escape(&report.summary_line()));
                if report.duplicates_collapsed > 0 {
                    let _ = write!(line, ", {} duplicate keys collapsed", report.duplicates_collapsed);
                }
                for issue in &report.issues {
                    let _ = write!(line, "<br>&nbsp;&nbsp;line {}: {}", issue.line, escape(&issue.reason));
                }
                line
            },
            Err(err) => {
                let message = if err.is_transient() {
                    "database unavailable".to_owned()
                } else if err.is_client_error() {
                    err.to_string()
                } else {
                    "processing failed".to_owned()
                };
                format!("\u{274c} {} - {}", escape(&outcome.file_name), escape(&message))
            },
        };
        details.push(line);
    }
    let kind = if batch.failed() == 0 { "success" } else { "danger" };
    alert(
        kind,
        &format!(
            "<strong>Upload Complete!</strong><br>Success: <strong>{}</strong> | Failed: <strong>{}</strong> | Malformed rows: {}<br><br><small>{}</small>",
            batch.succeeded(),
            batch.failed(),
            batch.policy.as_str(),
            details.join("<br>"),
        ),
    )
}

pub async fn home() -> Html<String> {
    Html(upload_page(None))
}

pub async fn home_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(err) => {
            let status = err.status();
            let banner = alert("danger", &escape(&err.into_public_message()));
            return (status, Html(upload_page(Some(&banner))));
        },
    };
    let batch = state.ingest_service.ingest_batch(form.files, form.dataset, form.policy).await;
    (batch_status(&batch), Html(upload_page(Some(&upload_banner(&batch)))))
}

pub async fn view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
) -> Result<Html<String>, PageError> {
    let limit = query.capped_limit();
    let stats = state.admin_service.stats().await?;
    let index = state.admin_service.index_preview(query.offset, limit).await?;
    let options = state.admin_service.options_preview(query.offset, limit).await?;

    let body = format!(
        r#"<h1 class="h3 mb-3">Stored data</h1>
<p class="text-muted">{index_rows} index rows across {days} trading days &middot; {option_rows} option rows</p>
<h2 class="h5">Index data (newest first)</h2>
{index_table}
<h2 class="h5 mt-4">Option data (newest first)</h2>
{options_table}
{pager}"#,
        index_rows = stats.index_rows,
        days = stats.trading_days,
        option_rows = stats.option_rows,
        index_table = index_table(&index.items),
        options_table = options_table(&options.items),
        pager = pagination(query.offset, limit, index.total.max(options.total)),
    );
    Ok(Html(layout("Preview", "/view", &[], &body)))
}

fn chain_form(dates: &[NaiveDate], params: &ChainParams, selected: Option<NaiveDate>, time: &str) -> String {
    let mut date_options = String::new();
    for date in dates {
        let sel = if Some(*date) == selected { " selected" } else { "" };
        let _ = write!(
            date_options,
            r#"<option value="{}"{sel}>{}</option>"#,
            date.format("%Y-%m-%d"),
            date.format("%d %b %Y")
        );
    }
    let mut expiry_options = String::new();
    for dte in Dte::ALL {
        let sel = if dte == params.dte { " selected" } else { "" };
        let _ = write!(expiry_options, r#"<option value="{0}"{sel}>{0}</option>"#, dte.label());
    }
    let mut compare_options = String::new();
    for compare in Compare::ALL {
        let sel = if compare == params.compare { " selected" } else { "" };
        let _ = write!(
            compare_options,
            r#"<option value="{}"{sel}>{}</option>"#,
            compare.as_str(),
            escape(&compare.title())
        );
    }
    format!(
        r#"<form method="get" action="/options_chain" id="chain-form" class="row g-3 align-items-end mb-4">
<div class="col-md-3"><label class="form-label" for="date">Date</label><select class="form-select" name="date" id="date" onchange="this.form.submit()">{date_options}</select></div>
<div class="col-md-2"><label class="form-label" for="expiry">Expiry</label><select class="form-select" name="expiry" id="expiry">{expiry_options}</select></div>
<div class="col-md-2"><label class="form-label" for="steps">Strikes &plusmn;</label><input class="form-control" type="number" name="steps" id="steps" min="0" max="{MAX_STRIKE_STEPS}" value="{steps}"></div>
<div class="col-md-3"><label class="form-label" for="compare">Compare</label><select class="form-select" name="compare" id="compare">{compare_options}</select></div>
<input type="hidden" name="time" id="time-input" value="{time}">
<div class="col-md-2"><button type="submit" class="btn btn-primary w-100">Show</button></div>
</form>"#,
        steps = params.steps.min(MAX_STRIKE_STEPS),
        time = escape(time),
    )
}

fn time_slider(day: &DayView) -> String {
    if day.session.is_empty() {
        return r#"<p class="text-muted">No index minutes inside the 13:30&ndash;20:15 UTC session.</p>"#.to_owned();
    }
    let minutes: Vec<String> = day.session.iter().map(|bar| minute_label(bar.ts)).collect();
    let current = minutes.get(day.slider_index).cloned().unwrap_or_default();
    let minutes_json = serde_json::to_string(&minutes).unwrap_or_else(|_| "[]".to_owned());
    format!(
        r#"<div class="mb-4">
<label class="form-label" for="time-slider">Time (UTC): <strong id="time-label">{current}</strong></label>
<input type="range" class="form-range" id="time-slider" min="0" max="{max}" value="{value}">
</div>
<script>
(function () {{
  const minutes = {minutes_json};
  const slider = document.getElementById('time-slider');
  const label = document.getElementById('time-label');
  slider.addEventListener('input', function () {{ label.textContent = minutes[slider.value]; }});
  slider.addEventListener('change', function () {{
    document.getElementById('time-input').value = minutes[slider.value];
    document.getElementById('chain-form').submit();
  }});
}})();
</script>"#,
        max = minutes.len().saturating_sub(1),
        value = day.slider_index,
        current = escape(&current),
    )
}

fn charts_section(data: &ChartData, compare: Compare) -> String {
    if data.session.is_empty() {
        return String::new();
    }
    let figures = [
        ("price-chart", price_figure(data)),
        ("straddle-chart", straddle_figure(data)),
        ("comparison-chart", comparison_figure(data, compare)),
    ];
    let mut out = String::new();
    for (id, figure) in &figures {
        let _ = write!(
            out,
            r#"<div class="card card-body mb-4"><div id="{id}"></div></div>
<script>(function () {{ const fig = {json}; Plotly.newPlot('{id}', fig.data, fig.layout, {{responsive: true}}); }})();</script>
"#,
            json = to_script_json(figure),
        );
    }
    out
}

fn chain_page(form: &str, content: &str) -> Html<String> {
    let body = format!(r#"<h1 class="h3 mb-4">Options chain</h1>{form}{content}"#);
    Html(layout("Options Chain", "/options_chain", &[PLOTLY_JS], &body))
}

pub async fn options_chain(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChainQuery>,
) -> Result<Html<String>, PageError> {
    let params = query.validate()?;
    let query_service = &state.query_service;
    let dates = query_service.available_dates().await?;
    let selected = params.date.or_else(|| dates.first().copied());
    let requested_time = params.time.clone().unwrap_or_default();

    let Some(date) = selected.filter(|d| dates.contains(d)) else {
        let form = chain_form(&dates, &params, selected, &requested_time);
        let message = if dates.is_empty() {
            "No data uploaded yet."
        } else {
            "No index data found for this date."
        };
        return Ok(chain_page(&form, &format!(r#"<p class="text-danger">{message}</p>"#)));
    };

    let day = query_service.day_view(date, params.time.as_deref()).await?;
    let chain: ChainView = query_service.chain_for(&day, params.dte, params.steps).await?;
    let charts = query_service.charts_for(&day).await?;

    let time = day.selected.map(minute_label).unwrap_or_default();
    let form = chain_form(&dates, &params, Some(date), &time);
    let content = format!(
        r#"{slider}<div class="card card-body mb-4">{table}</div>{charts}"#,
        slider = time_slider(&day),
        table = chain_table(&chain),
        charts = charts_section(&charts, params.compare),
    );
    Ok(chain_page(&form, &content))
}
