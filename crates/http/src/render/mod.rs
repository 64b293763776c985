//! Server-side HTML. Every interpolated value goes through [`escape`].

pub mod charts;
pub mod tables;

use std::fmt::Write as _;

const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";
pub const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Two decimals, empty for missing values.
pub fn price_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

pub fn number_cell<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Bootstrap alert, e.g. `alert("danger", "...")`. `body` must already be escaped.
pub fn alert(kind: &str, body: &str) -> String {
    format!(r#"<div class="alert alert-{kind}" role="alert">{body}</div>"#)
}

/// Full page with navigation. `body` is trusted HTML.
pub fn layout(title: &str, active: &str, scripts: &[&str], body: &str) -> String {
    let mut nav = String::new();
    for (href, label) in [("/", "Upload"), ("/view", "Preview"), ("/options_chain", "Options Chain")] {
        let class = if href == active { "nav-link active" } else { "nav-link" };
        let _ = write!(nav, r#"<li class="nav-item"><a class="{class}" href="{href}">{label}</a></li>"#);
    }
    let mut head_scripts = String::new();
    for src in scripts {
        let _ = write!(head_scripts, r#"<script src="{}"></script>"#, escape(src));
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{BOOTSTRAP_CSS}">
{head_scripts}
</head>
<body class="bg-light">
<nav class="navbar navbar-expand navbar-dark bg-dark mb-4">
<div class="container"><span class="navbar-brand">SPY Options Data</span><ul class="navbar-nav">{nav}</ul></div>
</nav>
<main class="container">
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}
