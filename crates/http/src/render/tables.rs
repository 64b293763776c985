//! Preview and option chain tables.

use std::fmt::Write as _;

use optchain_core::{IndexRow, OptionRow, minute_label};
use optchain_service::ChainView;

use super::{escape, number_cell, price_cell};

const TABLE_CLASS: &str = "table table-striped table-bordered table-sm";

fn header_row(out: &mut String, columns: &[&str]) {
    out.push_str("<thead><tr>");
    for col in columns {
        let _ = write!(out, "<th>{}</th>", escape(col));
    }
    out.push_str("</tr></thead>");
}

fn cells(out: &mut String, values: &[String]) {
    out.push_str("<tr>");
    for value in values {
        let _ = write!(out, "<td>{}</td>", escape(value));
    }
    out.push_str("</tr>");
}

fn ts_cell(row_ts: chrono::NaiveDateTime) -> String {
    row_ts.format("%Y-%m-%d %H:%M").to_string()
}

pub fn index_table(rows: &[IndexRow]) -> String {
    if rows.is_empty() {
        return "<p>No index data yet.</p>".to_owned();
    }
    let mut out = format!(r#"<table class="{TABLE_CLASS}">"#);
    header_row(&mut out, &["datetime_UTC", "open", "high", "low", "close", "volume"]);
    out.push_str("<tbody>");
    for row in rows {
        cells(
            &mut out,
            &[
                ts_cell(row.ts),
                row.open.to_string(),
                number_cell(row.high),
                number_cell(row.low),
                number_cell(row.close),
                number_cell(row.volume),
            ],
        );
    }
    out.push_str("</tbody></table>");
    out
}

pub fn options_table(rows: &[OptionRow]) -> String {
    if rows.is_empty() {
        return "<p>No option data yet.</p>".to_owned();
    }
    let mut out = format!(r#"<div class="table-responsive"><table class="{TABLE_CLASS}">"#);
    header_row(
        &mut out,
        &[
            "UTC_MINUTE", "EXPIRY_DATE", "STRIKE", "OPTION_TYPE", "bid_open", "ask_open",
            "bid_close", "ask_close", "volume", "open_interest", "iv", "delta", "gamma", "theta",
            "vega",
        ],
    );
    out.push_str("<tbody>");
    for row in rows {
        cells(
            &mut out,
            &[
                ts_cell(row.ts),
                row.expiry.to_string(),
                row.strike.to_string(),
                row.option_type.as_str().to_owned(),
                row.bid_open.to_string(),
                row.ask_open.to_string(),
                number_cell(row.bid_close),
                number_cell(row.ask_close),
                number_cell(row.volume),
                number_cell(row.open_interest),
                number_cell(row.iv),
                number_cell(row.delta),
                number_cell(row.gamma),
                number_cell(row.theta),
                number_cell(row.vega),
            ],
        );
    }
    out.push_str("</tbody></table></div>");
    out
}

/// Previous/next links for the preview page.
pub fn pagination(offset: usize, limit: usize, total: u64) -> String {
    let total = usize::try_from(total).unwrap_or(usize::MAX);
    let mut out = String::from(r#"<nav><ul class="pagination">"#);
    if offset > 0 {
        let prev = offset.saturating_sub(limit);
        let _ = write!(
            out,
            r#"<li class="page-item"><a class="page-link" href="/view?offset={prev}&amp;limit={limit}">Newer</a></li>"#
        );
    }
    if offset.saturating_add(limit) < total {
        let next = offset.saturating_add(limit);
        let _ = write!(
            out,
            r#"<li class="page-item"><a class="page-link" href="/view?offset={next}&amp;limit={limit}">Older</a></li>"#
        );
    }
    out.push_str("</ul></nav>");
    out
}

/// Header with ATM strike and open price, then the strike grid with the ATM
/// row highlighted.
pub fn chain_table(chain: &ChainView) -> String {
    let (Some(atm), Some(open), Some(ts)) = (chain.atm_strike, chain.open_price, chain.selected)
    else {
        return r#"<p class="text-center text-muted py-5 lead">Select a date and time to view the option chain.</p>"#
            .to_owned();
    };
    let expiry_display = format!("{} ({})", chain.expiry, chain.dte.label());
    let mut out = format!(
        r#"<div class="text-center mb-4">
<h4 class="text-primary fw-bold">ATM Strike: {atm}</h4>
<p class="text-muted">Open Price: <strong>{open:.2}</strong><br>
Time: <strong>{time}</strong> | Expiry: <strong>{expiry}</strong> | &plusmn;{steps} strikes</p>
</div>"#,
        time = minute_label(ts),
        expiry = escape(&expiry_display),
        steps = chain.steps,
    );
    if chain.quotes_found == 0 {
        out.push_str(r#"<p class="text-center lead text-muted">No options found for this minute</p>"#);
        return out;
    }

    out.push_str(r#"<table class="table table-sm table-hover text-center w-75 mx-auto">"#);
    header_row(&mut out, &["Call_Bid", "Call_Ask", "STRIKE", "Put_Bid", "Put_Ask"]);
    out.push_str("<tbody>");
    for row in &chain.rows {
        let class = if row.is_atm { r#" class="table-warning fw-bold""# } else { "" };
        let _ = write!(
            out,
            "<tr{class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            dash(price_cell(row.call_bid)),
            dash(price_cell(row.call_ask)),
            row.strike,
            dash(price_cell(row.put_bid)),
            dash(price_cell(row.put_ask)),
        );
    }
    out.push_str("</tbody></table>");
    out
}

fn dash(cell: String) -> String {
    if cell.is_empty() { "\u{2014}".to_owned() } else { cell }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use optchain_core::Dte;
    use optchain_service::ChainRow;

    use super::*;

    fn chain(quotes_found: usize) -> ChainView {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let row = |strike: f64, is_atm: bool, bid: Option<f64>| ChainRow {
            strike,
            call_bid: bid,
            call_ask: bid.map(|b| b + 0.25),
            put_bid: None,
            put_ask: None,
            is_atm,
        };
        ChainView {
            date,
            selected: date.and_hms_opt(14, 5, 0),
            dte: Dte::Zero,
            expiry: date,
            open_price: Some(420.5),
            atm_strike: Some(420.0),
            atm_listed: true,
            steps: 1,
            quotes_found,
            rows: vec![row(419.0, false, None), row(420.0, true, Some(1.5)), row(421.0, false, None)],
        }
    }

    #[test]
    fn chain_table_highlights_atm_and_dashes_gaps() {
        let html = chain_table(&chain(2));
        assert!(html.contains("ATM Strike: 420"));
        assert!(html.contains("Open Price: <strong>420.50</strong>"));
        assert!(html.contains("Time: <strong>14:05</strong>"));
        assert!(html.contains(r#"<tr class="table-warning fw-bold"><td>1.50</td><td>1.75</td><td>420</td>"#));
        assert!(html.contains("<td>\u{2014}</td>"));
    }

    #[test]
    fn chain_without_quotes_says_so() {
        let html = chain_table(&chain(0));
        assert!(html.contains("No options found for this minute"));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn pagination_links_only_where_rows_exist() {
        assert!(!pagination(0, 10, 5).contains("Older"));
        let middle = pagination(10, 10, 35);
        assert!(middle.contains("offset=0&amp;limit=10"));
        assert!(middle.contains("offset=20&amp;limit=10"));
    }

    #[test]
    fn empty_tables_show_placeholders() {
        assert_eq!(index_table(&[]), "<p>No index data yet.</p>");
        assert!(options_table(&[]).contains("No option data"));
    }
}
