// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard page: effort and athlete counts over time for one segment.
//!
//! Rendered server-side from the full table; the charts are drawn by Plotly
//! from data embedded in the page.

use crate::config::Lang;
use crate::models::{group_by_segment, SegmentSeries};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(dashboard))
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    lang: Option<String>,
    /// Parsed leniently; anything but a segment id selects the first one.
    segment: Option<String>,
}

/// UI strings per language.
struct Texts {
    html_lang: &'static str,
    heading: &'static str,
    history: &'static str,
    select: &'static str,
    efforts: &'static str,
    athletes: &'static str,
    last_sample: &'static str,
    samples: &'static str,
    empty: &'static str,
    load_failed: &'static str,
    switch_label: &'static str,
}

fn texts(lang: Lang) -> &'static Texts {
    static DE: Texts = Texts {
        html_lang: "de",
        heading: "Strava Multi-Segment Tracker",
        history: "Verlauf je Segment",
        select: "Segment auswählen",
        efforts: "Effort Count",
        athletes: "Athlete Count",
        last_sample: "Letzte Messung",
        samples: "Messungen",
        empty: "Noch keine Daten vorhanden.",
        load_failed: "Daten konnten nicht geladen werden.",
        switch_label: "English",
    };
    static EN: Texts = Texts {
        html_lang: "en",
        heading: "Strava Multi-Segment Tracker",
        history: "History per segment",
        select: "Select segment",
        efforts: "Effort count",
        athletes: "Athlete count",
        last_sample: "Last observation",
        samples: "samples",
        empty: "No data yet.",
        load_failed: "Could not load data.",
        switch_label: "Deutsch",
    };
    match lang {
        Lang::De => &DE,
        Lang::En => &EN,
    }
}

/// Render the dashboard.
async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> (StatusCode, Html<String>) {
    let lang = query
        .lang
        .as_deref()
        .and_then(|l| l.parse().ok())
        .unwrap_or(state.config.dashboard_lang);

    match state.store.load_all().await {
        Ok(observations) => {
            let series = group_by_segment(&observations);
            let selected = query.segment.as_deref().and_then(|s| s.trim().parse().ok());
            let page = render_dashboard(lang, &series, selected);
            (StatusCode::OK, Html(page))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load observations for dashboard");
            let t = texts(lang);
            let body = format!(r#"<p class="notice error">{}</p>"#, t.load_failed);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(page_shell(lang, None, &body, "")),
            )
        }
    }
}

/// Render the page body for the grouped table.
///
/// `selected` falls back to the first segment when absent or unknown.
pub fn render_dashboard(lang: Lang, series: &[SegmentSeries], selected: Option<u64>) -> String {
    let t = texts(lang);

    let current = match selected
        .and_then(|id| series.iter().find(|s| s.entity_id == id))
        .or_else(|| series.first())
    {
        Some(current) => current,
        None => {
            let body = format!(r#"<p class="notice">{}</p>"#, t.empty);
            return page_shell(lang, None, &body, "");
        }
    };

    let options: String = series
        .iter()
        .map(|s| {
            format!(
                r#"<option value="{id}"{sel}>{name}</option>"#,
                id = s.entity_id,
                sel = if s.entity_id == current.entity_id {
                    " selected"
                } else {
                    ""
                },
                name = escape_html(&s.entity_name),
            )
        })
        .collect();

    let last = current.points.last();
    let latest = last
        .map(|p| {
            format!(
                "{}: {} · {} {} · {} {} · {} {}",
                t.last_sample,
                escape_html(&p.observed_at),
                t.efforts,
                p.effort_count,
                t.athletes,
                p.athlete_count,
                current.points.len(),
                t.samples
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h2>{history}</h2>
<form method="get">
  <input type="hidden" name="lang" value="{lang}">
  <label>{select}
    <select name="segment" onchange="this.form.submit()">{options}</select>
  </label>
</form>
<p class="latest">{latest}</p>
<div class="charts">
  <section><h3>{efforts}</h3><div id="efforts" class="chart"></div></section>
  <section><h3>{athletes}</h3><div id="athletes" class="chart"></div></section>
</div>"#,
        history = t.history,
        lang = t.html_lang,
        select = t.select,
        options = options,
        latest = latest,
        efforts = t.efforts,
        athletes = t.athletes,
    );

    page_shell(lang, Some(current.entity_id), &body, &chart_script(current))
}

/// Plotly calls with the series embedded as JSON.
fn chart_script(series: &SegmentSeries) -> String {
    let x: Vec<&str> = series.points.iter().map(|p| p.observed_at.as_str()).collect();
    let efforts: Vec<u64> = series.points.iter().map(|p| p.effort_count).collect();
    let athletes: Vec<u64> = series.points.iter().map(|p| p.athlete_count).collect();

    let data = serde_json::json!({ "x": x, "efforts": efforts, "athletes": athletes });
    // "</" would end the script element early.
    let data = data.to_string().replace("</", "<\\/");

    format!(
        r#"<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<script>
const d = {data};
const layout = {{ margin: {{ t: 10, r: 10 }}, xaxis: {{ type: "date" }} }};
Plotly.newPlot("efforts", [{{ x: d.x, y: d.efforts, mode: "lines+markers" }}], layout, {{ responsive: true }});
Plotly.newPlot("athletes", [{{ x: d.x, y: d.athletes, mode: "lines+markers" }}], layout, {{ responsive: true }});
</script>"#
    )
}

fn page_shell(lang: Lang, segment: Option<u64>, body: &str, scripts: &str) -> String {
    let t = texts(lang);
    let other = match lang {
        Lang::De => "en",
        Lang::En => "de",
    };
    let switch_href = match segment {
        Some(id) => format!("?lang={}&amp;segment={}", other, id),
        None => format!("?lang={}", other),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{html_lang}">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{heading}</title>
  <style>
    body {{ font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1100px; padding: 24px; color: #222; }}
    header {{ display: flex; justify-content: space-between; align-items: baseline; }}
    .charts {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 24px; }}
    .chart {{ height: 360px; }}
    .notice {{ background: #eef4fb; border-left: 4px solid #4a90d9; padding: 12px 16px; }}
    .notice.error {{ background: #fdecea; border-color: #d9534f; }}
    .latest {{ color: #555; }}
  </style>
</head>
<body>
<header>
  <h1>{heading}</h1>
  <a href="{switch_href}">{switch_label}</a>
</header>
{body}
{scripts}
</body>
</html>
"#,
        html_lang = t.html_lang,
        heading = t.heading,
        switch_href = switch_href,
        switch_label = t.switch_label,
        body = body,
        scripts = scripts,
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
