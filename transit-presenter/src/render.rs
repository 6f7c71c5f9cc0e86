//! HTML renderers for optimization results

use crate::results::{TripResponse, WorkResponse, WorkSchedule};
use crate::tabs::Tab;
use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::Value;

const NOT_AVAILABLE: &str = "N/A";

/// The results panel's content area
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsContainer {
    html: String,
}

impl ResultsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Replace the content wholesale
    pub fn replace(&mut self, html: String) {
        self.html = html;
    }
}

/// Decode a response body for `tab` and render it into `container`
pub fn render_for(
    tab: Tab,
    body: &Value,
    container: &mut ResultsContainer,
) -> Result<(), serde_json::Error> {
    match tab {
        Tab::OptimizeTrip => {
            let data: TripResponse = serde_json::from_value(body.clone())?;
            render_trip_results(&data, container);
        }
        Tab::OptimizeWork => {
            let data: WorkResponse = serde_json::from_value(body.clone())?;
            render_work_results(&data, container);
        }
    }
    Ok(())
}

/// Short local date and time for an ISO-like timestamp, `N/A` when absent.
/// Strings that are not timestamps are shown as given.
pub fn format_time(iso: Option<&str>) -> String {
    let Some(iso) = iso.filter(|s| !s.is_empty()) else {
        return NOT_AVAILABLE.to_string();
    };

    match parse_timestamp(iso) {
        Some(dt) => dt.format("%-m/%-d/%y, %-I:%M %p").to_string(),
        None => escape_html(iso),
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn text_or_na(value: Option<&str>) -> String {
    match value.filter(|s| !s.is_empty()) {
        Some(s) => escape_html(s),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn minutes(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) => format!("{}", (s / 60.0).round() as i64),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn prop(label: &str, value: &str) -> String {
    format!(
        r#"<div class="prop"><span class="prop-label">{}</span><span class="prop-value">{}</span></div>"#,
        label, value
    )
}

pub fn render_trip_results(data: &TripResponse, container: &mut ResultsContainer) {
    let results = match data.results.as_deref() {
        Some(results) if !results.is_empty() => results,
        _ => {
            container.replace("<p>No routes found within this window.</p>".to_string());
            return;
        }
    };

    let mut html = String::new();

    if let Some(best) = data.best_departure.as_deref().filter(|s| !s.is_empty()) {
        let arrival = results
            .iter()
            .find(|r| r.departure_time.as_deref() == Some(best))
            .and_then(|r| r.arrival_text.as_deref());

        html.push_str(r#"<div class="result-item best-result">"#);
        html.push_str("<h4>⭐ Shortest Travel Time</h4>");
        html.push_str(&prop("Departure", &format_time(Some(best))));
        html.push_str(&prop("Arrival", &text_or_na(arrival)));
        html.push_str(&prop(
            "Duration",
            &format!("{} mins", minutes(data.min_duration_seconds)),
        ));
        html.push_str(&prop("Route", &text_or_na(data.best_route_summary.as_deref())));
        html.push_str("</div>\n<h4>All Options Checked:</h4>\n");
    }

    for item in results {
        html.push_str(r#"<div class="result-item">"#);
        html.push_str(&prop("Departure", &format_time(item.departure_time.as_deref())));
        html.push_str(&prop("Arrival", &text_or_na(item.arrival_text.as_deref())));
        html.push_str(&prop("Duration", &text_or_na(item.duration_text.as_deref())));
        html.push_str(&prop("Route", &text_or_na(item.route_summary.as_deref())));
        html.push_str("</div>\n");
    }

    container.replace(html);
}

pub fn render_work_results(data: &WorkResponse, container: &mut ResultsContainer) {
    let results = match data.results.as_deref() {
        Some(results) if !results.is_empty() => results,
        _ => {
            container.replace("<p>No viable schedules found.</p>".to_string());
            return;
        }
    };

    let mut html = String::new();

    if let Some(best) = &data.best_schedule {
        html.push_str(&best_schedule_card(best));
        html.push_str("<h4>All Options (Sorted by Time):</h4>\n");
    }

    for item in results {
        html.push_str(r#"<div class="result-item">"#);
        html.push_str(&prop("Origin", &text_or_na(item.origin.as_deref())));
        html.push_str(&prop(
            "Schedule",
            &format!(
                "{} ➝ {}",
                format_time(item.departure_to_work.as_deref()),
                format_time(item.leave_work_time.as_deref())
            ),
        ));
        html.push_str(&prop(
            "Total Commute",
            &text_or_na(item.total_commute_text.as_deref()),
        ));
        html.push_str("</div>\n");
    }

    container.replace(html);
}

fn best_schedule_card(best: &WorkSchedule) -> String {
    let mut html = String::from(r#"<div class="result-item best-result">"#);
    html.push_str(&format!(
        "<h4>⭐ Shortest Commute (Total: {})</h4>",
        text_or_na(best.total_commute_text.as_deref())
    ));
    html.push_str(&prop("Origin", &text_or_na(best.origin.as_deref())));
    html.push_str(&prop("Leave Home", &format_time(best.departure_to_work.as_deref())));
    html.push_str(&prop(
        "Arrive Work",
        &format!(
            "~{} mins ({})",
            minutes(best.duration_to_work),
            text_or_na(best.route_to_work.as_deref())
        ),
    ));
    html.push_str(&prop("Leave Work", &format_time(best.leave_work_time.as_deref())));
    html.push_str(&prop(
        "Arrive Home",
        &format!(
            "~{} mins ({})",
            minutes(best.duration_to_home),
            text_or_na(best.route_to_home.as_deref())
        ),
    ));
    html.push_str("</div>\n");
    html
}
