// src/render.rs
//! HTML rendering of a forecast.
//!
//! `render_section` is pure: same items, window and timestamp give the same
//! markup. Everything user-provided (titles, urls, error text) is escaped.

use anyhow::Result;
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc, Weekday};
use std::fmt::Write as _;

use crate::analyze::Analysis;
use crate::ingest::types::{CandidateItem, Level};

pub const EMPTY_SECTION_TEXT: &str = "No confirmed features yet";

/// Calendar version plus human label a section targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseWindow {
    /// e.g. `2026.11`; empty for sections not tied to a release.
    pub version: String,
    /// e.g. `November 2026`.
    pub label: String,
}

impl ReleaseWindow {
    fn for_month(first_of_month: NaiveDate) -> Self {
        Self {
            version: first_of_month.format("%Y.%-m").to_string(),
            label: first_of_month.format("%B %Y").to_string(),
        }
    }

    pub fn available_now() -> Self {
        Self {
            version: String::new(),
            label: "Installable today".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSchedule {
    pub upcoming: ReleaseWindow,
    pub next: ReleaseWindow,
}

/// Monthly releases ship on the first Wednesday.
pub fn first_wednesday(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Wed, 1)
}

impl ReleaseSchedule {
    /// Upcoming is this month's release until its day has passed, then next month's.
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let this_month = today.with_day(1).unwrap_or(today);
        let released = first_wednesday(today.year(), today.month()).is_some_and(|d| today > d);

        let upcoming = if released {
            this_month + Months::new(1)
        } else {
            this_month
        };
        let next = upcoming + Months::new(1);

        Self {
            upcoming: ReleaseWindow::for_month(upcoming),
            next: ReleaseWindow::for_month(next),
        }
    }
}

pub fn importance_label(level: Level) -> &'static str {
    match level.get() {
        1 => "Minimal",
        2 => "Low",
        3 => "Medium",
        4 => "High",
        _ => "Critical",
    }
}

pub fn likelihood_label(level: Level) -> &'static str {
    match level.get() {
        1 => "Speculative",
        2 => "Possible",
        3 => "Likely",
        4 => "Very likely",
        _ => "Certain",
    }
}

fn esc(s: &str) -> String {
    html_escape::encode_text(s).to_string()
}

fn source_badge(item: &CandidateItem) -> String {
    let name = esc(item.source.display_name());
    match item.url.as_deref().map(str::trim) {
        Some(u) if u.starts_with("https://") || u.starts_with("http://") => format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{name}</a>",
            html_escape::encode_double_quoted_attribute(u)
        ),
        _ => name,
    }
}

/// One `<h3>` section with its list, or the placeholder line when empty.
pub fn render_section(
    title: &str,
    window: &ReleaseWindow,
    generated_at: DateTime<Utc>,
    items: &[CandidateItem],
) -> String {
    let mut out = String::new();
    if window.version.is_empty() {
        let _ = write!(out, "<h3>{}</h3>", esc(title));
    } else {
        let _ = write!(out, "<h3>{} ({})</h3>", esc(title), esc(&window.version));
    }
    let _ = write!(
        out,
        "<p><small>Target: {} · Updated {}</small></p>",
        esc(&window.label),
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    let mut lis = String::new();
    for it in items {
        let t = it.title.trim();
        if t.is_empty() {
            tracing::warn!(source = %it.source, "skipping item with empty title");
            continue;
        }
        let _ = write!(
            lis,
            "<li><b>{}</b> <small>Importance: {} · Likelihood: {} · {}</small></li>",
            esc(t),
            importance_label(it.importance),
            likelihood_label(it.likelihood),
            source_badge(it)
        );
    }

    if lis.is_empty() {
        let _ = write!(out, "<p><i>{EMPTY_SECTION_TEXT}</i></p>");
    } else {
        let _ = write!(out, "<ul>{lis}</ul>");
    }
    out
}

/// Input to a renderer: ranked sections plus the windows they target.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub generated_at: DateTime<Utc>,
    pub schedule: ReleaseSchedule,
    pub upcoming: Vec<CandidateItem>,
    pub next: Vec<CandidateItem>,
    pub catalog: Vec<CandidateItem>,
}

impl Forecast {
    pub fn from_analysis(analysis: Analysis, now: DateTime<Utc>) -> Self {
        Self {
            generated_at: now,
            schedule: ReleaseSchedule::at(now),
            upcoming: analysis.buckets.upcoming,
            next: analysis.buckets.next,
            catalog: analysis.catalog,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.upcoming.len() + self.next.len() + self.catalog.len()
    }
}

pub trait ForecastRenderer: Send + Sync {
    fn render(&self, forecast: &Forecast) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl ForecastRenderer for HtmlRenderer {
    fn render(&self, f: &Forecast) -> Result<String> {
        let mut html = render_section(
            "Upcoming release",
            &f.schedule.upcoming,
            f.generated_at,
            &f.upcoming,
        );
        html.push_str(&render_section(
            "Next release",
            &f.schedule.next,
            f.generated_at,
            &f.next,
        ));
        if !f.catalog.is_empty() {
            html.push_str(&render_section(
                "Community catalog",
                &ReleaseWindow::available_now(),
                f.generated_at,
                &f.catalog,
            ));
        }
        Ok(html)
    }
}

pub fn initializing_html() -> String {
    concat!(
        "<p><b>Initializing feature forecast...</b></p>",
        "<p>First update in progress. This may take 1-2 minutes.</p>",
        "<p><small>If this message persists:</small></p>",
        "<ul>",
        "<li><small>Check the service logs for <code>feature_forecast</code> warnings</small></li>",
        "<li><small>Configure a GitHub token to avoid rate limits</small></li>",
        "</ul>"
    )
    .to_string()
}

pub fn no_data_html() -> String {
    concat!(
        "<p><b>No forecast data available</b></p>",
        "<p>None of the sources returned usable items. Common causes:</p>",
        "<ul>",
        "<li><b>Rate limiting:</b> configure a GitHub token</li>",
        "<li><b>Network issues:</b> check that api.github.com is reachable</li>",
        "<li><b>First run:</b> wait a few minutes and refresh manually</li>",
        "</ul>"
    )
    .to_string()
}

pub fn error_html(message: &str) -> String {
    format!(
        "<p><b>Error loading forecast data</b></p><p>Error: {}</p>\
         <p><small>Check the service logs for details.</small></p>",
        esc(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceKind;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn window_rolls_after_first_wednesday() {
        // 2026-10-07 is the first Wednesday of October.
        let s = ReleaseSchedule::at(at(2026, 10, 7));
        assert_eq!(s.upcoming.version, "2026.10");
        assert_eq!(s.next.version, "2026.11");

        let s = ReleaseSchedule::at(at(2026, 10, 19));
        assert_eq!(s.upcoming.version, "2026.11");
        assert_eq!(s.upcoming.label, "November 2026");
        assert_eq!(s.next.version, "2026.12");
    }

    #[test]
    fn window_crosses_year_boundary() {
        let s = ReleaseSchedule::at(at(2026, 12, 20));
        assert_eq!(s.upcoming.version, "2027.1");
        assert_eq!(s.next.label, "February 2027");
    }

    #[test]
    fn section_escapes_and_tolerates_missing_url() {
        let items = vec![
            CandidateItem::new("<script>x</script>", None, SourceKind::Forum, 2, 1),
            CandidateItem::new(
                "Matter 1.4",
                Some("https://github.com/o/r/pull/1?a=1&b=2".into()),
                SourceKind::TrackerPr,
                4,
                4,
            ),
        ];
        let now = at(2026, 10, 19);
        let html = render_section("Upcoming", &ReleaseSchedule::at(now).upcoming, now, &items);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Community forum</small>"));
        assert!(html.contains("href=\"https://github.com/o/r/pull/1?a=1&amp;b=2\""));
        assert!(html.contains("Importance: High · Likelihood: Very likely"));
    }

    #[test]
    fn empty_section_has_placeholder() {
        let html = render_section("Next", &ReleaseWindow::available_now(), at(2026, 1, 1), &[]);
        assert!(html.contains(EMPTY_SECTION_TEXT));
        assert!(!html.contains("<ul>"));
    }

    #[test]
    fn blank_titles_are_skipped() {
        let items = vec![CandidateItem::new("   ", None, SourceKind::Social, 5, 5)];
        let html = render_section("Next", &ReleaseWindow::available_now(), at(2026, 1, 1), &items);
        assert!(html.contains(EMPTY_SECTION_TEXT));
    }

    #[test]
    fn error_text_is_escaped() {
        assert!(error_html("bad <tag>").contains("bad &lt;tag&gt;"));
    }
}
