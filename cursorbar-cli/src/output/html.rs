//! Standalone HTML detail page.

use chrono::Local;
use cursorbar_core::{UsageBucket, UsageRecord, UsageRenderer};
use maud::{DOCTYPE, Markup, PreEscaped, html};

use super::{INFINITY, format_bucket, format_percent, format_reset, format_timestamp};

const STYLE: &str = "\
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;margin:2rem;\
color:#ddd;background:#1e1e1e}\
h1{font-size:1.3rem;margin-bottom:1.5rem}\
.bucket{margin-bottom:1.25rem}\
.label{display:flex;justify-content:space-between;margin-bottom:.35rem}\
.bar{height:10px;border-radius:5px;background:#3a3a3a;overflow:hidden}\
.fill{height:100%;background:#4caf50}\
.fill.notice{background:#2196f3}\
.fill.warning{background:#ff9800}\
.meta{color:#999;font-size:.9rem;line-height:1.6}\
.error{color:#f44336}";

/// Self-contained page, no external assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    fn page(body: &Markup) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { "Cursor Usage" }
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    h1 { "Cursor Usage" }
                    (body)
                }
            }
        }
    }

    fn bucket(label: &str, bucket: &UsageBucket) -> Markup {
        let unbounded = bucket.is_unbounded();
        let pct = if unbounded { 0.0 } else { bucket.percentage() };
        let summary = if unbounded {
            format!("{} / {INFINITY}", bucket.used())
        } else {
            format_bucket(bucket)
        };

        html! {
            div.bucket {
                div.label {
                    span { (label) }
                    span { (summary) }
                }
                div.bar {
                    div.fill.notice[pct > 75.0 && pct <= 90.0].warning[pct > 90.0]
                        style={ "width:" (format_percent(pct)) } {}
                }
            }
        }
    }
}

impl UsageRenderer for HtmlRenderer {
    fn render(&self, record: &UsageRecord) -> String {
        let body = html! {
            (Self::bucket("Premium requests", record.premium()))
            (Self::bucket("Unlimited requests", record.unlimited()))
            div.meta {
                div { "Resets: " (format_reset(record, Local::now().date_naive())) }
                div { "Last updated: " (format_timestamp(record.last_updated())) }
                div { "Source: " (record.source().description()) }
            }
        };
        Self::page(&body).into_string()
    }

    fn render_error(&self, message: &str) -> String {
        let body = html! {
            p.error { "Failed to fetch usage: " (message) }
        };
        Self::page(&body).into_string()
    }
}
