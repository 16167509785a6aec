use crate::error::{CheckinError, Result};
use crate::models::AccountSnapshot;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static REMAINING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"剩余流量\s*([0-9.]+\s*(?:GB|MB|TB))").unwrap());

static DATETIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").unwrap());

// The chart data sits in an inline script, sometimes inside an escaped JSON string.
static HISTORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\\"series\\":\[([\d.,]+)\]|"series":\[([\d.,]+)\]"#).unwrap()
});

const EXPIRY_MARKER: &str = "到期";

/// Parses the user-center page into an [`AccountSnapshot`].
///
/// A page without the `#check-in` control is an error: the control going
/// missing usually means the layout changed or the session was lost.
pub fn parse_user_center(html: &str) -> Result<AccountSnapshot> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("#check-in").unwrap();

    let button = document
        .select(&selector)
        .next()
        .ok_or_else(|| CheckinError::ElementNotFound("Check-in button #check-in".to_string()))?;

    let checkin_label = button
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let text = page_text(html);
    let (remaining, expire) = extract_remaining_and_expire(&text);

    Ok(AccountSnapshot {
        checkin_label,
        remaining,
        expire,
        history: extract_traffic_history(html),
    })
}

/// Visible text of the page body, one text node per line.
///
/// Script and style contents are left out.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").unwrap();
    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()));
            if matches!(parent, Some("script" | "style" | "noscript")) {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Finds the remaining quota and the plan expiry in the page text.
///
/// The expiry is the first timestamp on (or right after) the line labelled
/// `到期`; without such a label the latest timestamp on the page is used.
pub fn extract_remaining_and_expire(text: &str) -> (Option<String>, Option<String>) {
    let remaining = REMAINING_RE
        .captures(text)
        .and_then(|c| c.get(1))
        // Number and unit may sit in separate text nodes, i.e. on separate lines.
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "));

    let lines: Vec<&str> = text.lines().collect();
    let labelled = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(EXPIRY_MARKER))
        .find_map(|(i, line)| {
            DATETIME_RE
                .find(line)
                .or_else(|| lines.get(i + 1).and_then(|next| DATETIME_RE.find(next)))
                .map(|m| m.as_str().to_string())
        });

    // Fixed-width timestamps order lexicographically.
    let expire = labelled.or_else(|| {
        DATETIME_RE
            .find_iter(text)
            .map(|m| m.as_str())
            .max()
            .map(str::to_string)
    });

    (remaining, expire)
}

/// Extracts the traffic-history series (`"series":[...]`) from the raw page source.
pub fn extract_traffic_history(html: &str) -> Option<String> {
    let captures = HISTORY_RE.captures(html)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
}

/// Last value of a comma-separated history series, in GB.
///
/// A series ending in an empty element (`"1.25,"`) has no last value.
pub fn last_used_from_history(history: &str) -> Option<f64> {
    let history = history.trim();
    if history.is_empty() || history == crate::models::MISSING {
        return None;
    }
    history.split(',').next_back()?.trim().parse::<f64>().ok()
}
