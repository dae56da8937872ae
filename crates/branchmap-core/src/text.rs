//! Text cleanup shared by the HTML extractors.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern is valid"));

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turns an HTML snippet into one line of plain text. Entities are decoded
/// and `<br>` becomes a space before tags are dropped.
pub fn clean_text(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let without_breaks = LINE_BREAK.replace_all(value, " ");
    let fragment = Html::parse_fragment(&without_breaks);
    let text = fragment.root_element().text().collect::<String>();
    collapse_whitespace(&text)
}

/// Text content of a parsed element with whitespace collapsed.
///
/// Unlike [`clean_text`], a `<br>` inside the element adds no separator, so
/// `a<br>b` reads as `ab`.
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
