//! Store page parser for extracting user tags
//!
//! Tags are listed on an entity's store page as `.app_tag_control` elements
//! carrying the tag id in `data-tagid`, with the display name in a nested
//! `.app_tag` element. Page order is the tag's rank.

use crate::model::TagRef;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Parses store page HTML and extracts tags in page order
///
/// Elements with a missing or non-numeric `data-tagid` are skipped, as are
/// repeated ids (the first occurrence keeps its rank). A page without a tag
/// section yields an empty list.
///
/// # Example
///
/// ```
/// use catalog_ingest::source::parse_store_tags;
///
/// let html = r#"<div class="app_tag_control" data-tagid="19"><a class="app_tag">Action</a></div>"#;
/// let tags = parse_store_tags(html);
/// assert_eq!(tags[0].id, 19);
/// assert_eq!(tags[0].name, "Action");
/// assert_eq!(tags[0].order, 0);
/// ```
pub fn parse_store_tags(html: &str) -> Vec<TagRef> {
    let document = Html::parse_document(html);

    let Ok(control_selector) = Selector::parse(".app_tag_control[data-tagid]") else {
        return Vec::new();
    };
    let name_selector = Selector::parse(".app_tag").ok();

    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for element in document.select(&control_selector) {
        let Some(id) = element
            .value()
            .attr("data-tagid")
            .and_then(|raw| raw.trim().parse::<i64>().ok())
        else {
            continue;
        };

        if !seen.insert(id) {
            continue;
        }

        let name = extract_tag_name(element, name_selector.as_ref());
        if name.is_empty() {
            continue;
        }

        tags.push(TagRef::new(id, name, tags.len() as u32));
    }

    tags
}

/// Reads the tag name, preferring the nested `.app_tag` element
fn extract_tag_name(element: ElementRef<'_>, name_selector: Option<&Selector>) -> String {
    let text: String = name_selector
        .and_then(|selector| element.select(selector).next())
        .map(|name| name.text().collect())
        .unwrap_or_else(|| element.text().collect());

    text.replace('\'', "").trim().to_string()
}
