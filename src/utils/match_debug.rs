// src/utils/match_debug.rs
use std::fs;
use std::path::Path;

use crate::extractors::shipment::{
    ShipmentExtractor, TagSpan, DELIVERY_TAG, LINE_TAG, PRODUCT_TAG, SERIALS_TAG, SERIAL_NUMBER_TAG,
};
use crate::utils::error::StorageError;

fn escape_html(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

fn css_class(tag: &str) -> &'static str {
    match tag {
        LINE_TAG => "highlight-line",
        SERIALS_TAG => "highlight-serials",
        DELIVERY_TAG => "highlight-delivery",
        PRODUCT_TAG => "highlight-product",
        SERIAL_NUMBER_TAG => "highlight-serial",
        _ => "highlight-custom",
    }
}

/// Renders the document as an HTML page with each tag span highlighted.
pub fn render_debug_html(content: &str, spans: &[TagSpan]) -> String {
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    debug_html.push_str("pre { white-space: pre-wrap; }\n");
    debug_html.push_str(".highlight-line { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-serials { background-color: #FFA500; }\n");
    debug_html.push_str(".highlight-delivery { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-product { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-serial { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n<pre>");

    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|s| s.start);

    let mut last_pos = 0;
    for span in sorted {
        // Overlapping or out-of-range spans are skipped rather than duplicated.
        if span.start < last_pos || span.end > content.len() || span.start > span.end {
            continue;
        }

        escape_html(&content[last_pos..span.start], &mut debug_html);
        debug_html.push_str(&format!(
            "<span class=\"{}\" title=\"Position: {}-{}, Tag: {}\">",
            css_class(span.tag),
            span.start,
            span.end,
            span.tag
        ));
        escape_html(&content[span.start..span.end], &mut debug_html);
        debug_html.push_str("</span>");

        last_pos = span.end;
    }

    escape_html(&content[last_pos..], &mut debug_html);
    debug_html.push_str("</pre>\n</body>\n</html>");
    debug_html
}

/// Writes an annotated copy of the document showing where the known tags matched.
pub fn create_debug_html<P: AsRef<Path>>(content: &str, destination: P) -> Result<(), StorageError> {
    let destination = destination.as_ref();
    let spans = ShipmentExtractor::match_spans(content);
    let html = render_debug_html(content, &spans);

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::destination(destination, e))?;
    }
    fs::write(destination, html).map_err(|e| StorageError::destination(destination, e))?;

    tracing::info!("Saved debug HTML with {} tag matches to {}", spans.len(), destination.display());
    Ok(())
}
