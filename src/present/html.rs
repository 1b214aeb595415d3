//! HTML listing of the retained window.

use super::{escape_html, FeedMeta};
use crate::source::Item;

/// Render the page served at `/`.
///
/// Items appear in snapshot order, so the most recent post is last.
pub fn render_page(items: &[Item], meta: &FeedMeta) -> String {
    let title = escape_html(&meta.title);
    let mut buf = String::new();

    buf.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    buf.push_str("<meta charset=\"utf-8\">\n");
    buf.push_str(&format!("<title>{title}</title>\n"));
    buf.push_str(&format!(
        "<link rel=\"alternate\" type=\"application/atom+xml\" title=\"{title}\" href=\"atom.xml\">\n"
    ));
    buf.push_str("</head>\n<body>\n");
    buf.push_str(&format!("<h1>{title}</h1>\n"));

    if items.is_empty() {
        buf.push_str("<p>No posts yet.</p>\n");
    }
    for item in items {
        buf.push_str(&render_item(item));
    }

    buf.push_str("</body>\n</html>\n");
    buf
}

fn render_item(item: &Item) -> String {
    format!(
        "<article>\n<h2>{} @{}</h2>\n<p>{}</p>\n<small><a href=\"{}\">{}</a></small>\n</article>\n",
        escape_html(&item.author_display_name),
        escape_html(&item.author_handle),
        escape_html(&item.body),
        escape_html(&item.permalink()),
        escape_html(&item.created_at),
    )
}
