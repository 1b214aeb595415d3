//! Atom 1.0 rendering of the retained window.
//!
//! Built with [`atom_syndication`], which takes care of XML escaping.  Each
//! entry is dated from the item's own timestamp; when that doesn't parse the
//! collection's last-modified time is used instead and the fallback is
//! counted in [`RenderStats`].

use atom_syndication::{Content, Entry, Feed, FixedDateTime, Link, Person, Text};
use chrono::{DateTime, Utc};

use super::{parse_created_at, FeedMeta, RenderStats};
use crate::source::Item;

/// Media type served with the rendered document.
pub const CONTENT_TYPE: &str = "application/atom+xml";

/// Render the document served at `/atom.xml`.
pub fn render_feed(
    items: &[Item],
    last_modified: DateTime<Utc>,
    meta: &FeedMeta,
    stats: &RenderStats,
) -> String {
    let fallback: FixedDateTime = last_modified.fixed_offset();

    let mut feed = Feed::default();
    feed.set_title(Text::plain(meta.title.as_str()));
    feed.set_id(meta.link.as_str());
    feed.set_updated(fallback);
    feed.set_links(vec![link(&meta.link)]);
    if !meta.description.is_empty() {
        feed.set_subtitle(Text::plain(meta.description.as_str()));
    }
    if !meta.author_name.is_empty() {
        let mut author = Person::default();
        author.set_name(meta.author_name.as_str());
        author.set_email((!meta.author_email.is_empty()).then(|| meta.author_email.clone()));
        feed.set_authors(vec![author]);
    }

    let entries: Vec<Entry> = items
        .iter()
        .map(|item| render_entry(item, fallback, stats))
        .collect();
    feed.set_entries(entries);

    feed.to_string()
}

fn render_entry(item: &Item, fallback: FixedDateTime, stats: &RenderStats) -> Entry {
    let created = match parse_created_at(&item.created_at) {
        Some(ts) => ts,
        None => {
            stats.record_timestamp_fallback();
            tracing::debug!(
                id = %item.id,
                created_at = %item.created_at,
                "unparseable timestamp, using last-modified"
            );
            fallback
        }
    };

    let permalink = item.permalink();

    let mut author = Person::default();
    author.set_name(item.author_display_name.as_str());
    author.set_uri(Some(item.profile_url()));

    let mut content = Content::default();
    content.set_content_type(Some("text".to_string()));
    content.set_value(Some(item.body.clone()));

    let mut entry = Entry::default();
    entry.set_title(Text::plain(format!(
        "{} (@{}) {}",
        item.author_display_name, item.author_handle, item.created_at
    )));
    entry.set_id(permalink.as_str());
    entry.set_updated(created);
    entry.set_published(Some(created));
    entry.set_links(vec![link(&permalink)]);
    entry.set_authors(vec![author]);
    entry.set_content(Some(content));
    entry
}

fn link(href: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}
