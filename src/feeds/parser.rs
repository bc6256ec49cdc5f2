//! Feed document parsing: RSS 2.0, RSS 1.0 (RDF) and Atom into [`FeedEntry`].
//!
//! The parser walks `quick-xml` events and only looks at what the pipeline
//! needs. Entries are `<item>` (RSS) or `<entry>` (Atom) elements at any
//! depth; their direct children fill the entry fields:
//!
//! | Field | Elements |
//! |-------|----------|
//! | title | `title` |
//! | link | `link` text (RSS), `link@href` with `rel="alternate"` or no `rel` (Atom) |
//! | published | `pubDate`, `published`, `dc:date`, `issued`, else `updated` |
//! | summary | `description`, `summary` |
//! | content | `content:encoded`, Atom `content` |
//! | image | `image` (child `url`/`link`, `url`/`href` attributes, or text) |
//!
//! `media:content` and `media:thumbnail` are picked up anywhere inside the
//! entry, including inside `media:group`.
//!
//! Element markup nested in a summary or content field (Atom `xhtml`
//! content, unescaped HTML in a description) is kept as markup, so the
//! image and text extractors see the same HTML an escaped field would give.

use crate::error::FeedFetchError;
use crate::models::{ContentBlock, FeedEntry, ImageRef, MediaRef};
use quick_xml::events::{BytesRef, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use tracing::debug;

/// What the text of an open element inside an entry is collected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Title,
    Link,
    Published,
    Updated,
    Summary,
    Content,
    Image,
    ImageUrl,
    ImageLink,
    /// Markup nested inside a text field; its text belongs to the enclosing
    /// field.
    Nested,
    Ignored,
}

#[derive(Default)]
struct EntryBuilder {
    entry: FeedEntry,
    /// Open elements below the entry element, innermost last.
    stack: Vec<(Slot, String)>,
    updated: Option<String>,
}

impl EntryBuilder {
    fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Buffer of the innermost field that is not nested markup.
    fn owner(&mut self) -> Option<&mut (Slot, String)> {
        self.stack.iter_mut().rev().find(|(slot, _)| *slot != Slot::Nested)
    }

    /// Buffer that nested markup is written to, if the enclosing field keeps
    /// markup at all.
    fn markup_buffer(&mut self) -> Option<&mut String> {
        match self.owner() {
            Some((Slot::Summary | Slot::Content, buf)) => Some(buf),
            _ => None,
        }
    }

    fn in_markup(&self) -> bool {
        matches!(self.stack.last(), Some((Slot::Nested, _)))
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let parent = self.stack.last().map(|(slot, _)| *slot);
        let slot = match parent {
            None => self.classify_child(e),
            Some(Slot::Title | Slot::Summary | Slot::Content | Slot::Nested) => {
                if let Some(buf) = self.markup_buffer() {
                    buf.push('<');
                    buf.push_str(&String::from_utf8_lossy(e));
                    buf.push_str(if empty { "/>" } else { ">" });
                }
                Slot::Nested
            }
            Some(Slot::Image) => match e.local_name().as_ref() {
                b"url" => Slot::ImageUrl,
                b"link" => Slot::ImageLink,
                _ => Slot::Ignored,
            },
            Some(_) => {
                self.collect_media(e);
                Slot::Ignored
            }
        };
        self.stack.push((slot, String::new()));
    }

    fn classify_child(&mut self, e: &BytesStart<'_>) -> Slot {
        if is_media(e) {
            self.collect_media(e);
            return Slot::Ignored;
        }
        match e.local_name().as_ref() {
            b"title" => Slot::Title,
            b"link" => match attr(e, b"href") {
                Some(href) => {
                    let rel = attr(e, b"rel");
                    if matches!(rel.as_deref(), None | Some("alternate")) && self.entry.link.is_none() {
                        self.entry.link = Some(href);
                    }
                    Slot::Ignored
                }
                None => Slot::Link,
            },
            b"pubDate" | b"published" | b"date" | b"issued" => Slot::Published,
            b"updated" | b"modified" => Slot::Updated,
            b"description" | b"summary" => Slot::Summary,
            b"encoded" | b"content" => Slot::Content,
            b"image" => {
                let image = self.entry.image.get_or_insert_with(ImageRef::default);
                if image.url.is_none() {
                    image.url = attr(e, b"url");
                }
                if image.href.is_none() {
                    image.href = attr(e, b"href");
                }
                Slot::Image
            }
            _ => Slot::Ignored,
        }
    }

    fn collect_media(&mut self, e: &BytesStart<'_>) {
        if !is_media(e) {
            return;
        }
        let media = MediaRef { url: attr(e, b"url") };
        match e.local_name().as_ref() {
            b"content" => self.entry.media_content.push(media),
            b"thumbnail" => self.entry.media_thumbnail.push(media),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((slot, buf)) = self.owner() {
            if *slot != Slot::Ignored {
                buf.push_str(text);
            }
        }
    }

    /// Entity or character reference. Inside kept markup the reference is
    /// written back as is; elsewhere it is resolved to text.
    fn reference(&mut self, r: &BytesRef<'_>) {
        let name = r
            .decode()
            .map(|n| n.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(r).into_owned());
        if self.in_markup() && self.markup_buffer().is_some() {
            self.text(&format!("&{name};"));
            return;
        }
        let resolved = match r.resolve_char_ref() {
            Ok(Some(c)) => c.to_string(),
            _ => html_entity(&name)
                .map(str::to_string)
                .unwrap_or_else(|| format!("&{name};")),
        };
        self.text(&resolved);
    }

    /// Close the innermost open element; `end` is its name for elements that
    /// had a start tag.
    fn close(&mut self, end: Option<&[u8]>) {
        let Some((slot, buf)) = self.stack.pop() else {
            return;
        };
        if slot == Slot::Nested {
            if let (Some(name), Some(markup)) = (end, self.markup_buffer()) {
                markup.push_str("</");
                markup.push_str(&String::from_utf8_lossy(name));
                markup.push('>');
            }
            return;
        }
        let value = buf.trim().to_string();
        if value.is_empty() {
            return;
        }
        let entry = &mut self.entry;
        match slot {
            Slot::Title => set_once(&mut entry.title, value),
            Slot::Link => set_once(&mut entry.link, value),
            Slot::Published => set_once(&mut entry.published, value),
            Slot::Updated => set_once(&mut self.updated, value),
            Slot::Summary => set_once(&mut entry.summary, value),
            Slot::Content => entry.content.push(ContentBlock { value }),
            Slot::Image => {
                let image = entry.image.get_or_insert_with(ImageRef::default);
                set_once(&mut image.url, value);
            }
            Slot::ImageUrl => {
                set_once(&mut entry.image.get_or_insert_with(ImageRef::default).url, value)
            }
            Slot::ImageLink => {
                set_once(&mut entry.image.get_or_insert_with(ImageRef::default).link, value)
            }
            Slot::Nested | Slot::Ignored => {}
        }
    }

    fn finish(mut self) -> FeedEntry {
        if self.entry.published.is_none() {
            self.entry.published = self.updated.take();
        }
        self.entry
    }
}

fn set_once(field: &mut Option<String>, value: String) {
    if field.is_none() {
        *field = Some(value);
    }
}

fn is_entry(e: &BytesStart<'_>) -> bool {
    matches!(e.local_name().as_ref(), b"item" | b"entry")
}

fn is_media(e: &BytesStart<'_>) -> bool {
    e.name().prefix().is_some_and(|p| p.as_ref() == b"media")
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value_with(html_entity).ok().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

/// HTML entities that feeds routinely leave undeclared.
fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        "nbsp" => "\u{a0}",
        "ndash" => "–",
        "mdash" => "—",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        "hellip" => "…",
        "laquo" => "«",
        "raquo" => "»",
        "eacute" => "é",
        "egrave" => "è",
        "agrave" => "à",
        "ccedil" => "ç",
        _ => return None,
    })
}

fn decode_text(t: &BytesText<'_>) -> String {
    t.xml_content()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(t).into_owned())
}

/// Parse a feed document into its entries, in document order.
///
/// A document that is not well-formed XML is a [`FeedFetchError::Parse`].
/// A well-formed document without entries yields an empty list.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, FeedFetchError> {
    let mut reader = Reader::from_str(xml);

    let mut entries = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                saw_root = true;
                match current.as_mut() {
                    Some(builder) => builder.open(&e, false),
                    None if is_entry(&e) => current = Some(EntryBuilder::default()),
                    None => {}
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                if let Some(builder) = current.as_mut() {
                    builder.open(&e, true);
                    builder.close(None);
                }
            }
            Event::Text(t) => {
                if let Some(builder) = current.as_mut() {
                    builder.text(&decode_text(&t));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(builder) = current.as_mut() {
                    builder.reference(&r);
                }
            }
            Event::CData(c) => {
                if let Some(builder) = current.as_mut() {
                    builder.text(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => {
                if let Some(mut builder) = current.take() {
                    if builder.depth() == 0 {
                        entries.push(builder.finish());
                    } else {
                        let name = e.name();
                        builder.close(Some(name.as_ref()));
                        current = Some(builder);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FeedFetchError::Parse("document has no root element".into()));
    }
    if current.is_some() {
        return Err(FeedFetchError::Parse("document ends inside an entry".into()));
    }
    debug!(entries = entries.len(), "Parsed feed document");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
     xmlns:content="http://purl.org/rss/1.0/modules/content/"
     xmlns:media="http://search.yahoo.com/mrss/"
     xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Channel title</title>
    <link>https://news.example/</link>
    <image><url>https://news.example/logo.png</url></image>
    <item>
      <title>Sensors &amp; gateways</title>
      <link>https://news.example/sensors</link>
      <pubDate>Tue, 06 May 2025 14:30:00 +0000</pubDate>
      <description>&lt;p&gt;Short &lt;b&gt;summary&lt;/b&gt;&lt;/p&gt;</description>
      <content:encoded><![CDATA[<p>Long body <img src="https://cdn.example/inline.jpg"></p>]]></content:encoded>
      <media:content url="https://cdn.example/hero.jpg" medium="image"/>
      <media:group>
        <media:thumbnail url="https://cdn.example/thumb.jpg"/>
        <media:title>Not the entry title</media:title>
      </media:group>
    </item>
    <item>
      <description>No title, no link&nbsp;here</description>
      <dc:date>2025-05-06T10:00:00Z</dc:date>
      <image url="https://cdn.example/attr.png"/>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom channel</title>
  <entry>
    <title type="html">Grid storage update</title>
    <link rel="self" href="https://atom.example/self"/>
    <link rel="alternate" href="https://atom.example/grid"/>
    <updated>2025-05-07T08:00:00Z</updated>
    <summary>Plain summary</summary>
    <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Rich</p> <p>content</p></div></content>
    <author><name>Someone</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_entry_fields() {
        let entries = parse_feed(RSS).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title(), "Sensors & gateways");
        assert_eq!(first.link(), "https://news.example/sensors");
        assert_eq!(first.published(), "Tue, 06 May 2025 14:30:00 +0000");
        assert_eq!(first.summary(), "<p>Short <b>summary</b></p>");
        assert_eq!(
            first.first_content(),
            Some(r#"<p>Long body <img src="https://cdn.example/inline.jpg"></p>"#)
        );
        assert_eq!(
            first.media_content[0].url.as_deref(),
            Some("https://cdn.example/hero.jpg")
        );
        assert_eq!(
            first.media_thumbnail[0].url.as_deref(),
            Some("https://cdn.example/thumb.jpg")
        );
        assert!(first.image.is_none());
    }

    #[test]
    fn test_parse_rss_missing_fields_and_html_entities() {
        let entries = parse_feed(RSS).unwrap();
        let second = &entries[1];
        assert_eq!(second.title(), "untitled");
        assert_eq!(second.link(), "");
        assert_eq!(second.summary(), "No title, no link\u{a0}here");
        assert_eq!(second.published(), "2025-05-06T10:00:00Z");
        assert_eq!(
            second.image.as_ref().and_then(|i| i.url.as_deref()),
            Some("https://cdn.example/attr.png")
        );
    }

    #[test]
    fn test_channel_level_elements_are_not_entries() {
        let entries = parse_feed(RSS).unwrap();
        assert!(entries.iter().all(|e| e.title() != "Channel title"));
    }

    #[test]
    fn test_parse_atom_entry() {
        let entries = parse_feed(ATOM).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.title(), "Grid storage update");
        assert_eq!(entry.link(), "https://atom.example/grid");
        assert_eq!(entry.published(), "2025-05-07T08:00:00Z");
        assert_eq!(entry.summary(), "Plain summary");
        assert_eq!(
            entry.first_content(),
            Some(r#"<div xmlns="http://www.w3.org/1999/xhtml"><p>Rich</p> <p>content</p></div>"#)
        );
    }

    #[test]
    fn test_xhtml_content_keeps_markup() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
            <title>Pictured</title>
            <content type="xhtml"><div><p>Body</p><img src="https://cdn.example/pic.jpg"/></div></content>
        </entry></feed>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(
            entries[0].first_content(),
            Some(r#"<div><p>Body</p><img src="https://cdn.example/pic.jpg"/></div>"#)
        );
    }

    #[test]
    fn test_unescaped_html_description_keeps_markup() {
        let xml = r#"<rss><channel><item>
            <description><p>Hi <img src="https://cdn.example/r.jpg"/></p></description>
        </item></channel></rss>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(
            entries[0].summary(),
            r#"<p>Hi <img src="https://cdn.example/r.jpg"/></p>"#
        );
    }

    #[test]
    fn test_references_inside_markup_stay_escaped() {
        let xml = r#"<rss><channel><item>
            <title>Big <b>news</b> &amp; more</title>
            <description><p>Fish &amp; chips &lt;3</p></description>
        </item></channel></rss>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries[0].title(), "Big news & more");
        assert_eq!(entries[0].summary(), "<p>Fish &amp; chips &lt;3</p>");
    }

    #[test]
    fn test_item_image_child_elements() {
        let xml = r#"<rss><channel><item>
            <title>T</title>
            <image><title>ignored</title><url>https://cdn.example/u.png</url><link>https://cdn.example/l</link></image>
        </item></channel></rss>"#;
        let entries = parse_feed(xml).unwrap();
        let image = entries[0].image.as_ref().unwrap();
        assert_eq!(image.url.as_deref(), Some("https://cdn.example/u.png"));
        assert_eq!(image.link.as_deref(), Some("https://cdn.example/l"));
    }

    #[test]
    fn test_rdf_items() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
            <channel><title>C</title></channel>
            <item><title>One</title><link>https://rdf.example/1</link></item>
            <item><title>Two</title><link>https://rdf.example/2</link></item>
        </rdf:RDF>"#;
        let titles: Vec<_> = parse_feed(xml)
            .unwrap()
            .iter()
            .map(|e| e.title().to_string())
            .collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[test]
    fn test_well_formed_without_entries() {
        assert!(parse_feed("<rss><channel><title>x</title></channel></rss>").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_documents_are_parse_errors() {
        assert!(matches!(
            parse_feed("<rss><channel><item><title>x</channel></rss>"),
            Err(FeedFetchError::Parse(_))
        ));
        assert!(matches!(parse_feed(""), Err(FeedFetchError::Parse(_))));
        assert!(matches!(
            parse_feed("<rss><channel><item><title>x</title>"),
            Err(FeedFetchError::Parse(_))
        ));
    }
}
