//! Track metadata record and its DIDL-Lite rendering.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, error};

use crate::document::{Document, Element};

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// Known DIDL-Lite element names a renderer fills in.
///
/// [`TrackMetadata`] accepts any key, these are the ones read back by
/// [`TrackMetadata::parse_xml`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKey {
    Title,
    Artist,
    Album,
    Genre,
    Creator,
    Date,
    TrackNumber,
    AlbumArtUri,
    Class,
}

impl TagKey {
    pub const ALL: [TagKey; 9] = [
        TagKey::Title,
        TagKey::Artist,
        TagKey::Album,
        TagKey::Genre,
        TagKey::Creator,
        TagKey::Date,
        TagKey::TrackNumber,
        TagKey::AlbumArtUri,
        TagKey::Class,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagKey::Title => "dc:title",
            TagKey::Artist => "upnp:artist",
            TagKey::Album => "upnp:album",
            TagKey::Genre => "upnp:genre",
            TagKey::Creator => "dc:creator",
            TagKey::Date => "dc:date",
            TagKey::TrackNumber => "upnp:originalTrackNumber",
            TagKey::AlbumArtUri => "upnp:albumArtURI",
            TagKey::Class => "upnp:class",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl AsRef<str> for TagKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// One named metadata field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    key: String,
    value: String,
}

impl Tag {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Metadata of the track currently handled by the renderer.
///
/// Tags keep their insertion order, which is the order new elements are
/// appended to a DIDL-Lite `item`. Keys are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    id: u32,
    tags: Vec<Tag>,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackMetadata {
    /// Creates an empty record with the next process-wide id.
    pub fn new() -> Self {
        Self::with_id(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn with_id(id: u32) -> Self {
        Self {
            id,
            tags: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The `item@id` value written whenever the document changes.
    pub fn xml_id(&self) -> String {
        format!("gmr-{:08x}", self.id)
    }

    /// Sets a tag, replacing the value of an existing key in place.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        let key = key.as_ref();
        let value = value.into();
        match self.tags.iter_mut().find(|tag| tag.key == key) {
            Some(tag) => tag.value = value,
            None => self.tags.push(Tag {
                key: key.to_string(),
                value,
            }),
        }
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }

    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<String> {
        let key = key.as_ref();
        let index = self.tags.iter().position(|tag| tag.key == key)?;
        Some(self.tags.remove(index).value)
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Renders the record as DIDL-Lite, updating `prior_xml` when it already
    /// has a `DIDL-Lite > item` shape.
    ///
    /// Only elements whose text differs are rewritten, and `item@id` is
    /// refreshed only when something changed, so feeding the result back
    /// with the same tags returns the same string. Empty values are never
    /// written. Unusable input (empty, malformed, foreign) is replaced by a
    /// fresh document; this method never fails.
    pub fn to_xml(&self, prior_xml: &str) -> String {
        let mut document = adopt(prior_xml);

        if let Some(item) = document.didl_item_mut() {
            if self.merge_into(item) {
                item.set_attribute("id", self.xml_id());
            }
        }

        match document.to_xml_string() {
            Ok(xml) => xml,
            Err(e) => {
                error!(error = %e, "Failed to serialize DIDL-Lite metadata");
                String::new()
            }
        }
    }

    /// Applies the non-empty tags to `item`, returning whether anything changed.
    fn merge_into(&self, item: &mut Element) -> bool {
        let mut modified = false;

        for tag in self.tags.iter().filter(|tag| !tag.value.is_empty()) {
            match item.child_mut(&tag.key) {
                Some(element) if element.text() == tag.value => {}
                Some(element) => {
                    element.set_text(tag.value.as_str());
                    modified = true;
                }
                None => {
                    let mut element = Element::new(tag.key.as_str());
                    element.set_text(tag.value.as_str());
                    item.push_child(element);
                    modified = true;
                }
            }
        }

        modified
    }

    /// Loads the known tags from a DIDL-Lite document.
    ///
    /// Returns `false` and leaves the record untouched when `xml` is not a
    /// readable `DIDL-Lite > item` document. Otherwise the record is reset to
    /// the non-empty known elements of the first `item`. Prefix-less element
    /// names (`<title>`) are accepted as well.
    pub fn parse_xml(&mut self, xml: &str) -> bool {
        let document = match Document::parse(xml) {
            Ok(document) => document,
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable DIDL-Lite metadata");
                return false;
            }
        };

        let Some(item) = document.didl_item() else {
            debug!("Ignoring metadata without DIDL-Lite item");
            return false;
        };

        self.tags.clear();
        for key in TagKey::ALL {
            let element = item
                .child(key.as_str())
                .or_else(|| item.child_by_local_name(key.as_str()));
            if let Some(element) = element {
                let text = element.text();
                if !text.is_empty() {
                    self.set(key, text);
                }
            }
        }

        true
    }
}

fn adopt(prior_xml: &str) -> Document {
    match Document::parse(prior_xml) {
        Ok(document) if document.didl_item().is_some() => document,
        Ok(_) => {
            debug!("Prior metadata has no DIDL-Lite item, rebuilding");
            Document::didl_skeleton()
        }
        Err(e) => {
            debug!(error = %e, "Prior metadata is not valid XML, rebuilding");
            Document::didl_skeleton()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_keys_unique_and_ordered() {
        let mut metadata = TrackMetadata::with_id(7);
        metadata.set(TagKey::Title, "One");
        metadata.set(TagKey::Artist, "Band");
        metadata.set(TagKey::Title, "Two");

        let keys: Vec<&str> = metadata.tags().map(Tag::key).collect();
        assert_eq!(keys, vec!["dc:title", "upnp:artist"]);
        assert_eq!(metadata.get(TagKey::Title), Some("Two"));
    }

    #[test]
    fn test_remove() {
        let mut metadata = TrackMetadata::with_id(1);
        metadata.set("title", "Song");
        assert_eq!(metadata.remove("title"), Some("Song".to_string()));
        assert_eq!(metadata.remove("title"), None);
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_new_ids_increase() {
        let first = TrackMetadata::new();
        let second = TrackMetadata::new();
        assert!(second.id() > first.id());
    }

    #[test]
    fn test_xml_id_is_zero_padded_lowercase_hex() {
        assert_eq!(TrackMetadata::with_id(1).xml_id(), "gmr-00000001");
        assert_eq!(TrackMetadata::with_id(0xABCDEF).xml_id(), "gmr-00abcdef");
        assert_eq!(TrackMetadata::with_id(u32::MAX).xml_id(), "gmr-ffffffff");
    }

    #[test]
    fn test_tag_key_names() {
        for key in TagKey::ALL {
            assert_eq!(TagKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(TagKey::from_name("title"), None);
    }

    #[test]
    fn test_parse_xml_reads_known_tags() {
        let xml = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"
                   xmlns:dc="http://purl.org/dc/elements/1.1/"
                   xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
            <item id="1" parentID="0">
                <upnp:artist>Artist</upnp:artist>
                <dc:title>Test Song</dc:title>
                <upnp:album></upnp:album>
                <res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/song.mp3</res>
            </item>
        </DIDL-Lite>"#;

        let mut metadata = TrackMetadata::with_id(3);
        metadata.set("stale", "value");
        assert!(metadata.parse_xml(xml));

        let tags: Vec<(&str, &str)> = metadata.tags().map(|t| (t.key(), t.value())).collect();
        assert_eq!(
            tags,
            vec![("dc:title", "Test Song"), ("upnp:artist", "Artist")]
        );
        assert_eq!(metadata.id(), 3);
    }

    #[test]
    fn test_parse_xml_without_namespaces() {
        let xml = r#"<DIDL-Lite><item id="1" parentID="0"><title>Lax</title></item></DIDL-Lite>"#;
        let mut metadata = TrackMetadata::with_id(1);
        assert!(metadata.parse_xml(xml));
        assert_eq!(metadata.get(TagKey::Title), Some("Lax"));
    }

    #[test]
    fn test_parse_xml_rejects_foreign_documents() {
        let mut metadata = TrackMetadata::with_id(1);
        metadata.set(TagKey::Title, "Keep");

        assert!(!metadata.parse_xml(""));
        assert!(!metadata.parse_xml("<DIDL-Lite><item>"));
        assert!(!metadata.parse_xml("<rss><item><title>x</title></item></rss>"));
        assert_eq!(metadata.get(TagKey::Title), Some("Keep"));
    }
}
