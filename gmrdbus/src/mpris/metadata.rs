use std::collections::HashMap;

use gmrdidl::{TagKey, TrackMetadata};
use tracing::warn;
use zbus::zvariant::{ObjectPath, OwnedValue, Value};

/// `mpris:trackid` of the empty metadata map.
pub const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";
const TRACK_BASE_PATH: &str = "/com/hzeller/gmedia_resurrect/track";

/// Object path identifying `metadata` as an MPRIS track.
pub fn track_id(metadata: &TrackMetadata) -> ObjectPath<'static> {
    if metadata.is_empty() {
        return ObjectPath::from_static_str_unchecked(NO_TRACK);
    }
    let path = format!("{}/{}", TRACK_BASE_PATH, metadata.xml_id().replace('-', "_"));
    ObjectPath::try_from(path).unwrap_or_else(|_| ObjectPath::from_static_str_unchecked(NO_TRACK))
}

/// Builds the MPRIS `Metadata` map of a track.
pub fn mpris_metadata(metadata: &TrackMetadata) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();

    insert(&mut map, "mpris:trackid", Value::from(track_id(metadata)));

    if let Some(title) = metadata.get(TagKey::Title) {
        insert(&mut map, "xesam:title", Value::from(title.to_string()));
    }
    if let Some(artist) = metadata.get(TagKey::Artist) {
        insert(&mut map, "xesam:artist", Value::from(vec![artist.to_string()]));
    }
    if let Some(album) = metadata.get(TagKey::Album) {
        insert(&mut map, "xesam:album", Value::from(album.to_string()));
    }
    if let Some(genre) = metadata.get(TagKey::Genre) {
        insert(&mut map, "xesam:genre", Value::from(vec![genre.to_string()]));
    }
    if let Some(creator) = metadata.get(TagKey::Creator) {
        insert(&mut map, "xesam:composer", Value::from(vec![creator.to_string()]));
    }
    if let Some(date) = metadata.get(TagKey::Date) {
        insert(&mut map, "xesam:contentCreated", Value::from(date.to_string()));
    }
    if let Some(number) = metadata
        .get(TagKey::TrackNumber)
        .and_then(|n| n.trim().parse::<i32>().ok())
    {
        insert(&mut map, "xesam:trackNumber", Value::from(number));
    }
    if let Some(art) = metadata.get(TagKey::AlbumArtUri) {
        insert(&mut map, "mpris:artUrl", Value::from(art.to_string()));
    }

    map
}

fn insert(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    match OwnedValue::try_from(value) {
        Ok(value) => {
            map.insert(key.to_string(), value);
        }
        Err(e) => warn!(key, "Skipping MPRIS metadata entry: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<'a>(map: &'a HashMap<String, OwnedValue>, key: &str) -> &'a Value<'static> {
        &map[key]
    }

    #[test]
    fn test_empty_metadata_is_no_track() {
        let map = mpris_metadata(&TrackMetadata::with_id(1));
        assert_eq!(map.len(), 1);
        assert_eq!(
            entry(&map, "mpris:trackid"),
            &Value::from(ObjectPath::from_static_str_unchecked(NO_TRACK))
        );
    }

    #[test]
    fn test_metadata_fields() {
        let mut metadata = TrackMetadata::with_id(0x2a);
        metadata.set(TagKey::Title, "Song");
        metadata.set(TagKey::Artist, "Band");
        metadata.set(TagKey::Album, "Record");
        metadata.set(TagKey::TrackNumber, "7");
        metadata.set(TagKey::AlbumArtUri, "http://host/cover.jpg");
        metadata.set("upnp:class", "object.item.audioItem.musicTrack");

        let map = mpris_metadata(&metadata);

        assert_eq!(
            track_id(&metadata).as_str(),
            "/com/hzeller/gmedia_resurrect/track/gmr_0000002a"
        );
        assert_eq!(entry(&map, "xesam:title"), &Value::from("Song"));
        assert_eq!(entry(&map, "xesam:album"), &Value::from("Record"));
        assert_eq!(
            entry(&map, "mpris:artUrl"),
            &Value::from("http://host/cover.jpg")
        );
        assert_eq!(
            entry(&map, "xesam:artist"),
            &Value::from(vec!["Band".to_string()])
        );
        assert_eq!(entry(&map, "xesam:trackNumber"), &Value::from(7i32));
        assert!(!map.contains_key("xesam:genre"));
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn test_unreadable_track_number_is_skipped() {
        let mut metadata = TrackMetadata::with_id(3);
        metadata.set(TagKey::TrackNumber, "A1");
        assert!(!mpris_metadata(&metadata).contains_key("xesam:trackNumber"));
    }
}
