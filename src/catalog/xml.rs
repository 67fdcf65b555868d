//! Normalization of BoardGameGeek XML payloads.
//!
//! Parsing is best effort: a document that cannot be read degrades to an
//! empty result and a warning, never an error.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub id: String,
    pub name: String,
}

/// `<items><item id=".."><name value=".."/></item></items>`
#[derive(Debug, Deserialize)]
struct HotItems {
    #[serde(rename = "item", default)]
    items: Vec<HotItem>,
}

#[derive(Debug, Deserialize)]
struct HotItem {
    #[serde(rename = "@id")]
    id: Option<String>,
    name: Option<ValueAttr>,
}

#[derive(Debug, Deserialize)]
struct ValueAttr {
    #[serde(rename = "@value")]
    value: String,
}

/// `<items><item objectid=".."><name sortindex="1">..</name></item></items>`
#[derive(Debug, Deserialize)]
struct CollectionItems {
    #[serde(rename = "item", default)]
    items: Vec<CollectionItem>,
}

#[derive(Debug, Deserialize)]
struct CollectionItem {
    #[serde(rename = "@objectid")]
    object_id: Option<String>,
    name: Option<TextNode>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Parse the hot list, keeping document order.
pub fn parse_hottest(xml: &str) -> Vec<CollectionEntry> {
    let parsed: HotItems = match quick_xml::de::from_str(xml) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse hottest xml");
            return Vec::new();
        }
    };

    parsed
        .items
        .into_iter()
        .filter_map(|item| entry(item.id, item.name.map(|n| n.value)))
        .collect()
}

/// Parse a user's collection (owned or wishlist), keeping document order.
pub fn parse_user_collection(xml: &str) -> Vec<CollectionEntry> {
    let parsed: CollectionItems = match quick_xml::de::from_str(xml) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse collection xml");
            return Vec::new();
        }
    };

    parsed
        .items
        .into_iter()
        .filter_map(|item| entry(item.object_id, item.name.map(|n| n.value)))
        .collect()
}

fn entry(id: Option<String>, name: Option<String>) -> Option<CollectionEntry> {
    match (id, name) {
        (Some(id), Some(name)) if !id.trim().is_empty() && !name.trim().is_empty() => {
            Some(CollectionEntry {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
            })
        }
        (id, name) => {
            tracing::warn!(?id, ?name, "skipping item without id or name");
            None
        }
    }
}

/// Fields pulled out of a `thing` document. Either may be missing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThingFields {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Scan a `thing` document for the first `<image>` and the primary `<name>`.
///
/// Stops early once both are found. A read error keeps whatever was found
/// before it.
pub fn extract_thing_fields(xml: &str) -> ThingFields {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields = ThingFields::default();
    let mut in_image = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"image" => {
                in_image = fields.image.is_none();
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"name" => {
                if fields.name.is_none() {
                    fields.name = primary_name(&e);
                }
            }
            Ok(Event::Text(text)) if in_image => match text.unescape() {
                Ok(value) => set_image(&mut fields, &value),
                Err(e) => tracing::warn!(error = %e, "bad image text in detail xml"),
            },
            Ok(Event::CData(data)) if in_image => {
                set_image(&mut fields, &String::from_utf8_lossy(&data));
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"image" => in_image = false,
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    position = reader.buffer_position(),
                    "malformed detail xml"
                );
                break;
            }
            _ => {}
        }

        if fields.name.is_some() && fields.image.is_some() {
            break;
        }
    }

    fields
}

fn set_image(fields: &mut ThingFields, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        fields.image = Some(value.to_string());
    }
}

fn primary_name(e: &BytesStart<'_>) -> Option<String> {
    let kind = e.try_get_attribute("type").ok().flatten()?;
    if &*kind.value != b"primary" {
        return None;
    }

    let value = e.try_get_attribute("value").ok().flatten()?;
    value
        .unescape_value()
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOT_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
    <item id="224517" rank="1">
        <thumbnail value="https://cf.geekdo-images.com/brass.jpg"/>
        <name value="Brass: Birmingham"/>
        <yearpublished value="2018"/>
    </item>
    <item id="13" rank="2">
        <thumbnail value="https://cf.geekdo-images.com/catan.jpg"/>
        <name value="Catan"/>
        <yearpublished value="1995"/>
    </item>
    <item id="266192" rank="3">
        <name value="Wingspan"/>
    </item>
</items>"#;

    const COLLECTION_XML: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<items totalitems="2" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse" pubdate="Sat, 01 Jun 2024 10:00:00 +0000">
    <item objecttype="thing" objectid="230802" subtype="boardgame" collid="1">
        <name sortindex="1">Azul</name>
        <yearpublished>2017</yearpublished>
        <image>https://cf.geekdo-images.com/azul.png</image>
        <status own="1" prevowned="0" fortrade="0" want="0" wanttoplay="0" wanttobuy="0" wishlist="0" preordered="0" lastmodified="2024-01-01 10:00:00"/>
        <numplays>4</numplays>
    </item>
    <item objecttype="thing" objectid="68448" subtype="boardgame" collid="2">
        <name sortindex="1">7 Wonders</name>
        <status own="1" prevowned="0" fortrade="0" want="0" wanttoplay="0" wanttobuy="0" wishlist="0" preordered="0" lastmodified="2024-01-01 10:00:00"/>
        <numplays>0</numplays>
    </item>
</items>"#;

    const THING_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
    <item type="boardgame" id="266192">
        <thumbnail>https://cf.geekdo-images.com/wingspan_thumb.jpg</thumbnail>
        <image>https://cf.geekdo-images.com/wingspan.jpg</image>
        <name type="alternate" sortindex="1" value="Flügelschlag"/>
        <name type="primary" sortindex="1" value="Wingspan"/>
        <description>Attract birds &amp; build engines.</description>
        <link type="boardgamecategory" id="1089" value="Animals"/>
    </item>
</items>"#;

    fn entry(id: &str, name: &str) -> CollectionEntry {
        CollectionEntry {
            id: id.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_parse_hottest_keeps_document_order() {
        let entries = parse_hottest(HOT_XML);

        assert_eq!(
            entries,
            vec![
                entry("224517", "Brass: Birmingham"),
                entry("13", "Catan"),
                entry("266192", "Wingspan"),
            ]
        );
    }

    #[test]
    fn test_parse_hottest_single_item() {
        let xml = r#"<items><item id="1" rank="1"><name value="Catan"/></item></items>"#;

        assert_eq!(parse_hottest(xml), vec![entry("1", "Catan")]);
    }

    #[test]
    fn test_parse_hottest_empty_and_malformed() {
        assert!(parse_hottest("").is_empty());
        assert!(parse_hottest("<items></items>").is_empty());
        assert!(parse_hottest("<items termsofuse=\"x\"/>").is_empty());
        assert!(parse_hottest("not xml at all").is_empty());
        assert!(parse_hottest("<items><item id=\"1\"><name value=\"Catan\"/></items>").is_empty());
    }

    #[test]
    fn test_parse_hottest_skips_incomplete_items() {
        let xml = r#"<items>
            <item id="1"><name value="Catan"/></item>
            <item id="2"></item>
            <item><name value="Nameless"/></item>
            <item id="3"><name value="Azul"/></item>
        </items>"#;

        assert_eq!(parse_hottest(xml), vec![entry("1", "Catan"), entry("3", "Azul")]);
    }

    #[test]
    fn test_parse_user_collection() {
        let entries = parse_user_collection(COLLECTION_XML);

        assert_eq!(entries, vec![entry("230802", "Azul"), entry("68448", "7 Wonders")]);
    }

    #[test]
    fn test_parse_user_collection_pending_message() {
        let xml = r#"<message>
            Your request for this collection has been accepted and will be processed.
        </message>"#;

        assert!(parse_user_collection(xml).is_empty());
        assert!(parse_user_collection("<items totalitems=\"0\"></items>").is_empty());
        assert!(parse_user_collection("<<<").is_empty());
    }

    #[test]
    fn test_extract_thing_fields() {
        let fields = extract_thing_fields(THING_XML);

        assert_eq!(fields.name.as_deref(), Some("Wingspan"));
        assert_eq!(fields.image.as_deref(), Some("https://cf.geekdo-images.com/wingspan.jpg"));
    }

    #[test]
    fn test_extract_thing_fields_missing_parts() {
        let no_image = r#"<items><item id="1"><name type="primary" value="Catan"/></item></items>"#;
        assert_eq!(
            extract_thing_fields(no_image),
            ThingFields {
                name: Some("Catan".into()),
                image: None,
            }
        );

        let only_alternate = r#"<items><item id="1">
            <image>https://example.com/a.png</image>
            <name type="alternate" value="Die Siedler von Catan"/>
        </item></items>"#;
        assert_eq!(
            extract_thing_fields(only_alternate),
            ThingFields {
                name: None,
                image: Some("https://example.com/a.png".into()),
            }
        );

        let empty_image = r#"<items><item><image></image></item></items>"#;
        assert_eq!(extract_thing_fields(empty_image), ThingFields::default());
    }

    #[test]
    fn test_extract_thing_fields_garbage() {
        assert_eq!(extract_thing_fields(""), ThingFields::default());
        assert_eq!(extract_thing_fields("<html><body>Bad Gateway</body></html>"), ThingFields::default());
        assert_eq!(extract_thing_fields("<items><item></wrong>"), ThingFields::default());
    }

    #[test]
    fn test_extract_thing_fields_unescapes_name() {
        let xml = r#"<items><item><name type="primary" value="Ticket to Ride: Rails &amp; Sails"/></item></items>"#;

        assert_eq!(
            extract_thing_fields(xml).name.as_deref(),
            Some("Ticket to Ride: Rails & Sails")
        );
    }
}
