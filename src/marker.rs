use std::fs;

use camino::Utf8Path;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info};

use crate::error::MarkerError;
use crate::store::Store;

pub const PIN_PATH: &str = "M14,0 C21.732,0 28,5.641 28,12.6 C28,23.963 14,36 14,36 C14,36 0,24.064 0,12.6 C0,5.641 6.268,0 14,0 Z";
pub const PIN_FILL: &str = "#FF6E6E";

/// Root attributes and raw inner markup of a silhouette SVG.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorDocument {
    pub xmlns: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub view_box: Option<String>,
    pub content: String,
}

/// Parses `source` as an SVG document. The inner markup of the root element
/// is kept verbatim; nested tags only have to be balanced.
pub fn parse_silhouette(source: &str) -> Result<VectorDocument, String> {
    let mut reader = Reader::from_str(source);
    let document = loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                let mut document = root_attributes(&elem)?;
                document.content = reader
                    .read_text(elem.name())
                    .map_err(|err| format!("at position {}: {err}", reader.error_position()))?
                    .into_owned();
                break document;
            }
            Ok(Event::Empty(elem)) => break root_attributes(&elem)?,
            Ok(Event::Text(text)) => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err("text content before the root element".to_string());
                }
            }
            Ok(Event::End(_)) => return Err("closing tag before the root element".to_string()),
            Ok(Event::Eof) => return Err("document has no root element".to_string()),
            Ok(_) => {}
            Err(err) => {
                return Err(format!("at position {}: {err}", reader.error_position()));
            }
        }
    };

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(_) | Event::Empty(_)) => {
                return Err("more than one root element".to_string());
            }
            Ok(Event::Text(text)) if !text.iter().all(u8::is_ascii_whitespace) => {
                return Err("text content after the root element".to_string());
            }
            Ok(_) => {}
            Err(err) => {
                return Err(format!("at position {}: {err}", reader.error_position()));
            }
        }
    }

    Ok(document)
}

fn root_attributes(elem: &BytesStart<'_>) -> Result<VectorDocument, String> {
    if elem.local_name().as_ref() != b"svg" {
        return Err(format!(
            "expected <svg> root element, found <{}>",
            String::from_utf8_lossy(elem.name().as_ref())
        ));
    }
    let mut document = VectorDocument::default();
    for attr in elem.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"xmlns" => document.xmlns = Some(value),
            b"width" => document.width = Some(value),
            b"height" => document.height = Some(value),
            b"viewBox" => document.view_box = Some(value),
            _ => {}
        }
    }
    Ok(document)
}

/// Embeds the silhouette markup in the 50x50 pin template.
pub fn render_marker(silhouette: &VectorDocument) -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="50" height="50">
    <!-- Map Marker -->
    <g id="map-marker" transform="translate(0, 0)">
        <path d="{PIN_PATH}"
            id="Shape" fill="{PIN_FILL}">
        </path>
    </g>
    <g id="species" transform="translate(4, 8)">
        <svg width="20" height="20" viewBox="0 0 1536 1536" preserveAspectRatio="xMidYMid meet">
            {content}
        </svg>
    </g>
</svg>"##,
        content = silhouette.content
    )
}

/// Reads the silhouette at `silhouette_path` and writes the composed marker to
/// `output_path`. Nothing is written when the silhouette does not parse.
pub fn compose(silhouette_path: &Utf8Path, output_path: &Utf8Path) -> Result<(), MarkerError> {
    let bytes = fs::read(silhouette_path.as_std_path()).map_err(|err| {
        MarkerError::Filesystem(format!("failed to read {silhouette_path}: {err}"))
    })?;
    let source = String::from_utf8(bytes).map_err(|err| MarkerError::Parse {
        path: silhouette_path.to_string(),
        message: format!("not valid UTF-8: {err}"),
    })?;
    let silhouette = parse_silhouette(&source).map_err(|message| MarkerError::Parse {
        path: silhouette_path.to_string(),
        message,
    })?;
    debug!(
        xmlns = silhouette.xmlns.as_deref(),
        width = silhouette.width.as_deref(),
        height = silhouette.height.as_deref(),
        view_box = silhouette.view_box.as_deref(),
        "parsed silhouette"
    );
    Store::write_bytes_atomic(output_path, render_marker(&silhouette).as_bytes())?;
    info!(path = %output_path, "wrote marker");
    Ok(())
}
