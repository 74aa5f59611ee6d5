//! Loading documents from XML (or XHTML-like) text.

use crate::document::{Document, NodeId, NodeKind};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentLoadError {
    #[error("malformed XML near byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("invalid escape in attribute '{attribute}': {reason}")]
    Escape { attribute: String, reason: String },
    #[error("document is not valid UTF-8 near byte {position}")]
    Encoding { position: u64 },
    #[error("unknown entity reference '&{0};'")]
    UnknownEntity(String),
    #[error("element '{0}' is never closed")]
    Unclosed(String),
    #[error("failed to read document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Document {
    pub fn from_xml(xml: &str) -> Result<Self, DocumentLoadError> {
        let mut reader = Reader::from_str(xml);
        let mut document = Document::new();
        let mut open: Vec<NodeId> = vec![document.root()];

        loop {
            let position = u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX);
            let event = reader.read_event().map_err(|source| DocumentLoadError::Xml { position, source })?;
            let parent = open.last().copied().unwrap_or(document.root());
            match event {
                Event::Start(start) => {
                    let node = append_element(&mut document, parent, &start, position)?;
                    open.push(node);
                }
                Event::Empty(start) => {
                    append_element(&mut document, parent, &start, position)?;
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(text) => {
                    let text = utf8(&text, position)?;
                    push_text(&mut document, parent, text);
                }
                Event::CData(data) => {
                    let text = utf8(&data, position)?;
                    push_text(&mut document, parent, text);
                }
                Event::GeneralRef(reference) => {
                    let name = utf8(&reference, position)?;
                    let resolved = resolve_entity(name)
                        .ok_or_else(|| DocumentLoadError::UnknownEntity(name.to_owned()))?;
                    push_text(&mut document, parent, &resolved);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if open.len() > 1 {
            let name = open
                .last()
                .and_then(|node| document.element(*node))
                .map(|element| element.name().to_owned())
                .unwrap_or_default();
            return Err(DocumentLoadError::Unclosed(name));
        }
        Ok(document)
    }

    pub fn from_path(path: &Path) -> Result<Self, DocumentLoadError> {
        let xml = std::fs::read_to_string(path)
            .map_err(|source| DocumentLoadError::Io { path: path.to_path_buf(), source })?;
        Self::from_xml(&xml)
    }
}

fn utf8(bytes: &[u8], position: u64) -> Result<&str, DocumentLoadError> {
    std::str::from_utf8(bytes).map_err(|_| DocumentLoadError::Encoding { position })
}

fn append_element(
    document: &mut Document,
    parent: NodeId,
    start: &BytesStart<'_>,
    position: u64,
) -> Result<NodeId, DocumentLoadError> {
    let name = utf8(start.name().as_ref(), position)?.to_owned();
    let node = document.append_element(parent, name);
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|err| DocumentLoadError::Xml { position, source: err.into() })?;
        let key = utf8(attribute.key.as_ref(), position)?.to_owned();
        let raw = utf8(&attribute.value, position)?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|err| DocumentLoadError::Escape { attribute: key.clone(), reason: err.to_string() })?;
        document.set_attribute(node, key, value.into_owned());
    }
    Ok(node)
}

/// Appends text, merging with a preceding text sibling. Text outside the top
/// level element is dropped.
fn push_text(document: &mut Document, parent: NodeId, text: &str) {
    if parent == document.root() {
        return;
    }
    if let Some(last) = document.children(parent).last().copied()
        && let NodeKind::Text(existing) = document.kind(last)
    {
        let merged = format!("{existing}{text}");
        document.detach(last);
        document.append_text(parent, merged);
        return;
    }
    document.append_text(parent, text);
}

fn resolve_entity(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse::<u32>().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        _ => return None,
    };
    Some(resolved.to_owned())
}
