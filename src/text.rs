//! Text annotations attached to note objects
//!
//! A draw object with a `text` child is a text annotation. Text drawn with
//! the capella3 font is a notation symbol, not readable text. Annotations
//! following the `{TAG:value}` convention carry structured metadata and are
//! handled by [`AnnotationTag`].

use crate::dom::{Document, NodeId};
use serde::{Deserialize, Serialize};

/// Font face used for notation symbol glyphs
const SYMBOL_FONT: &str = "capella3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextKind {
    /// Readable text
    Text,
    /// A glyph from the notation symbol font
    Symbol,
}

/// One text annotation, exclusively owned by its note object
#[derive(Debug, Clone)]
pub struct TextObject {
    note: NodeId,
    draw_obj: NodeId,
    content_el: NodeId,
    content: String,
    font: Option<String>,
    kind: TextKind,
}

impl TextObject {
    /// Build from a draw object, or None when it carries no text.
    pub fn from_draw_obj(doc: &Document, note: NodeId, draw_obj: NodeId) -> Option<Self> {
        let text_el = doc.find(draw_obj, "text")?;
        let content_el = doc.find(text_el, "content")?;
        let content = doc.text(content_el).unwrap_or("").trim().to_string();
        let font = doc
            .find(text_el, "font")
            .and_then(|f| doc.attribute(f, "face"))
            .map(str::to_string);
        let kind = if font.as_deref() == Some(SYMBOL_FONT) {
            TextKind::Symbol
        } else {
            TextKind::Text
        };
        Some(TextObject {
            note,
            draw_obj,
            content_el,
            content,
            font,
            kind,
        })
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn font(&self) -> Option<&str> {
        self.font.as_deref()
    }

    pub fn kind(&self) -> TextKind {
        self.kind
    }

    pub fn is_text(&self) -> bool {
        self.kind == TextKind::Text
    }

    /// The note object owning this annotation.
    pub fn note(&self) -> NodeId {
        self.note
    }

    /// Rewrite the annotation text in the document.
    pub fn set_text(&mut self, doc: &mut Document, text: &str) {
        self.content = text.to_string();
        doc.set_text(self.content_el, text);
    }

    /// Detach the annotation's draw object from its note. Returns false if
    /// it was already detached.
    pub fn delete(self, doc: &mut Document) -> bool {
        match doc.find(self.note, "drawObjects") {
            Some(list) => doc.remove_child(list, self.draw_obj),
            None => false,
        }
    }

    /// Read this annotation as a `{TAG:value}` tag, or None when the text
    /// does not follow the convention.
    pub fn as_tag(&self) -> Option<AnnotationTag> {
        let inner = self.content.strip_prefix('{')?.strip_suffix('}')?;
        Some(AnnotationTag::with_owner(inner, self.clone()))
    }
}

/// Two annotations are interchangeable when their resolved text is equal,
/// regardless of node identity. Needed for deduplication.
impl PartialEq for TextObject {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for TextObject {}

impl std::hash::Hash for TextObject {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.content.hash(state);
    }
}

/// Structured metadata annotation of the form `{TAG:value}`
///
/// The tag is an upper-case identifier such as `P`, `S` or `TITLE`; the
/// value is free text and may be empty. Mutating either side regenerates
/// the bracketed text and, when the tag owns a text object, writes it back
/// into the document.
#[derive(Debug, Clone)]
pub struct AnnotationTag {
    tag: String,
    value: String,
    owner: Option<TextObject>,
}

impl AnnotationTag {
    /// Parse tag content without the surrounding braces. The split is on
    /// the first colon; without a colon the whole content is the tag and
    /// the value is empty.
    pub fn parse(content: &str) -> Self {
        let (tag, value) = match content.split_once(':') {
            Some((tag, value)) => (tag.to_string(), value.to_string()),
            None => (content.to_string(), String::new()),
        };
        AnnotationTag {
            tag,
            value,
            owner: None,
        }
    }

    fn with_owner(content: &str, owner: TextObject) -> Self {
        let mut parsed = Self::parse(content);
        parsed.owner = Some(owner);
        parsed
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The bracketed form, `{TAG:value}`. The colon is omitted when the tag
    /// is empty.
    pub fn render(&self) -> String {
        if self.tag.is_empty() {
            format!("{{{}}}", self.value)
        } else {
            format!("{{{}:{}}}", self.tag, self.value)
        }
    }

    pub fn set_value(&mut self, doc: &mut Document, value: &str) {
        self.value = value.to_string();
        self.write_back(doc);
    }

    pub fn set_tag(&mut self, doc: &mut Document, tag: &str) {
        self.tag = tag.to_string();
        self.write_back(doc);
    }

    fn write_back(&mut self, doc: &mut Document) {
        let rendered = self.render();
        if let Some(owner) = &mut self.owner {
            owner.set_text(doc, &rendered);
        }
    }
}
