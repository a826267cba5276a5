//! Owned, mutable XML document tree
//!
//! Wraps parsing (roxmltree) and serialization (quick-xml) behind a small
//! arena of elements addressed by [`NodeId`]. Namespace prefixes are
//! stripped on read so all lookups use bare tag names; on write the caller
//! re-attaches the namespace as a plain `xmlns` attribute on the root.
//!
//! The model layer only needs child/attribute lookup, a simple `a/b` path
//! form, descendant search, and localized mutation (text rewrite, subtree
//! append/remove), so that is all this provides.

use crate::errors::{ParseError, ScoreError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Handle to one element inside a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<NodeId>,
}

/// One parsed XML document, owning all of its elements
///
/// Mixed content is normalized: an element's text is stored as one field
/// and serialized before its children, so `<a>x<b/>y</a>` round-trips as
/// `<a>xy<b/></a>`. CapXML keeps text in leaf elements (`content`,
/// `verse`), which round-trip exactly.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<ElementData>,
    root: NodeId,
}

impl Document {
    /// Parse an XML string, stripping all namespace prefixes.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        let rx = roxmltree::Document::parse(xml)
            .map_err(|e| ParseError::InvalidXml(e.to_string()))?;

        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = doc.convert(rx.root_element());
        doc.root = root;
        Ok(doc)
    }

    fn convert(&mut self, node: roxmltree::Node) -> NodeId {
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();
        let id = NodeId(self.nodes.len());
        self.nodes.push(ElementData {
            tag: node.tag_name().name().to_string(),
            attributes,
            text: None,
            children: Vec::new(),
        });

        let mut text = String::new();
        for child in node.children() {
            if child.is_element() {
                let cid = self.convert(child);
                self.nodes[id.0].children.push(cid);
            } else if child.is_text() {
                if let Some(t) = child.text() {
                    if !t.trim().is_empty() {
                        text.push_str(t);
                    }
                }
            }
        }
        if !text.is_empty() {
            self.nodes[id.0].text = Some(text);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or replace) an attribute value.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let attrs = &mut self.nodes[id.0].attributes;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.nodes[id.0].text = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// First direct child with the given tag name.
    pub fn find(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.tag(c) == tag)
    }

    /// First element matching a `a/b/c` child path.
    pub fn find_path(&self, id: NodeId, path: &str) -> Option<NodeId> {
        let mut current = id;
        for segment in path.split('/') {
            current = self.find(current, segment)?;
        }
        Some(current)
    }

    /// All elements matching a `a/b` child path, in document order.
    pub fn find_all(&self, id: NodeId, path: &str) -> Vec<NodeId> {
        let mut current = vec![id];
        for segment in path.split('/') {
            let mut next = Vec::new();
            for node in current {
                next.extend(
                    self.children(node)
                        .iter()
                        .copied()
                        .filter(|&c| self.tag(c) == segment),
                );
            }
            current = next;
        }
        current
    }

    /// First descendant (any depth, excluding `id` itself) with the given
    /// tag, in document order. Equivalent to a `.//tag` lookup.
    pub fn descendant(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        for &child in self.children(id) {
            if self.tag(child) == tag {
                return Some(child);
            }
            if let Some(found) = self.descendant(child, tag) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (any depth, excluding `id` itself) with the given
    /// tag, in document order.
    pub fn descendants(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, tag, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, tag: &str, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            if self.tag(child) == tag {
                out.push(child);
            }
            self.collect_descendants(child, tag, out);
        }
    }

    /// Create a detached element; attach it with [`Document::append_child`].
    pub fn new_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ElementData {
            tag: tag.to_string(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    /// Detach `child` from `parent`. The element stays in the arena but is
    /// no longer reachable from the root. Returns false if `child` was not
    /// a direct child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.0].children;
        let before = children.len();
        children.retain(|&c| c != child);
        children.len() != before
    }

    /// Deep-copy a subtree from another document into this one, returning
    /// the detached copy's root.
    pub fn import_from(&mut self, source: &Document, node: NodeId) -> NodeId {
        let id = self.new_element(&source.nodes[node.0].tag);
        self.nodes[id.0].attributes = source.nodes[node.0].attributes.clone();
        self.nodes[id.0].text = source.nodes[node.0].text.clone();
        for &child in source.children(node) {
            let copy = self.import_from(source, child);
            self.append_child(id, copy);
        }
        id
    }

    /// Serialize the whole document, with an XML declaration.
    pub fn to_xml(&self) -> Result<Vec<u8>, ScoreError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| ScoreError::Serialize(e.to_string()))?;
        self.write_node(&mut writer, self.root)
            .map_err(ScoreError::Serialize)?;
        Ok(writer.into_inner())
    }

    /// Serialize one subtree without a declaration. Used for structural
    /// equality checks: two subtrees are interchangeable iff their
    /// serializations are byte-identical.
    pub fn node_to_string(&self, id: NodeId) -> String {
        let mut writer = Writer::new(Vec::new());
        // Writing into a Vec cannot fail at the I/O layer.
        if let Err(e) = self.write_node(&mut writer, id) {
            log::warn!("subtree serialization failed: {e}");
            return String::new();
        }
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), String> {
        let data = &self.nodes[id.0];
        let mut start = BytesStart::new(data.tag.as_str());
        for (name, value) in &data.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if data.text.is_none() && data.children.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(|e| e.to_string())?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| e.to_string())?;
        if let Some(text) = &data.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| e.to_string())?;
        }
        for &child in &data.children {
            self.write_node(writer, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(data.tag.as_str())))
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<score xmlns="http://www.capella.de/CapXML/2.0">
        <layout>
            <staves>
                <staffLayout description="Sopran"/>
                <staffLayout description="Alt"/>
            </staves>
        </layout>
    </score>"#;

    #[test]
    fn namespace_prefixes_are_stripped() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.tag(doc.root()), "score");
        assert!(doc.find(doc.root(), "layout").is_some());
    }

    #[test]
    fn path_lookup_finds_all_matches_in_order() {
        let doc = Document::parse(SAMPLE).unwrap();
        let layout = doc.find(doc.root(), "layout").unwrap();
        let layouts = doc.find_all(layout, "staves/staffLayout");
        let names: Vec<_> = layouts
            .iter()
            .map(|&n| doc.attribute(n, "description").unwrap())
            .collect();
        assert_eq!(names, ["Sopran", "Alt"]);
    }

    #[test]
    fn descendant_search_skips_self() {
        let doc = Document::parse("<rest><display churchStyle=\"true\"/></rest>").unwrap();
        let display = doc.descendant(doc.root(), "display").unwrap();
        assert_eq!(doc.attribute(display, "churchStyle"), Some("true"));
        assert!(doc.descendant(doc.root(), "rest").is_none());
    }

    #[test]
    fn set_text_round_trips_through_serialization() {
        let mut doc = Document::parse("<text><content>old</content></text>").unwrap();
        let content = doc.find(doc.root(), "content").unwrap();
        doc.set_text(content, "new");
        let xml = doc.node_to_string(doc.root());
        assert_eq!(xml, "<text><content>new</content></text>");
    }

    #[test]
    fn mixed_content_is_normalized_to_leading_text() {
        let doc = Document::parse("<a>x<b/>y</a>").unwrap();
        assert_eq!(doc.text(doc.root()), Some("xy"));
        assert_eq!(doc.node_to_string(doc.root()), "<a>xy<b/></a>");
    }

    #[test]
    fn leaf_text_round_trips_exactly() {
        let doc = Document::parse("<verse i=\"0\" hyphen=\"true\">Lau</verse>").unwrap();
        assert_eq!(
            doc.node_to_string(doc.root()),
            "<verse i=\"0\" hyphen=\"true\">Lau</verse>"
        );
    }

    #[test]
    fn structurally_equal_subtrees_serialize_identically() {
        let a = Document::parse("<drawObj><text><content>x</content></text></drawObj>").unwrap();
        let b = Document::parse("<drawObj><text><content>x</content></text></drawObj>").unwrap();
        assert_eq!(a.node_to_string(a.root()), b.node_to_string(b.root()));
    }

    #[test]
    fn import_copies_whole_subtree() {
        let source = Document::parse("<gallery><drawObj id=\"1\"/></gallery>").unwrap();
        let mut target = Document::parse("<score/>").unwrap();
        let copy = target.import_from(&source, source.root());
        target.append_child(target.root(), copy);
        assert_eq!(
            target.node_to_string(target.root()),
            "<score><gallery><drawObj id=\"1\"/></gallery></score>"
        );
    }
}
