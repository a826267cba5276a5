//! Top-level score model
//!
//! [`Score`] opens a .capx archive (or a raw CapXML string), exposes the
//! lazily built, permanently cached part list, merges gallery fragments
//! and persists the tree back into the archive. [`GalleryFile`] opens the
//! companion gallery container format.

use crate::archive;
use crate::dom::{Document, NodeId};
use crate::errors::{ParseError, ScoreError};
use crate::part::{Brackets, Part};
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Namespace of CapXML score documents
pub const CAPX_NS: &str = "http://www.capella.de/CapXML/2.0";
/// Namespace of CagXML gallery documents
pub const CAGX_NS: &str = "http://www.capella.de/CagXML/3.0";
/// Well-known archive entry holding the score document
pub const SCORE_ENTRY: &str = "score.xml";
/// Well-known archive entry holding gallery content
pub const GALLERY_ENTRY: &str = "cagx.xml";

/// One score document and its logical musical model
pub struct Score {
    doc: Document,
    source: Option<PathBuf>,
    entry: String,
    namespace: &'static str,
    parts: OnceCell<Vec<Part>>,
}

impl Score {
    /// Open the score document from a .capx archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        Self::open_entry(path, SCORE_ENTRY)
    }

    /// Open a score stored under a non-default entry name.
    pub fn open_entry(path: impl AsRef<Path>, entry: &str) -> Result<Self, ScoreError> {
        let path = path.as_ref();
        let xml = archive::read_entry(path, entry)?;
        let mut score = Self::from_xml(&xml)?;
        score.source = Some(path.to_path_buf());
        score.entry = entry.to_string();
        log::debug!("opened score entry '{}' from {}", entry, path.display());
        Ok(score)
    }

    /// Build the model over a raw CapXML string. Such a score has no
    /// backing archive and cannot be persisted.
    pub fn from_xml(xml: &str) -> Result<Self, ScoreError> {
        let doc = Document::parse(xml)?;
        Ok(Score {
            doc,
            source: None,
            entry: SCORE_ENTRY.to_string(),
            namespace: CAPX_NS,
            parts: OnceCell::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access to the underlying tree. Cached model state built
    /// before a mutation is not updated; rebuild the model afterwards.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Layout names declared in the score header, in declaration order.
    /// These identify parts inside each system's staff list.
    pub fn layout_names(&self) -> Result<Vec<String>, ScoreError> {
        let layout = self.layout_el()?;
        self.doc
            .find_all(layout, "staves/staffLayout")
            .into_iter()
            .map(|n| {
                self.doc
                    .attribute(n, "description")
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ParseError::MissingRequiredElement(
                            "staffLayout description attribute".to_string(),
                        )
                        .into()
                    })
            })
            .collect()
    }

    /// The score's parts, built on first access and cached for the lifetime
    /// of this instance.
    pub fn parts(&self) -> Result<&[Part], ScoreError> {
        self.parts
            .get_or_try_init(|| self.build_parts())
            .map(Vec::as_slice)
    }

    fn layout_el(&self) -> Result<NodeId, ScoreError> {
        self.doc
            .find(self.doc.root(), "layout")
            .ok_or_else(|| ParseError::MissingRequiredElement("layout".to_string()).into())
    }

    fn build_parts(&self) -> Result<Vec<Part>, ScoreError> {
        let layout = self.layout_el()?;
        let systems = self.doc.find_all(self.doc.root(), "systems/system");
        let all_brackets = self.doc.descendants(layout, "bracket");

        let mut parts = Vec::new();
        for (number, name) in self.layout_names()?.into_iter().enumerate() {
            let number_str = number.to_string();
            let brackets = Brackets {
                from: all_brackets
                    .iter()
                    .copied()
                    .filter(|&b| self.doc.attribute(b, "from") == Some(number_str.as_str()))
                    .collect(),
                to: all_brackets
                    .iter()
                    .copied()
                    .filter(|&b| self.doc.attribute(b, "to") == Some(number_str.as_str()))
                    .collect(),
            };

            let mut staves = BTreeMap::new();
            for (system_index, &system) in systems.iter().enumerate() {
                for staff in self.doc.descendants(system, "staff") {
                    if self.doc.attribute(staff, "layout") == Some(name.as_str()) {
                        staves.insert(system_index, staff);
                    }
                }
            }

            parts.push(Part::build(&self.doc, number, name, staves, brackets)?);
        }
        Ok(parts)
    }

    /// All bracket declarations of the score header.
    pub fn brackets(&self) -> Vec<NodeId> {
        match self.doc.find(self.doc.root(), "layout") {
            Some(layout) => self.doc.find_all(layout, "brackets/bracket"),
            None => Vec::new(),
        }
    }

    /// System elements in document order.
    pub fn systems(&self) -> Vec<NodeId> {
        self.doc.find_all(self.doc.root(), "systems/system")
    }

    /// Merge a gallery fragment into the score's gallery section.
    ///
    /// Without an existing gallery the whole fragment becomes the gallery.
    /// Otherwise each item is appended only if no structurally identical
    /// item already exists, so shared resources are never duplicated.
    pub fn add_gallery(&mut self, source: &Document, fragment: NodeId) {
        match self.doc.find(self.doc.root(), "gallery") {
            None => {
                let copy = self.doc.import_from(source, fragment);
                let root = self.doc.root();
                self.doc.append_child(root, copy);
            }
            Some(gallery) => {
                let mut existing: Vec<String> = self
                    .doc
                    .children(gallery)
                    .iter()
                    .map(|&item| self.doc.node_to_string(item))
                    .collect();
                for &item in source.children(fragment) {
                    let serialized = source.node_to_string(item);
                    // the check runs against the gallery as it grows, so a
                    // duplicate within the incoming fragment is skipped too
                    if existing.contains(&serialized) {
                        log::debug!("skipping duplicate gallery item");
                        continue;
                    }
                    let copy = self.doc.import_from(source, item);
                    self.doc.append_child(gallery, copy);
                    existing.push(serialized);
                }
            }
        }
    }

    /// Merge the gallery content of a companion gallery file.
    pub fn merge_gallery(&mut self, gallery: &GalleryFile) {
        self.add_gallery(gallery.document(), gallery.gallery_root());
    }

    /// Serialize the tree with the namespace re-attached on the root.
    pub fn to_xml(&mut self) -> Result<Vec<u8>, ScoreError> {
        let root = self.doc.root();
        self.doc.set_attribute(root, "xmlns", self.namespace);
        self.doc.to_xml()
    }

    /// Write the current tree back into the archive's content entry,
    /// preserving every other entry. Fails without touching the archive
    /// when the score was built from a raw string.
    pub fn persist(&mut self) -> Result<(), ScoreError> {
        let path = self.source.clone().ok_or(ScoreError::NoBackingArchive)?;
        let xml = self.to_xml()?;
        archive::replace_entry(&path, &self.entry, &xml)?;
        Ok(())
    }
}

/// A companion gallery container holding shared drawable definitions
pub struct GalleryFile {
    doc: Document,
}

impl GalleryFile {
    /// Open the gallery document from its archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        let xml = archive::read_entry(path.as_ref(), GALLERY_ENTRY)?;
        Self::from_xml(&xml)
    }

    pub fn from_xml(xml: &str) -> Result<Self, ScoreError> {
        let doc = Document::parse(xml)?;
        Ok(GalleryFile { doc })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The gallery fragment: the document's `gallery` element, or the root
    /// itself when the root is the gallery.
    pub fn gallery_root(&self) -> NodeId {
        self.doc
            .find(self.doc.root(), "gallery")
            .unwrap_or_else(|| self.doc.root())
    }
}
