//! Note objects: the ordered items of a voice
//!
//! A voice is a sequence of note objects; each is one of a closed set of
//! kinds. Only chords and rests carry musical duration, but every kind gets
//! a position and the time signature active there.

use crate::dom::{Document, NodeId};
use crate::duration::{self, Rational};
use crate::errors::DurationError;
use crate::text::TextObject;
use serde::{Deserialize, Serialize};

/// The closed set of note-object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    ClefSign,
    TimeSign,
    Barline,
    Chord,
    Rest,
}

impl EventKind {
    /// Map a document tag name onto a kind. Unknown tags have no kind and
    /// are skipped by the timeline walk.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "clefSign" => Some(EventKind::ClefSign),
            "timeSign" => Some(EventKind::TimeSign),
            "barline" => Some(EventKind::Barline),
            "chord" => Some(EventKind::Chord),
            "rest" => Some(EventKind::Rest),
            _ => None,
        }
    }
}

/// One note head: pitch name plus optional alteration step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    /// Pitch name as written in the document, e.g. `C5`
    pub name: String,
    /// Alteration in half-tone steps; `Some(0)` when an `alter` element is
    /// present without a step, `None` when there is no alteration at all
    pub alteration: Option<i32>,
}

/// One ordered element of a voice timeline
#[derive(Debug, Clone)]
pub struct NoteEvent {
    /// Index within the voice's note-object list
    pub index: usize,
    pub kind: EventKind,
    /// Exact offset from the start of the voice
    pub position: Rational,
    /// Exact duration; zero for non-duration-bearing kinds
    pub duration: Rational,
    /// Time signature active at this event's position
    pub time_sign: String,
    /// True when the duration descriptor suppresses position advancement
    pub no_duration: bool,
    node: NodeId,
}

impl NoteEvent {
    pub(crate) fn new(
        doc: &Document,
        index: usize,
        node: NodeId,
        kind: EventKind,
        position: Rational,
        time_sign: String,
    ) -> Result<Self, DurationError> {
        let duration = duration::event_duration(doc, node, kind, &time_sign)?;
        let no_duration = duration::is_no_duration(doc, node);
        Ok(NoteEvent {
            index,
            kind,
            position,
            duration,
            time_sign,
            no_duration,
            node,
        })
    }

    /// The underlying document element.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// True for the kinds that make up the musical content of a voice.
    pub fn is_musical(&self) -> bool {
        matches!(self.kind, EventKind::Chord | EventKind::Rest)
    }

    /// Note heads of a chord, empty for every other kind.
    pub fn pitches(&self, doc: &Document) -> Vec<Pitch> {
        doc.find_all(self.node, "heads/head")
            .into_iter()
            .filter_map(|head| {
                let name = doc.attribute(head, "pitch")?.to_string();
                let alteration = doc.find(head, "alter").map(|alter| {
                    doc.attribute(alter, "step")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0)
                });
                Some(Pitch { name, alteration })
            })
            .collect()
    }

    /// All draw objects attached to this event.
    pub fn draw_objects(&self, doc: &Document) -> Vec<NodeId> {
        doc.find_all(self.node, "drawObjects/drawObj")
    }

    /// Plain-text annotations attached to this event. Symbol glyphs (drawn
    /// with the capella3 font) are excluded.
    pub fn text_objects(&self, doc: &Document) -> Vec<TextObject> {
        self.draw_objects(doc)
            .into_iter()
            .filter_map(|draw_obj| TextObject::from_draw_obj(doc, self.node, draw_obj))
            .filter(|t| t.is_text())
            .collect()
    }
}
