//! Voice timelines
//!
//! One voice is a continuous musical line inside one staff fragment. Its
//! events are computed once at construction: the walk keeps a running
//! position and the ambient time signature, so every event knows exactly
//! where it sits and under which meter. Mutating the document afterwards is
//! not reflected here.

use crate::dom::{Document, NodeId};
use crate::duration::Rational;
use crate::errors::ScoreError;
use crate::event::{EventKind, NoteEvent};
use crate::text::TextObject;

/// One voice of one staff fragment, with its computed event timeline
#[derive(Debug, Clone)]
pub struct Voice {
    /// Index of the owning part
    pub part_index: usize,
    /// System (fragment) index within the part
    pub staff_index: usize,
    /// Voice index within the staff fragment
    pub voice_index: usize,
    /// Offset of this fragment from the beginning of the part
    pub position: Rational,
    /// The fragment's default time signature
    pub default_time: String,
    node: NodeId,
    events: Vec<NoteEvent>,
    duration: Rational,
}

impl Voice {
    pub(crate) fn build(
        doc: &Document,
        part_index: usize,
        staff_index: usize,
        voice_index: usize,
        node: NodeId,
        position: Rational,
        default_time: &str,
    ) -> Result<Self, ScoreError> {
        let mut events = Vec::new();
        let mut event_position = Rational::from_integer(0);
        let mut time_sign = default_time.to_string();

        if let Some(list) = doc.find(node, "noteObjects") {
            for (index, &child) in doc.children(list).iter().enumerate() {
                let kind = match EventKind::from_tag(doc.tag(child)) {
                    Some(kind) => kind,
                    None => {
                        log::warn!("skipping unknown note object tag '{}'", doc.tag(child));
                        continue;
                    }
                };
                if kind == EventKind::TimeSign {
                    if let Some(time) = doc.attribute(child, "time") {
                        time_sign = time.to_string();
                    }
                }
                let event = NoteEvent::new(
                    doc,
                    index,
                    child,
                    kind,
                    event_position,
                    time_sign.clone(),
                )?;
                if !event.no_duration {
                    event_position += event.duration;
                }
                events.push(event);
            }
        }

        let duration = events
            .iter()
            .filter(|e| e.is_musical() && !e.no_duration)
            .map(|e| e.duration)
            .sum();

        Ok(Voice {
            part_index,
            staff_index,
            voice_index,
            position,
            default_time: default_time.to_string(),
            node,
            events,
            duration,
        })
    }

    /// All note objects of the voice, in document order.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Chords and rests only: the musical content of the voice.
    pub fn musical_events(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter(|e| e.is_musical())
    }

    /// Chords only.
    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter(|e| e.kind == EventKind::Chord)
    }

    /// Time-signature changes only.
    pub fn time_signs(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter(|e| e.kind == EventKind::TimeSign)
    }

    /// All text annotations reachable from the voice's events.
    pub fn text_objects(&self, doc: &Document) -> Vec<TextObject> {
        self.events
            .iter()
            .flat_map(|e| e.text_objects(doc))
            .collect()
    }

    /// Total duration of the voice's musical events, excluding suppressed
    /// ones. The line length of a staff fragment is the maximum of this
    /// over its voices.
    pub fn duration(&self) -> Rational {
        self.duration
    }

    /// The underlying voice element.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Lyric verse elements, optionally restricted to one verse index.
    pub fn lyrics(&self, doc: &Document, verse: Option<u32>) -> Vec<NodeId> {
        doc.descendants(self.node, "lyric")
            .into_iter()
            .flat_map(|lyric| doc.find_all(lyric, "verse"))
            .filter(|&v| match verse {
                Some(i) => doc.attribute(v, "i") == Some(i.to_string().as_str()),
                None => true,
            })
            .collect()
    }

    /// Concatenated lyric text of one verse (or all verses), joining
    /// syllables with a hyphen at hyphenation breaks and a space otherwise.
    pub fn lyrics_text(&self, doc: &Document, verse: Option<u32>) -> String {
        let mut out = String::new();
        for verse_el in self.lyrics(doc, verse) {
            if let Some(text) = doc.text(verse_el) {
                out.push_str(text);
            }
            if doc.attribute(verse_el, "hyphen") == Some("true") {
                out.push('-');
            } else {
                out.push(' ');
            }
        }
        out
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "voice {} of staff {} at {} (length {})",
            self.voice_index, self.staff_index, self.position, self.duration
        )
    }
}
