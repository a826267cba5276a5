//! Parts and the per-part voice builder
//!
//! A part is the sum of all staff fragments sharing one layout name across
//! the systems of a score (e.g. one instrument's line). The builder stitches
//! those fragments into continuous voices: each fragment starts where the
//! longest voice of the previous fragment ended.

use crate::dom::{Document, NodeId};
use crate::duration::Rational;
use crate::errors::ScoreError;
use crate::voice::Voice;
use std::collections::BTreeMap;

/// Bracket associations of a part, by `from`/`to` part index. Informational
/// only; durations never depend on them.
#[derive(Debug, Clone, Default)]
pub struct Brackets {
    pub from: Vec<NodeId>,
    pub to: Vec<NodeId>,
}

/// One part: all staff fragments of one layout name, with built voices
#[derive(Debug, Clone)]
pub struct Part {
    /// Zero-based index into the score's staff-layout declarations
    pub number: usize,
    /// Layout name, unique across the score header
    pub name: String,
    staves: BTreeMap<usize, NodeId>,
    brackets: Brackets,
    voices: Vec<Vec<Voice>>,
}

impl Part {
    pub(crate) fn build(
        doc: &Document,
        number: usize,
        name: String,
        staves: BTreeMap<usize, NodeId>,
        brackets: Brackets,
    ) -> Result<Self, ScoreError> {
        let voices = build_voices(doc, number, &name, &staves)?;
        log::debug!(
            "built part {} '{}': {} staves, {} voices",
            number,
            name,
            staves.len(),
            voices.len()
        );
        Ok(Part {
            number,
            name,
            staves,
            brackets,
            voices,
        })
    }

    /// Staff fragments by system index, ascending.
    pub fn staves(&self) -> &BTreeMap<usize, NodeId> {
        &self.staves
    }

    pub fn brackets(&self) -> &Brackets {
        &self.brackets
    }

    /// Voices of the part: outer index is the voice number, inner sequence
    /// holds one [`Voice`] per system line in system order.
    pub fn voices(&self) -> &[Vec<Voice>] {
        &self.voices
    }

    /// Total duration of each voice across all of its system lines.
    pub fn voice_durations(&self) -> Vec<Rational> {
        self.voices
            .iter()
            .map(|lines| lines.iter().map(|v| v.duration()).sum())
            .collect()
    }
}

impl std::fmt::Display for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Part:{}>", self.name)
    }
}

/// Walk a part's staff fragments in system order and build its voices.
///
/// The start position of each fragment is the cumulative sum of preceding
/// fragments' line lengths, where a fragment's line length is the duration
/// of its longest voice.
fn build_voices(
    doc: &Document,
    part_index: usize,
    part_name: &str,
    staves: &BTreeMap<usize, NodeId>,
) -> Result<Vec<Vec<Voice>>, ScoreError> {
    let mut voices: Vec<Vec<Voice>> = Vec::new();
    let mut position = Rational::from_integer(0);
    let mut line_length = Rational::from_integer(0);

    for (&staff_index, &staff) in staves {
        position += line_length;
        line_length = Rational::from_integer(0);

        let default_time =
            doc.attribute(staff, "defaultTime")
                .ok_or_else(|| ScoreError::MissingDefaultTime {
                    part: part_name.to_string(),
                    system: staff_index,
                })?;

        for (voice_index, voice_node) in
            doc.find_all(staff, "voices/voice").into_iter().enumerate()
        {
            let voice = Voice::build(
                doc,
                part_index,
                staff_index,
                voice_index,
                voice_node,
                position,
                default_time,
            )?;
            if voice.duration() > line_length {
                line_length = voice.duration();
            }
            match voices.get_mut(voice_index) {
                Some(slot) => slot.push(voice),
                None => voices.push(vec![voice]),
            }
        }
    }

    Ok(voices)
}
