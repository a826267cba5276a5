//! Logical score model for capella CapXML (.capx) archives
//!
//! A .capx file is a zip container whose `score.xml` entry holds a CapXML
//! document. This crate interprets that document as a musical model:
//! parts derived from the staff-layout declarations, per-line voices
//! stitched across systems into continuous timelines, and individual
//! note/rest/timeSign events with exact rational durations and positions.
//! Text annotations following the `{TAG:value}` convention can be read and
//! rewritten, and the tree can be persisted back into the archive.
//!
//! Rendering, playback and schema validation are out of scope; the model
//! only reads what duration computation and annotation handling need.

pub mod archive;
pub mod dom;
pub mod duration;
pub mod errors;
pub mod event;
pub mod part;
pub mod score;
pub mod text;
pub mod voice;

pub use duration::Rational;
pub use errors::{ArchiveError, DurationError, ParseError, ScoreError};
pub use event::{EventKind, NoteEvent, Pitch};
pub use part::Part;
pub use score::{GalleryFile, Score};
pub use text::{AnnotationTag, TextObject};
pub use voice::Voice;
