pub mod types;

pub use types::{AudioFormat, Media, NoteRequirements, ReviewCard, Strength, SubjectKind};
