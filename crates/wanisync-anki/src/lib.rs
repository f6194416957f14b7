mod client;
pub mod types;

pub use client::AnkiConnectClient;
pub use types::{CardInfo, CardTemplate, FieldValue, MemoryState, Model, NewNote, NoteInfo, NoteOptions};
