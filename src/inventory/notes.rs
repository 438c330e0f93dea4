//! Note list edits, applied to a copy of the item before it is saved

use chrono::Utc;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::{Note, NoteId};
use crate::validation::validate_note_text;

pub fn append(notes: &mut Vec<Note>, text: &str, config: &ClientConfig) -> Result<Note> {
    validate_note_text(text, config)?;
    let note = Note {
        id: NoteId::generate(),
        text: text.trim().to_string(),
        created_at: Utc::now(),
    };
    notes.push(note.clone());
    Ok(note)
}

pub fn edit(notes: &mut [Note], id: &NoteId, text: &str, config: &ClientConfig) -> Result<Note> {
    validate_note_text(text, config)?;
    let note = notes
        .iter_mut()
        .find(|note| &note.id == id)
        .ok_or_else(|| ClientError::NotFound(format!("note {}", id)))?;
    note.text = text.trim().to_string();
    Ok(note.clone())
}

pub fn remove(notes: &mut Vec<Note>, id: &NoteId) -> Result<Note> {
    let index = notes
        .iter()
        .position(|note| &note.id == id)
        .ok_or_else(|| ClientError::NotFound(format!("note {}", id)))?;
    Ok(notes.remove(index))
}
