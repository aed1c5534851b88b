//! Note domain model and lifecycle flag rules.
//!
//! # Responsibility
//! - Define the note record, its create/update payloads and color palette.
//! - Own the pin/archive/trash transition rules as pure functions; storage
//!   applies them inside a locked read-modify-write.
//!
//! # Invariants
//! - `is_trashed` implies `!is_pinned && !is_archived`.
//! - Archiving clears `is_trashed`; un-archiving never trashes.
//! - Restoring from trash never re-archives or re-pins.
//! - `order` only has meaning among notes of the same owner and the same
//!   pin partition.

use crate::model::checklist::{ChecklistItem, ChecklistItemInput};
use crate::model::label::{Label, LabelId};
use crate::model::user::UserId;
use crate::model::validation::{ensure_max_chars, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NoteId = Uuid;

pub const TITLE_MAX_CHARS: usize = 200;

/// Background palette offered by the clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    White,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    DarkBlue,
    Purple,
    Pink,
    Brown,
    Gray,
}

impl NoteColor {
    pub const ALL: [NoteColor; 12] = [
        NoteColor::White,
        NoteColor::Red,
        NoteColor::Orange,
        NoteColor::Yellow,
        NoteColor::Green,
        NoteColor::Teal,
        NoteColor::Blue,
        NoteColor::DarkBlue,
        NoteColor::Purple,
        NoteColor::Pink,
        NoteColor::Brown,
        NoteColor::Gray,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Teal => "teal",
            Self::Blue => "blue",
            Self::DarkBlue => "darkblue",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Brown => "brown",
            Self::Gray => "gray",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.as_str() == value)
    }

    /// Parses request input, reporting unknown values against `color`.
    pub fn parse_input(value: &str) -> Result<Self, ValidationError> {
        Self::parse(value.trim()).ok_or_else(|| {
            ValidationError::new("color", format!("`{value}` is not a valid choice"))
        })
    }
}

/// One of the three lifecycle toggles exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagToggle {
    Pin,
    Archive,
    Trash,
}

impl FlagToggle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pin => "pin",
            Self::Archive => "archive",
            Self::Trash => "trash",
        }
    }
}

/// Lifecycle flags of one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteFlags {
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_trashed: bool,
}

/// Explicit flag values requested through a create/update payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagRequest {
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub is_trashed: Option<bool>,
}

impl NoteFlags {
    /// Whether these flags satisfy the trash/pin/archive invariants.
    pub fn is_consistent(self) -> bool {
        !self.is_trashed || (!self.is_pinned && !self.is_archived)
    }

    /// Applies one toggle and its coupled side effects.
    ///
    /// Pinning (or unpinning) a trashed note is rejected.
    pub fn toggled(self, toggle: FlagToggle) -> Result<Self, ValidationError> {
        let mut next = self;
        match toggle {
            FlagToggle::Pin => {
                if self.is_trashed {
                    return Err(pin_trashed_error());
                }
                next.is_pinned = !self.is_pinned;
            }
            FlagToggle::Archive => {
                next.is_archived = !self.is_archived;
                if next.is_archived {
                    next.is_trashed = false;
                }
            }
            FlagToggle::Trash => {
                next.is_trashed = !self.is_trashed;
                if next.is_trashed {
                    next.is_archived = false;
                    next.is_pinned = false;
                }
            }
        }
        Ok(next)
    }

    /// Applies explicitly requested flag values from a write payload.
    ///
    /// Explicit trash wins over explicit pin/archive in the same request.
    /// An explicit archive on a trashed note restores it from trash. An
    /// explicit pin on a note that stays trashed is rejected, matching
    /// [`NoteFlags::toggled`].
    pub fn with_requested(self, request: FlagRequest) -> Result<Self, ValidationError> {
        let mut next = self;
        if let Some(trashed) = request.is_trashed {
            next.is_trashed = trashed;
        }
        if let Some(archived) = request.is_archived {
            next.is_archived = archived;
            if archived && request.is_trashed != Some(true) {
                next.is_trashed = false;
            }
        }
        if let Some(pinned) = request.is_pinned {
            next.is_pinned = pinned;
        }

        if next.is_trashed {
            if request.is_pinned == Some(true) && request.is_trashed != Some(true) {
                return Err(pin_trashed_error());
            }
            next.is_pinned = false;
            next.is_archived = false;
        }
        Ok(next)
    }
}

fn pin_trashed_error() -> ValidationError {
    ValidationError::new("is_pinned", "a trashed note cannot be pinned; restore it first")
}

/// Full note read model, including nested labels and checklist items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner_user_id: UserId,
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_trashed: bool,
    pub is_checklist: bool,
    /// Unix epoch milliseconds; stored only, never delivered.
    pub reminder_at: Option<i64>,
    pub order: u32,
    pub created_at: i64,
    pub updated_at: i64,
    /// Sorted by name.
    pub labels: Vec<Label>,
    /// Sorted by `order`, then insertion.
    pub checklist_items: Vec<ChecklistItem>,
}

impl Note {
    pub fn flags(&self) -> NoteFlags {
        NoteFlags {
            is_pinned: self.is_pinned,
            is_archived: self.is_archived,
            is_trashed: self.is_trashed,
        }
    }
}

/// Payload for creating a note. Defaults describe a blank, unflagged note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub flags: FlagRequest,
    pub is_checklist: bool,
    pub order: u32,
    pub reminder_at: Option<i64>,
    pub label_ids: Vec<LabelId>,
    pub checklist_items: Vec<ChecklistItemInput>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_max_chars("title", &self.title, TITLE_MAX_CHARS)
    }
}

/// Partial update payload; `None` leaves the stored value untouched.
///
/// `checklist_items: Some(vec![])` deletes every item, while `None` keeps
/// them as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<NoteColor>,
    pub flags: FlagRequest,
    pub is_checklist: Option<bool>,
    pub order: Option<u32>,
    /// `Some(None)` clears the reminder.
    pub reminder_at: Option<Option<i64>>,
    pub label_ids: Option<Vec<LabelId>>,
    pub checklist_items: Option<Vec<ChecklistItemInput>>,
}

impl NotePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            ensure_max_chars("title", title, TITLE_MAX_CHARS)?;
        }
        Ok(())
    }
}
