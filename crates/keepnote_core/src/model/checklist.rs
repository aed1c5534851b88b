//! Checklist item model and identity-preserving reconciliation.
//!
//! # Responsibility
//! - Define checklist rows owned by exactly one note.
//! - Compute how a submitted item list maps onto stored items.
//!
//! # Invariants
//! - An echoed `id` that belongs to the note keeps its identity.
//! - Unknown, foreign or already-consumed ids become fresh rows attached to
//!   the note being written, never to another note.
//! - Stored rows that are not echoed back are deleted.

use crate::model::note::NoteId;
use crate::model::validation::{ensure_max_chars, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type ChecklistItemId = Uuid;

pub const ITEM_TEXT_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub note_id: NoteId,
    pub text: String,
    pub is_checked: bool,
    pub order: u32,
}

/// Item descriptor as submitted by a client, nested in a note payload or
/// sent to the item endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistItemInput {
    pub id: Option<ChecklistItemId>,
    pub note: Option<NoteId>,
    pub text: Option<String>,
    pub is_checked: Option<bool>,
    pub order: Option<u32>,
}

impl ChecklistItemInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(text) = self.text.as_deref() {
            ensure_max_chars("text", text, ITEM_TEXT_MAX_CHARS)?;
        }
        Ok(())
    }

    /// Copies every submitted field onto `item`; identity and note stay.
    pub fn apply_to(&self, item: &mut ChecklistItem) {
        if let Some(text) = self.text.as_ref() {
            item.text = text.clone();
        }
        if let Some(is_checked) = self.is_checked {
            item.is_checked = is_checked;
        }
        if let Some(order) = self.order {
            item.order = order;
        }
    }
}

/// Writes needed to make a note's stored items match a submitted list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub updates: Vec<ChecklistItem>,
    pub creates: Vec<ChecklistItem>,
    pub deletes: Vec<ChecklistItemId>,
}

/// Plans reconciliation of `submitted` against the note's `existing` items.
///
/// New rows default to empty text, unchecked, and their position in the
/// submitted list when no `order` is given.
///
/// # Errors
/// - `checklist_items` validation error when a descriptor names a different
///   note than `note_id`; the whole request is rejected.
/// - `checklist_items` validation error when item text is too long.
pub fn plan_reconciliation(
    note_id: NoteId,
    existing: Vec<ChecklistItem>,
    submitted: &[ChecklistItemInput],
) -> Result<ReconcilePlan, ValidationError> {
    for descriptor in submitted {
        if descriptor.note.is_some_and(|target| target != note_id) {
            return Err(ValidationError::new(
                "checklist_items",
                "checklist items can only be attached to the note being saved",
            ));
        }
        descriptor
            .validate()
            .map_err(|err| ValidationError::new("checklist_items", err.message))?;
    }

    let mut remaining: HashMap<ChecklistItemId, ChecklistItem> = existing
        .into_iter()
        .map(|item| (item.id, item))
        .collect();
    let mut plan = ReconcilePlan::default();

    for (position, descriptor) in submitted.iter().enumerate() {
        let matched = descriptor.id.and_then(|id| remaining.remove(&id));
        match matched {
            Some(mut item) => {
                descriptor.apply_to(&mut item);
                plan.updates.push(item);
            }
            None => plan.creates.push(ChecklistItem {
                id: Uuid::new_v4(),
                note_id,
                text: descriptor.text.clone().unwrap_or_default(),
                is_checked: descriptor.is_checked.unwrap_or(false),
                order: descriptor
                    .order
                    .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX)),
            }),
        }
    }

    plan.deletes = remaining.into_keys().collect();
    plan.deletes.sort();
    Ok(plan)
}
