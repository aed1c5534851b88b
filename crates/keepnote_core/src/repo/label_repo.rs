//! Label repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD over `labels`.
//! - Own the note-label link helpers used inside note transactions.
//!
//! # Invariants
//! - `(owner_user_id, name)` is unique; violations surface as `name`
//!   validation errors rather than storage errors.
//! - Label deletes cascade to `note_labels` only.

use crate::model::label::{duplicate_label_name, Label, LabelId};
use crate::model::note::NoteId;
use crate::model::user::UserId;
use crate::model::validation::ValidationError;
use crate::repo::page::{Page, PageRequest};
use crate::repo::{ensure_connection_ready, is_unique_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

pub trait LabelRepository {
    fn create_label(&self, owner: UserId, name: &str) -> RepoResult<Label>;
    fn get_label(&self, owner: UserId, id: LabelId) -> RepoResult<Option<Label>>;
    /// Lists the owner's labels sorted by name.
    fn list_labels(&self, owner: UserId, page: PageRequest) -> RepoResult<Page<Label>>;
    fn rename_label(&self, owner: UserId, id: LabelId, name: &str) -> RepoResult<Label>;
    fn delete_label(&self, owner: UserId, id: LabelId) -> RepoResult<()>;
}

pub struct SqliteLabelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLabelRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl LabelRepository for SqliteLabelRepository<'_> {
    fn create_label(&self, owner: UserId, name: &str) -> RepoResult<Label> {
        let label = Label::new(owner, name);
        let inserted = self.conn.execute(
            "INSERT INTO labels (id, owner_user_id, name) VALUES (?1, ?2, ?3);",
            params![label.id.to_string(), owner.to_string(), name],
        );
        match inserted {
            Ok(_) => Ok(label),
            Err(err) if is_unique_violation(&err) => {
                Err(RepoError::Validation(duplicate_label_name(name)))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_label(&self, owner: UserId, id: LabelId) -> RepoResult<Option<Label>> {
        self.conn
            .query_row(
                "SELECT id, owner_user_id, name
                 FROM labels
                 WHERE id = ?1 AND owner_user_id = ?2;",
                params![id.to_string(), owner.to_string()],
                read_label_columns,
            )
            .optional()?
            .map(into_label)
            .transpose()
    }

    fn list_labels(&self, owner: UserId, page: PageRequest) -> RepoResult<Page<Label>> {
        let owner_text = owner.to_string();
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM labels WHERE owner_user_id = ?1;",
            [owner_text.as_str()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT id, owner_user_id, name
             FROM labels
             WHERE owner_user_id = ?1
             ORDER BY name ASC, id ASC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let rows = stmt.query_map(
            params![
                owner_text,
                i64::from(page.page_size()),
                i64::try_from(page.offset()).unwrap_or(i64::MAX)
            ],
            read_label_columns,
        )?;
        let mut items = Vec::new();
        for row in rows {
            items.push(into_label(row?)?);
        }

        Ok(Page {
            items,
            count: u64::try_from(count).unwrap_or(0),
            page: page.page(),
            page_size: page.page_size(),
        })
    }

    fn rename_label(&self, owner: UserId, id: LabelId, name: &str) -> RepoResult<Label> {
        let updated = self.conn.execute(
            "UPDATE labels SET name = ?3 WHERE id = ?1 AND owner_user_id = ?2;",
            params![id.to_string(), owner.to_string(), name],
        );
        match updated {
            Ok(0) => Err(RepoError::NotFound { entity: "label", id }),
            Ok(_) => Ok(Label {
                id,
                owner_user_id: owner,
                name: name.to_string(),
            }),
            Err(err) if is_unique_violation(&err) => {
                Err(RepoError::Validation(duplicate_label_name(name)))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn delete_label(&self, owner: UserId, id: LabelId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM labels WHERE id = ?1 AND owner_user_id = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "label", id });
        }
        Ok(())
    }
}

/// Loads the labels attached to one note, sorted by name.
pub(crate) fn load_labels_for_note(conn: &Connection, note_id: NoteId) -> RepoResult<Vec<Label>> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.owner_user_id, l.name
         FROM note_labels nl
         INNER JOIN labels l ON l.id = nl.label_id
         WHERE nl.note_id = ?1
         ORDER BY l.name ASC, l.id ASC;",
    )?;
    let rows = stmt.query_map([note_id.to_string()], read_label_columns)?;
    let mut labels = Vec::new();
    for row in rows {
        labels.push(into_label(row?)?);
    }
    Ok(labels)
}

/// Rejects label ids that are missing or owned by someone else.
///
/// Both cases produce the same message so foreign ids are not revealed.
pub(crate) fn ensure_labels_owned(
    conn: &Connection,
    owner: UserId,
    label_ids: &[LabelId],
) -> RepoResult<()> {
    let owner_text = owner.to_string();
    for label_id in label_ids {
        let owned: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM labels WHERE id = ?1 AND owner_user_id = ?2
            );",
            params![label_id.to_string(), owner_text.as_str()],
            |row| row.get(0),
        )?;
        if owned != 1 {
            return Err(RepoError::Validation(ValidationError::new(
                "label_ids",
                format!("invalid label id `{label_id}`: object does not exist"),
            )));
        }
    }
    Ok(())
}

/// Replaces the label set of a note. Callers must have checked ownership.
pub(crate) fn replace_note_labels(
    conn: &Connection,
    note_id: NoteId,
    label_ids: &[LabelId],
) -> RepoResult<()> {
    let note_text = note_id.to_string();
    conn.execute(
        "DELETE FROM note_labels WHERE note_id = ?1;",
        [note_text.as_str()],
    )?;
    let unique: BTreeSet<&LabelId> = label_ids.iter().collect();
    for label_id in unique {
        conn.execute(
            "INSERT INTO note_labels (note_id, label_id) VALUES (?1, ?2);",
            params![note_text.as_str(), label_id.to_string()],
        )?;
    }
    Ok(())
}

type LabelColumns = (String, String, String);

fn read_label_columns(row: &Row<'_>) -> rusqlite::Result<LabelColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn into_label((id, owner, name): LabelColumns) -> RepoResult<Label> {
    Ok(Label {
        id: parse_uuid(&id, "labels.id")?,
        owner_user_id: parse_uuid(&owner, "labels.owner_user_id")?,
        name,
    })
}
