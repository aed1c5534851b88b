//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes with their label links and checklist items.
//! - Apply lifecycle toggles, bulk reorders and checklist reconciliation
//!   as single atomic writes.
//!
//! # Invariants
//! - Every statement is scoped by `owner_user_id`.
//! - Toggles read, decide and write flags inside one `BEGIN IMMEDIATE`
//!   transaction; concurrent toggles on one note serialize.
//! - A reorder is one transaction; foreign or unknown ids match no row.
//! - Toggles and content updates bump `updated_at`; reorders do not.

use crate::model::checklist::plan_reconciliation;
use crate::model::datetime::now_ms;
use crate::model::note::{
    FlagToggle, Note, NoteColor, NoteDraft, NoteFlags, NoteId, NotePatch,
};
use crate::model::ordering::ReorderPlan;
use crate::model::user::UserId;
use crate::repo::checklist_repo::{
    delete_item_row, insert_item, load_items_for_note, update_item_row,
};
use crate::repo::label_repo::{ensure_labels_owned, load_labels_for_note, replace_note_labels};
use crate::repo::note_query::{build_note_filter, NoteListQuery};
use crate::repo::page::Page;
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_order, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    n.id,
    n.owner_user_id,
    n.title,
    n.content,
    n.color,
    n.is_pinned,
    n.is_archived,
    n.is_trashed,
    n.is_checklist,
    n.reminder_at,
    n.sort_order,
    n.created_at,
    n.updated_at
FROM notes n";

/// Repository interface for note persistence and lifecycle mutations.
pub trait NoteRepository {
    /// Creates a note with labels and checklist items; returns its id.
    fn create_note(&mut self, owner: UserId, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Gets one note with nested labels and items.
    fn get_note(&self, owner: UserId, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists one page of notes matching `query`.
    fn list_notes(&self, owner: UserId, query: &NoteListQuery) -> RepoResult<Page<Note>>;
    /// Applies a partial update, reconciling checklist items when present.
    fn update_note(&mut self, owner: UserId, id: NoteId, patch: &NotePatch) -> RepoResult<()>;
    fn delete_note(&self, owner: UserId, id: NoteId) -> RepoResult<()>;
    /// Flips one lifecycle flag and returns the resulting flag set.
    fn toggle_flag(
        &mut self,
        owner: UserId,
        id: NoteId,
        toggle: FlagToggle,
    ) -> RepoResult<NoteFlags>;
    /// Deletes every trashed note of the owner; returns the note count.
    fn empty_trash(&self, owner: UserId) -> RepoResult<u64>;
    /// Applies a reorder plan; returns how many of the owner's notes moved.
    fn reorder(&mut self, owner: UserId, plan: &ReorderPlan) -> RepoResult<usize>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&mut self, owner: UserId, draft: &NoteDraft) -> RepoResult<NoteId> {
        draft.validate()?;
        let flags = NoteFlags::default().with_requested(draft.flags)?;
        let note_id = Uuid::new_v4();
        let plan = plan_reconciliation(note_id, Vec::new(), &draft.checklist_items)?;
        let now = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_labels_owned(&tx, owner, &draft.label_ids)?;
        tx.execute(
            "INSERT INTO notes (
                id,
                owner_user_id,
                title,
                content,
                color,
                is_pinned,
                is_archived,
                is_trashed,
                is_checklist,
                reminder_at,
                sort_order,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12);",
            params![
                note_id.to_string(),
                owner.to_string(),
                draft.title.as_str(),
                draft.content.as_str(),
                draft.color.as_str(),
                bool_to_int(flags.is_pinned),
                bool_to_int(flags.is_archived),
                bool_to_int(flags.is_trashed),
                bool_to_int(draft.is_checklist),
                draft.reminder_at,
                i64::from(draft.order),
                now,
            ],
        )?;
        replace_note_labels(&tx, note_id, &draft.label_ids)?;
        for item in &plan.creates {
            insert_item(&tx, item)?;
        }
        tx.commit()?;

        Ok(note_id)
    }

    fn get_note(&self, owner: UserId, id: NoteId) -> RepoResult<Option<Note>> {
        match load_note_row(self.conn, owner, id)? {
            Some(note) => Ok(Some(with_relations(self.conn, note)?)),
            None => Ok(None),
        }
    }

    fn list_notes(&self, owner: UserId, query: &NoteListQuery) -> RepoResult<Page<Note>> {
        let filter = build_note_filter(owner, query);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM notes n{};", filter.where_sql),
            params_from_iter(filter.bind_values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{NOTE_SELECT_SQL}{} ORDER BY {} LIMIT ? OFFSET ?;",
            filter.where_sql, filter.order_by_sql
        );
        let mut bind_values = filter.bind_values;
        bind_values.push(rusqlite::types::Value::Integer(i64::from(
            query.page.page_size(),
        )));
        bind_values.push(rusqlite::types::Value::Integer(
            i64::try_from(query.page.offset()).unwrap_or(i64::MAX),
        ));

        let mut rows_out = Vec::new();
        {
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            while let Some(row) = rows.next()? {
                rows_out.push(parse_note_row(row)?);
            }
        }

        let mut items = Vec::with_capacity(rows_out.len());
        for note in rows_out {
            items.push(with_relations(self.conn, note)?);
        }

        Ok(Page {
            items,
            count: u64::try_from(count).unwrap_or(0),
            page: query.page.page(),
            page_size: query.page.page_size(),
        })
    }

    fn update_note(&mut self, owner: UserId, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        patch.validate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = load_note_row(&tx, owner, id)?.ok_or(RepoError::NotFound {
            entity: "note",
            id,
        })?;

        let flags = current.flags().with_requested(patch.flags)?;
        if let Some(label_ids) = patch.label_ids.as_ref() {
            ensure_labels_owned(&tx, owner, label_ids)?;
        }
        let plan = match patch.checklist_items.as_ref() {
            Some(submitted) => Some(plan_reconciliation(
                id,
                load_items_for_note(&tx, id)?,
                submitted,
            )?),
            None => None,
        };

        tx.execute(
            "UPDATE notes
             SET
                title = ?3,
                content = ?4,
                color = ?5,
                is_pinned = ?6,
                is_archived = ?7,
                is_trashed = ?8,
                is_checklist = ?9,
                reminder_at = ?10,
                sort_order = ?11,
                updated_at = ?12
             WHERE id = ?1 AND owner_user_id = ?2;",
            params![
                id.to_string(),
                owner.to_string(),
                patch.title.as_deref().unwrap_or(&current.title),
                patch.content.as_deref().unwrap_or(&current.content),
                patch.color.unwrap_or(current.color).as_str(),
                bool_to_int(flags.is_pinned),
                bool_to_int(flags.is_archived),
                bool_to_int(flags.is_trashed),
                bool_to_int(patch.is_checklist.unwrap_or(current.is_checklist)),
                patch.reminder_at.unwrap_or(current.reminder_at),
                i64::from(patch.order.unwrap_or(current.order)),
                now_ms(),
            ],
        )?;

        if let Some(label_ids) = patch.label_ids.as_ref() {
            replace_note_labels(&tx, id, label_ids)?;
        }
        if let Some(plan) = plan {
            for item in &plan.updates {
                update_item_row(&tx, item)?;
            }
            for item in &plan.creates {
                insert_item(&tx, item)?;
            }
            for item_id in &plan.deletes {
                delete_item_row(&tx, id, *item_id)?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_note(&self, owner: UserId, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND owner_user_id = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "note", id });
        }
        Ok(())
    }

    fn toggle_flag(
        &mut self,
        owner: UserId,
        id: NoteId,
        toggle: FlagToggle,
    ) -> RepoResult<NoteFlags> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = tx
            .query_row(
                "SELECT is_pinned, is_archived, is_trashed
                 FROM notes
                 WHERE id = ?1 AND owner_user_id = ?2;",
                params![id.to_string(), owner.to_string()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?
            .ok_or(RepoError::NotFound { entity: "note", id })?;
        let current = NoteFlags {
            is_pinned: parse_bool(current.0, "notes.is_pinned")?,
            is_archived: parse_bool(current.1, "notes.is_archived")?,
            is_trashed: parse_bool(current.2, "notes.is_trashed")?,
        };

        let next = current.toggled(toggle)?;
        tx.execute(
            "UPDATE notes
             SET
                is_pinned = ?3,
                is_archived = ?4,
                is_trashed = ?5,
                updated_at = ?6
             WHERE id = ?1 AND owner_user_id = ?2;",
            params![
                id.to_string(),
                owner.to_string(),
                bool_to_int(next.is_pinned),
                bool_to_int(next.is_archived),
                bool_to_int(next.is_trashed),
                now_ms(),
            ],
        )?;
        tx.commit()?;

        Ok(next)
    }

    fn empty_trash(&self, owner: UserId) -> RepoResult<u64> {
        let deleted = self.conn.execute(
            "DELETE FROM notes WHERE owner_user_id = ?1 AND is_trashed = 1;",
            [owner.to_string()],
        )?;
        Ok(deleted as u64)
    }

    fn reorder(&mut self, owner: UserId, plan: &ReorderPlan) -> RepoResult<usize> {
        if plan.is_empty() {
            return Ok(0);
        }

        let owner_text = owner.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut applied = 0;
        {
            // Trashed notes take the new position but never the pin.
            let mut stmt = tx.prepare(
                "UPDATE notes
                 SET
                    is_pinned = CASE WHEN is_trashed = 1 THEN 0 ELSE ?1 END,
                    sort_order = ?2
                 WHERE id = ?3 AND owner_user_id = ?4;",
            )?;
            for placement in plan.placements() {
                applied += stmt.execute(params![
                    bool_to_int(placement.is_pinned),
                    i64::from(placement.order),
                    placement.note_id.to_string(),
                    owner_text.as_str(),
                ])?;
            }
        }
        tx.commit()?;

        Ok(applied)
    }
}

/// Whether `note_id` exists and belongs to `owner`.
pub(crate) fn note_owned(conn: &Connection, owner: UserId, note_id: NoteId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM notes WHERE id = ?1 AND owner_user_id = ?2
        );",
        params![note_id.to_string(), owner.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_note_row(conn: &Connection, owner: UserId, id: NoteId) -> RepoResult<Option<Note>> {
    let mut stmt = conn.prepare(&format!(
        "{NOTE_SELECT_SQL} WHERE n.id = ?1 AND n.owner_user_id = ?2;"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), owner.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_note_row(row)?));
    }
    Ok(None)
}

fn with_relations(conn: &Connection, mut note: Note) -> RepoResult<Note> {
    note.labels = load_labels_for_note(conn, note.id)?;
    note.checklist_items = load_items_for_note(conn, note.id)?;
    Ok(note)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_user_id")?;
    let color_text: String = row.get("color")?;
    let color = NoteColor::parse(&color_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid color `{color_text}` in notes.color"))
    })?;

    let note = Note {
        id: parse_uuid(&id_text, "notes.id")?,
        owner_user_id: parse_uuid(&owner_text, "notes.owner_user_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        color,
        is_pinned: parse_bool(row.get("is_pinned")?, "notes.is_pinned")?,
        is_archived: parse_bool(row.get("is_archived")?, "notes.is_archived")?,
        is_trashed: parse_bool(row.get("is_trashed")?, "notes.is_trashed")?,
        is_checklist: parse_bool(row.get("is_checklist")?, "notes.is_checklist")?,
        reminder_at: row.get("reminder_at")?,
        order: parse_order(row.get("sort_order")?, "notes.sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        labels: Vec::new(),
        checklist_items: Vec::new(),
    };
    if !note.flags().is_consistent() {
        return Err(RepoError::InvalidData(format!(
            "note {} is trashed while pinned or archived",
            note.id
        )));
    }
    Ok(note)
}
