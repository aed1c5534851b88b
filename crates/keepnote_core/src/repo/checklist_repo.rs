//! Checklist item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide item-level CRUD for the standalone checklist endpoints.
//! - Own the row helpers the note repository uses while reconciling.
//!
//! # Invariants
//! - Items are only visible through notes owned by the caller.
//! - Items never move between notes.
//! - Item listing is deterministic: `sort_order ASC`, then insertion.

use crate::model::checklist::{ChecklistItem, ChecklistItemId, ChecklistItemInput};
use crate::model::note::NoteId;
use crate::model::user::UserId;
use crate::model::validation::ValidationError;
use crate::repo::note_repo::note_owned;
use crate::repo::page::{Page, PageRequest};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_order, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

const ITEM_COLUMNS_SQL: &str = "ci.id, ci.note_id, ci.text, ci.is_checked, ci.sort_order";

pub trait ChecklistRepository {
    /// Lists items across the owner's notes, optionally for one note.
    fn list_items(
        &self,
        owner: UserId,
        note_id: Option<NoteId>,
        page: PageRequest,
    ) -> RepoResult<Page<ChecklistItem>>;
    fn get_item(&self, owner: UserId, id: ChecklistItemId) -> RepoResult<Option<ChecklistItem>>;
    /// Creates an item on `note_id`; a note the owner cannot see is a
    /// `note` validation error.
    fn create_item(
        &mut self,
        owner: UserId,
        note_id: NoteId,
        input: &ChecklistItemInput,
    ) -> RepoResult<ChecklistItem>;
    fn update_item(
        &mut self,
        owner: UserId,
        id: ChecklistItemId,
        input: &ChecklistItemInput,
    ) -> RepoResult<ChecklistItem>;
    fn delete_item(&self, owner: UserId, id: ChecklistItemId) -> RepoResult<()>;
}

pub struct SqliteChecklistRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteChecklistRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ChecklistRepository for SqliteChecklistRepository<'_> {
    fn list_items(
        &self,
        owner: UserId,
        note_id: Option<NoteId>,
        page: PageRequest,
    ) -> RepoResult<Page<ChecklistItem>> {
        let mut filter = String::from(" WHERE n.owner_user_id = ?");
        let mut bind_values = vec![Value::Text(owner.to_string())];
        if let Some(note_id) = note_id {
            filter.push_str(" AND ci.note_id = ?");
            bind_values.push(Value::Text(note_id.to_string()));
        }

        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*)
                 FROM checklist_items ci
                 INNER JOIN notes n ON n.id = ci.note_id{filter};"
            ),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS_SQL}
             FROM checklist_items ci
             INNER JOIN notes n ON n.id = ci.note_id{filter}
             ORDER BY n.rowid ASC, ci.sort_order ASC, ci.rowid ASC
             LIMIT ? OFFSET ?;"
        ))?;
        bind_values.push(Value::Integer(i64::from(page.page_size())));
        bind_values.push(Value::Integer(
            i64::try_from(page.offset()).unwrap_or(i64::MAX),
        ));
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(Page {
            items,
            count: u64::try_from(count).unwrap_or(0),
            page: page.page(),
            page_size: page.page_size(),
        })
    }

    fn get_item(&self, owner: UserId, id: ChecklistItemId) -> RepoResult<Option<ChecklistItem>> {
        load_owned_item(self.conn, owner, id)
    }

    fn create_item(
        &mut self,
        owner: UserId,
        note_id: NoteId,
        input: &ChecklistItemInput,
    ) -> RepoResult<ChecklistItem> {
        input.validate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !note_owned(&tx, owner, note_id)? {
            return Err(RepoError::Validation(ValidationError::new(
                "note",
                format!("invalid note id `{note_id}`: object does not exist"),
            )));
        }

        let next_order: i64 = tx.query_row(
            "SELECT COUNT(*) FROM checklist_items WHERE note_id = ?1;",
            [note_id.to_string()],
            |row| row.get(0),
        )?;
        let item = ChecklistItem {
            id: Uuid::new_v4(),
            note_id,
            text: input.text.clone().unwrap_or_default(),
            is_checked: input.is_checked.unwrap_or(false),
            order: input
                .order
                .unwrap_or_else(|| u32::try_from(next_order).unwrap_or(u32::MAX)),
        };
        insert_item(&tx, &item)?;
        tx.commit()?;
        Ok(item)
    }

    fn update_item(
        &mut self,
        owner: UserId,
        id: ChecklistItemId,
        input: &ChecklistItemInput,
    ) -> RepoResult<ChecklistItem> {
        input.validate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut item =
            load_owned_item(&tx, owner, id)?.ok_or(RepoError::NotFound {
                entity: "checklist item",
                id,
            })?;
        if input.note.is_some_and(|target| target != item.note_id) {
            return Err(RepoError::Validation(ValidationError::new(
                "note",
                "checklist items cannot be moved to another note",
            )));
        }

        input.apply_to(&mut item);
        update_item_row(&tx, &item)?;
        tx.commit()?;
        Ok(item)
    }

    fn delete_item(&self, owner: UserId, id: ChecklistItemId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM checklist_items
             WHERE id = ?1
               AND note_id IN (SELECT id FROM notes WHERE owner_user_id = ?2);",
            params![id.to_string(), owner.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "checklist item",
                id,
            });
        }
        Ok(())
    }
}

/// Loads every item of one note in display order.
pub(crate) fn load_items_for_note(
    conn: &Connection,
    note_id: NoteId,
) -> RepoResult<Vec<ChecklistItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS_SQL}
         FROM checklist_items ci
         WHERE ci.note_id = ?1
         ORDER BY ci.sort_order ASC, ci.rowid ASC;"
    ))?;
    let mut rows = stmt.query([note_id.to_string()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_item_row(row)?);
    }
    Ok(items)
}

pub(crate) fn insert_item(conn: &Connection, item: &ChecklistItem) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO checklist_items (id, note_id, text, is_checked, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            item.id.to_string(),
            item.note_id.to_string(),
            item.text.as_str(),
            bool_to_int(item.is_checked),
            i64::from(item.order),
        ],
    )?;
    Ok(())
}

/// Writes mutable fields of an existing row; identity and note are fixed.
pub(crate) fn update_item_row(conn: &Connection, item: &ChecklistItem) -> RepoResult<()> {
    conn.execute(
        "UPDATE checklist_items
         SET text = ?2, is_checked = ?3, sort_order = ?4
         WHERE id = ?1 AND note_id = ?5;",
        params![
            item.id.to_string(),
            item.text.as_str(),
            bool_to_int(item.is_checked),
            i64::from(item.order),
            item.note_id.to_string(),
        ],
    )?;
    Ok(())
}

pub(crate) fn delete_item_row(
    conn: &Connection,
    note_id: NoteId,
    id: ChecklistItemId,
) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM checklist_items WHERE id = ?1 AND note_id = ?2;",
        params![id.to_string(), note_id.to_string()],
    )?;
    Ok(())
}

fn load_owned_item(
    conn: &Connection,
    owner: UserId,
    id: ChecklistItemId,
) -> RepoResult<Option<ChecklistItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS_SQL}
         FROM checklist_items ci
         INNER JOIN notes n ON n.id = ci.note_id
         WHERE ci.id = ?1 AND n.owner_user_id = ?2;"
    ))?;
    stmt.query_row(params![id.to_string(), owner.to_string()], |row| {
        Ok(parse_item_row(row))
    })
    .optional()?
    .transpose()
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<ChecklistItem> {
    let id: String = row.get(0)?;
    let note_id: String = row.get(1)?;
    Ok(ChecklistItem {
        id: parse_uuid(&id, "checklist_items.id")?,
        note_id: parse_uuid(&note_id, "checklist_items.note_id")?,
        text: row.get(2)?,
        is_checked: parse_bool(row.get(3)?, "checklist_items.is_checked")?,
        order: parse_order(row.get(4)?, "checklist_items.sort_order")?,
    })
}
