//! Owner-scoped note filtering, search and ordering.
//!
//! # Responsibility
//! - Translate list options into a parameterized SQL filter.
//! - Keep the default view (no archived, no trashed notes) in one place.
//!
//! # Invariants
//! - The owner predicate is always the first clause; no option can widen
//!   the result beyond the caller's own notes.
//! - Search terms are matched literally (`%`/`_` are escaped).

use crate::model::label::LabelId;
use crate::model::note::NoteColor;
use crate::model::user::UserId;
use crate::repo::bool_to_int;
use crate::repo::page::PageRequest;
use rusqlite::types::Value;

/// Sort order for note lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteOrdering {
    /// Pinned first, then manual `order`, then most recently updated.
    #[default]
    Board,
    UpdatedAsc,
    UpdatedDesc,
    CreatedAsc,
    CreatedDesc,
}

impl NoteOrdering {
    /// Parses the `ordering` query value (`updated_at`, `-created_at`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "updated_at" => Some(Self::UpdatedAsc),
            "-updated_at" => Some(Self::UpdatedDesc),
            "created_at" => Some(Self::CreatedAsc),
            "-created_at" => Some(Self::CreatedDesc),
            _ => None,
        }
    }

    fn order_by_sql(self) -> &'static str {
        match self {
            Self::Board => "n.is_pinned DESC, n.sort_order ASC, n.updated_at DESC, n.rowid DESC",
            Self::UpdatedAsc => "n.updated_at ASC, n.rowid ASC",
            Self::UpdatedDesc => "n.updated_at DESC, n.rowid DESC",
            Self::CreatedAsc => "n.created_at ASC, n.rowid ASC",
            Self::CreatedDesc => "n.created_at DESC, n.rowid DESC",
        }
    }
}

/// List options for the note surface. `None` filters are not applied,
/// except archive/trash which default to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub is_trashed: Option<bool>,
    pub is_checklist: Option<bool>,
    pub color: Option<NoteColor>,
    pub label_id: Option<LabelId>,
    /// Exact label name; an unknown name yields an empty list.
    pub label_name: Option<String>,
    /// Whitespace-separated terms; every term must match the title, the
    /// content or any checklist item text.
    pub search: Option<String>,
    pub ordering: NoteOrdering,
    pub page: PageRequest,
}

/// SQL fragment (starting with ` WHERE`) and its bind values.
pub(crate) struct NoteFilter {
    pub where_sql: String,
    pub bind_values: Vec<Value>,
    pub order_by_sql: &'static str,
}

pub(crate) fn build_note_filter(owner: UserId, query: &NoteListQuery) -> NoteFilter {
    let mut where_sql = String::from(" WHERE n.owner_user_id = ?");
    let mut bind_values = vec![Value::Text(owner.to_string())];

    let flag_filters = [
        ("n.is_pinned", query.is_pinned),
        ("n.is_archived", Some(query.is_archived.unwrap_or(false))),
        ("n.is_trashed", Some(query.is_trashed.unwrap_or(false))),
        ("n.is_checklist", query.is_checklist),
    ];
    for (column, value) in flag_filters {
        if let Some(value) = value {
            where_sql.push_str(&format!(" AND {column} = ?"));
            bind_values.push(Value::Integer(bool_to_int(value)));
        }
    }

    if let Some(color) = query.color {
        where_sql.push_str(" AND n.color = ?");
        bind_values.push(Value::Text(color.as_str().to_string()));
    }

    if let Some(label_id) = query.label_id {
        where_sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM note_labels nl
                WHERE nl.note_id = n.id AND nl.label_id = ?
            )",
        );
        bind_values.push(Value::Text(label_id.to_string()));
    }

    if let Some(label_name) = query.label_name.as_ref() {
        where_sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM note_labels nl
                INNER JOIN labels l ON l.id = nl.label_id
                WHERE nl.note_id = n.id AND l.name = ?
            )",
        );
        bind_values.push(Value::Text(label_name.clone()));
    }

    if let Some(search) = query.search.as_deref() {
        for term in search.split_whitespace() {
            where_sql.push_str(
                " AND (
                    n.title LIKE ? ESCAPE '\\'
                    OR n.content LIKE ? ESCAPE '\\'
                    OR EXISTS (
                        SELECT 1 FROM checklist_items ci
                        WHERE ci.note_id = n.id AND ci.text LIKE ? ESCAPE '\\'
                    )
                )",
            );
            let pattern = format!("%{}%", escape_like(term));
            for _ in 0..3 {
                bind_values.push(Value::Text(pattern.clone()));
            }
        }
    }

    NoteFilter {
        where_sql,
        bind_values,
        order_by_sql: query.ordering.order_by_sql(),
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{build_note_filter, escape_like, NoteListQuery, NoteOrdering};
    use uuid::Uuid;

    #[test]
    fn default_filter_hides_archived_and_trashed() {
        let filter = build_note_filter(Uuid::new_v4(), &NoteListQuery::default());
        assert!(filter.where_sql.contains("n.is_archived = ?"));
        assert!(filter.where_sql.contains("n.is_trashed = ?"));
        assert!(!filter.where_sql.contains("n.is_pinned = ?"));
        assert_eq!(filter.bind_values.len(), 3);
    }

    #[test]
    fn each_search_term_binds_three_patterns() {
        let query = NoteListQuery {
            search: Some("milk  eggs".to_string()),
            ..NoteListQuery::default()
        };
        let filter = build_note_filter(Uuid::new_v4(), &query);
        assert_eq!(filter.bind_values.len(), 3 + 6);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn ordering_parses_known_fields_only() {
        assert_eq!(
            NoteOrdering::parse("-updated_at"),
            Some(NoteOrdering::UpdatedDesc)
        );
        assert_eq!(NoteOrdering::parse("title"), None);
    }
}
