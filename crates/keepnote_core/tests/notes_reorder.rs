use keepnote_core::db::open_db_in_memory;
use keepnote_core::{
    NoteDraft, NoteListQuery, NoteService, SqliteNoteRepository, SqliteUserRepository, UserId,
    UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn register(conn: &Connection, username: &str) -> UserId {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(username, &format!("digest-{username}"))
        .unwrap()
        .id
}

fn notes(conn: &mut Connection) -> NoteService<SqliteNoteRepository<'_>> {
    NoteService::new(SqliteNoteRepository::try_new(conn).unwrap())
}

#[test]
fn reorder_assigns_positions_and_pin_partition() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let mut service = notes(&mut conn);
    let a = service.create_note(alice, NoteDraft::new("a", "")).unwrap();
    let b = service.create_note(alice, NoteDraft::new("b", "")).unwrap();
    let c = service.create_note(alice, NoteDraft::new("c", "")).unwrap();

    let outcome = service.reorder(alice, &[c.id], &[b.id, a.id]).unwrap();
    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.applied, 3);

    let page = service.list_notes(alice, &NoteListQuery::default()).unwrap();
    let titles: Vec<&str> = page.items.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "b", "a"]);
    assert!(page.items[0].is_pinned);
    assert_eq!(page.items[0].order, 0);
    assert_eq!((page.items[1].order, page.items[2].order), (0, 1));
    assert!(!page.items[1].is_pinned);
}

#[test]
fn reorder_does_not_bump_updated_at() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let mut service = notes(&mut conn);
    let note = service.create_note(alice, NoteDraft::new("still", "")).unwrap();

    service.reorder(alice, &[note.id], &[]).unwrap();
    let moved = service.get_note(alice, note.id).unwrap();
    assert!(moved.is_pinned);
    assert_eq!(moved.updated_at, note.updated_at);
}

#[test]
fn foreign_and_unknown_ids_are_ignored() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let mallory = register(&conn, "mallory");
    let mut service = notes(&mut conn);
    let victim = service.create_note(alice, NoteDraft::new("victim", "")).unwrap();
    let own = service.create_note(mallory, NoteDraft::new("own", "")).unwrap();

    let outcome = service
        .reorder(mallory, &[victim.id, Uuid::new_v4()], &[own.id])
        .unwrap();
    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.applied, 1);

    let untouched = service.get_note(alice, victim.id).unwrap();
    assert!(!untouched.is_pinned);
    assert_eq!(untouched.order, victim.order);
}

#[test]
fn trashed_note_in_pinned_list_takes_order_but_not_pin() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let mut service = notes(&mut conn);
    let live = service.create_note(alice, NoteDraft::new("live", "")).unwrap();
    let binned = service.create_note(alice, NoteDraft::new("binned", "")).unwrap();
    service.toggle_trash(alice, binned.id).unwrap();

    service.reorder(alice, &[live.id, binned.id], &[]).unwrap();
    let binned = service.get_note(alice, binned.id).unwrap();
    assert!(binned.is_trashed);
    assert!(!binned.is_pinned);
    assert_eq!(binned.order, 1);
}

#[test]
fn duplicate_ids_resolve_to_last_occurrence() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let mut service = notes(&mut conn);
    let a = service.create_note(alice, NoteDraft::new("a", "")).unwrap();
    let b = service.create_note(alice, NoteDraft::new("b", "")).unwrap();

    service.reorder(alice, &[a.id], &[b.id, a.id]).unwrap();
    let a = service.get_note(alice, a.id).unwrap();
    assert!(!a.is_pinned);
    assert_eq!(a.order, 1);
}

#[test]
fn empty_lists_change_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let mut service = notes(&mut conn);
    let note = service.create_note(alice, NoteDraft::new("n", "")).unwrap();

    let outcome = service.reorder(alice, &[], &[]).unwrap();
    assert_eq!(outcome.applied, 0);
    assert_eq!(service.get_note(alice, note.id).unwrap(), note);
}
