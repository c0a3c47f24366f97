use keepfoss_core::db::open_db_in_memory;
use keepfoss_core::{Note, NoteStore, RepoError, SqliteNoteStore, UNSAVED_NOTE_ID};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn new_store() -> SqliteNoteStore {
    SqliteNoteStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

#[test]
fn insert_assigns_unique_non_zero_ids() {
    let store = new_store();
    let mut ids = HashSet::new();
    for idx in 0..20 {
        let id = store.insert(&Note::draft(format!("note {idx}"), "", 0)).unwrap();
        assert_ne!(id, UNSAVED_NOTE_ID);
        assert!(ids.insert(id));
    }
}

#[test]
fn ids_are_not_reused_after_delete() {
    let store = new_store();
    let first = store.insert(&Note::draft("first", "", 0)).unwrap();
    let note = store.get(first).unwrap().unwrap();
    store.delete(&note).unwrap();

    let second = store.insert(&Note::draft("second", "", 0)).unwrap();
    assert!(second > first);
}

#[test]
fn list_all_is_most_recent_first() {
    let store = new_store();
    store.insert(&Note::draft("old", "", 0)).unwrap();
    store.insert(&Note::draft("middle", "", 1)).unwrap();
    store.insert(&Note::draft("new", "", 2)).unwrap();

    let titles: Vec<String> = store
        .list_all()
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect();
    assert_eq!(titles, vec!["new", "middle", "old"]);
}

#[test]
fn delete_removes_only_target_and_is_idempotent() {
    let store = new_store();
    let keep = store.insert(&Note::draft("keep", "", 0)).unwrap();
    let drop_id = store.insert(&Note::draft("drop", "", 0)).unwrap();
    let target = store.get(drop_id).unwrap().unwrap();

    assert!(store.delete(&target).unwrap());
    assert!(!store.delete(&target).unwrap());

    let remaining = store.list_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
}

#[test]
fn delete_of_unknown_id_leaves_set_unchanged() {
    let store = new_store();
    store.insert(&Note::draft("only", "", 3)).unwrap();
    let before = store.list_all().unwrap();

    let mut ghost = Note::draft("ghost", "", 0);
    ghost.id = 4242;
    assert!(!store.delete(&ghost).unwrap());
    assert_eq!(store.list_all().unwrap(), before);
}

#[test]
fn insert_rejects_color_outside_palette() {
    let store = new_store();
    let err = store.insert(&Note::draft("bad", "", 5)).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn query_all_seeds_and_redelivers_after_each_mutation() {
    let store = new_store();
    store.insert(&Note::draft("seed", "", 0)).unwrap();

    let live = store.query_all().unwrap();
    assert_eq!(live.try_recv().unwrap().len(), 1);

    let id = store.insert(&Note::draft("added", "", 1)).unwrap();
    let after_insert = live.try_recv().unwrap();
    assert_eq!(after_insert.len(), 2);
    assert_eq!(after_insert[0].id, id);

    let added = store.get(id).unwrap().unwrap();
    store.delete(&added).unwrap();
    let after_delete = live.try_recv().unwrap();
    assert_eq!(after_delete.len(), 1);
    assert!(after_delete.iter().all(|note| note.id != id));
}

#[test]
fn noop_delete_does_not_redeliver() {
    let store = new_store();
    let live = store.query_all().unwrap();
    assert!(live.try_recv().unwrap().is_empty());

    let mut ghost = Note::draft("ghost", "", 0);
    ghost.id = 7;
    store.delete(&ghost).unwrap();
    assert!(live.try_recv().is_none());
}

#[test]
fn subscribers_on_other_threads_observe_writes() {
    let store = Arc::new(new_store());
    let live = store.query_all().unwrap();
    assert!(live.recv().unwrap().is_empty());

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for idx in 0..3 {
                store.insert(&Note::draft(format!("n{idx}"), "", 0)).unwrap();
            }
        })
    };

    let mut last_len = 0;
    while last_len < 3 {
        let snapshot = live
            .recv_timeout(Duration::from_secs(5))
            .expect("snapshot should arrive");
        assert!(snapshot.len() > last_len);
        last_len = snapshot.len();
    }
    writer.join().unwrap();
}

#[test]
fn subscription_ends_when_store_is_dropped() {
    let store = new_store();
    let live = store.query_all().unwrap();
    drop(store);

    assert!(live.recv().is_some());
    assert!(live.recv().is_none());
}

#[test]
fn committed_writes_succeed_even_when_relisting_fails() {
    let conn = open_db_in_memory().unwrap();
    // Stores a blob in `content` for one title so the post-write re-list cannot
    // decode it.
    conn.execute_batch(
        "CREATE TRIGGER garble_content AFTER INSERT ON notes
         WHEN NEW.title = 'garbled'
         BEGIN
             UPDATE notes SET content = X'FF00' WHERE id = NEW.id;
         END;",
    )
    .unwrap();
    let store = SqliteNoteStore::try_new(conn).unwrap();
    let live = store.query_all().unwrap();
    assert!(live.try_recv().unwrap().is_empty());

    let id = store.insert(&Note::draft("garbled", "", 0)).unwrap();
    assert!(live.try_recv().is_none());
    assert!(store.list_all().is_err());

    let mut written = Note::draft("garbled", "", 0);
    written.id = id;
    assert!(store.delete(&written).unwrap());
    assert!(live.try_recv().unwrap().is_empty());
    assert!(store.list_all().unwrap().is_empty());
}
