use keepfoss_core::backup::{read_backup, write_backup};
use keepfoss_core::{export_all, import_all, Note, BACKUP_MIME_TYPE};

fn sample_set() -> Vec<Note> {
    vec![
        Note {
            id: 12,
            title: "Groceries".to_string(),
            content: "Milk, eggs".to_string(),
            color_index: 4,
        },
        Note {
            id: 7,
            title: String::new(),
            content: "quote \" and unicode ✓\nnext line".to_string(),
            color_index: 0,
        },
        Note {
            id: 3,
            title: "title only".to_string(),
            content: String::new(),
            color_index: 2,
        },
    ]
}

#[test]
fn import_of_export_preserves_every_field() {
    let notes = sample_set();
    let decoded = import_all(&export_all(&notes).unwrap()).unwrap();
    assert_eq!(decoded, notes);
}

#[test]
fn empty_collection_exports_as_empty_array() {
    let json = export_all(&[]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value, serde_json::json!([]));
    assert!(import_all(&json).unwrap().is_empty());
}

#[test]
fn field_order_is_not_significant() {
    let notes =
        import_all(r#"[{"colorIndex": 1, "content": "c", "id": 5, "title": "t"}]"#).unwrap();
    assert_eq!(
        notes,
        vec![Note {
            id: 5,
            title: "t".to_string(),
            content: "c".to_string(),
            color_index: 1,
        }]
    );
}

#[test]
fn stream_helpers_match_string_codec() {
    let notes = sample_set();
    let mut buffer = Vec::new();
    write_backup(&mut buffer, &notes).unwrap();

    assert_eq!(String::from_utf8(buffer.clone()).unwrap(), export_all(&notes).unwrap());
    assert_eq!(read_backup(buffer.as_slice()).unwrap(), notes);
}

#[test]
fn mime_type_is_json() {
    assert_eq!(BACKUP_MIME_TYPE, "application/json");
}
