//! Contact Storage Integration Tests
//!
//! File-backed SQLite database: schema creation, persistence across
//! reopen and id ordering.

use tempfile::tempdir;

use relay_bot::storage::database::{ContactRecord, ContactStore, Database};
use relay_bot_core::ContactKind;

#[test]
fn test_contacts_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("bot.db");

    {
        let db = Database::open(&path).unwrap();
        assert!(db.is_healthy());
        db.insert_phones(&["89991234567".to_string()]).unwrap();
        db.insert_emails(&["a@b.ru".to_string(), "c@d.ru".to_string()])
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(
        db.list_phones().unwrap(),
        vec![ContactRecord {
            id: 1,
            value: "89991234567".to_string()
        }]
    );
    let emails: Vec<String> = db
        .list_emails()
        .unwrap()
        .into_iter()
        .map(|r| r.value)
        .collect();
    assert_eq!(emails, vec!["a@b.ru", "c@d.ru"]);
}

#[test]
fn test_ids_keep_growing_across_batches() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path().join("bot.db")).unwrap();

    db.insert(ContactKind::Phone, &["+79990000001".to_string()])
        .unwrap();
    db.insert(
        ContactKind::Phone,
        &["+79990000002".to_string(), "+79990000001".to_string()],
    )
    .unwrap();

    let records = db.list(ContactKind::Phone).unwrap();
    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    // Duplicates are stored as separate rows.
    assert_eq!(records[0].value, records[2].value);
}

#[test]
fn test_tables_are_separate() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path().join("bot.db")).unwrap();

    assert_eq!(db.insert(ContactKind::Email, &[]).unwrap(), 0);
    db.insert_emails(&["x@y.ru".to_string()]).unwrap();

    assert!(db.list_phones().unwrap().is_empty());
    assert_eq!(db.list_emails().unwrap().len(), 1);
}
