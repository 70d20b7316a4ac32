//! End-to-end sifting over action-shaped memories.

use sifter::{Db, EntityIds, Record, Schema, SiftingPattern, Value};

fn memory_db() -> (Db, EntityIds) {
    (Db::new(Schema::new().many("tag")), EntityIds::new())
}

fn remember(db: &mut Db, ids: &mut EntityIds, actor: &str, target: &str, tag: &str) {
    let record = Record::new()
        .with("type", "memory")
        .with("actionType", "chat")
        .with("actor", actor)
        .with("target", target)
        .with("tag", tag);
    db.insert(ids.next_id(), record).unwrap();
}

fn retaliation() -> SiftingPattern {
    SiftingPattern::compile(
        "rudeness answered twice",
        &[
            "?e1 actor ?a",
            "?e1 target ?b",
            "?e1 tag rude",
            "?e2 actor ?b",
            "?e2 target ?a",
            "?e2 tag rude",
            "?e3 actor ?b",
            "?e3 target ?a",
            "?e3 tag rude",
            "(< ?e1 ?e2)",
            "(< ?e2 ?e3)",
        ],
    )
    .unwrap()
}

#[test]
fn test_retaliation_needs_original_first() {
    let p = retaliation();

    // Retaliator speaks first: ordering constraints reject it.
    let (mut db, mut ids) = memory_db();
    remember(&mut db, &mut ids, "B", "A", "rude");
    remember(&mut db, &mut ids, "B", "A", "rude");
    remember(&mut db, &mut ids, "A", "B", "rude");
    assert!(p.matches(&db).is_empty());

    let (mut db, mut ids) = memory_db();
    remember(&mut db, &mut ids, "A", "B", "rude");
    remember(&mut db, &mut ids, "B", "A", "rude");
    remember(&mut db, &mut ids, "B", "A", "rude");
    let matches = p.matches(&db);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].get("a"), Some(&Value::from("A")));
    assert_eq!(matches[0].get("b"), Some(&Value::from("B")));
}

#[test]
fn test_unrequited_crush_cleared_by_reply() {
    let p = SiftingPattern::compile(
        "unrequited crush",
        &[
            "?e1 actor ?a",
            "?e1 target ?b",
            "?e1 tag flirty",
            "?e2 actor ?a",
            "?e2 target ?b",
            "?e2 tag flirty",
            "(< ?e1 ?e2)",
            "(not-join [?a ?b ?e2] [?e3 actor ?b] [?e3 target ?a] [?e3 tag flirty] [(> ?e3 ?e2)])",
        ],
    )
    .unwrap();

    let (mut db, mut ids) = memory_db();
    remember(&mut db, &mut ids, "A", "B", "flirty");
    remember(&mut db, &mut ids, "A", "B", "flirty");
    assert_eq!(p.matches(&db).len(), 1);

    remember(&mut db, &mut ids, "B", "A", "flirty");
    assert!(p.matches(&db).is_empty());
}

#[test]
fn test_retracted_memory_no_longer_matches() {
    let p = retaliation();
    let (mut db, mut ids) = memory_db();
    remember(&mut db, &mut ids, "A", "B", "rude");
    remember(&mut db, &mut ids, "B", "A", "rude");
    remember(&mut db, &mut ids, "B", "A", "rude");
    assert_eq!(p.matches(&db).len(), 1);

    let first = db.entity_ids()[0];
    assert!(db.retract_entity(first));
    assert!(p.matches(&db).is_empty());
}

#[test]
fn test_one_pattern_many_stores() {
    let p = SiftingPattern::compile("rude acts", &["?e tag rude", "?e actor ?who"]).unwrap();
    let mut ids = EntityIds::new();
    let mut left = Db::new(Schema::new().many("tag"));
    let mut right = Db::new(Schema::new().many("tag"));
    remember(&mut left, &mut ids, "A", "B", "rude");
    remember(&mut right, &mut ids, "C", "D", "friendly");

    assert_eq!(p.matches(&left).len(), 1);
    assert!(p.matches(&right).is_empty());
    assert_eq!(p.lvars(), &["e".to_string(), "who".to_string()]);
}

#[test]
fn test_empty_store_is_empty_result() {
    let (db, _) = memory_db();
    assert!(db.query(&retaliation()).is_empty());
}
