use tempfile::{tempdir, TempDir};
use textdb::{Database, DbConfig, Error, ForeignKey, SeedTable};

fn open_db() -> (TempDir, Database) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenarios.txt");
    let db = Database::open(&DbConfig::new(path.to_string_lossy())).unwrap();
    (dir, db)
}

fn users_db() -> (TempDir, Database, String, String) {
    let (dir, db) = open_db();
    db.create_table("Users", &["name", "age"]).unwrap();
    let pedro = db.add_values("Users", &["pedro", "32"]).unwrap();
    let juan = db.add_values("Users", &["juan", "54"]).unwrap();
    (dir, db, pedro, juan)
}

#[test]
fn test_select_with_where_returns_matching_row() {
    let (_dir, db, _pedro, juan) = users_db();

    let result = db.execute("SELECT name, age FROM Users WHERE age = 54").unwrap();
    assert_eq!(result.affected_rows, 0);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("name").unwrap().as_str(), "juan");
    assert_eq!(result.rows[0].get("age").unwrap().as_str(), "54");

    let all = db.execute("SELECT * FROM Users WHERE age = 54").unwrap();
    assert_eq!(all.rows[0].id(), juan);
}

#[test]
fn test_update_reports_affected_rows() {
    let (_dir, db, pedro, _juan) = users_db();

    let result = db.execute("UPDATE Users SET age = 25 WHERE age = 32").unwrap();
    assert_eq!(result.affected_rows, 1);

    let row = db.table("Users").unwrap().get_row_by_id(&pedro).unwrap();
    assert_eq!(row.get("age").unwrap().as_str(), "25");
}

#[test]
fn test_multi_row_insert() {
    let (_dir, db, _pedro, _juan) = users_db();

    let result = db
        .execute("INSERT INTO Users (name, age) VALUES (maria, 20, carlitos, 32)")
        .unwrap();
    assert_eq!(result.affected_rows, 2);

    let users = db.table("Users").unwrap();
    assert_eq!(users.row_count(), 4);
    assert_eq!(
        users.search_one("name", "maria").unwrap().get("age").unwrap().as_str(),
        "20"
    );
}

#[test]
fn test_delete_and_drop_through_sql() {
    let (_dir, db, pedro, _juan) = users_db();

    let result = db.execute("DELETE FROM Users WHERE name = juan").unwrap();
    assert_eq!(result.affected_rows, 1);
    assert_eq!(db.table("Users").unwrap().row_count(), 1);
    assert!(db.table("Users").unwrap().get_row_by_id(&pedro).is_ok());

    db.execute("DROP TABLE Users").unwrap();
    assert!(db.list_tables().unwrap().is_empty());
    assert!(matches!(
        db.execute("DROP TABLE Users"),
        Err(Error::TableNotFound(_))
    ));
}

#[test]
fn test_sql_syntax_errors() {
    let (_dir, db, _pedro, _juan) = users_db();

    for sql in [
        "SELECT name Users",
        "UPDATE Users age = 1",
        "INSERT Users (name, age) VALUES (a, 1)",
        "DELETE Users WHERE age = 1",
        "MERGE INTO Users",
    ] {
        assert!(
            matches!(db.execute(sql), Err(Error::SqlSyntax { .. })),
            "expected syntax error for {sql}"
        );
    }
}

#[test]
fn test_values_with_spaces_round_trip_through_file() {
    let (_dir, db) = open_db();
    db.create_table("Houses", &["direction"]).unwrap();
    db.execute("INSERT INTO Houses (direction) VALUES ('pedro avenue, 12')")
        .unwrap();

    assert!(db.dump().unwrap().contains("pedroU+0020avenue,U+002012"));
    let result = db
        .execute("SELECT direction FROM Houses WHERE direction = 'pedro avenue, 12'")
        .unwrap();
    assert_eq!(result.rows.len(), 1);
}

#[test]
fn test_order_by_is_lexicographic() {
    let (_dir, db, _pedro, _juan) = users_db();
    db.add_values("Users", &["carlos", "100"]).unwrap();

    let mut rows = db.table("Users").unwrap().get_rows();
    rows.order_by_ascend("age").unwrap();
    let ages: Vec<&str> = rows.iter().map(|r| r.get("age").unwrap().as_str()).collect();
    assert_eq!(ages, vec!["100", "32", "54"]);

    rows.order_by_descend("age").unwrap();
    assert_eq!(rows[0].get("age").unwrap().as_str(), "54");
    assert!(rows.order_by_ascend("email").unwrap_err().is_not_found());
}

#[test]
fn test_cascade_delete() {
    let (_dir, db) = open_db();
    db.create_table("Clients", &["name"]).unwrap();
    db.create_table("Invoice", &["Client_Id", "total"]).unwrap();
    let ana = db.add_values("Clients", &["ana"]).unwrap();
    let bob = db.add_values("Clients", &["bob"]).unwrap();
    db.add_values("Invoice", &[ana.as_str(), "10"]).unwrap();
    db.add_values("Invoice", &[ana.as_str(), "20"]).unwrap();
    let kept = db.add_values("Invoice", &[bob.as_str(), "30"]).unwrap();

    db.add_foreign_key(&ForeignKey::new("Clients", "id", "Invoice", "Client_Id"))
        .unwrap();
    assert_eq!(db.list_tables().unwrap()[0], "Links");

    let related = db.search_by_foreign_key("Clients", &ana).unwrap();
    assert_eq!(related[0].rows.len(), 2);

    assert_eq!(db.delete_row("Clients", &ana, true).unwrap(), 3);
    let invoice = db.table("Invoice").unwrap();
    assert_eq!(invoice.row_count(), 1);
    assert!(invoice.get_row_by_id(&kept).is_ok());
}

#[test]
fn test_duplicate_foreign_key() {
    let (_dir, db) = open_db();
    db.create_table("Clients", &["name"]).unwrap();
    db.create_table("Invoice", &["Client_Id"]).unwrap();
    let key = ForeignKey::new("Clients", "id", "Invoice", "Client_Id");

    db.add_foreign_keys(&[key.clone()]).unwrap();
    assert!(matches!(
        db.add_foreign_key(&key),
        Err(Error::DuplicateRelation(_))
    ));
    assert_eq!(db.foreign_keys().unwrap(), vec![key.clone()]);

    db.remove_foreign_key(&key).unwrap();
    assert!(db.foreign_keys().unwrap().is_empty());
}

#[test]
fn test_seeding_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seeded.txt");
    let config = DbConfig::new(path.to_string_lossy()).seed(
        SeedTable::new("Users", ["name", "age"])
            .row(["1", "pedro", "32"])
            .row(["2", "juan", "54"]),
    );

    let db = Database::open(&config).unwrap();
    assert_eq!(db.table("Users").unwrap().row_count(), 2);
    let first = db.dump().unwrap();
    drop(db);

    let db = Database::open(&config).unwrap();
    assert_eq!(db.table("Users").unwrap().row_count(), 2);
    assert_eq!(db.dump().unwrap(), first);

    let extended = config.clone().seed(SeedTable::new("Users", ["name", "age"]).row(["3", "carlos", "62"]));
    let db = Database::open(&extended).unwrap();
    assert_eq!(db.table("Users").unwrap().row_count(), 3);
}

#[test]
fn test_seed_arity_is_validated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    let config = DbConfig::new(path.to_string_lossy())
        .seed(SeedTable::new("Users", ["name", "age"]).row(["1", "pedro"]));

    assert!(matches!(Database::open(&config), Err(Error::Validation(_))));
    assert!(!path.exists());
}

#[test]
fn test_reopen_reads_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reopen.txt");
    let config = DbConfig::new(path.to_string_lossy());

    {
        let db = Database::open(&config).unwrap();
        db.create_table("Users", &["name"]).unwrap();
        db.add_values_with_id("Users", &["7", "eva"]).unwrap();
    }

    let db = Database::open(&config).unwrap();
    let row = db.table("Users").unwrap().get_row_by_id("7").unwrap();
    assert_eq!(row.to_string(), "|1| 7 |2| eva");
}

fn billing_db() -> (TempDir, Database, String) {
    let (dir, db) = open_db();
    db.create_table("Clients", &["name"]).unwrap();
    db.create_table("Invoice", &["Client_Id", "total"]).unwrap();
    let ana = db.add_values("Clients", &["ana"]).unwrap();
    db.add_values("Invoice", &[ana.as_str(), "10"]).unwrap();
    db.add_values("Invoice", &[ana.as_str(), "20"]).unwrap();
    db.add_foreign_key(&ForeignKey::new("Clients", "id", "Invoice", "Client_Id"))
        .unwrap();
    (dir, db, ana)
}

#[test]
fn test_cascade_after_renaming_foreign_column() {
    let (_dir, db, ana) = billing_db();

    db.rename_column("Invoice", "Client_Id", "cust").unwrap();
    assert_eq!(
        db.foreign_keys().unwrap(),
        vec![ForeignKey::new("Clients", "id", "Invoice", "cust")]
    );
    assert_eq!(db.delete_row("Clients", &ana, true).unwrap(), 3);
    assert_eq!(db.table("Invoice").unwrap().row_count(), 0);
}

#[test]
fn test_cascade_after_deleting_foreign_column() {
    let (_dir, db, ana) = billing_db();

    db.delete_column("Invoice", "Client_Id").unwrap();
    assert!(db.foreign_keys().unwrap().is_empty());
    assert_eq!(db.delete_row("Clients", &ana, true).unwrap(), 1);
    assert_eq!(db.table("Invoice").unwrap().row_count(), 2);
}

#[test]
fn test_links_table_rejects_direct_writes() {
    let (_dir, db, _ana) = billing_db();
    let before = db.dump().unwrap();

    let insert = db.execute(
        "INSERT INTO Links (table1, columnLink1, table2, columnLink2) \
         VALUES (Clients, id, Invoice, Client_Id, Ghost, x, Nope, y)",
    );
    assert!(matches!(insert, Err(Error::Validation(_))));
    assert!(matches!(
        db.add_values("Links", &["Ghost", "x", "Nope", "y"]),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        db.delete_column("Links", "table2"),
        Err(Error::Validation(_))
    ));

    assert_eq!(db.foreign_keys().unwrap().len(), 1);
    assert_eq!(db.dump().unwrap(), before);
}

#[test]
fn test_keyword_and_id_column_names_rejected() {
    let (_dir, db) = open_db();

    assert!(matches!(
        db.create_table("T", &["values"]),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        db.create_table("Select", &["name"]),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        db.create_table("T", &["name", "id"]),
        Err(Error::Validation(_))
    ));
    assert!(db.list_tables().unwrap().is_empty());
}
