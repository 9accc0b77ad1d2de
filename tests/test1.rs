use chrono::NaiveDate;
use serde_json::json;
use sql_conduit::prelude::*;

fn open_with_schema() -> Result<SqliteSession, SqlConduitError> {
    let session = SqliteSession::builder(":memory:").open()?;
    session.store(
        "CREATE TABLE player (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            score REAL,
            active BOOLEAN,
            joined DATETIME,
            avatar BLOB,
            profile JSON
        )",
        ParamArg::None,
    )?;
    Ok(session)
}

fn count(session: &SqliteSession) -> Result<i64, SqlConduitError> {
    let rs = session.read("SELECT COUNT(*) AS cnt FROM player", ParamArg::None)?;
    Ok(*rs.rows[0].get("cnt").unwrap().as_int().unwrap())
}

#[test]
fn named_params_store_and_read_back() -> Result<(), Box<dyn std::error::Error>> {
    let session = open_with_schema()?;
    let joined = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();

    let result = session.store(
        "INSERT INTO player (id, name, score, active, joined, avatar, profile)
         VALUES (:id, :name, :score, :active, :joined, :avatar, :profile)",
        ParamArg::named(vec![
            NamedParam::inferred("id", ParamValue::Int(1)),
            NamedParam::inferred("name", ParamValue::Text("Ada".into())),
            // explicit type instead of the textual widening inference applies
            NamedParam::new("score", ParamValue::Float(87.5), StorageType::Float),
            NamedParam::inferred("active", ParamValue::Bool(true)),
            NamedParam::inferred("joined", ParamValue::Timestamp(joined)),
            NamedParam::inferred("avatar", ParamValue::Blob(vec![1, 2, 3])),
            NamedParam::inferred("profile", ParamValue::Json(json!({"level": 3}))),
        ]),
    )?;
    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_insert_id, Some(1));
    assert_eq!(result.failed_rows, 0);
    // the session-level accessor reflects the same insert
    assert_eq!(session.last_insert_id(), 1);

    let rs = session.read(
        "SELECT * FROM player WHERE id = :id",
        ParamArg::value(ParamValue::Int(1)),
    )?;
    assert_eq!(rs.len(), 1);
    let row = rs.first().unwrap();
    assert_eq!(*row.get("id").unwrap().as_int().unwrap(), 1);
    assert_eq!(row.get("name").unwrap().as_text().unwrap(), "Ada");
    assert_eq!(row.get("score").unwrap().as_float().unwrap(), 87.5);
    assert!(*row.get("active").unwrap().as_bool().unwrap());
    assert_eq!(row.get("joined").unwrap().as_timestamp().unwrap(), joined);
    assert_eq!(row.get("avatar").unwrap().as_blob().unwrap(), b"\x01\x02\x03");
    // JSON round-trips as its serialized text
    let profile: serde_json::Value =
        serde_json::from_str(row.get("profile").unwrap().as_text().unwrap())?;
    assert_eq!(profile, json!({"level": 3}));

    Ok(())
}

#[test]
fn positional_row_binds_in_template_order() -> Result<(), Box<dyn std::error::Error>> {
    let session = open_with_schema()?;
    let result = session.store(
        "INSERT INTO player (id, name, score) VALUES (:id, :name, :score)",
        ParamArg::row(vec![
            ParamValue::Int(7),
            ParamValue::Text("Grace".into()),
            ParamValue::Float(91.25),
        ]),
    )?;
    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_insert_id, Some(7));

    let rs = session.read(
        "SELECT name, score FROM player WHERE id = :id",
        ParamArg::value(ParamValue::Int(7)),
    )?;
    assert_eq!(rs.rows[0].get("name").unwrap().as_text().unwrap(), "Grace");
    assert_eq!(rs.rows[0].get("score").unwrap().as_float().unwrap(), 91.25);
    Ok(())
}

#[test]
fn updates_and_deletes_report_affected_rows_without_a_rowid()
-> Result<(), Box<dyn std::error::Error>> {
    let session = open_with_schema()?;
    for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
        session.store(
            "INSERT INTO player (id, name, active) VALUES (:id, :name, 0)",
            ParamArg::row(vec![ParamValue::Int(id), ParamValue::Text(name.into())]),
        )?;
    }

    let update = session.store(
        "UPDATE player SET active = 1 WHERE id < :cutoff",
        ParamArg::value(ParamValue::Int(3)),
    )?;
    assert_eq!(update.rows_affected, 2);
    // no rowid was generated, so none is reported
    assert_eq!(update.last_insert_id, None);

    let delete = session.store(
        "DELETE FROM player WHERE id = :id",
        ParamArg::value(ParamValue::Int(2)),
    )?;
    assert_eq!(delete.rows_affected, 1);
    assert_eq!(delete.last_insert_id, None);
    assert_eq!(count(&session)?, 2);
    Ok(())
}

#[test]
fn first_insert_into_each_fresh_table_reports_its_rowid()
-> Result<(), Box<dyn std::error::Error>> {
    let session = SqliteSession::builder(":memory:").open()?;
    session.store(
        "CREATE TABLE badge (id INTEGER PRIMARY KEY, label TEXT)",
        ParamArg::None,
    )?;
    session.store(
        "CREATE TABLE trophy (id INTEGER PRIMARY KEY, label TEXT)",
        ParamArg::None,
    )?;

    let badge = session.store(
        "INSERT INTO badge (label) VALUES (:label)",
        ParamArg::value(ParamValue::Text("first".into())),
    )?;
    assert_eq!(badge.last_insert_id, Some(1));

    // trophy's first rowid equals the one badge just produced; the report
    // must not depend on the driver rowid changing
    let trophy = session.store(
        "INSERT INTO trophy (label) VALUES (:label)",
        ParamArg::value(ParamValue::Text("second".into())),
    )?;
    assert_eq!(trophy.last_insert_id, Some(1));
    assert_eq!(session.last_insert_id(), 1);
    Ok(())
}

#[test]
fn json_input_classifies_into_parameter_shapes() -> Result<(), Box<dyn std::error::Error>> {
    let session = open_with_schema()?;

    // object with word keys -> name-keyed entries
    session.store(
        "INSERT INTO player (id, name) VALUES (:id, :name)",
        ParamArg::from_json(json!({"id": 1, "name": "Ada"}))?,
    )?;
    // plain array -> one positional row
    session.store(
        "INSERT INTO player (id, name) VALUES (:id, :name)",
        ParamArg::from_json(json!([2, "Grace"]))?,
    )?;
    // scalar -> bare value for a one-placeholder statement
    let rs = session.read(
        "SELECT name FROM player WHERE id = :id",
        ParamArg::from_json(json!(2))?,
    )?;
    assert_eq!(rs.rows[0].get("name").unwrap().as_text().unwrap(), "Grace");
    // null -> no parameters
    assert_eq!(count(&session)?, 2);
    session.store("DELETE FROM player", ParamArg::from_json(json!(null))?)?;
    assert_eq!(count(&session)?, 0);
    Ok(())
}

#[test]
fn null_values_store_as_sql_null() -> Result<(), Box<dyn std::error::Error>> {
    let session = open_with_schema()?;
    session.store(
        "INSERT INTO player (id, name, score) VALUES (:id, :name, :score)",
        ParamArg::row(vec![
            ParamValue::Int(1),
            ParamValue::Text("Ada".into()),
            ParamValue::Null,
        ]),
    )?;
    let rs = session.read(
        "SELECT score FROM player WHERE id = 1 AND score IS NULL",
        ParamArg::None,
    )?;
    assert_eq!(rs.len(), 1);
    assert!(rs.rows[0].get("score").unwrap().is_null());
    Ok(())
}

#[test]
fn validation_rejects_bad_shapes_before_the_driver() -> Result<(), Box<dyn std::error::Error>> {
    let session = open_with_schema()?;
    let insert = "INSERT INTO player (id, name) VALUES (:id, :name)";

    // too few positional values
    let err = session
        .store(insert, ParamArg::row(vec![ParamValue::Int(1)]))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(format!("{err}").contains("2 placeholder(s) but 1 value(s)"));

    // name-keyed entry for a placeholder the statement does not have
    let err = session
        .store(
            insert,
            ParamArg::named(vec![
                NamedParam::inferred("id", ParamValue::Int(1)),
                NamedParam::inferred("nickname", ParamValue::Text("x".into())),
            ]),
        )
        .unwrap_err();
    assert!(format!("{err}").contains(":name"), "got: {err}");

    // bare scalar against a two-placeholder statement
    let err = session
        .store(insert, ParamArg::value(ParamValue::Int(1)))
        .unwrap_err();
    assert!(format!("{err}").contains("exactly one placeholder"));

    // placeholders but no parameters at all
    let err = session.store(insert, ParamArg::None).unwrap_err();
    assert!(matches!(err, SqlConduitError::MissingParameters(_)));
    assert!(format!("{err}").starts_with("Missing parameters"));

    // none of the rejected calls reached the database
    assert_eq!(count(&session)?, 0);
    Ok(())
}
