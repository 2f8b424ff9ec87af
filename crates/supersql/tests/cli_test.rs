
use predicates::prelude::*;
use setup::*;

#[test]
fn test_select_table_mode() {
    let dir = tempfile::tempdir().unwrap();
    let (users, cars) = write_fixtures(dir.path());

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .args(table_args(&users, &cars))
        .arg("SELECT username FROM user");

    let expected = "username\n--------\nnam\nbi\n\nTotal: 2 rows\n";
    cmd.assert().success().stdout(expected);
}

#[test]
fn test_join_json_mode() {
    let dir = tempfile::tempdir().unwrap();
    let (users, cars) = write_fixtures(dir.path());

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .args(table_args(&users, &cars))
        .args(["--mode", "json"])
        .arg("SELECT u.username, c.name FROM user u JOIN car c ON u.id = c.owner WHERE c.id > 2");

    let expected = concat!(
        r#"[{"username":"nam","name":"toyota lexus"},{"username":"bi","name":"honda civic"}]"#,
        "\n"
    );
    cmd.assert().success().stdout(expected);
}

#[test]
fn test_ndjson_mode_with_params() {
    let dir = tempfile::tempdir().unwrap();
    let (users, cars) = write_fixtures(dir.path());

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .args(table_args(&users, &cars))
        .args(["--mode", "ndjson", "-p", "1"])
        .arg("SELECT id, owner FROM car WHERE owner = %d ORDER BY id DESC LIMIT 2");

    let expected = "{\"id\":3,\"owner\":1}\n{\"id\":2,\"owner\":1}\n";
    cmd.assert().success().stdout(expected);
}

#[test]
fn test_mutations_write_back() {
    let dir = tempfile::tempdir().unwrap();
    let (users, cars) = write_fixtures(dir.path());

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .args(table_args(&users, &cars))
        .arg("INSERT INTO user (id, username, pass) VALUES (3, 'tom', 'x'); UPDATE user SET pass = 'secret' WHERE id = 1; DELETE FROM user WHERE id = 2;");

    cmd.assert()
        .success()
        .stdout("Affected rows: 1\nAffected rows: 1\nAffected rows: 1\n");

    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&users).unwrap()).unwrap();
    assert_eq!(
        serde_json::json!([
            {"id": 1, "username": "nam", "pass": "secret"},
            {"id": 3, "username": "tom", "pass": "x"},
        ]),
        on_disk
    );
}

#[test]
fn test_statements_from_stdin_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let (users, cars) = write_fixtures(dir.path());

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .args(table_args(&users, &cars))
        .args(["--mode", "json"])
        .write_stdin("SELECT count(*) AS n FROM car");
    cmd.assert().success().stdout("[{\"n\":4}]\n");

    let script = dir.path().join("script.sql");
    std::fs::write(&script, "SHOW TABLES;\nTRUNCATE TABLE car;").unwrap();

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .args(table_args(&users, &cars))
        .args(["--mode", "ndjson", "-f"])
        .arg(&script);

    let expected = concat!(
        "{\"Tables_in_database\":\"car\"}\n",
        "{\"Tables_in_database\":\"user\"}\n",
        "Affected rows: 4\n",
    );
    cmd.assert().success().stdout(expected);
    assert_eq!("[]", std::fs::read_to_string(&cars).unwrap());
}

#[test]
fn test_errors_exit_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (users, cars) = write_fixtures(dir.path());

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .args(table_args(&users, &cars))
        .arg("SELECT * FROM boat");

    cmd.assert()
        .code(1)
        .stdout("ERROR: SELECT FROM is not defined for table 'boat'\n");
}

#[test]
fn test_missing_table_file() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .arg("--table")
        .arg(format!("user={}", dir.path().join("missing.json").display()))
        .arg("SELECT 1");

    cmd.assert()
        .failure()
        .stdout(predicate::str::starts_with("ERROR: "));
}

#[test]
fn test_cache_dir_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let (users, cars) = write_fixtures(dir.path());
    let cache_dir = dir.path().join("cache");

    let mut cmd = make_cli();
    cmd.timeout(DEFAULT_TIMEOUT)
        .env("SUPERSQL_CACHE_DIR", &cache_dir)
        .args(table_args(&users, &cars))
        .args(["--cache-ttl", "car=60", "--mode", "json"])
        .arg("SELECT max(id) AS top FROM car");

    cmd.assert().success().stdout("[{\"top\":4}]\n");
    let cached: Vec<_> = std::fs::read_dir(&cache_dir).unwrap().collect();
    assert_eq!(1, cached.len());
}
