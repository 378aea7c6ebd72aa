//! Configuration resolved into a working `Db`.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use sandpool_config::{Backend, EnvConfig, PoolConfig};
use sandpool_db::Db;
use sandpool_store::SqliteStore;
use sandpool_types::{Account, AccountStatus};

fn env(pairs: &[(&str, &str)]) -> EnvConfig<HashMap<String, String>> {
    EnvConfig::new(
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    )
}

#[test]
fn config_file_and_env_drive_table_names() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
        [store]
        path = "${POOL_DIR}/nested/pool.db"

        [tables]
        accounts = "Accounts-file"
        scan_page_size = 3
        "#,
    )
    .unwrap();

    let pool_dir = dir.path().display().to_string();
    let settings = PoolConfig::load_from(&config_path)
        .unwrap()
        .resolve(&env(&[("POOL_DIR", pool_dir.as_str()), ("LEASE_DB", "Leases-env")]))
        .unwrap();
    assert_eq!(settings.db.account_table, "Accounts-file");
    assert_eq!(settings.db.lease_table, "Leases-env");
    assert_eq!(settings.db.scan_page_size, 3);

    let Backend::Sqlite { path, options } = &settings.backend else {
        panic!("expected sqlite backend, got {:?}", settings.backend);
    };
    assert_eq!(path, &dir.path().join("nested").join("pool.db"));

    let db = Db::new(Arc::new(SqliteStore::open(path, options).unwrap()), &settings.db);
    db.accounts()
        .put(&Account::new("1", AccountStatus::Ready))
        .unwrap();
    assert_eq!(db.account_table().name(), "Accounts-file");
    assert!(path.exists());

    // Same file, default table names: a different logical table.
    let other = Db::new(
        Arc::new(SqliteStore::open(path, options).unwrap()),
        &Default::default(),
    );
    assert!(other.accounts().list().unwrap().is_empty());
}
