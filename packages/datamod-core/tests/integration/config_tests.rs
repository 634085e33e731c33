//! Context construction from TOML configuration.

use std::io::Write;

use anyhow::Result;
use ntest::timeout;
use serde_json::json;
use tempfile::NamedTempFile;

use datamod_core::config::DataModConfig;
use datamod_core::{DataModContext, DataModError};

use super::helpers::{data, Call, RecordingStore};

const CONFIG: &str = r#"
default_namespace = "App::"
truncate_column = "uid"

[connection]
engine = "memory"
dbname = "fixtures"

[data_mod_mapping]
person = "App::User"

[[entities]]
name = "App::User"
base_table = "users"
mapping = { uid = "uid", name = "forename", hobby = "*" }
seed = [{ data = { name = "Wahab" } }]

[[entities]]
name = "App::Address"
base_table = "addresses"
mapping = { uid = "uid", town = "town", postcode = "postcode" }
defaults = { postcode = "B23 7QQ" }

[[entities]]
name = "App::Profile"
base_table = "profiles"
mapping = { uid = "uid" }
bridged_class = "Profile"

[bridge]
name = "legacy"

[bridge.classes.Profile]
base_table = "tbl_member"
mapping = { uid = "member_id" }
"#;

#[test]
#[timeout(5000)]
fn test_context_from_config_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(CONFIG.as_bytes())?;

    let config = DataModConfig::from_file(file.path())?;
    let store = RecordingStore::new();
    let ctx = DataModContext::from_config(&config, store.clone())?;

    assert_eq!(ctx.registry().identifiers().len(), 3);
    assert_eq!(ctx.resolve("person")?.name(), "App::User");
    assert_eq!(ctx.resolve("Address")?.name(), "App::Address");
    assert_eq!(ctx.resolve("Profile")?.layout()?.base_table, "tbl_member");
    assert_eq!(ctx.truncate_column(), "uid");
    Ok(())
}

#[test]
fn test_config_defaults_and_seed_flow_through() -> Result<()> {
    let config = DataModConfig::from_toml(CONFIG)?;
    let store = RecordingStore::new();
    let ctx = DataModContext::from_config(&config, store.clone())?;

    ctx.resolve("Address")?
        .create_fixture(&data(json!({"town": "London"})), None)?;
    ctx.resolve("person")?.insert_seed_data()?;
    ctx.resolve("person")?.truncate()?;

    assert_eq!(
        store.calls(),
        vec![
            Call::Insert(
                "addresses".to_string(),
                data(json!({"postcode": "B23 7QQ", "town": "London"}))
            ),
            Call::Insert("users".to_string(), data(json!({"forename": "Wahab"}))),
            Call::Delete("users".to_string(), data(json!({"uid": "!NULL"}))),
        ]
    );
    Ok(())
}

#[test]
fn test_config_with_incomplete_bridge_rejected() {
    let broken = CONFIG.replace("[bridge.classes.Profile]", "[bridge.classes.Other]");
    let config = DataModConfig::from_toml(&broken).unwrap();

    let err = DataModContext::from_config(&config, RecordingStore::new()).unwrap_err();
    assert!(matches!(err, DataModError::InvalidBridge { .. }));
}
