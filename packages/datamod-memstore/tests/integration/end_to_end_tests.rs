//! End-to-end workflows: data mod context over the memory store.

use std::sync::Arc;

use anyhow::Result;
use ntest::timeout;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use datamod_core::{
    DataModContext, DataModError, DataSet, EntityDescriptor, FieldMapping, SeedData, SeedEntry,
    StaticBridge,
};
use datamod_memstore::MemoryStore;

fn data(value: Value) -> DataSet {
    value.as_object().cloned().unwrap()
}

fn address_defaults(ctx: &DataModContext, _data: &DataSet) -> datamod_core::Result<DataSet> {
    let user_id = ctx
        .resolve("User")?
        .get_required_value("id", Some("create or select a user before an address"))?;
    Ok(data(json!({ "user": user_id, "town": "Birmingham", "postcode": "B23 7QQ" })))
}

fn setup() -> (Arc<MemoryStore>, DataModContext) {
    let store = Arc::new(MemoryStore::new());
    let ctx = DataModContext::new(store.clone());

    ctx.register_entity(
        EntityDescriptor::new(
            "DataMod::User",
            "User",
            FieldMapping::new()
                .with("id", "id")
                .with("name", "forename")
                .with("dob", "dob")
                .with_passthrough("hobby"),
        )
        .with_seed_data(SeedData::new(vec![
            SeedEntry::own(json!({"name": "Wahab", "dob": "1985-01-01"})),
            SeedEntry::for_table("PostCode", json!({"code": "B237QQ"})),
        ])),
    );
    ctx.register_entity(
        EntityDescriptor::new(
            "DataMod::Address",
            "Address",
            FieldMapping::new()
                .with("id", "id")
                .with("user", "user_id")
                .with("town", "town")
                .with("postcode", "postcode"),
        )
        .with_defaults(address_defaults),
    );

    (store, ctx)
}

#[test]
#[timeout(5000)]
fn test_fixture_lifecycle() -> Result<()> {
    let (store, ctx) = setup();
    let user = ctx.resolve("User")?;

    let first = user.create_fixture(&data(json!({"name": "Abdul", "dob": "1989-05-10"})), Some("name"))?;
    let second = user.create_fixture(&data(json!({"name": "Abdul", "dob": "1990-05-10"})), Some("name"))?;
    assert_ne!(first, second);

    let rows = store.snapshot()["User"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["dob"], json!("1990-05-10"));

    user.assert_exists(&data(json!({"name": "Abdul"})))?;
    user.truncate()?;
    user.assert_not_exists(&data(json!({"name": "Abdul"})))?;
    Ok(())
}

#[test]
fn test_address_defaults_use_current_user() -> Result<()> {
    let (store, ctx) = setup();

    let err = ctx
        .resolve("Address")?
        .create_fixture(&data(json!({"town": "London"})), None)
        .unwrap_err();
    assert!(matches!(err, DataModError::RequiredValueNotFound { .. }));

    let user_id = ctx
        .resolve("User")?
        .create_fixture(&data(json!({"name": "Abdul"})), Some("name"))?;
    ctx.resolve("Address")?
        .create_fixture(&data(json!({"town": "London"})), None)?;

    assert_eq!(
        store.snapshot()["Address"],
        json!([{"id": 1, "user_id": user_id, "town": "London", "postcode": "B23 7QQ"}])
    );
    Ok(())
}

#[test]
fn test_get_single_and_column() -> Result<()> {
    let (_store, ctx) = setup();
    let user = ctx.resolve("User")?;
    user.create_fixture(&data(json!({"name": "Abdul", "dob": "1989-05-10", "hobby": "chess"})), None)?;
    user.create_fixture(&data(json!({"name": "Wahab", "dob": "1985-01-01"})), None)?;

    let row = user.get_single(&data(json!({"name": "Wahab"})))?;
    assert_eq!(
        row,
        data(json!({"id": 2, "name": "Wahab", "dob": "1985-01-01", "hobby": null}))
    );

    assert_eq!(
        user.get_column("dob", &data(json!({"name": "Abdul"})))?,
        Some(json!("1989-05-10"))
    );
    assert_eq!(user.get_column("dob", &data(json!({"name": "Nobody"})))?, None);
    Ok(())
}

#[test]
fn test_session_restores_saved_row() -> Result<()> {
    let (_store, ctx) = setup();
    let user = ctx.resolve("User")?;
    user.create_fixture(&data(json!({"name": "Abdul"})), None)?;
    user.save_session("id")?;

    user.create_fixture(&data(json!({"name": "Wahab"})), None)?;
    assert_eq!(user.get_value("name")?, Some(json!("Wahab")));

    user.restore_session()?;
    assert_eq!(user.get_value("name")?, Some(json!("Abdul")));
    Ok(())
}

#[test]
fn test_seed_data_and_sub_select() -> Result<()> {
    let (store, ctx) = setup();
    assert_eq!(ctx.insert_all_seed_data()?, 2);

    let user = ctx.resolve("User")?;
    let reference = user.sub_select("id", &data(json!({"name": "Wahab"})))?;
    assert_eq!(reference, "[User.id|forename:Wahab]");

    let code = ctx.raw_sub_select("PostCode", "code", &data(json!({"id": 1})))?;
    ctx.resolve("Address")?.insert(&data(json!({
        "user": reference,
        "town": "Birmingham",
        "postcode": code,
    })))?;

    assert_eq!(
        store.snapshot()["Address"],
        json!([{"id": 1, "user_id": 1, "town": "Birmingham", "postcode": "B237QQ"}])
    );
    Ok(())
}

#[test]
fn test_sub_select_on_value_with_comma() -> Result<()> {
    let (store, ctx) = setup();
    let address = ctx.resolve("Address")?;
    address.insert(&data(json!({"user": 1, "town": "Leeds, West Yorkshire"})))?;

    let reference = address.sub_select("id", &data(json!({"town": "Leeds, West Yorkshire"})))?;
    assert_eq!(reference, r"[Address.id|town:Leeds\, West Yorkshire]");

    ctx.register_entity(EntityDescriptor::new(
        "DataMod::Resident",
        "Resident",
        FieldMapping::new()
            .with("name", "name")
            .with("address", "address_id"),
    ));
    ctx.resolve("Resident")?
        .create_fixture(&data(json!({"name": "Abdul", "address": reference})), Some("name"))?;

    assert_eq!(
        store.snapshot()["Resident"],
        json!([{"id": 1, "name": "Abdul", "address_id": 1}])
    );
    Ok(())
}

#[test]
fn test_reference_like_name_round_trips() -> Result<()> {
    let (_store, ctx) = setup();
    let user = ctx.resolve("User")?;
    user.insert(&data(json!({"name": "[admin|root]"})))?;

    assert_eq!(
        user.get_column("name", &data(json!({"name": "[admin|root]"})))?,
        Some(json!("[admin|root]"))
    );
    Ok(())
}

#[test]
fn test_keyword_names_last_selected_value() -> Result<()> {
    let (store, ctx) = setup();
    let user = ctx.resolve("User")?;
    user.create_fixture(&data(json!({"name": "Abdul"})), None)?;

    let keyword = user.keyword("name")?;
    assert_eq!(keyword, "{User.forename}");

    let qualified = keyword.trim_start_matches('{').trim_end_matches('}');
    assert_eq!(
        datamod_core::Store::value_by_qualified_name(store.as_ref(), qualified)?,
        json!("Abdul")
    );
    Ok(())
}

#[test]
fn test_bridged_entity_over_real_store() -> Result<()> {
    let (store, ctx) = setup();
    ctx.register_entity(
        EntityDescriptor::new(
            "DataMod::Profile",
            "Profile",
            FieldMapping::new().with("id", "id").with("name", "name"),
        )
        .bridged("Profile"),
    );
    ctx.register_bridge(StaticBridge::new("legacy").with_class(
        "Profile",
        "tbl_member",
        FieldMapping::new().with("id", "member_id").with("name", "member_name"),
    ))?;

    let profile = ctx.resolve("Profile")?;
    profile.create_fixture(&data(json!({"id": 40, "name": "Abdul"})), Some("name"))?;

    assert_eq!(
        store.snapshot()["tbl_member"],
        json!([{"id": 1, "member_id": 40, "member_name": "Abdul"}])
    );
    assert!(store.database().with_table("Profile", |_| ()).is_err());
    Ok(())
}

#[test]
fn test_update_and_delete_through_mapping() -> Result<()> {
    let (_store, ctx) = setup();
    let user = ctx.resolve("User")?;
    user.create_fixture(&data(json!({"name": "Abdul", "dob": "1989-05-10"})), None)?;

    user.update(&data(json!({"dob": "2000-01-01"})), &data(json!({"name": "Abdul"})))?;
    user.assert_exists(&data(json!({"dob": "2000-01-01"})))?;

    user.delete(&data(json!({"name": "Abdul"})))?;
    let err = user.assert_exists(&data(json!({"name": "Abdul"}))).unwrap_err();
    assert!(matches!(err, DataModError::Store(_)));
    Ok(())
}
