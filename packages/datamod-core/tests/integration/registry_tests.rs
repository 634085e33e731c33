//! Reference resolution and bridge indirection at context level.

use std::collections::BTreeMap;

use serde_json::json;

use datamod_core::{DataModError, EntityDescriptor, FieldMapping, StaticBridge};

use super::helpers::{context, data, Call};

fn profile() -> EntityDescriptor {
    EntityDescriptor::new(
        "DataMod::Profile",
        "Profile",
        FieldMapping::new().with("id", "id").with("name", "name"),
    )
    .bridged("Profile")
}

fn legacy_bridge() -> StaticBridge {
    StaticBridge::new("legacy").with_class(
        "Profile",
        "tbl_member",
        FieldMapping::new()
            .with("id", "member_id")
            .with("name", "member_name"),
    )
}

#[test]
fn test_explicit_mapping_beats_wildcard() {
    let (_store, ctx) = context();
    ctx.register_entity(EntityDescriptor::new("Legacy::User", "tbl_user", FieldMapping::new()));
    ctx.set_mapping(BTreeMap::from([
        ("user".to_string(), "DataMod::User".to_string()),
        ("*".to_string(), "Legacy::".to_string()),
    ]));

    assert_eq!(ctx.resolve("user").unwrap().name(), "DataMod::User");
    assert_eq!(ctx.resolve("User").unwrap().name(), "Legacy::User");
}

#[test]
fn test_unknown_reference_fails() {
    let (_store, ctx) = context();
    let err = ctx.resolve("Invoice").unwrap_err();
    assert!(matches!(
        err,
        DataModError::EntityNotFound { ref identifier, .. } if identifier == "DataMod::Invoice"
    ));
    assert!(err.to_string().contains("Invoice"));
}

#[test]
fn test_entity_lookup_by_identifier() {
    let (_store, ctx) = context();
    assert_eq!(ctx.entity("DataMod::User").unwrap().name(), "DataMod::User");
    assert!(ctx.entity("User").is_err());
}

#[test]
fn test_bridge_redirects_every_operation() {
    let (store, ctx) = context();
    ctx.register_entity(profile());
    ctx.register_bridge(legacy_bridge()).unwrap();

    let profile = ctx.resolve("Profile").unwrap();
    profile
        .create_fixture(&data(json!({"name": "Abdul"})), Some("name"))
        .unwrap();
    store.set_keyword("tbl_member", "member_id", json!(9));

    assert_eq!(profile.get_value("id").unwrap(), Some(json!(9)));
    assert_eq!(profile.keyword("name").unwrap(), "{tbl_member.member_name}");
    assert_eq!(
        store.calls(),
        vec![
            Call::Delete("tbl_member".to_string(), data(json!({"member_name": "Abdul"}))),
            Call::Insert("tbl_member".to_string(), data(json!({"member_name": "Abdul"}))),
        ]
    );
}

#[test]
fn test_bridge_does_not_touch_plain_entities() {
    let (_store, ctx) = context();
    ctx.register_entity(profile());
    ctx.register_bridge(legacy_bridge()).unwrap();

    let user = ctx.resolve("User").unwrap();
    assert_eq!(user.layout().unwrap().base_table, "User");
}

#[test]
fn test_register_bridge_validates_known_bridged_entities() {
    let (_store, ctx) = context();
    ctx.register_entity(profile());

    let err = ctx
        .register_bridge(StaticBridge::new("incomplete"))
        .unwrap_err();
    assert!(matches!(err, DataModError::InvalidBridge { .. }));
    assert!(!ctx.bridge().is_registered());
}

#[test]
fn test_unregister_restores_declared_layout() {
    let (_store, ctx) = context();
    ctx.register_entity(profile());
    ctx.register_bridge(legacy_bridge()).unwrap();

    assert_eq!(
        ctx.base_table_for(ctx.resolve("Profile").unwrap().descriptor())
            .unwrap(),
        "tbl_member"
    );
    assert!(ctx.unregister_bridge());
    assert_eq!(
        ctx.base_table_for(ctx.resolve("Profile").unwrap().descriptor())
            .unwrap(),
        "Profile"
    );
    assert!(!ctx.unregister_bridge());
}

#[test]
fn test_data_mapping_for_goes_through_bridge() {
    let (_store, ctx) = context();
    ctx.register_entity(profile());
    ctx.register_bridge(legacy_bridge()).unwrap();

    let descriptor = ctx.resolve("Profile").unwrap().descriptor().clone();
    let mapping = ctx.data_mapping_for(&descriptor).unwrap();
    assert_eq!(mapping.resolve_column("Profile", "id").unwrap(), "member_id");
}
