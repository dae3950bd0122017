#![allow(clippy::unwrap_used, clippy::expect_used)]

use attrkit::{
    Action, AttrValue, AttributeError, AttributeSpec, EngineConfig, PROJECT_ID, RequestBody,
    RequestPipeline, Schema, TENANT_ID,
};
use attrkit_security::SecurityContext;
use serde_json::json;

fn routers() -> Schema {
    Schema::new("routers")
        .attribute(
            "name",
            AttributeSpec::new()
                .allow_post(true)
                .allow_put(true)
                .default_value(json!("")),
        )
        .attribute(TENANT_ID, AttributeSpec::new().allow_post(true))
        .attribute(PROJECT_ID, AttributeSpec::new().allow_post(true))
}

#[test]
fn member_gets_own_project() {
    let schema = routers();
    let config = EngineConfig::default();
    let ctx = SecurityContext::builder().project_id("p1").role("member").build();

    let mut body = RequestBody::new();
    RequestPipeline::new(&schema, &config)
        .prepare(&ctx, &mut body, Action::Create)
        .unwrap();
    assert_eq!(body.get(PROJECT_ID), AttrValue::Specified(json!("p1")));
}

#[test]
fn member_cannot_create_for_other_project() {
    let schema = routers();
    let config = EngineConfig::default();
    let ctx = SecurityContext::builder().project_id("p1").build();

    let mut body = RequestBody::new();
    body.insert(PROJECT_ID, json!("p2"));
    let err = RequestPipeline::new(&schema, &config)
        .prepare(&ctx, &mut body, Action::Create)
        .unwrap_err();
    assert!(matches!(err, AttributeError::BadRequest { .. }));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn service_role_can_create_for_other_project() {
    let schema = routers();
    let config = EngineConfig::default();
    let ctx = SecurityContext::builder()
        .project_id("p1")
        .role("service")
        .service_roles(config.service_roles.clone())
        .build();

    let mut body = RequestBody::new();
    body.insert(TENANT_ID, json!("p2"));
    RequestPipeline::new(&schema, &config)
        .prepare(&ctx, &mut body, Action::Create)
        .unwrap();
    assert_eq!(body.get(PROJECT_ID), AttrValue::Specified(json!("p2")));
}

#[test]
fn anonymous_create_requires_project() {
    let schema = routers();
    let config = EngineConfig::default();
    let err = RequestPipeline::new(&schema, &config)
        .prepare(&SecurityContext::anonymous(), &mut RequestBody::new(), Action::Create)
        .unwrap_err();
    assert!(matches!(err, AttributeError::BadRequest { .. }));
}
