#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::diagnostics::DiagnosticKind;
use crate::source::ProjectLayout;
use http::Method;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const RECORDS: &str = r#"
package: users
records:
  - name: GetRequest
    fields:
      - { name: ID, type: string, tags: { url: id } }
  - name: User
    fields:
      - { name: Name, type: string }
"#;

fn project(files: &[(&str, &str)]) -> (TempDir, RunContext) {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let layout = ProjectLayout::new(dir.path(), "example.com/app");
    (dir, RunContext::new(layout))
}

fn resolve_file(ctx: &mut RunContext, path: &Path) -> Result<Option<ServiceModel>, ResolveError> {
    let unit = ctx.load_unit(path)?;
    resolve_service(ctx, &unit)
}

fn users_service(name_arg: &str, route_arg: &str, methods: &str) -> String {
    format!(
        r#"
package: users
interfaces:
  - name: UserService
    annotations: ['@service({name_arg}{route_arg})']
    methods:
{methods}
functions:
  - {{ name: New, results: [{{ type: UserService }}] }}
"#
    )
}

const GET_METHOD: &str = r#"      - name: Get
        annotations: ['@http(method="get", route="/{id}")']
        params: [{ type: context.Context }, { type: GetRequest }]
        results: [{ type: "*User" }, { type: error }]"#;

#[test]
fn test_unit_without_service_is_none() {
    let (dir, mut ctx) = project(&[("users/records.yaml", RECORDS)]);
    let found = resolve_file(&mut ctx, &dir.path().join("users/records.yaml")).unwrap();
    assert!(found.is_none());
    assert!(ctx.diagnostics().is_empty());
}

#[test]
fn test_resolves_identifier_route_and_endpoints() {
    let svc = users_service("", r#"route="/api/users/""#, GET_METHOD);
    let (dir, mut ctx) = project(&[
        ("users/records.yaml", RECORDS),
        ("users/service.yaml", svc.as_str()),
    ]);
    let model = resolve_file(&mut ctx, &dir.path().join("users/service.yaml"))
        .unwrap()
        .unwrap();

    assert_eq!(model.identifier, "user_service");
    assert_eq!(model.base_route, "/api/users");
    assert_eq!(model.interface, "UserService");
    assert_eq!(model.import_path, "example.com/app/users");
    assert_eq!(model.endpoints.len(), 1);

    let routes: Vec<_> = model.routes().into_iter().map(|r| r.path).collect();
    assert_eq!(routes, vec!["/api/users/{id}", "/api/users/{id}/"]);
}

#[test]
fn test_endpoint_without_route_binds_base_with_and_without_slash() {
    let list = r#"      - name: List
        annotations: ['@http(method="get")']
        params: [{ type: context.Context }]
        results: [{ type: error }]"#;
    let svc = users_service("", r#"route="/users""#, list);
    let (dir, mut ctx) = project(&[("users/service.yaml", svc.as_str())]);
    let model = resolve_file(&mut ctx, &dir.path().join("users/service.yaml"))
        .unwrap()
        .unwrap();

    let routes: Vec<_> = model.routes().into_iter().map(|r| r.path).collect();
    assert_eq!(routes, vec!["/users/", "/users"]);
}

#[test]
fn test_root_endpoint_of_root_service_is_listed_once() {
    let list = r#"      - name: Index
        annotations: ['@http(method="get", route="/")']
        params: [{ type: context.Context }]
        results: [{ type: error }]"#;
    let svc = users_service("", r#"route="/""#, list);
    let (dir, mut ctx) = project(&[("users/service.yaml", svc.as_str())]);
    let model = resolve_file(&mut ctx, &dir.path().join("users/service.yaml"))
        .unwrap()
        .unwrap();

    let http = model.endpoint("Index").unwrap().http.as_ref().unwrap();
    assert_eq!(http.routes.len(), 2);
    let routes: Vec<_> = model.routes().into_iter().map(|r| r.path).collect();
    assert_eq!(routes, vec!["/"]);
}

#[test]
fn test_missing_route_defaults_to_identifier_with_warning() {
    let svc = users_service(r#"name="Accounts""#, "", GET_METHOD);
    let (dir, mut ctx) = project(&[
        ("users/records.yaml", RECORDS),
        ("users/service.yaml", svc.as_str()),
    ]);
    let model = resolve_file(&mut ctx, &dir.path().join("users/service.yaml"))
        .unwrap()
        .unwrap();
    assert_eq!(model.identifier, "accounts");
    assert_eq!(model.base_route, "/accounts");
    assert_eq!(ctx.diagnostics().of_kind(DiagnosticKind::MissingRoute).count(), 1);
}

#[test]
fn test_missing_constructor_is_fatal() {
    let svc = users_service("", "", GET_METHOD).replace("name: New", "name: Make");
    let (dir, mut ctx) = project(&[
        ("users/records.yaml", RECORDS),
        ("users/service.yaml", svc.as_str()),
    ]);
    let err = resolve_file(&mut ctx, &dir.path().join("users/service.yaml")).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("user_service"));
    assert!(err.to_string().contains("New"));
}

#[test]
fn test_unannotated_and_unexported_methods_are_dropped() {
    let methods = format!(
        r#"{GET_METHOD}
      - name: Count
        params: [{{ type: context.Context }}]
        results: [{{ type: error }}]
      - name: helper
        annotations: ['@grpc()']
        params: [{{ type: context.Context }}]
        results: [{{ type: error }}]
      - name: internal
        params: [{{ type: context.Context }}]
        results: [{{ type: error }}]"#
    );
    let svc = users_service("", r#"route="/users""#, &methods);
    let (dir, mut ctx) = project(&[
        ("users/records.yaml", RECORDS),
        ("users/service.yaml", svc.as_str()),
    ]);
    let model = resolve_file(&mut ctx, &dir.path().join("users/service.yaml"))
        .unwrap()
        .unwrap();

    let names: Vec<_> = model.endpoints.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Get"]);
    let ignored: Vec<_> = ctx
        .diagnostics()
        .of_kind(DiagnosticKind::IgnoredMethod)
        .map(|d| d.location.as_str())
        .collect();
    assert_eq!(ignored, vec!["user_service.Count", "user_service.helper"]);
}

#[test]
fn test_duplicate_route_within_service_names_both_endpoints() {
    let methods = format!(
        r#"{GET_METHOD}
      - name: Fetch
        annotations: ['@http(method="GET", route="/{{id}}/")']
        params: [{{ type: context.Context }}, {{ type: GetRequest }}]
        results: [{{ type: error }}]"#
    );
    let svc = users_service("", r#"route="/users""#, &methods);
    let (dir, mut ctx) = project(&[
        ("users/records.yaml", RECORDS),
        ("users/service.yaml", svc.as_str()),
    ]);
    let err = resolve_file(&mut ctx, &dir.path().join("users/service.yaml")).unwrap_err();
    let text = err.to_string();
    assert!(err.is_validation());
    assert!(text.contains("'Get'") && text.contains("'Fetch'"), "{text}");
}

#[test]
fn test_last_service_annotation_wins() {
    let svc = r#"
package: users
interfaces:
  - name: UserService
    annotations: ['@service(route="/first")', '@service(route="/second")']
functions:
  - { name: New, results: [{ type: UserService }] }
"#;
    let (dir, mut ctx) = project(&[("users/service.yaml", svc)]);
    let model = resolve_file(&mut ctx, &dir.path().join("users/service.yaml"))
        .unwrap()
        .unwrap();
    assert_eq!(model.base_route, "/second");
    assert_eq!(
        ctx.diagnostics()
            .of_kind(DiagnosticKind::DuplicateAnnotation)
            .count(),
        1
    );
}

#[test]
fn test_endpoint_failure_aborts_service() {
    let methods = r#"      - name: Get
        annotations: ['@http(method="get", route="/x")']
        params: [{ type: context.Context }, { type: Missing }]
        results: [{ type: error }]"#;
    let svc = users_service("", r#"route="/users""#, methods);
    let (dir, mut ctx) = project(&[("users/service.yaml", svc.as_str())]);
    let err = resolve_file(&mut ctx, &dir.path().join("users/service.yaml")).unwrap_err();
    assert!(err.to_string().starts_with("UserService.Get: "));
    assert!(err.is_not_found());
}

#[test]
fn test_batch_rejects_overlapping_full_routes() {
    let a = r#"
package: a
interfaces:
  - name: Alpha
    annotations: ['@service(route="/")']
    methods:
      - name: Ping
        annotations: ['@http(method="get", route="/beta/ping")']
        params: [{ type: context.Context }]
        results: [{ type: error }]
functions:
  - { name: New, results: [{ type: Alpha }] }
"#;
    let b = r#"
package: b
interfaces:
  - name: Beta
    annotations: ['@service(route="/beta")']
    methods:
      - name: Ping
        annotations: ['@http(method="get", route="/ping")']
        params: [{ type: context.Context }]
        results: [{ type: error }]
functions:
  - { name: New, results: [{ type: Beta }] }
"#;
    let (dir, mut ctx) = project(&[("a/svc.yaml", a), ("b/svc.yaml", b)]);
    let files = vec![dir.path().join("a/svc.yaml"), dir.path().join("b/svc.yaml")];
    let err = resolve_batch(&mut ctx, &files).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("alpha.Ping") && text.contains("beta.Ping"), "{text}");
    assert!(text.contains(Method::GET.as_str()));
}

#[test]
fn test_fresh_context_does_not_see_previous_run() {
    let svc = users_service("", r#"route="/users""#, GET_METHOD);
    let (dir, mut ctx) = project(&[
        ("users/records.yaml", RECORDS),
        ("users/service.yaml", svc.as_str()),
    ]);
    let files = vec![dir.path().join("users/service.yaml")];
    let first = resolve_batch(&mut ctx, &files).unwrap();
    assert_eq!(first[0].model.endpoints[0].response.as_ref().unwrap().record.fields.len(), 1);

    let updated = RECORDS.replace(
        "      - { name: Name, type: string }",
        "      - { name: Name, type: string }\n      - { name: Email, type: string }",
    );
    fs::write(dir.path().join("users/records.yaml"), updated).unwrap();

    let mut next = RunContext::new(ctx.layout().clone());
    let second = resolve_batch(&mut next, &files).unwrap();
    assert_eq!(second[0].model.endpoints[0].response.as_ref().unwrap().record.fields.len(), 2);
}
