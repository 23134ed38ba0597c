#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::model::{Endpoint, Field, RecordRef};
use crate::source::{annotation::parse_annotations, Import, ProjectLayout, TypeRef};
use std::fs;
use std::path::PathBuf;

fn local() -> Import {
    Import::new("", "example.com/app/add", Some(PathBuf::from("/nonexistent/add")))
}

fn record(name: &str, import: &Import, fields: &[(&str, &str)]) -> Arc<RecordType> {
    record_with_tags(name, import, fields, &[])
}

fn record_with_tags(
    name: &str,
    import: &Import,
    fields: &[(&str, &str)],
    tags: &[(&str, &str, &str)],
) -> Arc<RecordType> {
    let externals = vec![Import::new("ext", "example.org/ext", None)];
    let fields = fields
        .iter()
        .map(|(field, ty)| {
            let mut ty = TypeRef::parse(ty, &externals);
            if ty.import.is_none() && ty.package.is_none() && ty.is_exported() {
                ty.import = Some(import.clone());
            }
            Field {
                name: field.to_string(),
                array: ty.array,
                ty,
                tags: tags
                    .iter()
                    .filter(|(f, _, _)| f == field)
                    .map(|(_, k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        })
        .collect();
    let package = import.path.rsplit('/').next().unwrap_or_default().to_string();
    Arc::new(RecordType {
        name: name.to_string(),
        package,
        import: import.clone(),
        fields,
    })
}

fn rec_ref(record: &Arc<RecordType>) -> RecordRef {
    let mut ty = TypeRef::parse(&record.name, &[]);
    ty.import = Some(record.import.clone());
    RecordRef {
        ty,
        record: Arc::clone(record),
    }
}

fn endpoint(
    name: &str,
    request: Option<&Arc<RecordType>>,
    response: Option<&Arc<RecordType>>,
    grpc: bool,
) -> Endpoint {
    let lines = if grpc { vec!["@grpc()".to_string()] } else { Vec::new() };
    Endpoint {
        name: name.to_string(),
        params: Vec::new(),
        results: Vec::new(),
        request: request.map(rec_ref),
        response: response.map(rec_ref),
        http: None,
        annotations: parse_annotations(&lines, "service"),
    }
}

fn service(endpoints: Vec<Endpoint>) -> ServiceModel {
    ServiceModel {
        identifier: "add".to_string(),
        base_route: "/add".to_string(),
        interface: "Service".to_string(),
        package: "add".to_string(),
        import_path: "example.com/app/add".to_string(),
        source: PathBuf::from("add/service.yaml"),
        endpoints,
        annotations: Vec::new(),
    }
}

fn context() -> RunContext {
    RunContext::new(ProjectLayout::new("/nonexistent", "example.com/app"))
}

fn field_summary(msg: &SchemaMessage) -> Vec<(String, String, u32, bool)> {
    msg.fields
        .iter()
        .map(|f| (f.name.clone(), f.wire_type.clone(), f.number, f.repeated))
        .collect()
}

#[test]
fn test_no_grpc_endpoint_yields_none() {
    let svc = service(vec![endpoint("Sum", None, None, false)]);
    assert!(synthesize(&mut context(), &svc).unwrap().is_none());
}

#[test]
fn test_sum_request_and_reply_wrapper() {
    let req = record("SumRequest", &local(), &[("A", "int"), ("B", "int")]);
    let res = record("SumResponse", &local(), &[("V", "int")]);
    let svc = service(vec![endpoint("Sum", Some(&req), Some(&res), true)]);

    let set = synthesize(&mut context(), &svc).unwrap().unwrap();
    let names: Vec<_> = set.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["SumRequest", "SumResponse", "SumReply"]);

    let request = set.find("SumRequest").unwrap();
    assert_eq!(
        field_summary(request),
        vec![
            ("a".to_string(), "int64".to_string(), 1, false),
            ("b".to_string(), "int64".to_string(), 2, false),
        ]
    );

    let reply = set.find("SumReply").unwrap();
    assert_eq!(reply.fields[0].name, "err");
    assert_eq!(reply.fields[0].wire_type, "string");
    assert_eq!(reply.fields[0].number, 1);
    assert_eq!(reply.fields[1].name, "response");
    assert_eq!(reply.fields[1].wire_type, "SumResponse");
    assert_eq!(reply.fields[1].number, 2);

    assert_eq!(set.methods.len(), 1);
    assert_eq!(set.message(set.methods[0].request).name, "SumRequest");
    assert_eq!(set.message(set.methods[0].response).name, "SumReply");
}

#[test]
fn test_shared_response_is_emitted_once() {
    let res = record("Result", &local(), &[("V", "string")]);
    let svc = service(vec![
        endpoint("First", None, Some(&res), true),
        endpoint("Second", None, Some(&res), true),
    ]);
    let set = synthesize(&mut context(), &svc).unwrap().unwrap();

    assert_eq!(set.messages.iter().filter(|m| m.name == "Result").count(), 1);
    let first = set.find("FirstReply").unwrap().field("response").unwrap().message;
    let second = set.find("SecondReply").unwrap().field("response").unwrap().message;
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_empty_message_is_shared() {
    let svc = service(vec![
        endpoint("Ping", None, None, true),
        endpoint("Pong", None, None, true),
    ]);
    let set = synthesize(&mut context(), &svc).unwrap().unwrap();
    assert_eq!(set.messages.iter().filter(|m| m.name.starts_with("Empty")).count(), 1);
    assert_eq!(set.methods[0].request, set.methods[1].request);
    // no response record: only the error field
    assert_eq!(set.find("PingReply").unwrap().fields.len(), 1);
}

#[test]
fn test_self_reference_terminates() {
    let node = record(
        "Node",
        &local(),
        &[("Value", "int"), ("Next", "*Node"), ("Children", "[]Node")],
    );
    let svc = service(vec![endpoint("Walk", Some(&node), None, true)]);
    let set = synthesize(&mut context(), &svc).unwrap().unwrap();

    let id = set.message_for(&node.identity()).unwrap();
    let msg = set.message(id);
    assert_eq!(msg.fields.len(), 3);
    assert_eq!(msg.field("next").unwrap().message, Some(id));
    assert_eq!(msg.field("next").unwrap().wire_type, "Node");
    assert!(msg.field("children").unwrap().repeated);
}

#[test]
fn test_skipped_fields_do_not_consume_numbers() {
    let req = record_with_tags(
        "Upload",
        &local(),
        &[
            ("Name", "string"),
            ("secret", "string"),
            ("Internal", "string"),
            ("Data", "[]byte"),
            ("Remote", "ext.Thing"),
            ("Ratio", "float32"),
            ("Tags", "[]string"),
        ],
        &[("Internal", "grpc", "-")],
    );
    let svc = service(vec![endpoint("Put", Some(&req), None, true)]);
    let mut ctx = context();
    let set = synthesize(&mut ctx, &svc).unwrap().unwrap();

    assert_eq!(
        field_summary(set.find("Upload").unwrap()),
        vec![
            ("name".to_string(), "string".to_string(), 1, false),
            ("data".to_string(), "bytes".to_string(), 2, false),
            ("ratio".to_string(), "float".to_string(), 3, false),
            ("tags".to_string(), "string".to_string(), 4, true),
        ]
    );
    let warned: Vec<_> = ctx
        .diagnostics()
        .of_kind(crate::diagnostics::DiagnosticKind::UnsupportedType)
        .map(|d| d.location.as_str())
        .collect();
    assert_eq!(warned, vec!["add.Upload.Remote"]);

    // same input, same numbering
    let again = synthesize(&mut context(), &svc).unwrap().unwrap();
    assert_eq!(
        field_summary(again.find("Upload").unwrap()),
        field_summary(set.find("Upload").unwrap())
    );
}

#[test]
fn test_same_alias_in_different_packages_gets_suffix() {
    let v1a = Import::new("v1", "example.com/app/a/v1", None);
    let v1b = Import::new("v1", "example.com/app/b/v1", None);
    let first = record("User", &v1a, &[("Name", "string")]);
    let second = record("User", &v1b, &[("Email", "string")]);
    let svc = service(vec![
        endpoint("One", Some(&first), None, true),
        endpoint("Two", Some(&second), None, true),
    ]);
    let set = synthesize(&mut context(), &svc).unwrap().unwrap();
    assert!(set.find("V1User").is_some());
    assert!(set.find("V1User_1").is_some());
    assert_eq!(set.find("V1User_1").unwrap().fields[0].name, "email");
}

#[test]
fn test_mutual_recursion_through_type_resolver() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("org")).unwrap();
    fs::write(
        dir.path().join("org/types.yaml"),
        r#"
package: org
records:
  - name: Team
    fields:
      - { name: Lead, type: "*Member" }
  - name: Member
    fields:
      - { name: Team, type: "*Team" }
      - { name: Name, type: string }
"#,
    )
    .unwrap();
    let layout = ProjectLayout::new(dir.path(), "example.com/app");
    let org_dir = layout.import_dir("example.com/app/org");
    let import = Import::new("org", "example.com/app/org", org_dir);
    let mut ctx = RunContext::new(layout);

    let mut ty = TypeRef::parse("org.Team", &[import.clone()]);
    ty.import = Some(import);
    let team = ctx.resolve_type(&ty).unwrap();
    let svc = service(vec![endpoint("Get", Some(&team), None, true)]);
    let set = synthesize(&mut ctx, &svc).unwrap().unwrap();

    let team_msg = set.find("OrgTeam").unwrap();
    let member_msg = set.find("OrgMember").unwrap();
    assert_eq!(team_msg.fields[0].wire_type, "OrgMember");
    assert_eq!(member_msg.fields[0].wire_type, "OrgTeam");
    assert_eq!(
        member_msg.fields[0].message,
        set.message_for("example.com/app/org.Team")
    );
    assert_eq!(set.messages.len(), 3);
}
