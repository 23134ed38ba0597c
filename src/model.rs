//! Resolved service model.
//!
//! Built once per generation run by [`crate::resolve`] and read-only afterwards.
//! Record types are shared through `Arc`: two lookups of the same record within
//! a run return the same allocation.

use crate::source::{Annotation, Import, Param, TypeRef};
use crate::transport::http::HttpBinding;
use http::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A structural record type with named, typed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordType {
    pub name: String,
    /// Package name declared by the unit that defines the record
    pub package: String,
    /// Owning import, as first reached by a reference. The alias is empty for
    /// records local to the referencing unit.
    pub import: Import,
    pub fields: Vec<Field>,
}

impl RecordType {
    /// Qualified identity: `<import path>.<name>`.
    pub fn identity(&self) -> String {
        format!("{}.{}", self.import.path, self.name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Metadata tags keyed by tag name (`json`, `url`, `query`, `body`, `grpc`)
    pub tags: BTreeMap<String, String>,
    /// Repeated flag, taken from the type reference
    pub array: bool,
}

impl Field {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn is_exported(&self) -> bool {
        crate::source::is_exported(&self.name)
    }
}

/// A request or response record together with the reference it was found through.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRef {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub record: Arc<RecordType>,
}

/// One resolved, annotated method exposed by a service.
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RecordRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<RecordRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpBinding>,
    pub annotations: Vec<Annotation>,
}

impl Endpoint {
    pub fn has_grpc(&self) -> bool {
        self.annotations.iter().any(|a| matches!(a, Annotation::Grpc))
    }

    /// HTTP method and endpoint-relative path of every route entry.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.http
            .iter()
            .flat_map(|b| b.routes.iter().map(|r| (&r.method, r.path.as_str())))
    }
}

/// A resolved annotated interface and its endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceModel {
    /// snake_case identifier, unique within a batch
    pub identifier: String,
    /// Normalized base route: leading `/`, no trailing `/` unless it is the root
    pub base_route: String,
    /// Name of the source interface
    pub interface: String,
    pub package: String,
    pub import_path: String,
    pub source: PathBuf,
    pub endpoints: Vec<Endpoint>,
    pub annotations: Vec<Annotation>,
}

/// A fully expanded route: base route joined with an endpoint route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRoute<'a> {
    pub method: &'a Method,
    pub path: String,
    pub endpoint: &'a str,
}

impl ServiceModel {
    /// Every (method, full path) entry of the service, in declaration order.
    /// Variants that join to the same path are listed once.
    pub fn routes(&self) -> Vec<ServiceRoute<'_>> {
        let mut routes: Vec<ServiceRoute<'_>> = Vec::new();
        for ep in &self.endpoints {
            for (method, path) in ep.routes() {
                let route = ServiceRoute {
                    method,
                    path: join_route(&self.base_route, path),
                    endpoint: ep.name.as_str(),
                };
                if !routes.contains(&route) {
                    routes.push(route);
                }
            }
        }
        routes
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

/// Normalize a route to start with `/` and not end with one, except the root.
pub fn normalize_base_route(route: &str) -> String {
    let trimmed = route.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Join a base route and an endpoint route. An empty endpoint route is the base itself.
pub fn join_route(base: &str, route: &str) -> String {
    match (base, route) {
        ("/", "") => "/".to_string(),
        ("/", _) => route.to_string(),
        (_, "") => base.to_string(),
        _ => format!("{base}{route}"),
    }
}
