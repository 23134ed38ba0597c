//! HTTP transport binding.
//!
//! Turns an endpoint's `@http(...)` annotation and its request record into a
//! binding plan: which routes to register, where each request field is read
//! from (URL segment, query string or body), how string parameters are
//! converted, and which payload formats are spoken.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::RecordRef;
use crate::resolve::ResolveError;
use crate::source::{Annotation, HttpAnnotation, TypeRef};
use http::Method;
use serde::{Serialize, Serializer};

/// Field kinds accepted for URL parameters.
pub const URL_KINDS: &[&str] = &["string", "int", "float32", "float64"];

/// Field kinds accepted for query parameters.
pub const QUERY_KINDS: &[&str] = &[
    "string",
    "[]string",
    "int",
    "[]int",
    "bool",
    "float32",
    "[]float32",
    "float64",
    "[]float64",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayloadFormat {
    Json,
    Xml,
    Form,
}

impl PayloadFormat {
    /// Case-insensitive lookup of a format name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "JSON" => Some(PayloadFormat::Json),
            "XML" => Some(PayloadFormat::Xml),
            "FORM" => Some(PayloadFormat::Form),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Json => "JSON",
            PayloadFormat::Xml => "XML",
            PayloadFormat::Form => "FORM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamKind {
    Url,
    Query,
    Body,
}

/// Named function that decodes a string wire value into a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScalarConversion {
    pub function: &'static str,
    /// The conversion cannot fail
    pub infallible: bool,
}

/// Conversion for a non-string parameter kind.
pub fn scalar_conversion(kind: &str) -> Option<ScalarConversion> {
    let (function, infallible) = match kind {
        "[]string" => ("StringToStringArray", true),
        "int" => ("StringToInt", false),
        "[]int" => ("StringToIntArray", false),
        "float64" => ("StringToFloat64", false),
        "[]float64" => ("StringToFloat64Array", false),
        "float32" => ("StringToFloat32", false),
        "[]float32" => ("StringToFloat32Array", false),
        "bool" => ("StringToBool", false),
        _ => return None,
    };
    Some(ScalarConversion {
        function,
        infallible,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamBinding {
    /// Request field; `None` binds the whole request record
    pub field: Option<String>,
    /// Public parameter name
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ScalarConversion>,
    /// Payload format, for body bindings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<PayloadFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRoute {
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    pub path: String,
}

fn serialize_method<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

/// HTTP exposure plan for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpBinding {
    pub request_format: PayloadFormat,
    pub response_format: PayloadFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_format: Option<PayloadFormat>,
    pub has_body: bool,
    pub has_url: bool,
    pub params: Vec<ParamBinding>,
    /// One entry, or two when the trailing-slash variant is added
    pub routes: Vec<MethodRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HttpBinding {
    pub fn params_of(&self, kind: ParamKind) -> impl Iterator<Item = &ParamBinding> {
        self.params.iter().filter(move |p| p.kind == kind)
    }
}

/// Normalize a route to a leading `/` and, unless `keep_trailing_slash` is set,
/// add its trailing-slash-toggled counterpart. The root `/` toggles to `""`,
/// which joins to the bare base route.
pub fn expand_route(route: &str, keep_trailing_slash: bool) -> Vec<String> {
    let route = route.trim();
    let normalized = if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{route}")
    };
    let mut routes = vec![normalized.clone()];
    if !keep_trailing_slash {
        let toggled = match normalized.strip_suffix('/') {
            Some(stripped) => stripped.to_string(),
            None => format!("{normalized}/"),
        };
        routes.push(toggled);
    }
    routes
}

/// Parse a `name[,required]` tag value.
fn parse_param_tag(value: &str) -> (String, bool) {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parts = compact.split(',');
    let name = parts.next().unwrap_or_default().to_string();
    let required = parts.any(|p| p == "required");
    (name, required)
}

fn parse_method(
    service: &str,
    endpoint: &str,
    http: &HttpAnnotation,
) -> Result<Method, ResolveError> {
    let method = match http.methods.as_slice() {
        [single] => single.to_ascii_uppercase(),
        [] => {
            return Err(ResolveError::endpoint_validation(
                service,
                endpoint,
                "http annotation has no method",
            ))
        }
        many => {
            return Err(ResolveError::endpoint_validation(
                service,
                endpoint,
                format!(
                    "http annotation must declare exactly one method, found {}",
                    many.join(", ")
                ),
            ))
        }
    };
    match method.as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        "PATCH" => Ok(Method::PATCH),
        "HEAD" => Ok(Method::HEAD),
        "OPTIONS" => Ok(Method::OPTIONS),
        "TRACE" => Ok(Method::TRACE),
        "CONNECT" => Ok(Method::CONNECT),
        other => Err(ResolveError::endpoint_validation(
            service,
            endpoint,
            format!("'{other}' is not a valid HTTP method"),
        )),
    }
}

fn negotiate(
    diags: &mut Diagnostics,
    location: &str,
    what: &str,
    value: Option<&str>,
    allowed: &[PayloadFormat],
) -> PayloadFormat {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return PayloadFormat::Json;
    };
    match PayloadFormat::parse(value) {
        Some(format) if allowed.contains(&format) => format,
        _ => {
            diags.warn(
                location,
                DiagnosticKind::UnsupportedFormat,
                format!("{what} format '{value}' is not supported, JSON will be used"),
            );
            PayloadFormat::Json
        }
    }
}

/// Build the HTTP binding of an endpoint.
///
/// Returns `Ok(None)` when the endpoint carries no `@http` annotation. When
/// several are present the first one is used.
pub fn bind(
    diags: &mut Diagnostics,
    service: &str,
    endpoint: &str,
    annotations: &[Annotation],
    request: Option<&RecordRef>,
) -> Result<Option<HttpBinding>, ResolveError> {
    let mut http_annotations = annotations.iter().filter_map(|a| match a {
        Annotation::Http(http) => Some(http),
        _ => None,
    });
    let Some(http) = http_annotations.next() else {
        return Ok(None);
    };
    let location = format!("{service}.{endpoint}");
    if http_annotations.next().is_some() {
        diags.warn(
            &location,
            DiagnosticKind::DuplicateAnnotation,
            "endpoint has more than one http annotation, only the first is used",
        );
    }

    let method = parse_method(service, endpoint, http)?;
    let routes = expand_route(http.route.as_deref().unwrap_or("/"), http.keep_trailing_slash)
        .into_iter()
        .map(|path| MethodRoute {
            method: method.clone(),
            path,
        })
        .collect();

    let request_format = negotiate(
        diags,
        &location,
        "request",
        http.request.as_deref(),
        &[PayloadFormat::Json, PayloadFormat::Xml, PayloadFormat::Form],
    );
    let response_format = negotiate(
        diags,
        &location,
        "response",
        http.response.as_deref(),
        &[PayloadFormat::Json, PayloadFormat::Xml],
    );

    let mut binding = HttpBinding {
        request_format,
        response_format,
        body_format: None,
        has_body: false,
        has_url: false,
        params: Vec::new(),
        routes,
        name: http.name.clone(),
    };

    if let Some(request) = request {
        bind_request_fields(diags, service, endpoint, &location, request, &mut binding)?;
    }

    Ok(Some(binding))
}

/// Whether `kind` may bind as a `place` parameter. Unsupported kinds drop only
/// that binding and leave the field's other tags in effect.
fn supported_or_warn(
    diags: &mut Diagnostics,
    location: &str,
    field: &str,
    kind: &str,
    supported: &[&str],
    place: &str,
) -> bool {
    if supported.contains(&kind) {
        return true;
    }
    diags.warn(
        format!("{location}.{field}"),
        DiagnosticKind::UnsupportedType,
        format!("field type '{kind}' is not supported for {place} parameters"),
    );
    false
}

fn bind_request_fields(
    diags: &mut Diagnostics,
    service: &str,
    endpoint: &str,
    location: &str,
    request: &RecordRef,
    binding: &mut HttpBinding,
) -> Result<(), ResolveError> {
    let mut body_field: Option<&str> = None;
    let mut unbound = false;

    for field in request.record.fields.iter().filter(|f| f.is_exported()) {
        let url = field.tag("url").filter(|v| !v.is_empty());
        let query = field.tag("query").filter(|v| !v.is_empty());
        let body = field.tag("body").filter(|v| !v.is_empty());
        if url.is_none() && query.is_none() {
            unbound = true;
        }
        let kind = field.ty.to_string();
        let conversion = if kind == "string" {
            None
        } else {
            scalar_conversion(&kind)
        };

        if let Some(tag) = url.filter(|_| {
            supported_or_warn(diags, location, &field.name, &kind, URL_KINDS, "url")
        }) {
            let (name, required) = parse_param_tag(tag);
            binding.params.push(ParamBinding {
                field: Some(field.name.clone()),
                name,
                kind: ParamKind::Url,
                required,
                ty: Some(field.ty.clone()),
                conversion,
                format: None,
            });
            binding.has_url = true;
        }

        if let Some(tag) = query.filter(|_| {
            supported_or_warn(diags, location, &field.name, &kind, QUERY_KINDS, "query")
        }) {
            let (name, required) = parse_param_tag(tag);
            binding.params.push(ParamBinding {
                field: Some(field.name.clone()),
                name,
                kind: ParamKind::Query,
                required,
                ty: Some(field.ty.clone()),
                conversion,
                format: None,
            });
        }

        if let Some(tag) = body {
            if let Some(previous) = body_field {
                return Err(ResolveError::endpoint_validation(
                    service,
                    endpoint,
                    format!(
                        "only one field may carry a body tag, found '{previous}' and '{}'",
                        field.name
                    ),
                ));
            }
            body_field = Some(field.name.as_str());
            let (format_name, required) = parse_param_tag(tag);
            let format = negotiate(
                diags,
                &format!("{location}.{}", field.name),
                "body",
                Some(&format_name),
                &[PayloadFormat::Json, PayloadFormat::Xml, PayloadFormat::Form],
            );
            binding.params.push(ParamBinding {
                field: Some(field.name.clone()),
                name: field.name.clone(),
                kind: ParamKind::Body,
                required,
                ty: Some(field.ty.clone()),
                conversion: None,
                format: Some(format),
            });
            binding.has_body = true;
            binding.body_format = Some(format);
        }
    }

    if body_field.is_none() && unbound {
        binding.params.push(ParamBinding {
            field: None,
            name: request.record.name.clone(),
            kind: ParamKind::Body,
            required: true,
            ty: Some(request.ty.clone()),
            conversion: None,
            format: Some(binding.request_format),
        });
        binding.has_body = true;
        binding.body_format = Some(binding.request_format);
    }
    Ok(())
}
