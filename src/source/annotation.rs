//! Declarative annotations attached to interfaces and methods.
//!
//! Annotations are written as `@name(key=value, ...)`. Values may be double or
//! single quoted strings, `true`/`false`, numbers or bare words. A single
//! annotation string may contain several annotations; they are extracted in
//! order. Only the kinds the resolver understands get their own variant;
//! everything else is kept as [`Annotation::Unknown`] and ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ANNOTATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([A-Za-z0-9]+)\(([^)]*)\)").expect("annotation regex should be valid")
});

/// Annotation name and its arguments in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawAnnotation {
    pub name: String,
    pub args: Vec<(String, String)>,
}

impl RawAnnotation {
    /// String argument; the last occurrence wins.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Boolean argument. Values other than `true`/`false` read as absent.
    pub fn bool_arg(&self, key: &str) -> Option<bool> {
        match self.str_arg(key)?.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.str_arg(key)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// `@service(name=..., route=...)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceAnnotation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

/// `@http(method=..., route=..., name=..., keepTrailingSlash=..., request=..., response=...)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpAnnotation {
    /// Declared methods, split on commas and trimmed. Validated by the binder.
    pub methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub keep_trailing_slash: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// Annotation kinds understood by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Service(ServiceAnnotation),
    Http(HttpAnnotation),
    Grpc,
    Unknown(RawAnnotation),
}

impl Annotation {
    /// Classify a raw annotation. `service_key` is the configured name that marks
    /// a service interface.
    pub fn classify(raw: RawAnnotation, service_key: &str) -> Self {
        if raw.name == service_key {
            return Annotation::Service(ServiceAnnotation {
                name: raw.non_empty("name"),
                route: raw.non_empty("route"),
            });
        }
        match raw.name.as_str() {
            "http" => {
                let methods = raw
                    .str_arg("method")
                    .or_else(|| raw.str_arg("methods"))
                    .map(|m| {
                        m.split(',')
                            .map(str::trim)
                            .filter(|m| !m.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Annotation::Http(HttpAnnotation {
                    methods,
                    route: raw.non_empty("route"),
                    name: raw.non_empty("name"),
                    keep_trailing_slash: raw.bool_arg("keepTrailingSlash").unwrap_or(false),
                    request: raw.non_empty("request"),
                    response: raw.non_empty("response"),
                })
            }
            "grpc" => Annotation::Grpc,
            _ => Annotation::Unknown(raw),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Annotation::Http(_) | Annotation::Grpc)
    }
}

/// Whether a piece of text carries at least one annotation.
pub fn contains_annotation(text: &str) -> bool {
    ANNOTATION_REGEX.is_match(text)
}

/// Extract every annotation in `text`, in order of appearance.
pub fn parse_raw(text: &str) -> Vec<RawAnnotation> {
    ANNOTATION_REGEX
        .captures_iter(text)
        .map(|caps| RawAnnotation {
            name: caps[1].to_string(),
            args: parse_args(&caps[2]),
        })
        .collect()
}

/// Extract and classify every annotation in each of `lines`.
pub fn parse_annotations(lines: &[String], service_key: &str) -> Vec<Annotation> {
    lines
        .iter()
        .flat_map(|line| parse_raw(line))
        .map(|raw| Annotation::classify(raw, service_key))
        .collect()
}

fn parse_args(body: &str) -> Vec<(String, String)> {
    split_top_level(body)
        .into_iter()
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            match part.split_once('=') {
                Some((key, value)) => Some((key.trim().to_string(), unquote(value.trim()))),
                // A bare key is a flag.
                None => Some((part.to_string(), "true".to_string())),
            }
        })
        .collect()
}

/// Split on commas that are not inside quotes.
fn split_top_level(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in body.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (None, '"' | '\'') => {
                quote = Some(ch);
                current.push(ch);
            }
            (None, ',') => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

fn unquote(value: &str) -> String {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}
