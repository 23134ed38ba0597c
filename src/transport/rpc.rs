//! RPC schema synthesis.
//!
//! Converts the request and response records of every `@grpc` endpoint, and
//! every record reachable from them, into schema messages. Messages live in an
//! arena ([`SchemaSet::messages`]) and are addressed by [`MessageId`]. A
//! message is registered under its record's qualified identity before its
//! fields are walked, so self-references and cycles resolve to the
//! in-progress entry and shared records are emitted once.

use crate::diagnostics::DiagnosticKind;
use crate::model::{RecordType, ServiceModel};
use crate::naming::{to_camel_case, to_snake_case, unique_name};
use crate::resolve::{ResolveError, RunContext};
use crate::source::is_exported;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Index of a message in [`SchemaSet::messages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub usize);

/// Wire type of a scalar field kind.
pub fn scalar_wire_type(kind: &str) -> Option<&'static str> {
    match kind {
        "float64" => Some("double"),
        "float32" => Some("float"),
        "int32" => Some("int32"),
        "int64" | "int" => Some("int64"),
        "uint32" => Some("uint32"),
        "uint64" => Some("uint64"),
        "bool" => Some("bool"),
        "string" => Some("string"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    pub name: String,
    /// Record field this was generated from; `None` for synthesized fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
    pub wire_type: String,
    pub repeated: bool,
    pub number: u32,
    /// Nested message, for message-typed fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaMessage {
    pub name: String,
    pub fields: Vec<SchemaField>,
    /// Source record; `None` for `Empty` and the response wrappers
    #[serde(skip)]
    pub record: Option<Arc<RecordType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl SchemaMessage {
    fn push_field(
        &mut self,
        name: String,
        source_field: Option<String>,
        wire_type: String,
        repeated: bool,
        message: Option<MessageId>,
    ) {
        let number = u32::try_from(self.fields.len() + 1).unwrap_or(u32::MAX);
        self.fields.push(SchemaField {
            name,
            source_field,
            wire_type,
            repeated,
            number,
            message,
        });
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcMethod {
    pub name: String,
    pub request: MessageId,
    pub response: MessageId,
}

/// RPC schema of one service.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSet {
    pub service: String,
    pub package: String,
    pub messages: Vec<SchemaMessage>,
    pub methods: Vec<RpcMethod>,
    #[serde(skip)]
    seen: HashMap<String, MessageId>,
    #[serde(skip)]
    names: HashSet<String>,
    #[serde(skip)]
    empty: Option<MessageId>,
}

impl SchemaSet {
    pub fn new(service: impl Into<String>, package: impl Into<String>) -> Self {
        SchemaSet {
            service: service.into(),
            package: package.into(),
            messages: Vec::new(),
            methods: Vec::new(),
            seen: HashMap::new(),
            names: HashSet::new(),
            empty: None,
        }
    }

    pub fn message(&self, id: MessageId) -> &SchemaMessage {
        &self.messages[id.0]
    }

    pub fn find(&self, name: &str) -> Option<&SchemaMessage> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Message generated for a record identity, if any.
    pub fn message_for(&self, identity: &str) -> Option<MessageId> {
        self.seen.get(identity).copied()
    }

    fn register(&mut self, base_name: &str, record: Option<Arc<RecordType>>) -> MessageId {
        let name = unique_name(&mut self.names, base_name);
        let id = MessageId(self.messages.len());
        let identity = record.as_ref().map(|r| r.identity());
        if let Some(identity) = &identity {
            self.seen.insert(identity.clone(), id);
        }
        self.messages.push(SchemaMessage {
            name,
            fields: Vec::new(),
            record,
            identity,
        });
        id
    }

    /// The shared field-less message, created on first use.
    fn empty_message(&mut self) -> MessageId {
        if let Some(id) = self.empty {
            return id;
        }
        let id = self.register("Empty", None);
        self.empty = Some(id);
        id
    }
}

/// Build the RPC schema of a service.
///
/// Returns `Ok(None)` when no endpoint carries `@grpc`. Nested records that
/// cannot be found are skipped with a warning; other lookup failures such as
/// unparsable source units are fatal.
pub fn synthesize(
    ctx: &mut RunContext,
    service: &ServiceModel,
) -> Result<Option<SchemaSet>, ResolveError> {
    if !service.endpoints.iter().any(|e| e.has_grpc()) {
        return Ok(None);
    }
    let mut set = SchemaSet::new(service.identifier.clone(), service.package.clone());

    for endpoint in service.endpoints.iter().filter(|e| e.has_grpc()) {
        let request = match &endpoint.request {
            Some(req) => generate_message(ctx, &mut set, service, &req.record)?,
            None => set.empty_message(),
        };
        let response_message = match &endpoint.response {
            Some(res) => Some(generate_message(ctx, &mut set, service, &res.record)?),
            None => None,
        };

        let reply = set.register(&format!("{}Reply", endpoint.name), None);
        set.messages[reply.0].push_field(
            "err".to_string(),
            None,
            "string".to_string(),
            false,
            None,
        );
        if let Some(id) = response_message {
            let wire = set.messages[id.0].name.clone();
            set.messages[reply.0].push_field("response".to_string(), None, wire, false, Some(id));
        }

        set.methods.push(RpcMethod {
            name: endpoint.name.clone(),
            request,
            response: reply,
        });
    }

    debug!(
        service = %service.identifier,
        messages = set.messages.len(),
        methods = set.methods.len(),
        "synthesized rpc schema"
    );
    Ok(Some(set))
}

/// Message name of a record: plain for records of the service's own package,
/// otherwise prefixed with the camel-cased name of the package defining it.
fn message_name(service: &ServiceModel, record: &RecordType) -> String {
    if record.import.path == service.import_path {
        record.name.clone()
    } else {
        format!("{}{}", to_camel_case(&record.package), record.name)
    }
}

/// Return the message for `record`, generating it and every record it reaches.
pub fn generate_message(
    ctx: &mut RunContext,
    set: &mut SchemaSet,
    service: &ServiceModel,
    record: &Arc<RecordType>,
) -> Result<MessageId, ResolveError> {
    if let Some(id) = set.message_for(&record.identity()) {
        return Ok(id);
    }
    let id = set.register(&message_name(service, record), Some(Arc::clone(record)));

    for field in record.fields.iter().filter(|f| f.is_exported()) {
        if field.tag("grpc") == Some("-") {
            continue;
        }
        let ty = &field.ty;
        let location = format!("{}.{}.{}", service.identifier, record.name, field.name);

        let (wire_type, repeated, nested) = if ty.is_byte_slice() {
            ("bytes".to_string(), false, None)
        } else if let Some(wire) = ty
            .package
            .is_none()
            .then(|| scalar_wire_type(&ty.qualifier))
            .flatten()
        {
            (wire.to_string(), field.array, None)
        } else if !is_exported(&ty.qualifier) {
            ctx.warn(
                location,
                DiagnosticKind::UnsupportedType,
                format!("field type '{ty}' cannot be mapped to an rpc type"),
            );
            continue;
        } else if ty.qualifier == record.name
            && ty.import_path().is_none_or(|p| p == record.import.path)
        {
            (set.messages[id.0].name.clone(), field.array, Some(id))
        } else {
            let nested_record = match ctx.resolve_type(ty) {
                Ok(found) => found,
                Err(err) if err.is_not_found() => {
                    ctx.warn(
                        location,
                        DiagnosticKind::UnsupportedType,
                        format!("field type '{ty}' is skipped: {err}"),
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };
            let nested = generate_message(ctx, set, service, &nested_record)?;
            (set.messages[nested.0].name.clone(), field.array, Some(nested))
        };

        set.messages[id.0].push_field(
            to_snake_case(&field.name),
            Some(field.name.clone()),
            wire_type,
            repeated,
            nested,
        );
    }
    Ok(id)
}

#[cfg(test)]
mod tests;
