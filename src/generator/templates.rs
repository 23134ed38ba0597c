use crate::naming::to_camel_case;
use crate::transport::rpc::SchemaSet;
use minijinja::{context, Environment};
use serde::Serialize;

const PROTO_TEMPLATE_NAME: &str = "service.proto";

const PROTO_TEMPLATE: &str = r#"syntax = "proto3";

package {{ package }};

service {{ service }} {
{%- for m in methods %}
  rpc {{ m.name }} ({{ m.request }}) returns ({{ m.response }});
{%- endfor %}
}
{%- for msg in messages %}

message {{ msg.name }} {
{%- for f in msg.fields %}
  {% if f.repeated %}repeated {% endif %}{{ f.wire_type }} {{ f.name }} = {{ f.number }};
{%- endfor %}
}
{%- endfor %}
"#;

/// RPC method with its message ids replaced by message names
#[derive(Debug, Serialize)]
struct ProtoMethod<'a> {
    name: &'a str,
    request: &'a str,
    response: &'a str,
}

/// Render a schema set as a proto3 file. The proto package is the service
/// identifier, so services from one source package never share a namespace.
pub fn render_proto(set: &SchemaSet) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(PROTO_TEMPLATE_NAME, PROTO_TEMPLATE)?;
    let tmpl = env.get_template(PROTO_TEMPLATE_NAME)?;

    let methods: Vec<ProtoMethod<'_>> = set
        .methods
        .iter()
        .map(|m| ProtoMethod {
            name: &m.name,
            request: &set.message(m.request).name,
            response: &set.message(m.response).name,
        })
        .collect();

    let mut rendered = tmpl.render(context! {
        package => &set.service,
        service => to_camel_case(&set.service),
        methods => methods,
        messages => &set.messages,
    })?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::rpc::{MessageId, RpcMethod, SchemaField, SchemaMessage};

    fn field(name: &str, wire_type: &str, number: u32, repeated: bool) -> SchemaField {
        SchemaField {
            name: name.to_string(),
            source_field: None,
            wire_type: wire_type.to_string(),
            repeated,
            number,
            message: None,
        }
    }

    fn message(name: &str, fields: Vec<SchemaField>) -> SchemaMessage {
        SchemaMessage {
            name: name.to_string(),
            fields,
            record: None,
            identity: None,
        }
    }

    #[test]
    fn test_render_proto() {
        let mut set = SchemaSet::new("numbers", "calc");
        set.messages.push(message(
            "SumRequest",
            vec![field("a", "int64", 1, false), field("tags", "string", 2, true)],
        ));
        set.messages.push(message("SumReply", vec![field("err", "string", 1, false)]));
        set.methods.push(RpcMethod {
            name: "Sum".to_string(),
            request: MessageId(0),
            response: MessageId(1),
        });

        let proto = render_proto(&set).unwrap();
        let expected = r#"syntax = "proto3";

package numbers;

service Numbers {
  rpc Sum (SumRequest) returns (SumReply);
}

message SumRequest {
  int64 a = 1;
  repeated string tags = 2;
}

message SumReply {
  string err = 1;
}
"#;
        assert_eq!(proto, expected);
    }

    #[test]
    fn test_render_empty_message() {
        let mut set = SchemaSet::new("ping", "ping");
        set.messages.push(message("Empty", Vec::new()));
        let proto = render_proto(&set).unwrap();
        assert!(proto.contains("message Empty {\n}\n"), "{proto}");
        assert!(proto.contains("service Ping {\n}"), "{proto}");
    }
}
