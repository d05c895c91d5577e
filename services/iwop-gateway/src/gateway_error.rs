//! Decoding of the error envelope returned by the gateway.
//!
//! The default envelope is XML:
//!
//! ```xml
//! <Error>
//!   <Code>SERVICE_NOT_FOUND</Code>
//!   <Message>service not found</Message>
//!   <ClientIP>192.168.1.1</ClientIP>
//! </Error>
//! ```
//!
//! Some integrations answer with a flat JSON object instead.

use std::collections::BTreeMap;

use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ROOT: &[u8] = b"Error";

/// Fields decoded from a gateway error body, keyed by element name.
///
/// Decoding never fails: an unreadable body yields an empty record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiGatewayError(BTreeMap<String, String>);

impl ApiGatewayError {
    /// Get a field by its exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Error code, for example `SERVICE_NOT_FOUND`.
    pub fn code(&self) -> Option<&str> {
        self.get("Code")
    }

    /// Human readable message.
    pub fn message(&self) -> Option<&str> {
        self.get("Message")
    }

    /// Client address as seen by the gateway.
    pub fn client_ip(&self) -> Option<&str> {
        self.get("ClientIP")
    }

    /// The string the gateway signed while checking the request.
    pub fn string_to_sign(&self) -> Option<&str> {
        self.get("StringToSign")
    }

    /// Byte dump of [`Self::string_to_sign`] as reported by the gateway.
    pub fn string_to_sign_bytes(&self) -> Option<&str> {
        self.get("StringToSignBytes")
    }

    /// The signature the gateway received.
    pub fn signature_provided(&self) -> Option<&str> {
        self.get("SignatureProvided")
    }

    /// The access id the gateway received.
    pub fn access_key_id(&self) -> Option<&str> {
        self.get("AccessKeyId")
    }

    /// Whether nothing could be decoded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for ApiGatewayError {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decode a gateway error body.
///
/// The format is sniffed from the first non-whitespace byte: `<` for XML and
/// `{` for JSON. Anything else, including an empty body, yields an empty record.
pub fn resolve_error(body: impl AsRef<[u8]>) -> ApiGatewayError {
    let body = body.as_ref();
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let body = &body[start..];

    match body.first() {
        Some(b'<') => resolve_xml(body),
        Some(b'{') => resolve_json(body),
        _ => ApiGatewayError::default(),
    }
}

/// Map every child of the `Error` root to its text content.
///
/// Fields collected before a parse failure are kept.
fn resolve_xml(body: &[u8]) -> ApiGatewayError {
    let mut fields = BTreeMap::new();
    let mut reader = Reader::from_reader(body);

    let mut depth = 0usize;
    let mut current: Option<(String, String)> = None;
    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                debug!(
                    "gateway error body is not valid xml at {}: {err}",
                    reader.buffer_position()
                );
                break;
            }
        };

        match event {
            Event::Start(e) => {
                depth += 1;
                let name = e.local_name();
                if depth == 1 && name.as_ref() != ROOT {
                    break;
                }
                if depth == 2 {
                    current = Some((
                        String::from_utf8_lossy(name.as_ref()).into_owned(),
                        String::new(),
                    ));
                }
            }
            Event::Empty(e) => match depth {
                // `<Error/>` or a foreign root.
                0 => break,
                1 => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    fields.insert(name, String::new());
                }
                _ => {}
            },
            Event::Text(t) if depth >= 2 => match t.unescape() {
                Ok(text) => {
                    if let Some((_, value)) = current.as_mut() {
                        value.push_str(&text);
                    }
                }
                Err(err) => {
                    debug!("gateway error body has invalid text: {err}");
                    break;
                }
            },
            Event::CData(c) if depth >= 2 => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some((name, value)) = current.take() {
                        fields.insert(name, value);
                    }
                }
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    ApiGatewayError(fields)
}

/// Map the fields of a top level JSON object.
///
/// A single `Error` object wrapping the fields is unwrapped. Strings are kept
/// verbatim, `null` is skipped and other values keep their JSON text.
fn resolve_json(body: &[u8]) -> ApiGatewayError {
    let value: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(err) => {
            debug!("gateway error body is not valid json: {err}");
            return ApiGatewayError::default();
        }
    };

    let Value::Object(mut object) = value else {
        return ApiGatewayError::default();
    };
    if object.len() == 1 && object.get("Error").is_some_and(Value::is_object) {
        if let Some(Value::Object(inner)) = object.remove("Error") {
            object = inner;
        }
    }

    object
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect()
}
