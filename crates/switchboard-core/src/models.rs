//! Core domain models and strongly-typed identifiers.
//!
//! Defines directory records, the typed view of an inbound call event, and
//! the action script returned to the voice platform.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RouterError};

/// Strongly-typed employee identifier.
///
/// Wraps the numeric directory id so it cannot be confused with other
/// integers flowing through a request.
///
/// # Example
///
/// ```
/// use switchboard_core::models::EmployeeId;
/// let id = EmployeeId(7);
/// assert_eq!(id.to_string(), "7");
/// ```
///
/// Ids are positive; zero is rejected wherever an id is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for EmployeeId {
    type Error = &'static str;

    fn try_from(id: u64) -> std::result::Result<Self, Self::Error> {
        if id == 0 {
            return Err("employee id must be positive");
        }
        Ok(Self(id))
    }
}

impl From<EmployeeId> for u64 {
    fn from(id: EmployeeId) -> Self {
        id.0
    }
}

/// One routable destination in the company directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Unique id within the directory
    pub id: EmployeeId,
    /// Display name, used in logs and tool-call lookups
    pub name: String,
    /// Department name; the routing key callers ask for
    #[serde(default)]
    pub department: String,
    /// E.164 number the call is transferred to
    #[serde(default)]
    pub phone: String,
    /// Contact address, informational only
    #[serde(default)]
    pub email: String,
}

impl EmployeeRecord {
    /// Whether this record can receive a transferred call.
    pub fn is_routable(&self) -> bool {
        !self.phone.trim().is_empty()
    }
}

/// Typed view of an inbound call event.
///
/// Only the fields the router understands are extracted; everything else in
/// the payload is left to the transaction log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    /// Explicit target employee
    #[serde(default, alias = "employee_id", skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    /// Requested department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Requested employee display name
    #[serde(default, alias = "requested_party", skip_serializing_if = "Option::is_none")]
    pub requested_party: Option<String>,
    /// Voice-assistant tool call correlation id
    #[serde(default, alias = "tool_call_id", skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Caller identifier, logged only
    #[serde(default, alias = "callerId", alias = "from", skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
}

impl WebhookRequest {
    /// Parses a raw request body.
    ///
    /// The body must be a JSON object. Syntax errors, non-object documents
    /// and wrongly-typed known fields are all reported as
    /// [`RouterError::MalformedRequest`].
    pub fn parse(body: &[u8]) -> Result<(Self, Value)> {
        let value = parse_json_object(body)?;
        let request = Self::from_value(&value)?;
        Ok((request, value))
    }

    /// Extracts the typed view from an already-parsed JSON object.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(RouterError::malformed("request body must be a JSON object"));
        }

        Self::deserialize(value).map_err(|e| RouterError::malformed(e.to_string()))
    }

    /// Returns the routing key with the highest precedence.
    ///
    /// Precedence is `employeeId`, then `department`, then
    /// `requestedParty`. Blank strings count as absent.
    pub fn routing_key(&self) -> Option<RoutingKey> {
        if let Some(id) = self.employee_id {
            return Some(RoutingKey::Employee(id));
        }

        if let Some(department) = non_blank(self.department.as_deref()) {
            return Some(RoutingKey::Department(department.to_string()));
        }

        non_blank(self.requested_party.as_deref()).map(|name| RoutingKey::Name(name.to_string()))
    }

    /// Caller identifier for logging, `"unknown"` when absent.
    pub fn caller_label(&self) -> &str {
        non_blank(self.caller.as_deref()).unwrap_or("unknown")
    }
}

/// Parses bytes as JSON and requires the document to be an object.
pub fn parse_json_object(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RouterError::malformed("JSON body required"));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RouterError::malformed(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(RouterError::malformed("request body must be a JSON object"));
    }

    Ok(value)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// The value used to select a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutingKey {
    /// Exact employee id
    Employee(EmployeeId),
    /// Exact, case-sensitive department name
    Department(String),
    /// Employee display name
    Name(String),
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Employee(id) => write!(f, "employee:{id}"),
            Self::Department(department) => write!(f, "department:{department}"),
            Self::Name(name) => write!(f, "name:{name}"),
        }
    }
}

/// Endpoint kind understood by the voice platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// PSTN phone number
    Phone,
}

/// Connect target inside a `connect` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEndpoint {
    /// Endpoint kind, always `phone`
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    /// Number to bridge the call to
    pub number: String,
}

impl CallEndpoint {
    /// Creates a phone endpoint.
    pub fn phone(number: impl Into<String>) -> Self {
        Self { kind: EndpointKind::Phone, number: number.into() }
    }
}

/// One instruction for the voice platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Speak `text` to the caller
    Talk {
        /// Text to speak
        text: String,
    },
    /// Bridge the call to the given endpoints
    Connect {
        /// Endpoints to dial
        endpoint: Vec<CallEndpoint>,
    },
}

/// Ordered action script returned from the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionScript(pub Vec<Action>);

impl ActionScript {
    /// Announce `text`, then connect to `number`.
    pub fn announce_and_connect(text: impl Into<String>, number: impl Into<String>) -> Self {
        Self(vec![
            Action::Talk { text: text.into() },
            Action::Connect { endpoint: vec![CallEndpoint::phone(number)] },
        ])
    }

    /// Announce `text` without transferring the call.
    pub fn announce(text: impl Into<String>) -> Self {
        Self(vec![Action::Talk { text: text.into() }])
    }

    /// Number of the first `connect` action, if any.
    pub fn connect_number(&self) -> Option<&str> {
        self.0.iter().find_map(|action| match action {
            Action::Connect { endpoint } => endpoint.first().map(|e| e.number.as_str()),
            Action::Talk { .. } => None,
        })
    }

    /// Actions in order.
    pub fn actions(&self) -> &[Action] {
        &self.0
    }
}
