//! Field-level error records and the server payload they are decoded from.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =============================================================================
// ErrorPayload
// =============================================================================

/// Field-error payload carried by a rejected response.
///
/// The server answers with a JSON object mapping field names to either a
/// single message or a list of messages. Both shapes decode into the same
/// map; any other value is kept as its JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorPayload(BTreeMap<String, Vec<String>>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessages {
    One(String),
    Many(Vec<String>),
    Other(Value),
}

impl From<RawMessages> for Vec<String> {
    fn from(raw: RawMessages) -> Self {
        match raw {
            RawMessages::One(message) => vec![message],
            RawMessages::Many(messages) => messages,
            RawMessages::Other(value) => vec![value.to_string()],
        }
    }
}

impl<'de> Deserialize<'de> for ErrorPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, RawMessages>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(field, messages)| (field, messages.into()))
                .collect(),
        ))
    }
}

impl ErrorPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message for `field`.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.0.entry(field.into()).or_default().push(message.into());
        self
    }

    /// Returns `true` when the payload names `field`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the first message recorded for `field`.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Returns every message recorded for `field`.
    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` when no field carries a message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the field names in the payload.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Flattens a payload into a JSON object of `field -> first message`.
///
/// Error records deserialize from this object, which keeps their
/// `from_payload` implementations a single `serde_json::from_value` call.
#[must_use]
pub fn payload_value(payload: &ErrorPayload) -> Value {
    Value::Object(
        payload
            .0
            .iter()
            .filter_map(|(field, messages)| {
                messages
                    .first()
                    .map(|message| (field.clone(), Value::String(message.clone())))
            })
            .collect(),
    )
}

// =============================================================================
// FieldErrors
// =============================================================================

/// A sparse, per-operation record of optional field error messages.
pub trait FieldErrors: Default + Clone + Send + Sync + 'static {
    /// Builds the record from a server payload. Unknown fields are ignored.
    fn from_payload(payload: &ErrorPayload) -> Self;

    /// Returns `true` when no field carries an error.
    fn is_empty(&self) -> bool;
}

/// Decodes any serde record from a payload, falling back to the empty record.
pub(crate) fn decode_record<E>(payload: &ErrorPayload) -> E
where
    E: DeserializeOwned + Default,
{
    match serde_json::from_value(payload_value(payload)) {
        Ok(record) => record,
        Err(error) => {
            tracing::warn!("Failed to decode field errors from payload: {}", error);
            E::default()
        }
    }
}

/// Error record for operations without field-level validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoFieldErrors;

impl FieldErrors for NoFieldErrors {
    fn from_payload(_payload: &ErrorPayload) -> Self {
        Self
    }

    fn is_empty(&self) -> bool {
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
