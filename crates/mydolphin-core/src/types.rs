// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared types: entry identity, host credentials, the persisted record and
//! the multi-tenant store document that holds one record per entry.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MyDolphinError;

/// Display name used when an entry has no title of its own.
pub const DEFAULT_NAME: &str = "MyDolphin Plus";

/// Entry id used by managers that are not bound to a configured entry.
pub const DETACHED_ENTRY_ID: &str = "config";

/// Record field holding the locating flag.
pub const FIELD_LOCATING: &str = "locating";

/// Record field holding the AWS token encryption key.
pub const FIELD_AWS_TOKEN_ENCRYPTED_KEY: &str = "aws_token_encrypted_key";

/// Record field holding the entry's symmetric key material.
pub const FIELD_ENCRYPTION_KEY: &str = "encryption_key";

/// Fields that must never be written into a persisted record.
pub const CREDENTIAL_FIELDS: [&str; 2] = ["username", "password"];

/// Stable opaque identifier of one configured entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity of the entry a manager works for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub entry_id: EntryId,
    pub title: String,
}

impl EntryDescriptor {
    pub fn new(entry_id: impl Into<EntryId>, title: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            title: title.into(),
        }
    }
}

/// Credentials handed over by the host when an entry is set up or updated.
///
/// For an entry that already exists, `password` is the ciphertext produced by
/// an earlier `password_hashed` read, not the plaintext.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl EntryCredentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl fmt::Debug for EntryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// The durable, non-credential configuration of one entry.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    #[serde(default)]
    pub locating: bool,

    #[serde(default)]
    pub aws_token_encrypted_key: Option<String>,

    /// Symmetric key material. Kept in the same document as the data it
    /// protects, so it only hides the credential from casual reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,
}

impl fmt::Debug for PersistedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedRecord")
            .field("locating", &self.locating)
            .field("aws_token_encrypted_key", &self.aws_token_encrypted_key)
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// The shared document: one record per entry id.
///
/// Records of other entries are kept as raw JSON so a save for one entry
/// re-emits them exactly as they were loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreDocument {
    entries: Map<String, Value>,
}

impl StoreDocument {
    /// Decode a document returned by a durable store. `None` is an empty
    /// document; anything that is not a JSON object is rejected.
    pub fn from_value(store_key: &str, value: Option<Value>) -> Result<Self, MyDolphinError> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Object(entries)) => Ok(Self { entries }),
            Some(other) => Err(MyDolphinError::store(
                store_key,
                format!("expected a JSON object document, found {}", json_kind(&other)),
            )),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The raw JSON of an entry's record, exactly as stored.
    pub fn raw_record(&self, entry_id: &EntryId) -> Option<&Value> {
        self.entries.get(entry_id.as_str())
    }

    /// Decode the record stored for `entry_id`, if any.
    pub fn record(
        &self,
        store_key: &str,
        entry_id: &EntryId,
    ) -> Result<Option<PersistedRecord>, MyDolphinError> {
        match self.entries.get(entry_id.as_str()) {
            None => Ok(None),
            Some(raw) => serde_json::from_value(raw.clone())
                .map(Some)
                .map_err(|e| {
                    MyDolphinError::store(
                        store_key,
                        format!("record for entry `{entry_id}` is malformed: {e}"),
                    )
                }),
        }
    }

    /// Copy `record` into the sub-map of `entry_id`, field by field.
    ///
    /// Fields of the sub-map that `record` does not know about are kept,
    /// credential fields are dropped, and every other entry is left alone.
    pub fn merge_record(
        &mut self,
        entry_id: &EntryId,
        record: &PersistedRecord,
    ) -> Result<(), MyDolphinError> {
        let fields = match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                return Err(MyDolphinError::Internal(format!(
                    "record for entry `{entry_id}` serialized to {}",
                    json_kind(&other)
                )));
            }
            Err(e) => {
                return Err(MyDolphinError::Internal(format!(
                    "record for entry `{entry_id}` failed to serialize: {e}"
                )));
            }
        };

        let slot = self
            .entries
            .entry(entry_id.as_str().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(sub_map) = slot else {
            return Err(MyDolphinError::Internal(format!(
                "record slot for entry `{entry_id}` is not an object"
            )));
        };

        for (name, value) in fields {
            if !CREDENTIAL_FIELDS.contains(&name.as_str()) {
                sub_map.insert(name, value);
            }
        }
        for name in CREDENTIAL_FIELDS {
            sub_map.remove(name);
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
