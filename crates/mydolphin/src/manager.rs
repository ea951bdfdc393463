// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-entry configuration manager.
//!
//! A [`ConfigManager`] owns the in-memory state of one entry. `initialize`
//! loads the entry's record from the shared document, resolves the entry's
//! encryption key, persists defaults for a new entry, and resolves the host
//! credentials. Afterwards the typed accessors read and mutate that state;
//! every mutation is merged back into the shared document.
//!
//! The password only ever lives in memory. The host keeps the token returned
//! by [`ConfigManager::password_hashed`] and hands it back on the next start.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use mydolphin_core::{
    EntryCredentials, EntryDescriptor, EntryId, MyDolphinError, PersistedRecord,
    DETACHED_ENTRY_ID,
};
use mydolphin_vault::{
    resolve_key, CipherContext, EncryptionKey, KeyOrigin, LegacyKeyImporter, ResolvedKey,
};

use crate::shared::SharedStore;

struct ManagerState {
    record: PersistedRecord,
    key_origin: KeyOrigin,
    cipher: CipherContext,
    /// Whether a persisted record existed when the state was loaded.
    persisted: bool,
    username: String,
    password: Option<SecretString>,
}

/// Owns and persists the configuration of one entry.
pub struct ConfigManager {
    descriptor: EntryDescriptor,
    credentials: EntryCredentials,
    store: Option<SharedStore>,
    legacy: Option<Arc<LegacyKeyImporter>>,
    /// Last resolved key. Survives a failed `initialize`.
    carried_key: Option<(EncryptionKey, KeyOrigin)>,
    state: Option<ManagerState>,
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("entry_id", &self.descriptor.entry_id)
            .field("title", &self.descriptor.title)
            .field("store", &self.store)
            .field("initialized", &self.state.is_some())
            .finish()
    }
}

impl ConfigManager {
    /// Create a manager bound to an entry of the shared document.
    pub fn new(
        descriptor: EntryDescriptor,
        credentials: EntryCredentials,
        store: SharedStore,
        legacy: Option<Arc<LegacyKeyImporter>>,
    ) -> Self {
        Self {
            descriptor,
            credentials,
            store: Some(store),
            legacy,
            carried_key: None,
            state: None,
        }
    }

    /// Create a manager with no durable store.
    ///
    /// Used to validate credentials before an entry exists: the key lives
    /// in memory only, saves do nothing, and no legacy import runs.
    pub fn detached(credentials: EntryCredentials, title: impl Into<String>) -> Self {
        Self {
            descriptor: EntryDescriptor::new(DETACHED_ENTRY_ID, title),
            credentials,
            store: None,
            legacy: None,
            carried_key: None,
            state: None,
        }
    }

    /// Load persisted state, resolve the key, and resolve the credentials.
    ///
    /// A new entry gets default state saved immediately. When the entry
    /// already had a record, or its key was imported from a legacy artifact,
    /// a non-empty host password is a token from a previous
    /// [`password_hashed`](Self::password_hashed) and is decrypted.
    ///
    /// The record is saved before credentials are resolved, so a key
    /// imported from a legacy artifact is persisted even when the password
    /// then fails to decrypt.
    ///
    /// Calling this again reloads the record. A key that is already held in
    /// memory, including one from a failed attempt, is kept while the
    /// document still has no key for the entry.
    pub async fn initialize(&mut self) -> Result<(), MyDolphinError> {
        let entry_id = self.descriptor.entry_id.clone();

        let existing = match &self.store {
            Some(store) => store.load_record(&entry_id).await?,
            None => None,
        };
        let persisted = existing.is_some();

        let resolved = self.resolve_entry_key(&entry_id, existing.as_ref()).await?;
        let cipher = resolved.cipher()?;
        let origin = resolved.origin;

        let mut record = existing.unwrap_or_default();
        record.encryption_key = Some(resolved.key.expose().to_string());
        self.carried_key = Some((resolved.key, origin));

        if origin != KeyOrigin::Record
            && let Some(store) = &self.store
        {
            store.save_record(&entry_id, &record).await?;
        }

        // A legacy key was written by an older release that already handed
        // an encrypted password to the host.
        let encrypted = persisted || matches!(origin, KeyOrigin::Legacy(_));
        let (username, password) = resolve_credentials(&self.credentials, &cipher, encrypted)?;

        debug!(
            entry_id = %entry_id,
            persisted,
            key_origin = ?origin,
            "initialized entry state"
        );

        self.state = Some(ManagerState {
            record,
            key_origin: origin,
            cipher,
            persisted,
            username,
            password,
        });
        Ok(())
    }

    /// Replace the host credential source.
    ///
    /// Nothing is persisted. Once initialized, the in-memory username and
    /// password are refreshed right away; the password is decrypted when the
    /// entry lives in a durable store.
    pub fn update_credentials(
        &mut self,
        credentials: EntryCredentials,
    ) -> Result<(), MyDolphinError> {
        if let Some(state) = self.state.as_mut() {
            let encrypted = self.store.is_some();
            let (username, password) =
                resolve_credentials(&credentials, &state.cipher, encrypted)?;
            state.username = username;
            state.password = password;
        }
        self.credentials = credentials;
        Ok(())
    }

    /// Set the AWS token encryption key and persist it.
    pub async fn update_aws_token_encrypted_key(
        &mut self,
        key: Option<String>,
    ) -> Result<(), MyDolphinError> {
        self.state_mut()?.record.aws_token_encrypted_key = key;
        self.persist().await
    }

    /// Set the locating flag and persist it.
    pub async fn update_is_locating(&mut self, state: bool) -> Result<(), MyDolphinError> {
        self.state_mut()?.record.locating = state;
        self.persist().await
    }

    /// Display name of the entry.
    pub fn name(&self) -> &str {
        &self.descriptor.title
    }

    /// Identifier of the entry inside the shared document.
    pub fn entry_id(&self) -> &EntryId {
        &self.descriptor.entry_id
    }

    /// Whether [`initialize`](Self::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Whether the entry had a persisted record when it was last loaded.
    pub fn was_persisted(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.persisted)
    }

    /// Where the entry's key came from, once initialized.
    pub fn key_origin(&self) -> Option<KeyOrigin> {
        self.state.as_ref().map(|s| s.key_origin)
    }

    /// Username from the host credentials, once initialized.
    pub fn username(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.username.as_str())
    }

    /// Plaintext password. Never persisted.
    pub fn password(&self) -> Option<&SecretString> {
        self.state.as_ref().and_then(|s| s.password.as_ref())
    }

    /// Encrypt the current password under the entry's key.
    ///
    /// Every call produces a fresh token; nothing is cached.
    pub fn password_hashed(&self) -> Result<Option<String>, MyDolphinError> {
        let state = self.state()?;
        let password = state.password.as_ref().map(|p| p.expose_secret());
        state.cipher.encrypt(password)
    }

    /// Whether the robot is being located. `false` before initialization.
    pub fn is_locating(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.record.locating)
    }

    /// Key protecting the cached AWS token, if one was stored.
    pub fn aws_token_encrypted_key(&self) -> Option<&str> {
        self.state
            .as_ref()
            .and_then(|s| s.record.aws_token_encrypted_key.as_deref())
    }

    /// The non-credential state, as it is persisted.
    pub fn data(&self) -> Option<&PersistedRecord> {
        self.state.as_ref().map(|s| &s.record)
    }

    async fn resolve_entry_key(
        &self,
        entry_id: &EntryId,
        existing: Option<&PersistedRecord>,
    ) -> Result<ResolvedKey, MyDolphinError> {
        let record_has_key = existing
            .and_then(|r| r.encryption_key.as_deref())
            .is_some_and(|k| !k.trim().is_empty());

        if !record_has_key && let Some((key, origin)) = &self.carried_key {
            debug!(entry_id = %entry_id, "keeping in-memory key, document has none");
            return Ok(ResolvedKey {
                key: key.clone(),
                origin: *origin,
            });
        }

        let legacy = match existing {
            Some(_) => None,
            None => self.legacy.as_deref(),
        };
        let resolved = resolve_key(entry_id, existing, legacy).await?;
        if let KeyOrigin::Legacy(source) = resolved.origin {
            info!(entry_id = %entry_id, ?source, "adopted legacy encryption key");
        }
        Ok(resolved)
    }

    async fn persist(&self) -> Result<(), MyDolphinError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let state = self.state()?;
        store.save_record(&self.descriptor.entry_id, &state.record).await
    }

    fn state(&self) -> Result<&ManagerState, MyDolphinError> {
        self.state
            .as_ref()
            .ok_or_else(|| MyDolphinError::NotInitialized {
                entry_id: self.descriptor.entry_id.to_string(),
            })
    }

    fn state_mut(&mut self) -> Result<&mut ManagerState, MyDolphinError> {
        let entry_id = &self.descriptor.entry_id;
        self.state
            .as_mut()
            .ok_or_else(|| MyDolphinError::NotInitialized {
                entry_id: entry_id.to_string(),
            })
    }
}

fn resolve_credentials(
    credentials: &EntryCredentials,
    cipher: &CipherContext,
    encrypted: bool,
) -> Result<(String, Option<SecretString>), MyDolphinError> {
    let password = match credentials.password.as_deref() {
        Some(token) if encrypted && !token.is_empty() => Some(cipher.decrypt_str(token)?),
        other => other.map(str::to_string),
    };
    Ok((
        credentials.username.clone(),
        password.map(SecretString::from),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(password: Option<&str>) -> EntryCredentials {
        EntryCredentials::new("u", password.map(str::to_string))
    }

    #[tokio::test]
    async fn accessors_before_initialize() {
        let manager = ConfigManager::detached(creds(Some("p")), "MyDolphin Plus");

        assert_eq!(manager.name(), "MyDolphin Plus");
        assert_eq!(manager.entry_id().as_str(), DETACHED_ENTRY_ID);
        assert!(!manager.is_initialized());
        assert!(manager.username().is_none());
        assert!(manager.password().is_none());
        assert!(!manager.is_locating());
        assert!(manager.data().is_none());
        assert!(matches!(
            manager.password_hashed(),
            Err(MyDolphinError::NotInitialized { .. })
        ));
    }

    #[tokio::test]
    async fn updates_before_initialize_are_rejected() {
        let mut manager = ConfigManager::detached(creds(None), "t");
        assert!(matches!(
            manager.update_is_locating(true).await,
            Err(MyDolphinError::NotInitialized { .. })
        ));
    }

    #[tokio::test]
    async fn detached_manager_keeps_plaintext_and_stable_key() {
        let mut manager = ConfigManager::detached(creds(Some("p")), "t");
        manager.initialize().await.unwrap();

        assert_eq!(manager.username(), Some("u"));
        assert_eq!(manager.password().unwrap().expose_secret(), "p");
        assert_eq!(manager.key_origin(), Some(KeyOrigin::Generated));
        assert!(!manager.was_persisted());

        let key = manager.data().unwrap().encryption_key.clone();
        manager.initialize().await.unwrap();
        assert_eq!(manager.data().unwrap().encryption_key, key);

        manager.update_is_locating(true).await.unwrap();
        assert!(manager.is_locating());
    }

    #[tokio::test]
    async fn password_hashed_is_fresh_each_call() {
        let mut manager = ConfigManager::detached(creds(Some("p")), "t");
        manager.initialize().await.unwrap();

        let a = manager.password_hashed().unwrap().unwrap();
        let b = manager.password_hashed().unwrap().unwrap();
        assert_ne!(a, b);
        assert_ne!(a, "p");
    }

    #[tokio::test]
    async fn null_password_hashes_to_none() {
        let mut manager = ConfigManager::detached(creds(None), "t");
        manager.initialize().await.unwrap();
        assert_eq!(manager.password_hashed().unwrap(), None);
    }

    #[tokio::test]
    async fn detached_update_credentials_keeps_plaintext() {
        let mut manager = ConfigManager::detached(creds(Some("p")), "t");
        manager.initialize().await.unwrap();

        manager
            .update_credentials(EntryCredentials::new("v", Some("q".into())))
            .unwrap();
        assert_eq!(manager.username(), Some("v"));
        assert_eq!(manager.password().unwrap().expose_secret(), "q");
    }

    #[test]
    fn debug_never_shows_password() {
        let manager = ConfigManager::detached(creds(Some("hunter2")), "t");
        assert!(!format!("{manager:?}").contains("hunter2"));
    }
}
