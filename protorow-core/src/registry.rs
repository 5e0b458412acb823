//! # Descriptor Registry
//!
//! This module handles the loading and querying of Protobuf `FileDescriptorSet`s.
//! It acts as a database of schema definitions, allowing the rest of the crate to
//! resolve fully qualified message names into `MessageDescriptor` objects.
use prost_reflect::{DescriptorPool, MessageDescriptor};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read descriptor file: '{0}'")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode descriptor set: '{0}'")]
    Decode(#[from] prost_reflect::DescriptorError),
    #[error("Message '{0}' not found in the descriptor set")]
    MessageNotFound(String),
}

/// A registry that holds loaded Protobuf definitions and allows looking up
/// message types by their fully qualified name.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    pool: DescriptorPool,
}

impl SchemaRegistry {
    /// Decodes a `FileDescriptorSet` directly from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        let pool = DescriptorPool::decode(bytes)?;
        Ok(Self { pool })
    }

    /// Loads a `FileDescriptorSet` from a file on disk and builds the registry.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let bytes = std::fs::read(path.as_ref())?;
        debug!(
            path = %path.as_ref().display(),
            bytes = bytes.len(),
            "loaded descriptor set"
        );
        Self::from_bytes(&bytes)
    }

    /// Resolves a fully qualified message name (e.g. `my.package.MyMessage`)
    /// into a `MessageDescriptor`.
    pub fn get_message(&self, full_name: &str) -> Result<MessageDescriptor, RegistryError> {
        self.pool
            .get_message_by_name(full_name)
            .ok_or_else(|| RegistryError::MessageNotFound(full_name.to_string()))
    }

    /// Lists the fully qualified names of all message types in the registry.
    ///
    /// Synthetic map-entry messages are not real record types and are skipped.
    pub fn list_messages(&self) -> Vec<String> {
        self.pool
            .all_messages()
            .filter(|message| !message.is_map_entry())
            .map(|message| message.full_name().to_string())
            .collect()
    }

    /// Returns the underlying descriptor pool.
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}
