//! Error types for routerd.

use crate::daemon::LifecycleState;
use crate::resolver::ResolveError;
use std::path::PathBuf;
use thiserror::Error;
use xdp_router_bpf::BpfError;

/// Errors that can occur in routerd.
///
/// Every variant carries enough context to name the offending entity.
#[derive(Debug, Error)]
pub enum RouterdError {
    /// Malformed or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data-plane program failed to load
    #[error("Failed to load data-plane program: {0}")]
    Load(#[source] BpfError),

    /// Attaching to one interface failed
    #[error("Failed to attach to interface {interface}: {source}")]
    Attach {
        interface: String,
        #[source]
        source: BpfError,
    },

    /// An interface named by a table entry could not be resolved
    #[error("Failed to resolve interface for {entity}: {source}")]
    Resolve {
        entity: String,
        #[source]
        source: ResolveError,
    },

    /// Encoding or writing a table entry failed
    #[error("Failed to apply {entity}: {source}")]
    TableWrite {
        entity: String,
        #[source]
        source: BpfError,
    },

    /// Reading a table or counter failed
    #[error("Failed to read {entity}: {source}")]
    TableRead {
        entity: String,
        #[source]
        source: BpfError,
    },

    /// A lifecycle operation was called out of order
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },
}

impl RouterdError {
    pub fn config(message: impl Into<String>) -> Self {
        RouterdError::Config(message.into())
    }

    pub fn table_write(entity: impl Into<String>, source: BpfError) -> Self {
        RouterdError::TableWrite {
            entity: entity.into(),
            source,
        }
    }

    pub fn table_read(entity: impl Into<String>, source: BpfError) -> Self {
        RouterdError::TableRead {
            entity: entity.into(),
            source,
        }
    }

    /// Returns true for errors raised while the program was being attached.
    pub fn is_attach(&self) -> bool {
        matches!(self, RouterdError::Attach { .. })
    }
}

/// Result type alias for routerd operations.
pub type Result<T> = std::result::Result<T, RouterdError>;
