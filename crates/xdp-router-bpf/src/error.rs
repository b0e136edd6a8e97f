//! Error types for data-plane operations.

use crate::table::MapFault;
use thiserror::Error;
use xdp_router_types::ParseError;

/// Error type for data-plane operations.
#[derive(Debug, Clone, Error)]
pub enum BpfError {
    /// The program image could not be read or loaded into the kernel.
    #[error("Program load failed: {message}")]
    Load { message: String },

    /// The program could not be attached to an interface.
    #[error("Attach to {interface} failed: {message}")]
    Attach { interface: String, message: String },

    /// The interface already carries an attachment from this manager.
    #[error("Interface {interface} (ifindex {ifindex}) is already attached")]
    AlreadyAttached { interface: String, ifindex: u32 },

    /// Detaching from an interface failed.
    #[error("Detach from {interface} failed: {message}")]
    Detach { interface: String, message: String },

    /// A key or value could not be encoded for the table.
    #[error("Invalid entry for {table}: {source}")]
    Encode {
        table: &'static str,
        #[source]
        source: ParseError,
    },

    /// The table has no room for another entry.
    #[error("Table full: {table}")]
    TableFull { table: &'static str },

    /// The kernel rejected a table write.
    #[error("Write to {table} failed: {message}")]
    TableWrite { table: &'static str, message: String },

    /// A table read or iteration failed.
    #[error("Lookup in {table} failed: {message}")]
    Lookup { table: &'static str, message: String },
}

impl BpfError {
    /// Creates a load error.
    pub fn load(message: impl Into<String>) -> Self {
        BpfError::Load {
            message: message.into(),
        }
    }

    /// Creates an attach error for an interface.
    pub fn attach(interface: impl Into<String>, message: impl Into<String>) -> Self {
        BpfError::Attach {
            interface: interface.into(),
            message: message.into(),
        }
    }

    /// Creates a detach error for an interface.
    pub fn detach(interface: impl Into<String>, message: impl Into<String>) -> Self {
        BpfError::Detach {
            interface: interface.into(),
            message: message.into(),
        }
    }

    /// Creates an encode error for a table.
    pub fn encode(table: &'static str, source: ParseError) -> Self {
        BpfError::Encode { table, source }
    }

    /// Converts a backend write failure into an error naming the table.
    pub fn write_fault(table: &'static str, fault: MapFault) -> Self {
        match fault {
            MapFault::Full => BpfError::TableFull { table },
            MapFault::Syscall(message) => BpfError::TableWrite { table, message },
        }
    }

    /// Converts a backend read failure into an error naming the table.
    pub fn read_fault(table: &'static str, fault: MapFault) -> Self {
        BpfError::Lookup {
            table,
            message: fault.to_string(),
        }
    }

    /// Returns true if this error came from writing a table entry.
    pub fn is_table_write(&self) -> bool {
        matches!(
            self,
            BpfError::Encode { .. } | BpfError::TableFull { .. } | BpfError::TableWrite { .. }
        )
    }

    /// Returns true if this error came from reading a table.
    pub fn is_lookup(&self) -> bool {
        matches!(self, BpfError::Lookup { .. })
    }

    /// Returns true if this error concerns attachment lifecycle.
    pub fn is_attach(&self) -> bool {
        matches!(
            self,
            BpfError::Attach { .. } | BpfError::AlreadyAttached { .. } | BpfError::Detach { .. }
        )
    }
}

/// Result type for data-plane operations.
pub type BpfResult<T> = Result<T, BpfError>;
