//! Error types for the netlink core.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the netlink core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Socket creation, binding or tuning failed.
    #[error("{operation}: {source}")]
    Setup {
        /// The setup step that failed.
        operation: &'static str,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// The kernel does not know the requested generic netlink family.
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound {
        /// The family name that was not found.
        name: String,
    },

    /// The family does not expose the requested multicast group.
    #[error("multicast group not found: {name} in family {family}")]
    GroupNotFound {
        /// The family that was searched.
        family: String,
        /// The group name that was not found.
        name: String,
    },

    /// Buffer too short for the structure it should contain.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected length.
        expected: usize,
        /// Actual bytes available.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// A datagram write consumed fewer bytes than the frame length.
    #[error("short send: wrote {written} of {len} bytes")]
    ShortSend {
        /// Bytes the kernel accepted.
        written: usize,
        /// Frame length.
        len: usize,
    },

    /// `start()` was called on a manager that already ran.
    #[error("netlink manager already started")]
    AlreadyStarted,

    /// Operation requires a started, not-yet-closed manager.
    #[error("netlink manager not ready")]
    NotReady,
}

impl Error {
    /// Create a kernel error from a (negative) errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Adapter for mapping socket setup failures.
    pub(crate) fn setup(operation: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Setup { operation, source }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(-2); // ENOENT
        assert_eq!(err.errno(), Some(2));
        assert!(err.to_string().contains("errno 2"));
    }

    #[test]
    fn test_setup_context() {
        let err = Error::setup("binding netlink socket")(io::Error::from_raw_os_error(13));
        let msg = err.to_string();
        assert!(msg.contains("binding netlink socket"));
    }

    #[test]
    fn test_error_messages() {
        let err = Error::FamilyNotFound {
            name: "nl80211".into(),
        };
        assert_eq!(
            err.to_string(),
            "generic netlink family not found: nl80211"
        );

        let err = Error::ShortSend {
            written: 12,
            len: 32,
        };
        assert_eq!(err.to_string(), "short send: wrote 12 of 32 bytes");
    }
}
