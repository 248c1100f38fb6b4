//! Protocol messages
//!
//! Requests a client sends and the replies it gets back. Tags are the
//! first byte of every frame.

use std::fmt;

use crate::error::KeyDbError;

// =============================================================================
// Requests
// =============================================================================

/// Request tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Put = 0x02,
    // 0x03 is unassigned; there is no delete
    Ping = 0x04,
}

impl TryFrom<u8> for CommandType {
    type Error = KeyDbError;

    fn try_from(tag: u8) -> Result<Self, KeyDbError> {
        match tag {
            0x01 => Ok(CommandType::Get),
            0x02 => Ok(CommandType::Put),
            0x04 => Ok(CommandType::Ping),
            _ => Err(KeyDbError::Protocol(format!(
                "Unknown command type: 0x{:02x}",
                tag
            ))),
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandType::Get => "GET",
            CommandType::Put => "PUT",
            CommandType::Ping => "PING",
        })
    }
}

/// A decoded client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { key: Vec<u8> },
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Liveness probe, answered with `PONG`
    Ping,
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Put { .. } => CommandType::Put,
            Command::Ping => CommandType::Ping,
        }
    }

    /// Key the command addresses, if any
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Command::Get { key } | Command::Put { key, .. } => Some(key.as_slice()),
            Command::Ping => None,
        }
    }
}

// =============================================================================
// Replies
// =============================================================================

/// Reply tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
}

impl TryFrom<u8> for Status {
    type Error = KeyDbError;

    fn try_from(tag: u8) -> Result<Self, KeyDbError> {
        match tag {
            0x00 => Ok(Status::Ok),
            0x01 => Ok(Status::NotFound),
            0x02 => Ok(Status::Error),
            _ => Err(KeyDbError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                tag
            ))),
        }
    }
}

/// A reply to one command
///
/// `payload` carries the value for a GET hit, `PONG` for PING, and the
/// error text for ERROR. An empty payload decodes as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub payload: Option<Vec<u8>>,
}

impl Response {
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Payload rendered as text (lossy), empty if there is none
    pub fn payload_text(&self) -> String {
        self.payload
            .as_deref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }
}
