//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - GET:    key_len (4 bytes) + key
//! - PUT:    key_len (4 bytes) + key + value
//! - PING:   empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use super::{Command, CommandType, Response, Status};
use crate::error::{KeyDbError, Result};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as one frame
pub fn encode_command(command: &Command) -> Vec<u8> {
    let payload = match command {
        Command::Get { key } => key_prefixed(key, &[]),
        Command::Put { key, value } => key_prefixed(key, value),
        Command::Ping => Vec::new(),
    };

    frame(command.command_type() as u8, &payload)
}

/// Decode one command frame
///
/// The key length is checked against the payload; GET and PING reject
/// anything left over.
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (tag, payload) = split_frame(bytes, "command")?;
    let command_type = CommandType::try_from(tag)?;

    match command_type {
        CommandType::Get => {
            let (key, rest) = split_key(payload, command_type)?;
            if !rest.is_empty() {
                return Err(KeyDbError::Protocol(format!(
                    "{} command: {} unexpected bytes after key",
                    command_type,
                    rest.len()
                )));
            }
            Ok(Command::Get { key: key.to_vec() })
        }
        CommandType::Put => {
            let (key, value) = split_key(payload, command_type)?;
            Ok(Command::Put {
                key: key.to_vec(),
                value: value.to_vec(),
            })
        }
        CommandType::Ping => {
            if !payload.is_empty() {
                return Err(KeyDbError::Protocol(format!(
                    "{} command: unexpected payload of {} bytes",
                    command_type,
                    payload.len()
                )));
            }
            Ok(Command::Ping)
        }
    }
}

fn key_prefixed(key: &[u8], rest: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + key.len() + rest.len());
    payload.extend_from_slice(&(key.len() as u32).to_be_bytes());
    payload.extend_from_slice(key);
    payload.extend_from_slice(rest);
    payload
}

/// Split a `key_len (4) + key + rest` payload
fn split_key(payload: &[u8], command_type: CommandType) -> Result<(&[u8], &[u8])> {
    if payload.len() < 4 {
        return Err(KeyDbError::Protocol(format!(
            "{} command: missing key length",
            command_type
        )));
    }

    let key_len = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
    let rest = &payload[4..];

    if rest.len() < key_len {
        return Err(KeyDbError::Protocol(format!(
            "{} command: incomplete key (expected {}, got {})",
            command_type,
            key_len,
            rest.len()
        )));
    }

    Ok(rest.split_at(key_len))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response as one frame
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or_default();
    frame(response.status as u8, payload)
}

/// Decode one response frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (tag, payload) = split_frame(bytes, "response")?;

    Ok(Response {
        status: Status::try_from(tag)?,
        payload: (!payload.is_empty()).then(|| payload.to_vec()),
    })
}

// =============================================================================
// Framing
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(tag);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Validate the header and return (tag, payload)
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(KeyDbError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = payload_len(&bytes[..HEADER_SIZE], what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(KeyDbError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total_len]))
}

/// Parse and bound the payload length from a header
fn payload_len(header: &[u8], what: &str) -> Result<usize> {
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if len > MAX_PAYLOAD_SIZE {
        return Err(KeyDbError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len as usize)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = payload_len(&header, what)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut message[HEADER_SIZE..])?;

    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader, "command")?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
