//! Protocol Module
//!
//! Length-prefixed binary framing between `keydb-cli` and `keydb-server`.
//! Every frame is one tag byte, a big-endian `u32` payload length and the
//! payload. A connection carries any number of request/reply pairs.
//!
//! | Tag  | Request | Payload                       |
//! |------|---------|-------------------------------|
//! | 0x01 | GET     | key_len (4) + key             |
//! | 0x02 | PUT     | key_len (4) + key + value     |
//! | 0x04 | PING    | empty                         |
//!
//! | Tag  | Reply     | Payload                     |
//! |------|-----------|-----------------------------|
//! | 0x00 | OK        | value, `PONG`, or empty     |
//! | 0x01 | NOT_FOUND | empty                       |
//! | 0x02 | ERROR     | UTF-8 message               |

mod codec;
mod message;

pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use message::{Command, CommandType, Response, Status};
