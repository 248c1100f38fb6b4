//! Segment codec
//!
//! Whole-file encoding and decoding. A segment is a memtable snapshot, so
//! it is built in memory and written with a single call.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::entry::Entry;
use crate::error::Corruption;

use super::{ENTRY_HEADER_SIZE, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Encode entries into a complete segment image
///
/// Fails only if a key or value is longer than `u32::MAX` bytes.
pub fn encode_segment(entries: &[Entry]) -> io::Result<Bytes> {
    let body_len: usize = entries
        .iter()
        .map(|entry| ENTRY_HEADER_SIZE + entry.size())
        .sum();

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body_len + FOOTER_SIZE);
    buf.put_slice(MAGIC);
    buf.put_u16_le(VERSION);
    buf.put_u64_le(entries.len() as u64);

    for entry in entries {
        buf.put_u32_le(length_prefix(entry.key.len(), "key")?);
        buf.put_u32_le(length_prefix(entry.value.len(), "value")?);
        buf.put_slice(&entry.key);
        buf.put_slice(&entry.value);
    }

    let crc = crc32fast::hash(&buf);
    buf.put_u32_le(crc);

    Ok(buf.freeze())
}

/// Decode a complete segment image
pub fn decode_segment(data: &[u8]) -> Result<Vec<Entry>, Corruption> {
    ensure(data, HEADER_SIZE + FOOTER_SIZE, "header")?;

    let (content, mut footer) = data.split_at(data.len() - FOOTER_SIZE);
    let mut header = &content[..HEADER_SIZE];

    let mut magic = [0u8; 4];
    header.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err(Corruption::BadMagic(magic));
    }

    let version = header.get_u16_le();
    if version != VERSION {
        return Err(Corruption::UnsupportedVersion(version));
    }

    let count = header.get_u64_le();

    let stored = footer.get_u32_le();
    let computed = crc32fast::hash(content);
    if stored != computed {
        return Err(Corruption::ChecksumMismatch { stored, computed });
    }

    let mut body = &content[HEADER_SIZE..];

    // The count is untrusted until the entries are actually there.
    let capacity = usize::try_from(count)
        .unwrap_or(usize::MAX)
        .min(body.len() / ENTRY_HEADER_SIZE);
    let mut entries = Vec::with_capacity(capacity);

    for _ in 0..count {
        ensure(body, ENTRY_HEADER_SIZE, "entry header")?;
        let key_len = body.get_u32_le() as usize;
        let value_len = body.get_u32_le() as usize;

        ensure(body, key_len.saturating_add(value_len), "entry data")?;
        let key = body[..key_len].to_vec();
        body.advance(key_len);
        let value = body[..value_len].to_vec();
        body.advance(value_len);

        entries.push(Entry { key, value });
    }

    if !body.is_empty() {
        return Err(Corruption::TrailingBytes(body.len()));
    }

    Ok(entries)
}

fn ensure(buf: &[u8], needed: usize, context: &'static str) -> Result<(), Corruption> {
    if buf.len() < needed {
        return Err(Corruption::Truncated {
            context,
            needed,
            remaining: buf.len(),
        });
    }
    Ok(())
}

fn length_prefix(len: usize, what: &str) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{what} of {len} bytes exceeds the segment format limit"),
        )
    })
}
