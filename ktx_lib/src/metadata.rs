//! Arbitrary key value data stored after the header.
//!
//! Each entry is stored as a 4 byte size followed by the key, a null byte, the value,
//! and padding to the next multiple of 4 bytes.
//! Entries are written in insertion order and duplicate keys are preserved.
use std::io::{Cursor, Seek, SeekFrom};

use binrw::{BinRead, BinResult, BinWrite, Endian};
use log::trace;

use crate::{
    codec::write_u32_len,
    error::{DecodeError, MetadataError},
};

/// The standard key for the logical orientation of the texture like `"S=r,T=d"`.
pub const KTX_ORIENTATION: &str = "KTXorientation";

/// A single key value entry.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KeyValue {
    key: String,
    value: Vec<u8>,
}

impl KeyValue {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The `keyAndValueByteSize` field including the null separator but not padding.
    fn byte_size(&self) -> usize {
        self.key.len() + 1 + self.value.len()
    }

    fn serialized_length(&self) -> usize {
        4 + self.byte_size().next_multiple_of(4)
    }
}

/// The ordered key value entries for a [Bundle](crate::bundle::Bundle).
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Metadata {
    entries: Vec<KeyValue>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry after any existing entries.
    ///
    /// Returns an error if `key` is empty or contains a null byte.
    pub fn push<K: Into<String>, V: Into<Vec<u8>>>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<(), MetadataError> {
        let key = key.into();
        if key.is_empty() {
            return Err(MetadataError::EmptyKey);
        }
        if key.contains('\0') {
            return Err(MetadataError::KeyContainsNul(key));
        }

        self.entries.push(KeyValue {
            key,
            value: value.into(),
        });
        Ok(())
    }

    /// The value of the first entry with the given `key`.
    pub fn get<'a>(&'a self, key: &'a str) -> Option<&'a [u8]> {
        self.get_all(key).next()
    }

    /// The values of all entries with the given `key` in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.key == key)
            .map(|e| e.value.as_slice())
    }

    /// Remove all entries with the given `key` and return the number of removed entries.
    pub fn remove(&mut self, key: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[KeyValue] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The size in bytes of all entries including padding.
    /// This is the `bytesOfKeyValueData` field in the header.
    pub fn serialized_length(&self) -> usize {
        self.entries.iter().map(KeyValue::serialized_length).sum()
    }

    /// Parse all entries in `block`.
    /// `block_offset` is the position of `block` in the file for error reporting.
    pub(crate) fn read_block(
        block: &[u8],
        block_offset: usize,
        endian: Endian,
    ) -> Result<Self, DecodeError> {
        let mut reader = Cursor::new(block);
        let mut entries = Vec::new();

        while (reader.position() as usize) < block.len() {
            let start = reader.position() as usize;
            let malformed = |reason: String| DecodeError::MalformedMetadata {
                offset: block_offset + start,
                reason,
            };

            let remaining = block.len() - start;
            if remaining < 4 {
                return Err(malformed(format!(
                    "{remaining} bytes remain but the entry size requires 4 bytes"
                )));
            }
            let byte_size = u32::read_options(&mut reader, endian, ())? as u64;

            // The size excludes padding, but the padding must also fit in the block.
            let padded_size = byte_size.next_multiple_of(4);
            if padded_size > (remaining - 4) as u64 {
                return Err(malformed(format!(
                    "entry size {byte_size} with padding exceeds the {} remaining bytes",
                    remaining - 4
                )));
            }

            let data_start = start + 4;
            let data = &block[data_start..data_start + byte_size as usize];
            let separator = data
                .iter()
                .position(|b| *b == 0)
                .ok_or_else(|| malformed("key is not null terminated".to_string()))?;
            if separator == 0 {
                return Err(malformed("key is empty".to_string()));
            }
            let key = std::str::from_utf8(&data[..separator])
                .map_err(|e| malformed(format!("key is not valid UTF-8: {e}")))?;

            trace!("key value entry {key:?}: {}", block_offset + start);
            entries.push(KeyValue {
                key: key.to_string(),
                value: data[separator + 1..].to_vec(),
            });

            reader.seek(SeekFrom::Start((data_start as u64) + padded_size))?;
        }

        Ok(Self { entries })
    }
}

impl BinWrite for Metadata {
    type Args<'a> = ();

    fn write_options<W: std::io::Write + std::io::Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        for entry in &self.entries {
            let byte_size = entry.byte_size();
            write_u32_len(writer, endian, byte_size, "key value entry")?;
            writer.write_all(entry.key.as_bytes())?;
            writer.write_all(&[0u8])?;
            writer.write_all(&entry.value)?;

            let padding = byte_size.next_multiple_of(4) - byte_size;
            writer.write_all(&[0u8; 3][..padding])?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a KeyValue;
    type IntoIter = std::slice::Iter<'a, KeyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
