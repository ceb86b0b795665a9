//! The fixed size header at the start of every KTX file.
//!
//! The header starts with [KTX_IDENTIFIER] and a 4 byte endianness marker
//! that determines the byte order of every integer in the rest of the file.
//! A writer stores [ENDIANNESS_MARKER] in its own byte order,
//! so readers on a different platform see the bytes reversed.
use binrw::{BinRead, Endian, binrw};

use crate::error::MalformedHeaderKind;

/// The 12 byte file identifier for KTX 1.1 `«KTX 11»\r\n\x1A\n`.
pub const KTX_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

pub const ENDIANNESS_MARKER: u32 = 0x04030201;

/// The size in bytes of the identifier, endianness marker, and [KtxHeader].
pub const HEADER_SIZE: usize = 64;

/// The pixel format and dimensions of the base mip level.
///
/// Format values use the OpenGL enums for the corresponding type and format.
/// Compressed formats use a `gl_type` and `gl_format` of 0.
#[binrw]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct KtxInfo {
    pub gl_type: u32,
    /// The size in bytes of the data type for endianness conversion or 1 for compressed data.
    pub gl_type_size: u32,
    pub gl_format: u32,
    pub gl_internal_format: u32,
    pub gl_base_internal_format: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
}

/// The header fields following the endianness marker.
#[binrw]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct KtxHeader {
    pub info: KtxInfo,
    /// The number of array layers.
    /// Unlike some KTX writers, this is never 0 for non array textures.
    pub number_of_array_elements: u32,
    /// 6 for cube maps and 1 otherwise.
    pub number_of_faces: u32,
    pub number_of_mipmap_levels: u32,
    /// The size of the key value data following the header.
    pub bytes_of_key_value_data: u32,
}

impl KtxHeader {
    /// Read the identifier, endianness marker, and header fields from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, Endian), crate::error::DecodeError> {
        if bytes.len() < HEADER_SIZE {
            return Err(MalformedHeaderKind::TooShort {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            }
            .into());
        }

        let endian = read_endian(bytes)?;

        let mut reader = std::io::Cursor::new(&bytes[16..HEADER_SIZE]);
        let header = Self::read_options(&mut reader, endian, ())?;
        header.validate()?;

        Ok((header, endian))
    }

    /// Check the invariants for the number of images.
    pub fn validate(&self) -> Result<(), MalformedHeaderKind> {
        if self.number_of_faces != 1 && self.number_of_faces != 6 {
            return Err(MalformedHeaderKind::FaceCount(self.number_of_faces));
        }
        if self.number_of_mipmap_levels == 0 {
            return Err(MalformedHeaderKind::ZeroMipCount);
        }
        if self.number_of_array_elements == 0 {
            return Err(MalformedHeaderKind::ZeroArrayLength);
        }
        Ok(())
    }
}

/// Check the identifier and detect the byte order from the endianness marker.
fn read_endian(bytes: &[u8]) -> Result<Endian, MalformedHeaderKind> {
    let mut identifier = [0u8; 12];
    identifier.copy_from_slice(&bytes[..12]);
    if identifier != KTX_IDENTIFIER {
        return Err(MalformedHeaderKind::Identifier(identifier));
    }

    let mut marker = [0u8; 4];
    marker.copy_from_slice(&bytes[12..16]);
    if u32::from_le_bytes(marker) == ENDIANNESS_MARKER {
        Ok(Endian::Little)
    } else if u32::from_be_bytes(marker) == ENDIANNESS_MARKER {
        Ok(Endian::Big)
    } else {
        Err(MalformedHeaderKind::EndiannessMarker(u32::from_le_bytes(
            marker,
        )))
    }
}
