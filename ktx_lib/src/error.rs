use thiserror::Error;

use crate::index::BlobIndex;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error(
    "index ({index}) is out of bounds for {mip_count} mips, {array_length} layers, and {face_count} faces"
)]
pub struct OutOfBoundsError {
    pub index: BlobIndex,
    pub mip_count: u32,
    pub array_length: u32,
    pub face_count: u32,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CreateBundleError {
    #[error(
        "expected at least 1 mip and 1 array layer but found {mip_count} mips and {array_length} layers"
    )]
    InvalidDimensions { mip_count: u32, array_length: u32 },

    #[error(
        "{mip_count} mips, {array_length} layers, and {face_count} faces is too many images to allocate"
    )]
    TooManyImages {
        mip_count: u32,
        array_length: u32,
        face_count: u32,
    },
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MetadataError {
    #[error("metadata keys must not be empty")]
    EmptyKey,

    #[error("metadata key {0:?} contains a null byte")]
    KeyContainsNul(String),
}

/// The reason the fixed size header could not be parsed.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MalformedHeaderKind {
    #[error("expected at least {expected} bytes for the header but found {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("file identifier {0:02x?} does not match KTX 1.1")]
    Identifier([u8; 12]),

    #[error("endianness marker {0:#010x} is not a valid byte order")]
    EndiannessMarker(u32),

    #[error("number of faces must be 1 or 6 but found {0}")]
    FaceCount(u32),

    #[error("number of mipmap levels must not be 0")]
    ZeroMipCount,

    #[error("number of array elements must not be 0")]
    ZeroArrayLength,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed header: {0}")]
    MalformedHeader(#[from] MalformedHeaderKind),

    #[error("expected {expected} bytes of key value data but only {remaining} bytes remain")]
    TruncatedMetadata { expected: usize, remaining: usize },

    #[error("malformed key value entry at offset {offset}: {reason}")]
    MalformedMetadata { offset: usize, reason: String },

    #[error("image data for {index} expected {expected} bytes but only {remaining} bytes remain")]
    TruncatedBlobData {
        index: BlobIndex,
        expected: usize,
        remaining: usize,
    },

    #[error("error reading data: {0}")]
    Io(#[from] std::io::Error),

    #[error("error reading data: {0}")]
    Binrw(#[from] binrw::Error),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("destination has {actual} bytes but {expected} bytes are required")]
    DestinationTooSmall { expected: usize, actual: usize },

    #[error("error writing data: {0}")]
    Binrw(#[from] binrw::Error),
}
