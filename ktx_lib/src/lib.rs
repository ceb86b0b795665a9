//! A library for reading and writing KTX texture bundles.
//!
//! A [Bundle](bundle::Bundle) stores opaque image data
//! for each mip level, array layer, and cube face along with the pixel format, dimensions, and arbitrary key value metadata.
//!
//! # Getting Started
//! Bundles are read from and written to byte buffers.
//! Reading and writing files is left to the caller.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ktx_lib::{bundle::Bundle, index::BlobIndex};
//!
//! let mut bundle = Bundle::new(2, 1, false)?;
//! bundle.info_mut().pixel_width = 4;
//! bundle.info_mut().pixel_height = 4;
//! bundle.set_blob(BlobIndex::new(0, 0, 0), vec![0u8; 64])?;
//!
//! let bytes = bundle.to_bytes()?;
//! assert_eq!(bundle.serialized_length(), bytes.len());
//!
//! let bundle = Bundle::from_bytes(&bytes)?;
//! assert_eq!(Some(&[0u8; 64][..]), bundle.blob(BlobIndex::new(0, 0, 0)));
//! assert_eq!(None, bundle.blob(BlobIndex::new(1, 0, 0)));
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! ktx_lib only validates the structure of the container.
//! Image data is never decoded or checked against the format in [KtxInfo](header::KtxInfo).
//! Input is treated as untrusted, and every size is checked against the remaining bytes
//! before reading or allocating, so invalid files produce an error instead of a panic.
//!
//! Writing always produces a file that can be read again with identical contents.
//! See [codec] for the layout of the image data.
pub mod blob;
pub mod bundle;
pub mod codec;
pub mod error;
pub mod header;
pub mod index;
pub mod metadata;

pub use bundle::Bundle;
pub use index::BlobIndex;
