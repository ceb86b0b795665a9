//! Reading and writing [Bundle] to and from the KTX 1.1 binary layout.
//!
//! # Layout
//! | Field | Size |
//! | --- | --- |
//! | [KTX_IDENTIFIER] | 12 |
//! | [ENDIANNESS_MARKER] | 4 |
//! | [KtxHeader] | 48 |
//! | [Metadata] entries | `bytes_of_key_value_data` |
//! | image data for each [BlobIndex] | 4 + data size + padding |
//!
//! Image data is stored in the order described in [crate::index].
//! Every slot has its own 4 byte size followed by the data and padding
//! to the next multiple of 4 bytes. Empty slots have a size of 0.
//! This differs from the KTX 1.1 layout of a single `imageSize` per mip level,
//! so files from other KTX writers with more than one layer or face will not parse.
use std::io::{Cursor, Read, Seek, Write};

use binrw::{BinRead, BinResult, BinWrite, Endian};
use log::{trace, warn};

use crate::{
    blob::BlobStore,
    bundle::Bundle,
    error::{DecodeError, EncodeError},
    header::{ENDIANNESS_MARKER, HEADER_SIZE, KTX_IDENTIFIER, KtxHeader},
    index::{BlobIndex, indices},
    metadata::Metadata,
};

/// The size of a single image including its size field and padding.
fn blob_serialized_length(data: Option<&[u8]>) -> usize {
    4 + data.map(|d| d.len().next_multiple_of(4)).unwrap_or_default()
}

/// Write `len` as a `u32` size field or fail if `len` does not fit.
pub(crate) fn write_u32_len<W: Write + Seek>(
    writer: &mut W,
    endian: Endian,
    len: usize,
    name: &str,
) -> BinResult<()> {
    let pos = writer.stream_position()?;
    let value = u32::try_from(len).map_err(|_| binrw::Error::AssertFail {
        pos,
        message: format!("{name} size {len} does not fit in a u32"),
    })?;
    value.write_options(writer, endian, ())
}

impl Bundle {
    /// Parse a bundle from the bytes of an entire KTX file.
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self, DecodeError> {
        let bytes = bytes.as_ref();

        let (header, endian) = KtxHeader::from_bytes(bytes)?;
        trace!("{header:?}, {endian:?}");

        let metadata_size = header.bytes_of_key_value_data as usize;
        let remaining = bytes.len() - HEADER_SIZE;
        if metadata_size > remaining {
            return Err(DecodeError::TruncatedMetadata {
                expected: metadata_size,
                remaining,
            });
        }
        let metadata_end = HEADER_SIZE + metadata_size;
        let metadata =
            Metadata::read_block(&bytes[HEADER_SIZE..metadata_end], HEADER_SIZE, endian)?;

        let mut reader = Cursor::new(bytes);
        reader.set_position(metadata_end as u64);

        // Push slots as they are read to avoid trusting the counts for allocation.
        let mut blobs = Vec::new();
        for index in indices(
            header.number_of_mipmap_levels,
            header.number_of_array_elements,
            header.number_of_faces,
        ) {
            blobs.push(read_blob(&mut reader, endian, index)?);
        }

        let end = reader.position() as usize;
        if end < bytes.len() {
            warn!("Ignoring {} bytes after image data", bytes.len() - end);
        }

        Ok(Bundle::from_parts(
            header.info,
            metadata,
            BlobStore::from_blobs(
                header.number_of_mipmap_levels,
                header.number_of_array_elements,
                header.number_of_faces,
                blobs,
            ),
        ))
    }

    /// Parse a bundle from the remaining bytes in `reader`.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    /// Write the bundle in little endian byte order.
    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> BinResult<()> {
        self.write_options(writer, Endian::Little, ())
    }

    /// Write the bundle with all integers in the given byte order.
    pub fn write_endian<W: Write + Seek>(&self, writer: &mut W, endian: Endian) -> BinResult<()> {
        self.write_options(writer, endian, ())
    }

    /// Write the bundle in little endian byte order to a new buffer.
    pub fn to_bytes(&self) -> BinResult<Vec<u8>> {
        let mut writer = Cursor::new(Vec::with_capacity(self.serialized_length()));
        self.write(&mut writer)?;
        Ok(writer.into_inner())
    }

    /// Write the bundle in little endian byte order to the start of `destination`
    /// and return the number of bytes written.
    ///
    /// Returns an error without writing anything
    /// if `destination` is smaller than [Self::serialized_length].
    pub fn serialize_into(&self, destination: &mut [u8]) -> Result<usize, EncodeError> {
        let expected = self.serialized_length();
        if destination.len() < expected {
            return Err(EncodeError::DestinationTooSmall {
                expected,
                actual: destination.len(),
            });
        }

        let mut writer = Cursor::new(&mut destination[..expected]);
        self.write(&mut writer)?;
        Ok(expected)
    }

    /// The size in bytes of the output of [Self::write] without writing any data.
    pub fn serialized_length(&self) -> usize {
        HEADER_SIZE
            + self.metadata().serialized_length()
            + self
                .blobs()
                .iter()
                .map(|(_, data)| blob_serialized_length(data))
                .sum::<usize>()
    }
}

fn read_blob(
    reader: &mut Cursor<&[u8]>,
    endian: Endian,
    index: BlobIndex,
) -> Result<Option<Vec<u8>>, DecodeError> {
    let bytes = *reader.get_ref();
    let start = reader.position() as usize;

    let remaining = bytes.len() - start;
    if remaining < 4 {
        return Err(DecodeError::TruncatedBlobData {
            index,
            expected: 4,
            remaining,
        });
    }
    let size = u32::read_options(reader, endian, ())? as u64;
    trace!("image {index} with size {size}: {start}");

    // Require padding to be present to detect truncated files.
    let padded_size = size.next_multiple_of(4);
    let remaining = remaining - 4;
    if padded_size > remaining as u64 {
        return Err(DecodeError::TruncatedBlobData {
            index,
            expected: padded_size as usize,
            remaining,
        });
    }

    let data_start = start + 4;
    reader.set_position(data_start as u64 + padded_size);
    Ok((size > 0).then(|| bytes[data_start..data_start + size as usize].to_vec()))
}

impl BinWrite for Bundle {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        writer.write_all(&KTX_IDENTIFIER)?;
        ENDIANNESS_MARKER.write_options(writer, endian, ())?;

        let header = self.header();
        header.info.write_options(writer, endian, ())?;
        header.number_of_array_elements.write_options(writer, endian, ())?;
        header.number_of_faces.write_options(writer, endian, ())?;
        header.number_of_mipmap_levels.write_options(writer, endian, ())?;
        write_u32_len(
            writer,
            endian,
            self.metadata().serialized_length(),
            "key value data",
        )?;

        self.metadata().write_options(writer, endian, ())?;

        for (_, data) in self.blobs().iter() {
            let data = data.unwrap_or_default();
            write_u32_len(writer, endian, data.len(), "image")?;
            writer.write_all(data)?;

            let padding = data.len().next_multiple_of(4) - data.len();
            writer.write_all(&[0u8; 3][..padding])?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hexlit::hex;
    use pretty_assertions::assert_eq;

    use crate::{error::MalformedHeaderKind, header::KtxInfo};

    fn rgba8_bundle() -> Bundle {
        let mut bundle = Bundle::new(2, 1, false).unwrap();
        *bundle.info_mut() = KtxInfo {
            gl_type: 0x1401,
            gl_type_size: 1,
            gl_format: 0x1908,
            gl_internal_format: 0x8058,
            gl_base_internal_format: 0x1908,
            pixel_width: 2,
            pixel_height: 1,
            pixel_depth: 0,
        };
        bundle.metadata_mut().push("k", vec![0x76]).unwrap();
        bundle
            .set_blob(BlobIndex::new(0, 0, 0), vec![1, 2, 3, 4, 5, 6, 7, 8])
            .unwrap();
        bundle.set_blob(BlobIndex::new(1, 0, 0), vec![9, 10]).unwrap();
        bundle
    }

    const RGBA8_LE: [u8; 92] = hex!(
        // identifier
        ab4b5458 203131bb 0d0a1a0a
        // endianness
        01020304
        // type, type size, format, internal format, base internal format
        01140000 01000000 08190000 58800000 08190000
        // width, height, depth
        02000000 01000000 00000000
        // array elements, faces, mips, key value data
        01000000 01000000 02000000 08000000
        // key value data
        03000000 6b007600
        // mip 0
        08000000 01020304 05060708
        // mip 1
        02000000 090a0000
    );

    #[test]
    fn write_little_endian() {
        let bundle = rgba8_bundle();
        assert_eq!(92, bundle.serialized_length());
        assert_eq!(RGBA8_LE.to_vec(), bundle.to_bytes().unwrap());
    }

    #[test]
    fn read_little_endian() {
        assert_eq!(rgba8_bundle(), Bundle::from_bytes(RGBA8_LE).unwrap());
    }

    #[test]
    fn write_read_big_endian() {
        let bundle = rgba8_bundle();

        let mut writer = Cursor::new(Vec::new());
        bundle.write_endian(&mut writer, Endian::Big).unwrap();
        let bytes = writer.into_inner();

        assert_eq!(bundle.serialized_length(), bytes.len());
        assert_eq!(&hex!(04030201 00001401), &bytes[12..20]);
        assert_eq!(&hex!(00000003 6b007600), &bytes[64..72]);
        assert_eq!(&hex!(00000002 090a0000), &bytes[84..92]);
        assert_eq!(bundle, Bundle::from_bytes(&bytes).unwrap());
    }

    #[test]
    fn read_from_reader() {
        let mut reader = Cursor::new(RGBA8_LE.to_vec());
        assert_eq!(rgba8_bundle(), Bundle::read(&mut reader).unwrap());
    }

    #[test]
    fn read_trailing_bytes() {
        let mut bytes = RGBA8_LE.to_vec();
        bytes.extend_from_slice(&[0xff; 5]);
        assert_eq!(rgba8_bundle(), Bundle::from_bytes(&bytes).unwrap());
    }

    #[test]
    fn serialize_into_exact_buffer() {
        let bundle = rgba8_bundle();
        let mut destination = [0xffu8; 100];
        assert_eq!(92, bundle.serialize_into(&mut destination).unwrap());
        assert_eq!(&RGBA8_LE[..], &destination[..92]);
        assert_eq!(&[0xffu8; 8][..], &destination[92..]);
    }

    #[test]
    fn serialize_into_small_buffer() {
        let bundle = rgba8_bundle();
        let mut destination = [0u8; 91];
        assert!(matches!(
            bundle.serialize_into(&mut destination),
            Err(EncodeError::DestinationTooSmall {
                expected: 92,
                actual: 91
            })
        ));
        assert!(destination.iter().all(|b| *b == 0));
    }

    #[test]
    fn write_empty_cube_map() {
        let bundle = Bundle::new(1, 1, true).unwrap();
        let bytes = bundle.to_bytes().unwrap();

        // Each face has only a 0 size.
        assert_eq!(64 + 6 * 4, bytes.len());
        assert!(bytes[64..].iter().all(|b| *b == 0));

        let new_bundle = Bundle::from_bytes(&bytes).unwrap();
        assert!(new_bundle.is_cubemap());
        assert!(new_bundle.blobs().iter().all(|(_, data)| data.is_none()));
    }

    #[test]
    fn read_invalid_face_count() {
        let mut bytes = RGBA8_LE;
        bytes[52] = 3;
        assert!(matches!(
            Bundle::from_bytes(bytes),
            Err(DecodeError::MalformedHeader(MalformedHeaderKind::FaceCount(3)))
        ));
    }

    #[test]
    fn read_truncated_metadata() {
        let mut bytes = RGBA8_LE;
        // Claim more key value data than the file contains.
        bytes[60] = 0xff;
        assert!(matches!(
            Bundle::from_bytes(bytes),
            Err(DecodeError::TruncatedMetadata {
                expected: 255,
                remaining: 28
            })
        ));
    }

    #[test]
    fn read_truncated_blob_data() {
        let mut bytes = RGBA8_LE;
        // Claim more data for mip 1 than the file contains.
        bytes[84] = 5;
        assert!(matches!(
            Bundle::from_bytes(bytes),
            Err(DecodeError::TruncatedBlobData {
                index: BlobIndex {
                    mip_level: 1,
                    array_index: 0,
                    cube_face: 0
                },
                expected: 8,
                remaining: 4
            })
        ));
    }

    #[test]
    fn write_size_fits_u32() {
        let mut writer = Cursor::new(Vec::new());
        write_u32_len(&mut writer, Endian::Big, u32::MAX as usize, "image").unwrap();
        assert_eq!(vec![0xff; 4], writer.into_inner());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn write_size_too_large() {
        let mut writer = Cursor::new(Vec::new());
        writer.set_position(8);
        let result = write_u32_len(&mut writer, Endian::Little, u32::MAX as usize + 1, "image");
        assert!(matches!(result, Err(binrw::Error::AssertFail { pos: 8, .. })));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn read_huge_counts() {
        let mut bytes = RGBA8_LE;
        bytes[48..52].copy_from_slice(&u32::MAX.to_le_bytes());
        bytes[56..60].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            Bundle::from_bytes(bytes),
            Err(DecodeError::TruncatedBlobData { .. })
        ));
    }
}
