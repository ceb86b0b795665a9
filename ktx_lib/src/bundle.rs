//! The in memory representation of a KTX file.
use crate::{
    blob::BlobStore,
    error::{CreateBundleError, OutOfBoundsError},
    header::{KtxHeader, KtxInfo},
    index::BlobIndex,
    metadata::Metadata,
};

/// A texture with image data for each mip level, array layer, and cube face.
///
/// The number of mip levels, array layers, and faces is fixed at creation.
/// Image data for each [BlobIndex] is stored as an opaque byte buffer
/// and is not checked against the format in [KtxInfo].
///
/// A [Bundle] is a plain owned value and [Clone] copies all image data.
/// Wrap the bundle in [std::rc::Rc] or [std::sync::Arc] with interior mutability
/// for shared access from multiple owners.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Bundle {
    info: KtxInfo,
    metadata: Metadata,
    blobs: BlobStore,
}

impl Bundle {
    /// Create an empty bundle with no image data and default format values.
    ///
    /// Returns an error if `mip_count` or `array_length` is 0
    /// or if there are too many images to allocate.
    pub fn new(
        mip_count: u32,
        array_length: u32,
        is_cubemap: bool,
    ) -> Result<Self, CreateBundleError> {
        if mip_count == 0 || array_length == 0 {
            return Err(CreateBundleError::InvalidDimensions {
                mip_count,
                array_length,
            });
        }

        let face_count = if is_cubemap { 6 } else { 1 };
        Ok(Self {
            info: KtxInfo::default(),
            metadata: Metadata::new(),
            blobs: BlobStore::new(mip_count, array_length, face_count)?,
        })
    }

    pub(crate) fn from_parts(info: KtxInfo, metadata: Metadata, blobs: BlobStore) -> Self {
        Self {
            info,
            metadata,
            blobs,
        }
    }

    /// The pixel format and base mip level dimensions.
    pub fn info(&self) -> &KtxInfo {
        &self.info
    }

    /// Mutable access to the pixel format and base mip level dimensions.
    /// These values should be set before serializing.
    pub fn info_mut(&mut self) -> &mut KtxInfo {
        &mut self.info
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn mip_count(&self) -> u32 {
        self.blobs.mip_count()
    }

    pub fn array_length(&self) -> u32 {
        self.blobs.array_length()
    }

    /// 6 for cube maps and 1 otherwise.
    pub fn face_count(&self) -> u32 {
        self.blobs.face_count()
    }

    pub fn is_cubemap(&self) -> bool {
        self.face_count() == 6
    }

    /// The number of images including empty slots.
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// The image data at `index` or `None` if `index` is out of bounds or has no data.
    pub fn blob(&self, index: BlobIndex) -> Option<&[u8]> {
        self.blobs.get(index)
    }

    /// The image data at `index` or `None` if the slot has no data.
    ///
    /// Returns an error if `index` is out of bounds.
    pub fn try_blob(&self, index: BlobIndex) -> Result<Option<&[u8]>, OutOfBoundsError> {
        self.blobs.try_get(index)
    }

    /// Replace the image data at `index` with a copy of `data`.
    pub fn set_blob<T: Into<Vec<u8>>>(
        &mut self,
        index: BlobIndex,
        data: T,
    ) -> Result<(), OutOfBoundsError> {
        self.blobs.set(index, data)
    }

    /// The header fields written for this bundle.
    ///
    /// `bytes_of_key_value_data` saturates at [u32::MAX].
    /// Writing metadata that large fails instead.
    pub fn header(&self) -> KtxHeader {
        KtxHeader {
            info: self.info,
            number_of_array_elements: self.array_length(),
            number_of_faces: self.face_count(),
            number_of_mipmap_levels: self.mip_count(),
            bytes_of_key_value_data: u32::try_from(self.metadata.serialized_length())
                .unwrap_or(u32::MAX),
        }
    }
}
