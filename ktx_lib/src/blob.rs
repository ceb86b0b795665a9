//! Storage for the image data of every mip level, array layer, and cube face.
use crate::{
    error::{CreateBundleError, OutOfBoundsError},
    index::{BlobIndex, blob_count, flatten, unflatten},
};

/// One optional byte buffer per [BlobIndex] with dimensions fixed at creation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BlobStore {
    mip_count: u32,
    array_length: u32,
    face_count: u32,
    /// Empty slots are `None` and never store an empty `Vec`.
    blobs: Vec<Option<Vec<u8>>>,
}

impl BlobStore {
    /// Create a store with all slots empty.
    ///
    /// Returns an error if the slots for every image can't be allocated.
    pub fn new(
        mip_count: u32,
        array_length: u32,
        face_count: u32,
    ) -> Result<Self, CreateBundleError> {
        let too_many_images = || CreateBundleError::TooManyImages {
            mip_count,
            array_length,
            face_count,
        };

        let count = blob_count(mip_count, array_length, face_count)
            .ok_or_else(too_many_images)?;
        let mut blobs = Vec::new();
        blobs.try_reserve_exact(count).map_err(|_| too_many_images())?;
        blobs.resize(count, None);

        Ok(Self {
            mip_count,
            array_length,
            face_count,
            blobs,
        })
    }

    /// Create a store from slots already in storage order.
    pub(crate) fn from_blobs(
        mip_count: u32,
        array_length: u32,
        face_count: u32,
        blobs: Vec<Option<Vec<u8>>>,
    ) -> Self {
        debug_assert_eq!(
            blob_count(mip_count, array_length, face_count),
            Some(blobs.len())
        );
        Self {
            mip_count,
            array_length,
            face_count,
            blobs,
        }
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    pub fn array_length(&self) -> u32 {
        self.array_length
    }

    pub fn face_count(&self) -> u32 {
        self.face_count
    }

    /// The total number of slots including empty slots.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn offset(&self, index: BlobIndex) -> Result<usize, OutOfBoundsError> {
        if index.mip_level >= self.mip_count
            || index.array_index >= self.array_length
            || index.cube_face >= self.face_count
        {
            Err(OutOfBoundsError {
                index,
                mip_count: self.mip_count,
                array_length: self.array_length,
                face_count: self.face_count,
            })
        } else {
            Ok(flatten(self.array_length, self.face_count, index))
        }
    }

    /// The data for `index` or `None` if `index` is out of bounds or the slot is empty.
    pub fn get(&self, index: BlobIndex) -> Option<&[u8]> {
        let offset = self.offset(index).ok()?;
        self.blobs[offset].as_deref()
    }

    /// The data for `index` or `None` if the slot is empty.
    pub fn try_get(&self, index: BlobIndex) -> Result<Option<&[u8]>, OutOfBoundsError> {
        let offset = self.offset(index)?;
        Ok(self.blobs[offset].as_deref())
    }

    /// Replace the data for `index` with `data`.
    /// Setting empty data clears the slot.
    pub fn set<T: Into<Vec<u8>>>(
        &mut self,
        index: BlobIndex,
        data: T,
    ) -> Result<(), OutOfBoundsError> {
        let offset = self.offset(index)?;
        let data = data.into();
        self.blobs[offset] = (!data.is_empty()).then_some(data);
        Ok(())
    }

    /// Returns `true` if the slot for `index` has data.
    pub fn contains(&self, index: BlobIndex) -> Result<bool, OutOfBoundsError> {
        let offset = self.offset(index)?;
        Ok(self.blobs[offset].is_some())
    }

    /// Empty the slot for `index` and return the previous data.
    pub fn clear(&mut self, index: BlobIndex) -> Result<Option<Vec<u8>>, OutOfBoundsError> {
        let offset = self.offset(index)?;
        Ok(self.blobs[offset].take())
    }

    /// All slots in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (BlobIndex, Option<&[u8]>)> {
        self.blobs.iter().enumerate().map(|(i, blob)| {
            (
                unflatten(self.array_length, self.face_count, i),
                blob.as_deref(),
            )
        })
    }
}
