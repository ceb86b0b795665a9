//! Addressing of images within a [Bundle](crate::bundle::Bundle).
//!
//! Images are stored in the same order they appear in the file.
//! The mip level is the outermost loop followed by array layers and then cube faces
//! like "Mip 0 Layer 0 Face 0, Mip 0 Layer 0 Face 1, ... Mip M-1 Layer L-1 Face F-1"
//! for M mipmaps, L layers, and F faces.

/// The location of a single image blob in a [Bundle](crate::bundle::Bundle).
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct BlobIndex {
    pub mip_level: u32,
    pub array_index: u32,
    /// The cube face in the range `0..6` or `0` for non cube maps.
    pub cube_face: u32,
}

impl BlobIndex {
    pub fn new(mip_level: u32, array_index: u32, cube_face: u32) -> Self {
        Self {
            mip_level,
            array_index,
            cube_face,
        }
    }
}

impl From<(u32, u32, u32)> for BlobIndex {
    fn from((mip_level, array_index, cube_face): (u32, u32, u32)) -> Self {
        Self::new(mip_level, array_index, cube_face)
    }
}

impl std::fmt::Display for BlobIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mip {} layer {} face {}",
            self.mip_level, self.array_index, self.cube_face
        )
    }
}

/// The offset of `index` in the flattened storage order.
/// This does not check that `index` is in bounds.
pub fn flatten(array_length: u32, face_count: u32, index: BlobIndex) -> usize {
    let faces = face_count as usize;
    let layers = array_length as usize;
    index.cube_face as usize
        + index.array_index as usize * faces
        + index.mip_level as usize * layers * faces
}

/// The inverse of [flatten].
pub fn unflatten(array_length: u32, face_count: u32, offset: usize) -> BlobIndex {
    let faces = face_count as usize;
    let layers = array_length as usize;
    BlobIndex {
        mip_level: (offset / (layers * faces)) as u32,
        array_index: ((offset / faces) % layers) as u32,
        cube_face: (offset % faces) as u32,
    }
}

/// The total number of images for the given dimensions
/// or `None` if the count does not fit in a `usize`.
pub fn blob_count(mip_count: u32, array_length: u32, face_count: u32) -> Option<usize> {
    (mip_count as usize)
        .checked_mul(array_length as usize)?
        .checked_mul(face_count as usize)
}

/// All valid indices in storage order.
pub fn indices(
    mip_count: u32,
    array_length: u32,
    face_count: u32,
) -> impl Iterator<Item = BlobIndex> {
    (0..mip_count).flat_map(move |mip| {
        (0..array_length).flat_map(move |layer| {
            (0..face_count).map(move |face| BlobIndex::new(mip, layer, face))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_cube_array() {
        // 2 layers of 6 faces per mip.
        assert_eq!(0, flatten(2, 6, BlobIndex::new(0, 0, 0)));
        assert_eq!(5, flatten(2, 6, BlobIndex::new(0, 0, 5)));
        assert_eq!(6, flatten(2, 6, BlobIndex::new(0, 1, 0)));
        assert_eq!(12, flatten(2, 6, BlobIndex::new(1, 0, 0)));
        assert_eq!(23, flatten(2, 6, BlobIndex::new(1, 1, 5)));
    }

    #[test]
    fn flatten_single_image() {
        assert_eq!(0, flatten(1, 1, BlobIndex::new(0, 0, 0)));
        assert_eq!(3, flatten(1, 1, BlobIndex::new(3, 0, 0)));
    }

    #[test]
    fn unflatten_inverse() {
        for (mips, layers, faces) in [(1, 1, 1), (3, 1, 6), (4, 5, 1), (2, 3, 6)] {
            for (i, index) in indices(mips, layers, faces).enumerate() {
                assert_eq!(i, flatten(layers, faces, index));
                assert_eq!(index, unflatten(layers, faces, i));
            }
        }
    }

    #[test]
    fn blob_count_overflow() {
        assert_eq!(Some(36), blob_count(3, 2, 6));
        assert_eq!(Some(0), blob_count(0, u32::MAX, 6));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(None, blob_count(u32::MAX, u32::MAX, 6));
    }

    #[test]
    fn indices_storage_order() {
        assert_eq!(
            vec![
                BlobIndex::new(0, 0, 0),
                BlobIndex::new(0, 1, 0),
                BlobIndex::new(1, 0, 0),
                BlobIndex::new(1, 1, 0),
            ],
            indices(2, 2, 1).collect::<Vec<_>>()
        );
    }
}
