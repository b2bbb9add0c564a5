//! RGBA32F multi-face, multi-mip image container
//!
//! Storage is face-major: every mip of face 0, then every mip of face 1, and so
//! on. Each (face, mip) surface is a contiguous row-major run of texels, so a
//! whole mip chain can be split into disjoint per-surface slices.

use crate::error::{Error, Result};
use crate::face::CubeFace;
use glam::Vec4;

/// Bytes per RGBA32F texel
pub const TEXEL_BYTES: usize = std::mem::size_of::<Vec4>();

/// Image in 4×32-bit float RGBA
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    face_count: u32,
    mip_count: u32,
    data: Vec<Vec4>,
}

/// Extent of a mip level along one axis
#[inline]
pub fn mip_extent(base: u32, mip: u32) -> u32 {
    (base >> mip).max(1)
}

/// Texel count of all mips of one face
fn chain_len(width: u32, height: u32, mip_count: u32) -> usize {
    (0..mip_count)
        .map(|mip| mip_extent(width, mip) as usize * mip_extent(height, mip) as usize)
        .sum()
}

/// Allocate a zeroed texel buffer, surfacing allocation failure
pub(crate) fn try_alloc_texels(len: usize) -> Result<Vec<Vec4>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| Error::OutOfMemory {
        bytes: len.saturating_mul(TEXEL_BYTES),
    })?;
    data.resize(len, Vec4::ZERO);
    Ok(data)
}

impl Image {
    /// Allocate a zero-filled image
    pub fn new(width: u32, height: u32, face_count: u32, mip_count: u32) -> Result<Self> {
        let mip_count = mip_count.max(1);
        let len = chain_len(width, height, mip_count) * face_count as usize;
        Ok(Self {
            width,
            height,
            face_count,
            mip_count,
            data: try_alloc_texels(len)?,
        })
    }

    /// Allocate a zero-filled cubemap
    pub fn new_cubemap(face_size: u32, mip_count: u32) -> Result<Self> {
        Self::new(face_size, face_size, 6, mip_count)
    }

    /// Wrap existing texel data; `None` when the length does not match the layout
    pub fn from_texels(
        width: u32,
        height: u32,
        face_count: u32,
        mip_count: u32,
        data: Vec<Vec4>,
    ) -> Option<Self> {
        let mip_count = mip_count.max(1);
        if data.len() != chain_len(width, height, mip_count) * face_count as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            face_count,
            mip_count,
            data,
        })
    }

    /// Single-mip cubemap filled with one colour
    pub fn solid_cubemap(face_size: u32, color: Vec4) -> Result<Self> {
        let mut image = Self::new_cubemap(face_size, 1)?;
        image.data.fill(color);
        Ok(image)
    }

    /// Single-mip cubemap whose texels come from a function of (face, x, y)
    pub fn cubemap_from_fn(
        face_size: u32,
        mut f: impl FnMut(CubeFace, u32, u32) -> Vec4,
    ) -> Result<Self> {
        let mut image = Self::new_cubemap(face_size, 1)?;
        for face in CubeFace::ALL {
            let texels = image.face_mut(face, 0);
            for y in 0..face_size {
                for x in 0..face_size {
                    texels[(y * face_size + x) as usize] = f(face, x, y);
                }
            }
        }
        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn face_count(&self) -> u32 {
        self.face_count
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    /// Face size of a cubemap (width of mip 0)
    pub fn face_size(&self) -> u32 {
        self.width
    }

    /// Edge length of a face at a mip level
    pub fn mip_face_size(&self, mip: u32) -> u32 {
        mip_extent(self.width, mip)
    }

    /// Six square, non-empty faces
    pub fn is_cubemap(&self) -> bool {
        self.face_count == 6 && self.width == self.height && self.width > 0
    }

    pub(crate) fn ensure_cubemap(&self) -> Result<()> {
        if self.is_cubemap() {
            Ok(())
        } else {
            Err(Error::NotACubemap {
                width: self.width,
                height: self.height,
                faces: self.face_count,
            })
        }
    }

    /// Texel offset of each face's surface at a mip level
    ///
    /// Multiply by [`TEXEL_BYTES`] for byte offsets.
    pub fn face_offsets(&self, mip: u32) -> [usize; 6] {
        let per_face = chain_len(self.width, self.height, self.mip_count);
        let in_face = chain_len(self.width, self.height, mip.min(self.mip_count));
        std::array::from_fn(|face| face * per_face + in_face)
    }

    fn surface_range(&self, face: CubeFace, mip: u32) -> std::ops::Range<usize> {
        let start = self.face_offsets(mip)[face.index()];
        let len = mip_extent(self.width, mip) as usize * mip_extent(self.height, mip) as usize;
        start..start + len
    }

    /// Texels of one face at one mip, row-major
    pub fn face(&self, face: CubeFace, mip: u32) -> &[Vec4] {
        &self.data[self.surface_range(face, mip)]
    }

    pub fn face_mut(&mut self, face: CubeFace, mip: u32) -> &mut [Vec4] {
        let range = self.surface_range(face, mip);
        &mut self.data[range]
    }

    #[inline]
    pub fn texel(&self, face: CubeFace, mip: u32, x: u32, y: u32) -> Vec4 {
        let w = mip_extent(self.width, mip);
        self.face(face, mip)[(y * w + x) as usize]
    }

    pub fn texels(&self) -> &[Vec4] {
        &self.data
    }

    /// Split into disjoint mutable surfaces, indexed by [mip][face]
    pub(crate) fn surfaces_mut(&mut self) -> Vec<[Option<&mut [Vec4]>; 6]> {
        let mut by_mip: Vec<[Option<&mut [Vec4]>; 6]> =
            (0..self.mip_count).map(|_| Default::default()).collect();

        let mut rest = self.data.as_mut_slice();
        for face in 0..self.face_count.min(6) as usize {
            for (mip, slots) in by_mip.iter_mut().enumerate() {
                let len = mip_extent(self.width, mip as u32) as usize
                    * mip_extent(self.height, mip as u32) as usize;
                let (surface, tail) = std::mem::take(&mut rest).split_at_mut(len);
                slots[face] = Some(surface);
                rest = tail;
            }
        }
        by_mip
    }
}
