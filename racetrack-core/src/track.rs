//! Rasterized track boundary.

use std::path::Path;

use image::RgbaImage;

use crate::error::SimError;

/// Immutable occupancy grid: `true` cells are track boundary.
#[derive(Clone, Debug)]
pub struct Track {
    width: u32,
    height: u32,
    boundary: Vec<bool>,
}

impl Track {
    pub fn from_fn(
        width: u32,
        height: u32,
        mut is_boundary: impl FnMut(u32, u32) -> bool,
    ) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::EmptyTrack { width, height });
        }

        let mut boundary = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                boundary.push(is_boundary(x, y));
            }
        }

        Ok(Self {
            width,
            height,
            boundary,
        })
    }

    /// Open rectangle whose outer `thickness` pixels are boundary.
    pub fn bordered(width: u32, height: u32, thickness: u32) -> Result<Self, SimError> {
        Self::from_fn(width, height, |x, y| {
            x < thickness
                || y < thickness
                || x >= width.saturating_sub(thickness)
                || y >= height.saturating_sub(thickness)
        })
    }

    pub fn from_image(image: &RgbaImage, boundary_color: [u8; 4]) -> Result<Self, SimError> {
        let (width, height) = image.dimensions();
        Self::from_fn(width, height, |x, y| {
            image.get_pixel(x, y).0 == boundary_color
        })
    }

    pub fn load(path: &Path, boundary_color: [u8; 4]) -> Result<Self, SimError> {
        let image = image::open(path)
            .map_err(|source| SimError::TrackLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let track = Self::from_image(&image, boundary_color)?;

        tracing::info!(
            path = %path.display(),
            width = track.width,
            height = track.height,
            boundary_ratio = track.boundary_ratio(),
            "track loaded"
        );

        Ok(track)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Off-canvas coordinates count as boundary.
    #[inline]
    pub fn is_boundary(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return true;
        }
        self.boundary[y as usize * self.width as usize + x as usize]
    }

    pub fn boundary_ratio(&self) -> f64 {
        let hits = self.boundary.iter().filter(|cell| **cell).count();
        hits as f64 / self.boundary.len() as f64
    }
}
