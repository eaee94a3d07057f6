//! Bounded 2D grid storage shared by the terrain and water fields.
//!
//! All fields in the sandbox (terrain height, water depth, velocity
//! components) are flat `Vec` arrays addressed by `y * width + x` over a
//! common lattice. Out-of-range access is part of the normal contract:
//! the checked accessors return `None`/a caller-supplied default instead
//! of panicking.

use serde::{Deserialize, Serialize};

/// Grid dimensions, threaded explicitly through every constructor so a
/// terrain/water pair can never disagree about its lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub width: usize,
    pub height: usize,
}

impl GridDimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Square grid, the common case for the sandbox presets.
    pub fn square(size: usize) -> Self {
        Self { width: size, height: size }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Center cell, used as the fallback for rejection-sampled searches.
    pub fn center(&self) -> (i32, i32) {
        (self.width as i32 / 2, self.height as i32 / 2)
    }
}

/// A 2D grid of values with no wrapping at any edge.
#[derive(Clone)]
pub struct Grid<T> {
    dims: GridDimensions,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(dims: GridDimensions) -> Self {
        Self {
            dims,
            data: vec![T::default(); dims.cell_count()],
        }
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_with(dims: GridDimensions, value: T) -> Self {
        Self {
            dims,
            data: vec![value; dims.cell_count()],
        }
    }

    pub fn dims(&self) -> GridDimensions {
        self.dims
    }

    pub fn width(&self) -> usize {
        self.dims.width
    }

    pub fn height(&self) -> usize {
        self.dims.height
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.dims.width && y < self.dims.height);
        y * self.dims.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.dims.contains(x, y)
    }

    /// Checked accessor: the bounds-safe contract made visible in the
    /// signature. Callers that want the silent-sentinel behavior layer
    /// `value_or` on top.
    pub fn at(&self, x: i32, y: i32) -> Option<&T> {
        if self.dims.contains(x, y) {
            Some(&self.data[y as usize * self.dims.width + x as usize])
        } else {
            None
        }
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.dims.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.dims.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Copy> Grid<T> {
    /// Read with a default for out-of-range coordinates.
    pub fn value_or(&self, x: i32, y: i32, default: T) -> T {
        match self.at(x, y) {
            Some(&v) => v,
            None => default,
        }
    }
}

impl Grid<f32> {
    /// Sample at fractional coordinates with bilinear interpolation.
    /// The four corner samples each go through the 0-default read, so the
    /// value ramps to 0 across the grid edge rather than clamping.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor() as i32;
        let y0 = y.floor() as i32;
        let fx = x - x.floor();
        let fy = y - y.floor();

        let v00 = self.value_or(x0, y0, 0.0);
        let v10 = self.value_or(x0 + 1, y0, 0.0);
        let v01 = self.value_or(x0, y0 + 1, 0.0);
        let v11 = self.value_or(x0 + 1, y0 + 1, 0.0);

        let v0 = v00 * (1.0 - fx) + v10 * fx;
        let v1 = v01 * (1.0 - fx) + v11 * fx;
        v0 * (1.0 - fy) + v1 * fy
    }

    /// Edge-clamped bilinear sample, used for resampling where ramping to
    /// zero at the border would bleed state away during a resize.
    fn sample_clamped(&self, x: f32, y: f32) -> f32 {
        let max_x = (self.dims.width - 1) as f32;
        let max_y = (self.dims.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.dims.width - 1);
        let y1 = (y0 + 1).min(self.dims.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let v00 = *self.get(x0, y0);
        let v10 = *self.get(x1, y0);
        let v01 = *self.get(x0, y1);
        let v11 = *self.get(x1, y1);

        let v0 = v00 * (1.0 - fx) + v10 * fx;
        let v1 = v01 * (1.0 - fx) + v11 * fx;
        v0 * (1.0 - fy) + v1 * fy
    }

    /// Resample to new dimensions for a quality change. At unchanged
    /// dimensions the result is an exact copy, which keeps snapshot
    /// round-trips bit-identical.
    pub fn resampled(&self, new_dims: GridDimensions) -> Grid<f32> {
        if new_dims == self.dims {
            return self.clone();
        }

        let mut result = Grid::new_with(new_dims, 0.0f32);
        let scale_x = self.dims.width as f32 / new_dims.width as f32;
        let scale_y = self.dims.height as f32 / new_dims.height as f32;

        for y in 0..new_dims.height {
            for x in 0..new_dims.width {
                // Map the new cell center back into source space.
                let src_x = (x as f32 + 0.5) * scale_x - 0.5;
                let src_y = (y as f32 + 0.5) * scale_y - 0.5;
                result.set(x, y, self.sample_clamped(src_x, src_y));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_access_out_of_bounds() {
        let grid = Grid::new_with(GridDimensions::square(8), 3.0f32);

        assert!(grid.at(-1, 0).is_none());
        assert!(grid.at(0, -1).is_none());
        assert!(grid.at(8, 0).is_none());
        assert!(grid.at(0, 8).is_none());
        assert!(grid.at(i32::MIN, i32::MAX).is_none());
        assert_eq!(grid.at(7, 7), Some(&3.0));

        assert_eq!(grid.value_or(-5, 3, 0.0), 0.0);
        assert_eq!(grid.value_or(3, 3, 0.0), 3.0);
    }

    #[test]
    fn test_bilinear_sample_between_cells() {
        let mut grid = Grid::new_with(GridDimensions::square(4), 0.0f32);
        grid.set(1, 1, 10.0);
        grid.set(2, 1, 20.0);

        assert_eq!(grid.sample_bilinear(1.0, 1.0), 10.0);
        let mid = grid.sample_bilinear(1.5, 1.0);
        assert!((mid - 15.0).abs() < 1e-5);
    }

    #[test]
    fn test_resample_identity_at_same_dims() {
        let mut grid = Grid::new_with(GridDimensions::new(6, 5), 0.0f32);
        for (x, y, v) in grid.iter_mut() {
            *v = (x * 10 + y) as f32 * 0.37;
        }

        let copy = grid.resampled(grid.dims());
        assert_eq!(grid.as_slice(), copy.as_slice());
    }

    #[test]
    fn test_resample_preserves_uniform_field() {
        let grid = Grid::new_with(GridDimensions::square(16), 7.5f32);
        let small = grid.resampled(GridDimensions::square(8));

        assert_eq!(small.width(), 8);
        for (_, _, &v) in small.iter() {
            assert!((v - 7.5).abs() < 1e-5);
        }
    }
}
