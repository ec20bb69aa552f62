//! Per-pass hit grid: dense counts and colors plus the sparse list of touched cells.

use crate::pixel::{Pixel, color_average};
use serde::{Deserialize, Serialize};

/// One traced pixel: grid position, hits this pass and averaged color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfsPoint {
    pub x: u32,
    pub y: u32,
    pub count: u32,
    pub color: Pixel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct HitInfo {
    count: u32,
    color: Pixel,
}

/// Dense hit grid plus the coordinates touched this pass, in first-hit order.
#[derive(Clone, Debug)]
pub struct FractalHits {
    width: u32,
    height: u32,
    grid: Vec<HitInfo>,
    hits: Vec<(u32, u32)>,
    max_hit_count: u32,
}

impl FractalHits {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            grid: vec![HitInfo::default(); width as usize * height as usize],
            hits: Vec::with_capacity(1000),
            max_hit_count: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_hit_count(&self) -> u32 {
        self.max_hit_count
    }

    pub fn num_points(&self) -> usize {
        self.hits.len()
    }

    pub fn reset(&mut self) {
        self.max_hit_count = 0;
        self.hits.clear();
        self.grid.fill(HitInfo::default());
    }

    /// Record a hit; coordinates outside the grid are dropped.
    pub fn add_hit(&mut self, x: u32, y: u32, color: Pixel) {
        if x >= self.width || y >= self.height {
            return;
        }
        let cell = &mut self.grid[y as usize * self.width as usize + x as usize];

        cell.color = color_average(cell.color, color);
        cell.count += 1;

        if cell.count > self.max_hit_count {
            self.max_hit_count = cell.count;
        }
        if cell.count == 1 {
            self.hits.push((x, y));
        }
    }

    /// Resolve every touched coordinate to its final count and color.
    pub fn collect_points(&self, out: &mut Vec<IfsPoint>) {
        out.clear();
        out.reserve(self.hits.len());
        out.extend(self.hits.iter().map(|&(x, y)| {
            let cell = self.grid[y as usize * self.width as usize + x as usize];
            IfsPoint {
                x,
                y,
                count: cell.count,
                color: cell.color,
            }
        }));
    }

    pub fn points(&self) -> Vec<IfsPoint> {
        let mut out = Vec::new();
        self.collect_points(&mut out);
        out
    }

    /// Rebuild the grid from a previously collected point list.
    pub(crate) fn restore(&mut self, points: &[IfsPoint]) {
        self.reset();
        for p in points {
            if p.x >= self.width || p.y >= self.height || p.count == 0 {
                continue;
            }
            let cell = &mut self.grid[p.y as usize * self.width as usize + p.x as usize];
            if cell.count == 0 {
                self.hits.push((p.x, p.y));
            }
            cell.count = p.count;
            cell.color = p.color;
            self.max_hit_count = self.max_hit_count.max(p.count);
        }
    }
}
