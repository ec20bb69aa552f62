//! Low-density pass: neighborhood blur for crowded sparse points, flat recolor otherwise.

use super::hits::IfsPoint;
use crate::error::IfsError;
use crate::gradient::WeightedGradients;
use crate::pixel::{Pixel, PixelBuffer, color_average_of};
use crate::random::RandomStream;

/// Odd kernel width for the neighborhood average.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurWidth {
    Three,
    Five,
    Seven,
}

impl BlurWidth {
    pub fn get(self) -> u32 {
        match self {
            Self::Three => 3,
            Self::Five => 5,
            Self::Seven => 7,
        }
    }
}

impl TryFrom<u32> for BlurWidth {
    type Error = IfsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Self::Three),
            5 => Ok(Self::Five),
            7 => Ok(Self::Seven),
            other => Err(IfsError::InvalidBlurWidth(other)),
        }
    }
}

pub struct LowDensityBlurrer {
    screen_width: u32,
    screen_height: u32,
    width: BlurWidth,
    neighbours: Vec<Pixel>,
}

impl LowDensityBlurrer {
    pub fn new(screen_width: u32, screen_height: u32, width: BlurWidth) -> Self {
        Self {
            screen_width,
            screen_height,
            width,
            neighbours: Vec::with_capacity(49),
        }
    }

    pub fn width(&self) -> BlurWidth {
        self.width
    }

    pub fn set_width(&mut self, width: BlurWidth) {
        self.width = width;
    }

    /// Replace each low-density point by the average of its neighborhood in
    /// `buffs[0]`. Points within half a kernel of the border get `count = 0`
    /// and are left alone.
    pub fn do_blur(&mut self, points: &mut [IfsPoint], buffs: [&mut PixelBuffer; 2]) {
        let w = self.width.get();
        let half = w / 2;

        for p in points.iter_mut() {
            if p.x < half
                || p.y < half
                || p.x >= self.screen_width.saturating_sub(half)
                || p.y >= self.screen_height.saturating_sub(half)
            {
                p.count = 0;
                continue;
            }

            self.neighbours.clear();
            for ny in p.y - half..p.y - half + w {
                for nx in p.x - half..p.x - half + w {
                    self.neighbours.push(buffs[0].get(nx, ny));
                }
            }
            p.color = color_average_of(&self.neighbours);
        }

        let [current, next] = buffs;
        for p in points.iter().filter(|p| p.count != 0) {
            current.set(p.x, p.y, p.color);
            next.set(p.x, p.y, p.color);
        }
    }

    /// Flat recolor used when there are too few low-density points to blur.
    ///
    /// Smooth mode samples one gradient at `count / max_count`; random mode
    /// draws a fresh gradient and position per point.
    pub fn set_low_density_colors(
        &self,
        points: &[IfsPoint],
        max_count: u32,
        use_random_colors: bool,
        gradients: &WeightedGradients,
        rng: &mut RandomStream,
        buffs: [&mut PixelBuffer; 2],
    ) {
        let smooth_map = gradients.random_gradient(rng);
        let reciprocal_max = 1.0 / max_count.max(1) as f32;
        let [current, next] = buffs;

        for p in points {
            let color = if use_random_colors {
                let t = rng.f32_in(0.0, 1.0);
                gradients.random_gradient(rng).color_at(t)
            } else {
                smooth_map.color_at(reciprocal_max * p.count as f32)
            };
            if p.x >= current.width() || p.y >= current.height() {
                continue;
            }
            current.set(p.x, p.y, color);
            next.set(p.x, p.y, color);
        }
    }
}
