//! RGBA8 pixels, dense pixel buffers and the channel arithmetic the effects share.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

const CHANNEL_MAX: u32 = 255;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

/// Two-sample average: each call moves halfway toward `c2`.
pub fn color_average(c1: Pixel, c2: Pixel) -> Pixel {
    Pixel {
        r: ((c1.r as u32 + c2.r as u32) >> 1) as u8,
        g: ((c1.g as u32 + c2.g as u32) >> 1) as u8,
        b: ((c1.b as u32 + c2.b as u32) >> 1) as u8,
        a: ((c1.a as u32 + c2.a as u32) >> 1) as u8,
    }
}

pub fn color_average_of(colors: &[Pixel]) -> Pixel {
    if colors.is_empty() {
        return Pixel::default();
    }
    let n = colors.len() as u32;
    let (mut r, mut g, mut b, mut a) = (0u32, 0u32, 0u32, 0u32);
    for c in colors {
        r += c.r as u32;
        g += c.g as u32;
        b += c.b as u32;
        a += c.a as u32;
    }
    Pixel {
        r: (r / n) as u8,
        g: (g / n) as u8,
        b: (b / n) as u8,
        a: (a / n) as u8,
    }
}

fn clamp_channels(mut r: u32, mut g: u32, mut b: u32, a: u32, allow_overexposed: bool) -> Pixel {
    if !allow_overexposed {
        let max = r.max(g).max(b);
        if max > CHANNEL_MAX {
            // Scale all channels back so the hue survives.
            r = (r << 8) / max;
            g = (g << 8) / max;
            b = (b << 8) / max;
        }
    }
    Pixel {
        r: r.min(CHANNEL_MAX) as u8,
        g: g.min(CHANNEL_MAX) as u8,
        b: b.min(CHANNEL_MAX) as u8,
        a: a.min(CHANNEL_MAX) as u8,
    }
}

pub fn color_add(c1: Pixel, c2: Pixel, allow_overexposed: bool) -> Pixel {
    clamp_channels(
        c1.r as u32 + c2.r as u32,
        c1.g as u32 + c2.g as u32,
        c1.b as u32 + c2.b as u32,
        c1.a as u32 + c2.a as u32,
        allow_overexposed,
    )
}

/// Scale by `brightness / 256`.
pub fn brighter_color_int(brightness: u32, color: Pixel, allow_overexposed: bool) -> Pixel {
    let ch = |c: u8| (brightness * c as u32) >> 8;
    clamp_channels(ch(color.r), ch(color.g), ch(color.b), ch(color.a), allow_overexposed)
}

pub fn brighter_color(brightness: f32, color: Pixel, allow_overexposed: bool) -> Pixel {
    let br = (brightness.clamp(0.0, 2.0) * 256.0 + 0.0001).round() as u32;
    brighter_color_int(br, color, allow_overexposed)
}

/// Brightness-driven gamma curve applied as the final exposure step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GammaCorrection {
    gamma_reciprocal: f32,
    threshold: f32,
}

impl GammaCorrection {
    pub fn new(gamma: f32, threshold: f32) -> Self {
        Self {
            gamma_reciprocal: 1.0 / gamma,
            threshold,
        }
    }

    pub fn correct(&self, brightness: f32, color: Pixel) -> Pixel {
        if brightness < self.threshold {
            return brighter_color(brightness, color, true);
        }
        brighter_color(brightness.powf(self.gamma_reciprocal), color, true)
    }
}

/// Dense `width x height` RGBA8 buffer, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        self.pixels[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Pixel) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    /// Additive draw: `pixel += intensity * color`.
    pub fn add_pixel(&mut self, x: u32, y: u32, color: Pixel, int_intensity: u32, allow_overexposed: bool) {
        let i = self.index(x, y);
        let lit = brighter_color_int(int_intensity, color, allow_overexposed);
        self.pixels[i] = color_add(self.pixels[i], lit, allow_overexposed);
    }

    /// Multiply every RGB channel by `factor` (clamped to [0, 1]).
    pub fn fade(&mut self, factor: f32) {
        let k = (factor.clamp(0.0, 1.0) * 256.0) as u32;
        for p in &mut self.pixels {
            p.r = ((p.r as u32 * k) >> 8) as u8;
            p.g = ((p.g as u32 * k) >> 8) as u8;
            p.b = ((p.b as u32 * k) >> 8) as u8;
        }
    }

    pub fn count_non_black(&self) -> usize {
        self.pixels.iter().filter(|p| !p.is_black()).count()
    }

    /// Binary PPM (P6); alpha is dropped.
    pub fn write_ppm(&self, out: &mut dyn Write) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut row = Vec::with_capacity(self.width as usize * 3);
        for line in self.pixels.chunks_exact(self.width.max(1) as usize) {
            row.clear();
            for p in line {
                row.extend_from_slice(&[p.r, p.g, p.b]);
            }
            out.write_all(&row)?;
        }
        Ok(())
    }
}
