//! Fixed catalog of named color gradients.
//!
//! Gradients are identified by [`GradientId`] and persisted by name, so a saved
//! state resolves back to the same stop table as long as [`CATALOG_VERSION`]
//! matches.

use crate::error::IfsError;
use crate::pixel::Pixel;
use crate::random::{RandomStream, Weights};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const CATALOG_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientGroup {
    PerceptuallyUniformSequential,
    Sequential,
    Sequential2,
    Cyclic,
    Diverging,
    DivergingBlack,
    Qualitative,
    Misc,
}

impl GradientGroup {
    pub const fn all() -> [Self; 8] {
        [
            Self::PerceptuallyUniformSequential,
            Self::Sequential,
            Self::Sequential2,
            Self::Cyclic,
            Self::Diverging,
            Self::DivergingBlack,
            Self::Qualitative,
            Self::Misc,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientId {
    Viridis,
    Plasma,
    Inferno,
    Magma,
    Cividis,
    Blues,
    Greens,
    Reds,
    Purples,
    YlOrRd,
    Afmhot,
    Hot,
    Cool,
    Copper,
    Spring,
    Winter,
    Twilight,
    Hsv,
    RdBu,
    PiYg,
    Spectral,
    Coolwarm,
    RedBlackSky,
    RedBlackGreen,
    PinkBlackGreen,
    Set1,
    Dark2,
    Paired,
    Rainbow,
    Jet,
    GistRainbow,
    Terrain,
    NipySpectral,
}

// Stop tables as 0xRRGGBB, evenly spaced over [0, 1].
const VIRIDIS: &[u32] = &[
    0x440154, 0x472d7b, 0x3b528b, 0x2c728e, 0x21918c, 0x28ae80, 0x5ec962, 0xaddc30, 0xfde725,
];
const PLASMA: &[u32] = &[
    0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a, 0xfdca26,
    0xf0f921,
];
const INFERNO: &[u32] = &[
    0x000004, 0x1b0c41, 0x4a0c6b, 0x781c6d, 0xa52c60, 0xcf4446, 0xed6925, 0xfb9b06, 0xf7d13d,
    0xfcffa4,
];
const MAGMA: &[u32] = &[
    0x000004, 0x180f3d, 0x440f76, 0x721f81, 0x9e2f7f, 0xcd4071, 0xf1605d, 0xfd9668, 0xfeca8d,
    0xfcfdbf,
];
const CIVIDIS: &[u32] = &[
    0x00224e, 0x123570, 0x3b496c, 0x575d6d, 0x707173, 0x8a8678, 0xa59c74, 0xc3b369, 0xe1cc55,
    0xfee838,
];
const BLUES: &[u32] = &[
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
const GREENS: &[u32] = &[
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
];
const REDS: &[u32] = &[
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];
const PURPLES: &[u32] = &[
    0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d,
];
const YL_OR_RD: &[u32] = &[
    0xffffcc, 0xffeda0, 0xfed976, 0xfeb24c, 0xfd8d3c, 0xfc4e2a, 0xe31a1c, 0xbd0026, 0x800026,
];
const AFMHOT: &[u32] = &[0x000000, 0x800000, 0xff8000, 0xffff80, 0xffffff];
const HOT: &[u32] = &[0x0a0000, 0xe60000, 0xffd200, 0xffffff];
const COOL: &[u32] = &[0x00ffff, 0xff00ff];
const COPPER: &[u32] = &[0x000000, 0x7f4f32, 0xffc77f];
const SPRING: &[u32] = &[0xff00ff, 0xffff00];
const WINTER: &[u32] = &[0x0000ff, 0x00ff80];
const TWILIGHT: &[u32] = &[
    0xe2d9e2, 0x9ebbc9, 0x6785be, 0x5e43a5, 0x2f142e, 0x6e2446, 0xa64a45, 0xc98c76, 0xe2d9e2,
];
const HSV: &[u32] = &[0xff0000, 0xffff00, 0x00ff00, 0x00ffff, 0x0000ff, 0xff00ff, 0xff0000];
const RD_BU: &[u32] = &[
    0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3,
    0x2166ac, 0x053061,
];
const PI_YG: &[u32] = &[
    0x8e0152, 0xc51b7d, 0xde77ae, 0xf1b6da, 0xfde0ef, 0xf7f7f7, 0xe6f5d0, 0xb8e186, 0x7fbc41,
    0x4d9221, 0x276419,
];
const SPECTRAL: &[u32] = &[
    0x9e0142, 0xd53e4f, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xe6f598, 0xabdda4, 0x66c2a5,
    0x3288bd, 0x5e4fa2,
];
const COOLWARM: &[u32] = &[0x3b4cc0, 0x7396f5, 0xb0cbfc, 0xdcdddd, 0xf6bfa6, 0xea7b60, 0xb40426];
const RED_BLACK_SKY: &[u32] = &[0xff0000, 0x000000, 0x00bfff];
const RED_BLACK_GREEN: &[u32] = &[0xff0000, 0x000000, 0x00ff00];
const PINK_BLACK_GREEN: &[u32] = &[0xffc0cb, 0x000000, 0x008000];
const SET1: &[u32] = &[
    0xe41a1c, 0x377eb8, 0x4daf4a, 0x984ea3, 0xff7f00, 0xffff33, 0xa65628, 0xf781bf, 0x999999,
];
const DARK2: &[u32] = &[
    0x1b9e77, 0xd95f02, 0x7570b3, 0xe7298a, 0x66a61e, 0xe6ab02, 0xa6761d, 0x666666,
];
const PAIRED: &[u32] = &[
    0xa6cee3, 0x1f78b4, 0xb2df8a, 0x33a02c, 0xfb9a99, 0xe31a1c, 0xfdbf6f, 0xff7f00, 0xcab2d6,
    0x6a3d9a, 0xffff99, 0xb15928,
];
const RAINBOW: &[u32] = &[0x8000ff, 0x1996f3, 0x4df3ce, 0xb2f396, 0xff964f, 0xff0000];
const JET: &[u32] = &[
    0x00007f, 0x0000ff, 0x007fff, 0x00ffff, 0x7fff7f, 0xffff00, 0xff7f00, 0xff0000, 0x7f0000,
];
const GIST_RAINBOW: &[u32] = &[0xff0029, 0xffea00, 0x00ff1a, 0x00e0ff, 0x2600ff, 0xff00bf];
const TERRAIN: &[u32] = &[0x333399, 0x0099ff, 0x00cc66, 0xffff99, 0x996655, 0xffffff];
const NIPY_SPECTRAL: &[u32] = &[
    0x000000, 0x8800aa, 0x0000dd, 0x0099dd, 0x00aa88, 0x00bb00, 0x00ff00, 0xccee00, 0xffcc00,
    0xff0000, 0xcccccc,
];

impl GradientId {
    pub const fn all() -> [Self; 33] {
        use GradientId::*;
        [
            Viridis, Plasma, Inferno, Magma, Cividis, Blues, Greens, Reds, Purples, YlOrRd,
            Afmhot, Hot, Cool, Copper, Spring, Winter, Twilight, Hsv, RdBu, PiYg, Spectral,
            Coolwarm, RedBlackSky, RedBlackGreen, PinkBlackGreen, Set1, Dark2, Paired, Rainbow,
            Jet, GistRainbow, Terrain, NipySpectral,
        ]
    }

    pub fn name(self) -> &'static str {
        use GradientId::*;
        match self {
            Viridis => "viridis",
            Plasma => "plasma",
            Inferno => "inferno",
            Magma => "magma",
            Cividis => "cividis",
            Blues => "blues",
            Greens => "greens",
            Reds => "reds",
            Purples => "purples",
            YlOrRd => "yl_or_rd",
            Afmhot => "afmhot",
            Hot => "hot",
            Cool => "cool",
            Copper => "copper",
            Spring => "spring",
            Winter => "winter",
            Twilight => "twilight",
            Hsv => "hsv",
            RdBu => "rd_bu",
            PiYg => "pi_yg",
            Spectral => "spectral",
            Coolwarm => "coolwarm",
            RedBlackSky => "red_black_sky",
            RedBlackGreen => "red_black_green",
            PinkBlackGreen => "pink_black_green",
            Set1 => "set1",
            Dark2 => "dark2",
            Paired => "paired",
            Rainbow => "rainbow",
            Jet => "jet",
            GistRainbow => "gist_rainbow",
            Terrain => "terrain",
            NipySpectral => "nipy_spectral",
        }
    }

    pub fn group(self) -> GradientGroup {
        use GradientGroup as G;
        use GradientId::*;
        match self {
            Viridis | Plasma | Inferno | Magma | Cividis => G::PerceptuallyUniformSequential,
            Blues | Greens | Reds | Purples | YlOrRd => G::Sequential,
            Afmhot | Hot | Cool | Copper | Spring | Winter => G::Sequential2,
            Twilight | Hsv => G::Cyclic,
            RdBu | PiYg | Spectral | Coolwarm => G::Diverging,
            RedBlackSky | RedBlackGreen | PinkBlackGreen => G::DivergingBlack,
            Set1 | Dark2 | Paired => G::Qualitative,
            Rainbow | Jet | GistRainbow | Terrain | NipySpectral => G::Misc,
        }
    }

    fn stops(self) -> &'static [u32] {
        use GradientId::*;
        match self {
            Viridis => VIRIDIS,
            Plasma => PLASMA,
            Inferno => INFERNO,
            Magma => MAGMA,
            Cividis => CIVIDIS,
            Blues => BLUES,
            Greens => GREENS,
            Reds => REDS,
            Purples => PURPLES,
            YlOrRd => YL_OR_RD,
            Afmhot => AFMHOT,
            Hot => HOT,
            Cool => COOL,
            Copper => COPPER,
            Spring => SPRING,
            Winter => WINTER,
            Twilight => TWILIGHT,
            Hsv => HSV,
            RdBu => RD_BU,
            PiYg => PI_YG,
            Spectral => SPECTRAL,
            Coolwarm => COOLWARM,
            RedBlackSky => RED_BLACK_SKY,
            RedBlackGreen => RED_BLACK_GREEN,
            PinkBlackGreen => PINK_BLACK_GREEN,
            Set1 => SET1,
            Dark2 => DARK2,
            Paired => PAIRED,
            Rainbow => RAINBOW,
            Jet => JET,
            GistRainbow => GIST_RAINBOW,
            Terrain => TERRAIN,
            NipySpectral => NIPY_SPECTRAL,
        }
    }

    /// Sample the gradient at `t`, clamped to [0, 1], interpolating linearly between stops.
    pub fn color_at(self, t: f32) -> Pixel {
        let stops = self.stops();
        let last = stops.len() - 1;
        let pos = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } * last as f32;
        let i = (pos.floor() as usize).min(last);
        if i == last {
            return hex_pixel(stops[last]);
        }
        let f = pos - i as f32;
        let a = hex_pixel(stops[i]);
        let b = hex_pixel(stops[i + 1]);
        let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * f).round() as u8;
        Pixel::rgb(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
    }

    pub fn random_color(self, rng: &mut RandomStream, t0: f32, t1: f32) -> Pixel {
        self.color_at(rng.f32_in(t0, t1))
    }
}

impl FromStr for GradientId {
    type Err = IfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let want = s.trim().to_ascii_lowercase();
        GradientId::all()
            .into_iter()
            .find(|g| g.name() == want)
            .ok_or_else(|| IfsError::UnknownGradient(s.to_string()))
    }
}

fn hex_pixel(hex: u32) -> Pixel {
    Pixel::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Gradient picker that first draws a group by weight, then a gradient inside it.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedGradients {
    weights: Weights<GradientGroup>,
}

impl WeightedGradients {
    pub fn new(weights: Weights<GradientGroup>) -> Self {
        Self { weights }
    }

    pub fn uniform() -> Self {
        let table = GradientGroup::all().map(|g| (g, 1));
        Self::new(Weights::new(&table))
    }

    pub fn weights(&self) -> &Weights<GradientGroup> {
        &self.weights
    }

    pub fn random_group(&self, rng: &mut RandomStream) -> GradientGroup {
        self.weights.random_weighted(rng)
    }

    pub fn random_gradient_in(&self, group: GradientGroup, rng: &mut RandomStream) -> GradientId {
        let members = gradients_in(group);
        members[rng.usize_below(members.len())]
    }

    pub fn random_gradient(&self, rng: &mut RandomStream) -> GradientId {
        let group = self.random_group(rng);
        self.random_gradient_in(group, rng)
    }
}

pub fn gradients_in(group: GradientGroup) -> Vec<GradientId> {
    GradientId::all()
        .into_iter()
        .filter(|g| g.group() == group)
        .collect()
}

/// Interpolate two colors in HSL space; `t = 0` gives `c1`, `t = 1` gives `c2`.
pub fn mix_colors(c1: Pixel, c2: Pixel, t: f32) -> Pixel {
    if !(t > 0.0) {
        return c1;
    }
    if t >= 1.0 {
        return c2;
    }
    let (h1, s1, l1) = rgb_to_hsl(c1);
    let (h2, s2, l2) = rgb_to_hsl(c2);

    // Shortest way round the hue circle.
    let mut dh = h2 - h1;
    if dh > 0.5 {
        dh -= 1.0;
    } else if dh < -0.5 {
        dh += 1.0;
    }
    let h = (h1 + dh * t).rem_euclid(1.0);
    let s = s1 + (s2 - s1) * t;
    let l = l1 + (l2 - l1) * t;
    let a = (c1.a as f32 + (c2.a as f32 - c1.a as f32) * t).round() as u8;
    let mut out = hsl_to_rgb(h, s, l);
    out.a = a;
    out
}

fn rgb_to_hsl(c: Pixel) -> (f32, f32, f32) {
    let r = c.r as f32 / 255.0;
    let g = c.g as f32 / 255.0;
    let b = c.b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) * 0.5;
    let d = max - min;
    if d <= f32::EPSILON {
        return (0.0, 0.0, l);
    }
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        ((g - b) / d).rem_euclid(6.0)
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Pixel {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(1.0) * 6.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp.floor() as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c * 0.5;
    let to_u8 = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
    Pixel::rgb(to_u8(r), to_u8(g), to_u8(b))
}
