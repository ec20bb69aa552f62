//! One contraction map of the IFS plus its fixed-point trace form.

use crate::pixel::Pixel;
use serde::{Deserialize, Serialize};

pub(crate) const FIX: u32 = 12;
const UNIT: f32 = (1 << FIX) as f32;

/// Limits applied when a similitude is converted to fixed point. Generated
/// values sit well inside them; restored ones are clamped so trace products
/// stay far from `i64` range.
const MAX_CENTER: f32 = 16.0;
const MAX_RADIUS: f32 = 4.0;

/// Fixed-point scalar, `1 << FIX` is 1.0.
pub type Flt = i64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FltPoint {
    pub x: Flt,
    pub y: Flt,
}

#[inline]
pub(crate) fn to_flt(x: f32) -> Flt {
    (UNIT * x) as Flt
}

#[inline]
pub(crate) fn div_by_unit(x: Flt) -> Flt {
    x >> FIX
}

#[inline]
pub(crate) fn div_by_2_units(x: Flt) -> Flt {
    x >> (FIX + 1)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Similitude {
    pub cx: f32,
    pub cy: f32,
    pub r1: f32,
    pub r2: f32,
    /// Radians.
    pub a1: f32,
    pub a2: f32,
    pub color: Pixel,
}

impl Similitude {
    pub fn fixed(&self) -> FixedSimilitude {
        FixedSimilitude {
            cx: to_flt(self.cx.clamp(-MAX_CENTER, MAX_CENTER)),
            cy: to_flt(self.cy.clamp(-MAX_CENTER, MAX_CENTER)),
            r1: to_flt(self.r1.clamp(-MAX_RADIUS, MAX_RADIUS)),
            r2: to_flt(self.r2.clamp(-MAX_RADIUS, MAX_RADIUS)),
            cos_a1: to_flt(self.a1.cos()),
            sin_a1: to_flt(self.a1.sin()),
            cos_a2: to_flt(self.a2.cos()),
            sin_a2: to_flt(self.a2.sin()),
            color: self.color,
        }
    }
}

/// Cached integer form of a [`Similitude`], rebuilt once per trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedSimilitude {
    pub cx: Flt,
    pub cy: Flt,
    pub r1: Flt,
    pub r2: Flt,
    pub cos_a1: Flt,
    pub sin_a1: Flt,
    pub cos_a2: Flt,
    pub sin_a2: Flt,
    pub color: Pixel,
}

/// Final rotation step of a transform, given the two contracted offsets.
pub type IfsFunc = fn(&FixedSimilitude, Flt, Flt, Flt, Flt) -> FltPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformVariant {
    Standard,
    Reverse,
}

impl TransformVariant {
    pub fn func(self) -> IfsFunc {
        match self {
            Self::Standard => standard_func,
            Self::Reverse => reverse_func,
        }
    }
}

fn standard_func(s: &FixedSimilitude, x1: Flt, y1: Flt, x2: Flt, y2: Flt) -> FltPoint {
    FltPoint {
        x: div_by_unit(x1 * s.cos_a1 - y1 * s.sin_a1 + x2 * s.cos_a2 - y2 * s.sin_a2) + s.cx,
        y: div_by_unit(x1 * s.sin_a1 + y1 * s.cos_a1 + x2 * s.sin_a2 + y2 * s.cos_a2) + s.cy,
    }
}

fn reverse_func(s: &FixedSimilitude, x1: Flt, y1: Flt, x2: Flt, y2: Flt) -> FltPoint {
    FltPoint {
        x: div_by_unit(x1 * s.sin_a1 - y1 * s.cos_a1 + x2 * s.sin_a2 - y2 * s.cos_a2) + s.cx,
        y: div_by_unit(x1 * s.cos_a1 + y1 * s.sin_a1 + x2 * s.cos_a2 + y2 * s.sin_a2) + s.cy,
    }
}

/// Apply one contraction map to `p0`.
#[inline]
pub fn transform(func: IfsFunc, s: &FixedSimilitude, p0: FltPoint) -> FltPoint {
    let x1 = div_by_unit((p0.x - s.cx) * s.r1);
    let y1 = div_by_unit((p0.y - s.cy) * s.r1);

    let x2 = div_by_unit((x1 - s.cx) * s.r2);
    let y2 = div_by_unit((-y1 - s.cy) * s.r2);

    func(s, x1, y1, x2, y2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_like() -> FixedSimilitude {
        Similitude {
            cx: 0.0,
            cy: 0.0,
            r1: 0.5,
            r2: 0.0,
            a1: 0.0,
            a2: 0.0,
            color: Pixel::rgb(1, 2, 3),
        }
        .fixed()
    }

    #[test]
    fn standard_transform_halves_toward_center() {
        let s = identity_like();
        let p = transform(TransformVariant::Standard.func(), &s, FltPoint { x: 4096, y: -4096 });
        assert_eq!(p, FltPoint { x: 2048, y: -2048 });
    }

    #[test]
    fn reverse_transform_swaps_axes() {
        let s = identity_like();
        let p = transform(TransformVariant::Reverse.func(), &s, FltPoint { x: 4096, y: 0 });
        // sin(0) = 0, cos(0) = 1: x picks up -y1, y picks up x1.
        assert_eq!(p, FltPoint { x: 0, y: 2048 });
    }

    #[test]
    fn fixed_form_clamps_wild_parameters() {
        let s = Similitude {
            cx: 1e30,
            cy: f32::NEG_INFINITY,
            r1: 5e20,
            r2: -7e12,
            a1: 1.0,
            a2: 2.0,
            color: Pixel::BLACK,
        }
        .fixed();
        assert_eq!((s.cx, s.cy), (to_flt(16.0), to_flt(-16.0)));
        assert_eq!((s.r1, s.r2), (to_flt(4.0), to_flt(-4.0)));

        let far = FltPoint { x: to_flt(64.0), y: to_flt(-64.0) };
        for variant in [TransformVariant::Standard, TransformVariant::Reverse] {
            let p = transform(variant.func(), &s, far);
            assert!(p.x.abs() < to_flt(1.0e5) && p.y.abs() < to_flt(1.0e5));
        }
    }

    #[test]
    fn fixed_point_scale() {
        assert_eq!(to_flt(1.0), 4096);
        assert_eq!(div_by_unit(to_flt(0.5) * to_flt(0.5)), 1024);
        assert_eq!(div_by_2_units(4096 * 10), 5);
    }
}
