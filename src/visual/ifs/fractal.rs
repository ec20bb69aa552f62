//! Evolving IFS: four generation snapshots blended into a current set, traced
//! into a double-buffered hit grid.

use super::hits::{FractalHits, IfsPoint};
use super::similitude::{
    FIX, FixedSimilitude, Flt, FltPoint, IfsFunc, Similitude, TransformVariant, div_by_2_units,
    transform,
};
use super::state::FractalState;
use crate::error::IfsError;
use crate::gradient::WeightedGradients;
use crate::random::{RandomStream, Weights};
use log::{debug, trace};

pub const MIN_SIMILITUDES: usize = 2;
pub const MAX_SIMILITUDES: usize = 5;
pub const MAX_COUNT_TIMES_SPEED: u32 = 1000;
const NUM_GENERATIONS: usize = 4;
const NUM_SLOTS: usize = NUM_GENERATIONS + 1;

/// Positions closer than this on both axes end a trace branch.
const COLLAPSE_THRESHOLD: Flt = 16;
/// Branches that wander this far from the origin (in units) are not followed;
/// the screen only spans about two units either way.
const ESCAPE_RADIUS: Flt = 64 << FIX;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Shape {
    depth: u32,
    r1_mean: f32,
    r2_mean: f32,
    dr1_mean: f32,
    dr2_mean: f32,
}

// Indexed by `num_similitudes - 2`.
const SHAPES: [Shape; 4] = [
    Shape { depth: 10, r1_mean: 0.7, r2_mean: 0.0, dr1_mean: 0.3, dr2_mean: 0.4 },
    Shape { depth: 6, r1_mean: 0.6, r2_mean: 0.0, dr1_mean: 0.4, dr2_mean: 0.3 },
    Shape { depth: 4, r1_mean: 0.5, r2_mean: 0.0, dr1_mean: 0.4, dr2_mean: 0.3 },
    Shape { depth: 2, r1_mean: 0.4, r2_mean: 0.0, dr1_mean: 0.5, dr2_mean: 0.3 },
];

const SIMILITUDE_COUNT_WEIGHTS: [(usize, u32); 4] = [(2, 10), (3, 5), (4, 3), (5, 1)];

fn one_minus_exp_neg(s: f32) -> f32 {
    1.0 - (-s).exp()
}

/// Bounded symmetric sampler: `c +/- factor * (1 - exp(-x^2 s))`, x uniform in [0, 1].
fn gauss_rand(rng: &mut RandomStream, c: f32, s: f32, factor: f32) -> f32 {
    let x = rng.f32_in(0.0, 1.0);
    let y = factor * (1.0 - (-x * x * s).exp());
    c + rng.sign() * y
}

fn half_gauss_rand(rng: &mut RandomStream, c: f32, s: f32, factor: f32) -> f32 {
    let x = rng.f32_in(0.0, 1.0);
    c + factor * (1.0 - (-x * x * s).exp())
}

#[derive(Clone, Copy, Debug)]
struct TraceFrame {
    depth: u32,
    origin: FltPoint,
    next: usize,
}

pub struct Fractal {
    width: u32,
    height: u32,
    lx: Flt,
    ly: Flt,
    num_simi: usize,
    shape: Shape,
    count: u32,
    speed: u32,
    generation_shifts: u64,
    components: Vec<Similitude>,
    fixed: Vec<FixedSimilitude>,
    variant: TransformVariant,
    func: IfsFunc,
    hits: [FractalHits; 2],
    cur: usize,
    stack: Vec<TraceFrame>,
    gradients: WeightedGradients,
    rng: RandomStream,
}

impl Fractal {
    pub fn new(
        width: u32,
        height: u32,
        gradients: WeightedGradients,
        rng: RandomStream,
    ) -> Result<Self, IfsError> {
        if width == 0 || height == 0 {
            return Err(IfsError::InvalidDimensions { width, height });
        }
        let mut fractal = Self {
            width,
            height,
            lx: ((width - 1) / 2) as Flt,
            ly: ((height - 1) / 2) as Flt,
            num_simi: MIN_SIMILITUDES,
            shape: SHAPES[0],
            count: 0,
            speed: 6,
            generation_shifts: 0,
            components: Vec::new(),
            fixed: Vec::with_capacity(MAX_SIMILITUDES),
            variant: TransformVariant::Standard,
            func: TransformVariant::Standard.func(),
            hits: [FractalHits::new(width, height), FractalHits::new(width, height)],
            cur: 0,
            stack: Vec::with_capacity(16),
            gradients,
            rng,
        };
        fractal.init();
        fractal.reset_current_ifs_func();
        Ok(fractal)
    }

    /// Draw a new shape class and fill every generation with fresh similitudes.
    pub fn init(&mut self) {
        let n = Weights::new(&SIMILITUDE_COUNT_WEIGHTS).random_weighted(&mut self.rng);
        self.setup(n);
    }

    pub fn init_with_num_similitudes(&mut self, n: usize) -> Result<(), IfsError> {
        if !(MIN_SIMILITUDES..=MAX_SIMILITUDES).contains(&n) {
            return Err(IfsError::InvalidSimilitudeCount(n));
        }
        self.setup(n);
        Ok(())
    }

    fn setup(&mut self, n: usize) {
        self.hits[0].reset();
        self.hits[1].reset();

        self.num_simi = n;
        self.shape = SHAPES[n - MIN_SIMILITUDES];
        self.count = 0;
        self.components = vec![Similitude::default(); NUM_SLOTS * n];
        for slot in 0..NUM_SLOTS {
            self.random_simis(slot);
        }
        self.stack.reserve(self.shape.depth as usize + 2);
        debug!(
            "ifs fractal init: {} similitudes, depth {}",
            n, self.shape.depth
        );
    }

    /// Pick the standard or reverse rotation step, 7 to 3.
    pub fn reset_current_ifs_func(&mut self) -> TransformVariant {
        self.variant = if self.rng.probability_of_m_in_n(3, 10) {
            TransformVariant::Reverse
        } else {
            TransformVariant::Standard
        };
        self.func = self.variant.func();
        self.variant
    }

    pub fn transform_variant(&self) -> TransformVariant {
        self.variant
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Change speed, rescaling `count` so the blend position stays put.
    pub fn set_speed(&mut self, speed: u32) {
        let old = self.speed;
        self.speed = speed.clamp(1, MAX_COUNT_TIMES_SPEED);
        self.count = (self.count * old / self.speed).min(self.max_count());
    }

    pub fn num_similitudes(&self) -> usize {
        self.num_simi
    }

    pub fn depth(&self) -> u32 {
        self.shape.depth
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn generation_shifts(&self) -> u64 {
        self.generation_shifts
    }

    /// Calls to [`Fractal::draw_ifs`] between generation shifts.
    pub fn max_count(&self) -> u32 {
        MAX_COUNT_TIMES_SPEED / self.speed
    }

    pub fn current(&self) -> &[Similitude] {
        &self.components[..self.num_simi]
    }

    /// Generation snapshot `i` in `0..4`.
    pub fn generation(&self, i: usize) -> &[Similitude] {
        let start = (i + 1) * self.num_simi;
        &self.components[start..start + self.num_simi]
    }

    pub fn previous_hits(&self) -> &FractalHits {
        &self.hits[1 - self.cur]
    }

    fn random_simis(&mut self, slot: usize) {
        let c_factor = 0.8 * one_minus_exp_neg(4.0);
        let r1_factor = self.shape.dr1_mean * one_minus_exp_neg(3.0);
        let r2_factor = self.shape.dr2_mean * one_minus_exp_neg(2.0);
        let a_factor = 360.0 * one_minus_exp_neg(4.0);

        let group = self.gradients.random_group(&mut self.rng);
        let rng = &mut self.rng;
        let start = slot * self.num_simi;
        for simi in &mut self.components[start..start + self.num_simi] {
            simi.cx = gauss_rand(rng, 0.0, 4.0, c_factor);
            simi.cy = gauss_rand(rng, 0.0, 4.0, c_factor);
            simi.r1 = gauss_rand(rng, self.shape.r1_mean, 3.0, r1_factor);
            simi.r2 = half_gauss_rand(rng, self.shape.r2_mean, 2.0, r2_factor);
            simi.a1 = gauss_rand(rng, 0.0, 4.0, a_factor).to_radians();
            simi.a2 = gauss_rand(rng, 0.0, 4.0, a_factor).to_radians();
            simi.color = self.gradients.random_gradient_in(group, rng).random_color(rng, 0.0, 1.0);
        }
    }

    /// Trace one frame into `out` and return this pass's max hit count.
    pub fn draw_ifs(&mut self, out: &mut Vec<IfsPoint>) -> u32 {
        self.blend_current();

        self.hits[self.cur].reset();
        self.draw_fractal();
        self.hits[self.cur].collect_points(out);
        let max_hit_count = self.hits[self.cur].max_hit_count();
        self.cur = 1 - self.cur;

        self.count += 1;
        if self.count >= self.max_count() {
            self.shift_generations();
            self.count = 0;
        }

        trace!(
            "ifs draw: {} points, max hits {}, count {}",
            out.len(),
            max_hit_count,
            self.count
        );
        max_hit_count
    }

    fn blend_current(&mut self) {
        let u = (self.count as f32 * self.speed as f32 / MAX_COUNT_TIMES_SPEED as f32).min(1.0);
        let v = 1.0 - u;
        let w = [v * v * v, 3.0 * v * v * u, 3.0 * v * u * u, u * u * u];

        let n = self.num_simi;
        for i in 0..n {
            let g = |k: usize| self.components[(k + 1) * n + i];
            let (s0, s1, s2, s3) = (g(0), g(1), g(2), g(3));
            let mix = |f: fn(&Similitude) -> f32| {
                w[0] * f(&s0) + w[1] * f(&s1) + w[2] * f(&s2) + w[3] * f(&s3)
            };
            let blended = Similitude {
                cx: mix(|s| s.cx),
                cy: mix(|s| s.cy),
                r1: mix(|s| s.r1),
                r2: mix(|s| s.r2),
                a1: mix(|s| s.a1),
                a2: mix(|s| s.a2),
                color: self.components[i].color,
            };
            self.components[i] = blended;
        }
    }

    fn shift_generations(&mut self) {
        let n = self.num_simi;
        for i in 0..n {
            let s2 = self.components[3 * n + i];
            let s3 = self.components[4 * n + i];
            let s1 = &mut self.components[2 * n + i];
            s1.cx = 2.0 * s3.cx - s2.cx;
            s1.cy = 2.0 * s3.cy - s2.cy;
            s1.r1 = 2.0 * s3.r1 - s2.r1;
            s1.r2 = 2.0 * s3.r2 - s2.r2;
            s1.a1 = 2.0 * s3.a1 - s2.a1;
            s1.a2 = 2.0 * s3.a2 - s2.a2;
            self.components[n + i] = s3;
        }
        self.random_simis(3);
        self.random_simis(4);
        self.generation_shifts += 1;
        debug!("ifs generation shift #{}", self.generation_shifts);
    }

    fn draw_fractal(&mut self) {
        self.fixed.clear();
        self.fixed
            .extend(self.components[..self.num_simi].iter().map(Similitude::fixed));

        for i in 0..self.num_simi {
            let p0 = FltPoint {
                x: self.fixed[i].cx,
                y: self.fixed[i].cy,
            };
            for j in 0..self.num_simi {
                if i != j {
                    let p = transform(self.func, &self.fixed[j], p0);
                    self.trace(self.shape.depth, p);
                }
            }
        }
    }

    /// Depth-first walk applying every similitude, in the order the recursive
    /// form would visit them.
    fn trace(&mut self, depth: u32, p0: FltPoint) {
        let n = self.fixed.len();
        let hits = &mut self.hits[self.cur];
        let stack = &mut self.stack;
        stack.clear();
        stack.push(TraceFrame {
            depth,
            origin: p0,
            next: 0,
        });

        while let Some(top) = stack.last_mut() {
            if top.next == n {
                stack.pop();
                continue;
            }
            let i = top.next;
            top.next += 1;
            let (depth, origin) = (top.depth, top.origin);

            let simi = &self.fixed[i];
            let p = transform(self.func, simi, origin);
            if let Some((x, y)) = to_screen(self.lx, self.ly, p) {
                hits.add_hit(x, y, simi.color);
            }

            if depth == 0 || collapsed(origin, p) || escaped(p) {
                continue;
            }
            stack.push(TraceFrame {
                depth: depth - 1,
                origin: p,
                next: 0,
            });
        }
    }

    pub fn save_state(&self) -> FractalState {
        FractalState {
            width: self.width,
            height: self.height,
            num_similitudes: self.num_simi,
            depth: self.shape.depth,
            count: self.count,
            speed: self.speed,
            r1_mean: self.shape.r1_mean,
            r2_mean: self.shape.r2_mean,
            dr1_mean: self.shape.dr1_mean,
            dr2_mean: self.shape.dr2_mean,
            transform: self.variant,
            components: self.components.clone(),
            current_hits: self.hits[self.cur].points(),
            previous_hits: self.hits[1 - self.cur].points(),
        }
    }

    pub fn restore_state(&mut self, state: &FractalState) -> Result<(), IfsError> {
        if state.width != self.width || state.height != self.height {
            return Err(IfsError::StateMismatch {
                field: "fractal.size",
                message: format!(
                    "saved {}x{}, engine is {}x{}",
                    state.width, state.height, self.width, self.height
                ),
            });
        }
        let n = state.num_similitudes;
        if !(MIN_SIMILITUDES..=MAX_SIMILITUDES).contains(&n) {
            return Err(IfsError::InvalidSimilitudeCount(n));
        }
        if state.components.len() != NUM_SLOTS * n {
            return Err(IfsError::StateMismatch {
                field: "fractal.components",
                message: format!(
                    "expected {} similitudes, found {}",
                    NUM_SLOTS * n,
                    state.components.len()
                ),
            });
        }

        // Shape is a function of the similitude count; saved copies are informational.
        self.num_simi = n;
        self.shape = SHAPES[n - MIN_SIMILITUDES];
        self.speed = state.speed.clamp(1, MAX_COUNT_TIMES_SPEED);
        self.count = state.count.min(self.max_count());
        self.variant = state.transform;
        self.func = state.transform.func();
        self.components = state.components.clone();
        self.hits[self.cur].restore(&state.current_hits);
        self.hits[1 - self.cur].restore(&state.previous_hits);
        Ok(())
    }
}

fn to_screen(lx: Flt, ly: Flt, p: FltPoint) -> Option<(u32, u32)> {
    let x = lx + div_by_2_units(p.x * lx);
    let y = ly - div_by_2_units(p.y * ly);
    Some((u32::try_from(x).ok()?, u32::try_from(y).ok()?))
}

fn escaped(p: FltPoint) -> bool {
    p.x.abs() > ESCAPE_RADIUS || p.y.abs() > ESCAPE_RADIUS
}

fn collapsed(a: FltPoint, b: FltPoint) -> bool {
    (b.x - a.x).abs() < COLLAPSE_THRESHOLD && (b.y - a.y).abs() < COLLAPSE_THRESHOLD
}
