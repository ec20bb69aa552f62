//! Plain-data snapshot of an [`IfsEngine`](super::IfsEngine).
//!
//! Gradients are stored by name and checked against the catalog version on
//! restore; everything else is value data with `PartialEq`.

use super::ColorMode;
use super::hits::IfsPoint;
use super::similitude::{Similitude, TransformVariant};
use crate::gradient::{CATALOG_VERSION, GradientId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalState {
    pub width: u32,
    pub height: u32,
    pub num_similitudes: usize,
    pub depth: u32,
    pub count: u32,
    pub speed: u32,
    pub r1_mean: f32,
    pub r2_mean: f32,
    pub dr1_mean: f32,
    pub dr2_mean: f32,
    pub transform: TransformVariant,
    /// `[current, gen0, gen1, gen2, gen3]`, each `num_similitudes` long.
    pub components: Vec<Similitude>,
    pub current_hits: Vec<IfsPoint>,
    pub previous_hits: Vec<IfsPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorizerState {
    pub mixer_map1: GradientId,
    pub prev_mixer_map1: GradientId,
    pub mixer_map2: GradientId,
    pub prev_mixer_map2: GradientId,
    pub count_since_color_map_change: u32,
    pub color_map_change_completed: u32,
    pub color_mode: ColorMode,
    pub forced_color_mode: Option<ColorMode>,
    pub t_between_colors: f32,
    pub sine_phase: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineCounters {
    pub ifs_incr: i32,
    pub decay_ifs: i32,
    pub recay_ifs: i32,
    pub cycle: u32,
    pub allow_overexposed: bool,
    pub count_since_overexposed: u32,
    pub low_density_count: u32,
    pub low_density_blur_threshold: f32,
    pub blur_width: u32,
    pub use_random_low_density_colors: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfsState {
    pub catalog_version: u32,
    pub fractal: FractalState,
    pub colorizer: ColorizerState,
    pub engine: EngineCounters,
}

impl IfsState {
    pub fn new(fractal: FractalState, colorizer: ColorizerState, engine: EngineCounters) -> Self {
        Self {
            catalog_version: CATALOG_VERSION,
            fractal,
            colorizer,
            engine,
        }
    }
}
