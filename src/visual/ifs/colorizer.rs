//! Point colors from hit density, draw order or a sine phase, with gradient cross-fades.

use super::state::ColorizerState;
use crate::error::IfsError;
use crate::gradient::{GradientGroup, GradientId, WeightedGradients, mix_colors};
use crate::pixel::{GammaCorrection, Pixel};
use crate::random::{RandomStream, Weights};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    MapColors,
    MegaMapColorChange,
    MixColors,
    MegaMixColorChange,
    ReverseMixColors,
    SingleColors,
    SineMixColors,
    SineMapColors,
}

impl ColorMode {
    pub const fn all() -> [Self; 8] {
        [
            Self::MapColors,
            Self::MegaMapColorChange,
            Self::MixColors,
            Self::MegaMixColorChange,
            Self::ReverseMixColors,
            Self::SingleColors,
            Self::SineMixColors,
            Self::SineMapColors,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MapColors => "map_colors",
            Self::MegaMapColorChange => "mega_map_color_change",
            Self::MixColors => "mix_colors",
            Self::MegaMixColorChange => "mega_mix_color_change",
            Self::ReverseMixColors => "reverse_mix_colors",
            Self::SingleColors => "single_colors",
            Self::SineMixColors => "sine_mix_colors",
            Self::SineMapColors => "sine_map_colors",
        }
    }

    pub fn is_mega(self) -> bool {
        matches!(self, Self::MegaMapColorChange | Self::MegaMixColorChange)
    }
}

impl FromStr for ColorMode {
    type Err = IfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let want = s.trim().to_ascii_lowercase().replace('-', "_");
        ColorMode::all()
            .into_iter()
            .find(|m| m.name() == want)
            .ok_or_else(|| IfsError::UnknownColorMode(s.to_string()))
    }
}

const COLOR_MODE_WEIGHTS: [(ColorMode, u32); 8] = [
    (ColorMode::MapColors, 15),
    (ColorMode::MegaMapColorChange, 20),
    (ColorMode::MixColors, 10),
    (ColorMode::MegaMixColorChange, 15),
    (ColorMode::ReverseMixColors, 5),
    (ColorMode::SingleColors, 5),
    (ColorMode::SineMixColors, 15),
    (ColorMode::SineMapColors, 15),
];

const GRADIENT_GROUP_WEIGHTS: [(GradientGroup, u32); 8] = [
    (GradientGroup::PerceptuallyUniformSequential, 10),
    (GradientGroup::Sequential, 10),
    (GradientGroup::Sequential2, 10),
    (GradientGroup::Cyclic, 10),
    (GradientGroup::Diverging, 20),
    (GradientGroup::DivergingBlack, 1),
    (GradientGroup::Qualitative, 10),
    (GradientGroup::Misc, 20),
];

const MIN_COLOR_MAP_CHANGE_COMPLETED: u32 = 5;
const MAX_COLOR_MAP_CHANGE_COMPLETED: u32 = 50;
const BRIGHTNESS: f32 = 1.9;
const SINE_FREQ: f32 = 20.0;
const SINE_Z_STEP: f32 = 0.1;

/// Maps a hit's density and draw position to its final color.
pub struct Colorizer {
    gradients: WeightedGradients,
    mode_weights: Weights<ColorMode>,
    rng: RandomStream,
    mixer_map1: GradientId,
    prev_mixer_map1: GradientId,
    mixer_map2: GradientId,
    prev_mixer_map2: GradientId,
    count_since_color_map_change: u32,
    color_map_change_completed: u32,
    color_mode: ColorMode,
    forced_color_mode: Option<ColorMode>,
    max_hit_count: u32,
    log_max_hit_count: f32,
    t_between_colors: f32,
    sine_z: f32,
    gamma: GammaCorrection,
}

impl Colorizer {
    pub fn new(mut rng: RandomStream) -> Self {
        let gradients = WeightedGradients::new(Weights::new(&GRADIENT_GROUP_WEIGHTS));
        let map1 = gradients.random_gradient(&mut rng);
        let map2 = gradients.random_gradient(&mut rng);
        Self {
            gradients,
            mode_weights: Weights::new(&COLOR_MODE_WEIGHTS),
            rng,
            mixer_map1: map1,
            prev_mixer_map1: map1,
            mixer_map2: map2,
            prev_mixer_map2: map2,
            count_since_color_map_change: 0,
            color_map_change_completed: MIN_COLOR_MAP_CHANGE_COMPLETED,
            color_mode: ColorMode::MapColors,
            forced_color_mode: None,
            max_hit_count: 0,
            log_max_hit_count: 0.0,
            t_between_colors: 0.5,
            sine_z: 0.0,
            gamma: GammaCorrection::new(4.2, 0.01),
        }
    }

    pub fn gradients(&self) -> &WeightedGradients {
        &self.gradients
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn forced_color_mode(&self) -> Option<ColorMode> {
        self.forced_color_mode
    }

    pub fn set_forced_color_mode(&mut self, mode: Option<ColorMode>) {
        self.forced_color_mode = mode;
    }

    pub fn mixer_maps(&self) -> (GradientId, GradientId) {
        (self.mixer_map1, self.mixer_map2)
    }

    pub fn change_color_mode(&mut self) {
        self.color_mode = match self.forced_color_mode {
            Some(mode) => mode,
            None => self.mode_weights.random_weighted(&mut self.rng),
        };
    }

    pub fn change_color_maps(&mut self) {
        self.prev_mixer_map1 = self.mixer_map1;
        self.mixer_map1 = self.gradients.random_gradient(&mut self.rng);
        self.prev_mixer_map2 = self.mixer_map2;
        self.mixer_map2 = self.gradients.random_gradient(&mut self.rng);
        self.color_map_change_completed = self
            .rng
            .u32_in(MIN_COLOR_MAP_CHANGE_COMPLETED, MAX_COLOR_MAP_CHANGE_COMPLETED);
        self.t_between_colors = self.rng.f32_in(0.2, 0.8);
        self.count_since_color_map_change = self.color_map_change_completed;
    }

    /// Remaining weight of the previous gradient pair; 0 once the cross-fade is done.
    pub fn cross_fade_weight(&self) -> f32 {
        if self.count_since_color_map_change == 0 {
            return 0.0;
        }
        self.count_since_color_map_change as f32 / self.color_map_change_completed as f32
    }

    pub fn set_max_hit_count(&mut self, val: u32) {
        self.max_hit_count = val;
        self.log_max_hit_count = (val as f32).ln();
    }

    pub fn reset_sine_phase(&mut self) {
        self.sine_z = 0.0;
    }

    /// Current gradient pair sampled at `t`, without any cross-fade.
    pub fn gradient_sample(&self, t: f32, x: f32, y: f32) -> Pixel {
        mix_colors(self.mixer_map1.color_at(x), self.mixer_map2.color_at(y), t)
    }

    fn next_mixer_map_color(&mut self, t: f32, x: f32, y: f32) -> Pixel {
        let next = self.gradient_sample(t, x, y);
        if self.count_since_color_map_change == 0 {
            return next;
        }

        let t_transition = self.cross_fade_weight();
        self.count_since_color_map_change -= 1;
        let prev = mix_colors(
            self.prev_mixer_map1.color_at(x),
            self.prev_mixer_map2.color_at(y),
            t,
        );
        mix_colors(next, prev, t_transition)
    }

    pub fn mixed_color(&mut self, base: Pixel, hit_count: u32, t_mix: f32, x: f32, y: f32) -> Pixel {
        let log_alpha = if self.max_hit_count <= 1 {
            1.0
        } else {
            BRIGHTNESS * (hit_count as f32).ln() / self.log_max_hit_count
        };

        let mut t_base_mix = 1.0 - self.t_between_colors;
        let mix_color = match self.color_mode {
            ColorMode::MapColors | ColorMode::MegaMapColorChange => {
                let c = self.next_mixer_map_color(log_alpha, x, y);
                t_base_mix = self.rng.f32_in(0.1, 0.3);
                c
            }
            ColorMode::MixColors | ColorMode::ReverseMixColors | ColorMode::MegaMixColorChange => {
                self.next_mixer_map_color(t_mix, x, y)
            }
            ColorMode::SingleColors => base,
            ColorMode::SineMixColors | ColorMode::SineMapColors => {
                let t = 0.5 * (1.0 + (SINE_FREQ * self.sine_z).sin());
                let c = self.next_mixer_map_color(t, x, y);
                self.sine_z += SINE_Z_STEP;
                c
            }
        };

        let color = if self.color_mode == ColorMode::ReverseMixColors {
            mix_colors(mix_color, base, t_base_mix)
        } else {
            mix_colors(base, mix_color, t_base_mix)
        };

        self.gamma.correct(log_alpha, color)
    }

    pub fn save_state(&self) -> ColorizerState {
        ColorizerState {
            mixer_map1: self.mixer_map1,
            prev_mixer_map1: self.prev_mixer_map1,
            mixer_map2: self.mixer_map2,
            prev_mixer_map2: self.prev_mixer_map2,
            count_since_color_map_change: self.count_since_color_map_change,
            color_map_change_completed: self.color_map_change_completed,
            color_mode: self.color_mode,
            forced_color_mode: self.forced_color_mode,
            t_between_colors: self.t_between_colors,
            sine_phase: self.sine_z,
        }
    }

    pub fn restore_state(&mut self, state: &ColorizerState) {
        self.mixer_map1 = state.mixer_map1;
        self.prev_mixer_map1 = state.prev_mixer_map1;
        self.mixer_map2 = state.mixer_map2;
        self.prev_mixer_map2 = state.prev_mixer_map2;
        self.color_map_change_completed = state.color_map_change_completed.max(1);
        self.count_since_color_map_change = state
            .count_since_color_map_change
            .min(self.color_map_change_completed);
        self.color_mode = state.color_mode;
        self.forced_color_mode = state.forced_color_mode;
        self.t_between_colors = state.t_between_colors;
        self.sine_z = state.sine_phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colorizer(seed: u64) -> Colorizer {
        Colorizer::new(RandomStream::with_seed(seed))
    }

    #[test]
    fn parses_mode_names() {
        for mode in ColorMode::all() {
            assert_eq!(mode.name().parse::<ColorMode>().unwrap(), mode);
        }
        assert_eq!("sine-map-colors".parse::<ColorMode>().unwrap(), ColorMode::SineMapColors);
        assert!(matches!(
            "plaid".parse::<ColorMode>(),
            Err(IfsError::UnknownColorMode(_))
        ));
    }

    #[test]
    fn forced_mode_wins() {
        let mut c = colorizer(1);
        c.set_forced_color_mode(Some(ColorMode::SingleColors));
        for _ in 0..20 {
            c.change_color_mode();
            assert_eq!(c.color_mode(), ColorMode::SingleColors);
        }
    }

    #[test]
    fn change_color_maps_arms_cross_fade() {
        let mut c = colorizer(2);
        c.change_color_maps();
        assert!((MIN_COLOR_MAP_CHANGE_COMPLETED..MAX_COLOR_MAP_CHANGE_COMPLETED)
            .contains(&c.color_map_change_completed));
        assert_eq!(c.count_since_color_map_change, c.color_map_change_completed);
        assert!((0.2..=0.8).contains(&c.t_between_colors));
        assert_eq!(c.cross_fade_weight(), 1.0);
    }

    #[test]
    fn cross_fade_converges_to_plain_sample() {
        let mut c = colorizer(3);
        c.set_forced_color_mode(Some(ColorMode::MixColors));
        c.change_color_mode();
        c.change_color_maps();
        c.set_max_hit_count(8);

        let completed = c.color_map_change_completed;
        let mut last = c.cross_fade_weight();
        for _ in 0..completed {
            let _ = c.next_mixer_map_color(0.4, 0.3, 0.7);
            let w = c.cross_fade_weight();
            assert!(w < last);
            last = w;
        }
        assert_eq!(c.cross_fade_weight(), 0.0);
        assert_eq!(
            c.next_mixer_map_color(0.4, 0.3, 0.7),
            c.gradient_sample(0.4, 0.3, 0.7)
        );
    }

    #[test]
    fn single_colors_keeps_base_at_full_density() {
        let mut c = colorizer(4);
        c.set_forced_color_mode(Some(ColorMode::SingleColors));
        c.change_color_mode();
        c.set_max_hit_count(1);
        let base = Pixel::rgb(120, 40, 200);
        let out = c.mixed_color(base, 1, 0.5, 0.5, 0.5);
        // HSL round trip may shift a channel by one.
        for (got, want) in [(out.r, base.r), (out.g, base.g), (out.b, base.b)] {
            assert!(got.abs_diff(want) <= 1, "{out:?} vs {base:?}");
        }
    }

    #[test]
    fn zero_density_is_black() {
        let mut c = colorizer(5);
        c.set_max_hit_count(10);
        // ln(1) = 0 gives zero exposure.
        let out = c.mixed_color(Pixel::rgb(255, 255, 255), 1, 0.5, 0.2, 0.8);
        assert!(out.is_black());
    }

    #[test]
    fn sine_modes_advance_phase() {
        let mut c = colorizer(6);
        c.set_forced_color_mode(Some(ColorMode::SineMixColors));
        c.change_color_mode();
        c.set_max_hit_count(4);
        for _ in 0..3 {
            let _ = c.mixed_color(Pixel::rgb(9, 9, 9), 2, 0.0, 0.1, 0.1);
        }
        assert!((c.sine_z - 0.3).abs() < 1e-5);
        c.reset_sine_phase();
        assert_eq!(c.sine_z, 0.0);
    }

    #[test]
    fn state_round_trip() {
        let mut a = colorizer(7);
        a.change_color_maps();
        a.set_forced_color_mode(Some(ColorMode::ReverseMixColors));
        a.change_color_mode();
        let mut b = colorizer(99);
        b.restore_state(&a.save_state());
        assert_eq!(a.save_state(), b.save_state());
    }
}
