//! IFS dancers: an evolving iterated function system drawn as a point cloud,
//! colored by hit density and faded in and out by stride.

pub mod blur;
pub mod colorizer;
pub mod fractal;
pub mod hits;
pub mod similitude;
pub mod state;
pub mod stats;

pub use blur::{BlurWidth, LowDensityBlurrer};
pub use colorizer::{ColorMode, Colorizer};
pub use fractal::Fractal;
pub use hits::{FractalHits, IfsPoint};
pub use similitude::{Similitude, TransformVariant};
pub use state::{ColorizerState, EngineCounters, FractalState, IfsState};
pub use stats::IfsStats;

use super::{FxBuffSettings, StatsSink, VisualFx};
use crate::audio::SoundInfo;
use crate::error::IfsError;
use crate::gradient::CATALOG_VERSION;
use crate::pixel::PixelBuffer;
use crate::random::RandomStream;
use log::{debug, info, trace, warn};

const CYCLE_LENGTH: u32 = 500;
const MIN_DENSITY_COUNT: u32 = 5;
const MAX_DENSITY_COUNT: u32 = 20;
const MAX_COUNT_SINCE_OVEREXPOSED: u32 = 100;
const LOW_BLUR_THRESHOLD: f32 = 0.40;
const HIGH_BLUR_THRESHOLD: f32 = 0.99;

pub struct IfsEngine {
    width: u32,
    height: u32,
    sound: SoundInfo,
    buff_settings: FxBuffSettings,
    fractal: Fractal,
    colorizer: Colorizer,
    blurrer: LowDensityBlurrer,
    rng: RandomStream,
    stats: IfsStats,

    allow_overexposed: bool,
    count_since_overexposed: u32,

    cycle: u32,
    ifs_incr: i32,
    decay_ifs: i32,
    recay_ifs: i32,

    low_density_count: u32,
    low_density_blur_threshold: f32,
    use_random_low_density_colors: bool,

    points: Vec<IfsPoint>,
    low_density_points: Vec<IfsPoint>,
    size_warned: bool,
}

impl IfsEngine {
    pub fn new(width: u32, height: u32, seed: u64) -> Result<Self, IfsError> {
        let mut rng = RandomStream::with_seed(seed);
        let colorizer = Colorizer::new(rng.fork());
        let fractal = Fractal::new(width, height, colorizer.gradients().clone(), rng.fork())?;

        let mut engine = Self {
            width,
            height,
            sound: SoundInfo::default(),
            buff_settings: FxBuffSettings::default(),
            fractal,
            colorizer,
            blurrer: LowDensityBlurrer::new(width, height, BlurWidth::Three),
            rng,
            stats: IfsStats::default(),
            allow_overexposed: true,
            count_since_overexposed: 0,
            cycle: 0,
            ifs_incr: 1,
            decay_ifs: 0,
            recay_ifs: 0,
            low_density_count: 10,
            low_density_blur_threshold: LOW_BLUR_THRESHOLD,
            use_random_low_density_colors: false,
            points: Vec::new(),
            low_density_points: Vec::new(),
            size_warned: false,
        };
        let variant = engine.fractal.transform_variant();
        engine.record_ifs_func(variant);
        Ok(engine)
    }

    /// Start a fresh activation: new fractal shape and density threshold.
    pub fn init(&mut self) {
        self.fractal.init();
        self.colorizer.reset_sine_phase();
        self.update_low_density_threshold();
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fractal(&self) -> &Fractal {
        &self.fractal
    }

    pub fn colorizer(&self) -> &Colorizer {
        &self.colorizer
    }

    pub fn stats(&self) -> &IfsStats {
        &self.stats
    }

    pub fn ifs_incr(&self) -> i32 {
        self.ifs_incr
    }

    pub fn decay_ifs(&self) -> i32 {
        self.decay_ifs
    }

    pub fn recay_ifs(&self) -> i32 {
        self.recay_ifs
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn low_density_count(&self) -> u32 {
        self.low_density_count
    }

    pub fn low_density_blur_threshold(&self) -> f32 {
        self.low_density_blur_threshold
    }

    pub fn blur_width(&self) -> BlurWidth {
        self.blurrer.width()
    }

    pub fn allow_overexposed(&self) -> bool {
        self.allow_overexposed
    }

    pub fn color_mode(&self) -> ColorMode {
        self.colorizer.color_mode()
    }

    /// Force a color mode on every renew, or `None` to draw one by weight.
    pub fn set_color_mode(&mut self, mode: Option<ColorMode>) {
        self.colorizer.set_forced_color_mode(mode);
    }

    pub fn set_sound_info(&mut self, sound: SoundInfo) {
        self.sound = sound;
    }

    pub fn set_use_random_low_density_colors(&mut self, val: bool) {
        self.use_random_low_density_colors = val;
    }

    /// New gradients, color mode and fractal speed.
    pub fn renew(&mut self) {
        self.colorizer.change_color_maps();
        self.colorizer.change_color_mode();
        self.update_allow_overexposed();

        let acceleration = self.sound.acceleration.clamp(0.0, 1.0);
        let speed = self.rng.f32_in(1.1, 10.0).min(5.1) / (1.1 - acceleration);
        self.fractal.set_speed(speed as u32);

        self.update_low_density_threshold();

        debug!(
            "ifs renew: mode {}, speed {}, low density {} (blur {}), overexposed {}",
            self.colorizer.color_mode().name(),
            self.fractal.speed(),
            self.low_density_count,
            self.blurrer.width().get(),
            self.allow_overexposed
        );
    }

    /// Fade the effect back in if it has died out.
    pub fn update_incr(&mut self) {
        if self.ifs_incr <= 0 {
            self.recay_ifs = 5;
            self.ifs_incr = 11;
            self.stats.update_ifs_incr(self.ifs_incr);
            self.renew();
        }
    }

    fn update_decay(&mut self) {
        if self.ifs_incr > 0 && self.decay_ifs <= 0 {
            self.decay_ifs = 100;
        }
    }

    fn update_decay_and_recay(&mut self) {
        self.decay_ifs = self.decay_ifs.saturating_sub(1);
        if self.decay_ifs > 0 {
            self.ifs_incr += 2;
        }
        if self.decay_ifs == 0 {
            self.ifs_incr = 0;
        }

        if self.recay_ifs != 0 {
            self.ifs_incr -= 2;
            self.recay_ifs -= 1;
            if self.recay_ifs == 0 && self.ifs_incr <= 0 {
                self.ifs_incr = 1;
            }
        }

        self.stats.update_ifs_incr(self.ifs_incr);
    }

    fn update_allow_overexposed(&mut self) {
        if self.buff_settings.allow_overexposed {
            return;
        }

        if self.allow_overexposed {
            if self.count_since_overexposed == 0 {
                self.allow_overexposed = false;
            } else {
                self.count_since_overexposed -= 1;
            }
        } else if self.rng.probability_of_m_in_n(10, 50) {
            self.allow_overexposed = true;
            self.count_since_overexposed = MAX_COUNT_SINCE_OVEREXPOSED;
        }
    }

    fn update_low_density_threshold(&mut self) {
        self.low_density_count = self.rng.u32_in(MIN_DENSITY_COUNT, MAX_DENSITY_COUNT);

        let range = (MAX_DENSITY_COUNT - MIN_DENSITY_COUNT) / 3;
        let width = if self.low_density_count <= MIN_DENSITY_COUNT + range {
            BlurWidth::Seven
        } else if self.low_density_count <= MIN_DENSITY_COUNT + 2 * range {
            BlurWidth::Five
        } else {
            BlurWidth::Three
        };
        self.blurrer.set_width(width);
    }

    fn record_ifs_func(&mut self, variant: TransformVariant) {
        match variant {
            TransformVariant::Standard => self.stats.update_std_ifs_func(),
            TransformVariant::Reverse => self.stats.update_reverse_ifs_func(),
        }
    }

    fn change_cycle(&mut self) {
        self.cycle = 0;
        self.stats.update_cycle_changes();

        if self.rng.probability_of_m_in_n(15, 20) {
            self.low_density_blur_threshold = HIGH_BLUR_THRESHOLD;
            self.stats.update_high_low_density_blur_threshold();
        } else {
            self.low_density_blur_threshold = LOW_BLUR_THRESHOLD;
            self.stats.update_low_low_density_blur_threshold();
        }

        let variant = self.fractal.reset_current_ifs_func();
        self.record_ifs_func(variant);
        debug!(
            "ifs cycle change: blur threshold {}, {:?} transform",
            self.low_density_blur_threshold, variant
        );

        self.renew();
    }

    fn update_pixel_buffers(
        &mut self,
        current: &mut PixelBuffer,
        next: &mut PixelBuffer,
        points: &[IfsPoint],
        max_hit_count: u32,
    ) {
        self.colorizer.set_max_hit_count(max_hit_count);
        let mut done_color_change = !self.colorizer.color_mode().is_mega();

        let n = points.len();
        let t_step = if n <= 1 { 0.0 } else { 1.0 / (n - 1) as f32 };
        let mut t = -t_step;

        let int_intensity = self.buff_settings.int_intensity();
        let allow_overexposed = self.allow_overexposed || self.buff_settings.allow_overexposed;
        let mut low_density = std::mem::take(&mut self.low_density_points);
        low_density.clear();
        let mut max_low_density_count = 0;
        let mut num_selected = 0usize;

        for p in points.iter().step_by(self.ifs_incr.max(1) as usize) {
            t += t_step;

            if p.x >= self.width || p.y >= self.height {
                continue;
            }
            if !done_color_change && self.rng.probability_of_m_in_n(9, 10) {
                self.colorizer.change_color_maps();
                done_color_change = true;
            }

            num_selected += 1;
            let fx = p.x as f32 / self.width as f32;
            let fy = p.y as f32 / self.height as f32;
            let color = self.colorizer.mixed_color(p.color, p.count, t, fx, fy);
            current.add_pixel(p.x, p.y, color, int_intensity, allow_overexposed);
            next.add_pixel(p.x, p.y, color, int_intensity, allow_overexposed);

            if p.count <= self.low_density_count {
                low_density.push(*p);
                max_low_density_count = max_low_density_count.max(p.count);
            }
        }

        if self.blur_low_density_colors(num_selected, low_density.len()) {
            self.blurrer.do_blur(&mut low_density, [current, next]);
        } else {
            self.blurrer.set_low_density_colors(
                &low_density,
                max_low_density_count,
                self.use_random_low_density_colors,
                self.colorizer.gradients(),
                &mut self.rng,
                [current, next],
            );
        }
        self.low_density_points = low_density;
    }

    fn blur_low_density_colors(&self, num_selected: usize, num_low_density: usize) -> bool {
        if num_selected == 0 {
            return false;
        }
        num_low_density as f32 / num_selected as f32 > self.low_density_blur_threshold
    }

    pub fn save_state(&self) -> IfsState {
        IfsState::new(
            self.fractal.save_state(),
            self.colorizer.save_state(),
            EngineCounters {
                ifs_incr: self.ifs_incr,
                decay_ifs: self.decay_ifs,
                recay_ifs: self.recay_ifs,
                cycle: self.cycle,
                allow_overexposed: self.allow_overexposed,
                count_since_overexposed: self.count_since_overexposed,
                low_density_count: self.low_density_count,
                low_density_blur_threshold: self.low_density_blur_threshold,
                blur_width: self.blurrer.width().get(),
                use_random_low_density_colors: self.use_random_low_density_colors,
            },
        )
    }

    pub fn restore_state(&mut self, state: &IfsState) -> Result<(), IfsError> {
        if state.catalog_version != CATALOG_VERSION {
            return Err(IfsError::IncompatibleCatalog {
                expected: CATALOG_VERSION,
                found: state.catalog_version,
            });
        }
        let blur_width = BlurWidth::try_from(state.engine.blur_width)?;
        self.fractal.restore_state(&state.fractal)?;
        self.colorizer.restore_state(&state.colorizer);

        let e = &state.engine;
        self.ifs_incr = e.ifs_incr;
        self.decay_ifs = e.decay_ifs;
        self.recay_ifs = e.recay_ifs;
        self.cycle = e.cycle;
        self.allow_overexposed = e.allow_overexposed;
        self.count_since_overexposed = e.count_since_overexposed;
        self.low_density_count = e.low_density_count;
        self.low_density_blur_threshold = e.low_density_blur_threshold;
        self.blurrer.set_width(blur_width);
        self.use_random_low_density_colors = e.use_random_low_density_colors;
        Ok(())
    }
}

impl VisualFx for IfsEngine {
    fn name(&self) -> &'static str {
        "IFS FX"
    }

    fn set_buff_settings(&mut self, settings: FxBuffSettings) {
        self.buff_settings = settings;
    }

    fn apply_no_draw(&mut self) {
        self.update_decay_and_recay();
        self.update_decay();
    }

    fn apply(&mut self, current: &mut PixelBuffer, next: &mut PixelBuffer) {
        let sized = |b: &PixelBuffer| b.width() == self.width && b.height() == self.height;
        if !sized(current) || !sized(next) {
            if !self.size_warned {
                warn!(
                    "ifs: buffers {}x{} / {}x{} do not match engine {}x{}, skipping",
                    current.width(),
                    current.height(),
                    next.width(),
                    next.height(),
                    self.width,
                    self.height
                );
                self.size_warned = true;
            }
            return;
        }

        self.stats.update_start();

        self.update_decay_and_recay();
        if self.ifs_incr <= 0 {
            self.stats.update_end();
            return;
        }

        self.cycle += 1;
        if self.cycle >= CYCLE_LENGTH {
            self.change_cycle();
        }

        let mut points = std::mem::take(&mut self.points);
        let max_hit_count = self.fractal.draw_ifs(&mut points);
        self.update_pixel_buffers(current, next, &points, max_hit_count);
        trace!(
            "ifs frame: {} points, stride {}, max hits {}",
            points.len(),
            self.ifs_incr,
            max_hit_count
        );
        self.points = points;

        self.stats.update_end();
    }

    fn log_stats(&self, sink: &mut StatsSink<'_>) {
        self.stats.log(sink);
    }

    fn finish(&mut self) {
        self.stats.set_last_ifs_incr(self.ifs_incr);
        info!(
            "ifs finished: {} updates, {} cycle changes, max stride {}",
            self.stats.num_updates(),
            self.stats.num_cycle_changes(),
            self.stats.max_ifs_incr()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pixel::Pixel;
    use std::collections::HashSet;

    fn engine(seed: u64) -> IfsEngine {
        IfsEngine::new(80, 60, seed).unwrap()
    }

    /// Ten isolated count-1 points on row 10, ten count-100 points on row 40.
    fn sparse_and_dense() -> Vec<IfsPoint> {
        let at = |x, y, count| IfsPoint {
            x,
            y,
            count,
            color: Pixel::rgb(200, 120, 40),
        };
        let mut points: Vec<_> = (0..10).map(|k| at(5 + 7 * k, 10, 1)).collect();
        points.extend((0..10).map(|k| at(5 + 7 * k, 40, 100)));
        points
    }

    fn single_colors_engine(seed: u64, blur_threshold: f32) -> IfsEngine {
        let mut e = engine(seed);
        e.ifs_incr = 1;
        e.low_density_count = 5;
        e.low_density_blur_threshold = blur_threshold;
        e.blurrer.set_width(BlurWidth::Three);
        e.colorizer.set_forced_color_mode(Some(ColorMode::SingleColors));
        e.colorizer.change_color_mode();
        e
    }

    fn draw(e: &mut IfsEngine, points: &[IfsPoint]) -> (PixelBuffer, PixelBuffer) {
        let mut a = PixelBuffer::new(80, 60);
        let mut b = PixelBuffer::new(80, 60);
        e.update_pixel_buffers(&mut a, &mut b, points, 100);
        (a, b)
    }

    fn low_density_colors(buf: &PixelBuffer, points: &[IfsPoint]) -> Vec<Pixel> {
        points
            .iter()
            .filter(|p| p.count == 1)
            .map(|p| buf.get(p.x, p.y))
            .collect()
    }

    #[test]
    fn decay_lands_on_zero() {
        let mut e = engine(1);
        e.ifs_incr = 11;
        e.decay_ifs = 100;
        e.recay_ifs = 0;
        for _ in 0..99 {
            e.update_decay_and_recay();
            assert!(e.decay_ifs > 0);
            assert!(e.ifs_incr > 0);
        }
        e.update_decay_and_recay();
        assert_eq!(e.decay_ifs, 0);
        assert_eq!(e.ifs_incr, 0);
    }

    #[test]
    fn recay_leaves_a_trickle() {
        let mut e = engine(2);
        e.ifs_incr = 0;
        e.decay_ifs = 0;
        e.update_incr();
        assert_eq!((e.ifs_incr, e.recay_ifs), (11, 5));

        // decay goes negative, so only recay moves the stride: 11 -> 1.
        for _ in 0..5 {
            e.update_decay_and_recay();
        }
        assert_eq!(e.recay_ifs, 0);
        assert_eq!(e.ifs_incr, 1);
    }

    #[test]
    fn update_incr_ignored_while_running() {
        let mut e = engine(3);
        assert_eq!(e.ifs_incr(), 1);
        e.update_incr();
        assert_eq!((e.ifs_incr(), e.recay_ifs()), (1, 0));
    }

    #[test]
    fn apply_no_draw_arms_decay() {
        let mut e = engine(4);
        e.apply_no_draw();
        assert_eq!(e.decay_ifs(), 100);
        e.apply_no_draw();
        assert_eq!(e.decay_ifs(), 99);
        assert!(e.ifs_incr() > 1);
    }

    #[test]
    fn low_density_threshold_picks_blur_width() {
        let mut e = engine(5);
        for _ in 0..50 {
            e.update_low_density_threshold();
            let want = match e.low_density_count() {
                5..=10 => BlurWidth::Seven,
                11..=15 => BlurWidth::Five,
                _ => BlurWidth::Three,
            };
            assert!((MIN_DENSITY_COUNT..MAX_DENSITY_COUNT).contains(&e.low_density_count()));
            assert_eq!(e.blur_width(), want);
        }
    }

    #[test]
    fn overexposure_allowance_counts_down() {
        let mut e = engine(6);
        e.set_buff_settings(FxBuffSettings {
            buff_intensity: 0.5,
            allow_overexposed: false,
        });
        e.allow_overexposed = true;
        e.count_since_overexposed = 2;
        e.update_allow_overexposed();
        e.update_allow_overexposed();
        assert!(e.allow_overexposed());
        e.update_allow_overexposed();
        assert!(!e.allow_overexposed());
    }

    #[test]
    fn renew_keeps_speed_in_range() {
        let mut e = engine(7);
        for accel in [0.0, 0.5, 1.0] {
            e.set_sound_info(SoundInfo {
                acceleration: accel,
                ..SoundInfo::default()
            });
            e.renew();
            assert!((1..=1000).contains(&e.fractal().speed()));
        }
    }

    #[test]
    fn cycle_change_resets_and_counts() {
        let mut e = engine(8);
        let mut a = PixelBuffer::new(80, 60);
        let mut b = PixelBuffer::new(80, 60);
        e.cycle = CYCLE_LENGTH - 1;
        e.apply(&mut a, &mut b);
        assert_eq!(e.cycle(), 0);
        assert_eq!(e.stats().num_cycle_changes(), 1);
        let t = e.low_density_blur_threshold();
        assert!(t == LOW_BLUR_THRESHOLD || t == HIGH_BLUR_THRESHOLD);
    }

    #[test]
    fn dense_enough_low_points_are_blurred() {
        // Half the drawn points are low density: above 0.40, so blur.
        let mut e = single_colors_engine(10, LOW_BLUR_THRESHOLD);
        let points = sparse_and_dense();
        let (a, b) = draw(&mut e, &points);
        for p in points.iter().filter(|p| p.count == 1) {
            // An isolated point averaged over 3x3 black neighbours cannot stay opaque.
            assert!(a.get(p.x, p.y).a < 255, "{:?}", a.get(p.x, p.y));
            assert_eq!(a.get(p.x, p.y), b.get(p.x, p.y));
        }
    }

    #[test]
    fn sparse_low_points_get_one_smooth_color() {
        // 0.5 is below 0.99, so the flat recolor runs instead of the blur.
        let mut e = single_colors_engine(11, HIGH_BLUR_THRESHOLD);
        let points = sparse_and_dense();
        let (a, b) = draw(&mut e, &points);
        let colors = low_density_colors(&a, &points);
        assert!(colors.iter().all(|c| *c == colors[0] && c.a == 255));
        assert_eq!(colors, low_density_colors(&b, &points));
    }

    #[test]
    fn random_low_density_colors_vary_per_point() {
        let mut e = single_colors_engine(12, HIGH_BLUR_THRESHOLD);
        e.set_use_random_low_density_colors(true);
        let points = sparse_and_dense();
        let (a, _) = draw(&mut e, &points);
        let colors = low_density_colors(&a, &points);
        assert!(colors.iter().all(|c| c.a == 255));
        let distinct: HashSet<_> = colors.into_iter().collect();
        assert!(distinct.len() > 1);
    }

    fn settled_colorizer_engine(seed: u64, mode: ColorMode) -> IfsEngine {
        let mut e = single_colors_engine(seed, HIGH_BLUR_THRESHOLD);
        e.colorizer.set_forced_color_mode(Some(ColorMode::MixColors));
        e.colorizer.change_color_mode();
        e.colorizer.set_max_hit_count(10);
        for _ in 0..60 {
            e.colorizer.mixed_color(Pixel::BLACK, 1, 0.5, 0.5, 0.5);
        }
        assert_eq!(e.colorizer.cross_fade_weight(), 0.0);
        e.colorizer.set_forced_color_mode(Some(mode));
        e.colorizer.change_color_mode();
        e
    }

    #[test]
    fn mega_mode_changes_gradients_once_per_frame() {
        let mut e = settled_colorizer_engine(13, ColorMode::MegaMapColorChange);
        let before = e.colorizer.mixer_maps();
        draw(&mut e, &sparse_and_dense());

        let state = e.colorizer.save_state();
        assert_ne!(e.colorizer.mixer_maps(), before);
        // A second change would have pushed the first new pair into `prev`.
        assert_eq!((state.prev_mixer_map1, state.prev_mixer_map2), before);
    }

    #[test]
    fn plain_mode_keeps_gradients_within_a_frame() {
        let mut e = settled_colorizer_engine(14, ColorMode::MixColors);
        let before = e.colorizer.mixer_maps();
        draw(&mut e, &sparse_and_dense());
        assert_eq!(e.colorizer.mixer_maps(), before);
        assert_eq!(e.colorizer.cross_fade_weight(), 0.0);
    }

    #[test]
    fn mismatched_buffers_are_skipped() {
        let mut e = engine(9);
        let mut a = PixelBuffer::new(10, 10);
        let mut b = PixelBuffer::new(10, 10);
        e.apply(&mut a, &mut b);
        assert_eq!(a.count_non_black(), 0);
        assert_eq!(e.stats().num_updates(), 0);
    }
}
