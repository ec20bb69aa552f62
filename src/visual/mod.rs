pub mod ifs;

use crate::pixel::PixelBuffer;

pub use ifs::{ColorMode, IfsEngine};

/// Blend settings the scheduler applies uniformly to an effect's pixel writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxBuffSettings {
    pub buff_intensity: f32,
    pub allow_overexposed: bool,
}

impl Default for FxBuffSettings {
    fn default() -> Self {
        Self {
            buff_intensity: 0.5,
            allow_overexposed: true,
        }
    }
}

impl FxBuffSettings {
    pub fn int_intensity(&self) -> u32 {
        (self.buff_intensity.clamp(0.0, 1.0) * 255.0).round() as u32
    }
}

/// Receives `(module, name, value)` triples when an effect reports its stats.
pub type StatsSink<'a> = dyn FnMut(&'static str, &'static str, i64) + 'a;

pub trait VisualFx {
    fn name(&self) -> &'static str;
    fn set_buff_settings(&mut self, settings: FxBuffSettings);
    fn start(&mut self) {}
    /// Frame tick while the effect is not being drawn.
    fn apply_no_draw(&mut self);
    fn apply(&mut self, current: &mut PixelBuffer, next: &mut PixelBuffer);
    fn log_stats(&self, sink: &mut StatsSink<'_>);
    fn finish(&mut self);
}
