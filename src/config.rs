use crate::visual::ColorMode;
use anyhow::bail;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ifs_dancers",
    version,
    about = "Audio-reactive IFS fractal renderer (synthetic sound, PPM frames)"
)]
pub struct Config {
    #[arg(long, default_value_t = 320)]
    pub width: u32,

    #[arg(long, default_value_t = 200)]
    pub height: u32,

    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    /// Engine and sound seed; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Force one color mode instead of drawing one on every renew.
    #[arg(long, value_enum)]
    pub color_mode: Option<ColorMode>,

    #[arg(long, default_value_t = 0.5)]
    pub buff_intensity: f32,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub allow_overexposed: bool,

    /// Per-frame brightness kept from the previous frame.
    #[arg(long, default_value_t = 0.85)]
    pub fade: f32,

    #[arg(long, default_value = "frames")]
    pub out_dir: PathBuf,

    /// Write a PPM snapshot every N frames.
    #[arg(long, default_value_t = 50)]
    pub every: u32,

    #[arg(long, default_value_t = false)]
    pub random_low_density_colors: bool,

    /// Restore engine state from this JSON file before rendering.
    #[arg(long)]
    pub state_in: Option<PathBuf>,

    /// Save engine state to this JSON file after rendering.
    #[arg(long)]
    pub state_out: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub stats: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("--width and --height must be >= 1");
        }
        if self.frames == 0 {
            bail!("--frames must be >= 1");
        }
        if self.every == 0 {
            bail!("--every must be >= 1");
        }
        if !(0.0..=1.0).contains(&self.buff_intensity) {
            bail!("--buff-intensity must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.fade) {
            bail!("--fade must be in [0, 1]");
        }
        Ok(())
    }
}
