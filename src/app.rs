use crate::audio::SyntheticSound;
use crate::config::Config;
use crate::pixel::PixelBuffer;
use crate::visual::ifs::IfsState;
use crate::visual::{FxBuffSettings, IfsEngine, VisualFx};
use anyhow::Context;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const FPS: u32 = 25;
/// Frames without a goom before the effect is treated as hidden.
const QUIET_FRAMES: u32 = 3 * FPS;
/// Every Nth goom also forces a renew.
const GOOMS_PER_RENEW: u32 = 4;

pub fn run(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;

    let seed = cfg.seed.unwrap_or_else(|| fastrand::u64(..));
    info!("ifs_dancers: {}x{}, {} frames, seed {}", cfg.width, cfg.height, cfg.frames, seed);

    let mut engine = IfsEngine::new(cfg.width, cfg.height, seed).context("create ifs engine")?;
    engine.set_buff_settings(FxBuffSettings {
        buff_intensity: cfg.buff_intensity,
        allow_overexposed: cfg.allow_overexposed,
    });
    engine.set_color_mode(cfg.color_mode);
    engine.set_use_random_low_density_colors(cfg.random_low_density_colors);
    engine.init();

    if let Some(path) = &cfg.state_in {
        let state = load_state(path)?;
        engine
            .restore_state(&state)
            .with_context(|| format!("restore state from {}", path.display()))?;
        info!("restored state from {}", path.display());
    } else {
        engine.renew();
    }

    fs::create_dir_all(&cfg.out_dir)
        .with_context(|| format!("create output directory {}", cfg.out_dir.display()))?;

    let mut sound = SyntheticSound::new(seed, FPS);
    let mut current = PixelBuffer::new(cfg.width, cfg.height);
    let mut next = PixelBuffer::new(cfg.width, cfg.height);
    let mut written = 0usize;

    engine.start();
    for frame in 0..cfg.frames {
        let info = sound.next_frame();
        engine.set_sound_info(info);

        if info.is_goom_event() {
            engine.update_incr();
            if info.total_gooms % GOOMS_PER_RENEW == 0 {
                engine.renew();
            }
        }

        if info.time_since_last_goom > QUIET_FRAMES {
            engine.apply_no_draw();
        } else {
            engine.apply(&mut current, &mut next);
        }

        if (frame + 1) % cfg.every == 0 {
            let path = cfg.out_dir.join(format!("frame_{:05}.ppm", frame + 1));
            write_frame(&current, &path)?;
            written += 1;
            debug!(
                "frame {}: stride {}, {} lit pixels",
                frame + 1,
                engine.ifs_incr(),
                current.count_non_black()
            );
        }

        next.fade(cfg.fade);
        std::mem::swap(&mut current, &mut next);
    }
    engine.finish();

    if let Some(path) = &cfg.state_out {
        save_state(&engine.save_state(), path)?;
        info!("saved state to {}", path.display());
    }

    if cfg.stats {
        let mut stdout = std::io::stdout().lock();
        let mut print_err = None;
        engine.log_stats(&mut |module, name, value| {
            if let Err(err) = writeln!(stdout, "{module}.{name} = {value}") {
                print_err.get_or_insert(err);
            }
        });
        if let Some(err) = print_err {
            return Err(err).context("print stats");
        }
    }

    println!("wrote {written} frames to {}", cfg.out_dir.display());
    Ok(())
}

fn write_frame(buf: &PixelBuffer, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    buf.write_ppm(&mut out)
        .and_then(|_| out.flush())
        .with_context(|| format!("write {}", path.display()))
}

pub fn load_state(path: &Path) -> anyhow::Result<IfsState> {
    let text = fs::read_to_string(path).with_context(|| format!("read state {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse state {}", path.display()))
}

pub fn save_state(state: &IfsState, path: &Path) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(state).context("serialize state")?;
    fs::write(path, text).with_context(|| format!("write state {}", path.display()))
}
