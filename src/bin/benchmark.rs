use std::time::{Duration, Instant};

use anyhow::Result;
use ifs_dancers::audio::SyntheticSound;
use ifs_dancers::pixel::PixelBuffer;
use ifs_dancers::visual::{ColorMode, FxBuffSettings, IfsEngine, VisualFx};

struct Args {
    frames: usize,
    w: u32,
    h: u32,
    seed: u64,
    max_ms: f64,
    per_mode: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 300,
        w: 640,
        h: 400,
        seed: 1,
        max_ms: 20.0,
        per_mode: false,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<u32>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<u32>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--seed", Some(x)) => {
                if let Ok(n) = x.parse::<u64>() {
                    args.seed = n;
                }
                i += 2;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            ("--per-mode", _) => {
                args.per_mode = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    args
}

struct Run {
    total: Duration,
    worst: Duration,
    lit: usize,
}

fn run_frames(args: &Args, mode: Option<ColorMode>) -> Result<Run> {
    let mut engine = IfsEngine::new(args.w, args.h, args.seed)?;
    engine.set_buff_settings(FxBuffSettings::default());
    engine.set_color_mode(mode);
    engine.init();
    engine.renew();

    let mut sound = SyntheticSound::new(args.seed, 60);
    let mut current = PixelBuffer::new(args.w, args.h);
    let mut next = PixelBuffer::new(args.w, args.h);
    let mut run = Run {
        total: Duration::ZERO,
        worst: Duration::ZERO,
        lit: 0,
    };

    for _ in 0..args.frames {
        let info = sound.next_frame();
        engine.set_sound_info(info);
        if info.is_goom_event() {
            engine.update_incr();
        }

        let start = Instant::now();
        engine.apply(&mut current, &mut next);
        let elapsed = start.elapsed();

        run.total += elapsed;
        run.worst = run.worst.max(elapsed);
        if current.count_non_black() > 0 {
            run.lit += 1;
        }
        next.fade(0.8);
        std::mem::swap(&mut current, &mut next);
    }
    engine.finish();

    Ok(run)
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn main() -> Result<()> {
    let args = parse_args();

    println!(
        "IFS benchmark: frames={} size={}x{} seed={}",
        args.frames, args.w, args.h, args.seed
    );

    let run = run_frames(&args, None)?;
    let avg_ms = ms(run.total) / args.frames as f64;
    let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
    println!(
        "summary: {:>8.3} ms/frame avg  {:>8.3} ms worst  {:>7.2} FPS  lit={}/{}",
        avg_ms,
        ms(run.worst),
        fps,
        run.lit,
        args.frames
    );

    if args.per_mode {
        for mode in ColorMode::all() {
            let r = run_frames(&args, Some(mode))?;
            println!(
                "  {:<22} {:>8.3} ms/frame  {:>8.3} ms worst",
                mode.name(),
                ms(r.total) / args.frames as f64,
                ms(r.worst)
            );
        }
    }

    if avg_ms > args.max_ms {
        anyhow::bail!("average frame time {:.3} ms exceeds {:.3} ms", avg_ms, args.max_ms);
    }
    Ok(())
}
