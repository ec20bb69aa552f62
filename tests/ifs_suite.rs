use ifs_dancers::audio::SyntheticSound;
use ifs_dancers::error::IfsError;
use ifs_dancers::gradient::WeightedGradients;
use ifs_dancers::pixel::PixelBuffer;
use ifs_dancers::random::RandomStream;
use ifs_dancers::visual::ifs::{ColorMode, Fractal, IfsEngine, IfsState, Similitude};
use ifs_dancers::visual::{FxBuffSettings, VisualFx};

fn fractal(w: u32, h: u32, n: usize, seed: u64) -> Fractal {
    let mut f = Fractal::new(w, h, WeightedGradients::uniform(), RandomStream::with_seed(seed))
        .expect("fractal should build");
    f.init_with_num_similitudes(n).expect("valid similitude count");
    f
}

fn run_frames(engine: &mut IfsEngine, frames: usize) -> PixelBuffer {
    let mut current = PixelBuffer::new(engine.width(), engine.height());
    let mut next = PixelBuffer::new(engine.width(), engine.height());
    for _ in 0..frames {
        engine.apply(&mut current, &mut next);
    }
    current
}

fn max_jump(a: &[Similitude], b: &[Similitude], f: fn(&Similitude) -> f32) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (f(x) - f(y)).abs())
        .fold(0.0, f32::max)
}

// ── Fractal ─────────────────────────────────────────────────────────────────

#[test]
fn traced_points_stay_inside_the_grid() {
    for n in 2..=5 {
        let mut f = fractal(120, 90, n, 10 + n as u64);
        let mut points = Vec::new();
        for _ in 0..40 {
            let max = f.draw_ifs(&mut points);
            for p in &points {
                assert!(p.x < 120 && p.y < 90, "({}, {}) out of range", p.x, p.y);
                assert!(p.count >= 1 && p.count <= max);
            }
        }
    }
}

#[test]
fn one_generation_shift_in_166_calls_at_speed_6() {
    let mut f = fractal(100, 100, 3, 6);
    f.set_speed(6);
    assert_eq!(f.max_count(), 166);

    let gen0 = f.generation(0).to_vec();
    let gen2 = f.generation(2).to_vec();
    let gen3 = f.generation(3).to_vec();
    let mut points = Vec::new();

    for call in 1..=166 {
        f.draw_ifs(&mut points);
        assert!(!points.is_empty(), "call {call} produced no points");
        if call < 166 {
            assert_eq!(f.generation_shifts(), 0);
            assert_eq!(f.count(), call);
        }
    }

    assert_eq!(f.generation_shifts(), 1);
    assert_eq!(f.count(), 0);
    assert_eq!(f.generation(0), &gen3[..]);
    assert_ne!(f.generation(0), &gen0[..]);
    for ((s1, s2), s3) in f.generation(1).iter().zip(&gen2).zip(&gen3) {
        assert_eq!(s1.cx, 2.0 * s3.cx - s2.cx);
        assert_eq!(s1.r1, 2.0 * s3.r1 - s2.r1);
        assert_eq!(s1.a2, 2.0 * s3.a2 - s2.a2);
    }
}

#[test]
fn blend_is_continuous_across_a_shift() {
    let mut f = fractal(100, 100, 3, 21);
    f.set_speed(6);
    let gen3 = f.generation(3).to_vec();
    let mut points = Vec::new();
    for _ in 0..166 {
        f.draw_ifs(&mut points);
    }
    let before = f.current().to_vec();

    f.draw_ifs(&mut points);
    let after = f.current().to_vec();

    // Right after the shift the blend sits exactly on the old last generation.
    assert!(max_jump(&after, &gen3, |s| s.cx) < 1e-6);
    assert!(max_jump(&after, &gen3, |s| s.a1) < 1e-6);

    assert!(max_jump(&before, &after, |s| s.cx) < 0.1);
    assert!(max_jump(&before, &after, |s| s.cy) < 0.1);
    assert!(max_jump(&before, &after, |s| s.r1) < 0.1);
    assert!(max_jump(&before, &after, |s| s.r2) < 0.1);
    assert!(max_jump(&before, &after, |s| s.a1) < 0.5);
}

#[test]
fn hit_grids_ping_pong() {
    let mut f = fractal(64, 64, 2, 33);
    let mut points = Vec::new();
    let max = f.draw_ifs(&mut points);
    assert_eq!(f.previous_hits().points(), points);
    assert_eq!(f.previous_hits().max_hit_count(), max);
}

#[test]
fn invalid_similitude_count_is_an_error() {
    let mut f = fractal(32, 32, 2, 1);
    assert_eq!(
        f.init_with_num_similitudes(7),
        Err(IfsError::InvalidSimilitudeCount(7))
    );
    assert_eq!(f.num_similitudes(), 2);
}

#[test]
fn speed_jump_mid_blend_keeps_position() {
    let mut f = fractal(320, 200, 2, 44);
    f.set_speed(1);
    let mut points = Vec::new();
    for _ in 0..900 {
        f.draw_ifs(&mut points);
    }
    f.set_speed(51);
    assert_eq!(f.count(), 900 / 51);
    let max = f.draw_ifs(&mut points);
    assert!(max >= 1);
}

// ── Engine ──────────────────────────────────────────────────────────────────

#[test]
fn engine_renders_lit_pixels() {
    let mut e = IfsEngine::new(100, 100, 42).expect("engine");
    e.set_buff_settings(FxBuffSettings::default());
    e.init();
    e.renew();
    let out = run_frames(&mut e, 5);
    assert!(out.count_non_black() > 0);
    assert_eq!(e.name(), "IFS FX");
}

#[test]
fn every_color_mode_renders() {
    for mode in ColorMode::all() {
        let mut e = IfsEngine::new(80, 60, 5).expect("engine");
        e.set_color_mode(Some(mode));
        e.renew();
        assert_eq!(e.color_mode(), mode);
        run_frames(&mut e, 3);
        assert_eq!(e.stats().num_updates(), 3);
    }
}

#[test]
fn fades_out_then_back_in() {
    let mut e = IfsEngine::new(64, 48, 9).expect("engine");
    for _ in 0..101 {
        e.apply_no_draw();
    }
    assert_eq!(e.ifs_incr(), 0);

    let out = run_frames(&mut e, 2);
    assert_eq!(out.count_non_black(), 0);

    e.update_incr();
    assert_eq!((e.ifs_incr(), e.recay_ifs()), (11, 5));
    run_frames(&mut e, 1);
    assert_eq!((e.ifs_incr(), e.recay_ifs()), (9, 4));
}

#[test]
fn long_driver_loop_keeps_blend_in_range() {
    for seed in 1..=6 {
        let mut e = IfsEngine::new(320, 200, seed).expect("engine");
        e.init();
        e.renew();
        let mut sound = SyntheticSound::new(seed, 25);
        let mut current = PixelBuffer::new(320, 200);
        let mut next = PixelBuffer::new(320, 200);

        for frame in 0..3000 {
            let info = sound.next_frame();
            e.set_sound_info(info);
            if info.is_goom_event() {
                e.update_incr();
                if info.total_gooms % 4 == 0 {
                    e.renew();
                }
            }
            if info.time_since_last_goom > 75 {
                e.apply_no_draw();
            } else {
                e.apply(&mut current, &mut next);
            }
            let f = e.fractal();
            assert!(
                f.count() <= f.max_count(),
                "seed {seed} frame {frame}: count {} speed {}",
                f.count(),
                f.speed()
            );
            next.fade(0.85);
            std::mem::swap(&mut current, &mut next);
        }
    }
}

#[test]
fn zero_sized_engine_is_rejected() {
    assert!(matches!(
        IfsEngine::new(0, 100, 1),
        Err(IfsError::InvalidDimensions { width: 0, height: 100 })
    ));
}

#[test]
fn stats_report_through_sink() {
    let mut e = IfsEngine::new(48, 48, 2).expect("engine");
    run_frames(&mut e, 4);
    e.finish();

    let mut rows = Vec::new();
    e.log_stats(&mut |module, name, value| rows.push((module, name, value)));
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|(m, _, _)| *m == "Ifs"));
    assert!(rows.contains(&("Ifs", "lastIfsIncr", e.ifs_incr() as i64)));
}

// ── State ───────────────────────────────────────────────────────────────────

#[test]
fn state_round_trips_through_json() {
    let mut a = IfsEngine::new(90, 70, 12).expect("engine");
    a.set_color_mode(Some(ColorMode::SineMapColors));
    a.renew();
    run_frames(&mut a, 20);
    let state = a.save_state();

    let json = serde_json::to_string(&state).expect("serialize");
    let parsed: IfsState = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, state);

    let mut b = IfsEngine::new(90, 70, 999).expect("engine");
    b.restore_state(&parsed).expect("restore");
    assert_eq!(b.save_state(), state);
    assert_eq!(b.color_mode(), ColorMode::SineMapColors);
}

#[test]
fn restore_rejects_other_catalog_version() {
    let a = IfsEngine::new(40, 40, 1).expect("engine");
    let mut state = a.save_state();
    state.catalog_version += 1;
    let mut b = IfsEngine::new(40, 40, 2).expect("engine");
    assert!(matches!(
        b.restore_state(&state),
        Err(IfsError::IncompatibleCatalog { .. })
    ));
}

#[test]
fn restore_rejects_other_geometry() {
    let a = IfsEngine::new(40, 40, 1).expect("engine");
    let mut b = IfsEngine::new(41, 40, 1).expect("engine");
    assert!(matches!(
        b.restore_state(&a.save_state()),
        Err(IfsError::StateMismatch { .. })
    ));
}

#[test]
fn restore_rejects_bad_blur_width() {
    let a = IfsEngine::new(40, 40, 1).expect("engine");
    let mut state = a.save_state();
    state.engine.blur_width = 4;
    let mut b = IfsEngine::new(40, 40, 1).expect("engine");
    assert_eq!(b.restore_state(&state), Err(IfsError::InvalidBlurWidth(4)));
}
