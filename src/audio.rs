use crate::random::RandomStream;

/// Per-frame scalar features produced by the sound analyzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundInfo {
    pub volume: f32,
    pub speed: f32,
    pub acceleration: f32,
    pub goom_power: f32,
    pub time_since_last_goom: u32,
    pub total_gooms: u32,
}

impl Default for SoundInfo {
    fn default() -> Self {
        Self {
            volume: 0.0,
            speed: 0.0,
            acceleration: 0.0,
            goom_power: 0.0,
            time_since_last_goom: 0,
            total_gooms: 0,
        }
    }
}

impl SoundInfo {
    pub fn is_goom_event(&self) -> bool {
        self.time_since_last_goom == 0 && self.total_gooms > 0
    }
}

/// Deterministic stand-in for a live analyzer: layered sines with seeded jitter.
pub struct SyntheticSound {
    rng: RandomStream,
    frame: u64,
    fps: f32,
    prev_speed: f32,
    goom_limit: f32,
    current: SoundInfo,
}

impl SyntheticSound {
    pub fn new(seed: u64, fps: u32) -> Self {
        Self {
            rng: RandomStream::with_seed(seed),
            frame: 0,
            fps: fps.max(1) as f32,
            prev_speed: 0.0,
            goom_limit: 0.7,
            current: SoundInfo::default(),
        }
    }

    pub fn next_frame(&mut self) -> SoundInfo {
        let t = self.frame as f32 / self.fps;
        self.frame += 1;

        let bass = ((t * 2.0).sin() * 0.5 + 0.5).powf(1.1);
        let mid = ((t * 3.0 + 0.4).sin() * 0.5 + 0.5).powf(1.05);
        let treb = (t * 5.0 + 1.3).sin() * 0.5 + 0.5;
        let jitter = self.rng.f32_in(-0.05, 0.05);

        let volume = (0.12 + bass * 0.40 + mid * 0.30 + treb * 0.18 + jitter).clamp(0.0, 1.0);
        let speed = (0.5 * volume + 0.5 * bass).clamp(0.0, 1.0);
        let acceleration = ((speed - self.prev_speed).abs() * 8.0 + 0.25 * mid).clamp(0.0, 1.0);
        self.prev_speed = speed;

        let mut info = self.current;
        info.volume = volume;
        info.speed = speed;
        info.acceleration = acceleration;

        if volume > self.goom_limit {
            info.time_since_last_goom = 0;
            info.total_gooms += 1;
            info.goom_power = (volume - self.goom_limit) / (1.0 - self.goom_limit).max(1e-3);
            self.goom_limit = (self.goom_limit + 0.02).min(0.95);
        } else {
            info.time_since_last_goom = info.time_since_last_goom.saturating_add(1);
            info.goom_power = 0.0;
            self.goom_limit = (self.goom_limit - 0.001).max(0.5);
        }

        self.current = info;
        info
    }
}
