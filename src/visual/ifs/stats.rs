//! Counters and update timings reported through a [`StatsSink`].

use crate::visual::StatsSink;
use std::time::Instant;

const MODULE: &str = "Ifs";

#[derive(Debug, Clone)]
pub struct IfsStats {
    num_updates: u32,
    total_time_in_updates_ms: u64,
    min_time_in_updates_ms: u32,
    max_time_in_updates_ms: u32,
    update_started: Option<Instant>,
    max_ifs_incr: i32,
    last_ifs_incr: i32,
    num_cycle_changes: u32,
    num_std_ifs_func: u32,
    num_reverse_ifs_func: u32,
    num_low_low_density_blur_threshold: u32,
    num_high_low_density_blur_threshold: u32,
}

impl Default for IfsStats {
    fn default() -> Self {
        Self {
            num_updates: 0,
            total_time_in_updates_ms: 0,
            min_time_in_updates_ms: u32::MAX,
            max_time_in_updates_ms: 0,
            update_started: None,
            max_ifs_incr: -1000,
            last_ifs_incr: 0,
            num_cycle_changes: 0,
            num_std_ifs_func: 0,
            num_reverse_ifs_func: 0,
            num_low_low_density_blur_threshold: 0,
            num_high_low_density_blur_threshold: 0,
        }
    }
}

impl IfsStats {
    pub fn num_updates(&self) -> u32 {
        self.num_updates
    }

    pub fn max_ifs_incr(&self) -> i32 {
        self.max_ifs_incr
    }

    pub fn num_cycle_changes(&self) -> u32 {
        self.num_cycle_changes
    }

    pub fn update_start(&mut self) {
        self.update_started = Some(Instant::now());
        self.num_updates += 1;
    }

    pub fn update_end(&mut self) {
        let Some(started) = self.update_started.take() else {
            return;
        };
        let ms = started.elapsed().as_millis().min(u32::MAX as u128) as u32;
        self.min_time_in_updates_ms = self.min_time_in_updates_ms.min(ms);
        self.max_time_in_updates_ms = self.max_time_in_updates_ms.max(ms);
        self.total_time_in_updates_ms += ms as u64;
    }

    pub fn update_ifs_incr(&mut self, val: i32) {
        self.max_ifs_incr = self.max_ifs_incr.max(val);
    }

    pub fn set_last_ifs_incr(&mut self, val: i32) {
        self.last_ifs_incr = val;
    }

    pub fn update_cycle_changes(&mut self) {
        self.num_cycle_changes += 1;
    }

    pub fn update_std_ifs_func(&mut self) {
        self.num_std_ifs_func += 1;
    }

    pub fn update_reverse_ifs_func(&mut self) {
        self.num_reverse_ifs_func += 1;
    }

    pub fn update_low_low_density_blur_threshold(&mut self) {
        self.num_low_low_density_blur_threshold += 1;
    }

    pub fn update_high_low_density_blur_threshold(&mut self) {
        self.num_high_low_density_blur_threshold += 1;
    }

    fn av_time_in_update_ms(&self) -> i64 {
        if self.num_updates == 0 {
            return -1;
        }
        (self.total_time_in_updates_ms as f64 / self.num_updates as f64).round() as i64
    }

    pub fn log(&self, sink: &mut StatsSink<'_>) {
        sink(MODULE, "avTimeInUpdateMs", self.av_time_in_update_ms());
        sink(MODULE, "minTimeInUpdatesMs", self.min_time_in_updates_ms as i64);
        sink(MODULE, "maxTimeInUpdatesMs", self.max_time_in_updates_ms as i64);
        sink(MODULE, "maxIfsIncr", self.max_ifs_incr as i64);
        sink(MODULE, "lastIfsIncr", self.last_ifs_incr as i64);
        sink(MODULE, "numCycleChanges", self.num_cycle_changes as i64);
        sink(MODULE, "numStdIfsFunc", self.num_std_ifs_func as i64);
        sink(MODULE, "numReverseIfsFunc", self.num_reverse_ifs_func as i64);
        sink(
            MODULE,
            "numLowLowDensityBlurThreshold",
            self.num_low_low_density_blur_threshold as i64,
        );
        sink(
            MODULE,
            "numHighLowDensityBlurThreshold",
            self.num_high_low_density_blur_threshold as i64,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_report_sentinels() {
        let stats = IfsStats::default();
        let mut seen = Vec::new();
        stats.log(&mut |module, name, value| seen.push((module, name, value)));
        assert_eq!(seen.len(), 10);
        assert!(seen.iter().all(|(m, _, _)| *m == "Ifs"));
        assert_eq!(seen[0], ("Ifs", "avTimeInUpdateMs", -1));
        assert_eq!(seen[3], ("Ifs", "maxIfsIncr", -1000));
    }

    #[test]
    fn timing_and_counters_accumulate() {
        let mut stats = IfsStats::default();
        stats.update_start();
        stats.update_end();
        stats.update_ifs_incr(11);
        stats.update_ifs_incr(3);
        stats.update_cycle_changes();
        assert_eq!(stats.num_updates(), 1);
        assert_eq!(stats.max_ifs_incr(), 11);
        assert_eq!(stats.num_cycle_changes(), 1);
        assert!(stats.min_time_in_updates_ms < u32::MAX);
    }
}
