//! Seedable random draws shared by the fractal, the colorizer and the engine.

/// Thin wrapper over [`fastrand::Rng`] exposing the range draws the effect uses.
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: fastrand::Rng,
}

impl RandomStream {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Split off an independent stream; deterministic for a seeded parent.
    pub fn fork(&mut self) -> Self {
        Self {
            rng: self.rng.fork(),
        }
    }

    /// Uniform integer in `n0 <= n < n1`. An empty range yields `n0`.
    pub fn u32_in(&mut self, n0: u32, n1: u32) -> u32 {
        if n1 <= n0 {
            return n0;
        }
        self.rng.u32(n0..n1)
    }

    pub fn usize_below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.usize(..n)
    }

    /// Uniform float in `[x0, x1]`.
    pub fn f32_in(&mut self, x0: f32, x1: f32) -> f32 {
        x0 + self.rng.f32() * (x1 - x0)
    }

    pub fn probability_of_m_in_n(&mut self, m: u32, n: u32) -> bool {
        if n == 0 {
            return false;
        }
        if m == 1 {
            return self.u32_in(0, n) == 0;
        }
        if m + 1 == n {
            return self.u32_in(0, n) > 0;
        }
        self.f32_in(0.0, 1.0) <= m as f32 / n as f32
    }

    pub fn sign(&mut self) -> f32 {
        if self.rng.bool() { 1.0 } else { -1.0 }
    }
}

/// Weighted choice over a small fixed set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights<E> {
    weights: Vec<(E, u32)>,
    sum: u32,
}

impl<E: Copy + PartialEq> Weights<E> {
    pub fn new(weights: &[(E, u32)]) -> Self {
        let weights = weights.to_vec();
        let sum = weights.iter().map(|(_, w)| *w).sum();
        Self { weights, sum }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn sum(&self) -> u32 {
        self.sum
    }

    pub fn weight(&self, e: E) -> u32 {
        self.weights
            .iter()
            .find(|(k, _)| *k == e)
            .map(|(_, w)| *w)
            .unwrap_or(0)
    }

    pub fn set_weight(&mut self, e: E, value: u32) {
        match self.weights.iter_mut().find(|(k, _)| *k == e) {
            Some(entry) => entry.1 = value,
            None => self.weights.push((e, value)),
        }
        self.sum = self.weights.iter().map(|(_, w)| *w).sum();
    }

    /// Draw a value with probability `weight / sum`.
    ///
    /// Panics when the table is empty or every weight is zero.
    pub fn random_weighted(&self, rng: &mut RandomStream) -> E {
        assert!(self.sum > 0, "weighted draw over an empty table");
        let mut r = rng.u32_in(0, self.sum);
        for (e, w) in &self.weights {
            if r < *w {
                return *e;
            }
            r -= w;
        }
        self.weights[self.weights.len() - 1].0
    }
}
