//! Bounded, derivative-free global minimisation (differential evolution).
//!
//! ## Parameter Encoding
//!
//! The searched parameter is normalized to [0, 1] and decoded through a
//! [`ParamRange`]. Alpha spans several orders of magnitude, so it is searched
//! in log space: a uniform step in [0, 1] is a constant multiplicative step in
//! alpha.
//!
//! ## Algorithm
//!
//! `best/1/bin` with dithered mutation:
//!
//! ```text
//! init:    Latin Hypercube over [0, 1], one stratum per member
//! trial:   u_best + F · (u_r1 − u_r2),  F ~ U[mutation.0, mutation.1) per generation
//! repair:  out-of-bounds trials are resampled uniformly
//! select:  trial replaces member when f(trial) <= f(member)
//! stop:    std(energies) <= tolerance · |mean(energies)|, or max generations
//! ```
//!
//! With a single dimension binomial crossover always keeps the mutant, so no
//! recombination rate is needed. The objective is piecewise constant in alpha
//! (it only changes when two items swap places), which is why a population
//! method is used instead of a gradient or polish step.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Range specification for a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    /// If true, sample in log space (good for scale parameters)
    pub log_scale: bool,
}

impl ParamRange {
    pub fn linear(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            log_scale: false,
        }
    }

    pub fn log(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            log_scale: true,
        }
    }

    /// Convert normalized [0, 1] value to actual parameter value.
    pub fn decode(&self, normalized: f64) -> f64 {
        let t = normalized.clamp(0.0, 1.0);
        if self.log_scale {
            let log_min = self.min.ln();
            let log_max = self.max.ln();
            (log_min + t * (log_max - log_min)).exp().clamp(self.min, self.max)
        } else {
            self.min + t * (self.max - self.min)
        }
    }

    /// Convert actual value to normalized [0, 1].
    pub fn encode(&self, value: f64) -> f64 {
        if self.log_scale {
            let log_min = self.min.ln();
            let log_max = self.max.ln();
            let log_val = value.clamp(self.min, self.max).ln();
            (log_val - log_min) / (log_max - log_min)
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Differential evolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SearchSettings {
    /// Largest alpha considered. No realistic product has more players.
    pub upper_bound: f64,
    /// Population size (at least 5 members are used).
    pub population: usize,
    pub max_generations: usize,
    /// Relative convergence tolerance on the spread of population energies.
    pub tolerance: f64,
    /// Dither range for the mutation constant F.
    pub mutation: (f64, f64),
    pub seed: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            upper_bound: 1e8,
            population: 15,
            max_generations: 1000,
            tolerance: 0.01,
            mutation: (0.5, 1.0),
            seed: 0,
        }
    }
}

/// Outcome of one minimisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best parameter value (decoded).
    pub x: f64,
    /// Objective at `x`.
    pub fun: f64,
    pub evaluations: usize,
    pub generations: usize,
    pub converged: bool,
}

/// Minimise `objective` over `range`.
pub fn minimize_scalar<F>(range: &ParamRange, settings: &SearchSettings, mut objective: F) -> EvolutionResult
where
    F: FnMut(f64) -> f64,
{
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let size = settings.population.max(5);
    let (f_lo, f_hi) = settings.mutation;

    let mut population = latin_hypercube(size, &mut rng);
    let mut energies: Vec<f64> = population.iter().map(|&u| objective(range.decode(u))).collect();
    let mut evaluations = size;
    let mut best = argmin(&energies);

    let mut generations = 0;
    let mut converged = has_converged(&energies, settings.tolerance);

    while !converged && generations < settings.max_generations {
        generations += 1;
        let scale = if f_hi > f_lo { rng.gen_range(f_lo..f_hi) } else { f_lo };

        for i in 0..size {
            let (r1, r2) = pick_two(size, i, &mut rng);
            let mut trial = population[best] + scale * (population[r1] - population[r2]);
            if !(0.0..=1.0).contains(&trial) {
                trial = rng.gen::<f64>();
            }

            let energy = objective(range.decode(trial));
            evaluations += 1;

            if energy <= energies[i] {
                population[i] = trial;
                energies[i] = energy;
                if energy < energies[best] {
                    best = i;
                }
            }
        }

        converged = has_converged(&energies, settings.tolerance);
    }

    EvolutionResult {
        x: range.decode(population[best]),
        fun: energies[best],
        evaluations,
        generations,
        converged,
    }
}

/// One sample per stratum of [0, 1], in random order.
fn latin_hypercube<R: Rng>(n_samples: usize, rng: &mut R) -> Vec<f64> {
    let mut strata: Vec<usize> = (0..n_samples).collect();
    strata.shuffle(rng);
    strata
        .into_iter()
        .map(|stratum| {
            let lower = stratum as f64 / n_samples as f64;
            let upper = (stratum + 1) as f64 / n_samples as f64;
            lower + rng.gen::<f64>() * (upper - lower)
        })
        .collect()
}

/// Two distinct indices, both different from `exclude`.
fn pick_two<R: Rng>(size: usize, exclude: usize, rng: &mut R) -> (usize, usize) {
    let candidates: Vec<usize> = (0..size).filter(|&j| j != exclude).collect();
    let mut chosen = candidates.choose_multiple(rng, 2);
    let a = chosen.next().copied().unwrap_or(exclude);
    let b = chosen.next().copied().unwrap_or(exclude);
    (a, b)
}

fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn has_converged(energies: &[f64], tolerance: f64) -> bool {
    let n = energies.len() as f64;
    let mean = energies.iter().sum::<f64>() / n;
    let variance = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() <= tolerance * mean.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_range_log() {
        let range = ParamRange::log(1.0, 100.0);
        assert!((range.decode(0.0) - 1.0).abs() < 1e-9);
        assert!((range.decode(1.0) - 100.0).abs() < 1e-9);
        // Mid-point in log space: sqrt(1*100) = 10
        assert!((range.decode(0.5) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_param_range_roundtrip() {
        let range = ParamRange::log(2.0, 1e8);
        for v in [2.0, 10.0, 2.5e4, 1e8] {
            let decoded = range.decode(range.encode(v));
            assert!((decoded - v).abs() / v < 1e-9, "Roundtrip failed for {}", v);
        }
    }

    #[test]
    fn test_lhs_one_sample_per_stratum() {
        let mut rng = StdRng::seed_from_u64(42);
        let samples = latin_hypercube(10, &mut rng);
        let mut strata: Vec<usize> = samples.iter().map(|s| (s * 10.0).floor() as usize).collect();
        strata.sort_unstable();
        assert_eq!(strata, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_pick_two_is_distinct() {
        let mut rng = StdRng::seed_from_u64(1);
        for i in 0..20 {
            let (a, b) = pick_two(5, i % 5, &mut rng);
            assert_ne!(a, b);
            assert_ne!(a, i % 5);
            assert_ne!(b, i % 5);
        }
    }

    #[test]
    fn test_finds_smooth_minimum_in_log_space() {
        // Minimum at x = 1e4
        let range = ParamRange::log(1.0, 1e8);
        let result = minimize_scalar(&range, &SearchSettings::default(), |x| (x.log10() - 4.0).powi(2) + 1.0);
        assert!((result.x.log10() - 4.0).abs() < 0.1, "got {}", result.x);
        assert!(result.fun < 1.01);
        assert!(result.evaluations >= 15);
    }

    #[test]
    fn test_step_objective() {
        // Plateau objective like a rank: best plateau for x > 5e5
        let range = ParamRange::log(10.0, 1e8);
        let settings = SearchSettings {
            seed: 17,
            ..Default::default()
        };
        let result = minimize_scalar(&range, &settings, |x| if x > 5e5 { 1.0 } else { 3.0 });
        assert_eq!(result.fun, 1.0);
        assert!(result.x > 5e5);
        assert!(range.contains(result.x));
    }

    #[test]
    fn test_seed_makes_search_reproducible() {
        let range = ParamRange::log(1.0, 1e6);
        let f = |x: f64| (x.ln() - 7.0).abs();
        let a = minimize_scalar(&range, &SearchSettings::default(), f);
        let b = minimize_scalar(&range, &SearchSettings::default(), f);
        assert_eq!(a, b);
    }
}
