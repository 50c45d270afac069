use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::models::{check_numbers, number_mask, MAX_PLAYED, MIN_PLAYED, PICK_COUNT, POOL_SIZE};
use crate::payout::payout;

/// Jugada validée : 6 à 15 numéros distincts dans 1..=50.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    numbers: Vec<u8>,
    mask: u64,
}

impl Selection {
    pub fn new(numbers: &[u8]) -> Result<Self> {
        if !(MIN_PLAYED..=MAX_PLAYED).contains(&numbers.len()) {
            return Err(AnalyticsError::InvalidSelection(format!(
                "{} numéros choisis (attendu {}-{})",
                numbers.len(),
                MIN_PLAYED,
                MAX_PLAYED
            )));
        }
        check_numbers(numbers).map_err(AnalyticsError::InvalidSelection)?;

        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();
        Ok(Self {
            mask: number_mask(&sorted),
            numbers: sorted,
        })
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub simulations: u64,
    pub n_played: usize,
    pub seed: u64,
    /// Index k = nombre d'aciertos (0..=6).
    pub histogram: [u64; PICK_COUNT + 1],
    pub total_revenue: u64,
    pub total_cost: u64,
    pub roi_percent: f64,
}

impl SimulationResult {
    pub fn frequency(&self, k_matches: usize) -> u64 {
        self.histogram.get(k_matches).copied().unwrap_or(0)
    }

    pub fn profit(&self) -> i128 {
        self.total_revenue as i128 - self.total_cost as i128
    }
}

/// Contrôle d'une simulation longue : annulation vérifiée entre les lots et
/// notification du nombre de tirages simulés par lot.
#[derive(Default, Clone, Copy)]
pub struct RunControl<'a> {
    pub cancel: Option<&'a AtomicBool>,
    pub progress: Option<&'a (dyn Fn(u64) + Sync)>,
}

pub struct Simulator {
    config: AnalyticsConfig,
}

impl Simulator {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// `seed = None` : graine tirée du générateur du système.
    pub fn run(&self, selection: &Selection, simulations: u64, seed: Option<u64>) -> Result<SimulationResult> {
        self.run_with(selection, simulations, seed, RunControl::default())
    }

    pub fn run_with(
        &self,
        selection: &Selection,
        simulations: u64,
        seed: Option<u64>,
        control: RunControl<'_>,
    ) -> Result<SimulationResult> {
        let n_played = selection.len();
        let cost_per_play = self.config.cost_for(n_played)?;
        let total_cost = simulations.checked_mul(cost_per_play).ok_or_else(|| {
            AnalyticsError::InvalidSelection(format!(
                "{} sorteos à S/ {} dépassent la capacité du calcul de coût",
                simulations, cost_per_play
            ))
        })?;
        let seed = seed.unwrap_or_else(rand::random);
        let batch_size = self.config.batch_size;
        let n_batches = simulations.div_ceil(batch_size);

        log::info!(
            "Simulation : {} tirages, {} numéros joués, {} lots (seed={})",
            simulations,
            n_played,
            n_batches,
            seed
        );

        let histogram = (0..n_batches)
            .into_par_iter()
            .map(|batch| {
                if control.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                    return Err(AnalyticsError::Cancelled);
                }
                let start = batch * batch_size;
                let len = batch_size.min(simulations - start);
                let hist = simulate_batch(selection.mask, len, batch_seed(seed, batch));
                if let Some(progress) = control.progress {
                    progress(len);
                }
                Ok(hist)
            })
            .try_reduce(
                || [0u64; PICK_COUNT + 1],
                |mut acc, hist| {
                    for (a, h) in acc.iter_mut().zip(hist) {
                        *a += h;
                    }
                    Ok(acc)
                },
            )?;

        // Un seul calcul de gain par nombre d'aciertos, pas par tirage.
        let mut total_revenue = 0u64;
        for (k, &frequency) in histogram.iter().enumerate().skip(3) {
            if frequency > 0 {
                let prize = payout(n_played, k, &self.config.prizes)?.total;
                total_revenue = frequency
                    .checked_mul(prize)
                    .and_then(|gain| total_revenue.checked_add(gain))
                    .ok_or_else(|| {
                        AnalyticsError::UndefinedConfiguration(
                            "gains cumulés hors de la plage u64".into(),
                        )
                    })?;
            }
        }

        let roi_percent = if total_cost == 0 {
            0.0
        } else {
            (total_revenue as f64 - total_cost as f64) / total_cost as f64 * 100.0
        };

        log::debug!(
            "Histogramme {:?}, gains={}, coût={}, ROI={:.2}%",
            histogram,
            total_revenue,
            total_cost,
            roi_percent
        );

        Ok(SimulationResult {
            simulations,
            n_played,
            seed,
            histogram,
            total_revenue,
            total_cost,
            roi_percent,
        })
    }
}

/// Point d'entrée simple : valide la sélection puis lance la simulation.
pub fn run_simulation(
    selected: &[u8],
    simulations: u64,
    config: &AnalyticsConfig,
    seed: Option<u64>,
) -> Result<SimulationResult> {
    let selection = Selection::new(selected)?;
    Simulator::new(config.clone())?.run(&selection, simulations, seed)
}

/// Graine propre à chaque lot : résultat indépendant du nombre de threads.
fn batch_seed(seed: u64, batch: u64) -> u64 {
    seed ^ batch.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn simulate_batch(selection_mask: u64, len: u64, seed: u64) -> [u64; PICK_COUNT + 1] {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hist = [0u64; PICK_COUNT + 1];
    for _ in 0..len {
        let drawn = draw_mask(&mut rng);
        hist[(drawn & selection_mask).count_ones() as usize] += 1;
    }
    hist
}

/// Tirage uniforme de 6 bolillas distinctes, bit `n` pour la bolilla `n`.
fn draw_mask<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    index::sample(rng, POOL_SIZE as usize, PICK_COUNT)
        .iter()
        .fold(0u64, |mask, i| mask | (1u64 << (i + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicU64;

    use crate::payout::hypergeometric;

    fn simulator() -> Simulator {
        Simulator::new(AnalyticsConfig::default()).unwrap()
    }

    #[test]
    fn test_selection_rejects_bad_sizes() {
        assert!(matches!(
            Selection::new(&[1, 2, 3, 4, 5]),
            Err(AnalyticsError::InvalidSelection(_))
        ));
        let sixteen: Vec<u8> = (1..=16).collect();
        assert!(matches!(
            Selection::new(&sixteen),
            Err(AnalyticsError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_selection_rejects_range_and_duplicates() {
        assert!(Selection::new(&[0, 2, 3, 4, 5, 6]).is_err());
        assert!(Selection::new(&[1, 2, 3, 4, 5, 51]).is_err());
        assert!(Selection::new(&[1, 2, 3, 4, 5, 5]).is_err());
    }

    #[test]
    fn test_selection_sorted() {
        let sel = Selection::new(&[13, 12, 26, 31, 28, 7]).unwrap();
        assert_eq!(sel.numbers(), &[7, 12, 13, 26, 28, 31]);
        assert_eq!(sel.len(), 6);
    }

    #[test]
    fn test_run_simulation_rejects_before_running() {
        let config = AnalyticsConfig::default();
        let err = run_simulation(&[1, 2, 3], 1_000, &config, Some(1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidSelection(_)));
    }

    #[test]
    fn test_draw_mask_has_six_distinct_numbers() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let mask = draw_mask(&mut rng);
            assert_eq!(mask.count_ones(), 6);
            assert_eq!(mask & 1, 0);
            assert_eq!(mask >> 51, 0);
        }
    }

    #[test]
    fn test_total_cost_is_exact() {
        let sel = Selection::new(&[1, 2, 3, 4, 5, 6]).unwrap();
        let result = simulator().run(&sel, 10_000, Some(42)).unwrap();
        assert_eq!(result.total_cost, 10_000 * 5);
        assert_eq!(result.histogram.iter().sum::<u64>(), 10_000);
    }

    #[test]
    fn test_system_bet_cost() {
        let sel = Selection::new(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let result = simulator().run(&sel, 1_000, Some(1)).unwrap();
        assert_eq!(result.total_cost, 1_000 * 28 * 5);
    }

    #[test]
    fn test_revenue_matches_histogram() {
        let config = AnalyticsConfig::default();
        let sel = Selection::new(&[3, 9, 14, 22, 27, 33, 38, 41, 45, 50]).unwrap();
        let result = simulator().run(&sel, 50_000, Some(3)).unwrap();
        let expected: u64 = (3..=6)
            .map(|k| result.histogram[k] * payout(10, k, &config.prizes).unwrap().total)
            .sum();
        assert_eq!(result.total_revenue, expected);
        let roi = (result.total_revenue as f64 - result.total_cost as f64) / result.total_cost as f64 * 100.0;
        assert!((result.roi_percent - roi).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let sel = Selection::new(&[13, 12, 26, 31, 28, 7]).unwrap();
        let a = simulator().run(&sel, 20_000, Some(2024)).unwrap();
        let b = simulator().run(&sel, 20_000, Some(2024)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_converges_to_hypergeometric() {
        let sel = Selection::new(&[1, 5, 9, 13, 17, 21, 25, 29, 33, 37]).unwrap();
        let simulations = 200_000;
        let result = simulator().run(&sel, simulations, Some(99)).unwrap();
        let theory = hypergeometric(10);
        for k in 0..=PICK_COUNT {
            let empirical = result.frequency(k) as f64 / simulations as f64;
            assert!(
                (empirical - theory[k]).abs() < 0.01,
                "k={} : empirique {:.4}, théorique {:.4}",
                k,
                empirical,
                theory[k]
            );
        }
    }

    #[test]
    fn test_missing_cost_fails_before_running() {
        let mut config = AnalyticsConfig::default();
        config.costs = BTreeMap::from([(6, 5)]);
        let err = run_simulation(&[1, 2, 3, 4, 5, 6, 7], 100, &config, Some(1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::UndefinedConfiguration(_)));
    }

    #[test]
    fn test_cancelled_run() {
        let sel = Selection::new(&[1, 2, 3, 4, 5, 6]).unwrap();
        let cancel = AtomicBool::new(true);
        let control = RunControl {
            cancel: Some(&cancel),
            progress: None,
        };
        let err = simulator().run_with(&sel, 100_000, Some(1), control).unwrap_err();
        assert!(matches!(err, AnalyticsError::Cancelled));
    }

    #[test]
    fn test_progress_reports_every_trial() {
        let sel = Selection::new(&[1, 2, 3, 4, 5, 6]).unwrap();
        let done = AtomicU64::new(0);
        let progress = |n: u64| {
            done.fetch_add(n, Ordering::Relaxed);
        };
        let control = RunControl {
            cancel: None,
            progress: Some(&progress as &(dyn Fn(u64) + Sync)),
        };
        simulator().run_with(&sel, 10_001, Some(5), control).unwrap();
        assert_eq!(done.load(Ordering::Relaxed), 10_001);
    }

    #[test]
    fn test_cost_overflow_rejected_before_running() {
        let sel = Selection::new(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]).unwrap();
        let done = AtomicU64::new(0);
        let progress = |n: u64| {
            done.fetch_add(n, Ordering::Relaxed);
        };
        let control = RunControl {
            cancel: None,
            progress: Some(&progress as &(dyn Fn(u64) + Sync)),
        };
        let err = simulator().run_with(&sel, u64::MAX / 1_000, Some(1), control).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidSelection(_)));
        assert_eq!(done.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_revenue_overflow_is_an_error() {
        let mut config = AnalyticsConfig::default();
        config.prizes.insert(3, u64::MAX / 10_000);
        let sel = Selection::new(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]).unwrap();
        let err = Simulator::new(config).unwrap().run(&sel, 2_000, Some(8)).unwrap_err();
        assert!(matches!(err, AnalyticsError::UndefinedConfiguration(_)));
    }

    #[test]
    fn test_zero_simulations() {
        let sel = Selection::new(&[1, 2, 3, 4, 5, 6]).unwrap();
        let result = simulator().run(&sel, 0, Some(1)).unwrap();
        assert_eq!(result.total_cost, 0);
        assert_eq!(result.roi_percent, 0.0);
    }
}
