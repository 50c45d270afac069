use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::PRIZE_TIERS;
use crate::error::{AnalyticsError, Result};
use crate::models::{MAX_PLAYED, MIN_PLAYED, PICK_COUNT, POOL_SIZE};

/// Coefficient binomial C(n, k), 0 si k > n.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1u64, |acc, i| acc * (n - i) as u64 / (i + 1) as u64)
}

/// Nombre de combinaisons simples couvertes par une jugada de `n_played` numéros.
pub fn combinations(n_played: usize) -> u64 {
    binomial(n_played, PICK_COUNT)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payout {
    /// Nombre de combinaisons gagnantes par palier.
    pub breakdown: BTreeMap<u8, u64>,
    pub total: u64,
}

fn check_play(n_played: usize, k_matches: usize) -> Result<()> {
    if !(MIN_PLAYED..=MAX_PLAYED).contains(&n_played) {
        return Err(AnalyticsError::InvalidSelection(format!(
            "{} numéros joués (attendu {}-{})",
            n_played, MIN_PLAYED, MAX_PLAYED
        )));
    }
    if k_matches > PICK_COUNT || k_matches > n_played {
        return Err(AnalyticsError::InvalidSelection(format!(
            "{} aciertos impossibles avec {} numéros joués",
            k_matches, n_played
        )));
    }
    Ok(())
}

/// Gains en cascade d'une jugada système : pour chaque palier x, les
/// combinaisons de 6 contenant exactement x numéros acertados.
pub fn payout(n_played: usize, k_matches: usize, prizes: &BTreeMap<u8, u64>) -> Result<Payout> {
    check_play(n_played, k_matches)?;

    let mut breakdown = BTreeMap::new();
    let mut total = 0u64;
    if k_matches < PRIZE_TIERS[0] as usize {
        return Ok(Payout { breakdown, total });
    }

    let misses = n_played - k_matches;
    for tier in PRIZE_TIERS {
        let x = tier as usize;
        let count = if x <= k_matches && PICK_COUNT - x <= misses {
            binomial(k_matches, x) * binomial(misses, PICK_COUNT - x)
        } else {
            0
        };
        if count > 0 {
            let prize = prizes.get(&tier).ok_or_else(|| {
                AnalyticsError::UndefinedConfiguration(format!("aucun gain défini pour {} aciertos", tier))
            })?;
            total = count
                .checked_mul(*prize)
                .and_then(|gain| total.checked_add(gain))
                .ok_or_else(|| {
                    AnalyticsError::UndefinedConfiguration(format!(
                        "gain du palier {} hors de la plage u64",
                        tier
                    ))
                })?;
        }
        breakdown.insert(tier, count);
    }

    Ok(Payout { breakdown, total })
}

/// P(k aciertos) pour k = 0..=6 sous un tirage uniforme 6/50.
pub fn hypergeometric(n_played: usize) -> [f64; PICK_COUNT + 1] {
    let pool = POOL_SIZE as usize;
    let total = binomial(pool, PICK_COUNT) as f64;
    let mut probs = [0.0; PICK_COUNT + 1];
    for (k, p) in probs.iter_mut().enumerate() {
        if k <= n_played && PICK_COUNT - k <= pool.saturating_sub(n_played) {
            *p = (binomial(n_played, k) * binomial(pool - n_played, PICK_COUNT - k)) as f64 / total;
        }
    }
    probs
}

/// Espérance exacte du gain par sorteo.
pub fn expected_payout(n_played: usize, prizes: &BTreeMap<u8, u64>) -> Result<f64> {
    check_play(n_played, 0)?;
    let probs = hypergeometric(n_played);
    let mut expected = 0.0;
    for (k, p) in probs.iter().enumerate().filter(|&(k, _)| k <= n_played) {
        expected += p * payout(n_played, k, prizes)?.total as f64;
    }
    Ok(expected)
}
