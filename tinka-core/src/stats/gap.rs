use serde::Serialize;

use crate::models::{number_index, NumberObservation, POOL_SIZE};

/// Analyse de retard ("pression") d'un numéro.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapMetric {
    pub number: u8,
    pub appearances: u32,
    pub mean_gap: f64,
    /// Écart-type de population des écarts.
    pub std_gap: f64,
    pub current_gap: u32,
    /// 0 quand l'écart-type est nul : pression indéfinie, donc neutre.
    pub z_score: f64,
}

impl GapMetric {
    fn neutral(number: u8, appearances: u32) -> Self {
        Self {
            number,
            appearances,
            mean_gap: 0.0,
            std_gap: 0.0,
            current_gap: 0,
            z_score: 0.0,
        }
    }
}

/// Une ligne par numéro 1..=50. Les numéros vus moins de deux fois ont des
/// métriques nulles.
pub fn gap_metrics(observations: &[NumberObservation]) -> Vec<GapMetric> {
    let max_sequence = observations.iter().map(|o| o.sequence_id).max().unwrap_or(0);

    let mut appearances: Vec<Vec<u32>> = vec![Vec::new(); POOL_SIZE as usize];
    for obs in observations {
        if let Some(i) = number_index(obs.number) {
            appearances[i].push(obs.sequence_id);
        }
    }

    appearances
        .into_iter()
        .enumerate()
        .map(|(idx, mut seen)| {
            let number = idx as u8 + 1;
            let count = seen.len() as u32;
            if seen.len() < 2 {
                return GapMetric::neutral(number, count);
            }

            seen.sort_unstable_by(|a, b| b.cmp(a));
            let diffs: Vec<f64> = seen.windows(2).map(|w| w[0].abs_diff(w[1]) as f64).collect();
            let mean_gap = diffs.iter().sum::<f64>() / diffs.len() as f64;
            let variance =
                diffs.iter().map(|d| (d - mean_gap).powi(2)).sum::<f64>() / diffs.len() as f64;
            let std_gap = variance.sqrt();

            let current_gap = max_sequence - seen[0];
            let z_score = if std_gap > 0.0 {
                (current_gap as f64 - mean_gap) / std_gap
            } else {
                0.0
            };

            GapMetric {
                number,
                appearances: count,
                mean_gap,
                std_gap,
                current_gap,
                z_score,
            }
        })
        .collect()
}
