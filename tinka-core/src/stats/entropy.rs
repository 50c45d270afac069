use serde::Serialize;

use crate::features::number_frequencies;
use crate::models::{number_index, Draw, NumberObservation, POOL_SIZE};

/// ln(50) : entropie d'une distribution uniforme sur 50 bolillas.
/// Constante de comparaison uniquement.
pub const MAX_ENTROPY: f64 = 3.912_023_005_428_146;

/// Entropie de Shannon (logarithme naturel) d'une distribution de comptages.
pub fn shannon_entropy(counts: &[u32]) -> f64 {
    let total: u64 = counts.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum()
}

pub fn global_entropy(observations: &[NumberObservation]) -> f64 {
    shannon_entropy(&number_frequencies(observations))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntropyWindow {
    pub start_sequence: u32,
    pub end_sequence: u32,
    pub entropy: f64,
}

/// Entropie glissante sur `window` tirages consécutifs (ordre croissant de sorteo).
///
/// Itérateur fini ; cloner l'itérateur permet de repartir de la même position.
#[derive(Debug, Clone)]
pub struct RollingEntropy<'a> {
    draws: Vec<&'a Draw>,
    window: usize,
    offset: usize,
    counts: [u32; POOL_SIZE as usize],
}

impl<'a> RollingEntropy<'a> {
    fn windows_total(&self) -> usize {
        if self.window == 0 || self.draws.len() < self.window {
            0
        } else {
            self.draws.len() - self.window + 1
        }
    }

    fn add(&mut self, draw: &Draw) {
        for i in draw.numbers.iter().filter_map(|&n| number_index(n)) {
            self.counts[i] += 1;
        }
    }

    fn remove(&mut self, draw: &Draw) {
        for i in draw.numbers.iter().filter_map(|&n| number_index(n)) {
            self.counts[i] -= 1;
        }
    }
}

impl Iterator for RollingEntropy<'_> {
    type Item = EntropyWindow;

    fn next(&mut self) -> Option<EntropyWindow> {
        if self.offset >= self.windows_total() {
            return None;
        }

        if self.offset == 0 {
            for i in 0..self.window {
                let draw = self.draws[i];
                self.add(draw);
            }
        } else {
            let leaving = self.draws[self.offset - 1];
            let entering = self.draws[self.offset + self.window - 1];
            self.remove(leaving);
            self.add(entering);
        }

        let item = EntropyWindow {
            start_sequence: self.draws[self.offset].sequence_id,
            end_sequence: self.draws[self.offset + self.window - 1].sequence_id,
            entropy: shannon_entropy(&self.counts),
        };
        self.offset += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.windows_total().saturating_sub(self.offset);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RollingEntropy<'_> {}

/// Vide si moins de `window` tirages sont disponibles.
pub fn rolling_entropy(draws: &[Draw], window: usize) -> RollingEntropy<'_> {
    let mut ordered: Vec<&Draw> = draws.iter().collect();
    ordered.sort_by_key(|d| d.sequence_id);
    RollingEntropy {
        draws: ordered,
        window,
        offset: 0,
        counts: [0; POOL_SIZE as usize],
    }
}
