pub mod cooccurrence;
pub mod entropy;
pub mod gap;
pub mod markov;
pub mod parity;

use serde::Serialize;

use crate::features::DrawTable;

pub use cooccurrence::{cooccurrence_matrix, CooccurrenceMatrix};
pub use entropy::{global_entropy, rolling_entropy, EntropyWindow, RollingEntropy, MAX_ENTROPY};
pub use gap::{gap_metrics, GapMetric};
pub use markov::{transition_matrix, TransitionMatrix};
pub use parity::{parity_distribution, ParityShare};

/// Indicateurs clés d'un jeu de tirages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub draws: usize,
    pub skipped: usize,
    pub missing_dates: usize,
    pub latest_sequence: Option<u32>,
    pub latest_numbers: Option<[u8; 6]>,
    pub entropy: f64,
}

pub fn summarize(table: &DrawTable) -> DatasetSummary {
    let latest = table.latest();
    DatasetSummary {
        draws: table.len(),
        skipped: table.skipped.len(),
        missing_dates: table.missing_dates(),
        latest_sequence: latest.map(|d| d.sequence_id),
        latest_numbers: latest.map(|d| d.numbers),
        entropy: global_entropy(&table.observations()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_test_draws;

    #[test]
    fn test_summarize() {
        let table = DrawTable {
            draws: make_test_draws(20),
            skipped: vec![],
        };
        let summary = summarize(&table);
        assert_eq!(summary.draws, 20);
        assert_eq!(summary.latest_sequence, Some(1019));
        assert_eq!(summary.latest_numbers, Some(table.draws[19].numbers));
        assert!(summary.entropy > 0.0 && summary.entropy <= MAX_ENTROPY);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&DrawTable::default());
        assert_eq!(summary.draws, 0);
        assert_eq!(summary.latest_sequence, None);
        assert_eq!(summary.entropy, 0.0);
    }
}
