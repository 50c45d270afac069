use serde::Serialize;

use crate::config::SumBuckets;
use crate::models::Draw;

/// Matrice de transition entre états de somme.
///
/// Convention : tirages ordonnés par sorteo croissant, ligne = état du tirage
/// courant, colonne = état du tirage suivant, normalisation par ligne.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionMatrix {
    pub labels: Vec<String>,
    pub counts: Vec<Vec<u32>>,
    /// `None` pour un état jamais observé comme état courant.
    pub probabilities: Vec<Option<Vec<f64>>>,
}

impl TransitionMatrix {
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn row(&self, from: usize) -> Option<&[f64]> {
        self.probabilities.get(from)?.as_deref()
    }

    pub fn probability(&self, from: usize, to: usize) -> Option<f64> {
        self.row(from)?.get(to).copied()
    }

    /// Nombre de paires (courant, suivant) retenues.
    pub fn transitions(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }
}

pub fn transition_matrix(draws: &[Draw], buckets: &SumBuckets) -> TransitionMatrix {
    let n = buckets.len();
    let mut ordered: Vec<&Draw> = draws.iter().collect();
    ordered.sort_by_key(|d| d.sequence_id);

    let mut counts = vec![vec![0u32; n]; n];
    let mut dropped = 0usize;
    for pair in ordered.windows(2) {
        match (buckets.state_of(pair[0].sum), buckets.state_of(pair[1].sum)) {
            (Some(current), Some(next)) if current < n && next < n => counts[current][next] += 1,
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        log::debug!("{} transition(s) hors partition ignorée(s)", dropped);
    }

    let probabilities = counts
        .iter()
        .map(|row| {
            let total: u32 = row.iter().sum();
            if total == 0 {
                None
            } else {
                Some(row.iter().map(|&c| c as f64 / total as f64).collect())
            }
        })
        .collect();

    TransitionMatrix {
        labels: buckets.labels.clone(),
        counts,
        probabilities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_test_draws;

    fn draw_with_sum(sequence_id: u32, numbers: [u8; 6]) -> Draw {
        Draw::new(sequence_id, sequence_id.to_string(), None, numbers).unwrap()
    }

    #[test]
    fn test_rows_sum_to_one_or_absent() {
        let matrix = transition_matrix(&make_test_draws(200), &SumBuckets::default());
        assert_eq!(matrix.size(), 4);
        for i in 0..matrix.size() {
            match matrix.row(i) {
                Some(row) => {
                    let sum: f64 = row.iter().sum();
                    assert!((sum - 1.0).abs() < 1e-9, "ligne {} : somme = {}", i, sum);
                }
                None => assert_eq!(matrix.counts[i].iter().sum::<u32>(), 0),
            }
        }
    }

    #[test]
    fn test_direction_is_ascending_sequence() {
        // sorteo 1 : somme 21 (Very Low) -> sorteo 2 : somme 279 (Very High)
        let low = draw_with_sum(1, [1, 2, 3, 4, 5, 6]);
        let high = draw_with_sum(2, [45, 46, 47, 48, 49, 44]);
        // ordre d'entrée inversé : la matrice doit le normaliser
        let matrix = transition_matrix(&[high, low], &SumBuckets::default());
        assert_eq!(matrix.probability(0, 3), Some(1.0));
        assert_eq!(matrix.row(3), None);
        assert_eq!(matrix.transitions(), 1);
    }

    #[test]
    fn test_known_counts() {
        let draws = vec![
            draw_with_sum(1, [1, 2, 3, 4, 5, 6]),        // 21 -> 0
            draw_with_sum(2, [20, 21, 22, 23, 24, 25]), // 135 -> 1
            draw_with_sum(3, [1, 2, 3, 4, 5, 7]),        // 22 -> 0
            draw_with_sum(4, [1, 2, 3, 4, 5, 8]),        // 23 -> 0
        ];
        let matrix = transition_matrix(&draws, &SumBuckets::default());
        assert_eq!(matrix.counts[0], vec![1, 1, 0, 0]);
        assert_eq!(matrix.counts[1], vec![1, 0, 0, 0]);
        assert_eq!(matrix.probability(0, 0), Some(0.5));
        assert_eq!(matrix.probability(0, 1), Some(0.5));
        assert_eq!(matrix.probability(1, 0), Some(1.0));
        assert_eq!(matrix.row(2), None);
    }

    #[test]
    fn test_undefined_states_are_dropped() {
        let buckets = SumBuckets {
            cuts: vec![100, 200],
            labels: vec!["Mid".into()],
        };
        let draws = vec![
            draw_with_sum(1, [1, 2, 3, 4, 5, 6]),        // 21 : hors partition
            draw_with_sum(2, [20, 21, 22, 23, 24, 25]), // 135
            draw_with_sum(3, [20, 21, 22, 23, 24, 26]), // 136
        ];
        let matrix = transition_matrix(&draws, &buckets);
        assert_eq!(matrix.transitions(), 1);
        assert_eq!(matrix.probability(0, 0), Some(1.0));
    }

    #[test]
    fn test_empty_and_single_draw() {
        let matrix = transition_matrix(&[], &SumBuckets::default());
        assert_eq!(matrix.transitions(), 0);
        assert!(matrix.probabilities.iter().all(|r| r.is_none()));

        let matrix = transition_matrix(&make_test_draws(1), &SumBuckets::default());
        assert_eq!(matrix.transitions(), 0);
    }

    #[test]
    fn test_idempotent() {
        let draws = make_test_draws(90);
        let buckets = SumBuckets::default();
        assert_eq!(transition_matrix(&draws, &buckets), transition_matrix(&draws, &buckets));
    }
}
