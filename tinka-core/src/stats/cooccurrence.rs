use crate::models::{number_index, Draw, POOL_SIZE};

const N: usize = POOL_SIZE as usize;

/// Matrice dense 50×50 des apparitions conjointes.
/// La diagonale est à zéro ; la fréquence simple d'un numéro est dans `frequency`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooccurrenceMatrix {
    counts: [[u32; N]; N],
    frequencies: [u32; N],
}

impl CooccurrenceMatrix {
    /// Numéros en base 1 ; 0 hors limites.
    pub fn get(&self, a: u8, b: u8) -> u32 {
        match (number_index(a), number_index(b)) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    pub fn frequency(&self, number: u8) -> u32 {
        number_index(number).map_or(0, |i| self.frequencies[i])
    }

    pub fn rows(&self) -> &[[u32; N]; N] {
        &self.counts
    }

    /// Les `k` paires (a < b) les plus fréquentes, à égalité par numéros croissants.
    pub fn top_pairs(&self, k: usize) -> Vec<(u8, u8, u32)> {
        let mut pairs: Vec<(u8, u8, u32)> = (0..N)
            .flat_map(|i| ((i + 1)..N).map(move |j| (i, j)))
            .map(|(i, j)| (i as u8 + 1, j as u8 + 1, self.counts[i][j]))
            .filter(|&(_, _, c)| c > 0)
            .collect();
        pairs.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));
        pairs.truncate(k);
        pairs
    }
}

/// 15 paires par tirage, incréments symétriques.
pub fn cooccurrence_matrix(draws: &[Draw]) -> CooccurrenceMatrix {
    let mut counts = [[0u32; N]; N];
    let mut frequencies = [0u32; N];

    for draw in draws {
        for (pos, &a) in draw.numbers.iter().enumerate() {
            let Some(i) = number_index(a) else { continue };
            frequencies[i] += 1;
            for j in draw.numbers[pos + 1..].iter().filter_map(|&b| number_index(b)) {
                counts[i][j] += 1;
                counts[j][i] += 1;
            }
        }
    }

    CooccurrenceMatrix { counts, frequencies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_test_draws;

    #[test]
    fn test_symmetric() {
        let matrix = cooccurrence_matrix(&make_test_draws(150));
        for a in 1..=50u8 {
            for b in 1..=50u8 {
                assert_eq!(matrix.get(a, b), matrix.get(b, a));
            }
        }
    }

    #[test]
    fn test_diagonal_is_zero() {
        let matrix = cooccurrence_matrix(&make_test_draws(50));
        for n in 1..=50u8 {
            assert_eq!(matrix.get(n, n), 0);
        }
    }

    #[test]
    fn test_pair_total() {
        let draws = make_test_draws(40);
        let matrix = cooccurrence_matrix(&draws);
        let total: u32 = matrix.rows().iter().flatten().sum();
        // 15 paires par tirage, comptées deux fois
        assert_eq!(total, 40 * 15 * 2);
    }

    #[test]
    fn test_known_pairs_and_frequency() {
        let draws = vec![
            Draw::new(1, "1", None, [1, 2, 3, 4, 5, 6]).unwrap(),
            Draw::new(2, "2", None, [1, 2, 10, 20, 30, 40]).unwrap(),
        ];
        let matrix = cooccurrence_matrix(&draws);
        assert_eq!(matrix.get(1, 2), 2);
        assert_eq!(matrix.get(1, 10), 1);
        assert_eq!(matrix.get(3, 40), 0);
        assert_eq!(matrix.frequency(1), 2);
        assert_eq!(matrix.frequency(40), 1);
        assert_eq!(matrix.get(0, 1), 0);
        assert_eq!(matrix.top_pairs(1), vec![(1, 2, 2)]);
    }

    #[test]
    fn test_out_of_range_numbers_ignored() {
        let mut draw = Draw::new(1, "1", None, [1, 2, 3, 4, 5, 6]).unwrap();
        draw.numbers[0] = 0;
        let matrix = cooccurrence_matrix(&[draw]);
        assert_eq!(matrix.frequency(2), 1);
        assert_eq!(matrix.get(2, 6), 1);
        let total: u32 = matrix.rows().iter().flatten().sum();
        assert_eq!(total, 10 * 2);
    }

    #[test]
    fn test_top_pairs_sorted() {
        let matrix = cooccurrence_matrix(&make_test_draws(100));
        let top = matrix.top_pairs(10);
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].2 >= w[1].2));
        assert!(top.iter().all(|&(a, b, _)| a < b));
    }

    #[test]
    fn test_empty() {
        let matrix = cooccurrence_matrix(&[]);
        assert!(matrix.top_pairs(5).is_empty());
        assert_eq!(matrix.frequency(7), 0);
    }
}
