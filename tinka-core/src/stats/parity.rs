use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::Draw;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParityShare {
    pub even: u8,
    pub odd: u8,
    pub count: u32,
    pub percent: f64,
}

impl ParityShare {
    pub fn label(&self) -> String {
        format!("{}P-{}I", self.even, self.odd)
    }
}

/// Répartition (en %) des tirages par nombre de pairs/impairs, part décroissante.
pub fn parity_distribution(draws: &[Draw]) -> Vec<ParityShare> {
    let mut counts: BTreeMap<(u8, u8), u32> = BTreeMap::new();
    for draw in draws {
        *counts.entry((draw.even_count, draw.odd_count)).or_insert(0) += 1;
    }

    let total = draws.len() as f64;
    let mut shares: Vec<ParityShare> = counts
        .into_iter()
        .map(|((even, odd), count)| ParityShare {
            even,
            odd,
            count,
            percent: count as f64 / total * 100.0,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then(b.even.cmp(&a.even)));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_test_draws;

    #[test]
    fn test_percentages_sum_to_hundred() {
        let shares = parity_distribution(&make_test_draws(77));
        let total: f64 = shares.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(shares.iter().all(|s| s.even + s.odd == 6));
    }

    #[test]
    fn test_known_distribution() {
        let draws = vec![
            Draw::new(1, "1", None, [1, 2, 3, 4, 5, 6]).unwrap(),
            Draw::new(2, "2", None, [7, 8, 9, 10, 11, 12]).unwrap(),
            Draw::new(3, "3", None, [2, 4, 6, 8, 10, 11]).unwrap(),
            Draw::new(4, "4", None, [13, 14, 15, 16, 17, 18]).unwrap(),
        ];
        let shares = parity_distribution(&draws);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].label(), "3P-3I");
        assert_eq!(shares[0].count, 3);
        assert!((shares[0].percent - 75.0).abs() < 1e-12);
        assert_eq!(shares[1].label(), "5P-1I");
    }

    #[test]
    fn test_empty() {
        assert!(parity_distribution(&[]).is_empty());
    }
}
