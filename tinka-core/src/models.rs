use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{AnalyticsError, Result};

/// Taille du bolillero depuis le changement de règles (6/50).
pub const POOL_SIZE: u8 = 50;
/// Nombre de bolillas tirées par sorteo.
pub const PICK_COUNT: usize = 6;
pub const MIN_PLAYED: usize = 6;
pub const MAX_PLAYED: usize = 15;

/// Ligne brute telle que fournie par la couche d'ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDraw {
    pub draw_id: String,
    pub date: String,
    pub numbers: String,
}

impl RawDraw {
    pub fn new(draw_id: impl Into<String>, date: impl Into<String>, numbers: impl Into<String>) -> Self {
        Self {
            draw_id: draw_id.into(),
            date: date.into(),
            numbers: numbers.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draw {
    pub sequence_id: u32,
    pub draw_id: String,
    /// `None` quand la date n'a pas pu être interprétée.
    pub date: Option<NaiveDate>,
    /// Triés par ordre croissant.
    pub numbers: [u8; PICK_COUNT],
    pub sum: u32,
    pub even_count: u8,
    pub odd_count: u8,
}

impl Draw {
    pub fn new(
        sequence_id: u32,
        draw_id: impl Into<String>,
        date: Option<NaiveDate>,
        mut numbers: [u8; PICK_COUNT],
    ) -> Result<Self> {
        let draw_id = draw_id.into();
        check_numbers(&numbers).map_err(|reason| AnalyticsError::MalformedRecord {
            draw_id: draw_id.clone(),
            reason,
        })?;
        numbers.sort_unstable();

        let sum = numbers.iter().map(|&n| n as u32).sum();
        let even_count = numbers.iter().filter(|&&n| n % 2 == 0).count() as u8;

        Ok(Self {
            sequence_id,
            draw_id,
            date,
            numbers,
            sum,
            even_count,
            odd_count: PICK_COUNT as u8 - even_count,
        })
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    pub fn mask(&self) -> u64 {
        number_mask(&self.numbers)
    }
}

/// Une paire (sorteo, numéro) issue de l'éclatement d'un tirage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberObservation {
    pub sequence_id: u32,
    pub number: u8,
}

/// Vérifie que chaque numéro est dans 1..=50 et qu'il n'y a pas de doublon.
pub fn check_numbers(numbers: &[u8]) -> std::result::Result<(), String> {
    let mut seen = 0u64;
    for &n in numbers {
        if n < 1 || n > POOL_SIZE {
            return Err(format!("bolilla {} hors limites (1-{})", n, POOL_SIZE));
        }
        let bit = 1u64 << n;
        if seen & bit != 0 {
            return Err(format!("bolilla en double : {}", n));
        }
        seen |= bit;
    }
    Ok(())
}

/// Masque 64 bits : le bit `n` est levé si `n` fait partie de l'ensemble.
pub fn number_mask(numbers: &[u8]) -> u64 {
    numbers
        .iter()
        .filter(|&&n| number_index(n).is_some())
        .fold(0u64, |mask, &n| mask | (1u64 << n))
}

/// Position 0-based d'une bolilla dans les tableaux par numéro, `None` hors de 1..=50.
pub fn number_index(number: u8) -> Option<usize> {
    (1..=POOL_SIZE).contains(&number).then(|| number as usize - 1)
}

/// Tirages déterministes pour les tests : sorteos 1000.., un tous les 3 jours.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    let start = NaiveDate::from_ymd_opt(2022, 10, 1).unwrap_or_default();
    (0..n)
        .map(|i| {
            let mut numbers = [0u8; PICK_COUNT];
            for (j, slot) in numbers.iter_mut().enumerate() {
                *slot = ((i * 7 + j * 8) % POOL_SIZE as usize) as u8 + 1;
            }
            let date = start.checked_add_days(chrono::Days::new(3 * i as u64));
            let sequence_id = 1000 + i as u32;
            Draw::new(sequence_id, sequence_id.to_string(), date, numbers)
                .unwrap_or_else(|e| panic!("tirage de test invalide : {e}"))
        })
        .collect()
}
