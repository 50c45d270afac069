use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::models::{MAX_PLAYED, MIN_PLAYED};
use crate::payout::combinations;

/// Paliers de gain (nombre de bolillas acertadas).
pub const PRIZE_TIERS: [u8; 4] = [3, 4, 5, 6];

/// Partition ordonnée de la somme des bolillas en états.
/// Intervalles fermés à droite : `(cuts[i], cuts[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumBuckets {
    pub cuts: Vec<u32>,
    pub labels: Vec<String>,
}

impl Default for SumBuckets {
    fn default() -> Self {
        Self {
            cuts: vec![0, 130, 150, 170, 300],
            labels: ["Very Low", "Low", "High", "Very High"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SumBuckets {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index de l'état contenant `sum`, `None` hors de la partition.
    pub fn state_of(&self, sum: u32) -> Option<usize> {
        self.cuts
            .windows(2)
            .position(|w| sum > w[0] && sum <= w[1])
    }

    pub fn validate(&self) -> Result<()> {
        if self.cuts.len() < 2 {
            return Err(AnalyticsError::UndefinedConfiguration(
                "au moins deux bornes de somme sont nécessaires".into(),
            ));
        }
        if self.cuts.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AnalyticsError::UndefinedConfiguration(format!(
                "bornes de somme non strictement croissantes : {:?}",
                self.cuts
            )));
        }
        if self.labels.len() + 1 != self.cuts.len() {
            return Err(AnalyticsError::UndefinedConfiguration(format!(
                "{} libellés pour {} intervalles",
                self.labels.len(),
                self.cuts.len() - 1
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Début de l'ère moderne (passage à 50 bolillas).
    pub era_start: NaiveDate,
    pub sum_buckets: SumBuckets,
    /// Gain fixe par palier.
    pub prizes: BTreeMap<u8, u64>,
    /// Prix d'une combinaison simple.
    pub ticket_price: u64,
    /// Tarif explicite par nombre de numéros joués. Vide : C(n, 6) × `ticket_price`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub costs: BTreeMap<u8, u64>,
    pub entropy_window: usize,
    pub default_simulations: u64,
    /// Taille des lots de tirages simulés (granularité du parallélisme et de l'annulation).
    pub batch_size: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            era_start: NaiveDate::from_ymd_opt(2022, 10, 1).unwrap_or_default(),
            sum_buckets: SumBuckets::default(),
            prizes: BTreeMap::from([(3, 10), (4, 100), (5, 5_000), (6, 4_000_000)]),
            ticket_price: 5,
            costs: BTreeMap::new(),
            entropy_window: 50,
            default_simulations: 10_000,
            batch_size: 4_096,
        }
    }
}

impl AnalyticsConfig {
    /// Tarif explicite s'il existe, sinon C(n, 6) × `ticket_price` : une jugada
    /// de n numéros couvre C(n, 6) combinaisons simples.
    pub fn cost_for(&self, n_played: usize) -> Result<u64> {
        let cost = if self.costs.is_empty() {
            (MIN_PLAYED..=MAX_PLAYED)
                .contains(&n_played)
                .then(|| combinations(n_played).checked_mul(self.ticket_price))
                .flatten()
        } else {
            u8::try_from(n_played)
                .ok()
                .and_then(|n| self.costs.get(&n).copied())
        };
        cost.ok_or_else(|| {
            AnalyticsError::UndefinedConfiguration(format!(
                "aucun coût défini pour une jugada de {} numéros",
                n_played
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.sum_buckets.validate()?;
        for tier in PRIZE_TIERS {
            if !self.prizes.contains_key(&tier) {
                return Err(AnalyticsError::UndefinedConfiguration(format!(
                    "aucun gain défini pour {} aciertos",
                    tier
                )));
            }
        }
        if self.batch_size == 0 {
            return Err(AnalyticsError::UndefinedConfiguration(
                "batch_size doit être > 0".into(),
            ));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<AnalyticsConfig> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| AnalyticsError::Config(format!("impossible de lire {:?} : {}", path, e)))?;
    let config: AnalyticsConfig = serde_json::from_str(&json)
        .map_err(|e| AnalyticsError::Config(format!("JSON invalide dans {:?} : {}", path, e)))?;
    config.validate()?;
    log::debug!("Configuration chargée depuis {:?}", path);
    Ok(config)
}

pub fn save_config(config: &AnalyticsConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| AnalyticsError::Config(e.to_string()))?;
    std::fs::write(path, json)
        .map_err(|e| AnalyticsError::Config(format!("impossible d'écrire {:?} : {}", path, e)))?;
    Ok(())
}
