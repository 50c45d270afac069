use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{AnalyticsError, Result};
use crate::models::{number_index, Draw, NumberObservation, RawDraw, PICK_COUNT, POOL_SIZE};

/// Format officiel des dates de sorteo.
const PRIMARY_DATE_FORMAT: &str = "%d/%m/%Y";

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%y"];

const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Ligne rejetée lors de la construction de la table des tirages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub row: usize,
    pub draw_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct DrawTable {
    /// Triés par `sequence_id` croissant.
    pub draws: Vec<Draw>,
    pub skipped: Vec<SkippedRecord>,
}

impl DrawTable {
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn missing_dates(&self) -> usize {
        self.draws.iter().filter(|d| d.date.is_none()).count()
    }

    pub fn latest(&self) -> Option<&Draw> {
        self.draws.last()
    }

    pub fn observations(&self) -> Vec<NumberObservation> {
        explode(&self.draws)
    }
}

/// Format strict d'abord, puis formats permissifs ; `None` si rien ne correspond.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, PRIMARY_DATE_FORMAT) {
        return Some(date);
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            FALLBACK_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Découpe sur les blancs et ignore les jetons non numériques.
pub fn parse_numbers(raw: &str) -> Vec<u8> {
    raw.split_whitespace()
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|token| token.parse::<u8>().ok())
        .collect()
}

/// Premier groupe de chiffres de l'identifiant ("Sorteo 1234" -> 1234).
pub fn parse_sequence_id(draw_id: &str) -> Option<u32> {
    let digits: String = draw_id
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

pub fn extract_draw(raw: &RawDraw) -> Result<Draw> {
    let malformed = |reason: String| AnalyticsError::MalformedRecord {
        draw_id: raw.draw_id.clone(),
        reason,
    };

    let sequence_id = parse_sequence_id(&raw.draw_id)
        .ok_or_else(|| malformed("identifiant de sorteo non numérique".into()))?;

    let parsed = parse_numbers(&raw.numbers);
    let numbers: [u8; PICK_COUNT] = parsed.as_slice().try_into().map_err(|_| {
        malformed(format!(
            "{} bolillas lues au lieu de {} dans '{}'",
            parsed.len(),
            PICK_COUNT,
            raw.numbers.trim()
        ))
    })?;

    Draw::new(sequence_id, raw.draw_id.trim(), parse_date(&raw.date), numbers)
}

/// Extrait chaque ligne ; les lignes invalides sont écartées et comptées, jamais
/// remplacées par un tirage à zéro. Un sorteo répété n'est gardé qu'une fois
/// (première occurrence dans le fichier).
pub fn build_draw_table(rows: &[RawDraw]) -> DrawTable {
    let mut table = DrawTable::default();
    let mut extracted: Vec<(usize, Draw)> = Vec::with_capacity(rows.len());

    for (row, raw) in rows.iter().enumerate() {
        match extract_draw(raw) {
            Ok(draw) => extracted.push((row + 1, draw)),
            Err(e) => {
                log::debug!("Ligne {} écartée : {}", row + 1, e);
                let reason = match e {
                    AnalyticsError::MalformedRecord { reason, .. } => reason,
                    other => other.to_string(),
                };
                table.skipped.push(SkippedRecord {
                    row: row + 1,
                    draw_id: raw.draw_id.clone(),
                    reason,
                });
            }
        }
    }

    // Tri stable : à sequence_id égal, l'ordre du fichier est conservé.
    extracted.sort_by_key(|(_, d)| d.sequence_id);
    for (row, draw) in extracted {
        if table.draws.last().is_some_and(|prev| prev.sequence_id == draw.sequence_id) {
            log::debug!("Ligne {} écartée : sorteo {} en double", row, draw.sequence_id);
            table.skipped.push(SkippedRecord {
                row,
                draw_id: draw.draw_id,
                reason: "sorteo en double".to_string(),
            });
        } else {
            table.draws.push(draw);
        }
    }
    table.skipped.sort_by_key(|s| s.row);

    if !table.skipped.is_empty() {
        log::warn!(
            "{} ligne(s) écartée(s) sur {}",
            table.skipped.len(),
            rows.len()
        );
    }
    log::info!(
        "{} tirages extraits ({} sans date)",
        table.draws.len(),
        table.missing_dates()
    );

    table
}

/// Garde les tirages datés à partir de `boundary` ; les dates manquantes sont exclues.
pub fn filter_era(table: &DrawTable, boundary: NaiveDate) -> DrawTable {
    let draws: Vec<Draw> = table
        .draws
        .iter()
        .filter(|d| d.date.is_some_and(|date| date >= boundary))
        .cloned()
        .collect();
    log::debug!(
        "Filtre d'ère {} : {}/{} tirages conservés",
        boundary,
        draws.len(),
        table.draws.len()
    );
    DrawTable {
        draws,
        skipped: table.skipped.clone(),
    }
}

pub fn explode(draws: &[Draw]) -> Vec<NumberObservation> {
    draws
        .iter()
        .flat_map(|d| {
            d.numbers.iter().map(move |&number| NumberObservation {
                sequence_id: d.sequence_id,
                number,
            })
        })
        .collect()
}

/// Fréquence brute de chaque numéro ; l'index 0 correspond au numéro 1.
pub fn number_frequencies(observations: &[NumberObservation]) -> [u32; POOL_SIZE as usize] {
    let mut counts = [0u32; POOL_SIZE as usize];
    for obs in observations {
        if let Some(i) = number_index(obs.number) {
            counts[i] += 1;
        }
    }
    counts
}
