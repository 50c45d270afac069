use std::path::Path;

use anyhow::{Context, Result};
use tinka_core::models::RawDraw;

pub struct ImportResult {
    pub total_records: u32,
    pub rows: Vec<RawDraw>,
    pub errors: u32,
}

/// Index des colonnes Sorteo / Fecha / Bolillas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    draw_id: usize,
    date: usize,
    numbers: usize,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Self {
        let find = |names: &[&str], fallback: usize| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
                .unwrap_or(fallback)
        };
        Self {
            draw_id: find(&["sorteo", "draw", "draw_id"], 0),
            date: find(&["fecha", "date"], 1),
            numbers: find(&["bolillas", "numbers", "numeros", "números"], 2),
        }
    }
}

/// Les exports officiels sont en latin-1 ; l'UTF-8 valide est gardé tel quel.
fn decode_latin1(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

pub fn read_draws(path: &Path, delimiter: u8) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let headers: Vec<String> = reader
        .byte_headers()
        .with_context(|| format!("En-tête illisible dans {:?}", path))?
        .iter()
        .map(decode_latin1)
        .collect();
    let columns = Columns::from_headers(&headers);
    log::debug!("Colonnes retenues : {:?}", columns);

    let mut result = ImportResult {
        total_records: 0,
        rows: Vec::new(),
        errors: 0,
    };

    for record_result in reader.byte_records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => {
                let field = |idx: usize| record.get(idx).map(decode_latin1);
                match (field(columns.draw_id), field(columns.date), field(columns.numbers)) {
                    (Some(draw_id), Some(date), Some(numbers)) => {
                        result.rows.push(RawDraw::new(draw_id, date, numbers));
                    }
                    _ => {
                        log::warn!("Ligne {} : colonnes manquantes", result.total_records);
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("Erreur lecture ligne {} : {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    Ok(result)
}
