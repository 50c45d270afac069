use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use textplots::Plot;

use tinka_core::features::DrawTable;
use tinka_core::payout::Payout;
use tinka_core::simulation::SimulationResult;
use tinka_core::stats::{DatasetSummary, EntropyWindow, GapMetric, ParityShare, TransitionMatrix, MAX_ENTROPY};

use crate::import::ImportResult;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_import_summary(result: &ImportResult, table: &DrawTable) {
    println!("Lecture terminée :");
    println!("  Total lignes lues  : {}", result.total_records);
    println!("  Tirages valides    : {}", table.len());
    if result.errors > 0 {
        println!("  Erreurs de lecture : {}", result.errors);
    }
    if !table.skipped.is_empty() {
        println!("  Lignes écartées    : {}", table.skipped.len());
        for skipped in table.skipped.iter().take(5) {
            println!("    ligne {} ({}) : {}", skipped.row, skipped.draw_id, skipped.reason);
        }
        if table.skipped.len() > 5 {
            println!("    …");
        }
    }
}

pub fn display_summary(summary: &DatasetSummary) {
    println!("\n📊 Panel de contrôle\n");

    let mut table = new_table();
    table.set_header(vec!["Indicateur", "Valeur"]);
    table.add_row(vec!["Tirages analysés".to_string(), summary.draws.to_string()]);
    table.add_row(vec!["Lignes écartées".to_string(), summary.skipped.to_string()]);
    table.add_row(vec!["Dates manquantes".to_string(), summary.missing_dates.to_string()]);
    table.add_row(vec![
        "Entropie du système".to_string(),
        format!("{:.4} (max {:.2})", summary.entropy, MAX_ENTROPY),
    ]);
    table.add_row(vec![
        "Dernier sorteo".to_string(),
        summary.latest_sequence.map_or("-".to_string(), |s| s.to_string()),
    ]);
    table.add_row(vec![
        "Dernière jugada".to_string(),
        summary.latest_numbers.map_or("-".to_string(), |n| format_numbers(&n)),
    ]);
    println!("{table}");
}

pub fn display_gaps(metrics: &[GapMetric], top: usize) {
    println!("\n🎯 Pression statistique (analyse des retards)\n");

    let mut sorted = metrics.to_vec();
    sorted.sort_by(|a, b| b.z_score.partial_cmp(&a.z_score).unwrap_or(std::cmp::Ordering::Equal));

    let mut table = new_table();
    table.set_header(vec!["Numéro", "Sorties", "Écart moyen", "Écart-type", "Retard actuel", "Z-score"]);
    for m in sorted.iter().take(top) {
        let color = if m.z_score >= 2.0 {
            Color::Red
        } else if m.z_score <= -1.0 {
            Color::Blue
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", m.number)),
            Cell::new(m.appearances),
            Cell::new(format!("{:.2}", m.mean_gap)),
            Cell::new(format!("{:.2}", m.std_gap)),
            Cell::new(m.current_gap),
            Cell::new(format!("{:+.2}", m.z_score)).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_entropy(windows: &[EntropyWindow], window: usize) {
    println!("\n📈 Entropie glissante (fenêtre de {} sorteos)\n", window);

    if windows.is_empty() {
        println!("  Il faut au moins {} tirages pour calculer l'entropie glissante.", window);
        return;
    }

    let points: Vec<(f32, f32)> = windows
        .iter()
        .map(|w| (w.end_sequence as f32, w.entropy as f32))
        .collect();
    let x_min = points[0].0;
    let x_max = points[points.len() - 1].0.max(x_min + 1.0);
    let y_min = points.iter().map(|p| p.1).fold(f32::MAX, f32::min) - 0.05;
    let y_max = MAX_ENTROPY as f32 + 0.05;

    let shape = textplots::Shape::Lines(&points);
    let mut chart = textplots::Chart::new_with_y_range(120, 40, x_min, x_max, y_min, y_max);
    println!("{}", chart.lineplot(&shape));

    let mut table = new_table();
    table.set_header(vec!["Début", "Fin", "Entropie", "Écart au max"]);
    let step = (windows.len() / 15).max(1);
    for w in windows.iter().step_by(step) {
        table.add_row(vec![
            w.start_sequence.to_string(),
            w.end_sequence.to_string(),
            format!("{:.4}", w.entropy),
            format!("{:.4}", MAX_ENTROPY - w.entropy),
        ]);
    }
    println!("{table}");
}

pub fn display_markov(matrix: &TransitionMatrix) {
    println!("\n🔗 Transitions d'état (somme), ligne : sorteo courant, colonne : suivant\n");

    let mut table = new_table();
    let mut header = vec!["Courant \\ Suivant".to_string()];
    header.extend(matrix.labels.iter().cloned());
    header.push("Obs.".to_string());
    table.set_header(header);

    for (i, label) in matrix.labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        match matrix.row(i) {
            Some(probs) => row.extend(probs.iter().map(|p| format!("{:.1}%", p * 100.0))),
            None => row.extend(std::iter::repeat("-".to_string()).take(matrix.size())),
        }
        row.push(matrix.counts[i].iter().sum::<u32>().to_string());
        table.add_row(row);
    }
    println!("{table}");
    println!("  {} transitions retenues", matrix.transitions());
}

pub fn display_pairs(pairs: &[(u8, u8, u32)]) {
    println!("\n🤝 Paires les plus fréquentes\n");

    if pairs.is_empty() {
        println!("  Aucune paire observée.");
        return;
    }

    let mut table = new_table();
    table.set_header(vec!["#", "Bolilla A", "Bolilla B", "Sorteos communs"]);
    for (i, (a, b, count)) in pairs.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{:2}", a),
            format!("{:2}", b),
            count.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_parity(shares: &[ParityShare]) {
    println!("\n⚖️  Distribution pairs / impairs\n");

    let mut table = new_table();
    table.set_header(vec!["Combinaison", "Sorteos", "Pourcentage"]);
    for share in shares {
        table.add_row(vec![
            share.label(),
            share.count.to_string(),
            format!("{:.2}%", share.percent),
        ]);
    }
    println!("{table}");
}

pub fn display_payout(n_played: usize, k_matches: usize, payout: &Payout, cost: u64) {
    println!(
        "\n💰 Jugada de {} numéros, {} aciertos (coût S/ {})\n",
        n_played, k_matches, cost
    );

    if payout.breakdown.is_empty() {
        println!("  Moins de 3 aciertos : aucun gain.");
        return;
    }

    let mut table = new_table();
    table.set_header(vec!["Palier", "Combinaisons gagnantes"]);
    for (tier, count) in &payout.breakdown {
        table.add_row(vec![format!("{} aciertos", tier), count.to_string()]);
    }
    println!("{table}");
    println!("  Gain total : S/ {}", payout.total);
}

pub fn display_simulation(result: &SimulationResult, selection: &[u8], theory: &[f64]) {
    println!("\n🎰 Simulation Monte Carlo ({} sorteos, seed {})\n", result.simulations, result.seed);
    println!("  Jugada : {}", format_numbers(selection));

    let mut table = new_table();
    table.set_header(vec!["Aciertos", "Sorteos", "Fréquence", "Théorique"]);
    for (k, &count) in result.histogram.iter().enumerate() {
        let freq = if result.simulations > 0 {
            count as f64 / result.simulations as f64
        } else {
            0.0
        };
        table.add_row(vec![
            k.to_string(),
            count.to_string(),
            format!("{:.5}", freq),
            format!("{:.5}", theory.get(k).copied().unwrap_or(0.0)),
        ]);
    }
    println!("{table}");

    let roi_color = if result.profit() > 0 { Color::Green } else { Color::Red };
    let mut summary = new_table();
    summary.set_header(vec!["Investissement", "Gains (premios)", "ROI"]);
    summary.add_row(vec![
        Cell::new(format!("S/ {}", result.total_cost)),
        Cell::new(format!("S/ {}", result.total_revenue)),
        Cell::new(format!("{:.2}%", result.roi_percent)).fg(roi_color),
    ]);
    println!("{summary}");
    println!("  Les gains incluent les premios en cascade des jugadas multiples.");
}
