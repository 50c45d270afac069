mod display;
mod import;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use tinka_core::config::{load_config, save_config, AnalyticsConfig};
use tinka_core::features::{build_draw_table, filter_era, DrawTable};
use tinka_core::payout::{combinations, expected_payout, hypergeometric, payout};
use tinka_core::simulation::{RunControl, Selection, Simulator};
use tinka_core::stats::{
    cooccurrence_matrix, gap_metrics, parity_distribution, rolling_entropy, summarize, transition_matrix,
};
use tinka_core::AnalyticsError;

use crate::display::{
    display_entropy, display_gaps, display_import_summary, display_markov, display_pairs, display_parity,
    display_payout, display_simulation, display_summary,
};

#[derive(Parser)]
#[command(name = "tinka", about = "Analyse statistique et simulation de jugadas Tinka 6/50")]
struct Cli {
    /// Fichier CSV des sorteos (Sorteo, Fecha, Bolillas)
    #[arg(short, long, global = true, default_value = "data/tinka_data.csv")]
    file: PathBuf,

    /// Configuration JSON (valeurs par défaut sinon)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Garder les sorteos antérieurs au format actuel
    #[arg(long, global = true)]
    all_eras: bool,

    /// Séparateur du CSV
    #[arg(short, long, global = true, default_value = ",")]
    delimiter: char,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Panel de contrôle : volume, entropie, dernier sorteo
    Summary,

    /// Pression statistique par numéro (retards et z-scores)
    Gaps {
        /// Nombre de numéros affichés
        #[arg(short, long, default_value = "15")]
        top: usize,
    },

    /// Entropie de Shannon sur fenêtre glissante
    Entropy {
        /// Taille de la fenêtre (défaut : configuration)
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Matrice de transition entre états de somme
    Markov,

    /// Paires de numéros les plus fréquentes
    Pairs {
        /// Nombre de paires affichées
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Distribution pairs / impairs
    Parity,

    /// Gains en cascade d'une jugada multiple
    Payout {
        /// Nombre de numéros joués (6-15)
        #[arg(short, long)]
        played: usize,

        /// Nombre d'aciertos
        #[arg(short, long)]
        matches: usize,
    },

    /// Simulation Monte Carlo d'une jugada
    Simulate {
        /// Numéros joués (6 à 15 numéros entre 1 et 50)
        #[arg(short = 'n', long, num_args = 1.., required = true)]
        numbers: Vec<u8>,

        /// Nombre de sorteos simulés (défaut : configuration)
        #[arg(short, long)]
        simulations: Option<u64>,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Écrire la configuration par défaut dans un fichier JSON
    InitConfig {
        /// Fichier de sortie
        #[arg(short, long, default_value = "tinka_config.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("Configuration {:?}", path))?,
        None => AnalyticsConfig::default(),
    };

    match cli.command {
        Command::Summary => cmd_summary(&cli.file, &config, cli.all_eras, cli.delimiter),
        Command::Gaps { top } => {
            let table = load_table(&cli.file, &config, cli.all_eras, cli.delimiter)?;
            display_gaps(&gap_metrics(&table.observations()), top);
            Ok(())
        }
        Command::Entropy { window } => {
            let table = load_table(&cli.file, &config, cli.all_eras, cli.delimiter)?;
            let window = window.unwrap_or(config.entropy_window);
            let windows: Vec<_> = rolling_entropy(&table.draws, window).collect();
            display_entropy(&windows, window);
            Ok(())
        }
        Command::Markov => {
            let table = load_table(&cli.file, &config, cli.all_eras, cli.delimiter)?;
            display_markov(&transition_matrix(&table.draws, &config.sum_buckets));
            Ok(())
        }
        Command::Pairs { top } => {
            let table = load_table(&cli.file, &config, cli.all_eras, cli.delimiter)?;
            display_pairs(&cooccurrence_matrix(&table.draws).top_pairs(top));
            Ok(())
        }
        Command::Parity => {
            let table = load_table(&cli.file, &config, cli.all_eras, cli.delimiter)?;
            display_parity(&parity_distribution(&table.draws));
            Ok(())
        }
        Command::Payout { played, matches } => cmd_payout(&config, played, matches),
        Command::Simulate {
            numbers,
            simulations,
            seed,
        } => cmd_simulate(config, &numbers, simulations, seed),
        Command::InitConfig { output } => {
            save_config(&config, &output).with_context(|| format!("Écriture de {:?}", output))?;
            println!("Configuration écrite dans {}", output.display());
            Ok(())
        }
    }
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter).with_context(|| format!("Séparateur non ASCII : {:?}", delimiter))
}

fn read_table(file: &Path, config: &AnalyticsConfig, all_eras: bool, delimiter: char) -> Result<(import::ImportResult, DrawTable)> {
    let result = import::read_draws(file, delimiter_byte(delimiter)?)?;
    let table = build_draw_table(&result.rows);
    let table = if all_eras {
        table
    } else {
        filter_era(&table, config.era_start)
    };
    if table.is_empty() {
        return Err(AnalyticsError::DataUnavailable(format!(
            "aucun sorteo exploitable dans {}",
            file.display()
        )))
        .context("Lancez avec --all-eras ou vérifiez le fichier CSV");
    }
    log::info!("{} sorteos retenus depuis {:?}", table.len(), file);
    Ok((result, table))
}

fn load_table(file: &Path, config: &AnalyticsConfig, all_eras: bool, delimiter: char) -> Result<DrawTable> {
    read_table(file, config, all_eras, delimiter).map(|(_, table)| table)
}

fn cmd_summary(file: &Path, config: &AnalyticsConfig, all_eras: bool, delimiter: char) -> Result<()> {
    let (result, table) = read_table(file, config, all_eras, delimiter)?;
    display_import_summary(&result, &table);
    display_summary(&summarize(&table));
    Ok(())
}

fn cmd_payout(config: &AnalyticsConfig, played: usize, matches: usize) -> Result<()> {
    let breakdown = payout(played, matches, &config.prizes)?;
    let cost = config.cost_for(played)?;
    display_payout(played, matches, &breakdown, cost);
    let expected = expected_payout(played, &config.prizes)?;
    println!(
        "  {} combinaisons couvertes, espérance de gain par sorteo : S/ {:.4}",
        combinations(played),
        expected
    );
    Ok(())
}

fn cmd_simulate(config: AnalyticsConfig, numbers: &[u8], simulations: Option<u64>, seed: Option<u64>) -> Result<()> {
    let selection = Selection::new(numbers)?;
    let simulations = simulations.unwrap_or(config.default_simulations);
    let simulator = Simulator::new(config)?;

    let pb = ProgressBar::new(simulations);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .context("Style de barre de progression")?
        .progress_chars("=> "),
    );

    let progress = |n: u64| pb.inc(n);
    let control = RunControl {
        cancel: None,
        progress: Some(&progress as &(dyn Fn(u64) + Sync)),
    };
    let result = simulator.run_with(&selection, simulations, seed, control)?;
    pb.finish_and_clear();

    let theory = hypergeometric(selection.len());
    display_simulation(&result, selection.numbers(), &theory);
    Ok(())
}
