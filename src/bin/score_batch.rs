//! Score a batch of palm tree records
//!
//! Reads a CSV field sheet (or falls back to the demo batch), classifies every
//! tree, clusters the batch, and prints block and cluster summaries.
//!
//! Run with: cargo run --release --bin score_batch -- --input data/sample_data.csv

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use palm_health_rust::data::{attach_clusters, attach_scores, read_csv, records_from_frame, records_to_frame, write_csv};
use palm_health_rust::rules::presets;
use palm_health_rust::{
    advise_group, cluster, demo_batch, summarize_batch, summarize_by_block, summarize_by_rank,
    BatchSummary, ClusterProfile, ClusterRank, EngineConfig, GroupSummary, HealthLabel,
};

#[derive(Parser, Debug)]
#[command(name = "score_batch", about = "Classify and cluster palm tree records")]
struct Args {
    /// CSV field sheet; the built-in demo batch is used when omitted
    #[arg(short, long, env = "PALM_INPUT")]
    input: Option<PathBuf>,

    /// Engine configuration JSON (rule table + clustering)
    #[arg(short, long, env = "PALM_CONFIG")]
    config: Option<PathBuf>,

    /// Built-in rule table, overrides the config file's table
    #[arg(long, value_parser = ["canonical", "field_survey"])]
    preset: Option<String>,

    /// Clustering seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of clusters
    #[arg(short, long)]
    k: Option<usize>,

    /// Write the input table with health and cluster columns to this CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a JSON report instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    table: &'a str,
    max_score: u32,
    batch: BatchSummary,
    blocks: BTreeMap<String, GroupSummary>,
    clusters: Option<BTreeMap<ClusterRank, GroupSummary>>,
    profiles: Option<&'a [ClusterProfile]>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(name) = &args.preset {
        config.rules = presets::by_name(name)
            .with_context(|| format!("Unknown rule preset '{}'", name))?;
    }
    if let Some(seed) = args.seed {
        config.clustering.seed = seed;
    }
    if let Some(k) = args.k {
        config.clustering.k = k;
    }
    let classifier = config.classifier()?;

    let mut df = match &args.input {
        Some(path) => {
            info!("Loading field sheet: {:?}", path);
            read_csv(path)?
        }
        None => {
            info!("No input given - using the 100-tree demo batch");
            records_to_frame(&demo_batch())?
        }
    };

    let records = records_from_frame(&df)?;
    info!("Loaded {} trees", records.len());

    let scores = classifier.score_batch(&records)?;
    let labels: Vec<HealthLabel> = scores.iter().map(|s| s.label).collect();
    attach_scores(&mut df, &scores)?;

    let clustering = match cluster(&records, &config.clustering) {
        Ok(result) => {
            attach_clusters(&mut df, &result)?;
            Some(result)
        }
        Err(e) => {
            warn!("Clustering skipped: {}", e);
            None
        }
    };

    let batch = summarize_batch(&records, &labels)?;
    let blocks = summarize_by_block(&records, &labels)?;
    let by_rank = clustering
        .as_ref()
        .map(|c| summarize_by_rank(&records, &labels, c))
        .transpose()?;

    if args.json {
        let report = Report {
            table: &classifier.table().name,
            max_score: classifier.max_score(),
            batch,
            blocks,
            clusters: by_rank,
            profiles: clustering.as_ref().map(|c| c.profiles.as_slice()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\nRule table: {} (max score {})", classifier.table().name, classifier.max_score());
        println!("Trees: {}", batch.total_trees);
        for label in HealthLabel::ALL {
            println!(
                "  {:<7} {:>4} ({:.1}%)",
                label.display_text(),
                batch.distribution.count(label),
                batch.distribution.percent(label)
            );
        }
        println!("  Diseased {:>3} ({:.1}%)", batch.diseased, batch.diseased_percent());

        println!("\nField blocks:");
        print_groups(blocks.iter().map(|(k, g)| (k.clone(), g)));

        if let (Some(result), Some(by_rank)) = (&clustering, &by_rank) {
            println!(
                "\nK-Means clusters (k={}, seed={}, inertia {:.3}, {} iterations):",
                config.clustering.k, config.clustering.seed, result.inertia, result.n_iter
            );
            print_groups(by_rank.iter().map(|(rank, g)| (rank.to_string(), g)));

            println!("\nRecommendations:");
            for (rank, group) in by_rank {
                let cards = advise_group(rank.display_text(), group, &classifier)?;
                if cards.is_empty() {
                    println!("  {}: maintain current practice", rank);
                }
                for card in cards {
                    println!("  {} [{:?}] {} - {}", rank, card.severity, card.message, card.advice);
                }
            }
        }
        println!();
    }

    if let Some(path) = &args.output {
        write_csv(&mut df, path)?;
        info!("Wrote {:?}", path);
    }

    Ok(())
}

fn print_groups<'a>(groups: impl Iterator<Item = (String, &'a GroupSummary)>) {
    println!(
        "  {:<16} {:>5} {:>6} {:>9} {:>8} {:>9} {:>5} {:>6} {:>5}",
        "group", "trees", "pH", "moisture", "bunches", "weight", "good", "medium", "poor"
    );
    for (name, g) in groups {
        println!(
            "  {:<16} {:>5} {:>6.2} {:>8.1}% {:>8.1} {:>9.1} {:>5} {:>6} {:>5}",
            name,
            g.trees,
            g.mean_soil_ph,
            g.mean_moisture_pct,
            g.mean_bunch_count,
            g.mean_bunch_weight_kg,
            g.distribution.good,
            g.distribution.medium,
            g.distribution.poor
        );
    }
}
