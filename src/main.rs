mod dataset;
mod ratings;

use anyhow::{anyhow, Result};
use dotenv::dotenv;
use env_logger::Builder;
use lazy_static::lazy_static;
use log::LevelFilter;
use ratings::recommender::{most_similar, recommend, top, Neighbour, Ranking, DEFAULT_TOP_N};
use ratings::similarity::Metric;
use ratings::store::RatingStore;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

#[macro_use]
extern crate log;

lazy_static! {
    static ref PIVOT: bool = std::env::var("PIVOT")
        .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "off"))
        .unwrap_or(true);
}

fn main() {
    // read .env
    dotenv().ok();

    init_logger();

    if let Err(e) = run() {
        eprintln!("[ERROR] {:#}", e);
        std::process::exit(1);
    }
}

fn init_logger() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_default();

    if log_level == "debug" {
        Builder::new()
            .filter(None, LevelFilter::Off)
            .filter(Some("affinity::ratings"), LevelFilter::Debug)
            .filter(Some("affinity"), LevelFilter::Debug)
            .init();
    } else if log_level == "info" {
        Builder::new()
            .filter(None, LevelFilter::Off)
            .filter(Some("affinity::ratings"), LevelFilter::Info)
            .filter(Some("affinity"), LevelFilter::Info)
            .init();
    } else {
        env_logger::init();
    }
}

fn run() -> Result<()> {
    let path = input_path(std::env::args_os())?;

    let store = dataset::load(&path)?;
    if store.is_empty() {
        warn!("{} holds no ratings", path.display());
    }
    let store = if *PIVOT {
        info!("pivot to item-based ratings");
        store.transpose()
    } else {
        store
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report(&store, &mut out)?;

    Ok(())
}

/// The ratings document path: the first argument after the program name.
fn input_path(mut args: impl Iterator<Item = OsString>) -> Result<PathBuf> {
    args.nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: affinity <ratings.json>"))
}

/// Per entity: its recommendations under each metric, then per entity its
/// raw pearson score sequence followed by its closest neighbours.
fn report(store: &RatingStore, out: &mut impl Write) -> std::io::Result<()> {
    let entities = store.entities();

    for entity in entities.iter() {
        writeln!(out, "{}", entity)?;
        for metric in Metric::ALL {
            let ranking = recommend(store, entity, metric);
            debug!("{} {}: {} attributes", entity, metric, ranking.len());
            writeln!(out, "  {}: {}", metric, format_ranking(&ranking))?;
        }
    }

    for entity in entities.iter() {
        let scores = top(store, entity, DEFAULT_TOP_N, Metric::Pearson);
        writeln!(out, "{} {:?}", entity, scores)?;
        let nearest = most_similar(store, entity, DEFAULT_TOP_N, Metric::Pearson);
        writeln!(out, "  nearest: {}", format_neighbours(&nearest))?;
    }

    Ok(())
}

fn format_ranking(ranking: &Ranking) -> String {
    if ranking.is_empty() {
        return "{}".to_string();
    }
    let pairs = ranking
        .ranked()
        .into_iter()
        .map(|(attribute, score)| format!("{}: {:.4}", attribute, score))
        .collect::<Vec<_>>();
    format!("{{{}}}", pairs.join(", "))
}

fn format_neighbours(neighbours: &[Neighbour]) -> String {
    let pairs = neighbours
        .iter()
        .map(|n| format!("{}: {:.4}", n.entity, n.similarity))
        .collect::<Vec<_>>();
    format!("[{}]", pairs.join(", "))
}
