//! One-shot commands: run a single directory operation and print it as JSON.

use anyhow::{Context, Result};
use incident_directory::{FilterCriteria, OrderingContext};
use serde::Serialize;

use crate::Directory;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

pub async fn stats_command(directory: &Directory, lang: &str) -> Result<()> {
    let stats = directory
        .facet_stats(lang)
        .await
        .with_context(|| format!("Failed to compute facet stats for {lang}"))?;
    print_json(&stats)
}

pub async fn random_command(directory: &Directory, lang: &str) -> Result<()> {
    match directory
        .random(lang)
        .await
        .with_context(|| format!("Failed to pick a random incident for {lang}"))?
    {
        Some(incident) => print_json(&incident),
        None => {
            eprintln!("No incidents in {lang}");
            Ok(())
        }
    }
}

pub async fn adjacent_command(
    directory: &Directory,
    slug: &str,
    lang: &str,
    search: FilterCriteria,
) -> Result<()> {
    let context = if search.has_facets() {
        OrderingContext::Search(search)
    } else {
        OrderingContext::Default
    };
    let adjacent = directory
        .adjacent(slug, lang, &context)
        .await
        .with_context(|| format!("Failed to find neighbors of {slug} ({})", context.name()))?;
    print_json(&adjacent)
}
