use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use serde::Serialize;

use crate::app::{AppContext, Result};
use crate::domain::ExtractedValue;
use crate::store::Store;

#[derive(Debug, Serialize)]
struct WeightRow<'a> {
    id: &'a str,
    weight_kg: Option<f64>,
    strategy: Option<&'static str>,
}

/// Read identifiers one per line. Blank lines are kept so output rows line
/// up with input rows.
pub fn read_identifiers<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for line in reader.lines() {
        ids.push(line?.trim().to_string());
    }
    Ok(ids)
}

fn load_identifiers(ids: Vec<String>, input: Option<&Path>) -> Result<Vec<String>> {
    let mut all: Vec<String> = ids.into_iter().map(|id| id.trim().to_string()).collect();

    match input {
        Some(path) if path == Path::new("-") => {
            all.extend(read_identifiers(io::stdin().lock())?);
        }
        Some(path) => {
            let file = std::fs::File::open(path)?;
            all.extend(read_identifiers(BufReader::new(file))?);
        }
        None => {}
    }

    Ok(all)
}

/// Render results as `id<TAB>weight` lines, `-` marking a missing weight.
pub fn format_lines(ids: &[String], results: &[Option<ExtractedValue>]) -> String {
    let mut out = String::new();
    for (id, value) in ids.iter().zip(results) {
        match value {
            Some(v) => out.push_str(&format!("{}\t{}\n", id, v.value)),
            None => out.push_str(&format!("{}\t-\n", id)),
        }
    }
    out
}

pub fn format_json(ids: &[String], results: &[Option<ExtractedValue>]) -> Result<String> {
    let rows: Vec<WeightRow<'_>> = ids
        .iter()
        .zip(results)
        .map(|(id, value)| WeightRow {
            id,
            weight_kg: value.map(|v| v.value),
            strategy: value.map(|v| v.strategy.as_str()),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub async fn enrich(
    ctx: &AppContext,
    ids: Vec<String>,
    input: Option<&Path>,
    json: bool,
    no_store: bool,
) -> Result<()> {
    let ids = load_identifiers(ids, input)?;

    if ids.is_empty() {
        eprintln!("No identifiers given");
        return Ok(());
    }

    let results = ctx.enrich(&ids, !no_store).await?;

    let rendered = if json {
        let mut s = format_json(&ids, &results)?;
        s.push('\n');
        s
    } else {
        format_lines(&ids, &results)
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;

    let found = results.iter().filter(|v| v.is_some()).count();
    eprintln!("Resolved {} of {} identifiers", found, ids.len());
    Ok(())
}

pub async fn get(ctx: &AppContext, id: &str) -> Result<()> {
    let ids = vec![id.trim().to_string()];
    let results = ctx.enrich(&ids, true).await?;

    match results.first().copied().flatten() {
        Some(v) => println!("{}\t{}\t{}", ids[0], v.value, v.strategy),
        None => println!("{}\t-", ids[0]),
    }
    Ok(())
}

pub fn list_stored(ctx: &AppContext) -> Result<()> {
    let weights = ctx.store.get_all_weights()?;

    if weights.is_empty() {
        println!("No stored weights");
        return Ok(());
    }

    for weight in weights {
        println!(
            "{}\t{}\t{}",
            weight.identifier,
            weight.display_value(),
            weight.fetched_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

pub fn forget(ctx: &AppContext, id: Option<&str>) -> Result<()> {
    match id {
        Some(id) => {
            if ctx.store.delete_weight(id)? {
                println!("Forgot {}", id);
            } else {
                println!("Not stored: {}", id);
            }
        }
        None => {
            let removed = ctx.store.delete_all_weights()?;
            println!("Forgot {} stored weights", removed);
        }
    }
    Ok(())
}
