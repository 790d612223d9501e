use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::benchmark::StartPose;

pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}"))
    } else {
        s.parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}"))
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

/// Parses `x,y` or `x,y,heading`.
pub fn parse_start(input: &str) -> Result<StartPose> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let number = |raw: &str| -> Result<f64> {
        let value = raw
            .parse::<f64>()
            .with_context(|| format!("invalid coordinate '{raw}' in start '{input}'"))?;
        if !value.is_finite() {
            return Err(anyhow!("non-finite coordinate in start '{input}'"));
        }
        Ok(value)
    };

    match parts.as_slice() {
        [x, y] => Ok(StartPose {
            x: number(x)?,
            y: number(y)?,
            heading_deg: 0.0,
        }),
        [x, y, heading] => Ok(StartPose {
            x: number(x)?,
            y: number(y)?,
            heading_deg: number(heading)?,
        }),
        _ => Err(anyhow!("start '{input}' must look like x,y or x,y,heading")),
    }
}

/// Semicolon-separated list of starts, e.g. `580,755;600,700,90`.
pub fn parse_start_list(input: &str) -> Result<Vec<StartPose>> {
    let mut starts = Vec::new();
    for token in input.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        starts.push(parse_start(token)?);
    }
    if starts.is_empty() {
        return Err(anyhow!("no starts parsed from --starts"));
    }
    Ok(starts)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(value).context("failed to serialize json")?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}
