//! Persisted solve files.
//!
//! Solves land under `solves/<YYYY>/wk<NN>/<TYPE>_<YYYYMMDD>_<HHMM>.json`
//! as UTF-8 JSON: the serialized solution plus a metadata block with the
//! solver identity, wall time, gap, and input hashes. A file is validated
//! before it is written and again when it is read back; a malformed
//! solution never reaches disk.

use crate::schema::{ModelType, OptimizationSolution};
use crate::validate::validate_solution;
use bnp_core::{PlanInputs, PlanResult};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Metadata stored alongside a persisted solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    pub solver_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver_version: Option<String>,
    pub wall_time_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mip_gap: Option<f64>,
    /// xxh3 hex digests of each input component.
    pub input_hashes: BTreeMap<String, String>,
    pub saved_at: NaiveDateTime,
}

/// A persisted solve: solution plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveFile {
    pub solution: OptimizationSolution,
    pub metadata: SolveMetadata,
}

fn hash_component<T: Serialize>(value: &T) -> PlanResult<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(format!("{:016x}", xxh3_64(&bytes)))
}

/// Hash every input component for the metadata block.
pub fn input_hashes(inputs: &PlanInputs) -> PlanResult<BTreeMap<String, String>> {
    let mut hashes = BTreeMap::new();
    let locations: Vec<_> = inputs.network.locations().collect();
    let legs: Vec<_> = inputs.network.legs().collect();
    hashes.insert("locations".into(), hash_component(&locations)?);
    hashes.insert("legs".into(), hash_component(&legs)?);
    hashes.insert("products".into(), hash_component(&inputs.products)?);
    hashes.insert("forecast".into(), hash_component(&inputs.forecast)?);
    hashes.insert("labor".into(), hash_component(&inputs.labor)?);
    hashes.insert("trucks".into(), hash_component(&inputs.trucks)?);
    hashes.insert("costs".into(), hash_component(&inputs.costs)?);
    hashes.insert(
        "initial_inventory".into(),
        hash_component(&inputs.initial_inventory)?,
    );
    Ok(hashes)
}

/// Relative path of a solve saved at `stamp`.
pub fn solve_path(root: &Path, model_type: ModelType, stamp: NaiveDateTime) -> PathBuf {
    root.join("solves")
        .join(format!("{}", stamp.year()))
        .join(format!("wk{:02}", stamp.iso_week().week()))
        .join(format!(
            "{}_{}.json",
            model_type.file_tag(),
            stamp.format("%Y%m%d_%H%M")
        ))
}

/// Validate and write a solve file; returns the path written.
pub fn save_solve(root: &Path, file: &SolveFile, stamp: NaiveDateTime) -> PlanResult<PathBuf> {
    validate_solution(&file.solution, None)?;
    let path = solve_path(root, file.solution.model_type, stamp);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Read a solve file back through the schema validator.
pub fn load_solve(path: &Path) -> PlanResult<SolveFile> {
    let text = std::fs::read_to_string(path)?;
    let file: SolveFile = serde_json::from_str(&text)?;
    validate_solution(&file.solution, None)?;
    Ok(file)
}
