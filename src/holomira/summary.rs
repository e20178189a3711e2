use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use itertools::Itertools;
use log::info;

use crate::layout::OutDir;
use crate::table::Table;

pub const MAG_SUMMARY_HEADER: [&str; 7] = [
    "MAG", "num_Taxonomy", "Taxonomy", "num_unique_miRNAs", "num_unique_genes", "unique_miRNAs", "unique_genes",
];

pub const MIRNA_SUMMARY_HEADER: [&str; 7] = [
    "miRNA", "num_unique_Taxa", "num_unique_MAG", "num_unique_genes", "unique_Taxa", "unique_MAG", "unique_genes",
];

pub fn mag_summary_file(out: &OutDir, env: &str) -> PathBuf {
    out.final_results().join(format!("MAG_result_table_summary_taxonomy_{}.tsv", env))
}

pub fn mirna_summary_file(out: &OutDir, env: &str) -> PathBuf {
    out.final_results().join(format!("MAG_result_table_summary_miRNA_{}.tsv", env))
}

/// Per-environment summaries of the results by MAG and by miRNA.
pub struct CLI {
    pub results: String,
    pub out_dir: String,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        let results = Table::from_file(&self.results)?;
        std::fs::create_dir_all(out.final_results())?;

        for env in results.distinct("Environment")?.iter().filter(|e| !e.is_empty()) {
            let (by_mag, by_mirna) = summary_tables(&results, env)?;
            by_mag.to_file(mag_summary_file(&out, env))?;
            by_mirna.to_file(mirna_summary_file(&out, env))?;
            info!("{}: {} MAGs, {} miRNAs", env, by_mag.len(), by_mirna.len());
        }
        Ok(())
    }
}

/// Distinct non-empty values of `col` in first-seen order.
fn unique_values<'a>(rows: &[&'a Vec<String>], col: usize) -> Vec<&'a str> {
    rows.iter()
        .map(|r| r[col].as_str())
        .filter(|v| !v.is_empty())
        .unique()
        .collect()
}

/// Rows of `env` grouped by the value in `key_col`, keys sorted.
fn group_rows<'a>(
    results: &'a Table,
    env_col: usize,
    env: &str,
    key_col: usize,
) -> BTreeMap<&'a str, Vec<&'a Vec<String>>> {
    let mut groups: BTreeMap<&str, Vec<&Vec<String>>> = BTreeMap::new();
    for row in results.rows().iter().filter(|r| r[env_col] == env) {
        if !row[key_col].is_empty() {
            groups.entry(row[key_col].as_str()).or_default().push(row);
        }
    }
    groups
}

pub fn summary_tables(results: &Table, env: &str) -> Result<(Table, Table)> {
    let cols = results.columns(&["Environment", "MAG", "miRNA", "Taxonomy", "Gene"])?;
    let (env_col, mag_col, mirna_col, tax_col, gene_col) = (cols[0], cols[1], cols[2], cols[3], cols[4]);

    let mut by_mag = Table::new(&MAG_SUMMARY_HEADER);
    for (mag, rows) in group_rows(results, env_col, env, mag_col) {
        let taxa = unique_values(&rows, tax_col);
        let mirnas = unique_values(&rows, mirna_col);
        let genes = unique_values(&rows, gene_col);
        by_mag.push(vec![
            mag.to_string(),
            taxa.len().to_string(),
            taxa.iter().join(", "),
            mirnas.len().to_string(),
            genes.len().to_string(),
            mirnas.iter().join(", "),
            genes.iter().join(", "),
        ])?;
    }

    let mut by_mirna = Table::new(&MIRNA_SUMMARY_HEADER);
    for (mirna, rows) in group_rows(results, env_col, env, mirna_col) {
        let taxa = unique_values(&rows, tax_col);
        let mags = unique_values(&rows, mag_col);
        let genes = unique_values(&rows, gene_col);
        by_mirna.push(vec![
            mirna.to_string(),
            taxa.len().to_string(),
            mags.len().to_string(),
            genes.len().to_string(),
            taxa.iter().join(", "),
            mags.iter().join(", "),
            genes.iter().join(", "),
        ])?;
    }

    Ok((by_mag, by_mirna))
}
