use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as FmtWrite;
use std::hash::Hash;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::bedtools::IntervalExtractor;
use crate::config::Settings;
use crate::fasta::{merge_unique, read_records, write_records};
use crate::interval::{parse_position, Region};
use crate::layout::{subdir_names, OutDir};
use crate::table::Table;

pub const DONE_FILE: &str = "temp_merged_affected_cds.fasta";

/// Gene targeted by a miRNA, in 1-based inclusive coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneLocus {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl GeneLocus {
    pub fn bed_line(&self) -> String {
        format!("{}\t{}\t{}", self.contig, self.start - 1, self.end)
    }

    pub fn contigs_line(&self) -> String {
        format!("{} {} {}", self.contig, self.start, self.end)
    }
}

/// Groups in first-seen key order, each holding distinct values in
/// first-seen order.
#[derive(Debug, Clone)]
pub struct Groups<K, V> {
    groups: Vec<(K, Vec<V>)>,
    index: HashMap<K, (usize, HashSet<V>)>,
}

impl<K, V> Default for Groups<K, V> {
    fn default() -> Self {
        Groups { groups: Vec::new(), index: HashMap::new() }
    }
}

impl<K: Hash + Eq + Clone, V: Hash + Eq + Clone> Groups<K, V> {
    pub fn insert(&mut self, key: K, value: V) {
        let (idx, seen) = match self.index.entry(key) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                self.groups.push((e.key().clone(), Vec::new()));
                e.insert((self.groups.len() - 1, HashSet::new()))
            }
        };
        if seen.insert(value.clone()) {
            self.groups[*idx].1.push(value);
        }
    }

    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.index.get(key).map(|(idx, _)| self.groups[*idx].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.groups.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Targeted loci grouped by (environment, MAG) and by (miRNA, environment).
#[derive(Debug, Clone, Default)]
pub struct ImpactedLoci {
    pub by_env_mag: Groups<(String, String), GeneLocus>,
    pub by_mirna_env: Groups<(String, String), (String, GeneLocus)>,
}

impl ImpactedLoci {
    pub fn from_table(results: &Table) -> Result<Self> {
        let cols = results.columns(&["MAG", "Contig", "miRNA", "Gene_start", "Gene_end", "Environment"])?;
        let mut loci = ImpactedLoci::default();

        for (row_no, row) in results.rows().iter().enumerate() {
            let (start, end) = match (parse_position(&row[cols[3]]), parse_position(&row[cols[4]])) {
                (Some(s), Some(e)) if s >= 1 => (s, e),
                _ => {
                    warn!(
                        "Row {} has invalid gene coordinates {:?}-{:?}, skipping",
                        row_no + 2,
                        row[cols[3]],
                        row[cols[4]]
                    );
                    continue;
                }
            };
            let locus = GeneLocus { contig: row[cols[1]].clone(), start, end };
            let mag = &row[cols[0]];
            let mirna = &row[cols[2]];
            let env = &row[cols[5]];

            loci.by_env_mag.insert((env.clone(), mag.clone()), locus.clone());
            loci.by_mirna_env.insert((mirna.clone(), env.clone()), (mag.clone(), locus));
        }

        Ok(loci)
    }

    /// Environments in which `mag` has targeted loci.
    pub fn mag_environments<'a>(&'a self, mag: &'a str) -> impl Iterator<Item = (&'a str, &'a [GeneLocus])> {
        self.by_env_mag
            .iter()
            .filter(move |((_, m), _)| m == mag)
            .map(|((env, _), loci)| (env.as_str(), loci))
    }
}

/// Sequences of the genes targeted in each environment, gathered per MAG
/// and per miRNA.
pub struct CLI {
    pub results: String,
    pub out_dir: String,
    pub settings: Settings,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        self.run_with(&self.settings.extractor())
    }

    pub fn run_with<E: IntervalExtractor>(&self, extractor: &E) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        std::fs::create_dir_all(out.function())?;

        info!("Reading {:?}", self.results);
        let loci = ImpactedLoci::from_table(&Table::from_file(&self.results)?)?;

        for mag in out.mag_names()? {
            if !out.mag_file(&mag, "_cds.gff").exists() {
                warn!("No CDS annotation for {}, skipping", mag);
                continue;
            }
            for (env, mag_loci) in loci.mag_environments(&mag) {
                if let Err(e) = extract_mag_loci(&out, extractor, &mag, env, mag_loci) {
                    warn!("Extracting targeted genes of {} in {} failed: {:#}", mag, env, e);
                }
            }
        }

        for ((mirna, env), mirna_loci) in loci.by_mirna_env.iter() {
            let n = collect_mirna_loci(&out, mirna, env, mirna_loci, self.settings.tolerance())?;
            info!("{} in {}: {} targeted gene sequences", mirna, env, n);
        }

        remove_temp_files(&out)?;
        std::fs::write(out.function().join(DONE_FILE), "Done!\n")?;
        Ok(())
    }
}

pub fn merged_mag_fasta(out: &OutDir, mag: &str, env: &str) -> std::path::PathBuf {
    out.mag_env_dir(env).join(format!("merged_{}_{}.fasta", mag, env))
}

pub fn merged_mirna_fasta(out: &OutDir, mirna: &str, env: &str) -> std::path::PathBuf {
    out.mirna_env_dir(env).join(format!("merged_miRNA_{}_{}.fasta", mirna, env))
}

fn write_lines<P: AsRef<Path>, I: Iterator<Item = String>>(path: P, lines: I) -> Result<()> {
    let mut text = String::new();
    for line in lines {
        writeln!(text, "{}", line)?;
    }
    std::fs::write(path.as_ref(), text).with_context(|| format!("writing {:?}", path.as_ref()))
}

fn extract_mag_loci<E: IntervalExtractor>(
    out: &OutDir,
    extractor: &E,
    mag: &str,
    env: &str,
    loci: &[GeneLocus],
) -> Result<()> {
    let env_dir = out.mag_env_dir(env);
    std::fs::create_dir_all(&env_dir)?;

    let bed = env_dir.join(format!("temp_{}_{}.bed", mag, env));
    write_lines(&bed, loci.iter().map(GeneLocus::bed_line))?;
    write_lines(
        env_dir.join(format!("contigs_for_{}.txt", mag)),
        loci.iter().map(GeneLocus::contigs_line),
    )?;

    let extracted = env_dir.join(format!("temp_{}_affected_cds.fasta", mag));
    extractor.get_fasta(&out.mag_file(mag, ".fna"), &bed, &extracted, false)?;

    let counts = merge_unique(&[&extracted], merged_mag_fasta(out, mag, env))?;
    info!("{} in {}: {} gene sequences, {} duplicates", mag, env, counts.written, counts.duplicates);
    Ok(())
}

/// Writes the loci of one miRNA and the matching gene sequences from the
/// merged FASTA of each contributing MAG. Returns the number of sequences.
fn collect_mirna_loci(
    out: &OutDir,
    mirna: &str,
    env: &str,
    loci: &[(String, GeneLocus)],
    tol: u64,
) -> Result<usize> {
    let env_dir = out.mirna_env_dir(env);
    std::fs::create_dir_all(&env_dir)?;
    write_lines(
        env_dir.join(format!("contigs_for_{}.txt", mirna)),
        loci.iter().map(|(_, l)| l.contigs_line()),
    )?;

    let mut mags: Vec<&str> = Vec::new();
    for (mag, _) in loci.iter() {
        if !mags.contains(&mag.as_str()) {
            mags.push(mag);
        }
    }

    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for mag in mags {
        let merged = merged_mag_fasta(out, mag, env);
        if !merged.exists() {
            continue;
        }
        for rec in read_records(&merged)? {
            let region = match Region::from_header(rec.id()) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let hit = loci
                .iter()
                .any(|(_, l)| region.matches(&l.contig, l.start, l.end, tol));
            if hit && seen.insert(rec.id().to_string()) {
                selected.push(rec);
            }
        }
    }

    if !selected.is_empty() {
        let file = std::fs::File::create(merged_mirna_fasta(out, mirna, env))?;
        write_records(file, &selected)?;
    }
    Ok(selected.len())
}

/// Removes the `temp_*.fasta` and `temp_*.bed` files under `function/*/`
/// and `temp_*.gff` under `annotation/*/`.
fn remove_temp_files(out: &OutDir) -> Result<()> {
    const FUNCTION_TEMP: &[&str] = &[".fasta", ".bed"];
    const ANNOTATION_TEMP: &[&str] = &[".gff"];

    for (base, suffixes) in [(out.function(), FUNCTION_TEMP), (out.annotation(), ANNOTATION_TEMP)] {
        for sub in subdir_names(&base)? {
            for entry_res in std::fs::read_dir(base.join(&sub))? {
                let entry = entry_res?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with("temp_") && suffixes.iter().any(|s| name.ends_with(s)) {
                    std::fs::remove_file(entry.path())
                        .with_context(|| format!("removing {:?}", entry.path()))?;
                }
            }
        }
    }
    Ok(())
}
