use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bio::io::fasta;
use log::warn;

pub fn read_records<P: AsRef<Path>>(filename: P) -> Result<Vec<fasta::Record>> {
    let reader = fasta::Reader::from_file(filename.as_ref())
        .with_context(|| format!("opening FASTA {:?}", filename.as_ref()))?;
    let mut records = Vec::new();
    for rec_res in reader.records() {
        records.push(rec_res.with_context(|| format!("reading FASTA {:?}", filename.as_ref()))?);
    }
    Ok(records)
}

/// Sequences keyed by record id.
pub fn read_sequences<P: AsRef<Path>>(filename: P) -> Result<HashMap<String, Vec<u8>>> {
    Ok(read_records(filename)?
        .into_iter()
        .map(|rec| (rec.id().to_string(), rec.seq().to_vec()))
        .collect())
}

/// Counts from merging FASTA files without repeating a header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    pub written: usize,
    pub duplicates: usize,
}

/// Writes every record of `inputs` to `output`, keeping only the first
/// record seen for each header. Inputs that do not exist are skipped.
pub fn merge_unique<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<MergeCounts> {
    let file = std::fs::File::create(output.as_ref())
        .with_context(|| format!("creating {:?}", output.as_ref()))?;
    let mut writer = fasta::Writer::new(file);
    let mut seen = HashSet::new();
    let mut counts = MergeCounts::default();

    for input in inputs.iter() {
        if !input.as_ref().exists() {
            continue;
        }
        for rec in read_records(input)? {
            if seen.insert(rec.id().to_string()) {
                writer.write_record(&rec)?;
                counts.written += 1;
            } else {
                warn!("Duplicate sequence skipped in {:?}: {}", output.as_ref(), rec.id());
                counts.duplicates += 1;
            }
        }
    }

    writer.flush()?;
    Ok(counts)
}

/// Maps each sequence name (first word of the header) to the first file
/// in `fasta_files` that contains it.
pub fn contig_index(fasta_files: &[PathBuf]) -> Result<HashMap<String, PathBuf>> {
    let mut index = HashMap::new();
    for fasta_file in fasta_files.iter() {
        let file = std::fs::File::open(fasta_file)
            .with_context(|| format!("opening FASTA {:?}", fasta_file))?;
        for line_res in BufReader::new(file).lines() {
            let line = line_res?;
            if let Some(header) = line.strip_prefix('>') {
                if let Some(name) = header.split_whitespace().next() {
                    index.entry(name.to_string()).or_insert_with(|| fasta_file.clone());
                }
            }
        }
    }
    Ok(index)
}

pub fn write_records<W: Write>(out: W, records: &[fasta::Record]) -> Result<()> {
    let mut writer = fasta::Writer::new(out);
    for rec in records.iter() {
        writer.write_record(rec)?;
    }
    writer.flush()?;
    Ok(())
}
