use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::fasta::{read_records, read_sequences};
use crate::interval::{parse_position, Region};
use crate::table::Table;

pub const METADATA_FILE: &str = "input_metadata.tsv";
pub const METADATA_HEADER: [&str; 5] = ["file", "miRNA", "Contig", "Start", "End"];
pub const PREPARED_MARKER: &str = ".inputs_prepared";

/// One RNAup input per binding site: the miRNA and the extended window
/// holding the site, joined with `&`.
pub struct CLI {
    pub results: String,
    pub mirna_fasta: String,
    pub windows_fasta: String,
    pub out_dir: String,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let results = Table::from_file(&self.results)?;
        let mirnas = read_sequences(&self.mirna_fasta)?;
        let windows = read_windows(&self.windows_fasta)?;

        let metadata = write_inputs(&results, &mirnas, &windows, Path::new(&self.out_dir))?;
        metadata.to_file(Path::new(&self.out_dir).join(METADATA_FILE))?;
        std::fs::File::create(Path::new(&self.out_dir).join(PREPARED_MARKER))?;
        info!("Wrote {} RNAup inputs to {:?}", metadata.len(), self.out_dir);
        Ok(())
    }
}

/// Window records in file order, each with its header parsed as a region.
pub fn read_windows<P: AsRef<Path>>(filename: P) -> Result<Vec<(Region, Vec<u8>)>> {
    let mut windows = Vec::new();
    for rec in read_records(filename)? {
        match Region::from_header(rec.id()) {
            Ok(region) => windows.push((region, rec.seq().to_vec())),
            Err(e) => warn!("Skipping window {}: {}", rec.id(), e),
        }
    }
    Ok(windows)
}

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

pub fn input_id(mirna: &str, contig: &str, start: u64, end: u64) -> String {
    format!("{}_{}_{}_{}", mirna, safe_name(contig), start, end)
}

/// Writes one `<id>.fa` per result row into `out_dir` and returns the
/// metadata table describing them.
pub fn write_inputs(
    results: &Table,
    mirnas: &HashMap<String, Vec<u8>>,
    windows: &[(Region, Vec<u8>)],
    out_dir: &Path,
) -> Result<Table> {
    let cols = results.columns(&["Start", "End", "Contig", "miRNA"])?;
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {:?}", out_dir))?;

    let mut metadata = Table::new(&METADATA_HEADER);
    for row in results.rows().iter() {
        let contig = &row[cols[2]];
        let mirna = &row[cols[3]];
        let (start, end) = match (parse_position(&row[cols[0]]), parse_position(&row[cols[1]])) {
            (Some(s), Some(e)) => (s, e),
            _ => continue,
        };

        let mirna_seq = match mirnas.get(mirna.as_str()) {
            Some(seq) => seq,
            None => {
                warn!("miRNA not found: {}", mirna);
                continue;
            }
        };
        let target_seq = match windows.iter().find(|(w, _)| w.covers(contig, start, end)) {
            Some((_, seq)) => seq,
            None => {
                warn!("No matching window found for {}:{}-{}", contig, start, end);
                continue;
            }
        };

        let id = input_id(mirna, contig, start, end);
        let file_name = format!("{}.fa", id);
        let text = format!(
            ">{}\n{}&{}\n",
            id,
            String::from_utf8_lossy(mirna_seq),
            String::from_utf8_lossy(target_seq)
        );
        let path = out_dir.join(&file_name);
        std::fs::write(&path, text).with_context(|| format!("writing {:?}", path))?;

        metadata.push(vec![file_name, mirna.clone(), contig.clone(), start.to_string(), end.to_string()])?;
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_contig_names() {
        assert_eq!(safe_name("gnl|X|ABC_1"), "gnl_X_ABC_1");
        assert_eq!(input_id("mir-1", "gnl|X|c.2", 10, 30), "mir-1_gnl_X_c_2_10_30");
    }

    #[test]
    fn inputs_for_covered_sites() {
        let dir = tempfile::tempdir().unwrap();
        let results = Table::read(
            "MAG\tContig\tStart\tEnd\tmiRNA
M1\tgnl|X|c1\t900\t920\tmir-1
M1\tgnl|X|c1\t2000\t2020\tmir-1
M1\tgnl|X|c1\t900\t920\tmir-9
"
            .as_bytes(),
        )
        .unwrap();
        let mut mirnas = HashMap::new();
        mirnas.insert("mir-1".to_string(), b"UAGCUUAUCAGACUGAUGUUGA".to_vec());
        let windows = vec![
            (Region::from_header("gnl|X|c0:760-1061").unwrap(), b"TTTT".to_vec()),
            (Region::from_header("gnl|X|c1:760-1061").unwrap(), b"ACGT".to_vec()),
        ];

        let out = dir.path().join("rnaup");
        let metadata = write_inputs(&results, &mirnas, &windows, &out).unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.rows()[0][0], "mir-1_gnl_X_c1_900_920.fa");

        let text = std::fs::read_to_string(out.join("mir-1_gnl_X_c1_900_920.fa")).unwrap();
        assert_eq!(text, ">mir-1_gnl_X_c1_900_920\nUAGCUUAUCAGACUGAUGUUGA&ACGT\n");
    }
}
