use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::bedtools::IntervalExtractor;
use crate::config::Settings;
use crate::fasta::{contig_index, merge_unique};
use crate::interval::parse_position;
use crate::layout::{files_with_suffix, output_filename};
use crate::table::Table;

/// A binding site widened symmetrically around its centre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteWindow {
    pub contig: String,
    pub target_id: String,
    pub start: u64,
    pub end: u64,
}

impl SiteWindow {
    pub fn new(contig: &str, target_id: &str, site_start: u64, site_end: u64, half_width: u64) -> Self {
        let centre = (site_start + site_end) / 2;
        SiteWindow {
            contig: contig.to_string(),
            target_id: target_id.to_string(),
            start: centre.saturating_sub(half_width).max(1),
            end: centre + half_width,
        }
    }

    pub fn gff_line(&self) -> String {
        format!(
            "{}\tRNAhybrid\ttarget_site\t{}\t{}\t.\t.\t.\tID={}",
            self.contig, self.start, self.end, self.target_id
        )
    }
}

/// Extended windows around every distinct binding site in a results
/// table, written as GFF and extracted from the genomes under a FASTA
/// directory.
pub struct CLI {
    pub results: String,
    pub fasta_dir: String,
    pub output_prefix: String,
    pub settings: Settings,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        self.run_with(&self.settings.extractor())
    }

    pub fn run_with<E: IntervalExtractor>(&self, extractor: &E) -> Result<()> {
        let results = Table::from_file(&self.results)?;
        let windows = site_windows(&results, self.settings.window())?;
        info!("{} distinct binding sites", windows.len());

        let gff_file = output_filename(&self.output_prefix, ".gff");
        if let Some(parent) = gff_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut gff_text = String::new();
        for window in windows.iter() {
            gff_text.push_str(&window.gff_line());
            gff_text.push('\n');
        }
        std::fs::write(&gff_file, gff_text).with_context(|| format!("writing {:?}", gff_file))?;

        let genomes = owning_genomes(Path::new(&self.fasta_dir), &windows)?;
        if genomes.is_empty() {
            warn!("No genome FASTA under {:?} holds any binding-site contig", self.fasta_dir);
            return Ok(());
        }

        let merged = output_filename(&self.output_prefix, "_merged.fna");
        let counts = merge_unique(&genomes, &merged)?;
        info!("Merged {} contigs from {} genomes into {:?}", counts.written, genomes.len(), merged);

        let windows_fa = output_filename(&self.output_prefix, ".fasta");
        extractor.get_fasta(&merged, &gff_file, &windows_fa, false)
    }
}

pub fn site_windows(results: &Table, half_width: u64) -> Result<Vec<SiteWindow>> {
    let cols = results.columns(&["Contig", "Start", "End", "miRNA", "MAG"])?;

    let mut seen = HashSet::new();
    let mut windows = Vec::new();
    for row in results.rows().iter() {
        let (start, end) = match (parse_position(&row[cols[1]]), parse_position(&row[cols[2]])) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                warn!("Non-integer site {}-{} on {}, skipping", row[cols[1]], row[cols[2]], row[cols[0]]);
                continue;
            }
        };
        let target_id = format!("{}_{}", row[cols[3]], row[cols[4]]);
        if seen.insert((row[cols[0]].clone(), target_id.clone(), start, end)) {
            windows.push(SiteWindow::new(&row[cols[0]], &target_id, start, end, half_width));
        }
    }
    Ok(windows)
}

/// Genome files under `fasta_dir` owning at least one window contig.
fn owning_genomes(fasta_dir: &Path, windows: &[SiteWindow]) -> Result<Vec<PathBuf>> {
    let index = contig_index(&files_with_suffix(fasta_dir, ".fna")?)?;

    let contigs: BTreeSet<&str> = windows.iter().map(|w| w.contig.as_str()).collect();
    let mut genomes = BTreeSet::new();
    for contig in contigs {
        match index.get(contig) {
            Some(file) => {
                genomes.insert(file.clone());
            }
            None => warn!("Contig {} not found in any genome FASTA", contig),
        }
    }
    Ok(genomes.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedtools::testing::SliceExtractor;
    use crate::fasta::read_sequences;

    #[test]
    fn windows_are_centred_and_clipped() {
        let text = "MAG\tContig\tStart\tEnd\tmiRNA
M1\tc1\t1000\t1020\tmir-1
M1\tc1\t1000\t1020\tmir-1
M1\tc1\t20\t30\tmir-2
M1\tc1\tNA\t30\tmir-3
";
        let windows = site_windows(&Table::read(text.as_bytes()).unwrap(), 150).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start, windows[0].end), (860, 1160));
        assert_eq!(windows[0].gff_line(), "c1\tRNAhybrid\ttarget_site\t860\t1160\t.\t.\t.\tID=mir-1_M1");
        assert_eq!((windows[1].start, windows[1].end), (1, 175));
    }

    #[test]
    fn missing_column_is_error() {
        let text = "MAG\tContig\tStart\tEnd\nM1\tc1\t1\t2\n";
        assert!(site_windows(&Table::read(text.as_bytes()).unwrap(), 150).is_err());
    }

    #[test]
    fn extract_from_owning_genomes() {
        let dir = tempfile::tempdir().unwrap();
        let genomes = dir.path().join("genomes");
        std::fs::create_dir_all(genomes.join("M1")).unwrap();
        std::fs::write(genomes.join("M1").join("M1.fna"), ">c1 desc\nAAAAACCCCCGGGGGTTTTT\n").unwrap();
        std::fs::write(genomes.join("M2.fna"), ">c2\nACGTACGTAC\n").unwrap();

        let results = dir.path().join("results.tsv");
        std::fs::write(&results, "MAG\tContig\tStart\tEnd\tmiRNA\nM1\tc1\t9\t13\tmir-1\nM3\tc9\t5\t6\tmir-1\n")
            .unwrap();

        let prefix = dir.path().join("out").join("sites");
        let cli = CLI {
            results: results.to_string_lossy().into_owned(),
            fasta_dir: genomes.to_string_lossy().into_owned(),
            output_prefix: prefix.to_string_lossy().into_owned(),
            settings: Settings::default().with_window(Some(3)),
        };
        cli.run_with(&SliceExtractor).unwrap();

        let merged = read_sequences(output_filename(&prefix, "_merged.fna")).unwrap();
        assert_eq!(merged.len(), 1);
        let seqs = read_sequences(output_filename(&prefix, ".fasta")).unwrap();
        assert_eq!(seqs["c1:7-14"], b"CCCGGGG".to_vec());
    }

    #[test]
    fn no_fasta_without_matching_contig() {
        let dir = tempfile::tempdir().unwrap();
        let genomes = dir.path().join("genomes");
        std::fs::create_dir_all(&genomes).unwrap();
        std::fs::write(genomes.join("M2.fna"), ">c2\nACGTACGTAC\n").unwrap();

        let results = dir.path().join("results.tsv");
        std::fs::write(&results, "MAG\tContig\tStart\tEnd\tmiRNA\nM3\tc9\t5\t6\tmir-1\n").unwrap();

        let prefix = dir.path().join("sites");
        let cli = CLI {
            results: results.to_string_lossy().into_owned(),
            fasta_dir: genomes.to_string_lossy().into_owned(),
            output_prefix: prefix.to_string_lossy().into_owned(),
            settings: Settings::default(),
        };
        cli.run_with(&SliceExtractor).unwrap();

        assert!(output_filename(&prefix, ".gff").exists());
        assert!(!output_filename(&prefix, "_merged.fna").exists());
        assert!(!output_filename(&prefix, ".fasta").exists());
    }
}
