use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use log::{debug, info};

/// Extracts the sequences of the intervals listed in a BED or GFF file
/// from a genome FASTA. Headers in the output name each interval as
/// `contig:start-end`, with `(strand)` appended when `stranded`.
pub trait IntervalExtractor {
    fn get_fasta(&self, fasta: &Path, intervals: &Path, output: &Path, stranded: bool) -> Result<()>;
}

/// `bedtools getfasta` run as an external program.
#[derive(Debug, Clone)]
pub struct Bedtools {
    program: PathBuf,
    stderr_log: Option<PathBuf>,
}

impl Bedtools {
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        Bedtools { program: program.as_ref().to_path_buf(), stderr_log: None }
    }

    /// Appends the warnings printed by bedtools to `log_file`.
    pub fn with_stderr_log<P: AsRef<Path>>(mut self, log_file: P) -> Self {
        self.stderr_log = Some(log_file.as_ref().to_path_buf());
        self
    }

    fn command_args(fasta: &Path, intervals: &Path, output: &Path, stranded: bool) -> Vec<String> {
        let mut args = vec!["getfasta".to_string()];
        if stranded {
            args.push("-s".to_string());
        }
        for (flag, path) in [("-fi", fasta), ("-bed", intervals), ("-fo", output)] {
            args.push(flag.to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        args
    }
}

impl IntervalExtractor for Bedtools {
    fn get_fasta(&self, fasta: &Path, intervals: &Path, output: &Path, stranded: bool) -> Result<()> {
        let args = Self::command_args(fasta, intervals, output, stranded);
        debug!("Running {:?} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run {:?}", self.program))?;

        if let Some(log_file) = &self.stderr_log {
            let mut log_out = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("opening {:?}", log_file))?;
            log_out.write_all(&result.stderr)?;
        }

        if !result.status.success() {
            bail!(
                "{:?} getfasta failed on {:?}: {}",
                self.program,
                intervals,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        info!("Extracted {:?} -> {:?}", intervals, output);
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader};

    use bio::alphabets::dna;
    use bio::io::fasta;

    use super::*;

    /// Stand-in extractor for tests: slices sequences straight out of the
    /// FASTA for BED (3 columns) or GFF (9 columns) intervals.
    pub struct SliceExtractor;

    impl IntervalExtractor for SliceExtractor {
        fn get_fasta(&self, fasta_in: &Path, intervals: &Path, output: &Path, stranded: bool) -> Result<()> {
            let mut seqs = HashMap::new();
            for rec_res in fasta::Reader::from_file(fasta_in)?.records() {
                let rec = rec_res?;
                seqs.insert(rec.id().to_string(), rec.seq().to_vec());
            }

            let mut writer = fasta::Writer::to_file(output)?;
            for line_res in BufReader::new(std::fs::File::open(intervals)?).lines() {
                let line = line_res?;
                let fields: Vec<&str> = line.split('\t').collect();
                let (contig, start0, end, strand) = if fields.len() >= 9 {
                    (fields[0], fields[3].parse::<usize>()? - 1, fields[4].parse::<usize>()?, fields[6])
                } else {
                    (fields[0], fields[1].parse::<usize>()?, fields[2].parse::<usize>()?, ".")
                };
                let seq = match seqs.get(contig) {
                    Some(s) if end <= s.len() => &s[start0..end],
                    _ => continue,
                };
                if stranded {
                    let strand = if strand == "-" { "-" } else { "+" };
                    let oriented = if strand == "-" { dna::revcomp(seq) } else { seq.to_vec() };
                    writer.write(&format!("{}:{}-{}({})", contig, start0, end, strand), None, &oriented)?;
                } else {
                    writer.write(&format!("{}:{}-{}", contig, start0, end), None, seq)?;
                }
            }
            writer.flush()?;
            Ok(())
        }
    }

    #[test]
    fn bedtools_arguments() {
        let args = Bedtools::command_args(Path::new("g.fna"), Path::new("x.bed"), Path::new("o.fa"), true);
        assert_eq!(args, vec!["getfasta", "-s", "-fi", "g.fna", "-bed", "x.bed", "-fo", "o.fa"]);
    }

    #[test]
    fn missing_program_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bedtools = Bedtools::new(dir.path().join("no-such-bedtools"));
        let res = bedtools.get_fasta(Path::new("g.fna"), Path::new("x.bed"), &dir.path().join("o.fa"), false);
        assert!(res.is_err());
    }
}
