use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use crate::impacted::{merged_mag_fasta, merged_mirna_fasta};
use crate::layout::{subdir_names, OutDir};
use crate::table::Table;

pub const MIRNA_LIST: &str = "temp_concat_end_miRNA";
pub const MAG_LIST: &str = "temp_concat_end_MAG";

/// Per-miRNA and per-MAG gene FASTA files for functional annotation, one
/// set per environment, with the lists of files produced.
pub struct CLI {
    pub out_dir: String,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        let results_file = out.all_results();
        if !results_file.exists() {
            bail!("{:?} does not exist", results_file);
        }
        let results = Table::from_file(&results_file)?;
        let mags = results.distinct("MAG")?;
        let mirnas = results.distinct("miRNA")?;

        let (mirna_files, mag_files) = concatenate(&out, &environments(&out)?, &mirnas, &mags)?;

        write_list(out.function().join(MIRNA_LIST), &mirna_files)?;
        write_list(out.function().join(MAG_LIST), &mag_files)?;
        info!("{} miRNA and {} MAG gene files", mirna_files.len(), mag_files.len());
        Ok(())
    }
}

/// Environments with a `function/miRNA_<env>` directory.
pub fn environments(out: &OutDir) -> Result<Vec<String>> {
    Ok(subdir_names(out.function())?
        .into_iter()
        .filter_map(|d| d.strip_prefix("miRNA_").map(str::to_string))
        .collect())
}

pub fn concatenate(
    out: &OutDir,
    environments: &[String],
    mirnas: &[String],
    mags: &[String],
) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut mirna_files = Vec::new();
    let mut mag_files = Vec::new();

    for env in environments.iter() {
        let mirna_dir = out.mirna_env_dir(env);
        let mag_dir = out.mag_env_dir(env);
        std::fs::create_dir_all(&mirna_dir)?;
        std::fs::create_dir_all(&mag_dir)?;

        for mirna in mirnas.iter().filter(|m| !m.is_empty()) {
            let source = merged_mirna_fasta(out, mirna, env);
            if !source.exists() {
                warn!("No gene sequences for miRNA {} in {}", mirna, env);
                continue;
            }
            let dest = mirna_dir.join(format!("concatenated_by_{}_{}.fasta", mirna, env));
            std::fs::copy(&source, &dest).with_context(|| format!("copying {:?}", source))?;
            mirna_files.push(dest);
        }

        for mag in mags.iter().filter(|m| !m.is_empty()) {
            if !mag_dir.join(format!("contigs_for_{}.txt", mag)).exists() {
                warn!("Skipping MAG {}: no targeted contigs in {}", mag, env);
                continue;
            }
            let source = merged_mag_fasta(out, mag, env);
            if !source.exists() {
                warn!("No gene sequences for MAG {} in {}", mag, env);
                continue;
            }
            let dest = mag_dir.join(format!("concatenated_by_{}_{}.fasta", mag, env));
            std::fs::copy(&source, &dest).with_context(|| format!("copying {:?}", source))?;
            mag_files.push(dest);
        }
    }

    Ok((mirna_files, mag_files))
}

fn write_list(path: PathBuf, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        warn!("No concatenated files to list in {:?}", path);
    }
    let text: String = files.iter().map(|f| format!("{}\n", f.display())).collect();
    std::fs::write(&path, text).with_context(|| format!("writing {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_results() {
        let dir = tempfile::tempdir().unwrap();
        let cli = CLI { out_dir: dir.path().to_string_lossy().into_owned() };
        assert!(cli.run().is_err());
    }

    #[test]
    fn copies_merged_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutDir::new(dir.path());
        std::fs::create_dir_all(out.final_results()).unwrap();
        std::fs::write(
            out.all_results(),
            "MAG\tmiRNA\tEnvironment\nM1\tmir-1\tgut\nM2\tmir-2\tgut\nM1\tmir-1\tsoil\n",
        )
        .unwrap();

        std::fs::create_dir_all(out.mirna_env_dir("gut")).unwrap();
        std::fs::create_dir_all(out.mag_env_dir("gut")).unwrap();
        std::fs::write(merged_mirna_fasta(&out, "mir-1", "gut"), ">c1:0-10\nACGT\n").unwrap();
        std::fs::write(out.mag_env_dir("gut").join("contigs_for_M1.txt"), "c1 1 10\n").unwrap();
        std::fs::write(merged_mag_fasta(&out, "M1", "gut"), ">c1:0-10\nACGT\n").unwrap();
        std::fs::write(merged_mag_fasta(&out, "M2", "gut"), ">c2:0-10\nACGT\n").unwrap();

        let cli = CLI { out_dir: dir.path().to_string_lossy().into_owned() };
        cli.run().unwrap();

        let mirna_list = std::fs::read_to_string(out.function().join(MIRNA_LIST)).unwrap();
        assert_eq!(mirna_list.lines().count(), 1);
        assert!(mirna_list.contains("concatenated_by_mir-1_gut.fasta"));

        let mag_list = std::fs::read_to_string(out.function().join(MAG_LIST)).unwrap();
        assert_eq!(mag_list.lines().count(), 1);
        let copied = std::fs::read_to_string(out.mag_env_dir("gut").join("concatenated_by_M1_gut.fasta")).unwrap();
        assert_eq!(copied, ">c1:0-10\nACGT\n");
    }
}
