use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use rayon::prelude::*;

use crate::gff::{read_gff_file, LocusId};
use crate::layout::OutDir;

const CDS_SUFFIX: &str = "_cds.gff";
const IDS_SUFFIX: &str = "_IDs.txt";

pub struct CLI {
    pub out_dir: String,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        let mags = out.mag_names()?;

        let converted = mags
            .par_iter()
            .map(|mag| convert_mag_dir(&out.mag_dir(mag)))
            .collect::<Result<Vec<usize>>>()?;

        info!(
            "Wrote locus tables for {} MAG directories ({} loci)",
            mags.len(),
            converted.iter().sum::<usize>()
        );
        Ok(())
    }
}

/// Converts every `*_cds.gff` in `dir` into the matching `*_IDs.txt`,
/// returning the number of loci written.
pub fn convert_mag_dir(dir: &Path) -> Result<usize> {
    let mut total = 0;
    for (gff_path, ids_path) in cds_files(dir)? {
        total += gff_to_ids(&gff_path, &ids_path)?;
    }
    Ok(total)
}

fn cds_files(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut pairs = Vec::new();
    for entry_res in std::fs::read_dir(dir).with_context(|| format!("listing {:?}", dir))? {
        let entry = entry_res?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(stem) = name.strip_suffix(CDS_SUFFIX) {
            pairs.push((entry.path(), dir.join(format!("{}{}", stem, IDS_SUFFIX))));
        }
    }
    pairs.sort();
    Ok(pairs)
}

pub fn gff_to_ids(gff_path: &Path, ids_path: &Path) -> Result<usize> {
    let records = read_gff_file(gff_path)?;
    let mut lines = String::new();
    for rec in records.iter() {
        lines.push_str(&LocusId::from_gff(rec).line());
        lines.push('\n');
    }
    std::fs::write(ids_path, lines).with_context(|| format!("writing {:?}", ids_path))?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gff::read_locus_ids;

    #[test]
    fn converts_each_mag() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutDir::new(dir.path());
        for mag in ["MAG1", "MAG2"] {
            std::fs::create_dir_all(out.mag_dir(mag)).unwrap();
            std::fs::write(
                out.mag_file(mag, "_cds.gff"),
                format!("##gff-version 3\n{}_c1\tProdigal\tCDS\t11\t70\t.\t+\t0\tID={}_00001;product=x\n", mag, mag),
            )
            .unwrap();
        }
        std::fs::write(out.mag_dir("MAG2").join("MAG2.fna"), ">MAG2_c1\nACGT\n").unwrap();

        CLI { out_dir: dir.path().to_string_lossy().into_owned() }.run().unwrap();

        let loci = read_locus_ids(out.mag_file("MAG2", "_IDs.txt")).unwrap();
        assert_eq!(loci.len(), 1);
        assert_eq!(loci[0].contig(), "MAG2_c1");
        assert_eq!(loci[0].locus_tag(), "MAG2_00001");
        assert!(out.mag_file("MAG1", "_IDs.txt").exists());
        assert!(!out.mag_dir("MAG2").join("MAG2.fna_IDs.txt").exists());
    }
}
