use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::bedtools::IntervalExtractor;
use crate::config::Settings;
use crate::gff::{read_gff_file, write_gff};
use crate::layout::OutDir;

/// Five-prime windows of the CDS features of one sample, and the
/// sequences of both the windows and the full CDS.
pub struct CLI {
    pub sample: String,
    pub upstream: u64,
    pub downstream: u64,
    pub out_dir: String,
    pub gff: String,
    pub settings: Settings,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        std::fs::create_dir_all(out.target_fasta())?;
        let log_file = out.target_fasta().join(format!("{}_warnings.log", self.sample));
        let extractor = self.settings.extractor().with_stderr_log(log_file);
        self.run_with(&extractor)
    }

    pub fn fiveprime_gff(&self) -> PathBuf {
        OutDir::new(&self.out_dir).mag_file(&self.sample, "_cds_fiveprime.gff")
    }

    pub fn run_with<E: IntervalExtractor>(&self, extractor: &E) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        let features = read_gff_file(&self.gff)?;

        let windows: Vec<_> = features
            .iter()
            .map(|rec| rec.five_prime(self.upstream, self.downstream))
            .collect();

        let fiveprime_gff = self.fiveprime_gff();
        std::fs::create_dir_all(out.mag_dir(&self.sample))?;
        let gff_out = std::fs::File::create(&fiveprime_gff)
            .with_context(|| format!("creating {:?}", fiveprime_gff))?;
        write_gff(gff_out, &windows)?;
        info!("{}: {} five-prime windows", self.sample, windows.len());

        let genome = out.mag_file(&self.sample, ".fna");
        std::fs::create_dir_all(out.target_fasta())?;

        let windows_fa = out.target_fasta().join(format!("{}_filtered.fa", self.sample));
        extractor.get_fasta(&genome, &fiveprime_gff, &windows_fa, true)?;

        let cds_fa = out.target_fasta().join(format!("{}_CDS.fa", self.sample));
        extractor.get_fasta(&genome, Path::new(&self.gff), &cds_fa, true)?;

        Ok(())
    }
}
