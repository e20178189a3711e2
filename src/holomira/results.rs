use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::bsites::BSITES_HEADER;
use crate::layout::OutDir;
use crate::table::Table;

pub const RESULT_HEADER: [&str; 15] = [
    "MAG", "Contig", "Start", "End", "miRNA", "Locus_tag", "MFE", "Pvalue", "Gene", "Strand", "Product",
    "Gene_start", "Gene_end", "Taxonomy", "Environment",
];

/// Taxonomy and environment of one sample, from a headerless
/// `sample, Taxonomy, Environment` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Taxon {
    pub sample: String,
    pub taxonomy: String,
    pub environment: String,
}

pub fn read_taxa<P: AsRef<Path>>(filename: P) -> Result<Vec<Taxon>> {
    let file = std::fs::File::open(filename.as_ref())
        .with_context(|| format!("opening taxonomy table {:?}", filename.as_ref()))?;
    let mut taxa = Vec::new();
    for (line_no, line_res) in BufReader::new(file).lines().enumerate() {
        let line = line_res?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() != 3 {
            warn!("Taxonomy line {} has {} columns instead of 3, skipping", line_no + 1, fields.len());
            continue;
        }
        let taxon = Taxon {
            sample: fields[0].to_string(),
            taxonomy: fields[1].to_string(),
            environment: fields[2].to_string(),
        };
        if !taxa.contains(&taxon) {
            taxa.push(taxon);
        }
    }
    Ok(taxa)
}

/// Sample identifiers from the `SampleID` column of a sample list.
pub fn read_sample_ids<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
    let table = Table::from_file(filename)?;
    let idx = table.column("SampleID")?;
    Ok(table.rows().iter().map(|r| r[idx].clone()).collect())
}

/// Binding sites of one sample joined with its taxonomy, in the result
/// column layout.
pub fn sample_results(bsites: &Table, taxa: &[Taxon]) -> Result<Table> {
    let cols = bsites.columns(&BSITES_HEADER)?;
    let sample_col = cols[0];

    let mut deduped = bsites.clone();
    deduped.dedup();

    let mut results = Table::new(&RESULT_HEADER);
    for row in deduped.rows().iter() {
        for taxon in taxa.iter().filter(|t| t.sample == row[sample_col]) {
            let mut out: Vec<String> = cols.iter().map(|&c| row[c].clone()).collect();
            out.push(taxon.taxonomy.clone());
            out.push(taxon.environment.clone());
            results.push(out)?;
        }
    }
    results.dedup();
    Ok(results)
}

/// Final results for every sample in a sample list.
pub struct SampleCLI {
    pub out_dir: String,
    pub taxonomy: String,
    pub sample_list: String,
}

impl SampleCLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        let taxa = read_taxa(&self.taxonomy)?;

        for sample in read_sample_ids(&self.sample_list)? {
            let bsites_file = out.bsites(&sample);
            if !bsites_file.exists() {
                warn!("No binding sites for {}: {:?} not found", sample, bsites_file);
                continue;
            }
            let results = sample_results(&Table::from_file(&bsites_file)?, &taxa)?;
            results.to_file(out.sample_results(&sample))?;
            info!("{}: {} result rows", sample, results.len());
        }
        Ok(())
    }
}

/// All per-sample final results stacked into one table.
pub struct MergeCLI {
    pub out_dir: String,
    pub sample_list: String,
}

impl MergeCLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        info!("Collecting results for all samples");

        let merged = merge_sample_results(&out, &read_sample_ids(&self.sample_list)?)?;

        std::fs::create_dir_all(out.final_results())?;
        merged.to_file(out.all_results())?;
        info!("Wrote {} rows to {:?}", merged.len(), out.all_results());
        Ok(())
    }
}

pub fn merge_sample_results(out: &OutDir, samples: &[String]) -> Result<Table> {
    let mut merged = Table::new(&RESULT_HEADER);
    for sample in samples.iter() {
        let path = out.sample_results(sample);
        if !path.exists() {
            warn!("No final results for {}: {:?} not found", sample, path);
            continue;
        }
        let table = Table::from_file(&path)?;
        if table.header().is_empty() {
            continue;
        }
        merged.append(table).with_context(|| format!("appending {:?}", path))?;
    }
    merged.dedup();
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bsites_table(rows: &[[&str; 13]]) -> Table {
        let mut table = Table::new(&BSITES_HEADER);
        for r in rows {
            table.push(r.iter().map(|s| s.to_string()).collect()).unwrap();
        }
        table
    }

    #[test]
    fn joins_taxonomy() {
        let row = ["M1", "c1", "811", "832", "mir-1", "A_1", "-20.1", "0.01", "dnaK", "+", "", "1001", "1500"];
        let other = ["M9", "c1", "811", "832", "mir-1", "A_1", "-20.1", "0.01", "dnaK", "+", "", "1001", "1500"];
        let bsites = bsites_table(&[row, row, other]);
        let taxa = vec![Taxon {
            sample: "M1".to_string(),
            taxonomy: "g__Bacteroides".to_string(),
            environment: "gut".to_string(),
        }];

        let results = sample_results(&bsites, &taxa).unwrap();
        assert_eq!(results.header(), &RESULT_HEADER);
        assert_eq!(results.len(), 1);
        assert_eq!(results.rows()[0][13], "g__Bacteroides");
        assert_eq!(results.rows()[0][14], "gut");
    }

    #[test]
    fn merges_listed_samples() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutDir::new(dir.path());
        std::fs::create_dir_all(out.rnahybrid()).unwrap();

        let bsites = bsites_table(&[
            ["M1", "c1", "811", "832", "mir-1", "A_1", "-20.1", "0.01", "dnaK", "+", "", "1001", "1500"],
        ]);
        let taxa = vec![
            Taxon { sample: "M1".into(), taxonomy: "t1".into(), environment: "gut".into() },
            Taxon { sample: "M2".into(), taxonomy: "t2".into(), environment: "soil".into() },
        ];
        let r1 = sample_results(&bsites, &taxa).unwrap();
        r1.to_file(out.sample_results("M1")).unwrap();
        r1.to_file(out.sample_results("M1b")).unwrap();

        let merged =
            merge_sample_results(&out, &["M1".to_string(), "M1b".to_string(), "M3".to_string()]).unwrap();
        assert_eq!(merged.len(), 1);

        let empty = merge_sample_results(&out, &["M3".to_string()]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.header().len(), 15);
    }

    #[test]
    fn taxonomy_and_sample_files() {
        let dir = tempfile::tempdir().unwrap();
        let tax = dir.path().join("taxonomy.tsv");
        std::fs::write(&tax, "M1\tg__A\tgut\nM1\tg__A\tgut\nbad line\nM2\tg__B\tsoil\n").unwrap();
        let taxa = read_taxa(&tax).unwrap();
        assert_eq!(taxa.len(), 2);

        let list = dir.path().join("samples.tsv");
        std::fs::write(&list, "SampleID\tPath\nM1\t/x\nM2\t/y\n").unwrap();
        assert_eq!(read_sample_ids(&list).unwrap(), vec!["M1", "M2"]);
    }
}
