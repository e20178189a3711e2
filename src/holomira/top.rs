use anyhow::Result;
use log::{info, warn};

use crate::layout::OutDir;
use crate::summary::{mag_summary_file, mirna_summary_file};
use crate::table::Table;

pub const DEFAULT_TOP: usize = 20;
pub const TOP_HEADER: [&str; 3] = ["Ranking", "Name", "Count"];

/// The rankings drawn from the summary tables: name, summary key column
/// and count column.
const MIRNA_RANKINGS: [(&str, &str, &str); 2] = [
    ("miRNAs_by_MAG", "miRNA", "num_unique_MAG"),
    ("miRNAs_by_genes", "miRNA", "num_unique_genes"),
];
const MAG_RANKINGS: [(&str, &str, &str); 2] = [
    ("MAGs_by_miRNAs", "MAG", "num_unique_miRNAs"),
    ("MAGs_by_genes", "MAG", "num_unique_genes"),
];

/// Most-targeting miRNAs and most-targeted MAGs of each environment.
pub struct CLI {
    pub results: String,
    pub out_dir: String,
    pub top: usize,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        let results = Table::from_file(&self.results)?;

        for env in results.distinct("Environment")?.iter().filter(|e| !e.is_empty()) {
            let (by_mirna, by_mag) = match read_summaries(&out, env) {
                Ok(t) => t,
                Err(e) => {
                    warn!("Cannot read summary tables for {}: {:#}", env, e);
                    continue;
                }
            };

            let mut top = Table::new(&TOP_HEADER);
            for (name, key, count) in MIRNA_RANKINGS.iter() {
                top.append(ranking(&by_mirna, name, key, count, self.top)?)?;
            }
            for (name, key, count) in MAG_RANKINGS.iter() {
                top.append(ranking(&by_mag, name, key, count, self.top)?)?;
            }

            let path = out.final_results().join(format!("{}_Top_{}_miRNAs_and_MAGs.tsv", env, self.top));
            top.to_file(&path)?;
            info!("{}: wrote {:?}", env, path);
        }
        Ok(())
    }
}

fn read_summaries(out: &OutDir, env: &str) -> Result<(Table, Table)> {
    Ok((Table::from_file(mirna_summary_file(out, env))?, Table::from_file(mag_summary_file(out, env))?))
}

/// The `n` rows of `summary` with the highest `count_col`, in descending
/// order, ties kept in table order.
pub fn ranking(summary: &Table, name: &str, key_col: &str, count_col: &str, n: usize) -> Result<Table> {
    let key = summary.column(key_col)?;
    let count = summary.column(count_col)?;

    let mut entries: Vec<(&str, u64)> = Vec::new();
    for row in summary.rows().iter() {
        match row[count].parse::<u64>() {
            Ok(c) => entries.push((row[key].as_str(), c)),
            Err(_) => warn!("Bad count {:?} for {} in {}", row[count], row[key], count_col),
        }
    }
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    let mut table = Table::new(&TOP_HEADER);
    for (entry, c) in entries.into_iter().take(n) {
        table.push(vec![name.to_string(), entry.to_string(), c.to_string()])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_counts_first() {
        let text = "miRNA\tnum_unique_MAG\tnum_unique_genes
mir-1\t2\t5
mir-2\t7\t1
mir-3\t2\t3
mir-4\tx\t3
";
        let summary = Table::read(text.as_bytes()).unwrap();
        let top = ranking(&summary, "miRNAs_by_MAG", "miRNA", "num_unique_MAG", 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top.rows()[0], vec!["miRNAs_by_MAG", "mir-2", "7"]);
        assert_eq!(top.rows()[1], vec!["miRNAs_by_MAG", "mir-1", "2"]);
    }

    #[test]
    fn one_file_per_environment() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutDir::new(dir.path());
        std::fs::create_dir_all(out.final_results()).unwrap();
        let results = dir.path().join("results.tsv");
        std::fs::write(&results, "MAG\tmiRNA\tEnvironment\nM1\tmir-1\tgut\nM2\tmir-1\tsoil\n").unwrap();
        std::fs::write(
            mirna_summary_file(&out, "gut"),
            "miRNA\tnum_unique_MAG\tnum_unique_genes\nmir-1\t1\t2\n",
        )
        .unwrap();
        std::fs::write(
            mag_summary_file(&out, "gut"),
            "MAG\tnum_unique_miRNAs\tnum_unique_genes\nM1\t1\t2\n",
        )
        .unwrap();

        let cli = CLI {
            results: results.to_string_lossy().into_owned(),
            out_dir: dir.path().to_string_lossy().into_owned(),
            top: DEFAULT_TOP,
        };
        cli.run().unwrap();

        let gut = Table::from_file(out.final_results().join("gut_Top_20_miRNAs_and_MAGs.tsv")).unwrap();
        assert_eq!(gut.len(), 4);
        assert_eq!(gut.rows()[2], vec!["MAGs_by_miRNAs", "M1", "1"]);
        assert!(!out.final_results().join("soil_Top_20_miRNAs_and_MAGs.tsv").exists());
    }
}
