use std::collections::{BTreeSet, HashSet};

use anyhow::Result;
use log::info;

use crate::layout::OutDir;
use crate::table::Table;

pub const COUNT_VARIABLES: [&str; 4] = ["miRNA", "Gene", "MAG", "Taxonomy"];
pub const COUNTS_HEADER: [&str; 3] = ["Environment", "Variable", "Counts"];
pub const COUNTS_FILE: &str = "MAG_Histograms.tsv";

/// Distinct miRNAs, genes, MAGs and taxa per environment.
pub struct CLI {
    pub results: String,
    pub out_dir: String,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        let counts = environment_counts(&Table::from_file(&self.results)?)?;
        std::fs::create_dir_all(out.plots())?;
        counts.to_file(out.plots().join(COUNTS_FILE))?;
        info!("Wrote {} counts to {:?}", counts.len(), out.plots().join(COUNTS_FILE));
        Ok(())
    }
}

/// Long-format counts, one row per variable and environment, environments
/// sorted within each variable.
pub fn environment_counts(results: &Table) -> Result<Table> {
    let env_col = results.column("Environment")?;
    let var_cols = results.columns(&COUNT_VARIABLES)?;

    let envs: BTreeSet<&str> = results
        .rows()
        .iter()
        .map(|r| r[env_col].as_str())
        .filter(|e| !e.is_empty())
        .collect();

    let mut counts = Table::new(&COUNTS_HEADER);
    for (var, &col) in COUNT_VARIABLES.iter().zip(var_cols.iter()) {
        for env in envs.iter() {
            let distinct: HashSet<&str> = results
                .rows()
                .iter()
                .filter(|r| r[env_col] == *env && !r[col].is_empty())
                .map(|r| r[col].as_str())
                .collect();
            counts.push(vec![env.to_string(), var.to_string(), distinct.len().to_string()])?;
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_in_long_format() {
        let text = "MAG\tmiRNA\tGene\tTaxonomy\tEnvironment
M1\tmir-1\tdnaK\tg__A\tsoil
M1\tmir-2\tdnaK\tg__A\tsoil
M2\tmir-1\t\tg__B\tgut
";
        let counts = environment_counts(&Table::read(text.as_bytes()).unwrap()).unwrap();
        assert_eq!(counts.header(), &COUNTS_HEADER);
        assert_eq!(counts.len(), 8);
        assert_eq!(counts.rows()[0], vec!["gut", "miRNA", "1"]);
        assert_eq!(counts.rows()[1], vec!["soil", "miRNA", "2"]);
        assert_eq!(counts.rows()[2], vec!["gut", "Gene", "0"]);
        assert_eq!(counts.rows()[3], vec!["soil", "Gene", "1"]);
    }
}
