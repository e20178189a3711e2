use std::collections::BTreeSet;
use std::fmt::Write;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};

use crate::layout::OutDir;
use crate::table::Table;

pub const VENN_FILE: &str = "venn_summary.txt";
pub const VENN_VARIABLES: [&str; 3] = ["miRNA", "Gene", "Taxonomy"];

/// Values unique to each of two or three environments, and those shared
/// by all of them.
pub struct CLI {
    pub results: String,
    pub out_dir: String,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);
        let results = Table::from_file(&self.results)?;
        let text = venn_summary(&results)?;

        std::fs::create_dir_all(out.final_results())?;
        let path = out.final_results().join(VENN_FILE);
        std::fs::write(&path, text).with_context(|| format!("writing {:?}", path))?;
        info!("Wrote {:?}", path);
        Ok(())
    }
}

/// Python-style rendering of a string set: `{'a', 'b'}`, or `set()`.
pub fn set_repr(set: &BTreeSet<&str>) -> String {
    if set.is_empty() {
        return "set()".to_string();
    }
    format!("{{{}}}", set.iter().map(|s| quote(s)).join(", "))
}

fn quote(s: &str) -> String {
    if s.contains('\'') && !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

pub fn venn_summary(results: &Table) -> Result<String> {
    let env_col = results.column("Environment")?;
    let envs: Vec<String> = results.distinct("Environment")?.into_iter().filter(|e| !e.is_empty()).collect();

    let message = match envs.len() {
        0 => Some("No environment detected.\nAt least 2 are required to generate a Venn diagram."),
        1 => Some("Only one environment detected.\nAt least 2 are required to generate a Venn diagram."),
        2 | 3 => None,
        _ => Some("More than three environments detected.\nVenn diagram generation supports up to 3."),
    };
    if let Some(msg) = message {
        warn!("{}", msg.replace('\n', " "));
        return Ok(format!("{}\n", msg));
    }

    let mut text = String::new();
    for var in VENN_VARIABLES.iter() {
        let col = results.column(var)?;
        let sets: Vec<BTreeSet<&str>> = envs
            .iter()
            .map(|env| {
                results
                    .rows()
                    .iter()
                    .filter(|r| r[env_col] == *env && !r[col].is_empty())
                    .map(|r| r[col].as_str())
                    .collect()
            })
            .collect();

        writeln!(text, "### {}", var)?;
        for (i, env) in envs.iter().enumerate() {
            let unique: BTreeSet<&str> = sets[i]
                .iter()
                .filter(|v| sets.iter().enumerate().all(|(j, other)| j == i || !other.contains(*v)))
                .copied()
                .collect();
            writeln!(text, "Unique to {}: {}", env, set_repr(&unique))?;
        }
        let shared: BTreeSet<&str> = sets[0]
            .iter()
            .filter(|v| sets[1..].iter().all(|other| other.contains(*v)))
            .copied()
            .collect();
        writeln!(text, "Shared: {}\n", set_repr(&shared))?;
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_set_rendering() {
        assert_eq!(set_repr(&BTreeSet::new()), "set()");
        let set: BTreeSet<&str> = ["mir-2", "mir-1"].into_iter().collect();
        assert_eq!(set_repr(&set), "{'mir-1', 'mir-2'}");
        let set: BTreeSet<&str> = ["5'UTR"].into_iter().collect();
        assert_eq!(set_repr(&set), "{\"5'UTR\"}");
    }

    #[test]
    fn two_environments() {
        let text = "MAG\tmiRNA\tGene\tTaxonomy\tEnvironment
M1\tmir-1\tdnaK\tg__A\tgut
M1\tmir-2\tgroL\tg__A\tgut
M2\tmir-1\tdnaK\tg__B\tsoil
";
        let summary = venn_summary(&Table::read(text.as_bytes()).unwrap()).unwrap();
        let expected = "### miRNA
Unique to gut: {'mir-2'}
Unique to soil: set()
Shared: {'mir-1'}

### Gene
Unique to gut: {'groL'}
Unique to soil: set()
Shared: {'dnaK'}

### Taxonomy
Unique to gut: {'g__A'}
Unique to soil: {'g__B'}
Shared: set()

";
        assert_eq!(summary, expected);
    }

    #[test]
    fn three_environments() {
        let text = "MAG\tmiRNA\tGene\tTaxonomy\tEnvironment
M1\tmir-1\tdnaK\tg__A\tgut
M1\tmir-2\tdnaK\tg__A\tgut
M2\tmir-1\tdnaK\tg__B\tsoil
M3\tmir-1\tdnaK\tg__A\twater
M3\tmir-3\tgroL\tg__A\twater
";
        let summary = venn_summary(&Table::read(text.as_bytes()).unwrap()).unwrap();
        let expected = "### miRNA
Unique to gut: {'mir-2'}
Unique to soil: set()
Unique to water: {'mir-3'}
Shared: {'mir-1'}

### Gene
Unique to gut: set()
Unique to soil: set()
Unique to water: {'groL'}
Shared: {'dnaK'}

### Taxonomy
Unique to gut: set()
Unique to soil: {'g__B'}
Unique to water: set()
Shared: set()

";
        assert_eq!(summary, expected);
    }

    #[test]
    fn too_many_environments_message() {
        let text = "MAG\tmiRNA\tGene\tTaxonomy\tEnvironment
M1\tmir-1\tdnaK\tg__A\tgut
M2\tmir-1\tdnaK\tg__A\tsoil
M3\tmir-1\tdnaK\tg__A\twater
M4\tmir-1\tdnaK\tg__A\tsediment
";
        let summary = venn_summary(&Table::read(text.as_bytes()).unwrap()).unwrap();
        assert_eq!(summary, "More than three environments detected.\nVenn diagram generation supports up to 3.\n");
    }

    #[test]
    fn single_environment_message() {
        let text = "MAG\tmiRNA\tGene\tTaxonomy\tEnvironment\nM1\tmir-1\tdnaK\tg__A\tgut\n";
        let summary = venn_summary(&Table::read(text.as_bytes()).unwrap()).unwrap();
        assert!(summary.starts_with("Only one environment detected."));
    }
}
