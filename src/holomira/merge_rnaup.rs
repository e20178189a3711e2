use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Result};
use log::{info, warn};

use crate::config::Settings;
use crate::interval::parse_position;
use crate::rnaup::{scan_rnaup_dir, summary_table, RnaupRow};
use crate::table::Table;

pub const ENERGY_COLUMNS: [&str; 7] = [
    "pos1", "pos2", "miRNA_pairing", "dG_total", "dG_binding", "dG_opening_target", "dG_opening_miRNA",
];

pub const SUMMARY_FILE: &str = "RNAup_summary_results.tsv";
pub const VALID_FILE: &str = "HolomiRA_results.tsv";
pub const DISCARDED_FILE: &str = "HolomiRA_discarded.tsv";

/// RNAup energies attached to the binding-site results, split into
/// accepted and discarded sites by a free-energy cutoff.
pub struct CLI {
    pub rna_dir: String,
    pub results: String,
    pub out_dir: String,
    pub settings: Settings,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let cutoff = match self.settings.dg_cutoff() {
            Some(c) => c,
            None => bail!("No free-energy cutoff given on the command line or in the config"),
        };

        let results = Table::from_file(&self.results)?;
        let rows = scan_rnaup_dir(Path::new(&self.rna_dir))?;
        if rows.is_empty() {
            warn!("No RNAup result could be parsed under {:?}", self.rna_dir);
        }
        summary_table(&rows)?.to_file(Path::new(&self.rna_dir).join(SUMMARY_FILE))?;

        let merger = EnergyMerge {
            window: self.settings.window(),
            site_span: self.settings.site_span(),
            cutoff,
        };
        let (valid, discarded) = merger.merge(&results, &rows)?;

        std::fs::create_dir_all(&self.out_dir)?;
        valid.to_file(Path::new(&self.out_dir).join(VALID_FILE))?;
        discarded.to_file(Path::new(&self.out_dir).join(DISCARDED_FILE))?;
        info!("Valid hits: {}, discarded hits: {}", valid.len(), discarded.len());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnergyMerge {
    pub window: u64,
    pub site_span: u64,
    pub cutoff: f64,
}

impl EnergyMerge {
    /// True when the duplex lies on the binding site at the centre of the
    /// extended window rather than in its flanks.
    pub fn on_site(&self, row: &RnaupRow) -> bool {
        row.alignment.pos1 > self.window && row.alignment.pos2 < self.window + self.site_span
    }

    /// Left join of `results` with the on-site RNAup rows on miRNA, contig,
    /// start and end. Rows whose total energy is at most the cutoff are
    /// valid; every other row, including those without RNAup energies, is
    /// discarded.
    pub fn merge(&self, results: &Table, rows: &[RnaupRow]) -> Result<(Table, Table)> {
        let cols = results.columns(&["miRNA", "Contig", "Start", "End"])?;
        let mut on_site: HashMap<(&str, &str, u64, u64), Vec<&RnaupRow>> = HashMap::new();
        for r in rows.iter().filter(|r| self.on_site(r)) {
            let key = (r.site.mirna.as_str(), r.site.contig.as_str(), r.site.start, r.site.end);
            on_site.entry(key).or_default().push(r);
        }

        let mut header = results.header().to_vec();
        header.extend(ENERGY_COLUMNS.iter().map(|c| c.to_string()));
        let mut valid = Table::new(&header);
        let mut discarded = Table::new(&header);

        for row in results.rows().iter() {
            let matches = match (parse_position(&row[cols[2]]), parse_position(&row[cols[3]])) {
                (Some(start), Some(end)) => on_site.get(&(row[cols[0]].as_str(), row[cols[1]].as_str(), start, end)),
                _ => None,
            };
            let matches = match matches {
                Some(m) => m,
                None => {
                    let mut out = row.clone();
                    out.extend(ENERGY_COLUMNS.iter().map(|_| String::new()));
                    discarded.push(out)?;
                    continue;
                }
            };
            for rnaup in matches.iter() {
                let mut out = row.clone();
                out.extend(rnaup.alignment.fields());
                if rnaup.alignment.dg_total <= self.cutoff {
                    valid.push(out)?;
                } else {
                    discarded.push(out)?;
                }
            }
        }

        Ok((valid, discarded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rnaup::{RnaupAlignment, RnaupSite};

    fn rnaup(mirna: &str, start: u64, pos1: u64, dg_total: f64) -> RnaupRow {
        RnaupRow {
            site: RnaupSite { mirna: mirna.to_string(), contig: "gnl|X|c1".to_string(), start, end: start + 20 },
            alignment: RnaupAlignment {
                pos1,
                pos2: pos1 + 18,
                mirna_pairing: "1,19".to_string(),
                dg_total,
                dg_binding: dg_total - 5.0,
                dg_opening_target: 4.0,
                dg_opening_mirna: 1.0,
            },
        }
    }

    fn results() -> Table {
        Table::read(
            "MAG\tContig\tStart\tEnd\tmiRNA
M1\tgnl|X|c1\t900\t920\tmir-1
M1\tgnl|X|c1\t1000\t1020\tmir-1
M1\tgnl|X|c1\t2000\t2020\tmir-2
M1\tgnl|X|c1\t3000\t3020\tmir-2
"
            .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn split_by_cutoff() {
        let merger = EnergyMerge { window: 150, site_span: 36, cutoff: -15.0 };
        let rows = vec![
            rnaup("mir-1", 900, 152, -18.2),
            rnaup("mir-1", 1000, 152, -10.0),
            // duplex in the flank
            rnaup("mir-2", 2000, 20, -30.0),
        ];
        let (valid, discarded) = merger.merge(&results(), &rows).unwrap();
        assert_eq!(valid.header().len(), 12);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid.rows()[0][2], "900");
        assert_eq!(valid.rows()[0][8], "-18.2");
        assert_eq!(discarded.len(), 3);
        assert_eq!(discarded.rows()[1][8], "");
    }

    #[test]
    fn joins_every_duplex_of_a_site() {
        let merger = EnergyMerge { window: 150, site_span: 36, cutoff: -15.0 };
        let mut rows: Vec<RnaupRow> = (0..2000).map(|i| rnaup("mir-9", 10_000 + i, 152, -20.0)).collect();
        rows.push(rnaup("mir-1", 900, 153, -16.0));
        rows.push(rnaup("mir-1", 900, 152, -18.2));
        let (valid, discarded) = merger.merge(&results(), &rows).unwrap();
        assert_eq!(valid.len(), 2);
        assert_eq!(valid.rows()[0][5], "153");
        assert_eq!(valid.rows()[1][5], "152");
        assert_eq!(discarded.len(), 3);
    }

    #[test]
    fn no_rnaup_results() {
        let merger = EnergyMerge { window: 150, site_span: 36, cutoff: -15.0 };
        let (valid, discarded) = merger.merge(&results(), &[]).unwrap();
        assert!(valid.is_empty());
        assert_eq!(valid.header().len(), 12);
        assert_eq!(discarded.len(), 4);
    }

    #[test]
    fn on_site_bounds() {
        let merger = EnergyMerge { window: 150, site_span: 36, cutoff: 0.0 };
        assert!(!merger.on_site(&rnaup("m", 1, 150, 0.0)));
        assert!(merger.on_site(&rnaup("m", 1, 151, 0.0)));
        // pos2 = 185 is the last position inside
        assert!(merger.on_site(&rnaup("m", 1, 167, 0.0)));
        assert!(!merger.on_site(&rnaup("m", 1, 168, 0.0)));
    }

    #[test]
    fn run_writes_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let rna_dir = dir.path().join("rnaup");
        std::fs::create_dir_all(&rna_dir).unwrap();
        let results_file = dir.path().join("results.tsv");
        results().to_file(&results_file).unwrap();

        let cli = CLI {
            rna_dir: rna_dir.to_string_lossy().into_owned(),
            results: results_file.to_string_lossy().into_owned(),
            out_dir: dir.path().join("final").to_string_lossy().into_owned(),
            settings: Settings::default(),
        };
        assert!(cli.run().is_err());

        let cli = CLI { settings: Settings::default().with_dg_cutoff(Some(-15.0)), ..cli };
        cli.run().unwrap();
        assert!(rna_dir.join(SUMMARY_FILE).exists());
        let valid = std::fs::read_to_string(dir.path().join("final").join(VALID_FILE)).unwrap();
        assert_eq!(valid.lines().count(), 1);
        let discarded = Table::from_file(dir.path().join("final").join(DISCARDED_FILE)).unwrap();
        assert_eq!(discarded.len(), 4);
    }
}
