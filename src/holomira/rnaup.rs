use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use regex::Regex;

use crate::interval::parse_position;
use crate::layout::files_with_suffix;
use crate::rnaup_inputs::METADATA_FILE;
use crate::table::Table;

pub const RNAUP_SUFFIX: &str = "_rnaup.txt";

pub const SUMMARY_HEADER: [&str; 11] = [
    "Contig", "Start", "End", "miRNA", "pos1", "pos2", "miRNA_pairing", "dG_total", "dG_binding",
    "dG_opening_target", "dG_opening_miRNA",
];

/// Duplex positions and free energies from the alignment line of an
/// RNAup result.
#[derive(Debug, Clone, PartialEq)]
pub struct RnaupAlignment {
    pub pos1: u64,
    pub pos2: u64,
    pub mirna_pairing: String,
    pub dg_total: f64,
    pub dg_binding: f64,
    pub dg_opening_target: f64,
    pub dg_opening_mirna: f64,
}

impl RnaupAlignment {
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.pos1.to_string(),
            self.pos2.to_string(),
            self.mirna_pairing.clone(),
            self.dg_total.to_string(),
            self.dg_binding.to_string(),
            self.dg_opening_target.to_string(),
            self.dg_opening_mirna.to_string(),
        ]
    }
}

/// The binding site an RNAup input was prepared for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RnaupSite {
    pub mirna: String,
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RnaupRow {
    pub site: RnaupSite,
    pub alignment: RnaupAlignment,
}

impl RnaupRow {
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.site.contig.clone(),
            self.site.start.to_string(),
            self.site.end.to_string(),
            self.site.mirna.clone(),
        ];
        fields.extend(self.alignment.fields());
        fields
    }
}

pub struct RnaupParser {
    energy: Regex,
    coords: Regex,
    file_name: Regex,
}

impl RnaupParser {
    pub fn new() -> Result<Self> {
        Ok(RnaupParser {
            energy: Regex::new(r"\(([-\d\.]+) = ([-\d\.]+) \+ ([-\d\.]+) \+ ([-\d\.]+)\)")?,
            coords: Regex::new(r"(\d+),(\d+)\s+:\s+(\d+,\d+)")?,
            file_name: Regex::new(r"^(.+?)_(gnl_X_.+?)_(\d+)_(\d+)_rnaup\.txt$")?,
        })
    }

    /// Parses RNAup output text. The first non-blank line is the header and
    /// the second holds the duplex.
    pub fn alignment(&self, text: &str) -> Option<RnaupAlignment> {
        let align_line = text.lines().map(str::trim).filter(|l| !l.is_empty()).nth(1)?;

        let energy = self.energy.captures(align_line)?;
        let coords = self.coords.captures(align_line)?;
        Some(RnaupAlignment {
            pos1: coords[1].parse().ok()?,
            pos2: coords[2].parse().ok()?,
            mirna_pairing: coords[3].to_string(),
            dg_total: energy[1].parse().ok()?,
            dg_binding: energy[2].parse().ok()?,
            dg_opening_target: energy[3].parse().ok()?,
            dg_opening_mirna: energy[4].parse().ok()?,
        })
    }

    /// Site encoded in a result file name such as
    /// `mir-1_gnl_X_c1_900_920_rnaup.txt`, for inputs without metadata.
    pub fn site_from_file_name(&self, name: &str) -> Option<RnaupSite> {
        let caps = self.file_name.captures(name)?;
        Some(RnaupSite {
            mirna: caps[1].to_string(),
            contig: caps[2].replacen("gnl_X_", "gnl|X|", 1),
            start: caps[3].parse().ok()?,
            end: caps[4].parse().ok()?,
        })
    }
}

/// Sites listed in the `input_metadata.tsv` of a directory, keyed by input
/// name without its `.fa` extension. A missing file gives no sites.
pub fn read_metadata(dir: &Path) -> Result<HashMap<String, RnaupSite>> {
    let path = dir.join(METADATA_FILE);
    let mut sites = HashMap::new();
    if !path.exists() {
        return Ok(sites);
    }
    let table = Table::from_file(&path)?;
    if table.header().is_empty() {
        return Ok(sites);
    }
    let cols = table.columns(&["file", "miRNA", "Contig", "Start", "End"])?;
    for row in table.rows().iter() {
        let (start, end) = match (parse_position(&row[cols[3]]), parse_position(&row[cols[4]])) {
            (Some(s), Some(e)) => (s, e),
            _ => continue,
        };
        let stem = row[cols[0]].strip_suffix(".fa").unwrap_or(&row[cols[0]]).to_string();
        sites.insert(
            stem,
            RnaupSite { mirna: row[cols[1]].clone(), contig: row[cols[2]].clone(), start, end },
        );
    }
    Ok(sites)
}

/// Every parseable `*_rnaup.txt` below `rna_dir`.
pub fn scan_rnaup_dir(rna_dir: &Path) -> Result<Vec<RnaupRow>> {
    let parser = RnaupParser::new()?;
    let mut metadata: HashMap<PathBuf, HashMap<String, RnaupSite>> = HashMap::new();
    let mut rows = Vec::new();

    for path in files_with_suffix(rna_dir, RNAUP_SUFFIX)? {
        let file_name = path.file_name().map_or(String::new(), |f| f.to_string_lossy().into_owned());
        let stem = file_name.trim_end_matches(RNAUP_SUFFIX);

        let bytes = std::fs::read(&path).with_context(|| format!("reading {:?}", path))?;
        let alignment = match parser.alignment(&String::from_utf8_lossy(&bytes)) {
            Some(a) => a,
            None => {
                warn!("No duplex found in {:?}, skipping", path);
                continue;
            }
        };

        let dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        if !metadata.contains_key(&dir) {
            metadata.insert(dir.clone(), read_metadata(&dir)?);
        }
        let site = metadata
            .get(&dir)
            .and_then(|sites| sites.get(stem).cloned())
            .or_else(|| parser.site_from_file_name(&file_name));

        match site {
            Some(site) => rows.push(RnaupRow { site, alignment }),
            None => warn!("Cannot tell the binding site of {:?}, skipping", path),
        }
    }

    info!("Parsed {} RNAup results under {:?}", rows.len(), rna_dir);
    Ok(rows)
}

pub fn summary_table(rows: &[RnaupRow]) -> Result<Table> {
    let mut table = Table::new(&SUMMARY_HEADER);
    for row in rows.iter() {
        table.push(row.fields())?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT: &str = ">mir-1_gnl_X_c1_900_920
(((((((.&.))))))) 152,170 : 1,19  (-18.20 = -25.40 + 6.10 + 1.10)
UAGCUUAU&AUAAGCUA
";

    #[test]
    fn parse_duplex_line() {
        let parser = RnaupParser::new().unwrap();
        let a = parser.alignment(RESULT).unwrap();
        assert_eq!((a.pos1, a.pos2), (152, 170));
        assert_eq!(a.mirna_pairing, "1,19");
        assert_eq!(a.dg_total, -18.2);
        assert_eq!(a.dg_opening_mirna, 1.1);
        assert_eq!(a.fields()[3], "-18.2");

        assert!(parser.alignment(">only a header\n").is_none());
        assert!(parser.alignment(">h\nno energies here\n").is_none());
    }

    #[test]
    fn site_from_name() {
        let parser = RnaupParser::new().unwrap();
        let site = parser.site_from_file_name("mir-1_gnl_X_c1_900_920_rnaup.txt").unwrap();
        assert_eq!(site.mirna, "mir-1");
        assert_eq!(site.contig, "gnl|X|c1");
        assert_eq!((site.start, site.end), (900, 920));
        assert!(parser.site_from_file_name("mir-1_contig_1_900_920_rnaup.txt").is_none());
    }

    #[test]
    fn scan_uses_metadata_first() {
        let dir = tempfile::tempdir().unwrap();
        let batch = dir.path().join("batch1");
        std::fs::create_dir_all(&batch).unwrap();
        std::fs::write(
            batch.join(METADATA_FILE),
            "file\tmiRNA\tContig\tStart\tEnd\nmir-2_k141_7_50_70.fa\tmir-2\tk141.7\t50\t70\n",
        )
        .unwrap();
        std::fs::write(batch.join("mir-2_k141_7_50_70_rnaup.txt"), RESULT).unwrap();
        std::fs::write(dir.path().join("mir-1_gnl_X_c1_900_920_rnaup.txt"), RESULT).unwrap();
        std::fs::write(dir.path().join("unknown_site_rnaup.txt"), RESULT).unwrap();
        let mut latin1 = RESULT.as_bytes().to_vec();
        latin1.insert(3, 0xe9);
        std::fs::write(dir.path().join("mir-3_gnl_X_c2_1_20_rnaup.txt"), latin1).unwrap();

        let rows = scan_rnaup_dir(dir.path()).unwrap();
        assert_eq!(rows.len(), 3);
        let contigs: Vec<&str> = rows.iter().map(|r| r.site.contig.as_str()).collect();
        assert!(contigs.contains(&"k141.7"));
        assert!(contigs.contains(&"gnl|X|c1"));
        assert!(contigs.contains(&"gnl|X|c2"));

        let summary = summary_table(&rows).unwrap();
        assert_eq!(summary.header().len(), 11);
        assert_eq!(summary.len(), 3);
    }
}
