use std::fmt;

use anyhow::{bail, Context, Result};
use bio_types::strand::Strand;

/// Genomic interval as named by the extractor in its FASTA headers,
/// `contig:start-end` or `contig:start-end(strand)`, with a 0-based
/// half-open start and end.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    contig: String,
    start0: u64,
    end: u64,
    strand: Strand,
}

impl Region {
    pub fn new(contig: &str, start0: u64, end: u64, strand: Strand) -> Self {
        Region { contig: contig.to_string(), start0, end, strand }
    }

    pub fn from_header(header: &str) -> Result<Self> {
        let name = header.split_whitespace().next().unwrap_or("");
        let (contig, coords) = name
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("No coordinates in header {:?}", header))?;

        let (range, strand) = match coords.find('(') {
            Some(paren) => {
                let strand_str = coords[paren..].trim_start_matches('(').trim_end_matches(')');
                (&coords[..paren], parse_strand(strand_str)?)
            }
            None => (coords, Strand::Unknown),
        };

        let (start_str, end_str) = range
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("Malformed range {:?} in header {:?}", range, header))?;
        let start0 = start_str
            .parse::<u64>()
            .with_context(|| format!("Bad start in header {:?}", header))?;
        let end = end_str
            .parse::<u64>()
            .with_context(|| format!("Bad end in header {:?}", header))?;
        if contig.is_empty() || end < start0 {
            bail!("Malformed region header {:?}", header);
        }

        Ok(Region::new(contig, start0, end, strand))
    }

    pub fn contig(&self) -> &str { &self.contig }
    pub fn start0(&self) -> u64 { self.start0 }
    pub fn end(&self) -> u64 { self.end }
    pub fn strand(&self) -> Strand { self.strand }
    pub fn len(&self) -> u64 { self.end - self.start0 }

    pub fn bed_line(&self) -> String {
        format!("{}\t{}\t{}", self.contig, self.start0, self.end)
    }

    /// True when the 1-based site `start..=end` on `contig` falls in this
    /// region, compared against the header coordinates as written.
    pub fn covers(&self, contig: &str, start: u64, end: u64) -> bool {
        self.contig == contig && self.start0 <= start && end <= self.end
    }

    /// True when the header coordinates agree with `start` and `end` up to
    /// `tol` positions at each end.
    pub fn matches(&self, contig: &str, start: u64, end: u64, tol: u64) -> bool {
        self.contig == contig && self.start0.abs_diff(start) <= tol && self.end.abs_diff(end) <= tol
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start0, self.end)?;
        match self.strand {
            Strand::Unknown => Ok(()),
            s => write!(f, "({})", strand_symbol(s)),
        }
    }
}

/// Parses a 1-based coordinate as written in a result table. Integral
/// floats such as `1200.0` are accepted.
pub fn parse_position(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Ok(pos) = s.parse::<u64>() {
        return Some(pos);
    }
    match s.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f.is_finite() => Some(f as u64),
        _ => None,
    }
}

pub fn parse_strand(s: &str) -> Result<Strand> {
    match s {
        "+" => Ok(Strand::Forward),
        "-" => Ok(Strand::Reverse),
        "." | "?" | "" => Ok(Strand::Unknown),
        _ => bail!("Bad strand {:?}", s),
    }
}

pub fn strand_symbol(strand: Strand) -> &'static str {
    match strand {
        Strand::Forward => "+",
        Strand::Reverse => "-",
        Strand::Unknown => ".",
    }
}
