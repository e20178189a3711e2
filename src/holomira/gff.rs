use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use bio_types::strand::Strand;
use log::warn;

use crate::interval::{parse_strand, strand_symbol};

/// One feature line of a GFF file. Coordinates are 1-based and
/// inclusive; columns other than the position and strand are carried
/// through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct GffRecord {
    seqname: String,
    source: String,
    feature: String,
    start: u64,
    end: u64,
    score: String,
    strand: Strand,
    frame: String,
    attributes: String,
}

impl GffRecord {
    pub fn new(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim_end_matches(&['\r', '\n'][..]).split('\t').collect();
        if fields.len() < 9 {
            bail!("Expected 9 columns, got {} in {:?}", fields.len(), line);
        }

        Ok(GffRecord {
            seqname: fields[0].trim().to_string(),
            source: fields[1].to_string(),
            feature: fields[2].to_string(),
            start: fields[3].parse::<u64>().with_context(|| format!("Bad start in {:?}", line))?,
            end: fields[4].parse::<u64>().with_context(|| format!("Bad end in {:?}", line))?,
            score: fields[5].to_string(),
            strand: parse_strand(fields[6])?,
            frame: fields[7].to_string(),
            attributes: fields[8].to_string(),
        })
    }

    pub fn seqname(&self) -> &str { &self.seqname }
    pub fn feature(&self) -> &str { &self.feature }
    pub fn start(&self) -> u64 { self.start }
    pub fn end(&self) -> u64 { self.end }
    pub fn strand(&self) -> Strand { self.strand }
    pub fn attributes(&self) -> &str { &self.attributes }

    /// The first `;`-separated attribute, normally `ID=...`.
    pub fn first_attribute(&self) -> &str {
        self.attributes.split(';').next().unwrap_or("")
    }

    /// Window around the five-prime end of the feature: `upstream`
    /// positions before it and `downstream` positions into it, clipped at
    /// the start of the sequence.
    pub fn five_prime(&self, upstream: u64, downstream: u64) -> GffRecord {
        let (start0, stop) = if matches!(self.strand, Strand::Reverse) {
            (self.end as i64 - downstream as i64, self.end + upstream)
        } else {
            let start0 = self.start as i64 - 1;
            (start0 - upstream as i64, (start0 + downstream as i64).max(0) as u64)
        };

        let mut shifted = self.clone();
        shifted.start = start0.max(0) as u64 + 1;
        shifted.end = stop.max(shifted.start);
        shifted
    }

    pub fn line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.seqname,
            self.source,
            self.feature,
            self.start,
            self.end,
            self.score,
            strand_symbol(self.strand),
            self.frame,
            self.attributes
        )
    }
}

/// Reads the feature lines of a GFF file, skipping comments and stopping
/// at an embedded `##FASTA` section. Short lines are dropped with a
/// warning.
pub fn read_gff<R: Read>(input: R) -> Result<Vec<GffRecord>> {
    let mut records = Vec::new();

    for (line_no, line_res) in BufReader::new(input).lines().enumerate() {
        let line = line_res?;
        if line.starts_with("##FASTA") {
            break;
        }
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        match GffRecord::new(&line) {
            Ok(rec) => records.push(rec),
            Err(e) => warn!("Skipping GFF line {}: {}", line_no + 1, e),
        }
    }

    Ok(records)
}

pub fn read_gff_file<P: AsRef<Path>>(filename: P) -> Result<Vec<GffRecord>> {
    let file = std::fs::File::open(filename.as_ref())
        .with_context(|| format!("opening GFF {:?}", filename.as_ref()))?;
    read_gff(file)
}

pub fn write_gff<W: Write>(out: W, records: &[GffRecord]) -> Result<()> {
    let mut gffout = std::io::BufWriter::new(out);
    for rec in records.iter() {
        writeln!(gffout, "{}", rec.line())?;
    }
    gffout.flush()?;
    Ok(())
}

/// Gene locus line of an `_IDs.txt` table: contig, start, end, strand and
/// the first GFF attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct LocusId {
    contig: String,
    start: u64,
    end: u64,
    strand: Strand,
    id: String,
}

impl LocusId {
    pub fn from_gff(rec: &GffRecord) -> Self {
        LocusId {
            contig: rec.seqname().to_string(),
            start: rec.start(),
            end: rec.end(),
            strand: rec.strand(),
            id: rec.first_attribute().to_string(),
        }
    }

    pub fn new(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 5 {
            bail!("Expected 5 columns, got {} in {:?}", fields.len(), line);
        }
        Ok(LocusId {
            contig: fields[0].to_string(),
            start: fields[1].parse::<u64>().with_context(|| format!("Bad start in {:?}", line))?,
            end: fields[2].parse::<u64>().with_context(|| format!("Bad end in {:?}", line))?,
            strand: parse_strand(fields[3])?,
            id: fields[4].trim_end().to_string(),
        })
    }

    pub fn contig(&self) -> &str { &self.contig }
    pub fn start(&self) -> u64 { self.start }
    pub fn end(&self) -> u64 { self.end }
    pub fn strand(&self) -> Strand { self.strand }

    pub fn locus_tag(&self) -> &str {
        self.id.strip_prefix("ID=").unwrap_or(&self.id)
    }

    /// 0-based position of the five-prime end: the base before the start
    /// on the forward strand, the end on the reverse strand.
    pub fn five_prime_pos(&self) -> u64 {
        if matches!(self.strand, Strand::Reverse) {
            self.end
        } else {
            self.start.saturating_sub(1)
        }
    }

    pub fn line(&self) -> String {
        format!("{}\t{}\t{}\t{}\t{}", self.contig, self.start, self.end, strand_symbol(self.strand), self.id)
    }
}

pub fn read_locus_ids<P: AsRef<Path>>(filename: P) -> Result<Vec<LocusId>> {
    let file = std::fs::File::open(filename.as_ref())
        .with_context(|| format!("opening locus table {:?}", filename.as_ref()))?;
    let mut loci = Vec::new();
    for (line_no, line_res) in BufReader::new(file).lines().enumerate() {
        let line = line_res?;
        if line.trim().is_empty() {
            continue;
        }
        match LocusId::new(&line) {
            Ok(locus) => loci.push(locus),
            Err(e) => warn!("Skipping locus line {}: {}", line_no + 1, e),
        }
    }
    Ok(loci)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDS_GFF: &str = "##gff-version 3
contig_1\tProdigal:002006\tCDS\t101\t400\t.\t+\t0\tID=ABC_00001;inference=ab initio;product=hypothetical protein
contig_1\tProdigal:002006\tCDS\t601\t900\t.\t-\t0\tID=ABC_00002;gene=rpoB_2
short\tline
##FASTA
>contig_1
ACGT
";

    #[test]
    fn reads_features() {
        let recs = read_gff(CDS_GFF.as_bytes()).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].first_attribute(), "ID=ABC_00001");
        assert_eq!(recs[1].strand(), Strand::Reverse);
        assert_eq!(LocusId::from_gff(&recs[1]).line(), "contig_1\t601\t900\t-\tID=ABC_00002");
    }

    #[test]
    fn five_prime_windows() {
        let recs = read_gff(CDS_GFF.as_bytes()).unwrap();

        let fwd = recs[0].five_prime(50, 10);
        assert_eq!((fwd.start(), fwd.end()), (51, 110));

        let rev = recs[1].five_prime(50, 10);
        assert_eq!((rev.start(), rev.end()), (891, 950));

        let clipped = recs[0].five_prime(500, 0);
        assert_eq!((clipped.start(), clipped.end()), (1, 100));
        assert_eq!(clipped.attributes(), recs[0].attributes());

        let empty = recs[0].five_prime(0, 0);
        assert_eq!((empty.start(), empty.end()), (101, 101));
        let empty = recs[1].five_prime(0, 0);
        assert!(empty.start() <= empty.end());
    }

    #[test]
    fn locus_ids() {
        let locus = LocusId::new("contig_1\t601\t900\t-\tID=ABC_00002").unwrap();
        assert_eq!(locus.locus_tag(), "ABC_00002");
        assert_eq!(locus.five_prime_pos(), 900);
        let locus = LocusId::new("contig_1\t101\t400\t+\tID=ABC_00001").unwrap();
        assert_eq!(locus.five_prime_pos(), 100);
        assert!(LocusId::new("contig_1\t101\t400").is_err());
    }
}
