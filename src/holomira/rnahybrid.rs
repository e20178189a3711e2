use anyhow::{bail, Context, Result};
use bio_types::strand::Strand;

use crate::interval::Region;

/// Fields following the target name in an RNAhybrid compact (`-c`)
/// output line.
const TRAILING_FIELDS: usize = 10;

/// One RNAhybrid hit from compact output:
/// `target:target_len:mirna:mirna_len:mfe:pvalue:position:t_unbound:t_bound:m_bound:m_unbound`,
/// where the target name is an extracted window `contig:start-end(strand)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RnahybridHit {
    window: Region,
    mirna: String,
    mfe: String,
    pvalue: String,
    position: u64,
    span: u64,
}

impl RnahybridHit {
    pub fn new(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < TRAILING_FIELDS + 2 {
            bail!("Too few fields ({}) in RNAhybrid line {:?}", fields.len(), line);
        }
        let (target_fields, rest) = fields.split_at(fields.len() - TRAILING_FIELDS);
        let window = Region::from_header(&target_fields.join(":"))?;

        let mfe = rest[3].trim();
        mfe.parse::<f64>().with_context(|| format!("Bad mfe {:?}", mfe))?;
        let pvalue = rest[4].trim();
        pvalue.parse::<f64>().with_context(|| format!("Bad p-value {:?}", pvalue))?;
        let position = rest[5]
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Bad position {:?}", rest[5]))?;
        if position == 0 {
            bail!("Position must be 1-based in {:?}", line);
        }

        Ok(RnahybridHit {
            window,
            mirna: rest[1].trim().to_string(),
            mfe: mfe.to_string(),
            pvalue: pvalue.to_string(),
            position,
            span: target_span(rest[6], rest[7]),
        })
    }

    pub fn window(&self) -> &Region { &self.window }
    pub fn mirna(&self) -> &str { &self.mirna }
    pub fn mfe(&self) -> &str { &self.mfe }
    pub fn pvalue(&self) -> &str { &self.pvalue }
    pub fn position(&self) -> u64 { self.position }
    pub fn span(&self) -> u64 { self.span }

    /// 1-based genomic start and end of the binding site. The hit position
    /// counts from the five-prime end of the extracted target, which is
    /// the window end on the reverse strand.
    pub fn site(&self) -> (u64, u64) {
        let span = self.span.max(1);
        if matches!(self.window.strand(), Strand::Reverse) {
            let end = (self.window.end() + 1).saturating_sub(self.position);
            (end.saturating_sub(span - 1).max(1), end)
        } else {
            let start = self.window.start0() + self.position;
            (start, start + span - 1)
        }
    }
}

/// Number of target nucleotides in the alignment, from the unbound and
/// bound target lines.
pub fn target_span(unbound: &str, bound: &str) -> u64 {
    let unbound = unbound.as_bytes();
    let bound = bound.as_bytes();
    let width = unbound.len().max(bound.len());
    (0..width)
        .filter(|&i| {
            let u = unbound.get(i).copied().unwrap_or(b' ');
            let b = bound.get(i).copied().unwrap_or(b' ');
            u != b' ' || b != b' '
        })
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const FWD: &str = "contig_1:850-1150(+):300:hsa-miR-21-5p:22:-25.3:0.001234:41:A     U        A  :  GUCAGU AGCCUGCUAA :  UAGUUG UCGGAUGAUU :        C          ";

    #[test]
    fn parse_forward_hit() {
        let hit = RnahybridHit::new(FWD).unwrap();
        assert_eq!(hit.window().contig(), "contig_1");
        assert_eq!(hit.mirna(), "hsa-miR-21-5p");
        assert_eq!(hit.mfe(), "-25.3");
        assert_eq!(hit.position(), 41);
        assert_eq!(hit.span(), 17);
        assert_eq!(hit.site(), (891, 907));
    }

    #[test]
    fn reverse_strand_site() {
        let line = FWD.replace("(+)", "(-)");
        let hit = RnahybridHit::new(&line).unwrap();
        // five-prime end of the target is position 1150
        assert_eq!(hit.site(), (1094, 1110));
    }

    #[test]
    fn span_counts_target_columns() {
        assert_eq!(target_span("A  G", " CC "), 4);
        assert_eq!(target_span("A   ", " C"), 2);
        assert_eq!(target_span("", ""), 0);
    }

    #[test]
    fn rejects_malformed() {
        assert!(RnahybridHit::new("contig_1:850-1150(+):300:mir:22").is_err());
        assert!(RnahybridHit::new(&FWD.replace(":-25.3:", ":abc:")).is_err());
    }
}
