use std::collections::HashMap;
use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use bio_types::strand::Strand;
use itertools::Itertools;
use log::{info, warn};

use crate::config::Settings;
use crate::gff::{read_locus_ids, LocusId};
use crate::interval::{strand_symbol, Region};
use crate::layout::OutDir;
use crate::rnahybrid::RnahybridHit;
use crate::table::Table;

pub const BSITES_HEADER: [&str; 13] = [
    "sample", "seq", "start", "end", "mir", "ID", "mfe", "p", "gene", "strand", "product", "gene_start", "gene_end",
];

/// Binding sites of one MAG: RNAhybrid hits on five-prime windows joined
/// to the gene loci and their annotation.
pub struct CLI {
    pub mag: String,
    pub out_dir: String,
    pub rnahybrid: String,
    pub settings: Settings,
}

impl CLI {
    pub fn run(&self) -> Result<()> {
        let out = OutDir::new(&self.out_dir);

        let hits = read_hits(&self.rnahybrid)?;
        let loci = read_locus_ids(out.mag_file(&self.mag, "_IDs.txt"))?;
        let annotation = Annotation::from_file(
            out.mag_file(&self.mag, ".tsv"),
            self.settings.feature_type(),
        )?;

        let table = binding_sites(&self.mag, &hits, &loci, &annotation, self.settings.tolerance())?;

        std::fs::create_dir_all(out.rnahybrid())?;
        table.to_file(out.bsites(&self.mag))?;
        info!("{}: {} hits, {} binding site rows", self.mag, hits.len(), table.len());
        Ok(())
    }
}

pub fn read_hits(filename: &str) -> Result<Vec<RnahybridHit>> {
    let file = std::fs::File::open(filename).with_context(|| format!("opening {:?}", filename))?;
    let mut hits = Vec::new();
    for (line_no, line_res) in BufReader::new(file).lines().enumerate() {
        let line = line_res?;
        if line.trim().is_empty() {
            continue;
        }
        match RnahybridHit::new(&line) {
            Ok(hit) => hits.push(hit),
            Err(e) => warn!("Skipping RNAhybrid line {}: {}", line_no + 1, e),
        }
    }
    Ok(hits)
}

/// Gene name and product per locus tag, from a genome annotation table
/// with `locus_tag`, `ftype` and `gene` columns.
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    genes: HashMap<String, Vec<(String, String)>>,
}

impl Annotation {
    pub fn from_file<P: AsRef<std::path::Path>>(filename: P, feature_type: &str) -> Result<Self> {
        Self::from_table(&Table::from_file(filename)?, feature_type)
    }

    pub fn from_table(table: &Table, feature_type: &str) -> Result<Self> {
        let cols = table.columns(&["locus_tag", "ftype", "gene"])?;
        let product_col = if table.has_column("product") { Some(table.column("product")?) } else { None };

        let mut genes: HashMap<String, Vec<(String, String)>> = HashMap::new();
        for row in table.rows().iter().filter(|r| r[cols[1]] == feature_type) {
            let gene = row[cols[2]].split('_').next().unwrap_or("").to_string();
            let product = product_col.map_or(String::new(), |c| row[c].clone());
            let entry = genes.entry(row[cols[0]].clone()).or_default();
            if !entry.contains(&(gene.clone(), product.clone())) {
                entry.push((gene, product));
            }
        }

        Ok(Annotation { genes })
    }

    pub fn get(&self, locus_tag: &str) -> &[(String, String)] {
        self.genes.get(locus_tag).map_or(&[], |v| v.as_slice())
    }
}

/// True when the five-prime end of `locus` lies in `window`, give or take
/// `tol` positions, on a compatible strand.
pub fn window_hits_locus(window: &Region, locus: &LocusId, tol: u64) -> bool {
    if window.contig() != locus.contig() {
        return false;
    }
    let lo = window.start0().saturating_sub(tol);
    let hi = window.end() + tol;
    let inside = |pos: u64| lo <= pos && pos <= hi;

    match (window.strand(), locus.strand()) {
        (Strand::Unknown, _) => inside(locus.start().saturating_sub(1)) || inside(locus.end()),
        (_, Strand::Unknown) | (Strand::Forward, Strand::Forward) | (Strand::Reverse, Strand::Reverse) => {
            inside(locus.five_prime_pos())
        }
        _ => false,
    }
}

pub fn binding_sites(
    mag: &str,
    hits: &[RnahybridHit],
    loci: &[LocusId],
    annotation: &Annotation,
    tol: u64,
) -> Result<Table> {
    let by_contig = loci.iter().into_group_map_by(|locus| locus.contig().to_string());

    let mut table = Table::new(&BSITES_HEADER);
    for hit in hits.iter() {
        let candidates = match by_contig.get(hit.window().contig()) {
            Some(c) => c,
            None => continue,
        };
        let (start, end) = hit.site();

        for locus in candidates.iter().filter(|l| window_hits_locus(hit.window(), l, tol)) {
            for (gene, product) in annotation.get(locus.locus_tag()) {
                let row = vec![
                    mag.to_string(),
                    hit.window().contig().to_string(),
                    start.to_string(),
                    end.to_string(),
                    hit.mirna().to_string(),
                    locus.locus_tag().to_string(),
                    hit.mfe().to_string(),
                    hit.pvalue().to_string(),
                    gene.clone(),
                    strand_symbol(locus.strand()).to_string(),
                    product.clone(),
                    locus.start().to_string(),
                    locus.end().to_string(),
                ];
                table.push(row)?;
            }
        }
    }
    table.dedup();
    Ok(table)
}
