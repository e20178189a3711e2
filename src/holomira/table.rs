use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use log::warn;

/// Tab-delimited table with a header line, held as ordered rows of
/// strings. Rows whose field count disagrees with the header are dropped
/// with a warning while reading, and invalid UTF-8 is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(header: &[S]) -> Self {
        Table {
            header: header.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let file = std::fs::File::open(filename.as_ref())
            .with_context(|| format!("opening table {:?}", filename.as_ref()))?;
        Self::read(file).with_context(|| format!("reading table {:?}", filename.as_ref()))
    }

    pub fn read<R: Read>(input: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        let mut records = reader.byte_records();

        let header: Vec<String> = match records.next() {
            Some(rec) => rec?.iter().map(|f| String::from_utf8_lossy(f).trim().to_string()).collect(),
            None => return Ok(Table { header: Vec::new(), rows: Vec::new() }),
        };

        let mut rows = Vec::new();
        for rec_res in records {
            let rec = rec_res?;
            let line_no = rec.position().map_or(0, |p| p.line());
            let fields: Vec<String> = rec.iter().map(|f| String::from_utf8_lossy(f).trim_end().to_string()).collect();
            if fields.len() != header.len() {
                warn!(
                    "Line {} has {} columns instead of {}, skipping: {:?}",
                    line_no,
                    fields.len(),
                    header.len(),
                    fields
                );
                continue;
            }
            if std::str::from_utf8(rec.as_slice()).is_err() {
                warn!("Line {} is not valid UTF-8, replacing bad bytes", line_no);
            }
            rows.push(fields);
        }

        Ok(Table { header, rows })
    }

    pub fn to_file<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let file = std::fs::File::create(filename.as_ref())
            .with_context(|| format!("creating table {:?}", filename.as_ref()))?;
        self.write(file)
    }

    pub fn write<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(out);
        if !self.header.is_empty() {
            writer.write_record(&self.header)?;
        }
        for row in self.rows.iter() {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn header(&self) -> &[String] { &self.header }
    pub fn rows(&self) -> &[Vec<String>] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Result<usize> {
        match self.header.iter().position(|h| h == name) {
            Some(idx) => Ok(idx),
            None => bail!("Missing column {:?} in header {:?}", name, self.header),
        }
    }

    /// Column indices for all of `names`, failing with the full list of
    /// missing columns.
    pub fn columns(&self, names: &[&str]) -> Result<Vec<usize>> {
        let missing: Vec<&str> = names.iter().copied().filter(|n| !self.has_column(n)).collect();
        if !missing.is_empty() {
            bail!("Missing columns {:?}", missing);
        }
        names.iter().map(|n| self.column(n)).collect()
    }

    pub fn push(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.header.len() {
            bail!("Row has {} fields, table has {} columns: {:?}", row.len(), self.header.len(), row);
        }
        self.rows.push(row);
        Ok(())
    }

    /// Drops repeated rows, keeping the first occurrence.
    pub fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
    }

    /// Appends all rows of `other`, which must carry the same header.
    pub fn append(&mut self, other: Table) -> Result<()> {
        if self.header.is_empty() && self.rows.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.header != self.header {
            bail!("Header mismatch: {:?} vs {:?}", self.header, other.header);
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Distinct values of a column in order of first appearance.
    pub fn distinct(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column(name)?;
        Ok(self.rows.iter().map(|r| r[idx].clone()).unique().collect())
    }
}
