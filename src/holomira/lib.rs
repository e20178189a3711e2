pub mod bedtools;
pub mod bsites;
pub mod config;
pub mod env_counts;
pub mod fasta;
pub mod fiveprime;
pub mod format_gff;
pub mod gff;
pub mod impacted;
pub mod interval;
pub mod layout;
pub mod merge_rnaup;
pub mod results;
pub mod rnahybrid;
pub mod rnaup;
pub mod rnaup_inputs;
pub mod summary;
pub mod superfocus;
pub mod table;
pub mod top;
pub mod venn;
pub mod windows;
