use std::fs;
use std::io::Read as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bedtools::Bedtools;

/// Pipeline-wide settings, optionally read from a TOML file. Values given
/// on the command line take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    bedtools: Option<String>,
    window: Option<u64>,
    site_span: Option<u64>,
    tolerance: Option<u64>,
    feature_type: Option<String>,
    dg_cutoff: Option<f64>,
}

impl Settings {
    pub const DEFAULT_BEDTOOLS: &'static str = "bedtools";
    pub const DEFAULT_WINDOW: u64 = 150;
    pub const DEFAULT_SITE_SPAN: u64 = 36;
    pub const DEFAULT_TOLERANCE: u64 = 1;
    pub const DEFAULT_FEATURE_TYPE: &'static str = "gene";

    pub fn from_file(config_file: &str) -> Result<Self> {
        let mut file = fs::File::open(config_file)
            .with_context(|| format!("opening config file {:?}", config_file))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .with_context(|| format!("reading config file {:?}", config_file))?;
        Self::from_toml(&contents).with_context(|| format!("parsing config file {:?}", config_file))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(config_file: Option<&str>) -> Result<Self> {
        match config_file {
            Some(f) => Self::from_file(f),
            None => Ok(Self::default()),
        }
    }

    pub fn bedtools_program(&self) -> PathBuf {
        PathBuf::from(self.bedtools.as_deref().unwrap_or(Self::DEFAULT_BEDTOOLS))
    }

    pub fn extractor(&self) -> Bedtools {
        Bedtools::new(self.bedtools_program())
    }

    /// Half-width of the window around a binding site centre.
    pub fn window(&self) -> u64 { self.window.unwrap_or(Self::DEFAULT_WINDOW) }

    /// Length past the window centre in which an RNAup site must end.
    pub fn site_span(&self) -> u64 { self.site_span.unwrap_or(Self::DEFAULT_SITE_SPAN) }

    pub fn tolerance(&self) -> u64 { self.tolerance.unwrap_or(Self::DEFAULT_TOLERANCE) }

    pub fn feature_type(&self) -> &str {
        self.feature_type.as_deref().unwrap_or(Self::DEFAULT_FEATURE_TYPE)
    }

    pub fn dg_cutoff(&self) -> Option<f64> { self.dg_cutoff }

    pub fn with_bedtools(mut self, bedtools: Option<&str>) -> Self {
        if let Some(b) = bedtools {
            self.bedtools = Some(b.to_string());
        }
        self
    }

    pub fn with_window(mut self, window: Option<u64>) -> Self {
        if window.is_some() {
            self.window = window;
        }
        self
    }

    pub fn with_feature_type(mut self, feature_type: Option<&str>) -> Self {
        if let Some(ft) = feature_type {
            self.feature_type = Some(ft.to_string());
        }
        self
    }

    pub fn with_dg_cutoff(mut self, dg_cutoff: Option<f64>) -> Self {
        if dg_cutoff.is_some() {
            self.dg_cutoff = dg_cutoff;
        }
        self
    }
}
