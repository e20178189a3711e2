use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory layout shared by every step of the pipeline under a common
/// output directory.
#[derive(Debug, Clone)]
pub struct OutDir {
    root: PathBuf,
}

impl OutDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        OutDir { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn annotation(&self) -> PathBuf { self.root.join("annotation") }

    pub fn mag_dir(&self, mag: &str) -> PathBuf { self.annotation().join(mag) }

    pub fn mag_file(&self, mag: &str, suffix: &str) -> PathBuf {
        self.mag_dir(mag).join(format!("{}{}", mag, suffix))
    }

    pub fn function(&self) -> PathBuf { self.root.join("function") }

    pub fn mirna_env_dir(&self, env: &str) -> PathBuf {
        self.function().join(format!("miRNA_{}", env))
    }

    pub fn mag_env_dir(&self, env: &str) -> PathBuf {
        self.function().join(format!("MAGs_{}", env))
    }

    pub fn rnahybrid(&self) -> PathBuf { self.root.join("rnahybrid") }

    pub fn bsites(&self, mag: &str) -> PathBuf {
        self.rnahybrid().join(format!("{}_bsites.tsv", mag))
    }

    pub fn sample_results(&self, mag: &str) -> PathBuf {
        self.rnahybrid().join(format!("{}_finalresults.tsv", mag))
    }

    pub fn final_results(&self) -> PathBuf { self.root.join("final_results") }

    pub fn all_results(&self) -> PathBuf {
        self.final_results().join("HolomiRA_results.tsv")
    }

    pub fn target_fasta(&self) -> PathBuf { self.root.join("target_fasta") }

    pub fn plots(&self) -> PathBuf { self.root.join("plots") }

    /// Names of the MAG directories under `annotation/`, sorted.
    pub fn mag_names(&self) -> Result<Vec<String>> {
        subdir_names(self.annotation())
    }
}

pub fn subdir_names<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if !dir.as_ref().is_dir() {
        return Ok(names);
    }
    for entry_res in std::fs::read_dir(dir.as_ref())
        .with_context(|| format!("listing {:?}", dir.as_ref()))?
    {
        let entry = entry_res?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// All files below `dir`, recursively, whose names end in `suffix`,
/// sorted by path.
pub fn files_with_suffix<P: AsRef<Path>>(dir: P, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.as_ref().to_path_buf()];
    while let Some(d) = pending.pop() {
        for entry_res in std::fs::read_dir(&d).with_context(|| format!("listing {:?}", d))? {
            let entry = entry_res?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if entry.file_name().to_string_lossy().ends_with(suffix) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

pub fn output_filename<Q: AsRef<Path>>(out_base: Q, name: &str) -> PathBuf {
    let mut namebase = out_base
        .as_ref()
        .file_name()
        .map_or(std::ffi::OsString::new(), std::ffi::OsStr::to_os_string);
    namebase.push(name);
    out_base.as_ref().with_file_name(namebase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        assert_eq!(
            output_filename("out/structure/sig_hits", "_merged.fna"),
            PathBuf::from("out/structure/sig_hits_merged.fna")
        );
        let out = OutDir::new("run");
        assert_eq!(out.mag_file("MAG1", "_cds.gff"), PathBuf::from("run/annotation/MAG1/MAG1_cds.gff"));
        assert_eq!(out.mirna_env_dir("gut"), PathBuf::from("run/function/miRNA_gut"));
    }

    #[test]
    fn finds_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/x.fna"), ">c\nA\n").unwrap();
        std::fs::write(dir.path().join("a/b/y.fna"), ">d\nC\n").unwrap();
        std::fs::write(dir.path().join("a/b/z.txt"), "").unwrap();
        let found = files_with_suffix(dir.path(), ".fna").unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().unwrap() == "fna"));
        assert_eq!(subdir_names(dir.path()).unwrap(), vec!["a"]);
    }
}
