//! Upstream project descriptor.

/// Identity of the upstream toolbox this renderer follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub homepage: &'static str,
    pub url: &'static str,
    /// Archive checksum, when the source is pinned to a release.
    pub sha256: Option<&'static str>,
    pub license: &'static str,
    pub dependencies: &'static [&'static str],
}

pub const TASCAR: PackageDescriptor = PackageDescriptor {
    name: "Tascar",
    description: "Toolbox for Acoustic Scene Creation And Rendering",
    homepage: "https://github.com/gisogrimm/tascar",
    url: "https://github.com/gisogrimm/tascar/archive/refs/heads/master.tar.gz",
    sha256: None,
    license: "GPL-2.0-only",
    dependencies: &[
        "jack",
        "fftw",
        "xerces-c",
        "eigen",
        "gsl",
        "liblo",
        "libsndfile",
        "gtkmm3",
        "libltc",
        "libmatio",
        "gtksourceviewmm",
    ],
};

impl std::fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} - {}", self.name, self.description)?;
        writeln!(f, "homepage: {}", self.homepage)?;
        writeln!(f, "source:   {}", self.url)?;
        if let Some(sha256) = self.sha256 {
            writeln!(f, "sha256:   {sha256}")?;
        }
        writeln!(f, "license:  {}", self.license)?;
        write!(f, "depends:  {}", self.dependencies.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_lists_dependencies_in_order() {
        let text = TASCAR.to_string();
        assert!(text.starts_with("Tascar - "));
        assert!(text.contains("depends:  jack, fftw, xerces-c"));
        assert!(!text.contains("sha256"));
        assert_eq!(TASCAR.dependencies.len(), 11);
    }
}
