use crate::error::{LoadError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// LoadMode / HostEnvironment
// ---------------------------------------------------------------------------

/// Whether packages are fetched as pre-bundled artifacts or as sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    Build,
    #[default]
    Dev,
}

impl LoadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadMode::Build => "build",
            LoadMode::Dev => "dev",
        }
    }

    pub fn is_build(self) -> bool {
        matches!(self, LoadMode::Build)
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadMode {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "build" => Ok(LoadMode::Build),
            "dev" => Ok(LoadMode::Dev),
            other => Err(LoadError::InvalidConfiguration(format!(
                "unknown load mode '{other}': expected 'build' or 'dev'"
            ))),
        }
    }
}

/// What the loader needs to know about the hosting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnvironment {
    pub app_name: String,
    pub mode: LoadMode,
}

impl HostEnvironment {
    pub fn new(app_name: impl Into<String>, mode: LoadMode) -> Self {
        Self {
            app_name: app_name.into(),
            mode,
        }
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Script,
    Stylesheet,
}

/// One fetchable file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub kind: AssetKind,
    pub url: String,
}

impl Asset {
    pub fn script(url: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Script,
            url: url.into(),
        }
    }

    pub fn stylesheet(url: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Stylesheet,
            url: url.into(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AssetKind::Script => write!(f, "script {}", self.url),
            AssetKind::Stylesheet => write!(f, "stylesheet {}", self.url),
        }
    }
}

// ---------------------------------------------------------------------------
// PackageDefaults
// ---------------------------------------------------------------------------

/// Loader-wide fallbacks for paths a descriptor leaves unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDefaults {
    pub package_path: String,
    pub package_build_path: String,
}

impl Default for PackageDefaults {
    fn default() -> Self {
        Self {
            package_path: paths::DEFAULT_PACKAGE_PATH.to_string(),
            package_build_path: paths::DEFAULT_PACKAGE_BUILD_PATH.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// PackageDescriptor
// ---------------------------------------------------------------------------

/// A loadable package as declared by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_build_path: Option<String>,
    /// Classes to load individually in dev mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains_css: Option<bool>,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_path: None,
            package_build_path: None,
            requires: Vec::new(),
            contains_css: None,
        }
    }

    pub fn with_requires<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_css(mut self, contains_css: bool) -> Self {
        self.contains_css = Some(contains_css);
        self
    }

    pub fn with_package_path(mut self, path: impl Into<String>) -> Self {
        self.package_path = Some(path.into());
        self
    }

    pub fn with_build_path(mut self, path: impl Into<String>) -> Self {
        self.package_build_path = Some(path.into());
        self
    }

    /// Fill unset fields from `defaults`. The descriptor itself is untouched.
    pub fn resolve(&self, defaults: &PackageDefaults) -> Result<ResolvedPackage> {
        paths::validate_namespace(&self.name)?;
        Ok(ResolvedPackage {
            name: self.name.clone(),
            package_path: self
                .package_path
                .clone()
                .unwrap_or_else(|| defaults.package_path.clone()),
            package_build_path: self
                .package_build_path
                .clone()
                .unwrap_or_else(|| defaults.package_build_path.clone()),
            requires: self.requires.clone(),
            contains_css: self.contains_css.unwrap_or(false),
        })
    }
}

/// Merge two package lists by name; the first declaration of a name wins.
pub fn merge_packages(
    base: Vec<PackageDescriptor>,
    extra: Vec<PackageDescriptor>,
) -> Vec<PackageDescriptor> {
    let mut seen = HashSet::new();
    base.into_iter()
        .chain(extra)
        .filter(|p| seen.insert(p.name.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// ResolvedPackage
// ---------------------------------------------------------------------------

/// A descriptor with every default applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub package_path: String,
    pub package_build_path: String,
    pub requires: Vec<String>,
    pub contains_css: bool,
}

impl ResolvedPackage {
    pub fn build_script_url(&self) -> String {
        paths::build_script_url(&self.package_build_path, &self.name)
    }

    pub fn source_root(&self) -> String {
        paths::source_root(&self.package_path, &self.name)
    }

    /// Source URL for every required class, in declaration order.
    pub fn requirement_urls(&self) -> Result<Vec<(String, String)>> {
        let root = self.source_root();
        self.requires
            .iter()
            .map(|class| {
                paths::class_source_url(&root, &self.name, class)
                    .map(|url| (class.clone(), url))
                    .ok_or_else(|| LoadError::UnresolvableClass {
                        package: self.name.clone(),
                        class: class.clone(),
                    })
            })
            .collect()
    }

    /// Stylesheet for this package under `mode`, or `None` without CSS.
    pub fn stylesheet_url(&self, env: &HostEnvironment) -> Option<String> {
        if !self.contains_css {
            return None;
        }
        Some(match env.mode {
            LoadMode::Build => paths::build_stylesheet_url(&self.package_build_path, &self.name),
            LoadMode::Dev => {
                paths::dev_stylesheet_url(&env.app_name, &self.package_build_path, &self.name)
            }
        })
    }

    /// Every asset this package fetches under `env`, scripts first.
    pub fn plan(&self, env: &HostEnvironment) -> Result<Vec<Asset>> {
        let mut assets = match env.mode {
            LoadMode::Build => vec![Asset::script(self.build_script_url())],
            LoadMode::Dev => self
                .requirement_urls()?
                .into_iter()
                .map(|(_, url)| Asset::script(url))
                .collect(),
        };
        if let Some(css) = self.stylesheet_url(env) {
            assets.push(Asset::stylesheet(css));
        }
        Ok(assets)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dev() -> HostEnvironment {
        HostEnvironment::new("MyApp", LoadMode::Dev)
    }

    fn build() -> HostEnvironment {
        HostEnvironment::new("MyApp", LoadMode::Build)
    }

    #[test]
    fn resolve_applies_defaults() {
        let pkg = PackageDescriptor::new("Shop")
            .resolve(&PackageDefaults::default())
            .unwrap();
        assert_eq!(pkg.package_path, "../packages/local/");
        assert_eq!(pkg.package_build_path, "../");
        assert!(!pkg.contains_css);
        assert!(pkg.requires.is_empty());
    }

    #[test]
    fn resolve_keeps_explicit_paths() {
        let pkg = PackageDescriptor::new("Shop")
            .with_build_path("/assets/")
            .with_package_path("/src/")
            .with_css(true)
            .resolve(&PackageDefaults::default())
            .unwrap();
        assert_eq!(pkg.build_script_url(), "/assets/Shop/Shop.js");
        assert_eq!(pkg.source_root(), "/src/Shop/src");
        assert!(pkg.contains_css);
    }

    #[test]
    fn resolve_rejects_invalid_name() {
        let err = PackageDescriptor::new("")
            .resolve(&PackageDefaults::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidConfiguration(_)));
    }

    #[test]
    fn build_plan_is_artifact_then_css() {
        let pkg = PackageDescriptor::new("A")
            .with_css(true)
            .resolve(&PackageDefaults::default())
            .unwrap();
        assert_eq!(
            pkg.plan(&build()).unwrap(),
            vec![
                Asset::script("../A/A.js"),
                Asset::stylesheet("../A/resources/A-all.css"),
            ]
        );
    }

    #[test]
    fn dev_plan_lists_each_requirement() {
        let pkg = PackageDescriptor::new("Shop")
            .with_requires(["Shop.view.main.Main", "Shop.model.Cart"])
            .with_css(true)
            .resolve(&PackageDefaults::default())
            .unwrap();
        assert_eq!(
            pkg.plan(&dev()).unwrap(),
            vec![
                Asset::script("../packages/local/Shop/src/view/main/Main.js"),
                Asset::script("../packages/local/Shop/src/model/Cart.js"),
                Asset::stylesheet("../build/production/MyApp/../Shop/resources/Shop-all.css"),
            ]
        );
    }

    #[test]
    fn dev_plan_without_requirements_is_empty() {
        let pkg = PackageDescriptor::new("Shop")
            .resolve(&PackageDefaults::default())
            .unwrap();
        assert!(pkg.plan(&dev()).unwrap().is_empty());
    }

    #[test]
    fn foreign_requirement_is_unresolvable() {
        let pkg = PackageDescriptor::new("Shop")
            .with_requires(["Cart.view.Main"])
            .resolve(&PackageDefaults::default())
            .unwrap();
        let err = pkg.requirement_urls().unwrap_err();
        assert!(matches!(err, LoadError::UnresolvableClass { ref class, .. } if class == "Cart.view.Main"));
        assert_eq!(err.package(), Some("Shop"));
    }

    #[test]
    fn merge_keeps_first_declaration() {
        let merged = merge_packages(
            vec![PackageDescriptor::new("A"), PackageDescriptor::new("B")],
            vec![
                PackageDescriptor::new("B").with_css(true),
                PackageDescriptor::new("C"),
            ],
        );
        let names: Vec<&str> = merged.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(merged[1].contains_css, None);
    }

    #[test]
    fn load_mode_parses() {
        assert_eq!("build".parse::<LoadMode>().unwrap(), LoadMode::Build);
        assert_eq!("dev".parse::<LoadMode>().unwrap(), LoadMode::Dev);
        assert!("prod".parse::<LoadMode>().is_err());
    }

    #[test]
    fn descriptor_deserializes_from_yaml() {
        let yaml = "name: Shop\nrequires: [Shop.view.main.Main]\ncontains_css: true\n";
        let pkg: PackageDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(pkg.name, "Shop");
        assert_eq!(pkg.requires, vec!["Shop.view.main.Main".to_string()]);
        assert_eq!(pkg.contains_css, Some(true));
        assert_eq!(pkg.package_path, None);
    }
}
