use crate::error::{LoadError, Result};
use crate::package::{
    merge_packages, HostEnvironment, LoadMode, PackageDefaults, PackageDescriptor,
};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PanelConfig
// ---------------------------------------------------------------------------

/// Declarative settings for one lazy panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Package namespace to load on first render. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_xtype: Option<String>,
    #[serde(default = "default_main_config")]
    pub main_config: serde_json::Value,
    #[serde(default = "default_loading_text")]
    pub loading_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_build_path: Option<String>,
    #[serde(default)]
    pub contains_css: bool,
}

fn default_main_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_loading_text() -> String {
    paths::DEFAULT_LOADING_TEXT.to_string()
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            id: None,
            module: None,
            main_class: None,
            main_xtype: None,
            main_config: default_main_config(),
            loading_text: default_loading_text(),
            package_path: None,
            package_build_path: None,
            contains_css: false,
        }
    }
}

impl PanelConfig {
    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            ..Self::default()
        }
    }

    pub fn with_main_class(mut self, class: impl Into<String>) -> Self {
        self.main_class = Some(class.into());
        self
    }

    pub fn with_main_xtype(mut self, xtype: impl Into<String>) -> Self {
        self.main_xtype = Some(xtype.into());
        self
    }

    pub fn with_main_config(mut self, config: serde_json::Value) -> Self {
        self.main_config = config;
        self
    }

    pub fn with_css(mut self, contains_css: bool) -> Self {
        self.contains_css = contains_css;
        self
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// The application manifest: loader defaults, packages and panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default)]
    pub mode: LoadMode,
    #[serde(default = "default_package_path")]
    pub package_path: String,
    #[serde(default = "default_package_build_path")]
    pub package_build_path: String,
    #[serde(default)]
    pub packages: Vec<PackageDescriptor>,
    /// Packages contributed at runtime on top of `packages`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_packages: Vec<PackageDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panels: Vec<PanelConfig>,
}

fn default_package_path() -> String {
    paths::DEFAULT_PACKAGE_PATH.to_string()
}

fn default_package_build_path() -> String {
    paths::DEFAULT_PACKAGE_BUILD_PATH.to_string()
}

impl AppConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: LoadMode::default(),
            package_path: default_package_path(),
            package_build_path: default_package_build_path(),
            packages: Vec::new(),
            extra_packages: Vec::new(),
            panels: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LoadError::Config(format!(
                "manifest not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: AppConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.to_yaml()?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Write a starter manifest unless one exists. Returns true if written.
    pub fn init(path: &Path, name: &str) -> Result<bool> {
        let data = Self::new(name).to_yaml()?;
        crate::io::write_if_missing(path, data.as_bytes())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn defaults(&self) -> PackageDefaults {
        PackageDefaults {
            package_path: self.package_path.clone(),
            package_build_path: self.package_build_path.clone(),
        }
    }

    pub fn environment(&self) -> HostEnvironment {
        HostEnvironment::new(self.name.clone(), self.mode)
    }

    /// `packages` followed by any `extra_packages` not already declared.
    pub fn all_packages(&self) -> Vec<PackageDescriptor> {
        merge_packages(self.packages.clone(), self.extra_packages.clone())
    }

    pub fn panel(&self, module: &str) -> Option<&PanelConfig> {
        self.panels
            .iter()
            .find(|p| p.module.as_deref() == Some(module) || p.id.as_deref() == Some(module))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "application name is empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for pkg in self.packages.iter().chain(&self.extra_packages) {
            if let Err(e) = paths::validate_namespace(&pkg.name) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: e.to_string(),
                });
                continue;
            }
            if !seen.insert(pkg.name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("package '{}' is declared more than once", pkg.name),
                });
            }
            if self.mode.is_build() && !pkg.requires.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "package '{}' lists requires, which are ignored in build mode",
                        pkg.name
                    ),
                });
            }
            let foreign: Vec<&str> = pkg
                .requires
                .iter()
                .filter(|c| !c.starts_with(&format!("{}.", pkg.name)))
                .map(String::as_str)
                .collect();
            if !foreign.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "package '{}' requires classes outside its namespace: {}",
                        pkg.name,
                        foreign.join(", ")
                    ),
                });
            }
        }

        for (i, panel) in self.panels.iter().enumerate() {
            match panel.module.as_deref() {
                None | Some("") => warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("panel #{i} has no module"),
                }),
                Some(module) => {
                    if panel.main_class.is_some() && panel.main_xtype.is_some() {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Warning,
                            message: format!(
                                "panel '{module}' sets both main_class and main_xtype; main_class wins"
                            ),
                        });
                    }
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
