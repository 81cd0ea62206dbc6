//! Domain types for the `codesync.json` configuration.
//!
//! Every path stored in the config is a forward-slash string relative to
//! [`SyncConfig::src_dir`]. The on-disk field names are camelCase.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::version;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a remote project. Stable across renames.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a component within a project. Stable across renames.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub String);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Per-component skeleton policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Skeleton is a thin regenerable wrapper.
    #[default]
    Blackbox,
    /// Skeleton is hand-edited; updates go through the merge path.
    Direct,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Blackbox => write!(f, "blackbox"),
            Scheme::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blackbox" => Ok(Scheme::Blackbox),
            "direct" => Ok(Scheme::Direct),
            other => Err(format!(
                "unknown scheme '{other}'; expected: blackbox, direct"
            )),
        }
    }
}

/// Script flavour of generated modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ts,
    Js,
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lang::Ts => write!(f, "ts"),
            Lang::Js => write!(f, "js"),
        }
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ts" | "typescript" => Ok(Lang::Ts),
            "js" | "javascript" => Ok(Lang::Js),
            other => Err(format!("unknown lang '{other}'; expected: ts, js")),
        }
    }
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// How the skeleton module of a component is imported by its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpec {
    pub module_path: String,
}

/// A synced component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    pub id: ComponentId,
    pub name: String,
    pub project_id: ProjectId,
    /// `None` until materialized from [`CodeConfig::scheme`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    pub import_spec: ImportSpec,
    pub render_module_file_path: String,
    pub css_file_path: String,
}

impl ComponentConfig {
    /// Scheme in effect, falling back to the project-wide default.
    pub fn effective_scheme(&self, default: Scheme) -> Scheme {
        self.scheme.unwrap_or(default)
    }
}

/// A synced icon asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconConfig {
    pub id: String,
    pub name: String,
    pub module_file_path: String,
}

/// A synced project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub project_id: ProjectId,
    pub project_name: String,
    /// Stored version range (`latest`, `^1.2.0`, ...).
    pub version: String,
    #[serde(default)]
    pub css_file_path: String,
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconConfig>,
}

impl ProjectConfig {
    pub fn new(project_id: ProjectId, project_name: impl Into<String>) -> Self {
        Self {
            project_id,
            project_name: project_name.into(),
            version: version::LATEST.to_owned(),
            css_file_path: String::new(),
            components: vec![],
            icons: vec![],
        }
    }

    pub fn component(&self, id: &ComponentId) -> Option<&ComponentConfig> {
        self.components.iter().find(|c| &c.id == id)
    }

    pub fn component_mut(&mut self, id: &ComponentId) -> Option<&mut ComponentConfig> {
        self.components.iter_mut().find(|c| &c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CodeConfig {
    #[serde(default)]
    pub lang: Lang,
    #[serde(default)]
    pub scheme: Scheme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StyleConfig {
    #[serde(default)]
    pub default_style_css_file_path: String,
}

/// A global variant group and the context module that provides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalVariantGroupConfig {
    pub id: String,
    pub name: String,
    pub project_id: ProjectId,
    pub context_file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GlobalVariantsConfig {
    #[serde(default)]
    pub variant_groups: Vec<GlobalVariantGroupConfig>,
}

/// Root of `codesync.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default = "default_src_dir")]
    pub src_dir: String,
    /// Directory (relative to `src_dir`) holding generated modules.
    #[serde(rename = "defaultPlasmicDir", default = "default_managed_dir")]
    pub default_managed_dir: String,
    #[serde(default)]
    pub code: CodeConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
    #[serde(default)]
    pub global_variants: GlobalVariantsConfig,
    #[serde(default)]
    pub post_sync_commands: Vec<String>,
}

pub fn default_src_dir() -> String {
    "./src/components".to_owned()
}

pub fn default_managed_dir() -> String {
    "./codesync".to_owned()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            default_managed_dir: default_managed_dir(),
            code: CodeConfig::default(),
            style: StyleConfig::default(),
            projects: vec![],
            global_variants: GlobalVariantsConfig::default(),
            post_sync_commands: vec![],
        }
    }
}

impl SyncConfig {
    pub fn project(&self, id: &ProjectId) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| &p.project_id == id)
    }

    pub fn project_mut(&mut self, id: &ProjectId) -> Option<&mut ProjectConfig> {
        self.projects.iter_mut().find(|p| &p.project_id == id)
    }

    /// Looks a component up across every project.
    pub fn find_component(&self, id: &ComponentId) -> Option<&ComponentConfig> {
        self.projects.iter().find_map(|p| p.component(id))
    }

    /// Whether any stored project already lists this component.
    pub fn knows_component(&self, id: &ComponentId) -> bool {
        self.find_component(id).is_some()
    }

    pub fn global_variant(&self, id: &str) -> Option<&GlobalVariantGroupConfig> {
        self.global_variants.variant_groups.iter().find(|g| g.id == id)
    }

    pub fn find_icon(&self, id: &str) -> Option<&IconConfig> {
        self.projects
            .iter()
            .find_map(|p| p.icons.iter().find(|i| i.id == id))
    }

    /// Default every unset component scheme to `code.scheme`.
    ///
    /// Returns how many components were updated.
    pub fn materialize_schemes(&mut self) -> usize {
        let default = self.code.scheme;
        let mut updated = 0;
        for component in self.projects.iter_mut().flat_map(|p| p.components.iter_mut()) {
            if component.scheme.is_none() {
                component.scheme = Some(default);
                updated += 1;
            }
        }
        updated
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: &str, scheme: Option<Scheme>) -> ComponentConfig {
        ComponentConfig {
            id: ComponentId::from(id),
            name: id.to_uppercase(),
            project_id: ProjectId::from("p1"),
            scheme,
            import_spec: ImportSpec {
                module_path: format!("{id}.tsx"),
            },
            render_module_file_path: format!("codesync/p1/Plasmic{id}.tsx"),
            css_file_path: format!("codesync/p1/Plasmic{id}.css"),
        }
    }

    #[test]
    fn newtype_display() {
        assert_eq!(ProjectId::from("p1").to_string(), "p1");
        assert_eq!(ComponentId::from("c-01").to_string(), "c-01");
    }

    #[test]
    fn scheme_parses_case_insensitively() {
        assert_eq!("Direct".parse::<Scheme>(), Ok(Scheme::Direct));
        assert_eq!("blackbox".parse::<Scheme>(), Ok(Scheme::Blackbox));
        assert!("plain".parse::<Scheme>().is_err());
    }

    #[test]
    fn config_uses_camel_case_keys() {
        let mut cfg = SyncConfig::default();
        let mut project = ProjectConfig::new(ProjectId::from("p1"), "Website");
        project.components.push(component("btn", Some(Scheme::Direct)));
        cfg.projects.push(project);

        let json = serde_json::to_string(&cfg).expect("serialize");
        assert!(json.contains("\"defaultPlasmicDir\""));
        assert!(json.contains("\"renderModuleFilePath\""));
        assert!(json.contains("\"importSpec\":{\"modulePath\":\"btn.tsx\"}"));
        assert!(json.contains("\"scheme\":\"direct\""));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: SyncConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(cfg, SyncConfig::default());
    }

    #[test]
    fn materialize_only_touches_unset_schemes() {
        let mut cfg = SyncConfig::default();
        cfg.code.scheme = Scheme::Direct;
        let mut project = ProjectConfig::new(ProjectId::from("p1"), "Website");
        project.components.push(component("a", None));
        project.components.push(component("b", Some(Scheme::Blackbox)));
        cfg.projects.push(project);

        assert_eq!(cfg.materialize_schemes(), 1);
        let p = &cfg.projects[0];
        assert_eq!(p.components[0].scheme, Some(Scheme::Direct));
        assert_eq!(p.components[1].scheme, Some(Scheme::Blackbox));
        assert_eq!(cfg.materialize_schemes(), 0);
    }

    #[test]
    fn find_component_searches_all_projects() {
        let mut cfg = SyncConfig::default();
        let mut p2 = ProjectConfig::new(ProjectId::from("p2"), "Lib");
        p2.components.push(component("x", None));
        cfg.projects.push(ProjectConfig::new(ProjectId::from("p1"), "Site"));
        cfg.projects.push(p2);
        assert!(cfg.knows_component(&ComponentId::from("x")));
        assert!(!cfg.knows_component(&ComponentId::from("y")));
    }
}
