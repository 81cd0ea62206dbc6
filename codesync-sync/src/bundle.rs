//! Wire types exchanged with the code-generation service.
//!
//! Fetch responses arrive as a flat list of [`BundleEntry`] values tagged by
//! `kind`. Nothing downstream touches an entry before
//! [`ProjectBundle::from_entries`] or [`icons_from_entries`] has validated it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use codesync_core::{ComponentId, ProjectId, Scheme};

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// One user-requested project, as sent to the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSyncTarget {
    pub project_id: ProjectId,
    pub version_range: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_id_or_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub projects: Vec<ProjectSyncTarget>,
    pub recursive: bool,
    pub include_dependencies: bool,
}

/// A project pinned to a single version for this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedProject {
    pub project_id: ProjectId,
    pub project_name: String,
    pub version: String,
    #[serde(default)]
    pub component_ids: Vec<ComponentId>,
    #[serde(default)]
    pub icon_ids: Vec<String>,
    /// Pulled in as a dependency rather than requested by the user.
    #[serde(default)]
    pub indirect: bool,
}

/// Two root requests that cannot be satisfied together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConflict {
    pub project_id: ProjectId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    #[serde(default)]
    pub projects: Vec<ResolvedProject>,
    #[serde(default)]
    pub conflicts: Vec<ResolveConflict>,
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub project_id: ProjectId,
    /// Exact version pinned by resolution.
    pub version: String,
    pub version_range: String,
    pub component_ids: Vec<ComponentId>,
    /// Stored schemes of components that already exist locally.
    pub existing_schemes: BTreeMap<ComponentId, Scheme>,
    pub new_component_scheme: Scheme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    #[serde(default)]
    pub entries: Vec<BundleEntry>,
    /// Icons referenced by the generated code.
    #[serde(default)]
    pub icon_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconsRequest {
    pub project_id: ProjectId,
    pub version_range: String,
    pub icon_ids: Vec<String>,
}

/// Site-wide default stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StyleBundle {
    pub default_style_css_file_name: String,
    pub default_style_css_rules: String,
}

// ---------------------------------------------------------------------------
// Bundle entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetaBundle {
    pub project_id: ProjectId,
    pub project_name: String,
    pub css_file_name: String,
    pub css_rules: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBundle {
    pub id: ComponentId,
    pub component_name: String,
    pub skeleton_module_file_name: String,
    pub skeleton_module: String,
    pub render_module_file_name: String,
    pub render_module: String,
    pub css_file_name: String,
    pub css_rules: String,
    /// Per-node identity map (node name → stable uuid) used by the merger.
    #[serde(default)]
    pub name_in_id_to_uuid: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalVariantBundle {
    pub id: String,
    pub name: String,
    pub context_file_name: String,
    pub context_module: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconBundle {
    pub id: String,
    pub name: String,
    pub module_file_name: String,
    pub module: String,
}

/// One element of a fetch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BundleEntry {
    Project(ProjectMetaBundle),
    Component(ComponentBundle),
    GlobalVariant(GlobalVariantBundle),
    Icon(IconBundle),
}

impl BundleEntry {
    fn kind(&self) -> &'static str {
        match self {
            BundleEntry::Project(_) => "project",
            BundleEntry::Component(_) => "component",
            BundleEntry::GlobalVariant(_) => "globalVariant",
            BundleEntry::Icon(_) => "icon",
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    #[error("expected exactly one project entry for {project_id}, found {found}")]
    ProjectEntryCount { project_id: String, found: usize },

    #[error("project entry is for {found}, but {expected} was requested")]
    ProjectMismatch { expected: String, found: String },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{kind} entry has an empty {field}")]
    EmptyField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("{kind} file name {name:?} must be a relative path without `..`")]
    UnsafeFileName { kind: &'static str, name: String },

    #[error("unexpected {found} entry in {context} response")]
    UnexpectedEntry {
        found: &'static str,
        context: &'static str,
    },
}

/// A validated fetch response for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBundle {
    pub project: ProjectMetaBundle,
    pub components: Vec<ComponentBundle>,
    pub global_variants: Vec<GlobalVariantBundle>,
    pub icon_ids: Vec<String>,
}

impl ProjectBundle {
    pub fn from_entries(
        expected: &ProjectId,
        response: FetchResponse,
    ) -> Result<ProjectBundle, BundleError> {
        let mut projects = Vec::new();
        let mut components: Vec<ComponentBundle> = Vec::new();
        let mut global_variants: Vec<GlobalVariantBundle> = Vec::new();

        for entry in response.entries {
            match entry {
                BundleEntry::Project(p) => projects.push(p),
                BundleEntry::Component(c) => {
                    require("component", "id", &c.id.0)?;
                    require("component", "componentName", &c.component_name)?;
                    check_file_name("component", &c.skeleton_module_file_name)?;
                    check_file_name("component", &c.render_module_file_name)?;
                    check_file_name("component", &c.css_file_name)?;
                    if components.iter().any(|other| other.id == c.id) {
                        return Err(BundleError::DuplicateId {
                            kind: "component",
                            id: c.id.0,
                        });
                    }
                    components.push(c);
                }
                BundleEntry::GlobalVariant(g) => {
                    require("globalVariant", "id", &g.id)?;
                    check_file_name("globalVariant", &g.context_file_name)?;
                    if global_variants.iter().any(|other| other.id == g.id) {
                        return Err(BundleError::DuplicateId {
                            kind: "globalVariant",
                            id: g.id,
                        });
                    }
                    global_variants.push(g);
                }
                other @ BundleEntry::Icon(_) => {
                    return Err(BundleError::UnexpectedEntry {
                        found: other.kind(),
                        context: "component",
                    })
                }
            }
        }

        if projects.len() != 1 {
            return Err(BundleError::ProjectEntryCount {
                project_id: expected.0.clone(),
                found: projects.len(),
            });
        }
        let project = projects.remove(0);
        if &project.project_id != expected {
            return Err(BundleError::ProjectMismatch {
                expected: expected.0.clone(),
                found: project.project_id.0,
            });
        }
        check_file_name("project", &project.css_file_name)?;

        let mut seen = BTreeSet::new();
        let icon_ids = response
            .icon_ids
            .into_iter()
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();

        Ok(ProjectBundle {
            project,
            components,
            global_variants,
            icon_ids,
        })
    }
}

/// Validate an icon fetch response.
pub fn icons_from_entries(entries: Vec<BundleEntry>) -> Result<Vec<IconBundle>, BundleError> {
    let mut icons: Vec<IconBundle> = Vec::new();
    for entry in entries {
        match entry {
            BundleEntry::Icon(icon) => {
                require("icon", "id", &icon.id)?;
                check_file_name("icon", &icon.module_file_name)?;
                if icons.iter().any(|other| other.id == icon.id) {
                    return Err(BundleError::DuplicateId {
                        kind: "icon",
                        id: icon.id,
                    });
                }
                icons.push(icon);
            }
            other => {
                return Err(BundleError::UnexpectedEntry {
                    found: other.kind(),
                    context: "icon",
                })
            }
        }
    }
    Ok(icons)
}

fn require(kind: &'static str, field: &'static str, value: &str) -> Result<(), BundleError> {
    if value.trim().is_empty() {
        return Err(BundleError::EmptyField { kind, field });
    }
    Ok(())
}

fn check_file_name(kind: &'static str, name: &str) -> Result<(), BundleError> {
    require(kind, "file name", name)?;
    let unsafe_name = name.starts_with('/')
        || name.starts_with('\\')
        || name.contains(':')
        || name.split(['/', '\\']).any(|part| part == "..");
    if unsafe_name {
        return Err(BundleError::UnsafeFileName {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_entry(id: &str) -> BundleEntry {
        BundleEntry::Project(ProjectMetaBundle {
            project_id: ProjectId::from(id),
            project_name: "Site".into(),
            css_file_name: "plasmic__site.css".into(),
            css_rules: ".root {}".into(),
        })
    }

    fn component_entry(id: &str, skeleton_file: &str) -> BundleEntry {
        BundleEntry::Component(ComponentBundle {
            id: ComponentId::from(id),
            component_name: "Button".into(),
            skeleton_module_file_name: skeleton_file.into(),
            skeleton_module: "export default Button;".into(),
            render_module_file_name: "PlasmicButton.tsx".into(),
            render_module: "render".into(),
            css_file_name: "PlasmicButton.css".into(),
            css_rules: ".btn {}".into(),
            name_in_id_to_uuid: BTreeMap::new(),
        })
    }

    #[test]
    fn entries_deserialize_by_kind_tag() {
        let json = r#"{
            "entries": [
                {"kind": "project", "projectId": "p1", "projectName": "Site",
                 "cssFileName": "site.css", "cssRules": ""},
                {"kind": "globalVariant", "id": "gv1", "name": "Theme",
                 "contextFileName": "PlasmicGlobalVariant__Theme.tsx", "contextModule": "ctx"}
            ],
            "iconIds": ["i1", "i1", ""]
        }"#;
        let response: FetchResponse = serde_json::from_str(json).expect("deserialize");
        let bundle = ProjectBundle::from_entries(&ProjectId::from("p1"), response).expect("valid");
        assert_eq!(bundle.global_variants.len(), 1);
        assert_eq!(bundle.icon_ids, vec!["i1".to_string()]);
    }

    #[test]
    fn missing_project_entry_is_rejected() {
        let response = FetchResponse {
            entries: vec![component_entry("c1", "Button.tsx")],
            icon_ids: vec![],
        };
        let err = ProjectBundle::from_entries(&ProjectId::from("p1"), response).unwrap_err();
        assert!(matches!(err, BundleError::ProjectEntryCount { found: 0, .. }));
    }

    #[test]
    fn project_entry_for_other_project_is_rejected() {
        let response = FetchResponse {
            entries: vec![project_entry("p2")],
            icon_ids: vec![],
        };
        let err = ProjectBundle::from_entries(&ProjectId::from("p1"), response).unwrap_err();
        assert!(matches!(err, BundleError::ProjectMismatch { .. }));
    }

    #[test]
    fn duplicate_component_ids_are_rejected() {
        let response = FetchResponse {
            entries: vec![
                project_entry("p1"),
                component_entry("c1", "Button.tsx"),
                component_entry("c1", "Other.tsx"),
            ],
            icon_ids: vec![],
        };
        let err = ProjectBundle::from_entries(&ProjectId::from("p1"), response).unwrap_err();
        assert_eq!(
            err,
            BundleError::DuplicateId {
                kind: "component",
                id: "c1".into()
            }
        );
    }

    #[test]
    fn traversal_in_file_names_is_rejected() {
        for name in ["../Button.tsx", "/etc/passwd", "a/../../b.tsx", "C:\\x.tsx"] {
            let response = FetchResponse {
                entries: vec![project_entry("p1"), component_entry("c1", name)],
                icon_ids: vec![],
            };
            let err = ProjectBundle::from_entries(&ProjectId::from("p1"), response).unwrap_err();
            assert!(
                matches!(err, BundleError::UnsafeFileName { .. }),
                "{name} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn icon_response_rejects_other_kinds() {
        let err = icons_from_entries(vec![project_entry("p1")]).unwrap_err();
        assert!(matches!(err, BundleError::UnexpectedEntry { found: "project", .. }));
    }
}
