#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use codesync_core::{config, ComponentId, ProjectId, SyncConfig};
use codesync_sync::bundle::{
    BundleEntry, ComponentBundle, FetchRequest, FetchResponse, IconBundle, IconsRequest,
    ProjectMetaBundle, ResolveConflict, ResolveRequest, ResolveResponse, ResolvedProject,
    StyleBundle,
};
use codesync_sync::merge::{MergeError, MergeRequest};
use codesync_sync::{
    Collaborators, Confirmer, ExtensionConverter, MarkerImportResolver, Merger, RegionMerger,
    Remote, RemoteError, SyncError,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

/// In-memory code-generation service.
#[derive(Default)]
pub struct FakeRemote {
    pub resolved: Vec<ResolvedProject>,
    pub conflicts: Vec<ResolveConflict>,
    pub bundles: BTreeMap<ProjectId, FetchResponse>,
    pub icons: BTreeMap<ProjectId, Vec<IconBundle>>,
    pub style: StyleBundle,
    pub fetches: RefCell<Vec<FetchRequest>>,
    pub icon_requests: RefCell<Vec<IconsRequest>>,
}

impl FakeRemote {
    pub fn with_project(mut self, resolved: ResolvedProject, response: FetchResponse) -> Self {
        self.bundles.insert(resolved.project_id.clone(), response);
        self.resolved.push(resolved);
        self
    }
}

impl Remote for FakeRemote {
    fn resolve(&self, _request: &ResolveRequest) -> Result<ResolveResponse, RemoteError> {
        Ok(ResolveResponse {
            projects: self.resolved.clone(),
            conflicts: self.conflicts.clone(),
        })
    }

    fn fetch_components(&self, request: &FetchRequest) -> Result<FetchResponse, RemoteError> {
        self.fetches.borrow_mut().push(request.clone());
        self.bundles
            .get(&request.project_id)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                code: 404,
                message: format!("unknown project {}", request.project_id),
            })
    }

    fn fetch_icons(&self, request: &IconsRequest) -> Result<Vec<BundleEntry>, RemoteError> {
        self.icon_requests.borrow_mut().push(request.clone());
        Ok(self
            .icons
            .get(&request.project_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|i| request.icon_ids.contains(&i.id))
            .map(BundleEntry::Icon)
            .collect())
    }

    fn fetch_style_config(&self) -> Result<StyleBundle, RemoteError> {
        Ok(self.style.clone())
    }
}

// ---------------------------------------------------------------------------
// Confirmers and mergers
// ---------------------------------------------------------------------------

pub struct Answer(pub bool);

impl Confirmer for Answer {
    fn confirm(&self, _message: &str) -> Result<bool, SyncError> {
        Ok(self.0)
    }
}

pub struct NeverAsked;

impl Confirmer for NeverAsked {
    fn confirm(&self, message: &str) -> Result<bool, SyncError> {
        panic!("unexpected prompt: {message}")
    }
}

pub struct FailingMerger;

impl Merger for FailingMerger {
    fn merge(&self, _request: &MergeRequest<'_>) -> Result<String, MergeError> {
        Err(MergeError::Other("cannot reconcile".into()))
    }
}

pub fn collaborators<'a>(
    remote: &'a FakeRemote,
    merger: &'a dyn Merger,
    confirmer: &'a dyn Confirmer,
) -> Collaborators<'a> {
    Collaborators {
        remote,
        merger,
        imports: &MarkerImportResolver,
        converter: &ExtensionConverter,
        confirmer,
    }
}

pub fn default_collaborators(remote: &FakeRemote) -> Collaborators<'_> {
    collaborators(remote, &RegionMerger, &NeverAsked)
}

// ---------------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------------

pub fn resolved(id: &str, name: &str, version: &str, components: &[&str]) -> ResolvedProject {
    ResolvedProject {
        project_id: ProjectId::from(id),
        project_name: name.into(),
        version: version.into(),
        component_ids: components.iter().map(|c| ComponentId::from(*c)).collect(),
        icon_ids: vec![],
        indirect: false,
    }
}

pub fn project_entry(id: &str, name: &str) -> BundleEntry {
    BundleEntry::Project(ProjectMetaBundle {
        project_id: ProjectId::from(id),
        project_name: name.into(),
        css_file_name: format!("plasmic__{id}.css"),
        css_rules: format!(".{id} {{}}\n"),
    })
}

/// Render module tagged to import the component stylesheet.
pub fn render_module(id: &str, name: &str, body: &str) -> String {
    format!(
        "import \"./Plasmic{name}.css\"; // codesync-import:{id}/css\nexport function Plasmic{name}() {{ return {body}; }}\n"
    )
}

/// Thin blackbox wrapper around the render module.
pub fn skeleton(id: &str, name: &str) -> String {
    format!(
        "import Plasmic{name} from \"./Plasmic{name}\"; // codesync-import:{id}/render\nexport default Plasmic{name};\n"
    )
}

/// Hand-editable skeleton with one managed region around `body`.
pub fn managed_skeleton(id: &str, name: &str, body: &str) -> String {
    format!(
        "import Plasmic{name} from \"./Plasmic{name}\"; // codesync-import:{id}/render\n\
         export function {name}(props) {{\n\
         \x20 return (\n\
         \x20   // codesync-managed-start: root\n\
         \x20   {body}\n\
         \x20   // codesync-managed-end: root\n\
         \x20 );\n\
         }}\n"
    )
}

pub fn component(id: &str, name: &str, body: &str) -> ComponentBundle {
    ComponentBundle {
        id: ComponentId::from(id),
        component_name: name.into(),
        skeleton_module_file_name: format!("{name}.tsx"),
        skeleton_module: skeleton(id, name),
        render_module_file_name: format!("Plasmic{name}.tsx"),
        render_module: render_module(id, name, body),
        css_file_name: format!("Plasmic{name}.css"),
        css_rules: format!(".{name} {{}}\n"),
        name_in_id_to_uuid: BTreeMap::new(),
    }
}

/// Component whose skeleton carries managed regions.
pub fn direct_component(id: &str, name: &str, body: &str) -> ComponentBundle {
    ComponentBundle {
        skeleton_module: managed_skeleton(id, name, body),
        ..component(id, name, body)
    }
}

pub fn fetch_response(
    project_id: &str,
    project_name: &str,
    components: Vec<ComponentBundle>,
) -> FetchResponse {
    let mut entries = vec![project_entry(project_id, project_name)];
    entries.extend(components.into_iter().map(BundleEntry::Component));
    FetchResponse {
        entries,
        icon_ids: vec![],
    }
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// A temp directory holding `codesync.json` with `srcDir = "."`.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_config(SyncConfig {
            src_dir: ".".into(),
            ..SyncConfig::default()
        })
    }

    pub fn with_config(config: SyncConfig) -> Self {
        let dir = TempDir::new().expect("temp dir");
        config::save_at(&dir.path().join(config::CONFIG_FILE_NAME), &config).expect("save config");
        Self { dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join(config::CONFIG_FILE_NAME)
    }

    pub fn config(&self) -> SyncConfig {
        config::load_at(&self.config_path()).expect("load config")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).expect("read file")
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, content).expect("write file");
    }

    /// Every file under the workspace, keyed by relative path.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let mut files = BTreeMap::new();
        collect(self.dir.path(), self.dir.path(), &mut files);
        files
    }
}

fn collect(root: &Path, dir: &Path, out: &mut BTreeMap<String, String>) {
    for entry in fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let relative = path
                .strip_prefix(root)
                .expect("under root")
                .to_string_lossy()
                .replace('\\', "/");
            out.insert(relative, fs::read_to_string(&path).expect("read file"));
        }
    }
}
