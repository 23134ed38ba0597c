//! # Source Module
//!
//! Source units are the input of the generator. Each unit is a YAML or JSON
//! document describing one file of a package: its imports, its annotated
//! interfaces, its free functions and its record types.
//!
//! ```yaml
//! package: add
//! imports:
//!   - { alias: models, path: example.com/shop/models }
//! interfaces:
//!   - name: Service
//!     annotations: ['@service(route="/add")']
//!     methods:
//!       - name: Sum
//!         annotations: ['@http(method="post", route="/sum")', '@grpc()']
//!         params: [{ name: ctx, type: context.Context }, { name: req, type: SumRequest }]
//!         results: [{ type: "*SumResponse" }, { type: error }]
//! functions:
//!   - { name: New, results: [{ type: Service }] }
//! records:
//!   - name: SumRequest
//!     fields:
//!       - { name: A, type: int, tags: { json: a } }
//! ```
//!
//! The raw document ([`SourceFile`]) is turned into a [`SourceUnit`] once its
//! type strings have been parsed and its imports mapped onto project
//! directories through a [`ProjectLayout`].

pub mod annotation;
pub mod discovery;
mod types;

pub use annotation::{Annotation, HttpAnnotation, RawAnnotation, ServiceAnnotation};
pub use discovery::{discover_source_files, IgnoreRules};
pub use types::{is_exported, Import, TypeRef};

use crate::resolve::ResolveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// File extensions recognised as source units.
pub const SOURCE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Whether `path` has a source-unit extension.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Raw source-unit document as written on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFile {
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub records: Vec<RecordDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDecl {
    #[serde(default)]
    pub alias: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub results: Vec<ParamDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub results: Vec<ParamDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Empty for embedded fields.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Where the project lives and how its import paths map onto directories.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
    /// Import path prefix of the project (`example.com/shop`)
    pub module: String,
    /// Annotation name marking a service interface
    pub service_annotation: String,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        ProjectLayout {
            root: root.into(),
            module: module.into(),
            service_annotation: "service".to_string(),
        }
    }

    /// Directory of an import path under the project module, if it belongs to it.
    pub fn import_dir(&self, import_path: &str) -> Option<PathBuf> {
        if import_path == self.module {
            return Some(self.root.clone());
        }
        let rest = import_path
            .strip_prefix(self.module.as_str())?
            .strip_prefix('/')?;
        Some(rest.split('/').fold(self.root.clone(), |dir, seg| dir.join(seg)))
    }

    /// Import path of a directory inside the project: `module/<relative dir>`.
    pub fn import_path_of(&self, dir: &Path) -> String {
        let rel: Vec<String> = dir
            .strip_prefix(&self.root)
            .unwrap_or(dir)
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if rel.is_empty() {
            self.module.clone()
        } else {
            format!("{}/{}", self.module, rel.join("/"))
        }
    }
}

/// A parameter or result of a method or function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct Method {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub tags: BTreeMap<String, String>,
}

/// A parsed source unit with its types resolved against its imports.
#[derive(Debug, Clone, Serialize)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub package: String,
    /// The unit's own package identity. The alias is empty: local types are unqualified.
    pub import: Import,
    pub imports: Vec<Import>,
    pub interfaces: Vec<Interface>,
    pub functions: Vec<Function>,
    pub records: Vec<RecordDef>,
}

impl SourceUnit {
    pub fn from_file(path: &Path, file: SourceFile, layout: &ProjectLayout) -> Self {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let import = Import::new("", layout.import_path_of(&dir), Some(dir));

        let imports: Vec<Import> = file
            .imports
            .iter()
            .map(|decl| {
                let alias = decl
                    .alias
                    .clone()
                    .unwrap_or_else(|| Import::default_alias(&decl.path).to_string());
                Import::new(alias, decl.path.clone(), layout.import_dir(&decl.path))
            })
            .collect();

        let params = |decls: &[ParamDecl]| -> Vec<Param> {
            decls
                .iter()
                .map(|p| Param {
                    name: p.name.clone(),
                    ty: TypeRef::parse(&p.ty, &imports),
                })
                .collect()
        };
        let key = layout.service_annotation.as_str();

        let interfaces = file
            .interfaces
            .iter()
            .map(|decl| Interface {
                name: decl.name.clone(),
                annotations: annotation::parse_annotations(&decl.annotations, key),
                methods: decl
                    .methods
                    .iter()
                    .map(|m| Method {
                        name: m.name.clone(),
                        annotations: annotation::parse_annotations(&m.annotations, key),
                        params: params(&m.params),
                        results: params(&m.results),
                    })
                    .collect(),
            })
            .collect();

        let functions = file
            .functions
            .iter()
            .map(|f| Function {
                name: f.name.clone(),
                params: params(&f.params),
                results: params(&f.results),
            })
            .collect();

        let records = file
            .records
            .iter()
            .map(|r| RecordDef {
                name: r.name.clone(),
                fields: r
                    .fields
                    .iter()
                    .map(|f| FieldDef {
                        name: f.name.clone(),
                        ty: TypeRef::parse(&f.ty, &imports),
                        tags: f.tags.clone(),
                    })
                    .collect(),
            })
            .collect();

        SourceUnit {
            path: path.to_path_buf(),
            package: file.package,
            import,
            imports,
            interfaces,
            functions,
            records,
        }
    }
}

/// Read and deserialize a source-unit document, choosing the format by extension.
pub fn read_source_file(path: &Path) -> Result<SourceFile, ResolveError> {
    let content = std::fs::read_to_string(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ResolveError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Read a file and build its [`SourceUnit`].
pub fn load_unit(path: &Path, layout: &ProjectLayout) -> Result<SourceUnit, ResolveError> {
    let file = read_source_file(path)?;
    Ok(SourceUnit::from_file(path, file, layout))
}
