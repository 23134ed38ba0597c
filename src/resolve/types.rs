//! Record type lookup across source units.

use super::{ResolveError, RunContext};
use crate::model::{Field, RecordType};
use crate::source::{is_exported, is_source_file, Import, RecordDef, TypeRef};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

impl RunContext {
    /// Find the record type a reference names.
    ///
    /// Lists the directory of the reference's import in sorted order and
    /// searches every source unit there. Results are cached by (import path,
    /// name) for the rest of the run, so repeated lookups return the same `Arc`.
    pub fn resolve_type(&mut self, ty: &TypeRef) -> Result<Arc<RecordType>, ResolveError> {
        if !ty.is_exported() {
            return Err(ResolveError::not_found(ty.to_string(), "type is not exported"));
        }
        let import = ty.import.as_ref().ok_or_else(|| {
            ResolveError::not_found(ty.to_string(), "the type's package is not imported")
        })?;

        let key = (import.path.clone(), ty.qualifier.clone());
        if let Some(record) = self.records.get(&key) {
            return Ok(Arc::clone(record));
        }

        let dir = import.dir.as_ref().ok_or_else(|| {
            ResolveError::not_found(
                ty.to_string(),
                format!("import path '{}' is outside the project", import.path),
            )
        })?;
        let listing = fs::read_dir(dir).map_err(|err| {
            ResolveError::not_found(
                ty.to_string(),
                format!("cannot list directory '{}': {err}", dir.display()),
            )
        })?;
        let mut candidates: Vec<PathBuf> = listing
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_source_file(path))
            .collect();
        candidates.sort();

        for path in candidates {
            let unit = self.load_unit(&path)?;
            if let Some(def) = unit.records.iter().find(|r| r.name == ty.qualifier) {
                debug!(
                    record = %ty.qualifier,
                    import = %import.path,
                    file = %path.display(),
                    "resolved record type"
                );
                let record = Arc::new(build_record(def, &unit.package, import));
                self.records.insert(key, Arc::clone(&record));
                return Ok(record);
            }
        }

        Err(ResolveError::not_found(
            ty.to_string(),
            format!("no record named '{}' in '{}'", ty.qualifier, dir.display()),
        ))
    }
}

/// Build a record owned by `import`, giving local field types that import.
fn build_record(def: &RecordDef, package: &str, import: &Import) -> RecordType {
    let fields = def
        .fields
        .iter()
        .map(|f| {
            let mut ty = f.ty.clone();
            if ty.import.is_none() && ty.package.is_none() && is_exported(&ty.qualifier) {
                ty.import = Some(import.clone());
            }
            let name = if f.name.is_empty() {
                ty.qualifier.clone()
            } else {
                f.name.clone()
            };
            Field {
                name,
                array: ty.array,
                ty,
                tags: f.tags.clone(),
            }
        })
        .collect();
    RecordType {
        name: def.name.clone(),
        package: package.to_string(),
        import: import.clone(),
        fields,
    }
}
