use std::path::{Component, Path, PathBuf};

use tower_lsp::lsp_types::{Position, Range, Url};

use crate::{
    index::{ModuleTarget, Unresolvable},
    syntax::{self, DependencyDecl, DependencyUnresolved, ErrorLevel, ModuleResolver, Value},
    text_pos::LineIndex,
};

/// File Terragrunt reads when `config_path` names a directory.
pub const DEFAULT_CONFIG_FILE: &str = "terragrunt.hcl";

/// Resolver for live editing: every dependency output is unknown, which the
/// evaluator accepts anywhere a value is expected.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderResolver;

impl ModuleResolver for PlaceholderResolver {
    fn resolve_outputs(
        &self,
        _dependency: &DependencyDecl,
    ) -> Result<Value, DependencyUnresolved> {
        Ok(Value::Unknown)
    }
}

/// Finds a dependency's configuration on disk for go-to-definition. It never
/// reads outputs; decoding always goes through [`PlaceholderResolver`].
#[derive(Debug, Clone)]
pub struct DiskResolver {
    base_dir: PathBuf,
}

impl DiskResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolver rooted at the directory containing the document.
    pub fn for_document(uri: &Url) -> Result<Self, Unresolvable> {
        let path = uri.to_file_path().map_err(|()| Unresolvable::NotAFile {
            uri: uri.clone(),
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(base_dir))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the configuration file a dependency points at. Directories
    /// resolve to their `terragrunt.hcl`; `.hcl` paths are taken as-is.
    pub fn config_file(
        &self,
        dependency: &DependencyDecl,
    ) -> Result<PathBuf, Unresolvable> {
        let config_path = dependency.config_path.as_deref().ok_or_else(|| Unresolvable::NoConfigPath {
            name: dependency.name.clone(),
        })?;
        let joined = normalize_path(&self.base_dir.join(config_path));
        if joined.extension().is_some_and(|ext| ext == "hcl") {
            Ok(joined)
        } else {
            Ok(joined.join(DEFAULT_CONFIG_FILE))
        }
    }

    /// Locate the dependency's configuration and the range definitions jump
    /// to: its `terraform` block, or the start of the file.
    pub fn locate(
        &self,
        dependency: &DependencyDecl,
    ) -> Result<ModuleTarget, Unresolvable> {
        let path = self.config_file(dependency)?;
        if !path.is_file() {
            return Err(Unresolvable::MissingConfig {
                path,
            });
        }
        let text = std::fs::read_to_string(&path).map_err(|source| Unresolvable::Io {
            path: path.clone(),
            source,
        })?;

        let (tree, errors) = syntax::parse(&text);
        let count = errors.iter().filter(|error| error.level == ErrorLevel::Error).count();
        if count > 0 {
            return Err(Unresolvable::InvalidConfig {
                path,
                count,
            });
        }

        let range = tree
            .body()
            .blocks()
            .find(|block| block.ident().name == "terraform")
            .map(|block| LineIndex::new(text.into()).range_of(&block.header_span()))
            .unwrap_or_else(|| Range::new(Position::new(0, 0), Position::new(0, 0)));
        let uri = Url::from_file_path(&path).map_err(|()| Unresolvable::InvalidPath {
            path,
        })?;
        Ok(ModuleTarget {
            uri,
            range,
        })
    }
}

/// Lexically normalize `.` and `..` without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
#[path = "../../tests/src/analysis/resolver_tests.rs"]
mod tests;
