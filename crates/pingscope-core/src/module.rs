//! Where the processing module's bytes come from.

use crate::{Error, ModuleBytes, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Source of the compiled processing module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "path")]
pub enum ModuleSource {
    /// The unit is compiled into this binary; no bytes are shipped.
    #[default]
    Builtin,
    /// Read the module from disk at session start.
    File(PathBuf),
}

impl ModuleSource {
    /// Fetch the module bytes. Failures map to [`Error::ModuleLoad`].
    pub fn load(&self) -> Result<ModuleBytes> {
        match self {
            Self::Builtin => Ok(Arc::from(Vec::new())),
            Self::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    Error::ModuleLoad(format!("{}: {e}", path.display()))
                })?;
                if bytes.is_empty() {
                    return Err(Error::ModuleLoad(format!("{}: empty module", path.display())));
                }
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "module loaded");
                Ok(Arc::from(bytes))
            }
        }
    }
}
