use std::collections::BTreeMap;

use nova_decompiler_ext::{BytecodeProvider, Cause};

use crate::error::MissingBytecode;

/// External file path -> raw class bytes, filled by the caller before a run.
pub type PathBytecodeMap = BTreeMap<String, Vec<u8>>;

/// Serves class bytes to the engine out of a precomputed [`PathBytecodeMap`].
#[derive(Debug, Clone, Copy)]
pub struct BytecodeSupplier<'a> {
    paths: &'a PathBytecodeMap,
}

impl<'a> BytecodeSupplier<'a> {
    pub fn new(paths: &'a PathBytecodeMap) -> Self {
        Self { paths }
    }

    pub fn lookup(&self, external_path: &str) -> Result<&'a [u8], MissingBytecode> {
        self.paths
            .get(external_path)
            .map(Vec::as_slice)
            .ok_or_else(|| MissingBytecode {
                path: external_path.to_owned(),
                known: self.paths.keys().cloned().collect(),
            })
    }
}

impl BytecodeProvider for BytecodeSupplier<'_> {
    fn get_bytecode(&self, external_path: &str, _internal_path: &str) -> Result<Vec<u8>, Cause> {
        match self.lookup(external_path) {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(err) => {
                tracing::error!(
                    target: "nova.decompiler",
                    path = %err.path,
                    known = err.known.len(),
                    "engine requested bytecode outside of the request file set"
                );
                Err(Box::new(err))
            }
        }
    }
}
