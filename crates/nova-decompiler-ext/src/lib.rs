//! Extension points of the external bytecode decompiler engine.
//!
//! The engine itself lives outside this workspace. This crate only pins down the callback
//! contracts it drives during a run, so hosts can plug their own class storage, logging and
//! output handling in without the engine knowing anything about them.
//!
//! Every callback that may abort a run returns `Result<_, Cause>`. Raising a signal through the
//! engine is returning `Err(cause)`; the engine is expected to unwind the run and hand the same
//! boxed value back from [`DecompilerEngine::run`].

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::io::Read;

use thiserror::Error;

/// Opaque failure value carried through engine callbacks.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Signal raised when the thread running the engine was interrupted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("decompiler thread interrupted")]
pub struct Interrupted;

/// Resolves raw class bytes for the files the engine was asked to decompile.
pub trait BytecodeProvider {
    /// `internal_path` names an entry inside an archive and is empty for plain files.
    fn get_bytecode(&self, external_path: &str, internal_path: &str) -> Result<Vec<u8>, Cause>;
}

/// Static inventory of a [`ContextSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entries {
    pub classes: Vec<String>,
    pub directories: Vec<String>,
    pub others: Vec<String>,
}

impl Entries {
    pub const EMPTY: Entries = Entries {
        classes: Vec::new(),
        directories: Vec::new(),
        others: Vec::new(),
    };

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.directories.is_empty() && self.others.is_empty()
    }
}

/// A library of classes the engine may consult while resolving references.
pub trait ContextSource {
    fn name(&self) -> &str;

    fn entries(&self) -> Entries;

    /// Lazy sources have no inventory; the engine queries them with [`ContextSource::has_class`].
    fn is_lazy(&self) -> bool {
        false
    }

    fn has_class(&self, class_name: &str) -> Result<bool, Cause>;

    fn get_class_bytes(&self, class_name: &str) -> Result<Option<Vec<u8>>, Cause>;

    /// Opens an arbitrary resource. `Ok(None)` means the source has no such resource.
    fn open_stream(&self, resource: &str) -> Result<Option<Box<dyn Read + '_>>, Cause>;
}

/// Severity of an engine diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Info,
    Warn,
    Error,
}

/// Receives the engine's diagnostics and progress notifications.
pub trait DecompilerLogger {
    fn write_message(&mut self, message: &str, severity: Severity);

    /// Reports a diagnostic with an associated failure. Returning `Err` aborts the run.
    fn write_message_with_cause(
        &mut self,
        message: &str,
        severity: Severity,
        cause: Cause,
    ) -> Result<(), Cause>;

    fn start_reading_class(&mut self, class_name: &str);

    fn end_reading_class(&mut self);

    fn start_method(&mut self, method_name: &str);

    fn end_method(&mut self);

    fn start_write_class(&mut self, class_name: &str);

    fn end_write_class(&mut self);
}

/// Sink for everything the engine produces.
///
/// Archive-shaped output (`create_archive` .. `close_archive`) is only used when the engine
/// decompiles whole jars.
pub trait ResultSaver {
    /// `mapping` is a flat `[original_line, decompiled_line, ...]` table when the engine was asked
    /// for bytecode source mapping.
    fn save_class_file(
        &mut self,
        path: &str,
        qualified_name: &str,
        entry_name: &str,
        content: &str,
        mapping: Option<&[i32]>,
    );

    fn save_folder(&mut self, path: &str);

    fn copy_file(&mut self, source: &str, path: &str, entry_name: &str);

    fn create_archive(&mut self, path: &str, archive_name: &str, manifest: Option<&str>);

    fn save_dir_entry(&mut self, path: &str, archive_name: &str, entry_name: &str);

    fn copy_entry(&mut self, source: &str, path: &str, archive_name: &str, entry: &str);

    fn save_class_entry(
        &mut self,
        path: &str,
        archive_name: &str,
        qualified_name: &str,
        entry_name: &str,
        content: &str,
    );

    fn close_archive(&mut self, path: &str, archive_name: &str);
}

/// Everything the engine needs for a single run.
pub struct EngineRun<'a> {
    /// External paths of the class files to decompile, resolved through `bytecode`.
    pub sources: Vec<String>,
    pub options: &'a BTreeMap<String, String>,
    pub bytecode: &'a dyn BytecodeProvider,
    pub libraries: Vec<&'a dyn ContextSource>,
    pub logger: &'a mut dyn DecompilerLogger,
    pub saver: &'a mut dyn ResultSaver,
}

/// The decompiler engine. Implementations drive the callbacks of [`EngineRun`] synchronously on
/// the calling thread and return once all sources were processed or a callback aborted the run.
pub trait DecompilerEngine {
    fn run(&mut self, run: EngineRun<'_>) -> Result<(), Cause>;
}
