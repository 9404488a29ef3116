//! Assembles and runs a single decompilation request.

use std::error::Error;
use std::path::Path;

use nova_decompiler_ext::{Cause, ContextSource, DecompilerEngine, EngineRun};
use tokio_util::sync::CancellationToken;

use crate::bytecode::{BytecodeSupplier, PathBytecodeMap};
use crate::capture::ResultCapture;
use crate::class_source::{ClassAccessor, ClassSource};
use crate::config::DecompilerConfig;
use crate::diagnostics::{DiagnosticsBridge, HostChannels};
use crate::error::{Cancelled, DecompileError, InternalFailure, MissingBytecode};
use crate::preferences::effective_options;

pub const CANNOT_DECOMPILE_HEADER: &str = "// $VF: cannot decompile";

/// Bytecode line -> decompiled line correspondence reported by the engine.
///
/// The engine hands it over as a flat `[original, decompiled, original, decompiled, ...]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMapping {
    table: Vec<i32>,
}

impl LineMapping {
    pub fn new(table: Vec<i32>) -> Self {
        Self { table }
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.table
    }

    pub fn pairs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.table.chunks_exact(2).filter_map(|pair| {
            let original = u32::try_from(pair[0]).ok()?;
            let decompiled = u32::try_from(pair[1]).ok()?;
            Some((original, decompiled))
        })
    }

    pub fn decompiled_line(&self, original: u32) -> Option<u32> {
        self.pairs()
            .find(|(from, _)| *from == original)
            .map(|(_, to)| to)
    }

    pub fn original_line(&self, decompiled: u32) -> Option<u32> {
        self.pairs()
            .find(|(_, to)| *to == decompiled)
            .map(|(from, _)| from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decompiled {
    pub text: String,
    pub mapping: Option<LineMapping>,
}

/// The class file at `class_file` plus its nested-class siblings (`Foo$*.class`), keyed by
/// canonical path. The first element is the key of `class_file` itself.
pub fn class_file_set(class_file: &Path) -> Result<(String, PathBytecodeMap), DecompileError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DecompileError::Io { path, source }
    };

    let class_file = dunce::canonicalize(class_file).map_err(io_err(class_file))?;
    let target = class_file.display().to_string();
    let mut paths = PathBytecodeMap::new();
    paths.insert(
        target.clone(),
        std::fs::read(&class_file).map_err(io_err(class_file.as_path()))?,
    );

    let (Some(stem), Some(parent)) = (
        class_file.file_stem().and_then(|stem| stem.to_str()),
        class_file.parent(),
    ) else {
        return Ok((target, paths));
    };
    let mask = format!("{stem}$");

    for entry in std::fs::read_dir(parent).map_err(io_err(parent))? {
        let entry = entry.map_err(io_err(parent))?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !file_name.starts_with(&mask) || !file_name.ends_with(".class") {
            continue;
        }
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let bytes = std::fs::read(&path).map_err(io_err(path.as_path()))?;
        paths.insert(path.display().to_string(), bytes);
    }

    Ok((target, paths))
}

/// Drives a [`DecompilerEngine`] through the bridge adapters, one request at a time.
pub struct Decompiler<E> {
    engine: E,
    config: DecompilerConfig,
    channels: HostChannels,
    token: Option<CancellationToken>,
}

impl<E: DecompilerEngine> Decompiler<E> {
    pub fn new(engine: E, config: DecompilerConfig) -> Self {
        Self {
            engine,
            config,
            channels: HostChannels::tracing(),
            token: None,
        }
    }

    pub fn with_channels(mut self, channels: HostChannels) -> Self {
        self.channels = channels;
        self
    }

    /// Requests are refused once `token` is cancelled, and interruptions reported by the engine
    /// cancel it.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.channels = self.channels.with_cancellation_token(token.clone());
        self.token = Some(token);
        self
    }

    pub fn config(&self) -> &DecompilerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Decompiles the class at `class_file`, together with its nested classes.
    pub fn decompile(
        &mut self,
        class_file: &Path,
        accessor: Option<&dyn ClassAccessor>,
    ) -> Result<Decompiled, DecompileError> {
        let (target, paths) = class_file_set(class_file)?;
        self.run_engine(&paths, Some(target.as_str()), accessor)
    }

    /// Runs the engine once over every entry of `paths`.
    pub fn decompile_paths(
        &mut self,
        paths: &PathBytecodeMap,
        accessor: Option<&dyn ClassAccessor>,
    ) -> Result<Decompiled, DecompileError> {
        self.run_engine(paths, None, accessor)
    }

    /// `primary`, when given, is handed to the engine ahead of the other sources.
    fn run_engine(
        &mut self,
        paths: &PathBytecodeMap,
        primary: Option<&str>,
        accessor: Option<&dyn ClassAccessor>,
    ) -> Result<Decompiled, DecompileError> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(DecompileError::Cancelled(Box::new(Cancelled::new())));
        }

        let options = effective_options(&self.config);
        let supplier = BytecodeSupplier::new(paths);
        let class_source = accessor.map(ClassSource::new);
        let mut logger = DiagnosticsBridge::new(self.channels.clone());
        let mut capture = ResultCapture::new();

        tracing::debug!(
            target: "nova.decompiler",
            sources = paths.len(),
            library = class_source.is_some(),
            "starting decompiler run"
        );

        let sources = primary
            .filter(|primary| paths.contains_key(*primary))
            .into_iter()
            .chain(paths.keys().map(String::as_str).filter(|key| Some(*key) != primary))
            .map(str::to_owned)
            .collect();

        let run = EngineRun {
            sources,
            options: &options,
            bytecode: &supplier,
            libraries: class_source
                .iter()
                .map(|source| source as &dyn ContextSource)
                .collect(),
            logger: &mut logger,
            saver: &mut capture,
        };

        match self.engine.run(run) {
            Ok(()) => {
                if !capture.is_captured() {
                    tracing::debug!(target: "nova.decompiler", "engine finished without output");
                }
                let captured = capture.into_result();
                Ok(Decompiled {
                    text: captured.text,
                    mapping: captured.mapping.map(LineMapping::new),
                })
            }
            Err(cause) => Err(self.classify_failure(cause)),
        }
    }

    /// Decompiled text for display, degrading to a commented placeholder where possible.
    ///
    /// Cancellation and missing bytecode always propagate. Outside of unit-test mode every other
    /// failure is rendered into the returned text.
    pub fn decompile_text(
        &mut self,
        class_file: &Path,
        accessor: Option<&dyn ClassAccessor>,
    ) -> Result<String, DecompileError> {
        if !self.config.enabled {
            return Ok(format!("{CANNOT_DECOMPILE_HEADER}\n// decompiler disabled\n"));
        }

        match self.decompile(class_file, accessor) {
            Ok(decompiled) => Ok(decompiled.text),
            Err(err @ DecompileError::Cancelled(_)) => Err(err),
            Err(err @ DecompileError::MissingBytecode(_)) => Err(err),
            Err(DecompileError::Internal(failure)) if failure.io_source().is_some() => {
                tracing::warn!(
                    target: "nova.decompiler",
                    path = %class_file.display(),
                    error = %failure.source,
                    "{}",
                    failure.message
                );
                Ok(String::new())
            }
            Err(err) if self.config.unit_test_mode => Err(err),
            Err(err) => {
                tracing::warn!(
                    target: "nova.decompiler",
                    path = %class_file.display(),
                    error = %err,
                    "decompilation failed"
                );
                Ok(render_failure(&err))
            }
        }
    }

    fn classify_failure(&self, cause: Cause) -> DecompileError {
        if cause.is::<Cancelled>() || (self.channels.is_cancellation)(&*cause) {
            return DecompileError::Cancelled(cause);
        }
        let cause = match cause.downcast::<InternalFailure>() {
            Ok(failure) => return DecompileError::Internal(*failure),
            Err(cause) => cause,
        };
        match cause.downcast::<MissingBytecode>() {
            Ok(missing) => DecompileError::MissingBytecode(*missing),
            Err(cause) => DecompileError::Engine(cause),
        }
    }
}

/// Commented-out description of `err` and its causes.
pub fn render_failure(err: &(dyn Error + 'static)) -> String {
    let mut text = String::from(CANNOT_DECOMPILE_HEADER);
    text.push('\n');

    let mut current = Some(err);
    let mut first = true;
    while let Some(err) = current {
        let message = err.to_string();
        for (index, line) in message.lines().enumerate() {
            text.push_str("// ");
            if index == 0 && !first {
                text.push_str("caused by: ");
            }
            text.push_str(line);
            text.push('\n');
        }
        first = false;
        current = err.source();
    }

    text.push('\n');
    text
}
