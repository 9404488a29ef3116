//! Bridge between Nova and an external bytecode decompiler engine.
//!
//! The engine is driven through four extension points (see `nova-decompiler-ext`). This crate
//! implements each of them on top of host-shaped data:
//!
//! - [`BytecodeSupplier`]: class bytes from a precomputed path map;
//! - [`ClassSource`]: lazy library lookups forwarded to a [`ClassAccessor`];
//! - [`DiagnosticsBridge`]: engine diagnostics onto host logging, cancellation and aborts;
//! - [`ResultCapture`]: the text and line mapping of the single decompiled class.
//!
//! [`Decompiler`] wires them together for one request at a time.

#![forbid(unsafe_code)]

mod bytecode;
mod capture;
mod class_source;
mod classpath;
mod config;
mod diagnostics;
mod error;
mod invoker;
mod preferences;

pub use crate::bytecode::{BytecodeSupplier, PathBytecodeMap};
pub use crate::capture::{CapturedResult, ResultCapture};
pub use crate::class_source::{ClassAccessor, ClassSource, FnClassAccessor};
pub use crate::classpath::{class_entry_name, ClasspathAccessor, ClasspathError, ClasspathRoot};
pub use crate::config::{init_tracing, ConfigError, DecompilerConfig, LoggingConfig};
pub use crate::diagnostics::{
    CancellationHook, CancellationPredicate, CauseClass, ClassContext, DiagnosticsBridge,
    ErrorChannel, HostChannels, LogChannel,
};
pub use crate::error::{Cancelled, DecompileError, InternalFailure, MissingBytecode};
pub use crate::invoker::{
    class_file_set, render_failure, Decompiled, Decompiler, LineMapping, CANNOT_DECOMPILE_HEADER,
};
pub use crate::preferences::{effective_options, BANNER, IGNORED_PREFERENCES, MAX_INDENT};

pub use nova_decompiler_ext as ext;
pub use tokio_util::sync::CancellationToken;
