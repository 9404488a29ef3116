use std::path::{Path, PathBuf};

use nova_decompiler_bridge::ext::{EngineRun, Interrupted, Severity};
use nova_decompiler_bridge::{
    CancellationToken, Cancelled, ClasspathAccessor, DecompileError, Decompiler, DecompilerConfig,
    HostChannels, BANNER, CANNOT_DECOMPILE_HEADER,
};
use tempfile::TempDir;

use super::engine::{echo_sources, ScriptedEngine};

fn class_dir() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("com/example");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("Foo.class"), [0u8; 3]).unwrap();
    std::fs::write(dir.join("Foo$Inner.class"), [0u8; 5]).unwrap();
    std::fs::write(dir.join("Other.class"), [0u8; 7]).unwrap();
    let foo = dir.join("Foo.class");
    (temp, foo)
}

fn config() -> DecompilerConfig {
    DecompilerConfig::default()
}

#[test]
fn decompiles_class_together_with_nested_classes() {
    let (_temp, foo) = class_dir();
    let mut decompiler = Decompiler::new(ScriptedEngine::new(echo_sources), config());

    let decompiled = decompiler.decompile(&foo, None).expect("decompile");

    // The requested class comes first, nested classes after it.
    assert_eq!(decompiled.text, "3\n5\n");
    let mapping = decompiled.mapping.expect("mapping");
    assert_eq!(mapping.decompiled_line(1), Some(3));

    let engine = decompiler.engine();
    assert_eq!(engine.last_sources.len(), 2);
    assert!(engine.last_sources[0].ends_with("Foo.class"));
    assert!(engine.last_sources[1].ends_with("Foo$Inner.class"));
    assert!(engine
        .last_sources
        .iter()
        .all(|source| Path::new(source).is_absolute()));
    assert_eq!(engine.last_options["ban"], BANNER);
    assert_eq!(engine.last_options["bsm"], "1");
}

#[test]
fn classpath_accessor_feeds_the_class_source() {
    let (temp, foo) = class_dir();
    let engine = ScriptedEngine::new(|run: &mut EngineRun<'_>| {
        let library = run.libraries[0];
        assert!(library.has_class("com/example/Other")?);
        assert!(!library.has_class("com/example/Missing")?);
        let bytes = library.get_class_bytes("com/example/Other")?.unwrap_or_default();
        run.saver
            .save_class_file("", "com/example/Foo", "Foo.java", &bytes.len().to_string(), None);
        Ok(())
    });
    let accessor = ClasspathAccessor::from_paths([temp.path()]);
    let mut decompiler = Decompiler::new(engine, config());

    let decompiled = decompiler.decompile(&foo, Some(&accessor)).expect("decompile");
    assert_eq!(decompiled.text, "7");
}

#[test]
fn decompile_text_renders_engine_failures() {
    let (_temp, foo) = class_dir();
    let engine = ScriptedEngine::new(|run: &mut EngineRun<'_>| {
        run.logger.start_reading_class("com/example/Foo");
        run.logger
            .write_message_with_cause("method failed", Severity::Error, "bad frame".into())?;
        Ok(())
    });
    let mut decompiler = Decompiler::new(engine, config());

    let text = decompiler.decompile_text(&foo, None).expect("fallback text");
    assert_eq!(
        text,
        format!(
            "{CANNOT_DECOMPILE_HEADER}\n// method failed[com/example/Foo]\n// caused by: bad frame\n\n"
        )
    );
}

#[test]
fn decompile_text_propagates_missing_bytecode() {
    let (_temp, foo) = class_dir();
    let engine = ScriptedEngine::new(|run: &mut EngineRun<'_>| {
        run.bytecode.get_bytecode("/nope/Bar.class", "")?;
        Ok(())
    });
    let mut decompiler = Decompiler::new(engine, config());

    match decompiler.decompile_text(&foo, None) {
        Err(DecompileError::MissingBytecode(missing)) => {
            assert_eq!(missing.path, "/nope/Bar.class");
            assert_eq!(missing.known.len(), 2);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn decompile_text_swallows_io_failures() {
    let (_temp, foo) = class_dir();
    let engine = ScriptedEngine::new(|run: &mut EngineRun<'_>| {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated class");
        run.logger
            .write_message_with_cause("read failed", Severity::Error, Box::new(io))?;
        Ok(())
    });
    let mut decompiler = Decompiler::new(engine, config());

    assert_eq!(decompiler.decompile_text(&foo, None).unwrap(), "");
}

#[test]
fn decompile_text_propagates_failures_in_unit_test_mode() {
    let (_temp, foo) = class_dir();
    let engine = ScriptedEngine::new(|run: &mut EngineRun<'_>| {
        run.logger
            .write_message_with_cause("method failed", Severity::Error, "bad frame".into())?;
        Ok(())
    });
    let config = DecompilerConfig {
        unit_test_mode: true,
        ..config()
    };
    let mut decompiler = Decompiler::new(engine, config);

    let err = decompiler.decompile_text(&foo, None).unwrap_err();
    assert!(matches!(err, DecompileError::Internal(_)), "{err:?}");
    assert_eq!(decompiler.engine().last_options["__unit_test_mode__"], "1");
}

#[test]
fn disabled_decompiler_never_runs_the_engine() {
    let (_temp, foo) = class_dir();
    let config = DecompilerConfig {
        enabled: false,
        ..config()
    };
    let mut decompiler = Decompiler::new(ScriptedEngine::new(echo_sources), config);

    let text = decompiler.decompile_text(&foo, None).unwrap();
    assert!(text.starts_with(CANNOT_DECOMPILE_HEADER));
    assert_eq!(decompiler.engine().runs, 0);
}

#[test]
fn interruption_cancels_the_request_and_token() {
    let (_temp, foo) = class_dir();
    let engine = ScriptedEngine::new(|run: &mut EngineRun<'_>| {
        run.logger
            .write_message_with_cause("waiting", Severity::Info, Box::new(Interrupted))?;
        Ok(())
    });
    let token = CancellationToken::new();
    let mut decompiler =
        Decompiler::new(engine, config()).with_cancellation_token(token.clone());

    let err = decompiler.decompile_text(&foo, None).unwrap_err();
    match err {
        DecompileError::Cancelled(cause) => {
            let cancelled = cause.downcast_ref::<Cancelled>().expect("host cancellation");
            assert!(cancelled
                .source
                .as_ref()
                .is_some_and(|source| source.is::<Interrupted>()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(token.is_cancelled());
}

#[test]
fn re_reported_interruption_still_cancels_with_host_predicate() {
    #[derive(Debug, thiserror::Error)]
    #[error("process canceled")]
    struct ProcessCanceled;

    let (_temp, foo) = class_dir();
    let engine = ScriptedEngine::new(|run: &mut EngineRun<'_>| {
        let cancelled = run
            .logger
            .write_message_with_cause("waiting", Severity::Info, Box::new(Interrupted))
            .expect_err("interruption must cancel");
        run.logger.start_reading_class("com/example/Foo");
        run.logger
            .write_message_with_cause("method failed", Severity::Error, cancelled)?;
        Ok(())
    });
    let channels =
        HostChannels::tracing().with_cancellation_predicate(|cause| cause.is::<ProcessCanceled>());
    let mut decompiler = Decompiler::new(engine, config()).with_channels(channels);

    match decompiler.decompile_text(&foo, None) {
        Err(DecompileError::Cancelled(cause)) => assert!(cause.is::<Cancelled>()),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn cancelled_token_refuses_new_requests() {
    let (_temp, foo) = class_dir();
    let token = CancellationToken::new();
    token.cancel();
    let mut decompiler = Decompiler::new(ScriptedEngine::new(echo_sources), config())
        .with_cancellation_token(token);

    let err = decompiler.decompile(&foo, None).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(decompiler.engine().runs, 0);
}

#[test]
fn missing_class_file_is_an_io_error() {
    let temp = TempDir::new().unwrap();
    let mut decompiler = Decompiler::new(ScriptedEngine::new(echo_sources), config());

    let err = decompiler
        .decompile(&temp.path().join("Nope.class"), None)
        .unwrap_err();
    assert!(matches!(err, DecompileError::Io { .. }), "{err:?}");
}
