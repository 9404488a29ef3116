use std::collections::BTreeMap;

use nova_decompiler_bridge::ext::{Cause, DecompilerEngine, EngineRun};

/// Engine stand-in that runs a test-provided script against the bridge callbacks.
pub struct ScriptedEngine<F> {
    script: F,
    pub runs: usize,
    pub last_options: BTreeMap<String, String>,
    pub last_sources: Vec<String>,
}

impl<F> ScriptedEngine<F>
where
    F: FnMut(&mut EngineRun<'_>) -> Result<(), Cause>,
{
    pub fn new(script: F) -> Self {
        Self {
            script,
            runs: 0,
            last_options: BTreeMap::new(),
            last_sources: Vec::new(),
        }
    }
}

impl<F> DecompilerEngine for ScriptedEngine<F>
where
    F: FnMut(&mut EngineRun<'_>) -> Result<(), Cause>,
{
    fn run(&mut self, mut run: EngineRun<'_>) -> Result<(), Cause> {
        self.runs += 1;
        self.last_options = run.options.clone();
        self.last_sources = run.sources.clone();
        (self.script)(&mut run)
    }
}

/// Reads every source through the bytecode provider and saves one class whose text lists the
/// byte counts.
pub fn echo_sources(run: &mut EngineRun<'_>) -> Result<(), Cause> {
    let mut text = String::new();
    for source in &run.sources {
        let bytes = run.bytecode.get_bytecode(source, "")?;
        text.push_str(&format!("{}\n", bytes.len()));
    }
    run.logger.start_write_class("com/example/Foo");
    run.saver
        .save_class_file("", "com/example/Foo", "Foo.java", &text, Some(&[1, 3]));
    run.logger.end_write_class();
    Ok(())
}
