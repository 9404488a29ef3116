use nova_decompiler_ext::ResultSaver;

/// Text and line mapping of the first class the engine saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedResult {
    pub text: String,
    pub mapping: Option<Vec<i32>>,
}

/// [`ResultSaver`] for single-class, in-memory decompilation.
///
/// Only the first `save_class_file` call is recorded. Everything archive or folder shaped is
/// ignored. Use a fresh instance per run; a reused instance keeps its first result forever.
#[derive(Debug, Default)]
pub struct ResultCapture {
    captured: Option<CapturedResult>,
}

impl ResultCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_captured(&self) -> bool {
        self.captured.is_some()
    }

    /// Decompiled text; empty until a class was saved.
    pub fn text(&self) -> &str {
        self.captured.as_ref().map_or("", |result| result.text.as_str())
    }

    pub fn mapping(&self) -> Option<&[i32]> {
        self.captured.as_ref()?.mapping.as_deref()
    }

    pub fn into_result(self) -> CapturedResult {
        self.captured.unwrap_or_default()
    }
}

impl ResultSaver for ResultCapture {
    fn save_class_file(
        &mut self,
        _path: &str,
        qualified_name: &str,
        _entry_name: &str,
        content: &str,
        mapping: Option<&[i32]>,
    ) {
        if self.captured.is_some() {
            tracing::trace!(
                target: "nova.decompiler",
                class = qualified_name,
                "ignoring additional decompiled class"
            );
            return;
        }
        self.captured = Some(CapturedResult {
            text: content.to_owned(),
            mapping: mapping.map(<[i32]>::to_vec),
        });
    }

    fn save_folder(&mut self, _path: &str) {}

    fn copy_file(&mut self, _source: &str, _path: &str, _entry_name: &str) {}

    fn create_archive(&mut self, _path: &str, _archive_name: &str, _manifest: Option<&str>) {}

    fn save_dir_entry(&mut self, _path: &str, _archive_name: &str, _entry_name: &str) {}

    fn copy_entry(&mut self, _source: &str, _path: &str, _archive_name: &str, _entry: &str) {}

    fn save_class_entry(
        &mut self,
        _path: &str,
        _archive_name: &str,
        _qualified_name: &str,
        _entry_name: &str,
        _content: &str,
    ) {
    }

    fn close_archive(&mut self, _path: &str, _archive_name: &str) {}
}
