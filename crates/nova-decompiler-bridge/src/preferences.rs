use std::collections::BTreeMap;

use crate::config::DecompilerConfig;

/// Widest `ind` setting turned into spaces; larger values are passed through untouched.
pub const MAX_INDENT: usize = 64;

pub const BANNER: &str = "//\n// Source code recreated from a .class file by Vineflower\n//\n\n";

/// Options the user may not set; they are owned by the bridge or make no sense in-process.
pub const IGNORED_PREFERENCES: &[&str] = &[
    "ban", // banner
    "bsm", // bytecode source mapping
    "nls", // newline separator
    "__unit_test_mode__",
    "log", // log level
    "urc", // use renamer class
    "thr", // threads
    "mpm", // max processing method
    "\r\n",
    "\n",
];

/// Engine options for a run derived from `config`.
pub fn effective_options(config: &DecompilerConfig) -> BTreeMap<String, String> {
    let mut options: BTreeMap<String, String> = config
        .settings
        .iter()
        .filter(|(key, _)| !IGNORED_PREFERENCES.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for (key, value) in default_overrides(config) {
        options.entry(key.to_owned()).or_insert(value);
    }

    if let Some(indent) = options.get_mut("ind") {
        match indent.trim().parse::<usize>() {
            Ok(width) if width <= MAX_INDENT => *indent = " ".repeat(width),
            _ => {}
        }
    }

    if config.use_line_mapping {
        options.insert("bsm".to_owned(), "1".to_owned());
    }
    if config.dump_original_lines {
        options.insert("__dump_original_lines__".to_owned(), "1".to_owned());
    }

    options
}

fn default_overrides(config: &DecompilerConfig) -> [(&'static str, String); 11] {
    let flag = |enabled: bool| (if enabled { "1" } else { "0" }).to_owned();
    [
        ("hdc", "0".to_owned()), // hide default constructor
        ("dgs", "1".to_owned()), // decompile generic signatures
        ("rsy", "1".to_owned()), // remove synthetic
        ("rbr", "1".to_owned()), // remove bridge
        ("nls", "1".to_owned()),
        ("ban", BANNER.to_owned()),
        ("mpm", "0".to_owned()),
        ("iib", "1".to_owned()), // ignore invalid bytecode
        ("vac", "1".to_owned()), // verify anonymous classes
        ("ind", config.indent_size.to_string()),
        ("__unit_test_mode__", flag(config.unit_test_mode)),
    ]
}
