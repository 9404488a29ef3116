use std::io::{Cursor, Read};

use nova_decompiler_ext::{Cause, ContextSource, Entries};

/// Host-side view over class storage, keyed by internal class name (`a/b/C$D`).
///
/// Implementations may be backed by live, changing state. Nothing here is cached.
pub trait ClassAccessor {
    fn exists(&self, name: &str) -> bool;

    fn fetch(&self, name: &str) -> Option<Vec<u8>>;
}

/// [`ClassAccessor`] assembled from a pair of closures.
pub struct FnClassAccessor<E, F> {
    exists: E,
    fetch: F,
}

impl<E, F> FnClassAccessor<E, F>
where
    E: Fn(&str) -> bool,
    F: Fn(&str) -> Option<Vec<u8>>,
{
    pub fn new(exists: E, fetch: F) -> Self {
        Self { exists, fetch }
    }
}

impl<E, F> ClassAccessor for FnClassAccessor<E, F>
where
    E: Fn(&str) -> bool,
    F: Fn(&str) -> Option<Vec<u8>>,
{
    fn exists(&self, name: &str) -> bool {
        (self.exists)(name)
    }

    fn fetch(&self, name: &str) -> Option<Vec<u8>> {
        (self.fetch)(name)
    }
}

/// Lazy engine library that forwards every lookup to a [`ClassAccessor`].
#[derive(Clone, Copy)]
pub struct ClassSource<'a> {
    accessor: &'a dyn ClassAccessor,
}

impl<'a> ClassSource<'a> {
    pub const NAME: &'static str = "IntelliJ Classes Source";

    pub fn new(accessor: &'a dyn ClassAccessor) -> Self {
        Self { accessor }
    }
}

impl ContextSource for ClassSource<'_> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn entries(&self) -> Entries {
        Entries::EMPTY
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn has_class(&self, class_name: &str) -> Result<bool, Cause> {
        Ok(self.accessor.exists(class_name))
    }

    fn get_class_bytes(&self, class_name: &str) -> Result<Option<Vec<u8>>, Cause> {
        Ok(self.accessor.fetch(class_name))
    }

    fn open_stream(&self, resource: &str) -> Result<Option<Box<dyn Read + '_>>, Cause> {
        // Only class files are served; manifests and other resources are reported as absent.
        let Some(class_name) = resource.strip_suffix(".class") else {
            return Ok(None);
        };
        Ok(self
            .get_class_bytes(class_name)?
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + '_>))
    }
}
