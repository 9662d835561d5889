//! Names interned once at interpreter construction.

use garnet_ir::{Name, StringInterner};

#[derive(Clone, Copy)]
pub(crate) struct KnownNames {
    /// Frame name of the top-level body.
    pub(crate) main: Name,
    /// `$!`, the exception being handled.
    pub(crate) error_info: Name,
}

impl KnownNames {
    pub(crate) fn new(interner: &StringInterner) -> Self {
        Self {
            main: interner.intern("<main>"),
            error_info: interner.intern("$!"),
        }
    }
}
