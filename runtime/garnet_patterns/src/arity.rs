//! Arity reporting.
//!
//! A block's arity is the count of required slots when nothing can absorb
//! surplus arguments, otherwise `-(required + 1)`. A rest hidden inside a
//! destructuring slot counts as absorbing. Optional slots alone do not make
//! a block arity negative.
//!
//! When the whole list is one destructuring slot, `|(a, b, *)|`, the arity is
//! that slot's own, computed as if its interior were the top-level list. The
//! rule applies once; it does not recurse into `|((a, b))|`.

use garnet_ir::ParamSpec;

/// Arity of a block parameter list.
pub fn arity(spec: &ParamSpec) -> i64 {
    general(spec.sole_destructuring().unwrap_or(spec))
}

/// Arity of a method parameter list: optional parameters also make it
/// negative.
pub fn method_arity(spec: &ParamSpec) -> i64 {
    let required = count(spec.required_count());
    if spec.has_rest() || spec.optional_count() > 0 {
        -(required + 1)
    } else {
        required
    }
}

fn general(spec: &ParamSpec) -> i64 {
    let required = count(spec.required_count());
    if spec.contains_rest() {
        -(required + 1)
    } else {
        required
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX - 1)
}
