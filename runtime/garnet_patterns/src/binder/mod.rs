//! Parameter pattern matcher.
//!
//! Binds an [`ArgumentBundle`] onto a [`ParamSpec`] in one of two modes:
//!
//! - **Lenient** (procs and plain blocks): a lone array argument is spread
//!   over a multi-slot pattern, missing arguments become `nil`, surplus
//!   arguments are dropped. Never fails on argument count.
//! - **Strict** (lambdas, converted methods and symbols): the count must fit
//!   `[required, required + optional]`, or `>= required` with a rest.
//!
//! Slots are filled leading first, then trailing from the tail, then
//! optional, and whatever is left goes to the rest. Bindings are recorded in
//! declaration order. Default expressions are evaluated by the caller through
//! the `default` callback, which sees every binding made so far.

use crate::errors::{ArityError, ArityRange};
use crate::value::Value;
use bitflags::bitflags;
use garnet_ir::{ExprId, Name, ParamSlot, ParamSpec};
use smallvec::SmallVec;

bitflags! {
    /// Shape of a parameter list, computed once per closure.
    ///
    /// Lets the binder skip the general algorithm for the common
    /// `|a, b|` shape.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct SignatureFlags: u8 {
        /// More than one positional slot: a lone array argument is spread.
        const AUTO_SPLAT = 1 << 0;
        const HAS_REST = 1 << 1;
        const HAS_OPTIONAL = 1 << 2;
        const HAS_NESTED = 1 << 3;
        const HAS_TRAILING = 1 << 4;
        const HAS_BLOCK_PARAM = 1 << 5;
    }
}

impl SignatureFlags {
    pub fn of(spec: &ParamSpec) -> Self {
        let mut flags = SignatureFlags::empty();
        flags.set(SignatureFlags::AUTO_SPLAT, spec.wants_auto_splat());
        flags.set(SignatureFlags::HAS_REST, spec.has_rest());
        flags.set(SignatureFlags::HAS_OPTIONAL, spec.optional_count() > 0);
        flags.set(
            SignatureFlags::HAS_NESTED,
            spec.leading
                .iter()
                .chain(&spec.trailing)
                .any(|slot| matches!(slot, ParamSlot::Nested(_))),
        );
        flags.set(SignatureFlags::HAS_TRAILING, !spec.trailing.is_empty());
        flags.set(SignatureFlags::HAS_BLOCK_PARAM, spec.block.is_some());
        flags
    }

    /// Only leading plain names.
    pub fn is_simple(self) -> bool {
        !self.intersects(
            SignatureFlags::HAS_REST
                | SignatureFlags::HAS_OPTIONAL
                | SignatureFlags::HAS_NESTED
                | SignatureFlags::HAS_TRAILING,
        )
    }
}

/// Lenient or strict argument binding.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BindMode {
    Lenient,
    Strict,
}

impl BindMode {
    pub fn for_lambda(lambda: bool) -> Self {
        if lambda {
            BindMode::Strict
        } else {
            BindMode::Lenient
        }
    }
}

/// One argument at a call or yield site.
#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub value: Value,
    /// Produced by expanding a `*splat` at the call site.
    pub splatted: bool,
}

/// Ordered arguments produced at a call or yield site.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgumentBundle {
    items: SmallVec<[Argument; 4]>,
}

impl ArgumentBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        ArgumentBundle {
            items: values
                .into_iter()
                .map(|value| Argument {
                    value,
                    splatted: false,
                })
                .collect(),
        }
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(Argument {
            value,
            splatted: false,
        });
    }

    /// Append the elements of a `*splat` expansion.
    pub fn extend_splatted(&mut self, values: impl IntoIterator<Item = Value>) {
        self.items.extend(values.into_iter().map(|value| Argument {
            value,
            splatted: true,
        }));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.items.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().map(|arg| &arg.value)
    }

    pub fn into_values(self) -> SmallVec<[Value; 4]> {
        self.items.into_iter().map(|arg| arg.value).collect()
    }
}

/// Names bound by a successful match, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    entries: SmallVec<[(Name, Value); 4]>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: Name, value: Value) {
        self.entries.push((name, value));
    }

    /// Latest binding of `name`.
    pub fn get(&self, name: Name) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Name, Value)> {
        self.entries.iter()
    }
}

impl IntoIterator for Bindings {
    type Item = (Name, Value);
    type IntoIter = smallvec::IntoIter<[(Name, Value); 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A parameter list ready for binding.
pub struct Binder<'a> {
    spec: &'a ParamSpec,
    flags: SignatureFlags,
    mode: BindMode,
}

impl<'a> Binder<'a> {
    pub fn new(spec: &'a ParamSpec, mode: BindMode) -> Self {
        Self::with_flags(spec, SignatureFlags::of(spec), mode)
    }

    /// Reuse flags cached on a closure.
    pub fn with_flags(spec: &'a ParamSpec, flags: SignatureFlags, mode: BindMode) -> Self {
        Binder { spec, flags, mode }
    }

    /// Accepted argument counts of this list under strict binding.
    pub fn accepted(&self) -> ArityRange {
        let min = self.spec.required_count();
        ArityRange {
            min,
            max: (!self.spec.has_rest()).then(|| min + self.spec.optional_count()),
        }
    }

    /// Match `args`. `block` is bound to an explicit `&b` parameter.
    pub fn bind<E, F>(&self, args: ArgumentBundle, block: Option<Value>, mut default: F) -> Result<Bindings, E>
    where
        E: From<ArityError>,
        F: FnMut(ExprId, &Bindings) -> Result<Value, E>,
    {
        let mut values = args.into_values();
        if self.mode == BindMode::Lenient
            && values.len() == 1
            && self.flags.contains(SignatureFlags::AUTO_SPLAT)
        {
            if let Some(items) = values[0].as_sequence() {
                values = items.iter().cloned().collect();
            }
        }

        let mut out = Bindings::new();
        if self.flags.is_simple() {
            self.bind_simple(values, &mut out)?;
        } else {
            bind_list(self.spec, values, self.mode, &mut out, &mut default)?;
        }
        if let Some(name) = self.spec.block {
            out.push(name, block.unwrap_or_default());
        }
        Ok(out)
    }

    fn bind_simple(&self, values: SmallVec<[Value; 4]>, out: &mut Bindings) -> Result<(), ArityError> {
        let given = values.len();
        if self.mode == BindMode::Strict && given != self.spec.leading.len() {
            return Err(ArityError {
                given,
                expected: self.accepted(),
            });
        }
        let mut values = values.into_iter();
        for slot in &self.spec.leading {
            if let ParamSlot::Name(name) = slot {
                out.push(*name, values.next().unwrap_or_default());
            }
        }
        Ok(())
    }
}

/// Bind `args` onto `spec` with the given mode.
pub fn bind<E, F>(
    spec: &ParamSpec,
    args: ArgumentBundle,
    mode: BindMode,
    block: Option<Value>,
    default: F,
) -> Result<Bindings, E>
where
    E: From<ArityError>,
    F: FnMut(ExprId, &Bindings) -> Result<Value, E>,
{
    Binder::new(spec, mode).bind(args, block, default)
}

fn bind_list<E, F>(
    spec: &ParamSpec,
    values: SmallVec<[Value; 4]>,
    mode: BindMode,
    out: &mut Bindings,
    default: &mut F,
) -> Result<(), E>
where
    E: From<ArityError>,
    F: FnMut(ExprId, &Bindings) -> Result<Value, E>,
{
    let given = values.len();
    let required = spec.required_count();
    if mode == BindMode::Strict {
        let expected = ArityRange {
            min: required,
            max: (!spec.has_rest()).then(|| required + spec.optional_count()),
        };
        if !expected.contains(given) {
            return Err(ArityError { given, expected }.into());
        }
    }

    // Partition the arguments: leading, then trailing from the tail, then
    // optional, and the middle remainder for the rest.
    let lead_n = given.min(spec.leading.len());
    let trail_n = (given - lead_n).min(spec.trailing.len());
    let middle = given - lead_n - trail_n;
    let opt_n = middle.min(spec.optional.len());
    let rest_n = middle - opt_n;

    let mut values = values.into_iter();
    let leading: SmallVec<[Value; 4]> = values.by_ref().take(lead_n).collect();
    let optional: SmallVec<[Value; 4]> = values.by_ref().take(opt_n).collect();
    let rest: Vec<Value> = values.by_ref().take(rest_n).collect();
    let trailing: SmallVec<[Value; 4]> = values.collect();

    bind_slots(&spec.leading, leading, mode, out, default)?;

    let mut provided = optional.into_iter();
    for param in &spec.optional {
        let value = match provided.next() {
            Some(value) => value,
            None => default(param.default, out)?,
        };
        out.push(param.name, value);
    }

    if let Some(name) = spec.rest.and_then(garnet_ir::RestParam::name) {
        out.push(name, Value::array(rest));
    }

    bind_slots(&spec.trailing, trailing, mode, out, default)
}

fn bind_slots<E, F>(
    slots: &[ParamSlot],
    values: SmallVec<[Value; 4]>,
    mode: BindMode,
    out: &mut Bindings,
    default: &mut F,
) -> Result<(), E>
where
    E: From<ArityError>,
    F: FnMut(ExprId, &Bindings) -> Result<Value, E>,
{
    let mut values = values.into_iter();
    for slot in slots {
        let value = values.next().unwrap_or_default();
        match slot {
            ParamSlot::Name(name) => out.push(*name, value),
            ParamSlot::Nested(inner) => {
                let items: SmallVec<[Value; 4]> = match value.as_sequence() {
                    Some(items) => items.iter().cloned().collect(),
                    None => smallvec::smallvec![value],
                };
                bind_list(inner, items, mode, out, default)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
