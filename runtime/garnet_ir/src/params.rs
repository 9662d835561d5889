//! Compiled parameter patterns for blocks and methods.
//!
//! A `ParamSpec` is built once per block literal or method definition and is
//! immutable afterwards. Positional slots are ordered as
//! `leading, optional, rest, trailing`; any leading or trailing slot may be
//! a nested pattern that destructures the value it receives.

use crate::{ExprId, Name};

/// One positional slot: a plain name or a destructuring sub-pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamSlot {
    Name(Name),
    Nested(Box<ParamSpec>),
}

impl ParamSlot {
    pub fn nested(spec: ParamSpec) -> Self {
        ParamSlot::Nested(Box::new(spec))
    }

    /// Whether this slot, or any pattern nested inside it, declares a rest.
    pub fn contains_rest(&self) -> bool {
        match self {
            ParamSlot::Name(_) => false,
            ParamSlot::Nested(spec) => spec.contains_rest(),
        }
    }
}

/// Optional parameter with a default expression, evaluated only when the
/// argument is missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionalParam {
    pub name: Name,
    pub default: ExprId,
}

/// The rest (`*`) marker. Anonymous rests swallow arguments without binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RestParam {
    Named(Name),
    Anonymous,
}

impl RestParam {
    pub fn name(self) -> Option<Name> {
        match self {
            RestParam::Named(name) => Some(name),
            RestParam::Anonymous => None,
        }
    }
}

/// A compiled parameter list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamSpec {
    pub leading: Vec<ParamSlot>,
    pub optional: Vec<OptionalParam>,
    pub rest: Option<RestParam>,
    pub trailing: Vec<ParamSlot>,
    /// Explicit `&b` parameter.
    pub block: Option<Name>,
    /// `|x,|`: a dangling comma after the last slot.
    pub trailing_comma: bool,
}

impl ParamSpec {
    /// The empty list `||`, also used for blocks written without bars.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> ParamSpecBuilder {
        ParamSpecBuilder::default()
    }

    /// Required positional slots, leading plus trailing.
    pub fn required_count(&self) -> usize {
        self.leading.len() + self.trailing.len()
    }

    pub fn optional_count(&self) -> usize {
        self.optional.len()
    }

    pub fn has_rest(&self) -> bool {
        self.rest.is_some()
    }

    /// Number of positional slots, counting a nested pattern as one slot.
    pub fn positional_count(&self) -> usize {
        self.required_count() + self.optional_count()
    }

    /// Whether a lone sequence argument is spread over the slots under
    /// lenient binding.
    pub fn wants_auto_splat(&self) -> bool {
        let rest = usize::from(self.has_rest() || self.trailing_comma);
        self.positional_count() + rest > 1
    }

    /// A rest declared here or in any nested pattern.
    pub fn contains_rest(&self) -> bool {
        self.has_rest()
            || self
                .leading
                .iter()
                .chain(&self.trailing)
                .any(ParamSlot::contains_rest)
    }

    /// The sole nested pattern when the whole list is `|(...)|`.
    pub fn sole_destructuring(&self) -> Option<&ParamSpec> {
        match (self.leading.as_slice(), self.trailing.is_empty()) {
            ([ParamSlot::Nested(inner)], true)
                if self.optional.is_empty() && self.rest.is_none() && !self.trailing_comma =>
            {
                Some(inner)
            }
            _ => None,
        }
    }

}

/// Incremental construction of a `ParamSpec`.
///
/// Slots land in the section matching the call order: `required` before any
/// `rest` call goes to the leading section, after it to the trailing one.
#[derive(Default)]
pub struct ParamSpecBuilder {
    spec: ParamSpec,
}

impl ParamSpecBuilder {
    #[must_use]
    pub fn required(mut self, name: Name) -> Self {
        self.push_slot(ParamSlot::Name(name));
        self
    }

    #[must_use]
    pub fn nested(mut self, inner: ParamSpec) -> Self {
        self.push_slot(ParamSlot::nested(inner));
        self
    }

    #[must_use]
    pub fn optional(mut self, name: Name, default: ExprId) -> Self {
        self.spec.optional.push(OptionalParam { name, default });
        self
    }

    #[must_use]
    pub fn rest(mut self, name: Name) -> Self {
        self.spec.rest = Some(RestParam::Named(name));
        self
    }

    #[must_use]
    pub fn anonymous_rest(mut self) -> Self {
        self.spec.rest = Some(RestParam::Anonymous);
        self
    }

    #[must_use]
    pub fn block(mut self, name: Name) -> Self {
        self.spec.block = Some(name);
        self
    }

    #[must_use]
    pub fn trailing_comma(mut self) -> Self {
        self.spec.trailing_comma = true;
        self
    }

    pub fn build(self) -> ParamSpec {
        self.spec
    }

    fn push_slot(&mut self, slot: ParamSlot) {
        if self.spec.rest.is_some() || !self.spec.optional.is_empty() {
            self.spec.trailing.push(slot);
        } else {
            self.spec.leading.push(slot);
        }
    }
}
