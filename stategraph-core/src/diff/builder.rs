//! One-shot diff.

use tracing::trace;

use super::ValueDiff;
use crate::path::MemberPath;
use crate::reflect::{ObjectRef, Value};
use crate::settings::{MemberSettings, ReferenceHandling};
use crate::verify::verify_can_equal;
use crate::walk::comparers::comparer_for;
use crate::walk::{leaf_equal, ReferencePairs};
use crate::Result;

/// The differences between `x` and `y`, or `None` when they are equal.
///
/// Follows the same rules as [`equal`](crate::equal): the two agree on every
/// input, `diff` returns `None` exactly when `equal` returns `true`. A list
/// position or map key present on one side only is always a leaf diff, with
/// null standing in for the missing side.
pub fn diff(
    x: impl Into<Value>,
    y: impl Into<Value>,
    settings: &MemberSettings,
) -> Result<Option<ValueDiff>> {
    let (x, y) = (x.into(), y.into());
    if let Some(object) = x.as_object().or_else(|| y.as_object()) {
        verify_can_equal(object.type_info(), settings)?;
    }
    let mut builder = DiffBuilder::new(settings);
    match (&x, &y) {
        (Value::Object(a), Value::Object(b)) => {
            trace!(type_name = a.type_info().name(), "diffing graphs");
            builder.diff_objects(a, b, &MemberPath::root(a.type_info()), true)
        }
        _ if x.same(&y) => Ok(None),
        _ => Ok(Some(ValueDiff::leaf(x.clone(), y.clone()))),
    }
}

/// The recursive state of one `diff` call.
pub(crate) struct DiffBuilder<'a> {
    settings: &'a MemberSettings,
    pairs: ReferencePairs,
}

impl<'a> DiffBuilder<'a> {
    pub(crate) fn new(settings: &'a MemberSettings) -> Self {
        Self {
            settings,
            pairs: ReferencePairs::new(),
        }
    }

    pub(crate) fn settings(&self) -> &'a MemberSettings {
        self.settings
    }

    pub(crate) fn diff_values(
        &mut self,
        x: &Value,
        y: &Value,
        path: &MemberPath,
    ) -> Result<Option<ValueDiff>> {
        match (x, y) {
            (Value::Object(a), Value::Object(b)) => self.diff_objects(a, b, path, false),
            _ if x.same(y) => Ok(None),
            _ => Ok(Some(ValueDiff::leaf(x.clone(), y.clone()))),
        }
    }

    /// Diff of a list position or map key that may be missing on a side.
    pub(crate) fn diff_slots(
        &mut self,
        x: Option<Value>,
        y: Option<Value>,
        path: &MemberPath,
    ) -> Result<Option<ValueDiff>> {
        match (x, y) {
            (Some(x), Some(y)) => self.diff_values(&x, &y, path),
            (None, None) => Ok(None),
            (x, y) => Ok(Some(ValueDiff::leaf(
                x.unwrap_or(Value::Null),
                y.unwrap_or(Value::Null),
            ))),
        }
    }

    pub(crate) fn diff_objects(
        &mut self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        root: bool,
    ) -> Result<Option<ValueDiff>> {
        let leaf = || Some(ValueDiff::leaf(Value::from(x), Value::from(y)));
        if x.ptr_eq(y) {
            return Ok(None);
        }
        let ty = x.type_info();
        if !ty.ptr_eq(y.type_info()) {
            return Ok(leaf());
        }
        if let Some(equal) = leaf_equal(self.settings, x, y) {
            return Ok(if equal { None } else { leaf() });
        }
        if !root
            && self.settings.reference_handling() == ReferenceHandling::References
            && !self.settings.is_immutable(ty)
        {
            return Ok(leaf());
        }
        if !self.pairs.insert(x, y) {
            return Ok(None);
        }
        let diffs = comparer_for(x, y, path).and_then(|comparer| comparer.diff(x, y, path, self));
        self.pairs.remove(x, y);
        let diffs = diffs?;
        Ok((!diffs.is_empty()).then(|| ValueDiff::new(Value::from(x), Value::from(y), diffs)))
    }
}
