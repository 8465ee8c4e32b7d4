//! Structural equality.

use tracing::trace;

use super::comparers::comparer_for;
use super::pairs::ReferencePairs;
use crate::path::MemberPath;
use crate::reflect::{ObjectRef, Value};
use crate::settings::{MemberSettings, ReferenceHandling};
use crate::verify::verify_can_equal;
use crate::Result;

/// Compare two values structurally.
///
/// The type of the first non-null object is verified for
/// [`Requirement::Equal`](crate::verify::Requirement::Equal) before anything
/// is compared. Leaves compare by value, objects of equatable types by their
/// own equality. With [`ReferenceHandling::References`] everything below the
/// root compares by identity.
///
/// ```rust
/// use std::sync::OnceLock;
/// use stategraph_core::reflect::{types, Record, TypeInfo, Value};
/// use stategraph_core::{equal, MemberSettings, ReferenceHandling};
///
/// fn pair() -> &'static TypeInfo {
///     static TYPE: OnceLock<TypeInfo> = OnceLock::new();
///     TYPE.get_or_init(|| {
///         TypeInfo::class("DocPair")
///             .property("name", types::string)
///             .property("value", types::int)
///             .build()
///     })
/// }
///
/// let settings = MemberSettings::properties(ReferenceHandling::Structural);
/// let a = Record::with(pair(), [("name", Value::from("a")), ("value", Value::from(1))]).unwrap();
/// let b = Record::with(pair(), [("name", Value::from("a")), ("value", Value::from(1))]).unwrap();
/// assert!(equal(&a, &b, &settings).unwrap());
/// ```
pub fn equal(x: impl Into<Value>, y: impl Into<Value>, settings: &MemberSettings) -> Result<bool> {
    let (x, y) = (x.into(), y.into());
    if let Some(object) = x.as_object().or_else(|| y.as_object()) {
        verify_can_equal(object.type_info(), settings)?;
    }
    match (&x, &y) {
        (Value::Object(a), Value::Object(b)) => {
            trace!(type_name = a.type_info().name(), "comparing graphs");
            let path = MemberPath::root(a.type_info());
            EqualWalker::new(settings).equal_objects(a, b, &path, true)
        }
        _ => Ok(x.same(&y)),
    }
}

/// Value equality for objects the settings treat as leaves.
///
/// `None` means the pair has to be compared structurally: the type is not a
/// leaf, or it is immutable without providing its own equality.
pub(crate) fn leaf_equal(settings: &MemberSettings, x: &ObjectRef, y: &ObjectRef) -> Option<bool> {
    if settings.is_equatable(x.type_info()) {
        x.value_equals(&**y)
    } else {
        None
    }
}

/// The recursive state of one `equal` call.
pub(crate) struct EqualWalker<'a> {
    settings: &'a MemberSettings,
    pairs: ReferencePairs,
}

impl<'a> EqualWalker<'a> {
    pub(crate) fn new(settings: &'a MemberSettings) -> Self {
        Self {
            settings,
            pairs: ReferencePairs::new(),
        }
    }

    pub(crate) fn settings(&self) -> &'a MemberSettings {
        self.settings
    }

    pub(crate) fn equal_values(&mut self, x: &Value, y: &Value, path: &MemberPath) -> Result<bool> {
        match (x, y) {
            (Value::Object(a), Value::Object(b)) => self.equal_objects(a, b, path, false),
            _ => Ok(x.same(y)),
        }
    }

    pub(crate) fn equal_objects(
        &mut self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        root: bool,
    ) -> Result<bool> {
        if x.ptr_eq(y) {
            return Ok(true);
        }
        let ty = x.type_info();
        if !ty.ptr_eq(y.type_info()) {
            return Ok(false);
        }
        if let Some(equal) = leaf_equal(self.settings, x, y) {
            return Ok(equal);
        }
        if !root
            && self.settings.reference_handling() == ReferenceHandling::References
            && !self.settings.is_immutable(ty)
        {
            return Ok(false);
        }
        if !self.pairs.insert(x, y) {
            return Ok(true);
        }
        let result =
            comparer_for(x, y, path).and_then(|comparer| comparer.equal(x, y, path, self));
        self.pairs.remove(x, y);
        result
    }
}
