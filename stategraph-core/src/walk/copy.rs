//! Structural copy.
//!
//! `copy` makes an existing target graph structurally equal to a source
//! graph. Target instances are reused wherever the target already holds an
//! object of the right type; otherwise a new instance is created with the
//! source object's constructor. Every source object is copied at most once
//! per call, so cycles and aliasing in the source are reproduced in the
//! target.
//!
//! A failure aborts the call. Members copied before the failure keep their
//! new values; there is no rollback.

use std::collections::HashMap;

use tracing::debug;

use super::comparers::copyer_for;
use super::equal::EqualWalker;
use crate::path::MemberPath;
use crate::reflect::{ObjectId, ObjectRef, Value};
use crate::settings::{MemberSettings, ReferenceHandling};
use crate::verify::verify_can_copy;
use crate::{Error, Result};

/// Copy `source` into `target`.
///
/// Both must have the same runtime type. The type is verified for
/// [`Requirement::Copy`](crate::verify::Requirement::Copy) first. Fails with
/// [`Error::CopyIntegrity`] when a readonly member of the target still
/// differs from the source after copying.
pub fn copy(source: &ObjectRef, target: &ObjectRef, settings: &MemberSettings) -> Result<()> {
    let ty = source.type_info();
    verify_can_copy(ty, settings)?;
    if !ty.ptr_eq(target.type_info()) {
        return Err(Error::TypeMismatch {
            expected: ty.name().to_string(),
            actual: target.type_info().name().to_string(),
        });
    }
    if source.ptr_eq(target) {
        return Ok(());
    }
    debug!(type_name = ty.name(), "copying graph");
    CopyWalker::new(settings).copy_object(source, target, &MemberPath::root(ty))
}

/// The recursive state of one `copy` call.
pub(crate) struct CopyWalker<'a> {
    settings: &'a MemberSettings,
    copies: HashMap<ObjectId, ObjectRef>,
}

impl<'a> CopyWalker<'a> {
    fn new(settings: &'a MemberSettings) -> Self {
        Self {
            settings,
            copies: HashMap::new(),
        }
    }

    pub(crate) fn settings(&self) -> &'a MemberSettings {
        self.settings
    }

    fn copies_by_reference(&self, source: &ObjectRef) -> bool {
        self.settings.is_leaf(source.type_info())
            || self.settings.reference_handling() == ReferenceHandling::References
    }

    pub(crate) fn copy_object(
        &mut self,
        source: &ObjectRef,
        target: &ObjectRef,
        path: &MemberPath,
    ) -> Result<()> {
        self.copies.insert(source.id(), target.clone());
        copyer_for(source, target, path)?.copy(source, target, path, self)
    }

    /// The value a settable slot holding `current` must hold after the copy.
    pub(crate) fn copy_value(
        &mut self,
        source: &Value,
        current: &Value,
        path: &MemberPath,
    ) -> Result<Value> {
        let Value::Object(object) = source else {
            return Ok(source.clone());
        };
        if self.copies_by_reference(object) {
            return Ok(source.clone());
        }
        if let Some(copied) = self.copies.get(&object.id()) {
            return Ok(Value::Object(copied.clone()));
        }
        if let Value::Object(existing) = current {
            if existing.ptr_eq(object) {
                return Ok(current.clone());
            }
            if existing.type_info().ptr_eq(object.type_info()) {
                self.copy_object(object, existing, path)?;
                return Ok(current.clone());
            }
        }
        let created = object
            .type_info()
            .create_instance()
            .ok_or_else(|| Error::NoConstructor(object.type_info().name().to_string()))?;
        self.copy_object(object, &created, path)?;
        Ok(Value::Object(created))
    }

    /// Copy into a readonly slot, which can only be updated in place.
    pub(crate) fn copy_readonly(
        &mut self,
        source: &Value,
        current: &Value,
        path: &MemberPath,
    ) -> Result<()> {
        if let (Value::Object(object), Value::Object(existing)) = (source, current) {
            if let Some(copied) = self.copies.get(&object.id()) {
                if copied.ptr_eq(existing) {
                    return Ok(());
                }
            } else if !self.copies_by_reference(object)
                && !existing.ptr_eq(object)
                && existing.type_info().ptr_eq(object.type_info())
            {
                return self.copy_object(object, existing, path);
            }
        }
        let mut check = EqualWalker::new(self.settings);
        if check.equal_values(source, current, path)? {
            Ok(())
        } else {
            Err(Error::copy_integrity(path, "readonly member differs from the source"))
        }
    }
}
