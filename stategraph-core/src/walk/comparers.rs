//! Comparer Registry
//!
//! Once the walker has decided to recurse into a pair of objects, the pair is
//! handed to a comparer chosen by what the instances can do:
//!
//! - [`MapComparer`] when both expose a map view;
//! - [`ListComparer`] when both expose a list view;
//! - [`MemberComparer`] for classes.
//!
//! A pair whose views disagree (one list, one map) cannot be compared and
//! fails with [`Error::Comparison`]. Copying mirrors the registry with
//! [`MapCopyer`], [`ListCopyer`] and [`MemberCopyer`].

use super::copy::CopyWalker;
use super::equal::EqualWalker;
use crate::diff::{DiffBuilder, SubDiff};
use crate::path::MemberPath;
use crate::reflect::{Index, ListAccess, MapAccess, MemberInfo, ObjectRef, Value};
use crate::settings::MemberSettings;
use crate::{Error, Result};

/// Pairwise comparison of one kind of object.
pub(crate) trait ElementComparer: Sync {
    /// Structural equality of `x` and `y`.
    fn equal(
        &self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        walker: &mut EqualWalker<'_>,
    ) -> Result<bool>;

    /// The differences between `x` and `y`, empty when equal.
    fn diff(
        &self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        builder: &mut DiffBuilder<'_>,
    ) -> Result<Vec<SubDiff>>;
}

/// Copy of one kind of object into an existing target.
pub(crate) trait ElementCopyer: Sync {
    /// Make `target` structurally equal to `source`.
    fn copy(
        &self,
        source: &ObjectRef,
        target: &ObjectRef,
        path: &MemberPath,
        walker: &mut CopyWalker<'_>,
    ) -> Result<()>;
}

/// Dictionaries: same key set, equal values per key.
pub(crate) struct MapComparer;

/// Lists: same length, equal items per position.
pub(crate) struct ListComparer;

/// Classes: equal values per enumerated, non-ignored member.
pub(crate) struct MemberComparer;

/// Dictionaries: remove surplus keys, copy the rest per key.
pub(crate) struct MapCopyer;

/// Lists: copy per position, then truncate.
pub(crate) struct ListCopyer;

/// Classes: copy per enumerated, non-ignored member.
pub(crate) struct MemberCopyer;

enum Kind {
    Map,
    List,
    Members,
}

fn kind_of(x: &ObjectRef, y: &ObjectRef, path: &MemberPath) -> Result<Kind> {
    match (x.as_map().is_some(), y.as_map().is_some()) {
        (true, true) => return Ok(Kind::Map),
        (false, false) => {}
        _ => return Err(Error::comparison(path, "only one side is a map")),
    }
    match (x.as_list().is_some(), y.as_list().is_some()) {
        (true, true) => return Ok(Kind::List),
        (false, false) => {}
        _ => return Err(Error::comparison(path, "only one side is a list")),
    }
    if x.type_info().as_class().is_some() {
        Ok(Kind::Members)
    } else {
        Err(Error::comparison(
            path,
            format!("{} is neither a class nor a collection", x.type_info()),
        ))
    }
}

/// Select the comparer for a pair of objects.
pub(crate) fn comparer_for(
    x: &ObjectRef,
    y: &ObjectRef,
    path: &MemberPath,
) -> Result<&'static dyn ElementComparer> {
    Ok(match kind_of(x, y, path)? {
        Kind::Map => &MapComparer,
        Kind::List => &ListComparer,
        Kind::Members => &MemberComparer,
    })
}

/// Select the copyer for a source/target pair.
pub(crate) fn copyer_for(
    source: &ObjectRef,
    target: &ObjectRef,
    path: &MemberPath,
) -> Result<&'static dyn ElementCopyer> {
    Ok(match kind_of(source, target, path)? {
        Kind::Map => &MapCopyer,
        Kind::List => &ListCopyer,
        Kind::Members => &MemberCopyer,
    })
}

/// The members of `object` that take part in a walk.
pub(crate) fn walked_members<'a>(
    settings: &'a MemberSettings,
    object: &ObjectRef,
) -> impl Iterator<Item = &'static MemberInfo> + 'a {
    settings
        .members(object.type_info())
        .into_iter()
        .filter(move |m| !m.is_indexer() && !settings.is_ignoring_member(m))
}

fn lists<'a>(
    x: &'a ObjectRef,
    y: &'a ObjectRef,
    path: &MemberPath,
) -> Result<(&'a dyn ListAccess, &'a dyn ListAccess)> {
    match (x.as_list(), y.as_list()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(Error::comparison(path, "expected two lists")),
    }
}

fn maps<'a>(
    x: &'a ObjectRef,
    y: &'a ObjectRef,
    path: &MemberPath,
) -> Result<(&'a dyn MapAccess, &'a dyn MapAccess)> {
    match (x.as_map(), y.as_map()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(Error::comparison(path, "expected two maps")),
    }
}

impl ElementComparer for MapComparer {
    fn equal(
        &self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        walker: &mut EqualWalker<'_>,
    ) -> Result<bool> {
        let (xs, ys) = maps(x, y, path)?;
        if xs.len() != ys.len() {
            return Ok(false);
        }
        for key in xs.keys() {
            let (Some(a), Some(b)) = (xs.value(&key), ys.value(&key)) else {
                return Ok(false);
            };
            if !walker.equal_values(&a, &b, &path.with_index(key))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn diff(
        &self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        builder: &mut DiffBuilder<'_>,
    ) -> Result<Vec<SubDiff>> {
        let (xs, ys) = maps(x, y, path)?;
        let mut keys = xs.keys();
        for key in ys.keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        let mut diffs = Vec::new();
        for key in keys {
            let (a, b) = (xs.value(&key), ys.value(&key));
            let index = Index::Key(key);
            if let Some(diff) = builder.diff_slots(a, b, &path.with_index(index.clone()))? {
                diffs.push(SubDiff::Index { index, diff });
            }
        }
        Ok(diffs)
    }
}

impl ElementComparer for ListComparer {
    fn equal(
        &self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        walker: &mut EqualWalker<'_>,
    ) -> Result<bool> {
        let (xs, ys) = lists(x, y, path)?;
        if xs.len() != ys.len() {
            return Ok(false);
        }
        for (i, (a, b)) in xs.items().iter().zip(ys.items().iter()).enumerate() {
            if !walker.equal_values(a, b, &path.with_index(i))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn diff(
        &self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        builder: &mut DiffBuilder<'_>,
    ) -> Result<Vec<SubDiff>> {
        let (xs, ys) = lists(x, y, path)?;
        let (xs, ys) = (xs.items(), ys.items());
        let mut diffs = Vec::new();
        for i in 0..xs.len().max(ys.len()) {
            let (a, b) = (xs.get(i).cloned(), ys.get(i).cloned());
            if let Some(diff) = builder.diff_slots(a, b, &path.with_index(i))? {
                diffs.push(SubDiff::Index { index: Index::Position(i), diff });
            }
        }
        Ok(diffs)
    }
}

impl ElementComparer for MemberComparer {
    fn equal(
        &self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        walker: &mut EqualWalker<'_>,
    ) -> Result<bool> {
        let settings = walker.settings();
        for member in walked_members(settings, x) {
            let a = x.get(member.name())?;
            let b = y.get(member.name())?;
            if !walker.equal_values(&a, &b, &path.with_member(member))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn diff(
        &self,
        x: &ObjectRef,
        y: &ObjectRef,
        path: &MemberPath,
        builder: &mut DiffBuilder<'_>,
    ) -> Result<Vec<SubDiff>> {
        let settings = builder.settings();
        let mut diffs = Vec::new();
        for member in walked_members(settings, x) {
            let a = x.get(member.name())?;
            let b = y.get(member.name())?;
            if let Some(diff) = builder.diff_values(&a, &b, &path.with_member(member))? {
                diffs.push(SubDiff::Member { member, diff });
            }
        }
        Ok(diffs)
    }
}

impl ElementCopyer for MapCopyer {
    fn copy(
        &self,
        source: &ObjectRef,
        target: &ObjectRef,
        path: &MemberPath,
        walker: &mut CopyWalker<'_>,
    ) -> Result<()> {
        let (sources, targets) = maps(source, target, path)?;
        for key in targets.keys() {
            if sources.value(&key).is_none() {
                targets.remove(&key);
            }
        }
        for key in sources.keys() {
            let value = sources.value(&key).unwrap_or(Value::Null);
            let current = targets.value(&key);
            let index = Index::Key(key.clone());
            let copied = walker.copy_value(
                &value,
                current.as_ref().unwrap_or(&Value::Null),
                &path.with_index(index),
            )?;
            if !current.is_some_and(|c| c.same(&copied)) {
                targets.insert(key, copied)?;
            }
        }
        Ok(())
    }
}

impl ElementCopyer for ListCopyer {
    fn copy(
        &self,
        source: &ObjectRef,
        target: &ObjectRef,
        path: &MemberPath,
        walker: &mut CopyWalker<'_>,
    ) -> Result<()> {
        let (sources, targets) = lists(source, target, path)?;
        let items = sources.items();
        for (i, value) in items.iter().enumerate() {
            match targets.item(i) {
                Some(current) => {
                    let copied = walker.copy_value(value, &current, &path.with_index(i))?;
                    if !copied.same(&current) {
                        targets.set_item(i, copied)?;
                    }
                }
                None => {
                    let copied = walker.copy_value(value, &Value::Null, &path.with_index(i))?;
                    targets.push(copied)?;
                }
            }
        }
        targets.truncate(items.len());
        Ok(())
    }
}

impl ElementCopyer for MemberCopyer {
    fn copy(
        &self,
        source: &ObjectRef,
        target: &ObjectRef,
        path: &MemberPath,
        walker: &mut CopyWalker<'_>,
    ) -> Result<()> {
        let settings = walker.settings();
        for member in walked_members(settings, source) {
            let value = source.get(member.name())?;
            let current = target.get(member.name())?;
            let member_path = path.with_member(member);
            if member.is_readonly() {
                walker.copy_readonly(&value, &current, &member_path)?;
                continue;
            }
            let copied = walker.copy_value(&value, &current, &member_path)?;
            if !copied.same(&current) {
                target.set(member.name(), copied)?;
            }
        }
        Ok(())
    }
}
