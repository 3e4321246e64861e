use anyhow::Result;

use crate::error::RuntimeError;
use crate::op::Protocol;
use crate::util::lock;

use super::convert::arg;
use super::methods::{MethodTable, get_own_or_shared};
use super::{Obj, ObjKind, Object, Text};

fn checked_index(idx: &Object, len: usize, context: &str) -> Result<usize> {
    let i = idx.expect_int(context)?;
    if i < 0 || i as usize >= len {
        return Err(RuntimeError::IndexOutOfRange { index: i, len }.into());
    }
    Ok(i as usize)
}

/// `[low:high]` bounds; a missing or nil bound means the start or end.
fn slice_bounds(args: &[Obj], len: usize) -> Result<(usize, usize)> {
    let bound = |idx: usize, default: usize| -> Result<usize> {
        match args.get(idx) {
            Some(obj) if !obj.is_nil() => {
                let i = obj.expect_int("__slice__")?;
                if i < 0 || i as usize > len {
                    return Err(RuntimeError::IndexOutOfRange { index: i, len }.into());
                }
                Ok(i as usize)
            }
            _ => Ok(default),
        }
    };
    let low = bound(0, 0)?;
    let high = bound(1, len)?;
    if low > high {
        return Err(RuntimeError::IndexOutOfRange {
            index: low as i64,
            len: high,
        }
        .into());
    }
    Ok((low, high))
}

/// The `(key, value, more)` triple every `__iter__` returns.
fn iter_step(item: Option<(Obj, Obj)>) -> Vec<Obj> {
    match item {
        Some((key, value)) => vec![key, value, Object::bool(true)],
        None => vec![Object::nil(), Object::nil(), Object::bool(false)],
    }
}

fn counter(args: &[Obj]) -> Result<i64> {
    arg(args, 0, "__iter__")?.expect_int("__iter__")
}

fn positional(items: &[Obj], at: i64) -> Option<(Obj, Obj)> {
    if at < 0 {
        return None;
    }
    items
        .get(at as usize)
        .map(|value| (Object::int(at), value.clone()))
}

fn text_of(recv: &Object) -> Result<&Text> {
    match recv.kind() {
        ObjKind::Str(text) => Ok(text),
        _ => Err(RuntimeError::type_shape("string", recv.type_name(), "string").into()),
    }
}

pub(super) fn install_string(table: &mut MethodTable) {
    table.insert(Protocol::GetIndex.name(), |_, recv, args| {
        let text = text_of(recv)?;
        let i = checked_index(arg(args, 0, "__get_index__")?, text.char_len(), "__get_index__")?;
        Ok(vec![Object::string(text.char_at(i).unwrap_or_default())])
    });
    table.insert(Protocol::Slice.name(), |_, recv, args| {
        let text = text_of(recv)?;
        let (low, high) = slice_bounds(args, text.char_len())?;
        Ok(vec![Object::string(text.char_slice(low, high).unwrap_or_default())])
    });
    table.insert(Protocol::Iter.name(), |_, recv, args| {
        let at = counter(args)?;
        let text = text_of(recv)?;
        let item = usize::try_from(at)
            .ok()
            .and_then(|i| text.char_at(i))
            .map(|c| (Object::int(at), Object::string(c)));
        Ok(iter_step(item))
    });
    table.insert("len", |_, recv, _| Ok(vec![Object::int(text_of(recv)?.char_len() as i64)]));
}

fn items_of(recv: &Object) -> Result<Vec<Obj>> {
    match recv.kind() {
        ObjKind::Array(items) | ObjKind::Set(items) => Ok(lock(items).clone()),
        _ => Err(RuntimeError::type_shape("array", recv.type_name(), "sequence").into()),
    }
}

fn with_items<R>(recv: &Object, f: impl FnOnce(&mut Vec<Obj>) -> R) -> Result<R> {
    match recv.kind() {
        ObjKind::Array(items) | ObjKind::Set(items) => Ok(f(&mut lock(items))),
        _ => Err(RuntimeError::type_shape("array", recv.type_name(), "sequence").into()),
    }
}

fn install_sequence_common(table: &mut MethodTable) {
    table.insert(Protocol::Iter.name(), |_, recv, args| {
        let at = counter(args)?;
        let item = with_items(recv, |items| positional(items, at))?;
        Ok(iter_step(item))
    });
    table.insert("len", |_, recv, _| {
        Ok(vec![Object::int(with_items(recv, |items| items.len())? as i64)])
    });
}

pub(super) fn install_array(table: &mut MethodTable) {
    install_sequence_common(table);
    table.insert(Protocol::GetIndex.name(), |_, recv, args| {
        let idx = arg(args, 0, "__get_index__")?;
        with_items(recv, |items| -> Result<Vec<Obj>> {
            let i = checked_index(idx, items.len(), "__get_index__")?;
            Ok(vec![items[i].clone()])
        })?
    });
    table.insert(Protocol::SetIndex.name(), |_, recv, args| {
        let idx = arg(args, 0, "__set_index__")?;
        let value = arg(args, 1, "__set_index__")?.clone();
        with_items(recv, |items| -> Result<Vec<Obj>> {
            let i = checked_index(idx, items.len(), "__set_index__")?;
            items[i] = value;
            Ok(vec![])
        })?
    });
    table.insert(Protocol::Slice.name(), |_, recv, args| {
        let part = with_items(recv, |items| -> Result<Vec<Obj>> {
            let (low, high) = slice_bounds(args, items.len())?;
            Ok(items[low..high].to_vec())
        })??;
        Ok(vec![Object::array(part)])
    });
    let concat = |_: &mut dyn super::CallContext, recv: &Obj, args: &[Obj]| -> Result<Vec<Obj>> {
        let other = arg(args, 0, "__add__")?;
        let mut items = items_of(recv)?;
        match other.kind() {
            ObjKind::Array(_) => items.extend(items_of(other)?),
            _ => return Err(RuntimeError::type_shape("array", other.type_name(), "__add__").into()),
        }
        Ok(vec![Object::array(items)])
    };
    table.insert(Protocol::Add.name(), concat);
    table.insert(Protocol::AddAssign.name(), concat);
    table.insert("push", |_, recv, args| {
        with_items(recv, |items| items.extend(args.iter().cloned()))?;
        Ok(vec![])
    });
    table.insert("pop", |_, recv, _| {
        let last = with_items(recv, |items| items.pop())?;
        Ok(vec![last.unwrap_or_else(Object::nil)])
    });
}

pub(super) fn install_set(table: &mut MethodTable) {
    install_sequence_common(table);
    table.insert("add", |_, recv, args| {
        with_items(recv, |items| items.extend(args.iter().cloned()))?;
        Ok(vec![])
    });
    table.insert("has", |_, recv, args| {
        let wanted = arg(args, 0, "has")?;
        let found = with_items(recv, |items| items.iter().any(|item| item.equals(wanted)))?;
        Ok(vec![Object::bool(found)])
    });
}

fn with_entries<R>(recv: &Object, f: impl FnOnce(&mut super::SlotTable) -> R) -> Result<R> {
    match recv.kind() {
        ObjKind::Dict(entries) => Ok(f(&mut lock(entries))),
        _ => Err(RuntimeError::type_shape("dict", recv.type_name(), "dict").into()),
    }
}

pub(super) fn install_dict(table: &mut MethodTable) {
    table.insert(Protocol::GetIndex.name(), |_, recv, args| {
        let key = arg(args, 0, "__get_index__")?;
        let value = with_entries(recv, |entries| entries.get(key))?;
        Ok(vec![value.unwrap_or_else(Object::nil)])
    });
    let set_entry = |_: &mut dyn super::CallContext, recv: &Obj, args: &[Obj]| -> Result<Vec<Obj>> {
        let key = arg(args, 0, "__set_index__")?.clone();
        let value = arg(args, 1, "__set_index__")?.clone();
        with_entries(recv, |entries| entries.insert(key, value))?;
        Ok(vec![])
    };
    table.insert(Protocol::SetIndex.name(), set_entry);
    table.insert(Protocol::SetProperty.name(), set_entry);
    table.insert(Protocol::GetProperty.name(), |_, recv, args| {
        let name = arg(args, 0, "__get_property__")?;
        if let Some(value) = with_entries(recv, |entries| entries.get(name))? {
            return Ok(vec![value]);
        }
        Ok(vec![get_own_or_shared(recv, name)?])
    });
    table.insert(Protocol::Iter.name(), |_, recv, args| {
        let at = counter(args)?;
        let item = if at < 0 {
            None
        } else {
            with_entries(recv, |entries| entries.entry_at(at as usize))?
        };
        Ok(iter_step(item))
    });
    table.insert("len", |_, recv, _| {
        Ok(vec![Object::int(with_entries(recv, |entries| entries.len())? as i64)])
    });
    table.insert("keys", |_, recv, _| {
        Ok(vec![Object::array(with_entries(recv, |entries| entries.keys())?)])
    });
    table.insert("has", |_, recv, args| {
        let key = arg(args, 0, "has")?;
        Ok(vec![Object::bool(with_entries(recv, |entries| entries.contains(key))?)])
    });
    table.insert("delete", |_, recv, args| {
        let key = arg(args, 0, "delete")?;
        let removed = with_entries(recv, |entries| entries.remove(key))?;
        Ok(vec![removed.unwrap_or_else(Object::nil)])
    });
}
