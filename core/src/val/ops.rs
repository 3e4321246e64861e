use std::cmp::Ordering;

use anyhow::Result;

use crate::error::RuntimeError;
use crate::op::Protocol;

use super::convert::arg;
use super::methods::MethodTable;
use super::{Obj, ObjKind, Object};

/// Int operators; mixing with a float promotes to float.
pub(super) fn install_int(table: &mut MethodTable) {
    install_binary(table, &Protocol::ARITH, numeric_binary);
    install_binary(table, &Protocol::COMPARE[2..], numeric_binary);
    install_unary_numeric(table);
}

/// Float operators: no remainder and no bitwise forms.
pub(super) fn install_float(table: &mut MethodTable) {
    let arith = [Protocol::Add, Protocol::Sub, Protocol::Mul, Protocol::Quo];
    install_binary(table, &arith, numeric_binary);
    install_binary(table, &Protocol::COMPARE[2..], numeric_binary);
    install_unary_numeric(table);
}

pub(super) fn install_bool(table: &mut MethodTable) {
    let ops = [
        Protocol::LAnd,
        Protocol::LOr,
        Protocol::And,
        Protocol::Or,
        Protocol::Xor,
    ];
    install_binary(table, &ops, bool_binary);
    table.insert(Protocol::Not.name(), |_, recv, _| {
        let value = recv.expect_bool("__not__")?;
        Ok(vec![Object::bool(!value)])
    });
}

pub(super) fn install_string(table: &mut MethodTable) {
    install_binary(table, &[Protocol::Add], string_binary);
    install_binary(table, &Protocol::COMPARE[2..], string_binary);
}

type BinaryFn = fn(Protocol, &Object, &Object) -> Result<Obj>;

/// Register `protos` and their compound-assignment twins against `op`.
fn install_binary(table: &mut MethodTable, protos: &[Protocol], op: BinaryFn) {
    for &proto in protos {
        table.insert(proto.name(), move |_, recv, args| {
            let rhs = arg(args, 0, proto.name())?;
            Ok(vec![op(proto, recv, rhs)?])
        });
        if let Some(assign) = proto.assign_form() {
            table.insert(assign.name(), move |_, recv, args| {
                let rhs = arg(args, 0, assign.name())?;
                Ok(vec![op(proto, recv, rhs)?])
            });
        }
    }
}

fn install_unary_numeric(table: &mut MethodTable) {
    table.insert(Protocol::Minus.name(), |_, recv, _| {
        Ok(vec![match recv.kind() {
            ObjKind::Int(i) => Object::int(i.wrapping_neg()),
            _ => Object::float(-recv.expect_float("__minus__")?),
        }])
    });
    table.insert(Protocol::Inc.name(), |_, recv, _| step(recv, 1));
    table.insert(Protocol::Dec.name(), |_, recv, _| step(recv, -1));
}

fn step(recv: &Object, delta: i64) -> Result<Vec<Obj>> {
    Ok(vec![match recv.kind() {
        ObjKind::Int(i) => Object::int(i.wrapping_add(delta)),
        _ => Object::float(recv.expect_float("__inc__/__dec__")? + delta as f64),
    }])
}

fn compare<T: PartialOrd>(proto: Protocol, a: T, b: T) -> Option<bool> {
    let ord = a.partial_cmp(&b);
    Some(match proto {
        Protocol::Lss => ord == Some(Ordering::Less),
        Protocol::Gtr => ord == Some(Ordering::Greater),
        Protocol::Leq => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        Protocol::Geq => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        _ => return None,
    })
}

pub(super) fn numeric_binary(proto: Protocol, lhs: &Object, rhs: &Object) -> Result<Obj> {
    if let (ObjKind::Int(a), ObjKind::Int(b)) = (lhs.kind(), rhs.kind()) {
        return int_binary(proto, *a, *b);
    }
    let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
        return Err(RuntimeError::type_shape("number", rhs.type_name(), proto.name()).into());
    };
    if let Some(result) = compare(proto, a, b) {
        return Ok(Object::bool(result));
    }
    let value = match proto {
        Protocol::Add => a + b,
        Protocol::Sub => a - b,
        Protocol::Mul => a * b,
        Protocol::Quo => a / b,
        _ => return Err(RuntimeError::type_shape("int", "float", proto.name()).into()),
    };
    Ok(Object::float(value))
}

fn int_binary(proto: Protocol, a: i64, b: i64) -> Result<Obj> {
    if let Some(result) = compare(proto, a, b) {
        return Ok(Object::bool(result));
    }
    let value = match proto {
        Protocol::Add => a.wrapping_add(b),
        Protocol::Sub => a.wrapping_sub(b),
        Protocol::Mul => a.wrapping_mul(b),
        Protocol::Quo | Protocol::Rem if b == 0 => return Err(RuntimeError::DivisionByZero.into()),
        Protocol::Quo => a.wrapping_div(b),
        Protocol::Rem => a.wrapping_rem(b),
        Protocol::And => a & b,
        Protocol::Or => a | b,
        Protocol::Xor => a ^ b,
        Protocol::AndNot => a & !b,
        Protocol::Shl | Protocol::Shr => shift(proto, a, b)?,
        _ => {
            return Err(RuntimeError::MethodNotFound {
                receiver: "int",
                name: proto.name().to_string(),
            }
            .into());
        }
    };
    Ok(Object::int(value))
}

// Shifting by the width or more yields 0 (or -1 for negative right shifts).
fn shift(proto: Protocol, a: i64, b: i64) -> Result<i64> {
    let Ok(count) = u32::try_from(b) else {
        return Err(RuntimeError::type_shape("non-negative shift count", b.to_string(), proto.name()).into());
    };
    Ok(match proto {
        Protocol::Shl => a.checked_shl(count).unwrap_or(0),
        _ => a.checked_shr(count).unwrap_or(if a < 0 { -1 } else { 0 }),
    })
}

fn bool_binary(proto: Protocol, lhs: &Object, rhs: &Object) -> Result<Obj> {
    let a = lhs.expect_bool(proto.name())?;
    let b = rhs.expect_bool(proto.name())?;
    let value = match proto {
        Protocol::LAnd | Protocol::And => a && b,
        Protocol::LOr | Protocol::Or => a || b,
        _ => a ^ b,
    };
    Ok(Object::bool(value))
}

fn string_binary(proto: Protocol, lhs: &Object, rhs: &Object) -> Result<Obj> {
    let a = lhs.expect_str(proto.name())?;
    let b = rhs.expect_str(proto.name())?;
    if let Some(result) = compare(proto, a, b) {
        return Ok(Object::bool(result));
    }
    let mut joined = String::with_capacity(a.len() + b.len());
    joined.push_str(a);
    joined.push_str(b);
    Ok(Object::string(&joined))
}
