use super::Stack;
use crate::error::{RuntimeError, kind_of};
use crate::val::Object;

#[test]
fn test_rewind_discards_statement_leftovers() {
    let mut stack = Stack::new();
    stack.push(Object::int(1));

    stack.mark();
    stack.push(Object::int(2));
    stack.push(Object::int(3));
    stack.rewind();

    assert_eq!(stack.len(), 1);
    assert_eq!(stack.peek().and_then(|o| o.as_int()), Some(1));
}

#[test]
fn test_nested_marks_unwind_in_order() {
    let mut stack = Stack::new();
    stack.mark();
    stack.push(Object::int(1));
    stack.mark();
    stack.push(Object::int(2));
    stack.rewind();
    assert_eq!(stack.len(), 1);
    stack.rewind();
    assert!(stack.is_empty());
}

#[test]
fn test_rewind_without_mark_is_noop() {
    let mut stack = Stack::new();
    stack.push(Object::nil());
    stack.rewind();
    assert_eq!(stack.len(), 1);
}

#[test]
fn test_pop_underflow_is_an_error() {
    let mut stack = Stack::new();
    let err = stack.pop().unwrap_err();
    assert_eq!(kind_of(&err), Some(&RuntimeError::StackUnderflow));
    assert!(stack.pop_n(1).is_err());
}

#[test]
fn test_drain_and_pop_n_keep_push_order() {
    let mut stack = Stack::with_capacity(4);
    for i in 0..4 {
        stack.push(Object::int(i));
    }
    let top: Vec<_> = stack.pop_n(2).unwrap().iter().filter_map(|o| o.as_int()).collect();
    assert_eq!(top, vec![2, 3]);
    let rest: Vec<_> = stack.drain_from(1).iter().filter_map(|o| o.as_int()).collect();
    assert_eq!(rest, vec![1]);
    assert_eq!(stack.len(), 1);
}
