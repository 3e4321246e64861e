use crate::ast::{CaseClause, Expr, Ident, LitKind, Program, Stmt};
use crate::compiler::{CompiledModule, Const, Instr, Target, Upvalue, compile};
use crate::error::{RuntimeError, kind_of, position_of};
use crate::token::Token;

fn id(name: &str) -> Expr {
    Expr::ident(name)
}

fn compile_stmts(stmts: Vec<Stmt>) -> CompiledModule {
    compile(&Program::new(stmts)).expect("compile")
}

fn send(name: &str, argc: usize) -> Instr {
    Instr::SendMethod(name.to_string(), argc)
}

fn label_at(code: &[Instr], target: &Target) -> String {
    match target {
        Target::Pc(pc) => match &code[*pc] {
            Instr::Label(name) => name.clone(),
            other => panic!("jump to non-label {:?}", other),
        },
        Target::Label(l) => panic!("unresolved label L{}", l),
    }
}

fn jump_targets(code: &[Instr]) -> Vec<Target> {
    code.iter()
        .filter_map(|instr| match instr {
            Instr::Jump(t) | Instr::JumpIfFalse(t) | Instr::PushBlock(t) => Some(*t),
            _ => None,
        })
        .collect()
}

#[test]
fn test_lowers_assignment_left_operand_first() {
    let module = compile_stmts(vec![
        Stmt::assign("a", Expr::int(1)),
        Stmt::assign("a", Expr::binary(id("a"), Token::Add, Expr::int(2))),
    ]);
    let main = module.main().expect("main proto");
    assert_eq!(
        main.code,
        vec![
            Instr::Mark,
            Instr::Push(Const::Int(1)),
            Instr::StoreLocal(0),
            Instr::Rewind,
            Instr::Mark,
            Instr::LoadLocal(0),
            Instr::Push(Const::Int(2)),
            send("__add__", 1),
            Instr::StoreLocal(0),
            Instr::Rewind,
        ]
    );
    assert_eq!(main.locals, vec!["a".to_string()]);
}

#[test]
fn test_unresolved_read_is_a_compile_error() {
    let ghost = Expr::Ident(Ident {
        name: "ghost".into(),
        pos: 9,
    });
    let err = compile(&Program::new(vec![Stmt::expr(ghost)])).unwrap_err();
    assert_eq!(kind_of(&err), Some(&RuntimeError::UnresolvedName("ghost".into())));
    assert_eq!(position_of(&err), Some(9));
}

#[test]
fn test_captured_parameter_becomes_upvalue() {
    // func outer(n) { return func() { return n } }
    let module = compile_stmts(vec![Stmt::func(
        "outer",
        &["n"],
        vec![Stmt::ret(vec![Expr::func(&[], vec![Stmt::ret(vec![id("n")])])])],
    )]);
    assert_eq!(module.protos.len(), 3);

    let outer = &module.protos[1];
    assert_eq!(outer.name, "outer");
    assert_eq!(outer.code[0], Instr::StoreLocal(0));

    let inner = &module.protos[2];
    assert_eq!(
        inner.upvalues,
        vec![Upvalue {
            name: "n".into(),
            depth: 1,
            slot: 0,
        }]
    );
    assert_eq!(inner.code[0], Instr::LoadUpval(0));
    assert_eq!(inner.code[1], Instr::RaiseReturn(1));

    let main = module.main().expect("main proto");
    assert!(main.code.contains(&Instr::PushClosure(outer.id)));
    assert!(main.code.contains(&Instr::StoreLocal(0)));
}

#[test]
fn test_named_function_can_call_itself() {
    let module = compile_stmts(vec![Stmt::func(
        "loop_forever",
        &[],
        vec![Stmt::ret(vec![Expr::call(id("loop_forever"), vec![])])],
    )]);
    let body = &module.protos[1];
    assert_eq!(body.upvalues[0].name, "loop_forever");
    assert_eq!(body.code[0], Instr::LoadUpval(0));
    assert_eq!(body.code[1], send("__call__", 0));
}

#[test]
fn test_declared_local_does_not_write_through_to_outer() {
    let module = compile_stmts(vec![
        Stmt::assign("x", Expr::int(1)),
        Stmt::func_with_locals("f", &[], &["x"], vec![Stmt::assign("x", Expr::int(2))]),
        Stmt::func("g", &[], vec![Stmt::assign("x", Expr::int(3))]),
    ]);
    let f = &module.protos[1];
    assert!(f.code.contains(&Instr::StoreLocal(0)));
    assert!(f.upvalues.is_empty());

    let g = &module.protos[2];
    assert!(g.code.contains(&Instr::StoreUpval(0)));
    assert_eq!(g.upvalues[0].name, "x");
}

#[test]
fn test_for_loop_labels_are_resolved() {
    let module = compile_stmts(vec![Stmt::for_loop(
        Some(Stmt::assign("i", Expr::int(0))),
        Some(Expr::binary(id("i"), Token::Lss, Expr::int(3))),
        Some(Stmt::inc(id("i"))),
        vec![
            Stmt::if_else(Expr::binary(id("i"), Token::Eql, Expr::int(1)), vec![Stmt::cont()], None),
            Stmt::if_else(Expr::binary(id("i"), Token::Eql, Expr::int(2)), vec![Stmt::brk()], None),
        ],
    )]);
    let code = &module.main().expect("main proto").code;
    assert!(matches!(code.first(), Some(Instr::PushBlock(_))));
    assert_eq!(code.last(), Some(&Instr::PopBlock));
    assert!(code.contains(&Instr::RaiseBreak));
    assert!(code.contains(&send("__inc__", 0)));

    for target in jump_targets(code) {
        label_at(code, &target);
    }
    let Some(Instr::PushBlock(end)) = code.first() else {
        panic!("loop must open a block");
    };
    assert!(label_at(code, end).starts_with("endfor"));

    // continue jumps to the post statement
    let continues: Vec<String> = code
        .windows(2)
        .filter_map(|w| match w {
            [Instr::JumpIfFalse(_), Instr::Jump(t)] => Some(label_at(code, t)),
            _ => None,
        })
        .collect();
    assert!(continues.iter().any(|l| l.starts_with("post")), "{:?}", continues);
}

#[test]
fn test_branch_outside_loop_emits_nothing() {
    let module = compile_stmts(vec![Stmt::brk(), Stmt::cont()]);
    assert!(module.main().expect("main proto").code.is_empty());
}

#[test]
fn test_range_lowers_to_iter_protocol() {
    let module = compile_stmts(vec![Stmt::range(
        Some("k"),
        Some("v"),
        Expr::array(vec![Expr::int(10), Expr::int(20)]),
        vec![Stmt::expr(id("v"))],
    )]);
    let main = module.main().expect("main proto");
    assert!(main.locals.iter().any(|l| l.starts_with("#src")));
    assert!(main.locals.iter().any(|l| l.starts_with("#iter")));
    assert!(main.code.contains(&send("__iter__", 1)));
    assert!(main.code.contains(&Instr::NewArray(2)));

    let k = main.locals.iter().position(|l| l == "k").expect("k slot");
    let v = main.locals.iter().position(|l| l == "v").expect("v slot");
    let jif = main
        .code
        .iter()
        .position(|i| matches!(i, Instr::JumpIfFalse(_)))
        .expect("loop test");
    assert_eq!(main.code[jif + 1], Instr::StoreLocal(v));
    assert_eq!(main.code[jif + 2], Instr::StoreLocal(k));
    for target in jump_targets(&main.code) {
        label_at(&main.code, &target);
    }
}

#[test]
fn test_imports_resolve_as_module_references() {
    let module = compile_stmts(vec![
        Stmt::import("math/rand"),
        Stmt::expr(Expr::method_call(id("rand"), "intn", vec![Expr::int(6)])),
    ]);
    assert_eq!(module.modules, vec!["math/rand".to_string()]);
    let code = &module.main().expect("main proto").code;
    assert_eq!(code[0], Instr::Import("math/rand".into()));
    assert!(code.contains(&Instr::PushModule("rand".into())));
    assert!(code.contains(&send("__get_property__", 1)));
    assert!(code.contains(&send("__call__", 1)));
}

#[test]
fn test_switch_tests_fall_through_to_next_clause() {
    let module = compile_stmts(vec![
        Stmt::assign("n", Expr::int(2)),
        Stmt::switch(
            Some(id("n")),
            vec![
                CaseClause::case(vec![Expr::int(1)], vec![Stmt::assign("r", Expr::int(10))]),
                CaseClause::default(vec![Stmt::assign("r", Expr::int(0))]),
            ],
        ),
    ]);
    let main = module.main().expect("main proto");
    assert!(main.locals.iter().any(|l| l.starts_with("#switch")));
    assert!(main.code.contains(&send("__eql__", 1)));
    let targets: Vec<String> = jump_targets(&main.code)
        .iter()
        .map(|t| label_at(&main.code, t))
        .collect();
    assert!(targets.iter().any(|l| l.starts_with("case")));
    assert!(targets.iter().any(|l| l.starts_with("endswitch")));
}

#[test]
fn test_index_compound_assignment_evaluates_receiver_once() {
    let module = compile_stmts(vec![
        Stmt::assign("arr", Expr::array(vec![Expr::int(1)])),
        Stmt::compound(Expr::index(id("arr"), Expr::int(0)), Token::AddAssign, Expr::int(5)),
    ]);
    let code = &module.main().expect("main proto").code;
    let reads = code.iter().filter(|i| **i == Instr::LoadLocal(0)).count();
    assert_eq!(reads, 1);
    assert!(code.contains(&send("__get_index__", 1)));
    assert!(code.contains(&send("__add_assign__", 1)));
    assert!(code.contains(&send("__set_index__", 2)));
}

#[test]
fn test_multi_assignment_spreads_call_results() {
    let module = compile_stmts(vec![
        Stmt::func("pair", &[], vec![Stmt::ret(vec![Expr::int(1), Expr::int(2)])]),
        Stmt::assign_many(vec![id("a"), id("b")], vec![Expr::call(id("pair"), vec![])]),
    ]);
    let main = module.main().expect("main proto");
    assert!(main.locals.iter().filter(|l| l.starts_with("#tmp")).count() == 2);

    let err = compile(&Program::new(vec![Stmt::assign_many(
        vec![id("a"), id("b")],
        vec![Expr::int(1)],
    )]))
    .unwrap_err();
    assert!(matches!(kind_of(&err), Some(RuntimeError::Arity { expected: 2, got: 1, .. })));
}

#[test]
fn test_blank_target_discards_value() {
    let module = compile_stmts(vec![
        Stmt::assign("_", Expr::int(1)),
        Stmt::func("pair", &[], vec![Stmt::ret(vec![Expr::int(1), Expr::int(2)])]),
        Stmt::assign_many(vec![id("_"), id("b")], vec![Expr::call(id("pair"), vec![])]),
    ]);
    let main = module.main().expect("main proto");
    assert_eq!(&main.code[..4], &[Instr::Mark, Instr::Push(Const::Int(1)), Instr::Pop, Instr::Rewind]);
    assert!(!main.locals.iter().any(|l| l == "_"));
    assert!(main.locals.iter().any(|l| l == "b"));
    assert!(module.to_string().contains("Pop"));
}

#[test]
fn test_rejects_unassignable_targets_and_bad_literals() {
    let err = compile(&Program::new(vec![Stmt::assign_many(vec![Expr::int(1)], vec![Expr::int(2)])])).unwrap_err();
    assert!(matches!(kind_of(&err), Some(RuntimeError::TypeShape { .. })));

    let err = compile(&Program::new(vec![Stmt::expr(Expr::lit(LitKind::Float, "1.2.3"))])).unwrap_err();
    assert!(matches!(
        kind_of(&err),
        Some(RuntimeError::LiteralConversion { kind: "float", .. })
    ));
}

#[test]
fn test_spawn_pushes_callee_and_arguments() {
    let module = compile_stmts(vec![
        Stmt::func("work", &["n"], vec![]),
        Stmt::spawn(Expr::call(id("work"), vec![Expr::int(3)])),
    ]);
    let code = &module.main().expect("main proto").code;
    let n = code.len();
    assert_eq!(
        &code[n - 3..],
        &[Instr::LoadLocal(0), Instr::Push(Const::Int(3)), Instr::Spawn(1)]
    );
}

#[test]
fn test_listing_and_json_dump() {
    let module = compile_stmts(vec![
        Stmt::func("twice", &["x"], vec![Stmt::ret(vec![Expr::binary(id("x"), Token::Mul, Expr::int(2))])]),
        Stmt::ret(vec![Expr::call(id("twice"), vec![Expr::string("ab")])]),
    ]);
    let listing = module.to_string();
    assert!(listing.contains("proto #0 <main>()"));
    assert!(listing.contains("proto #1 twice(x)"));
    assert!(listing.contains("SendMethod __mul__ 1"));
    assert!(listing.contains("Push \"ab\""));

    let json = module.to_json().expect("json");
    assert!(json.contains("\"SendMethod\""));
    assert!(json.contains("\"twice\""));
}
