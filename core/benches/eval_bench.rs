use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use tern_core::ast::{Expr, Program, Stmt};
use tern_core::compiler::compile;
use tern_core::interp::Interpreter;
use tern_core::rt::{Config, Runtime};
use tern_core::token::Token;

fn id(name: &str) -> Expr {
    Expr::ident(name)
}

// func fib(n) { if n < 2 { return n }; return fib(n - 1) + fib(n - 2) }; return fib(N)
fn fib_program(n: i64) -> Program {
    let fib = Stmt::func(
        "fib",
        &["n"],
        vec![
            Stmt::if_else(
                Expr::binary(id("n"), Token::Lss, Expr::int(2)),
                vec![Stmt::ret(vec![id("n")])],
                None,
            ),
            Stmt::ret(vec![Expr::binary(
                Expr::call(id("fib"), vec![Expr::binary(id("n"), Token::Sub, Expr::int(1))]),
                Token::Add,
                Expr::call(id("fib"), vec![Expr::binary(id("n"), Token::Sub, Expr::int(2))]),
            )]),
        ],
    );
    Program::new(vec![fib, Stmt::ret(vec![Expr::call(id("fib"), vec![Expr::int(n)])])])
}

// xs = []; for i = 0; i < N; i++ { xs.push(i) }; total = 0; for _, x := range xs { total += x }
fn loop_program(n: i64) -> Program {
    Program::new(vec![
        Stmt::assign("xs", Expr::array(vec![])),
        Stmt::for_loop(
            Some(Stmt::assign("i", Expr::int(0))),
            Some(Expr::binary(id("i"), Token::Lss, Expr::int(n))),
            Some(Stmt::inc(id("i"))),
            vec![Stmt::expr(Expr::method_call(id("xs"), "push", vec![id("i")]))],
        ),
        Stmt::assign("total", Expr::int(0)),
        Stmt::range(
            Some("_"),
            Some("x"),
            id("xs"),
            vec![Stmt::compound(id("total"), Token::AddAssign, id("x"))],
        ),
        Stmt::ret(vec![id("total")]),
    ])
}

fn eval_bench(c: &mut Criterion) {
    let rt = Arc::new(Runtime::new(Config::default()).unwrap());

    let fib = fib_program(15);
    c.bench_function("eval_fib_15", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new(Arc::clone(&rt));
            black_box(interp.run(&fib).unwrap());
        })
    });

    let loops = loop_program(1_000);
    c.bench_function("eval_push_and_range_1000", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new(Arc::clone(&rt));
            black_box(interp.run(&loops).unwrap());
        })
    });
}

fn compile_bench(c: &mut Criterion) {
    let fib = fib_program(15);
    let loops = loop_program(1_000);
    c.bench_function("compile_fib", |b| b.iter(|| black_box(compile(&fib).unwrap())));
    c.bench_function("compile_loops", |b| b.iter(|| black_box(compile(&loops).unwrap())));
}

criterion_group!(benches, eval_bench, compile_bench);
criterion_main!(benches);
