#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use tern_core::ast::{Expr, Program, Stmt};
    use tern_core::interp::Interpreter;
    use tern_core::rt::{Config, Runtime};
    use tern_core::val::Obj;

    use crate::time::Time;

    fn run(stmts: Vec<Stmt>) -> Result<Vec<Obj>> {
        let rt = Arc::new(Runtime::new(Config::default())?);
        crate::install_stdlib(&rt)?;
        let mut all = vec![Stmt::import("time")];
        all.extend(stmts);
        Interpreter::new(rt).run(&Program::new(all))
    }

    fn t() -> Expr {
        Expr::ident("t")
    }

    #[test]
    fn test_unix_time_fields() -> Result<()> {
        let out = run(vec![
            Stmt::assign(
                "t",
                Expr::method_call(Expr::ident("time"), "unix", vec![Expr::int(1_700_000_000), Expr::int(0)]),
            ),
            Stmt::ret(vec![
                Expr::method_call(t(), "year", vec![]),
                Expr::method_call(t(), "month", vec![]),
                Expr::method_call(t(), "day", vec![]),
                Expr::method_call(t(), "unix", vec![]),
                Expr::method_call(t(), "unix_milli", vec![]),
                Expr::method_call(t(), "string", vec![]),
                Expr::method_call(t(), "format", vec![Expr::string("%Y-%m-%d %H:%M")]),
            ]),
        ])?;
        let ints: Vec<i64> = out[..5].iter().filter_map(|o| o.as_int()).collect();
        assert_eq!(ints, vec![2023, 11, 14, 1_700_000_000, 1_700_000_000_000]);
        assert_eq!(out[5].as_str(), Some("2023-11-14T22:13:20Z"));
        assert_eq!(out[6].as_str(), Some("2023-11-14 22:13"));
        assert_eq!(out[5].type_name(), "string");
        Ok(())
    }

    #[test]
    fn test_sub_returns_nanoseconds() -> Result<()> {
        let unix = |s: i64, ns: i64| Expr::method_call(Expr::ident("time"), "unix", vec![Expr::int(s), Expr::int(ns)]);
        let out = run(vec![Stmt::ret(vec![Expr::method_call(unix(10, 500), "sub", vec![unix(9, 0)])])])?;
        assert_eq!(out[0].as_int(), Some(1_000_000_500));

        let err = run(vec![Stmt::ret(vec![Expr::method_call(unix(10, 0), "sub", vec![Expr::int(9)])])]);
        assert!(err.is_err());
        Ok(())
    }

    #[test]
    fn test_now_is_a_time_object() -> Result<()> {
        let out = run(vec![
            Stmt::expr(Expr::method_call(Expr::ident("time"), "sleep", vec![Expr::int(1)])),
            Stmt::ret(vec![Expr::method_call(Expr::ident("time"), "now", vec![])]),
        ])?;
        assert_eq!(out[0].type_name(), "Time");
        assert!(out[0].to_string().ends_with('Z'));
        Ok(())
    }

    #[test]
    fn test_from_unix_carries_nanoseconds() -> Result<()> {
        let before_epoch = Time::from_unix(0, -1)?;
        assert_eq!(before_epoch.rfc3339(), "1969-12-31T23:59:59.999999999Z");
        let carried = Time::from_unix(1, 1_500_000_000)?;
        assert_eq!(carried.0.timestamp(), 2);
        assert!(Time::from_unix(i64::MAX, 0).is_err());
        Ok(())
    }
}
