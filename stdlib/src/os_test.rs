#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use tern_core::ast::{Expr, Program, Stmt};
    use tern_core::interp::Interpreter;
    use tern_core::rt::{Config, Runtime};
    use tern_core::val::Obj;

    fn run(stmts: Vec<Stmt>) -> Result<Vec<Obj>> {
        let rt = Arc::new(Runtime::new(Config::default())?);
        crate::install_stdlib(&rt)?;
        let mut all = vec![Stmt::import("os")];
        all.extend(stmts);
        Interpreter::new(rt).run(&Program::new(all))
    }

    fn os_call(method: &str, args: Vec<Expr>) -> Expr {
        Expr::method_call(Expr::ident("os"), method, args)
    }

    #[test]
    fn test_os_getpid_and_hostname() -> Result<()> {
        let out = run(vec![Stmt::ret(vec![os_call("getpid", vec![]), os_call("hostname", vec![])])])?;
        assert_eq!(out[0].as_int(), Some(std::process::id() as i64));
        assert!(!out[1].as_str().unwrap_or_default().is_empty());

        assert!(run(vec![Stmt::expr(os_call("getpid", vec![Expr::int(1)]))]).is_err());
        Ok(())
    }

    #[test]
    fn test_os_env_set_and_get() -> Result<()> {
        // Use a very unlikely var name
        let var = "TERN_TEST_ENV_SHOULD_NOT_EXIST_42";
        let out = run(vec![Stmt::ret(vec![os_call("getenv", vec![Expr::string(var)])])])?;
        assert_eq!(out[0].as_str(), Some(""));

        let out = run(vec![
            Stmt::expr(os_call("setenv", vec![Expr::string(var), Expr::string("X")])),
            Stmt::ret(vec![os_call("getenv", vec![Expr::string(var)])]),
        ])?;
        assert_eq!(out[0].as_str(), Some("X"));
        assert_eq!(std::env::var(var).ok().as_deref(), Some("X"));

        let err = run(vec![Stmt::expr(os_call("setenv", vec![Expr::string("A=B"), Expr::string("1")]))]);
        assert!(err.is_err());
        Ok(())
    }

    #[test]
    fn test_os_chdir_missing_directory_fails() {
        let err = run(vec![Stmt::expr(os_call(
            "chdir",
            vec![Expr::string("/definitely/not/a/real/dir/tern")],
        ))])
        .unwrap_err();
        assert!(format!("{:#}", err).contains("chdir"));
    }
}
