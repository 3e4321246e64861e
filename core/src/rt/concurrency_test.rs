//! Tests for the task runtime

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;

    use crate::rt::{Config, Runtime};
    use crate::val::Object;

    fn runtime() -> Arc<Runtime> {
        let config = Config {
            worker_threads: Some(2),
            ..Config::default()
        };
        Arc::new(Runtime::new(config).unwrap())
    }

    #[test]
    fn test_run_returns_job_result() {
        let rt = runtime();
        let value = rt.run(|| Ok(Object::int(42))).unwrap();
        assert_eq!(value.as_int(), Some(42));

        let err = rt.run(|| -> anyhow::Result<()> { Err(anyhow!("bad job")) }).unwrap_err();
        assert_eq!(err.to_string(), "bad job");
    }

    #[test]
    fn test_wait_all_joins_every_task() {
        let rt = runtime();
        let done = Arc::new(AtomicUsize::new(0));
        let mut ids = Vec::new();
        for _ in 0..4 {
            let done = Arc::clone(&done);
            ids.push(
                rt.spawn("count", move || {
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(Vec::new())
                })
                .unwrap(),
            );
        }
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(rt.pending(), 4);

        rt.wait_all().unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 4);
        assert_eq!(rt.pending(), 0);
    }

    #[test]
    fn test_wait_all_reports_first_failure() {
        let rt = runtime();
        rt.spawn("ok", || Ok(vec![Object::nil()])).unwrap();
        rt.spawn("first", || Err(anyhow!("first failure"))).unwrap();
        rt.spawn("second", || Err(anyhow!("second failure"))).unwrap();

        let err = rt.wait_all().unwrap_err();
        assert_eq!(err.to_string(), "first failure");
        // failed tasks are not retried
        assert_eq!(rt.pending(), 0);
        rt.wait_all().unwrap();
    }

    #[test]
    fn test_tasks_spawned_while_waiting_are_joined() {
        let rt = runtime();
        let done = Arc::new(AtomicUsize::new(0));
        let inner_rt = Arc::clone(&rt);
        let inner_done = Arc::clone(&done);
        rt.spawn("outer", move || {
            let done = Arc::clone(&inner_done);
            inner_rt.spawn("inner", move || {
                done.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })?;
            inner_done.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        })
        .unwrap();

        rt.wait_all().unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_task_is_an_error() {
        let rt = runtime();
        rt.spawn("panics", || panic!("task blew up")).unwrap();
        let err = rt.wait_all().unwrap_err();
        assert!(err.to_string().starts_with("task panicked"));
    }
}
