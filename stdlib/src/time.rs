//! Wall-clock time for scripts.
//!
//! `now` and `unix` hand out foreign `Time` objects backed by chrono; their
//! methods are registered once for the type.

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use tern_core::module::Module;
use tern_core::val::{Foreign, ForeignMethods, Obj, ObjKind, Object, arg};

/// An instant in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time(pub DateTime<Utc>);

impl Time {
    pub fn now() -> Self {
        Time(Utc::now())
    }

    pub fn from_unix(secs: i64, nanos: i64) -> Result<Self> {
        // nanos outside one second carry into the seconds
        let secs = secs
            .checked_add(nanos.div_euclid(1_000_000_000))
            .ok_or_else(|| anyhow!("time.unix: seconds out of range"))?;
        let nanos = nanos.rem_euclid(1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nanos)
            .map(Time)
            .ok_or_else(|| anyhow!("time.unix: {} is out of range", secs))
    }

    pub fn rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

fn time_arg(obj: &Obj, context: &str) -> Result<Time> {
    match obj.kind() {
        ObjKind::Foreign(value) => value
            .downcast_ref::<Time>()
            .copied()
            .ok_or_else(|| anyhow!("{}: expected Time, got {}", context, value.type_name())),
        _ => Err(anyhow!("{}: expected Time, got {}", context, obj.type_name())),
    }
}

impl Foreign for Time {
    fn type_name() -> &'static str {
        "Time"
    }

    fn register_methods(methods: &mut ForeignMethods<Self>) {
        methods
            .method("unix", |_, t, _| Ok(vec![Object::int(t.0.timestamp())]))
            .method("unix_milli", |_, t, _| Ok(vec![Object::int(t.0.timestamp_millis())]))
            .method("year", |_, t, _| Ok(vec![Object::int(t.0.year() as i64)]))
            .method("month", |_, t, _| Ok(vec![Object::int(t.0.month() as i64)]))
            .method("day", |_, t, _| Ok(vec![Object::int(t.0.day() as i64)]))
            .method("format", |_, t, args| {
                let layout = arg(args, 0, "Time.format")?.expect_str("Time.format")?;
                let mut out = String::new();
                write!(out, "{}", t.0.format(layout)).map_err(|_| anyhow!("Time.format: invalid layout {:?}", layout))?;
                Ok(vec![Object::string(&out)])
            })
            // difference in nanoseconds
            .method("sub", |_, t, args| {
                let other = time_arg(arg(args, 0, "Time.sub")?, "Time.sub")?;
                let nanos = (t.0 - other.0)
                    .num_nanoseconds()
                    .ok_or_else(|| anyhow!("Time.sub: difference overflows"))?;
                Ok(vec![Object::int(nanos)])
            })
            .method("string", |_, t, _| Ok(vec![Object::string(&t.rfc3339())]));
    }

    fn display(&self) -> Option<String> {
        Some(self.rfc3339())
    }
}

#[derive(Debug, Default)]
pub struct TimeModule;

impl TimeModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for TimeModule {
    fn name(&self) -> &str {
        "time"
    }

    fn description(&self) -> &str {
        "Sleeping and wall-clock time"
    }

    fn exports(&self) -> Vec<(String, Obj)> {
        vec![
            (
                "sleep".to_string(),
                Object::native("time.sleep", |_, args| {
                    let ms = arg(args, 0, "time.sleep")?.expect_int("time.sleep")?;
                    // evaluations run on blocking-pool threads
                    std::thread::sleep(Duration::from_millis(ms.max(0) as u64));
                    Ok(Vec::new())
                }),
            ),
            (
                "now".to_string(),
                Object::native("time.now", |_, _| Ok(vec![Object::foreign(Time::now())])),
            ),
            (
                "unix".to_string(),
                Object::native("time.unix", |_, args| {
                    let secs = arg(args, 0, "time.unix")?.expect_int("time.unix")?;
                    let nanos = match args.get(1) {
                        Some(n) => n.expect_int("time.unix")?,
                        None => 0,
                    };
                    Ok(vec![Object::foreign(Time::from_unix(secs, nanos)?)])
                }),
            ),
        ]
    }
}
