use std::sync::Mutex;

use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use tern_core::module::Module;
use tern_core::util::lock;
use tern_core::val::{Obj, Object, arg};

const MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// xorshift64* generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorShift {
    state: u64,
}

impl XorShift {
    pub fn new(seed: i64) -> Self {
        // zero is a fixed point of the shift steps
        let state = match (seed as u64) ^ MIX {
            0 => MIX,
            mixed => mixed,
        };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Non-negative 63-bit integer.
    pub fn int(&mut self) -> i64 {
        (self.next_u64() >> 1) as i64
    }

    /// Uniform in `[0, n)`.
    pub fn intn(&mut self, n: i64) -> Result<i64> {
        if n <= 0 {
            return Err(anyhow!("rand.intn: invalid argument {}", n));
        }
        let bound = n as u64;
        let zone = u64::MAX - u64::MAX % bound;
        loop {
            let v = self.next_u64();
            if v < zone {
                return Ok((v % bound) as i64);
            }
        }
    }

    /// Uniform in `[0, 1)`.
    pub fn float64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// A random permutation of `0..n`.
    pub fn perm(&mut self, n: i64) -> Result<Vec<i64>> {
        if n < 0 {
            return Err(anyhow!("rand.perm: invalid argument {}", n));
        }
        let mut out: Vec<i64> = (0..n).collect();
        for i in (1..out.len()).rev() {
            let j = self.intn(i as i64 + 1)? as usize;
            out.swap(i, j);
        }
        Ok(out)
    }
}

static SOURCE: Lazy<Mutex<XorShift>> = Lazy::new(|| Mutex::new(XorShift::new(1)));

#[derive(Debug, Default)]
pub struct RandModule;

impl RandModule {
    pub fn new() -> Self {
        Self
    }
}

impl Module for RandModule {
    fn name(&self) -> &str {
        "math/rand"
    }

    fn description(&self) -> &str {
        "Pseudo-random numbers from one shared seeded source"
    }

    fn exports(&self) -> Vec<(String, Obj)> {
        vec![
            (
                "seed".to_string(),
                Object::native("rand.seed", |_, args| {
                    let seed = arg(args, 0, "rand.seed")?.expect_int("rand.seed")?;
                    *lock(&*SOURCE) = XorShift::new(seed);
                    Ok(Vec::new())
                }),
            ),
            (
                "int".to_string(),
                Object::native("rand.int", |_, _| Ok(vec![Object::int(lock(&*SOURCE).int())])),
            ),
            (
                "intn".to_string(),
                Object::native("rand.intn", |_, args| {
                    let n = arg(args, 0, "rand.intn")?.expect_int("rand.intn")?;
                    Ok(vec![Object::int(lock(&*SOURCE).intn(n)?)])
                }),
            ),
            (
                "float64".to_string(),
                Object::native("rand.float64", |_, _| Ok(vec![Object::float(lock(&*SOURCE).float64())])),
            ),
            (
                "perm".to_string(),
                Object::native("rand.perm", |_, args| {
                    let n = arg(args, 0, "rand.perm")?.expect_int("rand.perm")?;
                    let items = lock(&*SOURCE).perm(n)?.into_iter().map(Object::int).collect();
                    Ok(vec![Object::array(items)])
                }),
            ),
        ]
    }
}
