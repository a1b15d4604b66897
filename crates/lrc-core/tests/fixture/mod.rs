//! Demo resources for the runtime tests.
//!
//! `generated.rs` is the exact output of `lrc` for:
//!
//! ```text
//! // A file on the demo system
//! demo.file {
//!   init(path string)
//!   path string
//!   size() int
//!   perms(path, size) string
//! }
//!
//! demo.user {
//!   name string
//!   home() demo.file
//! }
//! ```
//!
//! with an init hook registered for `demo.user`. The `lrc` compiler tests
//! keep it in sync. Everything below the include is hand-written.

use std::{
    cell::Cell,
    sync::{
        Condvar, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

include!("generated.rs");

thread_local! {
    static SIZE_CALLS: Cell<usize> = const { Cell::new(0) };
    static SIZE_READY: Cell<bool> = const { Cell::new(true) };
}

pub fn size_calls() -> usize {
    SIZE_CALLS.with(Cell::get)
}

pub fn set_size_ready(ready: bool) {
    SIZE_READY.with(|cell| cell.set(ready));
}

/// Paths ending in `slow` block in `get_size` until [`release_slow_fetches`].
static SLOW_FETCHES: AtomicUsize = AtomicUsize::new(0);
static SLOW_GATE: (Mutex<bool>, Condvar) = (Mutex::new(false), Condvar::new());

pub fn slow_fetches() -> usize {
    SLOW_FETCHES.load(Ordering::SeqCst)
}

pub fn release_slow_fetches() {
    let (open, opened) = &SLOW_GATE;
    *open.lock().unwrap() = true;
    opened.notify_all();
}

fn wait_for_gate() {
    let (open, opened) = &SLOW_GATE;
    let guard = open.lock().unwrap();
    let _guard = opened.wait_while(guard, |open| !*open).unwrap();
}

pub fn runtime() -> Runtime {
    let mut registry = Registry::new();
    init(&mut registry);
    Runtime::new(registry)
}

pub fn args<const N: usize>(entries: [(&str, Value); N]) -> Args {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

impl MqlDemoFile {
    fn id(&self) -> Result<String, FieldError> {
        DemoFile::path(self)
    }

    fn get_size(&self) -> Result<i64, FieldError> {
        SIZE_CALLS.with(|calls| calls.set(calls.get() + 1));
        if !SIZE_READY.with(Cell::get) {
            return Err(FieldError::NotReady);
        }
        let path = DemoFile::path(self)?;
        if path.ends_with("slow") {
            SLOW_FETCHES.fetch_add(1, Ordering::SeqCst);
            wait_for_gate();
        }
        if path.ends_with("denied") {
            return Err(FieldError::message("permission denied"));
        }
        Ok(path.len() as i64)
    }

    fn get_perms(&self, path: String, size: i64) -> Result<String, FieldError> {
        Ok(format!("{path}:{size}"))
    }
}

impl MqlDemoUser {
    fn id(&self) -> Result<String, FieldError> {
        DemoUser::name(self)
    }

    fn get_home(&self) -> Result<Arc<MqlDemoFile>, FieldError> {
        let name = DemoUser::name(self)?;
        let path = format!("/home/{name}");
        let file = self
            .inner
            .runtime()
            .create_resource("demo.file", args([("path", Value::from(path))]))?;
        Value::Resource(file)
            .into_resource::<MqlDemoFile>()
            .ok_or_else(|| FieldError::message("home is not a demo.file"))
    }
}

/// Accepts `login` as an alias for `name` and reuses live users.
impl InitHook for MqlDemoUser {
    fn init(&self, mut args: Args) -> Result<(Args, Option<ResourceRef>), FieldError> {
        if let Some(login) = args.remove("login") {
            args.insert("name".to_string(), login);
        }
        if let Some(Value::String(name)) = args.get("name") {
            let key = ResourceKey::new("demo.user", name.clone());
            if let Some(existing) = self.inner.runtime().lookup(&key) {
                return Ok((args, Some(existing)));
            }
        }
        Ok((args, None))
    }
}
