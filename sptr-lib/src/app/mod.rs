use core::any::Any;
use std::io::{self, Error, ErrorKind};

use io_trait::Io;
use log::{debug, info};

use crate::{
    mem::{Dealloc, Local, Manager},
    ptr::{const_pointer_cast, Object, SelfRef, SharedFromSelf, SharedPtr},
};

/// Runs the lifecycle scenarios and writes the trace to the path given as the
/// first argument.
pub fn run(io: &impl Io) -> io::Result<()> {
    let mut a = io.args();
    a.next();
    let Some(output) = a.next() else {
        return Err(Error::new(ErrorKind::InvalidInput, "usage: sptr <output>"));
    };
    let report = trace();
    info!("writing {} bytes to {}", report.len(), output);
    io.write(&output, report.as_bytes())
}

/// One line per step: handle counts and the number of live allocations.
pub fn trace() -> String {
    let local = Local::default();
    let lines = {
        let mut t = Trace {
            local: &local,
            lines: Vec::new(),
        };
        lifecycle(&mut t);
        self_reference(&mut t);
        casts(&mut t);
        t.lines
    };
    let mut result = lines.join("\n");
    result.push('\n');
    result
}

struct Trace<'a> {
    local: &'a Local,
    lines: Vec<String>,
}

impl Trace<'_> {
    fn push(&mut self, line: String) {
        debug!("{}", line);
        self.lines.push(line);
    }
    fn counts(&mut self, step: &str, strong: usize, weak: usize) {
        let live = self.local.count();
        self.push(format!("{step}: strong={strong} weak={weak} live={live}"));
    }
    fn live(&mut self, step: &str) {
        let live = self.local.count();
        self.push(format!("{step}: live={live}"));
    }
    fn check(&mut self, step: &str, value: bool) {
        self.push(format!("{step}: {value}"));
    }
}

fn lifecycle(t: &mut Trace) {
    let x = t.local.shared_new(String::from("x"));
    t.counts("wrap", x.strong_count(), x.weak_count());
    let b = x.clone();
    t.counts("copy", b.strong_count(), b.weak_count());
    drop(x);
    t.counts("release original", b.strong_count(), b.weak_count());
    let w = b.downgrade();
    t.counts("downgrade", w.strong_count(), w.weak_count());
    drop(b);
    t.counts("release last strong", w.strong_count(), w.weak_count());
    t.check("lock", w.lock().is_valid());
    drop(w);
    t.live("release weak");
}

struct Tracked<D: Dealloc> {
    self_ref: SelfRef<Self, D>,
}

impl<D: Dealloc> Object<D> for Tracked<D> {
    fn self_ref(&self) -> &SelfRef<Self, D> {
        &self.self_ref
    }
}

fn self_reference(t: &mut Trace) {
    let tracked = Tracked::<&Local> {
        self_ref: SelfRef::new(),
    };
    t.check("self before wrap", tracked.self_as_shared_ptr().is_valid());
    let x = t.local.shared_object(tracked);
    let y = x.self_as_shared_ptr();
    t.check("self after wrap", y.ptr_eq(&x));
    t.counts("self counts", x.strong_count(), x.weak_count());
    drop((x, y));
    t.live("self release");
}

fn casts(t: &mut Trace) {
    let x = t.local.shared_new(7u32);
    let any: SharedPtr<dyn Any, _> = x.static_cast();
    t.counts("static cast", x.strong_count(), x.weak_count());
    let miss: SharedPtr<i64, _> = any.dynamic_cast();
    t.check("dynamic cast miss", miss.is_valid());
    t.counts("dynamic cast miss counts", x.strong_count(), x.weak_count());
    let hit: SharedPtr<u32, _> = any.dynamic_cast();
    t.counts("dynamic cast hit", x.strong_count(), x.weak_count());
    let c = hit.to_const();
    let m = const_pointer_cast(&c);
    t.counts("const cast", x.strong_count(), x.weak_count());
    drop((x, any, miss, hit, c, m));
    t.live("casts release");
}
