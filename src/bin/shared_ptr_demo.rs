// Shared ownership walkthrough: named handles, reset, and a reference cycle
// that is broken by hand before the owners go away.
//
// Run with: cargo run --bin shared_ptr_demo [-- trace.toml]

use std::cell::RefCell;
use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process;

use ownership_patterns::{HandleError, Release, SharedHandle, TraceConfig, Tracer};

struct Foo {
    data: String,
    other: RefCell<SharedHandle<Foo>>,
    tracer: Tracer,
}

impl Foo {
    fn new(data: &str, tracer: &Tracer) -> Self {
        tracer.event("", "new", format_args!("Foo(data={data})"));
        Foo {
            data: data.to_string(),
            other: RefCell::new(SharedHandle::empty(format!("{data}.other"), tracer)),
            tracer: tracer.clone(),
        }
    }

    fn addref(&self, other: &SharedHandle<Foo>) -> Result<(), HandleError> {
        self.other.borrow_mut().assign_from(other)
    }

    fn delref(&self) -> Result<Release, HandleError> {
        self.other.borrow_mut().reset()
    }
}

impl Drop for Foo {
    fn drop(&mut self) {
        self.tracer
            .event("", "delete", format_args!("Foo(data={})", self.data));
    }
}

fn report(tracer: &Tracer, name: &str, handle: &SharedHandle<Foo>) {
    tracer.info(&format!("{name} ref count now {}", handle.use_count()));
}

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = env::args_os().nth(1).map(PathBuf::from);
    let config = TraceConfig::resolve(config_path.as_deref())?;
    let tracer = Tracer::from_config(&config);

    // ------------------------------------------------------------------------
    // Two owners of one value
    // ------------------------------------------------------------------------
    tracer.doc("create a value and share it between two handles:");
    let mut sptr1 = SharedHandle::new("[foo1]", Foo::new("foo1-data", &tracer), &tracer);
    report(&tracer, "sptr1", &sptr1);
    let mut sptr2 = sptr1.share("[foo1-copy]")?;
    report(&tracer, "sptr2", &sptr2);

    tracer.doc("release the handles, expect foo1 to be destroyed on the second:");
    sptr1.reset()?;
    report(&tracer, "sptr1", &sptr1);
    if sptr2.reset()?.is_freed() {
        tracer.success("foo1 freed by the last reset");
    } else {
        tracer.failed("foo1 outlived its last handle");
    }
    report(&tracer, "sptr2", &sptr2);

    tracer.doc("reset a handle a second time:");
    match sptr2.reset() {
        Err(err) => tracer.success(&format!("rejected: {err}")),
        Ok(_) => tracer.failed("second reset was accepted"),
    }

    // ------------------------------------------------------------------------
    // A cycle between two values
    // ------------------------------------------------------------------------
    tracer.doc("make foo2 and foo3 point at each other:");
    let foo2 = SharedHandle::new("[foo2]", Foo::new("foo2-data", &tracer), &tracer);
    let foo3 = SharedHandle::new("[foo3]", Foo::new("foo3-data", &tracer), &tracer);
    foo2.try_get()?.addref(&foo3)?;
    foo3.try_get()?.addref(&foo2)?;
    report(&tracer, "foo2", &foo2);
    report(&tracer, "foo3", &foo3);

    tracer.doc("break the cycle, expect both to be destroyed at the end:");
    foo2.try_get()?.delref()?;
    foo3.try_get()?.delref()?;
    report(&tracer, "foo2", &foo2);
    report(&tracer, "foo3", &foo3);

    tracer.doc("End:");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("shared_ptr_demo: {err}");
        process::exit(1);
    }
}
