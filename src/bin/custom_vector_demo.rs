// Growable buffer walkthrough: growth, copy, move, iteration and
// building a buffer from a list.
//
// Run with: cargo run --bin custom_vector_demo [-- trace.toml]

use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process;

use ownership_patterns::{GrowableBuffer, TraceConfig, Tracer};

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = env::args_os().nth(1).map(PathBuf::from);
    let config = TraceConfig::resolve(config_path.as_deref())?;
    let tracer = Tracer::from_config(&config);

    tracer.doc("Create a custom vector:");
    let mut vec1 = GrowableBuffer::with_capacity(1).traced("vec1", &tracer);
    vec1.push(10);
    vec1.push(11);
    tracer.info(&format!("vec1: {vec1}"));

    tracer.doc("Create a copy of vec1, vec2:");
    let mut vec2 = vec1.clone().traced("vec2", &tracer);
    tracer.info(&format!("vec2: {vec2}"));

    tracer.doc("Check we can append onto the copy:");
    vec2.push(12);
    vec2.push(13);
    tracer.info(&format!("vec2: {vec2}"));
    tracer.info(&format!("vec1: {vec1}"));

    tracer.doc("Move vec1 into vec3:");
    let mut vec3 = vec1.take().traced("vec3", &tracer);
    tracer.info(&format!("vec3: {vec3}"));

    tracer.doc("Check we can append onto the moved-to vector:");
    vec3.push(14);
    vec3.push(15);
    tracer.info(&format!("vec3: {vec3}"));

    tracer.doc("Check the moved-from vector is empty and still usable:");
    if vec1.is_empty() && vec1.capacity() == 0 {
        tracer.success(&format!("vec1 is empty: {}", vec1.describe()));
    } else {
        tracer.failed(&format!("vec1 kept elements: {}", vec1.describe()));
    }
    vec1.push(16);
    match vec1.at(0) {
        Ok(value) => tracer.success(&format!("vec1[0] = {value}")),
        Err(err) => tracer.failed(&err.to_string()),
    }

    tracer.doc("Walk vec3 with its iterator:");
    for value in &vec3 {
        tracer.info(&format!("vec3: walk {value}"));
    }

    tracer.doc("Out of bounds access is reported:");
    match vec3.at(vec3.len()) {
        Err(err) => tracer.success(&err.to_string()),
        Ok(value) => tracer.failed(&format!("read past the end: {value}")),
    }

    tracer.doc("Build a vector of strings from a list:");
    let words: GrowableBuffer<String> = ["elem1", "elem2"].into_iter().map(String::from).collect();
    let words = words.traced("words", &tracer);
    for word in &words {
        tracer.info(word);
    }

    tracer.doc("Destroy vec1:");
    drop(vec1);

    tracer.doc("End, expect vec2, vec3 and words to be destroyed:");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("custom_vector_demo: {err}");
        process::exit(1);
    }
}
