//! Read a JSON file (or stdin) into a buffer, parse it, and dump the tree
//! back out in compact form. The library itself never does I/O; this demo
//! plays the "read entire file" collaborator.
//!
//! Usage: cargo run --example dump [FILE]

use std::io::Read;

fn main() {
    let buffer = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).expect("read file"),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).expect("read stdin");
            buf
        }
    };

    match nori_core::parse_prefix(&buffer) {
        Ok((value, consumed)) => {
            println!("{value}");
            if consumed < buffer.trim_end().len() {
                eprintln!("note: {} trailing bytes ignored", buffer.len() - consumed);
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
