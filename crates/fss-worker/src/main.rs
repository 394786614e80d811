//! The per-event mirror worker the FSS manager spawns as a child process.
//!
//! Given `<source> <target> <filename> <operation>`,
//! perform a byte-copy (or delete) and print exactly one
//! `[WORKER_REPORT]` line to stdout before exiting. The manager's reader
//! thread parses that line; nothing else is read from this process.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use clap::Parser;
use sync_common::render_worker_report;

#[derive(Parser, Debug)]
#[command(name = "fss-worker")]
struct Args {
    source: String,
    target: String,
    filename: String,
    operation: String,
}

fn print_report(source: &str, target: &str, operation: &str, status: &str, details: &str) {
    println!(
        "{}",
        render_worker_report(source, target, process::id(), operation, status, details)
    );
    io::stdout().flush().ok();
}

/// Copy `src` to `dest`, creating `dest`'s parent directory if needed.
fn sync_file(src: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut src_file = fs::File::open(src)?;
    let mut dest_file = fs::File::create(dest)?;
    let mut buf = [0u8; 4096];
    loop {
        let n = src_file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        dest_file.write_all(&buf[..n])?;
    }
    Ok(())
}

fn run_full(source: &str, target: &str, operation: &str) -> anyhow::Result<()> {
    let entries = match fs::read_dir(source) {
        Ok(entries) => entries,
        Err(e) => {
            print_report(source, target, operation, "ERROR", &format!("{source}: {e}"));
            process::exit(1);
        }
    };

    let mut success_count = 0usize;
    let mut error_count = 0usize;
    let mut errors = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let name = entry.file_name();
        let name = name.to_string_lossy().into_owned();
        let src_path = Path::new(source).join(&name);
        let dest_path = Path::new(target).join(&name);

        match sync_file(&src_path, &dest_path) {
            Ok(()) => success_count += 1,
            Err(e) => {
                error_count += 1;
                errors.push(format!("File {name}: {e}"));
            }
        }
    }

    // The details field rides inside a single-line report the manager parses
    // line-by-line, so per-file errors are joined rather than
    // newline-separated the way a naive error buffer would do it.
    let joined_errors = errors.join("; ");

    if error_count == 0 {
        print_report(source, target, operation, "SUCCESS", &format!("{success_count} files copied"));
    } else if success_count > 0 {
        print_report(
            source,
            target,
            operation,
            "PARTIAL",
            &format!("{success_count} files copied, {error_count} skipped: {joined_errors}"),
        );
    } else {
        print_report(
            source,
            target,
            operation,
            "ERROR",
            &format!("0 files copied, {error_count} skipped: {joined_errors}"),
        );
    }
    Ok(())
}

fn run_single_file(source: &str, target: &str, filename: &str, operation: &str) -> anyhow::Result<()> {
    let src_path = Path::new(source).join(filename);
    let dest_path = Path::new(target).join(filename);

    match operation {
        "ADDED" | "MODIFIED" => match sync_file(&src_path, &dest_path) {
            Ok(()) => print_report(source, target, operation, "SUCCESS", &format!("File: {filename}")),
            Err(e) => print_report(source, target, operation, "ERROR", &format!("File {filename}: {e}")),
        },
        "DELETED" => match fs::remove_file(&dest_path) {
            Ok(()) => print_report(source, target, operation, "SUCCESS", &format!("File: {filename}")),
            Err(e) => print_report(source, target, operation, "ERROR", &format!("File {filename}: {e}")),
        },
        other => anyhow::bail!("unrecognized operation: {other}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.operation == "FULL" {
        run_full(&args.source, &args.target, &args.operation)
    } else {
        run_single_file(&args.source, &args.target, &args.filename, &args.operation)
    }
}
