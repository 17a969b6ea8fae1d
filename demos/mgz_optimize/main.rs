//! Optimize MGH/MGZ volumes in place or into an output directory.
//!
//! ```text
//! mgz_optimize [-o DIR] [--label | --imaging | --ignore-intent]
//!              [--tolerance EPS] [--no-narrow] [--reference FILE] PATH...
//! ```
//!
//! Directories are searched recursively for `*.mgz` files. With `-o`, each
//! output keeps its path relative to the common ancestor of the inputs.
//! Set `RUST_LOG` to see each decision.

use mgz_optimize::intent::describe;
use mgz_optimize::{run_batch, IntentPolicy, LabelReference, OptimizeOptions};
use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: mgz_optimize [-o DIR] [--label | --imaging | --ignore-intent] \
                     [--tolerance EPS] [--no-narrow] [--reference FILE] PATH...";

fn collect_inputs(path: &Path, out: &mut Vec<PathBuf>) -> Result<(), Box<dyn Error>> {
    if path.is_dir() {
        let pattern = path.join("**").join("*.mgz");
        for entry in glob::glob(&pattern.to_string_lossy())? {
            out.push(entry?);
        }
    } else {
        out.push(path.to_owned());
    }
    Ok(())
}

/// Deepest directory containing every input.
fn common_root(inputs: &[PathBuf]) -> PathBuf {
    let mut parents = inputs.iter().map(|p| p.parent().unwrap_or_else(|| Path::new("")));
    let mut root = parents.next().map(Path::to_path_buf).unwrap_or_default();
    for parent in parents {
        while !parent.starts_with(&root) {
            if !root.pop() {
                break;
            }
        }
    }
    root
}

fn run() -> Result<bool, Box<dyn Error>> {
    let mut options = OptimizeOptions::new();
    let mut reference = LabelReference::freesurfer();
    let mut policy = None;
    let mut output_dir = None;
    let mut inputs = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{} needs a value", arg));
        match arg.as_str() {
            "-o" | "--output" => output_dir = Some(PathBuf::from(value()?)),
            "--label" => policy = Some(IntentPolicy::Label),
            "--imaging" => policy = Some(IntentPolicy::Imaging),
            "--ignore-intent" => policy = Some(IntentPolicy::Ignore),
            "--tolerance" => options = options.tolerance(value()?.parse()?),
            "--no-narrow" => options = options.narrowing(false),
            "--reference" => reference = LabelReference::from_file(value()?)?,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(true);
            }
            _ if arg.starts_with('-') => return Err(format!("unknown option {}\n{}", arg, USAGE).into()),
            _ => collect_inputs(Path::new(&arg), &mut inputs)?,
        }
    }
    if inputs.is_empty() {
        return Err(USAGE.into());
    }
    if let Some(policy) = policy {
        options = options.intent_policy(policy);
    }
    if let Some(dir) = output_dir {
        fs::create_dir_all(&dir)?;
        options = options.mirror_into(common_root(&inputs), dir);
    }

    let report = run_batch(&inputs, &options, &reference);
    for result in &report.results {
        match result {
            Ok(o) => println!(
                "{}: {:?} -> {:?}, intent {}, {} bytes",
                o.output.display(),
                o.original_type,
                o.new_type,
                describe(o.decisions.intent.after),
                o.bytes_written
            ),
            Err(failure) => eprintln!("{}", failure),
        }
    }
    Ok(report.is_success())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    }
}
