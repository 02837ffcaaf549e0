#![forbid(unsafe_code)]

use std::path::PathBuf;

use mc_command::builtin_registry;
use mc_runner::validate_all;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut csv_dir = PathBuf::from("./master_data");
    let mut rules_dir = PathBuf::from("./validator");

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--csv-dir" => {
                let value = args.next().ok_or("--csv-dir requires a directory path")?;
                csv_dir = PathBuf::from(value);
            }
            "--rules-dir" => {
                let value = args.next().ok_or("--rules-dir requires a directory path")?;
                rules_dir = PathBuf::from(value);
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(format!("unknown argument: {other}").into());
            }
        }
    }

    let registry = builtin_registry();
    let results = validate_all(&csv_dir, &rules_dir, &registry)?;

    let mut failed = 0_usize;
    for result in &results {
        if result.is_err() {
            println!("{}", result.message());
            failed += 1;
        }
    }
    println!("checked {} rule(s), {} failed", results.len(), failed);

    if failed > 0 {
        return Err(format!("{failed} validation(s) failed").into());
    }
    Ok(())
}

fn print_help() {
    println!(
        "mastercheck-cli\n\
         Usage:\n\
         \tmastercheck-cli [--csv-dir ./master_data] [--rules-dir ./validator]\n\
         Options:\n\
         \t--csv-dir <dir>      Directory scanned recursively for *.csv master files\n\
         \t--rules-dir <dir>    Directory holding one <master>.txt rule file per master\n\
         \t-h, --help           Show this help"
    );
}
