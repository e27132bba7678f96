use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rdmshark_core::{DecoderConfig, Report, analyze_jsonl_file};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let input = path.join("input.jsonl");
        if !input.exists() {
            continue;
        }
        let output = path.join("expected_report.json");
        regenerate_one(&input, &output)?;
    }

    Ok(())
}

/// Keep the decoder settings recorded in an existing expected report.
fn existing_config(output: &Path) -> DecoderConfig {
    fs::read_to_string(output)
        .ok()
        .and_then(|json| serde_json::from_str::<Report>(&json).ok())
        .map(|report| report.config)
        .unwrap_or_default()
}

fn regenerate_one(input: &Path, output: &Path) -> Result<(), String> {
    let config = existing_config(output);
    let report = analyze_jsonl_file(input, config)
        .map_err(|err| format!("analysis failed for {}: {}", input.display(), err))?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
