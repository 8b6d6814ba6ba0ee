use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Loads equations for batch balancing from a plain text file: one equation
/// per line, blank lines and lines starting with '#' are skipped.
pub fn load_equations_from_file(file_name: &str) -> Result<Vec<String>, String> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(format!("File '{}' does not exist", file_name));
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Err(format!("Failed to open file '{}': {}", file_name, e)),
    };

    let reader = BufReader::new(file);
    let mut equations = Vec::new();
    for line in reader.lines().filter_map(Result::ok) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        equations.push(trimmed.to_string());
    }

    if equations.is_empty() {
        warn!("File '{}' contains no equations", file_name);
    } else {
        info!("Loaded {} equations from '{}'", equations.len(), file_name);
    }
    Ok(equations)
}
