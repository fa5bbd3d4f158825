//! Config Linter: reports dangling references and malformed conditions.
//!
//! Usage: config_linter <config.json|config.ron> [<overlay>...]

use life_restart::core::lint::{lint_config, Severity};
use life_restart::GameConfig;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: config_linter <config.json|config.ron> [<overlay>...]");
        process::exit(0);
    }

    let mut config = GameConfig::default();
    for (i, arg) in args[1..].iter().enumerate() {
        let path = Path::new(arg);
        match GameConfig::load_from_file(path) {
            Ok(loaded) if i == 0 => config = loaded,
            Ok(loaded) => config.merge(loaded),
            Err(e) => {
                eprintln!("ERROR: Failed to load {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        println!("  Loaded: {}", path.display());
    }

    println!(
        "Loaded {} talents, {} events, {} ages, {} achievements",
        config.talents.len(),
        config.events.len(),
        config.ages.len(),
        config.achievements.len()
    );

    let issues = lint_config(&config);

    println!("\n=== Config Lint Report ===\n");

    if issues.is_empty() {
        println!("All checks passed!");
    }

    for issue in &issues {
        println!("{}", issue);
    }

    let errors = issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .count();
    println!(
        "\nSummary: {} errors, {} warnings",
        errors,
        issues.len() - errors
    );

    if errors == 0 {
        process::exit(0);
    } else {
        process::exit(1);
    }
}
