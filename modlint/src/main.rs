//! Adventure module consistency checker.
//!
//! Points at a module directory, runs the full rule set, and prints a
//! report. The exit status reflects the worst severity found:
//!
//! ```bash
//! modlint modules/Greenfields_Vale
//! modlint modules/Greenfields_Vale --json
//! modlint modules/Greenfields_Vale --disable rare-trigger --disable missing-item
//! ```

use modlint_core::{default_rules, Validator};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    if args.iter().any(|a| a == "--list-rules") {
        for rule in default_rules() {
            println!("{:<24} {}", rule.id(), rule.description());
        }
        return;
    }

    let mut module_path: Option<String> = None;
    let mut json_output = false;
    let mut disabled: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => json_output = true,
            "--disable" => {
                if let Some(id) = args.get(i + 1) {
                    disabled.push(id.clone());
                    i += 1;
                } else {
                    eprintln!("Error: --disable requires a rule ID (see --list-rules)");
                    std::process::exit(64);
                }
            }
            other if other.starts_with("--") => {
                eprintln!("Error: unknown flag {other}");
                eprintln!("Run with --help for usage.");
                std::process::exit(64);
            }
            other => {
                if module_path.replace(other.to_string()).is_some() {
                    eprintln!("Error: more than one module path given");
                    std::process::exit(64);
                }
            }
        }
        i += 1;
    }

    let Some(path) = module_path else {
        eprintln!("Error: no module path given");
        eprintln!("Run with --help for usage.");
        std::process::exit(64);
    };

    let known_ids: Vec<&str> = default_rules().iter().map(|r| r.id()).collect();
    for id in &disabled {
        if !known_ids.contains(&id.as_str()) {
            eprintln!("Error: unknown rule ID {id:?} (see --list-rules)");
            std::process::exit(64);
        }
    }

    let mut validator = Validator::new(&path);
    for id in disabled {
        validator = validator.disable_rule(id);
    }

    let report = match validator.run().await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(66);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {e}");
                std::process::exit(70);
            }
        }
    } else {
        print!("{}", report.render());
    }

    std::process::exit(report.exit_code());
}

fn print_help() {
    println!("modlint - adventure module consistency checker");
    println!();
    println!("USAGE:");
    println!("    modlint <module-path> [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --json              Emit the report as JSON instead of text");
    println!("    --disable <rule>    Skip a rule by ID (repeatable)");
    println!("    --list-rules        List every rule ID with a description");
    println!("    -h, --help          Show this help");
    println!();
    println!("EXIT STATUS:");
    println!("    0  no findings");
    println!("    1  worst finding is polish");
    println!("    2  worst finding is important");
    println!("    3  worst finding is critical, or files failed to load");
    println!("    64 usage error; 66 module directory not found");
}
