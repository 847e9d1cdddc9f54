use clap::{Parser, Subcommand};
use fhir::{FhirError, Resource, ResourceRegistry};
use pathology_core::BundleService;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pathology")]
#[command(about = "Pathology test result bundle CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the service responds
    Status,
    /// Validate the structure of a FHIR resource file
    Validate {
        /// Path to a JSON file holding any registered resource
        file: PathBuf,
    },
    /// Submit a test result bundle file as the REST API would
    Submit {
        /// Path to a JSON file holding a Bundle
        file: PathBuf,
    },
}

/// What a command prints, and whether it succeeded.
#[derive(Debug, PartialEq, Eq)]
struct Outcome {
    success: bool,
    output: String,
}

impl Outcome {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let service = BundleService::new(Arc::new(ResourceRegistry::r4()?));

    let outcome = match cli.command {
        Some(Commands::Status) => {
            let response = service.status();
            Outcome::ok(format!("{} {}", response.status, response.body))
        }
        Some(Commands::Validate { file }) => validate_file(&file, service.registry())?,
        Some(Commands::Submit { file }) => submit_file(&file, &service)?,
        None => Outcome::ok("Use 'pathology --help' for commands"),
    };

    if outcome.success {
        println!("{}", outcome.output);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", outcome.output);
        Ok(ExitCode::FAILURE)
    }
}

/// Parse `file` as any registered resource, listing every structural issue on failure.
fn validate_file(file: &Path, registry: &ResourceRegistry) -> anyhow::Result<Outcome> {
    let text = read(file)?;

    let outcome = match Resource::from_json(&text, registry) {
        Ok(resource) => Outcome::ok(format!(
            "{}: valid {} resource",
            file.display(),
            resource.resource_type()
        )),
        Err(FhirError::Validation(errors)) => {
            let mut lines = vec![format!(
                "{}: {} validation issue(s)",
                file.display(),
                errors.len()
            )];
            lines.extend(
                errors
                    .issues()
                    .iter()
                    .map(|issue| format!("  {}: {}", issue.path, issue.message)),
            );
            Outcome::failed(lines.join("\n"))
        }
        Err(err) => Outcome::failed(format!("{}: {}", file.display(), err)),
    };

    Ok(outcome)
}

/// Run `file` through the bundle submission endpoint logic.
fn submit_file(file: &Path, service: &BundleService) -> anyhow::Result<Outcome> {
    let text = read(file)?;
    let response = service.post_bundle(Some(&text));
    let output = format!("{}\n{}", response.status, response.body);

    if response.status == 200 {
        Ok(Outcome::ok(output))
    } else {
        Ok(Outcome::failed(output))
    }
}

fn read(file: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file)
        .map_err(|err| anyhow::anyhow!("Error reading {}: {}", file.display(), err))
}
