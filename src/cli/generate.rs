use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::{style, user_attended};
use dialoguer::{Confirm, Input, Select};
use serde_json::Value;

use crate::cli::run_cli;
use crate::generator::Generator;
use crate::model::provider::{ApiProvider, DirProvider};
use crate::writer::{DirWriter, Writer};

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(
        long,
        short = 's',
        help = "Comma-separated services to generate, each as name or name:version. Will prompt if not provided"
    )]
    pub services: Option<String>,
    #[arg(
        long,
        short = 'n',
        help = "Root namespace for the generated classes. Will prompt if not provided"
    )]
    pub namespace: Option<String>,
    #[arg(
        long,
        short = 'o',
        value_name = "DIR",
        help = "Directory the classes are written into. Will prompt if not provided"
    )]
    pub output_dir: Option<PathBuf>,
    #[arg(
        long,
        short = 'p',
        help = "PSR-4 namespace prefix the output directory is mapped to. Defaults from composer.json"
    )]
    pub psr4_prefix: Option<String>,
    #[arg(
        long,
        short = 'd',
        value_name = "DIR",
        help = "Directory holding the API descriptions"
    )]
    pub data_dir: PathBuf,
    #[arg(long, help = "Create the output directory if it does not exist")]
    pub create: bool,
}

pub fn run(args: GenerateArgs) -> i32 {
    run_cli(|| run_inner(args))
}

fn run_inner(mut args: GenerateArgs) -> Result<(), String> {
    let provider = DirProvider::new(&args.data_dir)
        .map_err(|err| format!("Failed to open data directory: {err}"))?;

    let defaults = composer_defaults();

    let specs = match args.services.take() {
        Some(list) => parse_service_specs(&list),
        None => prompt_services(&provider)?,
    };
    if specs.is_empty() {
        return Err("No services selected".to_string());
    }

    let namespace = match args.namespace.take() {
        Some(namespace) => namespace,
        None => prompt_with_default(
            "Root namespace for the generated classes",
            defaults
                .as_ref()
                .map_or("App\\AwsGen", |defaults| defaults.namespace.as_str()),
        )?,
    };

    let output_dir = match args.output_dir.take() {
        Some(dir) => dir,
        None => PathBuf::from(prompt_with_default(
            "Output directory",
            defaults
                .as_ref()
                .map_or("src", |defaults| defaults.output_dir.as_str()),
        )?),
    };

    let psr4_prefix = args
        .psr4_prefix
        .take()
        .or_else(|| defaults.map(|defaults| defaults.psr4_prefix));

    let mut generator = Generator::new(&namespace, Box::new(provider));
    for (name, version) in &specs {
        generator
            .add_service(name, version)
            .map_err(|err| format!("Failed to add service '{name}': {err}"))?;
        println!("Added {name}:{version}");
    }

    let files = generator
        .run()
        .map_err(|err| format!("Failed to generate classes: {err}"))?;

    let mut writer = DirWriter::new(&output_dir, args.create)
        .map_err(|err| format!("Failed to open output directory: {err}"))?;
    if let Some(prefix) = psr4_prefix.as_deref() {
        writer = writer.psr4_prefix(prefix);
    }
    let written = writer
        .write(&files)
        .map_err(|err| format!("Failed to write classes: {err}"))?;

    println!(
        "{}",
        style(format!(
            "✅ Wrote {written} files to {}",
            writer.resolved_dir().display()
        ))
        .green()
    );
    Ok(())
}

/// `"s3, dynamodb:2012-08-10"` -> `[("s3", "latest"), ("dynamodb", "2012-08-10")]`.
fn parse_service_specs(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|spec| !spec.is_empty())
        .map(|spec| match spec.split_once(':') {
            Some((name, version)) => (name.to_string(), version.to_string()),
            None => (spec.to_string(), "latest".to_string()),
        })
        .collect()
}

fn prompt_services(provider: &DirProvider) -> Result<Vec<(String, String)>, String> {
    if !user_attended() {
        return Err("No services given. Pass --services name[:version],...".to_string());
    }
    let listing = provider
        .services()
        .map_err(|err| format!("Failed to list services: {err}"))?;
    if listing.is_empty() {
        return Err("No services found in the data directory".to_string());
    }
    let items: Vec<String> = listing
        .iter()
        .map(|service| match &service.namespace {
            Some(namespace) => format!("{} ({namespace})", service.name),
            None => service.name.clone(),
        })
        .collect();
    let mut specs = Vec::new();
    loop {
        let selection = Select::new()
            .with_prompt("Which service would you like to generate?")
            .items(&items)
            .default(0)
            .interact()
            .map_err(|err| format!("Failed to select service: {err}"))?;
        specs.push((listing[selection].name.clone(), "latest".to_string()));
        let more = Confirm::new()
            .with_prompt("Add another service?")
            .default(false)
            .interact()
            .map_err(|err| format!("Failed to read choice: {err}"))?;
        if !more {
            break;
        }
    }
    Ok(specs)
}

fn prompt_with_default(prompt: &str, default: &str) -> Result<String, String> {
    if !user_attended() {
        return Ok(default.to_string());
    }
    Input::<String>::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()
        .map_err(|err| format!("Failed to read input: {err}"))
}

struct ComposerDefaults {
    namespace: String,
    output_dir: String,
    psr4_prefix: String,
}

fn composer_defaults() -> Option<ComposerDefaults> {
    composer_defaults_in(Path::new("."))
}

/// Derive prompt defaults from the first PSR-4 autoload entry of a
/// `composer.json`, e.g. `{"App\\": "src/"}` maps the generated classes to
/// `App\AwsGen` under `src/`.
fn composer_defaults_in(dir: &Path) -> Option<ComposerDefaults> {
    let contents = fs::read_to_string(dir.join("composer.json")).ok()?;
    let composer: Value = serde_json::from_str(&contents).ok()?;
    let autoload = composer.get("autoload")?.get("psr-4")?.as_object()?;
    let (prefix, target) = autoload.iter().next()?;
    let target = target.as_str()?;
    Some(ComposerDefaults {
        namespace: format!("{prefix}AwsGen"),
        output_dir: target.to_string(),
        psr4_prefix: prefix.clone(),
    })
}
