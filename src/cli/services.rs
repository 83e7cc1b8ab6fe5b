use std::path::PathBuf;

use clap::Args;

use crate::cli::run_cli;
use crate::model::provider::{ApiProvider, DirProvider, ServiceListing};

#[derive(Args, Debug, Clone)]
pub struct ServicesArgs {
    #[arg(
        value_name = "SEARCH",
        help = "Only list services whose name or namespace contains this string"
    )]
    pub search: Option<String>,
    #[arg(
        long,
        short = 'd',
        value_name = "DIR",
        help = "Directory holding the API descriptions"
    )]
    pub data_dir: PathBuf,
}

pub fn run(args: ServicesArgs) -> i32 {
    run_cli(|| run_inner(args))
}

fn run_inner(args: ServicesArgs) -> Result<(), String> {
    let provider = DirProvider::new(&args.data_dir)
        .map_err(|err| format!("Failed to open data directory: {err}"))?;
    let mut listing = provider
        .services()
        .map_err(|err| format!("Failed to list services: {err}"))?;
    if let Some(search) = args.search.as_deref() {
        listing.retain(|service| matches_search(service, search));
    }
    if listing.is_empty() {
        println!("No services found");
        return Ok(());
    }

    let name_width = listing
        .iter()
        .map(|service| service.name.len())
        .max()
        .unwrap_or(0);
    let namespace_width = listing
        .iter()
        .map(|service| service.namespace.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(0);
    for service in &listing {
        let namespace = service.namespace.as_deref().unwrap_or("-");
        println!(
            "{:<name_width$}  {:<namespace_width$}  {}",
            service.name,
            namespace,
            service.versions.join(", ")
        );
    }
    Ok(())
}

fn matches_search(service: &ServiceListing, search: &str) -> bool {
    let search = search.to_lowercase();
    if service.name.to_lowercase().contains(&search) {
        return true;
    }
    service
        .namespace
        .as_deref()
        .is_some_and(|namespace| namespace.to_lowercase().contains(&search))
}
