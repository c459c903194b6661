//! `quay releases` command implementation.
//!
//! Looks a package up across the configured registries and prints its
//! releases, either as a table or as JSON.

use std::time::Instant;

use quay_core::error::{QuayError, QuayResult};
use quay_core::types::ReleaseResult;
use quay_registry::GetReleasesConfig;

use super::CommandContext;
use crate::output::colors::ColorSupport;

/// Execute the `quay releases` command
pub async fn execute(package: String, json: bool, ctx: &CommandContext) -> QuayResult<()> {
    let start_time = Instant::now();
    let datasource = ctx.datasource()?;

    let config = GetReleasesConfig {
        package_name: package.clone(),
        registry_urls: ctx.config.registry_urls.clone(),
    };
    let result = datasource.get_releases(&config).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&result).map_err(|e| QuayError::JsonParse {
            url: package.clone(),
            message: e.to_string(),
        })?;
        println!("{}", rendered);
        return Ok(());
    }

    match result {
        Some(result) => {
            print!("{}", format_releases(&result, ctx.output.colors()));
            ctx.output.info(&format!(
                "{} releases in {:.2}s",
                result.releases.len(),
                start_time.elapsed().as_secs_f64()
            ));
        },
        None => ctx.output.warn(&format!("No releases found for {}", package)),
    }

    Ok(())
}

/// Human readable release listing
pub fn format_releases(result: &ReleaseResult, colors: &ColorSupport) -> String {
    let mut output = String::new();

    output.push_str(&colors.green(&result.name));
    output.push('\n');
    if let Some(homepage) = &result.homepage {
        output.push_str(&format!("  {} {}\n", colors.dim("homepage:"), homepage));
    }
    if let Some(source_url) = &result.source_url {
        output.push_str(&format!("  {} {}\n", colors.dim("source:"), source_url));
    }

    let width = result
        .releases
        .iter()
        .map(|release| release.version.len())
        .max()
        .unwrap_or(0);

    for release in &result.releases {
        output.push_str(&format!("  {:<width$}", release.version, width = width));
        if release.git_ref != release.version {
            output.push_str(&format!("  {}", colors.dim(&format!("({})", release.git_ref))));
        }
        if let Some(timestamp) = &release.release_timestamp {
            output.push_str(&format!("  {}", timestamp));
        }
        output.push('\n');
    }

    output
}
