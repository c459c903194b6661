//! `quay cache` command implementation.

use quay_cache::FileStore;
use quay_core::error::QuayResult;

use super::CommandContext;

/// Execute `quay cache clean`
pub async fn clean(all: bool, ctx: &CommandContext) -> QuayResult<()> {
    let cache_dir = ctx.cache_dir();
    if !cache_dir.exists() {
        ctx.output.info(&format!("No cache at {}", cache_dir));
        return Ok(());
    }

    let store = FileStore::new(&cache_dir)?;
    let result = if all { store.clear()? } else { store.clean()? };

    ctx.output.success(&format!(
        "Removed {} cache records ({} freed)",
        result.entries_removed,
        result.format_freed_space()
    ));
    Ok(())
}
