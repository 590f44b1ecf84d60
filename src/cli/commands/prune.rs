use crate::services::prune_history;
use crate::state::SharedState;

pub async fn cmd_prune(state: &SharedState, keep: Option<u32>) -> anyhow::Result<()> {
    let Some(keep) = keep.or(state.config.cache.retention.max_records_per_key) else {
        println!("No retention configured; search history is kept in full.");
        println!("Pass --keep <n> or set cache.retention.max_records_per_key.");
        return Ok(());
    };

    let summary = prune_history(&state.store, keep).await?;

    println!(
        "✓ Removed {} snapshots across {} filter keys (kept newest {} each)",
        summary.removed, summary.keys, keep
    );

    Ok(())
}
