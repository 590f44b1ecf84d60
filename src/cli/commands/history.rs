use crate::db::SearchRecordStore;
use crate::domain::FilterType;
use crate::state::SharedState;

pub async fn cmd_history(
    state: &SharedState,
    filter_type: FilterType,
    value: &str,
    limit: u64,
) -> anyhow::Result<()> {
    let key = filter_type.normalize(value)?;
    let records = state.store.history(&key, limit).await?;

    if records.is_empty() {
        println!("No searches stored for '{key}'.");
        return Ok(());
    }

    println!("Search history for '{key}' (last {}):", records.len());
    println!("{:-<60}", "");

    for record in records {
        println!(
            "• #{} {} - {} results",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            record.results.len()
        );
    }

    Ok(())
}
