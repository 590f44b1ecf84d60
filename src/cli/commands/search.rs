use crate::domain::FilterType;
use crate::services::{PlanningService, SearchRequest};
use crate::state::SharedState;

pub async fn cmd_search(
    state: &SharedState,
    filter_type: FilterType,
    value: &str,
    limit: Option<u32>,
    webhook: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let limit = limit.unwrap_or(state.config.registry.default_limit);
    let mut request = SearchRequest::new(filter_type, value, limit);
    if let Some(url) = webhook.or_else(|| state.config.webhook.default_url.clone()) {
        request = request.with_webhook(url);
    }

    if !json {
        println!("Searching planning applications for {filter_type}: {value}");
    }

    let result = state.planning.search(request).await?;
    state.planning.flush().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for warning in &result.warnings {
        println!("⚠ {warning}");
    }

    let source = if result.cached { " (cached)" } else { "" };
    println!(
        "{} applications found{}, {} new since last search",
        result.total_results,
        source,
        result.new_entities.len()
    );

    if result.new_entities.is_empty() {
        return Ok(());
    }

    println!();
    println!("New Applications:");
    println!("{:-<60}", "");

    for entity in &result.new_entities {
        println!("• {} - {}", entity.name, entity.site_address);
        if !entity.description.is_empty() {
            println!("  {}", entity.description);
        }
        let decided = entity.end_date.as_deref().unwrap_or("open");
        println!(
            "  {} | Received: {} | Decided: {}",
            entity.local_authority, entity.start_date, decided
        );
        if !entity.url.is_empty() {
            println!("  {}", entity.url);
        }
        println!();
    }

    Ok(())
}
