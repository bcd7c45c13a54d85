//! Search command handlers.

use crate::cli::AppContext;
use crate::error::Result;
use crate::search::SearchRequest;

/// Handles `staybook search hotels|restaurants`.
///
/// Results are printed as pretty JSON.
pub async fn handle_search(ctx: &AppContext, request: &SearchRequest) -> Result<()> {
    let query = request.query()?;
    tracing::debug!(endpoint = request.endpoint(), ?query, "Searching");

    let results: serde_json::Value = ctx.client.get_json(request.endpoint(), &query).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}
