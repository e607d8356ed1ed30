use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

pub async fn handle(termo: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let rows: Value = ApiClient::authenticated()?
        .get_query("/api/buscar", &[("termo", termo)])
        .await?;
    output_data(&output_format, &rows, &["tipo", "nome", "match_rank", "id"])
}
