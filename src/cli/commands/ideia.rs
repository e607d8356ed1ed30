use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

pub async fn handle(ideia: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let proposta = ApiClient::authenticated()?.post("/api/ideia", &json!({ "ideia": ideia })).await?;
    output_data(&output_format, &proposta, &[])
}
