use std::time::Duration;

use anyhow::bail;
use url::Url;

use pagepull::{
    ExtractionOutcome, Extractor, ExtractorConfig, GraphqlProductSource, GraphqlSourceConfig,
    JsonFileCheckpoint, TokenAdvance,
};

const ENDPOINT: &str = "https://mercado.carrefour.com.br/api/graphql";
const REGION_ID: &str = "v2.16805FBD22EC494F5D2BD799FE9F1FB7";
const OUTPUT_FILE: &str = "output.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let source_config = GraphqlSourceConfig::new(Url::parse(ENDPOINT)?, REGION_ID)
        .with_page_size(100)
        .with_category("bebidas", "4599");
    let source = GraphqlProductSource::new(source_config)?;

    let sink = JsonFileCheckpoint::new(OUTPUT_FILE)?;

    let config = ExtractorConfig::default()
        .with_page_size(100)
        .with_inter_request_delay(Duration::from_secs(1))
        .with_max_consecutive_failures(5)
        .with_checkpoint_every(500)
        .with_token_advance(TokenAdvance::Cursor)
        .with_initial_token("0");
    let extractor = Extractor::new(config)?;

    let outcome = extractor.extract_all(&source, &sink).await;
    extractor.stats().print_summary();

    match outcome {
        ExtractionOutcome::Complete(records) => {
            println!("\n{} products saved to {}", records.len(), OUTPUT_FILE);
            Ok(())
        }
        ExtractionOutcome::Aborted {
            records,
            reason,
            consecutive_failures,
        } => {
            bail!(
                "aborted after {consecutive_failures} consecutive failures \
                 ({} partial records saved to {OUTPUT_FILE}): {reason}",
                records.len()
            );
        }
    }
}
