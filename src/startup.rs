use std::sync::Arc;

use anyhow::{bail, Context};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    configuration::Settings,
    services::{
        BusinessLookupEnricher, DescriptionEnricher, DirectoryWalker, GooglePlacesClient,
        HttpPageFetcher, OpenaiClient, Pipeline, PipelineSummary,
    },
};

/// Wires the clients and the pipeline from configuration. Credentials are
/// handed to each client here and nowhere else.
pub fn build_pipeline(configuration: &Settings) -> anyhow::Result<Pipeline> {
    let directory = &configuration.directory;
    let fetcher = HttpPageFetcher::new(&directory.user_agent, directory.request_timeout())
        .context("Failed to build the page fetcher")?;

    let description = &configuration.description;
    let openai_client = OpenaiClient::new(
        configuration.api_keys.openai.clone(),
        description.model.clone(),
        description.temperature,
        description.request_timeout(),
    )
    .context("Failed to build the OpenAI client")?;

    let lookup = &configuration.business_lookup;
    let business_lookup = match lookup.enabled {
        true => {
            if configuration.api_keys.google_maps.is_empty() {
                bail!("Business lookup is enabled but no Google Maps API key is configured");
            }
            let places = GooglePlacesClient::new(
                configuration.api_keys.google_maps.clone(),
                directory.request_timeout(),
            )
            .context("Failed to build the places client")?;

            Some(BusinessLookupEnricher::new(
                Arc::new(places),
                lookup.radius_m,
                lookup.place_type.clone(),
                lookup.concurrency,
            ))
        }
        false => None,
    };

    Ok(Pipeline {
        walker: DirectoryWalker::new(Arc::new(fetcher), directory.page_limit()),
        business_lookup,
        descriptions: DescriptionEnricher::new(
            Arc::new(openai_client),
            description.max_tokens,
            description.retry_policy(),
            description.concurrency,
        ),
        snapshot_path: configuration.export.snapshot_path.clone(),
        enriched_path: configuration.export.enriched_path.clone(),
    })
}

pub async fn run(
    configuration: Settings,
    cancel: CancellationToken,
) -> anyhow::Result<PipelineSummary> {
    let start = Url::parse(&configuration.directory.start_url).with_context(|| {
        format!(
            "Invalid directory start url: {}",
            configuration.directory.start_url
        )
    })?;

    if configuration.api_keys.openai.is_empty() {
        log::warn!("No OpenAI API key configured, descriptions will fail");
    }

    let pipeline = build_pipeline(&configuration)?;
    log::info!(
        "Crawling {} (business lookup {})",
        start,
        match pipeline.business_lookup.is_some() {
            true => "on",
            false => "off",
        }
    );

    pipeline.run(&start, &cancel).await
}
