use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    domain::company::{CompanyRecord, Enriched},
    error::EnrichmentError,
};

use super::{enrich_concurrently, TextGenerator};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// `attempt` is 1-based.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Clone)]
pub struct DescriptionEnricher {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
    retry: RetryPolicy,
    concurrency: usize,
}

impl DescriptionEnricher {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        max_tokens: u32,
        retry: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        DescriptionEnricher {
            generator,
            max_tokens,
            retry,
            concurrency,
        }
    }

    /// Retries service errors with exponential backoff until the attempts run
    /// out. `cancel` aborts both the pending call and the backoff.
    pub async fn describe(
        &self,
        company: &CompanyRecord,
        cancel: &CancellationToken,
    ) -> Result<String, EnrichmentError> {
        let prompt = build_description_prompt(company);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(EnrichmentError::Cancelled);
            }
            attempt += 1;

            let completion = tokio::select! {
                _ = cancel.cancelled() => return Err(EnrichmentError::Cancelled),
                completion = self.generator.complete(&prompt, self.max_tokens) => completion,
            };
            let err = match completion {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };

            if attempt >= self.retry.max_attempts {
                return Err(EnrichmentError::Timeout {
                    attempts: attempt,
                    last_error: err,
                });
            }

            let backoff = self.retry.delay_for(attempt);
            log::warn!(
                "Description for {} failed (attempt {}/{}): {}. Backing off {:.1}s",
                company.name,
                attempt,
                self.retry.max_attempts,
                err,
                backoff.as_secs_f64()
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(EnrichmentError::Cancelled),
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }

    /// Cancelled records stay `NotAttempted`.
    pub async fn enrich_all(
        &self,
        companies: Vec<CompanyRecord>,
        cancel: &CancellationToken,
    ) -> Vec<CompanyRecord> {
        log::info!("Generating descriptions for {} companies", companies.len());

        let enricher = self.clone();
        let token = cancel.clone();
        enrich_concurrently(companies, self.concurrency, cancel, move |mut company| {
            let enricher = enricher.clone();
            let token = token.clone();
            async move {
                match enricher.describe(&company, &token).await {
                    Ok(description) => {
                        company.description = Enriched::from_service(Some(description));
                        if !company.description.is_present() {
                            log::warn!("Blank description for {}", company.name);
                        }
                    }
                    Err(EnrichmentError::Cancelled) => {}
                    Err(e) => {
                        log::error!("No description for {}: {}", company.name, e);
                        company.description = Enriched::Unknown;
                    }
                }
                company
            }
        })
        .await
    }
}

pub fn build_description_prompt(company: &CompanyRecord) -> String {
    format!(
        "Generate a short description for {} located at {}, {}, {}, {}.",
        company.name, company.address_line1, company.address_line2, company.city, company.state
    )
}
