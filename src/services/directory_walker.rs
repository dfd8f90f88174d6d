use std::{collections::HashSet, sync::Arc};

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    domain::{company::CompanyRecord, listing::ListingSelectors},
    error::ScrapeError,
};

use super::PageFetcher;

pub struct DirectoryWalker {
    fetcher: Arc<dyn PageFetcher>,
    selectors: ListingSelectors,
    max_pages: usize,
}

impl DirectoryWalker {
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_pages: usize) -> Self {
        DirectoryWalker {
            fetcher,
            selectors: ListingSelectors::default(),
            max_pages,
        }
    }

    /// Follows "next page" links from `start` and returns every listing in
    /// order of first appearance. Any fetch or extraction failure aborts.
    /// Cancelling stops before the next page and keeps what was gathered.
    pub async fn walk(
        &self,
        start: &Url,
        cancel: &CancellationToken,
    ) -> Result<Vec<CompanyRecord>, ScrapeError> {
        let mut companies = vec![];
        let mut visited = HashSet::new();
        let mut current = Some(start.clone());

        while let Some(page_url) = current.take() {
            if visited.len() >= self.max_pages {
                log::warn!(
                    "Reached the limit of {} pages, not following {}",
                    self.max_pages,
                    page_url
                );
                break;
            }
            if !visited.insert(page_url.clone()) {
                log::warn!("Next page link loops back to {}, stopping", page_url);
                break;
            }

            let html = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::warn!("Walk cancelled before fetching {}", page_url);
                    break;
                }
                html = self.fetcher.fetch(&page_url) => html?,
            };
            let page = self.selectors.parse_page(&page_url, &html)?;

            log::info!(
                "Page {} ({}): {} listings, next page? {}",
                visited.len(),
                page_url,
                page.companies.len(),
                page.next_page.is_some()
            );

            companies.extend(page.companies);
            current = page.next_page;
        }

        log::info!(
            "Walk finished with {} listings over {} pages",
            companies.len(),
            visited.len()
        );

        Ok(companies)
    }
}
