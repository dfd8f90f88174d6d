use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    dal::company_csv::{export_companies, ExportKind},
    domain::company::{CompanyRecord, LookupStatus},
};

use super::{BusinessLookupEnricher, DescriptionEnricher, DirectoryWalker};

pub struct Pipeline {
    pub walker: DirectoryWalker,
    pub business_lookup: Option<BusinessLookupEnricher>,
    pub descriptions: DescriptionEnricher,
    pub snapshot_path: PathBuf,
    pub enriched_path: PathBuf,
}

#[derive(Debug, Default, PartialEq)]
pub struct PipelineSummary {
    pub companies: usize,
    pub matched: usize,
    pub no_match: usize,
    pub lookup_failed: usize,
    pub described: usize,
}

impl PipelineSummary {
    fn from_companies(companies: &[CompanyRecord]) -> Self {
        let mut summary = PipelineSummary {
            companies: companies.len(),
            ..Default::default()
        };
        for company in companies {
            match company.lookup {
                LookupStatus::Matched => summary.matched += 1,
                LookupStatus::NoMatch => summary.no_match += 1,
                LookupStatus::Failed(_) => summary.lookup_failed += 1,
                LookupStatus::NotAttempted => {}
            }
            if company.description.is_present() {
                summary.described += 1;
            }
        }
        summary
    }
}

impl Pipeline {
    pub async fn run(
        &self,
        start: &Url,
        cancel: &CancellationToken,
    ) -> anyhow::Result<PipelineSummary> {
        let companies = self.walker.walk(start, cancel).await?;
        export_companies(&self.snapshot_path, &companies, ExportKind::Snapshot)?;

        let companies = match &self.business_lookup {
            Some(lookup) => lookup.enrich_all(companies, cancel).await,
            None => companies,
        };
        let companies = self.descriptions.enrich_all(companies, cancel).await;

        if cancel.is_cancelled() {
            log::warn!("Cancelled, exporting the companies enriched so far");
        }
        export_companies(&self.enriched_path, &companies, ExportKind::Enriched)?;

        let summary = PipelineSummary::from_companies(&companies);
        log::info!("Pipeline finished: {:?}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc, time::Duration};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::listing::tests::{listing_html, page_html},
        error::{FetchError, ServiceError},
        services::{
            GeoPoint, PageFetcher, PlaceCandidate, PlaceDetails, PlacesService, RetryPolicy,
            TextGenerator,
        },
    };

    struct TwoPages;

    #[async_trait]
    impl PageFetcher for TwoPages {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            let club = |name: &str, phone: &str| {
                listing_html(name, "1 Main St", "", "Sydney", "NSW", phone, "")
            };
            Ok(match url.query() {
                None => page_html(
                    &[club("Starbucks", "0298765432"), club("Golf Club", "")],
                    Some("?page=1"),
                ),
                Some(_) => page_html(&[club("RSL Club", "")], None),
            })
        }
    }

    struct EchoName;

    #[async_trait]
    impl TextGenerator for EchoName {
        async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, ServiceError> {
            match prompt.contains("RSL Club") {
                true => Err(ServiceError::Api("content filtered".to_string())),
                false => Ok(format!(" {} ", prompt.len())),
            }
        }
    }

    struct OnlyStarbucks;

    #[async_trait]
    impl PlacesService for OnlyStarbucks {
        async fn geocode(&self, _query: &str) -> Result<Vec<GeoPoint>, ServiceError> {
            Ok(vec![GeoPoint { lat: 0.0, lng: 0.0 }])
        }

        async fn nearby_search(
            &self,
            _location: GeoPoint,
            _radius_m: u32,
            _place_type: &str,
        ) -> Result<Vec<PlaceCandidate>, ServiceError> {
            Ok(vec![PlaceCandidate {
                name: "Starbucks".to_string(),
                place_id: "sb".to_string(),
            }])
        }

        async fn place_details(&self, _place_id: &str) -> Result<PlaceDetails, ServiceError> {
            Ok(PlaceDetails {
                website: Some("https://www.starbucks.com.au/".to_string()),
                phone: Some("+61 2 9000 0000".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn runs_every_stage_and_exports_both_snapshots() {
        let dir = std::env::temp_dir().join(format!("clubscout-{}", uuid::Uuid::new_v4()));
        let pipeline = Pipeline {
            walker: DirectoryWalker::new(Arc::new(TwoPages), 10),
            business_lookup: Some(BusinessLookupEnricher::new(
                Arc::new(OnlyStarbucks),
                50,
                "establishment".to_string(),
                2,
            )),
            descriptions: DescriptionEnricher::new(
                Arc::new(EchoName),
                7,
                RetryPolicy {
                    max_attempts: 1,
                    base_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(1),
                },
                2,
            ),
            snapshot_path: dir.join("companies_data.csv"),
            enriched_path: dir.join("companies_data_with_descriptions.csv"),
        };

        let summary = pipeline
            .run(
                &Url::parse("https://clubs.example.org/clubs").unwrap(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            summary,
            PipelineSummary {
                companies: 3,
                matched: 1,
                no_match: 2,
                lookup_failed: 0,
                described: 2,
            }
        );

        let snapshot = fs::read_to_string(dir.join("companies_data.csv")).unwrap();
        assert!(snapshot.contains("Starbucks,1 Main St,,Sydney,NSW,0298765432,\n"));

        let enriched =
            fs::read_to_string(dir.join("companies_data_with_descriptions.csv")).unwrap();
        let rows: Vec<&str> = enriched.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[1].starts_with(
            "Starbucks,1 Main St,,Sydney,NSW,+61 2 9000 0000,https://www.starbucks.com.au/,"
        ));
        assert!(rows[2].starts_with("Golf Club,"));
        assert_eq!(rows[3], "RSL Club,1 Main St,,Sydney,NSW,,,");

        fs::remove_dir_all(dir).unwrap();
    }
}
