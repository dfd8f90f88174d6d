use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    domain::company::{CompanyRecord, Enriched, LookupStatus},
    error::ServiceError,
};

use super::{enrich_concurrently, PlaceCandidate, PlaceDetails, PlacesService};

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Matched(PlaceDetails),
    NoMatch,
}

#[derive(Clone)]
pub struct BusinessLookupEnricher {
    places: Arc<dyn PlacesService>,
    radius_m: u32,
    place_type: String,
    concurrency: usize,
}

impl BusinessLookupEnricher {
    pub fn new(
        places: Arc<dyn PlacesService>,
        radius_m: u32,
        place_type: String,
        concurrency: usize,
    ) -> Self {
        BusinessLookupEnricher {
            places,
            radius_m,
            place_type,
            concurrency,
        }
    }

    /// Geocodes the company, searches establishments around the first hit
    /// and fetches details for the first candidate with exactly the same name.
    pub async fn lookup(&self, company: &CompanyRecord) -> Result<LookupOutcome, ServiceError> {
        let query = build_lookup_query(company);

        let Some(location) = self.places.geocode(&query).await?.into_iter().next() else {
            log::info!("No geocode result for {}", query);
            return Ok(LookupOutcome::NoMatch);
        };

        let candidates = self
            .places
            .nearby_search(location, self.radius_m, &self.place_type)
            .await?;

        match find_exact_match(&company.name, &candidates) {
            Some(candidate) => {
                let details = self.places.place_details(&candidate.place_id).await?;
                Ok(LookupOutcome::Matched(details))
            }
            None => {
                log::info!(
                    "None of {} nearby places is named exactly {}",
                    candidates.len(),
                    company.name
                );
                Ok(LookupOutcome::NoMatch)
            }
        }
    }

    pub async fn enrich_all(
        &self,
        companies: Vec<CompanyRecord>,
        cancel: &CancellationToken,
    ) -> Vec<CompanyRecord> {
        log::info!("Looking up {} companies in places", companies.len());

        let enricher = self.clone();
        let token = cancel.clone();
        enrich_concurrently(companies, self.concurrency, cancel, move |mut company| {
            let enricher = enricher.clone();
            let token = token.clone();
            async move {
                let looked_up = tokio::select! {
                    _ = token.cancelled() => None,
                    looked_up = enricher.lookup(&company) => Some(looked_up),
                };
                let Some(looked_up) = looked_up else {
                    return company;
                };
                match looked_up {
                    Ok(outcome) => apply_outcome(&mut company, outcome),
                    Err(e) => {
                        log::error!("Places lookup failed for {}: {}", company.name, e);
                        company.lookup = LookupStatus::Failed(e.to_string());
                    }
                }
                company
            }
        })
        .await
    }
}

/// A confirmed match overwrites website and phone, including with unknown
/// when the place has none. Without a match the scraped values stay.
pub fn apply_outcome(company: &mut CompanyRecord, outcome: LookupOutcome) {
    match outcome {
        LookupOutcome::Matched(details) => {
            company.website = Enriched::from_service(details.website);
            company.phone = Enriched::from_service(details.phone);
            company.lookup = LookupStatus::Matched;
        }
        LookupOutcome::NoMatch => company.lookup = LookupStatus::NoMatch,
    }
}

pub fn build_lookup_query(company: &CompanyRecord) -> String {
    format!("{}, {}", company.name, company.full_address())
}

pub fn find_exact_match<'a>(
    name: &str,
    candidates: &'a [PlaceCandidate],
) -> Option<&'a PlaceCandidate> {
    candidates.iter().find(|candidate| candidate.name == name)
}
