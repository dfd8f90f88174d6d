use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ServiceError;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const NEARBY_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const PLACE_DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    pub place_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceDetails {
    pub website: Option<String>,
    #[serde(rename = "international_phone_number")]
    pub phone: Option<String>,
}

#[async_trait]
pub trait PlacesService: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Vec<GeoPoint>, ServiceError>;

    async fn nearby_search(
        &self,
        location: GeoPoint,
        radius_m: u32,
        place_type: &str,
    ) -> Result<Vec<PlaceCandidate>, ServiceError>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ServiceError>;
}

pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    status: String,
    error_message: Option<String>,
    results: Option<Vec<T>>,
    result: Option<T>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: GeoPoint,
}

#[derive(Serialize)]
struct GeocodeQuery<'a> {
    address: &'a str,
    key: &'a str,
}

#[derive(Serialize)]
struct NearbySearchQuery<'a> {
    location: String,
    radius: u32,
    #[serde(rename = "type")]
    place_type: &'a str,
    key: &'a str,
}

#[derive(Serialize)]
struct PlaceDetailsQuery<'a> {
    place_id: &'a str,
    fields: &'a str,
    key: &'a str,
}

impl GooglePlacesClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(GooglePlacesClient { client, api_key })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &impl Serialize,
    ) -> Result<ApiResponse<T>, ServiceError> {
        let res = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        let body = res.text().await?;
        let response: ApiResponse<T> = serde_json::from_str(&body)
            .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
        check_status(&response.status, response.error_message.as_deref())?;

        Ok(response)
    }
}

fn check_status(status: &str, message: Option<&str>) -> Result<(), ServiceError> {
    let detail = || match message {
        Some(m) => format!("{}: {}", status, m),
        None => status.to_string(),
    };

    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(ServiceError::RateLimited(detail())),
        _ => Err(ServiceError::Api(detail())),
    }
}

#[async_trait]
impl PlacesService for GooglePlacesClient {
    async fn geocode(&self, query: &str) -> Result<Vec<GeoPoint>, ServiceError> {
        let response: ApiResponse<GeocodeResult> = self
            .get(
                GEOCODE_URL,
                &GeocodeQuery {
                    address: query,
                    key: &self.api_key,
                },
            )
            .await?;

        Ok(response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.geometry.location)
            .collect())
    }

    async fn nearby_search(
        &self,
        location: GeoPoint,
        radius_m: u32,
        place_type: &str,
    ) -> Result<Vec<PlaceCandidate>, ServiceError> {
        let response: ApiResponse<PlaceCandidate> = self
            .get(
                NEARBY_SEARCH_URL,
                &NearbySearchQuery {
                    location: format!("{},{}", location.lat, location.lng),
                    radius: radius_m,
                    place_type,
                    key: &self.api_key,
                },
            )
            .await?;

        Ok(response.results.unwrap_or_default())
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ServiceError> {
        let response: ApiResponse<PlaceDetails> = self
            .get(
                PLACE_DETAILS_URL,
                &PlaceDetailsQuery {
                    place_id,
                    fields: "website,international_phone_number",
                    key: &self.api_key,
                },
            )
            .await?;

        Ok(response.result.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_statuses_map_to_service_errors() {
        assert_eq!(check_status("OK", None), Ok(()));
        assert_eq!(check_status("ZERO_RESULTS", None), Ok(()));
        assert_eq!(
            check_status("OVER_QUERY_LIMIT", Some("You have exceeded your rate-limit")),
            Err(ServiceError::RateLimited(
                "OVER_QUERY_LIMIT: You have exceeded your rate-limit".to_string()
            ))
        );
        assert_eq!(
            check_status("REQUEST_DENIED", None),
            Err(ServiceError::Api("REQUEST_DENIED".to_string()))
        );
    }

    #[test]
    fn decodes_geocode_response() {
        let body = r#"{
            "results": [
                {"formatted_address": "12 Wharf Rd, Balmain NSW 2041", "geometry": {"location": {"lat": -33.85, "lng": 151.18}}},
                {"geometry": {"location": {"lat": -33.9, "lng": 151.2}}}
            ],
            "status": "OK"
        }"#;

        let response: ApiResponse<GeocodeResult> = serde_json::from_str(body).unwrap();
        let points: Vec<GeoPoint> = response
            .results
            .unwrap()
            .into_iter()
            .map(|r| r.geometry.location)
            .collect();

        assert_eq!(points[0], GeoPoint { lat: -33.85, lng: 151.18 });
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn decodes_place_details_with_missing_website() {
        let body = r#"{
            "html_attributions": [],
            "result": {"international_phone_number": "+61 2 9876 5432"},
            "status": "OK"
        }"#;

        let response: ApiResponse<PlaceDetails> = serde_json::from_str(body).unwrap();

        assert_eq!(
            response.result.unwrap(),
            PlaceDetails {
                website: None,
                phone: Some("+61 2 9876 5432".to_string()),
            }
        );
    }

    #[test]
    fn decodes_zero_results() {
        let body = r#"{"results": [], "status": "ZERO_RESULTS"}"#;

        let response: ApiResponse<PlaceCandidate> = serde_json::from_str(body).unwrap();

        assert!(response.results.unwrap_or_default().is_empty());
    }
}
