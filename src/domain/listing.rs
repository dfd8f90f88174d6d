use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{domain::company::CompanyRecord, error::ScrapeError};

const LISTING_SELECTOR: &str = "div.views-row";
const NEXT_PAGE_SELECTOR: &str = r#"a[title="Go to next page"]"#;

// (field name, selector) for the seven fixed listing fields, in record order.
const FIELD_SELECTORS: [(&str, &str); 7] = [
    ("name", "div.views-field-field-clubsnsw-trading-name"),
    ("address_line1", "div.views-field-field-clubsnsw-address-line-1"),
    ("address_line2", "div.views-field-field-clubsnsw-address-line-2"),
    ("city", "div.views-field-field-clubsnsw-city"),
    ("state", "div.views-field-field-clubsnsw-state"),
    ("phone", "div.views-field-field-clubsnsw-phone"),
    ("website", "div.views-field-field-clubsnsw-web-site"),
];

pub struct ListingSelectors {
    listing: Selector,
    next_page: Selector,
    fields: [(&'static str, Selector); 7],
}

impl Default for ListingSelectors {
    fn default() -> Self {
        ListingSelectors {
            listing: Selector::parse(LISTING_SELECTOR).unwrap(),
            next_page: Selector::parse(NEXT_PAGE_SELECTOR).unwrap(),
            fields: FIELD_SELECTORS.map(|(field, css)| (field, Selector::parse(css).unwrap())),
        }
    }
}

#[derive(Debug)]
pub struct ListingPage {
    pub companies: Vec<CompanyRecord>,
    pub next_page: Option<Url>,
}

impl ListingSelectors {
    pub fn parse_page(&self, page_url: &Url, html: &str) -> Result<ListingPage, ScrapeError> {
        let document = Html::parse_document(html);

        Ok(ListingPage {
            companies: self.extract_companies(&document, page_url)?,
            next_page: self.find_next_page(&document, page_url)?,
        })
    }

    pub fn extract_companies(
        &self,
        document: &Html,
        page_url: &Url,
    ) -> Result<Vec<CompanyRecord>, ScrapeError> {
        document
            .select(&self.listing)
            .enumerate()
            .map(|(index, fragment)| self.extract_company(fragment, page_url, index))
            .collect()
    }

    fn extract_company(
        &self,
        fragment: ElementRef,
        page_url: &Url,
        index: usize,
    ) -> Result<CompanyRecord, ScrapeError> {
        let mut values: [String; 7] = Default::default();
        for (value, (field, selector)) in values.iter_mut().zip(self.fields.iter()) {
            let element =
                fragment
                    .select(selector)
                    .next()
                    .ok_or_else(|| ScrapeError::MalformedListing {
                        page: page_url.to_string(),
                        index,
                        field: *field,
                    })?;
            *value = element.text().collect::<String>().trim().to_string();
        }
        let [name, address_line1, address_line2, city, state, phone, website] = values;

        if name.is_empty() {
            return Err(ScrapeError::MalformedListing {
                page: page_url.to_string(),
                index,
                field: "name",
            });
        }

        Ok(CompanyRecord::from_listing(
            name,
            address_line1,
            address_line2,
            city,
            state,
            &phone,
            &website,
        ))
    }

    pub fn find_next_page(
        &self,
        document: &Html,
        page_url: &Url,
    ) -> Result<Option<Url>, ScrapeError> {
        let Some(link) = document.select(&self.next_page).next() else {
            return Ok(None);
        };

        match link.value().attr("href") {
            Some(href) => page_url
                .join(href)
                .map(Some)
                .map_err(|_| ScrapeError::InvalidUrl {
                    base: page_url.to_string(),
                    href: href.to_string(),
                }),
            None => {
                log::warn!("Next page link on {} has no href, stopping", page_url);
                Ok(None)
            }
        }
    }
}
