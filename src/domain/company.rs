use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Enriched<T> {
    #[default]
    NotAttempted,
    Unknown,
    Present(T),
}

impl<T> Enriched<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Enriched::Present(_))
    }
}

impl Enriched<String> {
    pub fn from_service(value: Option<String>) -> Self {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => Enriched::Present(v),
            _ => Enriched::Unknown,
        }
    }

    pub fn as_export(&self) -> &str {
        match self {
            Enriched::Present(v) => v.as_str(),
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LookupStatus {
    #[default]
    NotAttempted,
    Matched,
    NoMatch,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    pub name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub phone: Enriched<String>,
    pub website: Enriched<String>,
    pub description: Enriched<String>,
    pub lookup: LookupStatus,
}

impl CompanyRecord {
    pub fn from_listing(
        name: String,
        address_line1: String,
        address_line2: String,
        city: String,
        state: String,
        phone: &str,
        website: &str,
    ) -> Self {
        let phone = match parse_domestic_phone(phone) {
            Some(p) => Enriched::Present(p),
            None => {
                if !phone.is_empty() {
                    log::warn!("Discarding invalid phone {:?} for {}", phone, name);
                }
                Enriched::Unknown
            }
        };
        let website = match parse_website(website) {
            Ok(Some(w)) => Enriched::Present(w),
            Ok(None) => Enriched::Unknown,
            Err(()) => {
                log::warn!("Discarding invalid website {:?} for {}", website, name);
                Enriched::Unknown
            }
        };

        CompanyRecord {
            name,
            address_line1,
            address_line2,
            city,
            state,
            phone,
            website,
            description: Enriched::NotAttempted,
            lookup: LookupStatus::NotAttempted,
        }
    }

    pub fn full_address(&self) -> String {
        [
            &self.address_line1,
            &self.address_line2,
            &self.city,
            &self.state,
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .join(", ")
    }
}

/// Accepts a domestic number: 10 ASCII digits starting with `0`, once spaces,
/// hyphens and parentheses are removed.
pub fn parse_domestic_phone(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();

    match compact.len() == 10
        && compact.starts_with('0')
        && compact.chars().all(|c| c.is_ascii_digit())
    {
        true => Some(compact),
        false => None,
    }
}

/// `Ok(None)` for "not provided", `Err(())` when the value has no http scheme.
pub fn parse_website(raw: &str) -> Result<Option<String>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        Ok(None)
    } else if raw.starts_with("http") {
        Ok(Some(raw.to_string()))
    } else {
        Err(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domestic_phone_validation() {
        assert_eq!(
            parse_domestic_phone("0298765432"),
            Some("0298765432".to_string())
        );
        assert_eq!(parse_domestic_phone("298765432"), None);
        assert_eq!(parse_domestic_phone("02987654321"), None);
        assert_eq!(parse_domestic_phone("02ABCDE432"), None);
        assert_eq!(parse_domestic_phone(""), None);
    }

    #[test]
    fn domestic_phone_ignores_separators() {
        assert_eq!(
            parse_domestic_phone("(02) 9876-5432"),
            Some("0298765432".to_string())
        );
    }

    #[test]
    fn website_validation() {
        assert_eq!(
            parse_website("http://example.com"),
            Ok(Some("http://example.com".to_string()))
        );
        assert_eq!(parse_website("example.com"), Err(()));
        assert_eq!(parse_website(""), Ok(None));
    }

    #[test]
    fn invalid_scraped_values_become_unknown() {
        let record = CompanyRecord::from_listing(
            "Bowling Club".to_string(),
            "1 Main St".to_string(),
            String::new(),
            "Sydney".to_string(),
            "NSW".to_string(),
            "12345",
            "bowls.example",
        );

        assert_eq!(record.phone, Enriched::Unknown);
        assert_eq!(record.website, Enriched::Unknown);
        assert_eq!(record.description, Enriched::NotAttempted);
        assert_eq!(record.lookup, LookupStatus::NotAttempted);
    }

    #[test]
    fn full_address_skips_empty_parts() {
        let record = CompanyRecord::from_listing(
            "Bowling Club".to_string(),
            "1 Main St".to_string(),
            "  ".to_string(),
            "Sydney".to_string(),
            "NSW".to_string(),
            "",
            "",
        );

        assert_eq!(record.full_address(), "1 Main St, Sydney, NSW");
    }

    #[test]
    fn export_renders_missing_values_as_empty() {
        assert_eq!(Enriched::<String>::NotAttempted.as_export(), "");
        assert_eq!(Enriched::<String>::Unknown.as_export(), "");
        assert_eq!(Enriched::Present("x".to_string()).as_export(), "x");
        assert_eq!(Enriched::from_service(Some("  ".to_string())), Enriched::Unknown);
    }
}
