//! Quote request records and the file references they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

use crate::error::{QuoteError, Result};

const NAME_MAX: usize = 80;
const PHONE_MAX: usize = 40;
const ADDRESS_MAX: usize = 255;

/// Identity of a stored quote request, assigned by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuoteId(pub i64);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of job the requester is asking a quote for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "residential")]
    Residential,
    #[serde(rename = "commercial")]
    Commercial,
    #[serde(rename = "construction")]
    Construction,
    #[serde(rename = "eco-friendly")]
    EcoFriendly,
}

impl ServiceType {
    /// Value stored in the record store
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Residential => "residential",
            ServiceType::Commercial => "commercial",
            ServiceType::Construction => "construction",
            ServiceType::EcoFriendly => "eco-friendly",
        }
    }

    /// Human readable label used in notifications
    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Residential => "Residential Cleanout",
            ServiceType::Commercial => "Commercial Service",
            ServiceType::Construction => "Construction Debris",
            ServiceType::EcoFriendly => "Eco-Friendly Disposal",
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = QuoteError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "residential" => Ok(ServiceType::Residential),
            "commercial" => Ok(ServiceType::Commercial),
            "construction" => Ok(ServiceType::Construction),
            "eco-friendly" => Ok(ServiceType::EcoFriendly),
            _ => Err(QuoteError::InvalidField(format!("unknown service type: {}", s))),
        }
    }
}

/// Storage key of an uploaded image, relative to the media root
/// (for example `quotes/2024/06/photo.jpg`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef(String);

impl FileRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build a reference from a stored column value. Empty values mean "no image".
    pub fn from_column(value: Option<String>) -> Option<Self> {
        value.filter(|v| !v.trim().is_empty()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path component of the key
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// True when the key is relative and never climbs out of its base
    pub fn is_confined(&self) -> bool {
        let path = Path::new(&self.0);
        !self.0.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A quote request before it has been persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuote {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_address: String,
    pub service_type: ServiceType,
    pub description: String,
}

impl NewQuote {
    pub fn validate(&self) -> Result<()> {
        check_fields(
            &self.first_name,
            &self.last_name,
            &self.email,
            self.phone.as_deref(),
            &self.service_address,
            &self.description,
        )
    }
}

/// A persisted quote request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub id: QuoteId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_address: String,
    pub service_type: ServiceType,
    pub description: String,
    pub image: Option<FileRef>,
    pub created_at: DateTime<Utc>,
}

impl QuoteRequest {
    /// Attach an identity and timestamp to a new quote
    pub fn from_new(id: QuoteId, quote: &NewQuote, image: Option<FileRef>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: quote.first_name.clone(),
            last_name: quote.last_name.clone(),
            email: quote.email.clone(),
            phone: quote.phone.clone(),
            service_address: quote.service_address.clone(),
            service_type: quote.service_type,
            description: quote.description.clone(),
            image,
            created_at,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_fields(
            &self.first_name,
            &self.last_name,
            &self.email,
            self.phone.as_deref(),
            &self.service_address,
            &self.description,
        )
    }
}

impl fmt::Display for QuoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} • {} • {}",
            self.first_name,
            self.last_name,
            self.service_type.label(),
            self.created_at.format("%Y-%m-%d")
        )
    }
}

fn check_fields(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: Option<&str>,
    address: &str,
    description: &str,
) -> Result<()> {
    require("first_name", first_name, Some(NAME_MAX))?;
    require("last_name", last_name, Some(NAME_MAX))?;
    require("email", email, None)?;
    require("service_address", address, Some(ADDRESS_MAX))?;
    require("description", description, None)?;
    if let Some(phone) = phone {
        if phone.chars().count() > PHONE_MAX {
            return Err(QuoteError::InvalidField(format!(
                "phone is longer than {} characters",
                PHONE_MAX
            )));
        }
    }
    Ok(())
}

fn require(field: &str, value: &str, max: Option<usize>) -> Result<()> {
    if value.trim().is_empty() {
        return Err(QuoteError::InvalidField(format!("{} is required", field)));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(QuoteError::InvalidField(format!(
                "{} is longer than {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> NewQuote {
        NewQuote {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            service_address: "12 Analytical Way".to_string(),
            service_type: ServiceType::EcoFriendly,
            description: "Old sofa and two mattresses".to_string(),
        }
    }

    #[test]
    fn test_service_type_round_trips_through_str() {
        for service in [
            ServiceType::Residential,
            ServiceType::Commercial,
            ServiceType::Construction,
            ServiceType::EcoFriendly,
        ] {
            assert_eq!(service.as_str().parse::<ServiceType>().unwrap(), service);
        }
        assert!("garden".parse::<ServiceType>().is_err());
        assert_eq!(
            serde_json::to_string(&ServiceType::EcoFriendly).unwrap(),
            "\"eco-friendly\""
        );
    }

    #[test]
    fn test_validation_rejects_missing_and_oversized_fields() {
        assert!(sample().validate().is_ok());

        let mut quote = sample();
        quote.first_name = "   ".to_string();
        assert!(matches!(quote.validate(), Err(QuoteError::InvalidField(_))));

        let mut quote = sample();
        quote.phone = Some("1".repeat(41));
        assert!(quote.validate().is_err());

        let mut quote = sample();
        quote.service_address = "x".repeat(256);
        assert!(quote.validate().is_err());
    }

    #[test]
    fn test_file_ref_helpers() {
        assert_eq!(FileRef::from_column(Some(String::new())), None);
        assert_eq!(FileRef::from_column(None), None);

        let image = FileRef::new("quotes/2024/06/sofa.jpg");
        assert_eq!(image.file_name(), "sofa.jpg");
        assert!(image.is_confined());
        assert!(!FileRef::new("quotes/../../etc/passwd").is_confined());
        assert!(!FileRef::new("/etc/passwd").is_confined());
    }

    #[test]
    fn test_display_format() {
        let created_at = Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap();
        let quote = QuoteRequest::from_new(QuoteId(7), &sample(), None, created_at);
        assert_eq!(quote.to_string(), "Ada Lovelace • Eco-Friendly Disposal • 2024-06-03");
    }
}
