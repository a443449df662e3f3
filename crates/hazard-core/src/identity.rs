//! Identity types for hazard events, sites and hazard types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Globally unique identifier of a hazard event
///
/// Identifiers issued by [`crate::HazardEventStore`] have the form
/// `SITE-YYYY-NNNNNN`; identifiers from elsewhere are carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Create a new event ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an ID from its components
    pub fn from_parts(site: &SiteId, year: i32, serial: u64) -> Self {
        Self(format!("{}-{:04}-{:06}", site, year, serial))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a store-issued ID into (site, year, serial)
    pub fn components(&self) -> Option<(&str, i32, u64)> {
        let mut parts = self.0.rsplitn(3, '-');
        let serial = parts.next()?.parse().ok()?;
        let year = parts.next()?.parse().ok()?;
        let site = parts.next()?;
        Some((site, year, serial))
    }

    /// Render this ID the way the event-ID display setting asks for
    pub fn display(&self, kind: EventIdDisplayType, current_site: &SiteId, current_year: i32) -> String {
        let Some((site, year, serial)) = self.components() else {
            return self.0.clone();
        };
        let serial = format!("{:06}", serial);
        match kind {
            EventIdDisplayType::AlwaysFull => self.0.clone(),
            EventIdDisplayType::AlwaysSite => format!("{}-{}", site, serial),
            EventIdDisplayType::OnlySerial => serial,
            EventIdDisplayType::FullOnDiff => {
                if site != current_site.as_str() || year != current_year {
                    self.0.clone()
                } else {
                    serial
                }
            }
            EventIdDisplayType::ProgOnDiff => {
                if site != current_site.as_str() {
                    self.0.clone()
                } else if year != current_year {
                    format!("{:04}-{}", year, serial)
                } else {
                    serial
                }
            }
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How event identifiers are shown to the forecaster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventIdDisplayType {
    #[default]
    AlwaysFull,
    FullOnDiff,
    ProgOnDiff,
    AlwaysSite,
    OnlySerial,
}

/// Office identifier (3–4 uppercase alphanumerics, e.g. "OAX", "KOAX")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteId(String);

impl SiteId {
    /// Create a validated site ID
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = (3..=4).contains(&id.len())
            && id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if valid {
            Ok(Self(id))
        } else {
            Err(Error::InvalidSiteId(id))
        }
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SiteId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<SiteId> for String {
    fn from(id: SiteId) -> Self {
        id.0
    }
}

impl FromStr for SiteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Hazard type key: phenomenon, significance and optional subtype
///
/// Textual form is `phen.sig[.subtype]`, e.g. `FF.W.Convective`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HazardType {
    phenomenon: String,
    significance: String,
    subtype: Option<String>,
}

impl HazardType {
    /// Create a hazard type without a subtype
    pub fn new(phenomenon: impl Into<String>, significance: impl Into<String>) -> Self {
        Self {
            phenomenon: phenomenon.into(),
            significance: significance.into(),
            subtype: None,
        }
    }

    /// Create a hazard type with an optional subtype
    pub fn with_subtype(
        phenomenon: impl Into<String>,
        significance: impl Into<String>,
        subtype: Option<impl Into<String>>,
    ) -> Self {
        Self {
            phenomenon: phenomenon.into(),
            significance: significance.into(),
            subtype: subtype.map(Into::into).filter(|s: &String| !s.is_empty()),
        }
    }

    pub fn phenomenon(&self) -> &str {
        &self.phenomenon
    }

    pub fn significance(&self) -> &str {
        &self.significance
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// The `phen.sig` pair used by VTEC
    pub fn phensig(&self) -> String {
        format!("{}.{}", self.phenomenon, self.significance)
    }

    /// Drop the subtype
    pub fn without_subtype(&self) -> Self {
        Self::new(self.phenomenon.clone(), self.significance.clone())
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subtype {
            Some(sub) => write!(f, "{}.{}.{}", self.phenomenon, self.significance, sub),
            None => write!(f, "{}.{}", self.phenomenon, self.significance),
        }
    }
}

impl FromStr for HazardType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, '.');
        let phen = parts.next().unwrap_or_default();
        let sig = parts.next().unwrap_or_default();
        if phen.is_empty() || sig.is_empty() {
            return Err(Error::InvalidHazardType(s.to_string()));
        }
        let subtype = parts.next();
        if subtype.is_some_and(str::is_empty) {
            return Err(Error::InvalidHazardType(s.to_string()));
        }
        Ok(Self::with_subtype(phen, sig, subtype))
    }
}

impl TryFrom<String> for HazardType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<HazardType> for String {
    fn from(t: HazardType) -> Self {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_components() {
        let site = SiteId::new("OAX").unwrap();
        let id = EventId::from_parts(&site, 2024, 17);
        assert_eq!(id.as_str(), "OAX-2024-000017");
        assert_eq!(id.components(), Some(("OAX", 2024, 17)));
        assert_eq!(EventId::new("opaque").components(), None);
    }

    #[test]
    fn test_event_id_display_types() {
        let oax = SiteId::new("OAX").unwrap();
        let dmx = SiteId::new("DMX").unwrap();
        let id = EventId::from_parts(&oax, 2023, 5);

        assert_eq!(id.display(EventIdDisplayType::AlwaysFull, &oax, 2024), "OAX-2023-000005");
        assert_eq!(id.display(EventIdDisplayType::AlwaysSite, &oax, 2023), "OAX-000005");
        assert_eq!(id.display(EventIdDisplayType::OnlySerial, &dmx, 2024), "000005");
        assert_eq!(id.display(EventIdDisplayType::FullOnDiff, &oax, 2023), "000005");
        assert_eq!(id.display(EventIdDisplayType::FullOnDiff, &oax, 2024), "OAX-2023-000005");
        assert_eq!(id.display(EventIdDisplayType::ProgOnDiff, &oax, 2024), "2023-000005");
        assert_eq!(id.display(EventIdDisplayType::ProgOnDiff, &dmx, 2023), "OAX-2023-000005");
    }

    #[test]
    fn test_site_id_validation() {
        assert!(SiteId::new("OAX").is_ok());
        assert!(SiteId::new("KOAX").is_ok());
        assert!(SiteId::new("oax").is_err());
        assert!(SiteId::new("OAXAC").is_err());
        assert!(SiteId::new("").is_err());
    }

    #[test]
    fn test_hazard_type_text_form() {
        let t: HazardType = "FF.W.Convective".parse().unwrap();
        assert_eq!(t.phenomenon(), "FF");
        assert_eq!(t.significance(), "W");
        assert_eq!(t.subtype(), Some("Convective"));
        assert_eq!(t.phensig(), "FF.W");
        assert_eq!(t.to_string(), "FF.W.Convective");

        let t: HazardType = "FA.Y".parse().unwrap();
        assert_eq!(t.subtype(), None);
        assert_eq!(t, HazardType::new("FA", "Y"));

        assert!("FA".parse::<HazardType>().is_err());
        assert!("FA.Y.".parse::<HazardType>().is_err());
    }

    #[test]
    fn test_hazard_type_ron() {
        let t: HazardType = ron::from_str("\"FL.W\"").unwrap();
        assert_eq!(t, HazardType::new("FL", "W"));
    }
}
