//! VTEC records and product PIL selection
//!
//! PIL selection is a pure decision table over the product category, the
//! VTEC record of one hazard and the hazard event itself.

use hazard_core::{HazardEvent, HazardEventView, HazardStatus, HazardType, Value, PREVIOUS_FLOOD_SEVERITY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attribute holding the flood severity forecast for the current issuance
pub const FLOOD_SEVERITY: &str = "floodSeverity";

/// Hydrologic product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "FFA")]
    Ffa,
    #[serde(rename = "FFW_FFS")]
    FfwFfs,
    #[serde(rename = "ESF")]
    Esf,
    #[serde(rename = "FLW_FLS")]
    FlwFls,
}

impl ProductCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductCategory::Ffa => "FFA",
            ProductCategory::FfwFfs => "FFW_FFS",
            ProductCategory::Esf => "ESF",
            ProductCategory::FlwFls => "FLW_FLS",
        }
    }

    /// Category a hazard type is issued under, if any
    pub fn for_hazard_type(hazard_type: &HazardType) -> Option<Self> {
        match (hazard_type.phenomenon(), hazard_type.significance()) {
            ("FF" | "FA" | "FL", "A") => Some(ProductCategory::Ffa),
            ("FF", "W") => Some(ProductCategory::FfwFfs),
            ("HY", "O") => Some(ProductCategory::Esf),
            ("FL", "W" | "Y") | ("FA", "W" | "Y") | ("HY", "S") => Some(ProductCategory::FlwFls),
            _ => None,
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// VTEC action code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VtecAction {
    New,
    Con,
    Ext,
    Exa,
    Exb,
    Can,
    Exp,
    Upg,
}

impl VtecAction {
    pub fn as_str(self) -> &'static str {
        match self {
            VtecAction::New => "NEW",
            VtecAction::Con => "CON",
            VtecAction::Ext => "EXT",
            VtecAction::Exa => "EXA",
            VtecAction::Exb => "EXB",
            VtecAction::Can => "CAN",
            VtecAction::Exp => "EXP",
            VtecAction::Upg => "UPG",
        }
    }

    /// Action an event takes in its next product
    ///
    /// `last_issued` is the event as it stood at its previous issuance.
    pub fn for_event(event: &HazardEvent, last_issued: Option<&HazardEvent>) -> Self {
        match event.status() {
            HazardStatus::Ending | HazardStatus::Ended => VtecAction::Can,
            HazardStatus::Elapsed => VtecAction::Exp,
            _ if !event.ever_issued() => VtecAction::New,
            _ => match last_issued {
                Some(prev) if prev.end_time() != event.end_time() => VtecAction::Ext,
                _ => VtecAction::Con,
            },
        }
    }
}

impl fmt::Display for VtecAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flood severity of a forecast point
///
/// Ordered `N < U < 0 < 1 < 2 < 3`; an absent severity (`None`) sorts
/// below all of them, which is how `Option<FloodSeverity>` orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FloodSeverity {
    /// No flooding
    N,
    /// Unknown
    U,
    /// Areal or flash flood, or flooding with no category
    Zero,
    Minor,
    Moderate,
    Major,
}

impl FloodSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            FloodSeverity::N => "N",
            FloodSeverity::U => "U",
            FloodSeverity::Zero => "0",
            FloodSeverity::Minor => "1",
            FloodSeverity::Moderate => "2",
            FloodSeverity::Major => "3",
        }
    }

    /// Read a severity attribute; strings and small integers are accepted
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            other => other.as_int().and_then(|i| i.to_string().parse().ok()),
        }
    }
}

impl FromStr for FloodSeverity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim() {
            "N" => Ok(FloodSeverity::N),
            "U" => Ok(FloodSeverity::U),
            "0" => Ok(FloodSeverity::Zero),
            "1" => Ok(FloodSeverity::Minor),
            "2" => Ok(FloodSeverity::Moderate),
            "3" => Ok(FloodSeverity::Major),
            other => Err(format!("unknown flood severity: {}", other)),
        }
    }
}

impl TryFrom<String> for FloodSeverity {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, String> {
        s.parse()
    }
}

impl From<FloodSeverity> for String {
    fn from(s: FloodSeverity) -> Self {
        s.as_str().to_string()
    }
}

/// Hydrologic VTEC fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hvtec {
    #[serde(default)]
    pub flood_severity: Option<FloodSeverity>,
}

/// One VTEC line of a product segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VtecRecord {
    pub act: VtecAction,
    pub phen: String,
    pub sig: String,
    pub phensig: String,
    #[serde(default)]
    pub hvtec: Option<Hvtec>,
}

impl VtecRecord {
    pub fn new(act: VtecAction, phen: impl Into<String>, sig: impl Into<String>) -> Self {
        let phen = phen.into();
        let sig = sig.into();
        let phensig = format!("{}.{}", phen, sig);
        Self {
            act,
            phen,
            sig,
            phensig,
            hvtec: None,
        }
    }

    pub fn with_flood_severity(mut self, severity: Option<FloodSeverity>) -> Self {
        self.hvtec = Some(Hvtec {
            flood_severity: severity,
        });
        self
    }

    /// Build the record for an event's next product
    ///
    /// Returns `None` for an event with no hazard type.
    pub fn for_event(event: &HazardEvent, last_issued: Option<&HazardEvent>) -> Option<Self> {
        let hazard_type = event.hazard_type()?;
        let act = VtecAction::for_event(event, last_issued);
        let record = Self::new(act, hazard_type.phenomenon(), hazard_type.significance());
        Some(match event.get(FLOOD_SEVERITY) {
            Some(value) => record.with_flood_severity(FloodSeverity::from_value(value)),
            None => record,
        })
    }

    pub fn flood_severity(&self) -> Option<FloodSeverity> {
        self.hvtec.as_ref().and_then(|h| h.flood_severity)
    }
}

/// Product identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pil {
    FFA,
    FFW,
    FFS,
    ESF,
    FLW,
    FLS,
}

impl Pil {
    pub fn as_str(self) -> &'static str {
        match self {
            Pil::FFA => "FFA",
            Pil::FFW => "FFW",
            Pil::FFS => "FFS",
            Pil::ESF => "ESF",
            Pil::FLW => "FLW",
            Pil::FLS => "FLS",
        }
    }

    /// WMO heading used in the product's first line
    pub fn wmo_id(self) -> &'static str {
        match self {
            Pil::FFA => "WGUS63",
            Pil::FFW => "WGUS53",
            Pil::FFS => "WGUS73",
            Pil::ESF => "FGUS73",
            Pil::FLW => "WGUS43",
            Pil::FLS => "WGUS83",
        }
    }
}

impl fmt::Display for Pil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of PIL selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilSelection {
    pub pil: Pil,
    /// The caller must confirm the PIL against sibling forecast points
    pub deferred: bool,
}

impl PilSelection {
    fn fixed(pil: Pil) -> Self {
        Self { pil, deferred: false }
    }
}

/// Select the PIL for one VTEC record of a product
///
/// `None` means no rule applies and the caller decides.
pub fn select_pil<E: HazardEventView + ?Sized>(
    category: ProductCategory,
    vtec: &VtecRecord,
    event: &E,
) -> Option<PilSelection> {
    let new_or_ext = matches!(vtec.act, VtecAction::New | VtecAction::Ext);
    let selection = match category {
        ProductCategory::Ffa => Some(PilSelection::fixed(Pil::FFA)),
        ProductCategory::Esf => Some(PilSelection::fixed(Pil::ESF)),
        ProductCategory::FfwFfs => Some(PilSelection::fixed(if new_or_ext { Pil::FFW } else { Pil::FFS })),
        ProductCategory::FlwFls => match vtec.phensig.as_str() {
            "FL.Y" | "FA.Y" => Some(PilSelection::fixed(Pil::FLS)),
            "HY.S" => Some(PilSelection {
                pil: Pil::FLW,
                deferred: true,
            }),
            "FA.W" => Some(PilSelection::fixed(if new_or_ext { Pil::FLW } else { Pil::FLS })),
            "FL.W" => match vtec.act {
                VtecAction::New => Some(PilSelection::fixed(Pil::FLW)),
                VtecAction::Can | VtecAction::Exp => Some(PilSelection::fixed(Pil::FLS)),
                VtecAction::Con | VtecAction::Ext => {
                    let previous = event.get(PREVIOUS_FLOOD_SEVERITY).and_then(FloodSeverity::from_value);
                    let rising = vtec.flood_severity() > previous;
                    Some(PilSelection::fixed(if rising { Pil::FLW } else { Pil::FLS }))
                }
                _ => None,
            },
            _ => None,
        },
    };
    log::debug!(
        "PIL for {} {} {}: {:?}",
        category,
        vtec.act,
        vtec.phensig,
        selection.map(|s| s.pil)
    );
    selection
}
