//! Multi-level keys used to keep merges aligned
//!
//! Every table in the pipeline is a `BTreeMap` over one of the composite keys
//! below. Labels that carry strings order lexicographically on their rendered
//! form so roll-up rows (`all_hazards`, `total`, `tot`) land where a sorted
//! table would put them.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Label used for rows summed across hazards
pub const ALL_HAZARDS: &str = "all_hazards";
/// Label used by JEL rows summed across income categories
pub const INCOME_TOTAL: &str = "total";
/// Label used by loss rows averaged across income categories
pub const INCOME_NATIONAL: &str = "tot";
/// Label used for the annualized return period
pub const ANNUAL_RP: &str = "AAL";

/// ISO 3166-1 alpha-3 country code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iso3(pub String);

impl Iso3 {
    pub fn new(code: impl Into<String>) -> Self {
        Iso3(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iso3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hazard type, or the synthetic all-hazards roll-up
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Hazard {
    Named(String),
    AllHazards,
}

impl Hazard {
    pub fn named(name: impl Into<String>) -> Self {
        Hazard::from(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Hazard::Named(name) => name,
            Hazard::AllHazards => ALL_HAZARDS,
        }
    }
}

impl From<String> for Hazard {
    fn from(label: String) -> Self {
        if label == ALL_HAZARDS {
            Hazard::AllHazards
        } else {
            Hazard::Named(label)
        }
    }
}

impl From<Hazard> for String {
    fn from(hazard: Hazard) -> Self {
        hazard.as_str().to_string()
    }
}

impl Ord for Hazard {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Hazard {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Income category: a quintile, or one of the two roll-up labels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IncomeCat {
    /// A population quintile as labelled by the model (e.g. `q1`)
    Quintile(String),
    /// Sum over quintiles (JEL tables)
    Total,
    /// Mean over quintiles (loss tables)
    National,
}

impl IncomeCat {
    pub fn quintile(label: impl Into<String>) -> Self {
        IncomeCat::from(label.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            IncomeCat::Quintile(label) => label,
            IncomeCat::Total => INCOME_TOTAL,
            IncomeCat::National => INCOME_NATIONAL,
        }
    }

    pub fn is_quintile(&self) -> bool {
        matches!(self, IncomeCat::Quintile(_))
    }
}

impl From<String> for IncomeCat {
    fn from(label: String) -> Self {
        match label.as_str() {
            INCOME_TOTAL => IncomeCat::Total,
            INCOME_NATIONAL => IncomeCat::National,
            _ => IncomeCat::Quintile(label),
        }
    }
}

impl From<IncomeCat> for String {
    fn from(cat: IncomeCat) -> Self {
        cat.as_str().to_string()
    }
}

impl Ord for IncomeCat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for IncomeCat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IncomeCat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hazard return period in years, or the annualized expectation
///
/// Variant order matters: event return periods sort numerically, `AAL` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReturnPeriod {
    Years(u32),
    Annual,
}

impl ReturnPeriod {
    /// Annual exceedance frequency, `None` for the annualized label
    pub fn frequency(&self) -> Option<f64> {
        match self {
            ReturnPeriod::Years(years) => Some(1.0 / f64::from(*years)),
            ReturnPeriod::Annual => None,
        }
    }

    pub fn years(&self) -> Option<u32> {
        match self {
            ReturnPeriod::Years(years) => Some(*years),
            ReturnPeriod::Annual => None,
        }
    }
}

impl TryFrom<String> for ReturnPeriod {
    type Error = PipelineError;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        let trimmed = label.trim();
        if trimmed == ANNUAL_RP {
            return Ok(ReturnPeriod::Annual);
        }
        if let Ok(years) = trimmed.parse::<u32>() {
            if years > 0 {
                return Ok(ReturnPeriod::Years(years));
            }
        }
        // Model outputs sometimes carry integral return periods as floats ("10.0")
        match trimmed.parse::<f64>() {
            Ok(years) if years >= 1.0 && years.fract() == 0.0 && years <= f64::from(u32::MAX) => {
                Ok(ReturnPeriod::Years(years as u32))
            }
            _ => Err(PipelineError::InvalidLabel {
                kind: "return period",
                value: label,
            }),
        }
    }
}

impl From<ReturnPeriod> for String {
    fn from(rp: ReturnPeriod) -> Self {
        rp.to_string()
    }
}

impl fmt::Display for ReturnPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnPeriod::Years(years) => write!(f, "{}", years),
            ReturnPeriod::Annual => f.write_str(ANNUAL_RP),
        }
    }
}

/// (iso3, hazard)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountryHazard {
    pub iso3: Iso3,
    pub hazard: Hazard,
}

/// (iso3, income_cat)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountryQuintile {
    pub iso3: Iso3,
    pub income_cat: IncomeCat,
}

/// (iso3, hazard, rp, income_cat): one simulated event for one quintile
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub iso3: Iso3,
    pub hazard: Hazard,
    pub rp: ReturnPeriod,
    pub income_cat: IncomeCat,
}

impl EventKey {
    pub fn new(iso3: Iso3, hazard: Hazard, rp: ReturnPeriod, income_cat: IncomeCat) -> Self {
        Self { iso3, hazard, rp, income_cat }
    }

    /// Key with the return period dropped
    pub fn annual(&self) -> AnnualKey {
        AnnualKey {
            iso3: self.iso3.clone(),
            hazard: self.hazard.clone(),
            income_cat: self.income_cat.clone(),
        }
    }

    pub fn country_hazard(&self) -> CountryHazard {
        CountryHazard {
            iso3: self.iso3.clone(),
            hazard: self.hazard.clone(),
        }
    }
}

/// (iso3, hazard, income_cat): return periods already integrated out
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnualKey {
    pub iso3: Iso3,
    pub hazard: Hazard,
    pub income_cat: IncomeCat,
}

impl AnnualKey {
    pub fn new(iso3: Iso3, hazard: Hazard, income_cat: IncomeCat) -> Self {
        Self { iso3, hazard, income_cat }
    }

    pub fn country_hazard(&self) -> CountryHazard {
        CountryHazard {
            iso3: self.iso3.clone(),
            hazard: self.hazard.clone(),
        }
    }

    pub fn country_quintile(&self) -> CountryQuintile {
        CountryQuintile {
            iso3: self.iso3.clone(),
            income_cat: self.income_cat.clone(),
        }
    }

    pub fn with_rp(&self, rp: ReturnPeriod) -> EventKey {
        EventKey::new(self.iso3.clone(), self.hazard.clone(), rp, self.income_cat.clone())
    }
}

/// (iso3, income_cat, hazard): JEL tables are ordered country, quintile, hazard
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JelKey {
    pub iso3: Iso3,
    pub income_cat: IncomeCat,
    pub hazard: Hazard,
}

impl JelKey {
    pub fn new(iso3: Iso3, income_cat: IncomeCat, hazard: Hazard) -> Self {
        Self { iso3, income_cat, hazard }
    }
}

impl From<&AnnualKey> for JelKey {
    fn from(key: &AnnualKey) -> Self {
        JelKey::new(key.iso3.clone(), key.income_cat.clone(), key.hazard.clone())
    }
}
