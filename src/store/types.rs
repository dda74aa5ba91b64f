use crate::models::{AvailabilityStatus, Property, PropertyType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Search parameters for property listings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyFilter {
    /// Case-insensitive substring of the location
    pub location: Option<String>,
    pub property_type: Option<PropertyType>,
    /// Minimum monthly price
    pub min_price: Option<i64>,
    /// Maximum monthly price
    pub max_price: Option<i64>,
    /// Minimum number of bedrooms
    pub min_bedrooms: Option<i32>,
    pub availability: Option<AvailabilityStatus>,
    /// Matches listings tagged with any of these domains
    pub professional_domains: BTreeSet<String>,
    /// Matches listings tagged with any of these interests
    pub interests: BTreeSet<String>,
    /// Matches listings offering all of these amenities
    pub amenities: BTreeSet<String>,
    pub limit: Option<usize>,
}

impl PropertyFilter {
    /// Apply a budget range such as `"10000-25000"` or `"50000"`
    pub fn with_budget(mut self, budget: BudgetRange) -> Self {
        self.min_price = Some(budget.min);
        self.max_price = budget.max;
        self
    }

    /// Whether a listing satisfies every set criterion
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(location) = self.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            if !property
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if self.property_type.is_some_and(|t| t != property.property_type) {
            return false;
        }
        if self.min_price.is_some_and(|min| property.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| property.price > max) {
            return false;
        }
        if self.min_bedrooms.is_some_and(|min| property.bedrooms < min) {
            return false;
        }
        if self
            .availability
            .is_some_and(|status| status != property.availability_status)
        {
            return false;
        }
        if !self.professional_domains.is_empty()
            && self.professional_domains.is_disjoint(&property.professional_domains)
        {
            return false;
        }
        if !self.interests.is_empty() && self.interests.is_disjoint(&property.interests) {
            return false;
        }
        self.amenities.is_subset(&property.amenities)
    }
}

/// Monthly budget bounds parsed from `"min-max"` or `"min"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetRange {
    pub min: i64,
    pub max: Option<i64>,
}

impl FromStr for BudgetRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min_str, max_str) = match s.split_once('-') {
            Some((min, max)) => (min, Some(max)),
            None => (s, None),
        };

        let min = min_str
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid minimum budget {min_str:?}: {e}"))?;

        // An empty or zero upper bound means open-ended
        let max = match max_str.map(str::trim).filter(|m| !m.is_empty()) {
            Some(max) => {
                let max = max
                    .parse::<i64>()
                    .map_err(|e| format!("invalid maximum budget {max:?}: {e}"))?;
                (max != 0).then_some(max)
            }
            None => None,
        };

        if max.is_some_and(|max| max < min) {
            return Err(format!("budget maximum is below minimum in {s:?}"));
        }

        Ok(Self { min, max })
    }
}
