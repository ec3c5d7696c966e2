//! Domain models for PLSB

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Name of the month column in the finance sheet
pub const MONTH_COLUMN: &str = "Month";

/// Numeric columns of the finance sheet, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Income,
    Outcome,
    Fixed,
    Shopping,
    Expenses,
    Food,
    Gas,
    Parking,
    Signatures,
    Eva,
    Savings,
    Offer,
}

impl Category {
    /// All numeric columns, in sheet order
    pub const ALL: [Category; 12] = [
        Self::Income,
        Self::Outcome,
        Self::Fixed,
        Self::Shopping,
        Self::Expenses,
        Self::Food,
        Self::Gas,
        Self::Parking,
        Self::Signatures,
        Self::Eva,
        Self::Savings,
        Self::Offer,
    ];

    /// Categories shown as individual metrics on the monthly page, in display order
    pub const DISPLAYED: [Category; 10] = [
        Self::Food,
        Self::Shopping,
        Self::Expenses,
        Self::Gas,
        Self::Parking,
        Self::Fixed,
        Self::Signatures,
        Self::Eva,
        Self::Savings,
        Self::Offer,
    ];

    /// Column name in the sheet
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Outcome => "outcome",
            Self::Fixed => "fixed",
            Self::Shopping => "shopping",
            Self::Expenses => "expenses",
            Self::Food => "food",
            Self::Gas => "gas",
            Self::Parking => "parking",
            Self::Signatures => "signatures",
            Self::Eva => "eva",
            Self::Savings => "savings",
            Self::Offer => "offer",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Outcome => "Outcome",
            Self::Fixed => "Fixed",
            Self::Shopping => "Shopping",
            Self::Expenses => "Expenses",
            Self::Food => "Food",
            Self::Gas => "Gas",
            Self::Parking => "Parking",
            Self::Signatures => "Signatures",
            Self::Eva => "Eva",
            Self::Savings => "Savings",
            Self::Offer => "Offer",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One month's row of the finance sheet
///
/// Empty cells are kept as `None` so that derived values can tell a zero
/// apart from a missing entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub month: String,
    pub income: Option<f64>,
    pub outcome: Option<f64>,
    pub fixed: Option<f64>,
    pub shopping: Option<f64>,
    pub expenses: Option<f64>,
    pub food: Option<f64>,
    pub gas: Option<f64>,
    pub parking: Option<f64>,
    pub signatures: Option<f64>,
    pub eva: Option<f64>,
    pub savings: Option<f64>,
    pub offer: Option<f64>,
}

impl MonthlyRecord {
    /// Create a record with every category empty
    pub fn new(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter, mostly useful in tests and fixtures
    pub fn with(mut self, category: Category, value: f64) -> Self {
        self.set(category, Some(value));
        self
    }

    pub fn get(&self, category: Category) -> Option<f64> {
        match category {
            Category::Income => self.income,
            Category::Outcome => self.outcome,
            Category::Fixed => self.fixed,
            Category::Shopping => self.shopping,
            Category::Expenses => self.expenses,
            Category::Food => self.food,
            Category::Gas => self.gas,
            Category::Parking => self.parking,
            Category::Signatures => self.signatures,
            Category::Eva => self.eva,
            Category::Savings => self.savings,
            Category::Offer => self.offer,
        }
    }

    pub fn set(&mut self, category: Category, value: Option<f64>) {
        let slot = match category {
            Category::Income => &mut self.income,
            Category::Outcome => &mut self.outcome,
            Category::Fixed => &mut self.fixed,
            Category::Shopping => &mut self.shopping,
            Category::Expenses => &mut self.expenses,
            Category::Food => &mut self.food,
            Category::Gas => &mut self.gas,
            Category::Parking => &mut self.parking,
            Category::Signatures => &mut self.signatures,
            Category::Eva => &mut self.eva,
            Category::Savings => &mut self.savings,
            Category::Offer => &mut self.offer,
        };
        *slot = value;
    }

    /// Get a value, failing with `MissingField` if the cell is empty
    pub fn require(&self, category: Category) -> Result<f64> {
        self.get(category).ok_or_else(|| Error::MissingField {
            month: self.month.clone(),
            field: category.as_str().to_string(),
        })
    }
}

/// The finance sheet: records in source row order
///
/// Row order is assumed to be chronological but is never checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    records: Vec<MonthlyRecord>,
}

impl Dataset {
    /// Build a dataset, rejecting empty or duplicate month names
    ///
    /// Month names are stored trimmed, matching how months are looked up.
    pub fn new(mut records: Vec<MonthlyRecord>) -> Result<Self> {
        for record in &mut records {
            let trimmed = record.month.trim();
            if trimmed.len() != record.month.len() {
                record.month = trimmed.to_string();
            }
        }
        {
            let mut seen = HashSet::new();
            for (row, record) in records.iter().enumerate() {
                if record.month.is_empty() {
                    return Err(Error::InvalidData(format!(
                        "Record {} has an empty month",
                        row + 1
                    )));
                }
                if !seen.insert(record.month.as_str()) {
                    return Err(Error::DuplicateMonth(record.month.clone()));
                }
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[MonthlyRecord] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&MonthlyRecord> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Month names in row order
    pub fn months(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.month.as_str()).collect()
    }

    /// Zero-based position of a month
    pub fn position(&self, month: &str) -> Option<usize> {
        self.records.iter().position(|r| r.month == month)
    }

    /// SHA-256 over the dataset contents, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for record in &self.records {
            hasher.update(record.month.as_bytes());
            hasher.update([0u8]);
            for category in Category::ALL {
                match record.get(category) {
                    Some(value) => {
                        hasher.update([1u8]);
                        hasher.update(value.to_be_bytes());
                    }
                    None => hasher.update([0u8]),
                }
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// How a value moved relative to the previous month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// No previous value to compare against
    #[serde(rename = "off")]
    Flat,
    Normal,
    Inverse,
}

impl Direction {
    /// Presentation state used by the dashboard widgets
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "off",
            Self::Normal => "normal",
            Self::Inverse => "inverse",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single category's value for the selected month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetric {
    pub category: Category,
    pub label: String,
    pub value: f64,
    /// The previous month's value (0 for the first month)
    pub delta: f64,
    pub direction: Direction,
}

/// One slice of the monthly breakdown chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownSlice {
    pub label: String,
    pub amount: f64,
}

/// Everything the monthly page renders for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsView {
    pub month: String,
    /// Zero-based row position of the month in the dataset
    pub position: usize,
    pub previous_month: Option<String>,
    pub income: Option<CategoryMetric>,
    pub outcome: Option<CategoryMetric>,
    pub categories: Vec<CategoryMetric>,
    pub breakdown: Vec<BreakdownSlice>,
    /// Fields or slices left out because their source cells were empty
    pub missing: Vec<String>,
}

impl MetricsView {
    /// Find a metric by category, including the income/outcome headline
    pub fn metric(&self, category: Category) -> Option<&CategoryMetric> {
        self.income
            .iter()
            .chain(self.outcome.iter())
            .chain(self.categories.iter())
            .find(|m| m.category == category)
    }

    /// Find a breakdown slice by label
    pub fn slice(&self, label: &str) -> Option<&BreakdownSlice> {
        self.breakdown.iter().find(|s| s.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!(" Food ".parse::<Category>().unwrap(), Category::Food);
        assert!("rent".parse::<Category>().is_err());
    }

    #[test]
    fn test_record_named_access() {
        let mut record = MonthlyRecord::new("March").with(Category::Gas, 42.5);
        assert_eq!(record.get(Category::Gas), Some(42.5));
        assert_eq!(record.gas, Some(42.5));
        assert_eq!(record.get(Category::Food), None);

        record.set(Category::Gas, None);
        assert!(record.require(Category::Gas).is_err());
    }

    #[test]
    fn test_require_reports_field_and_month() {
        let record = MonthlyRecord::new("May");
        let err = record.require(Category::Offer).unwrap_err();
        match err {
            Error::MissingField { month, field } => {
                assert_eq!(month, "May");
                assert_eq!(field, "offer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dataset_rejects_duplicates() {
        let result = Dataset::new(vec![
            MonthlyRecord::new("January"),
            MonthlyRecord::new("February"),
            MonthlyRecord::new("January"),
        ]);
        assert!(matches!(result, Err(Error::DuplicateMonth(m)) if m == "January"));
    }

    #[test]
    fn test_dataset_duplicates_ignore_surrounding_whitespace() {
        let result = Dataset::new(vec![MonthlyRecord::new("May"), MonthlyRecord::new("May ")]);
        assert!(matches!(result, Err(Error::DuplicateMonth(m)) if m == "May"));
    }

    #[test]
    fn test_dataset_stores_trimmed_months() {
        let dataset = Dataset::new(vec![
            MonthlyRecord::new(" April"),
            MonthlyRecord::new("May\t"),
        ])
        .unwrap();
        assert_eq!(dataset.months(), vec!["April", "May"]);
        assert_eq!(dataset.position("May"), Some(1));
    }

    #[test]
    fn test_dataset_rejects_empty_month() {
        let result = Dataset::new(vec![MonthlyRecord::new("  ")]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_dataset_positions() {
        let dataset = Dataset::new(vec![
            MonthlyRecord::new("January"),
            MonthlyRecord::new("February"),
        ])
        .unwrap();
        assert_eq!(dataset.months(), vec!["January", "February"]);
        assert_eq!(dataset.position("February"), Some(1));
        assert_eq!(dataset.position("March"), None);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Dataset::new(vec![MonthlyRecord::new("June").with(Category::Food, 10.0)]).unwrap();
        let b = Dataset::new(vec![MonthlyRecord::new("June").with(Category::Food, 10.0)]).unwrap();
        let c = Dataset::new(vec![MonthlyRecord::new("June").with(Category::Food, 11.0)]).unwrap();
        // Zero and empty must not collide
        let d = Dataset::new(vec![MonthlyRecord::new("June").with(Category::Food, 0.0)]).unwrap();
        let e = Dataset::new(vec![MonthlyRecord::new("June")]).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_ne!(d.fingerprint(), e.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_direction_serializes_as_presentation_state() {
        assert_eq!(serde_json::to_string(&Direction::Flat).unwrap(), "\"off\"");
        assert_eq!(
            serde_json::to_string(&Direction::Inverse).unwrap(),
            "\"inverse\""
        );
        assert_eq!(Direction::Normal.to_string(), "normal");
    }
}
