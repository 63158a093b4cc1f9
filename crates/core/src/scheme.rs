//! Scheme record data model.
//!
//! A scheme record describes one government welfare program. Records are
//! written by the seeding process and are read-only everywhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A stored welfare scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeRecord {
    /// Store-assigned identifier, increasing in insertion order
    pub id: i64,

    /// Scheme name (trimmed)
    pub name: String,

    /// Category such as health or agriculture (trimmed)
    pub category: String,

    /// Who may apply
    pub eligibility: String,

    /// What the scheme provides
    pub benefits: String,

    /// Application procedure
    #[serde(rename = "howToApply")]
    pub how_to_apply: String,

    /// Free-text tag list used to bias matching
    pub keywords: String,

    /// Pre-written summary in the target output language
    #[serde(rename = "localizedSummary")]
    pub localized_summary: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl SchemeRecord {
    /// Borrow the text of one matchable field.
    pub fn field(&self, field: SchemeField) -> &str {
        match field {
            SchemeField::Name => &self.name,
            SchemeField::Category => &self.category,
            SchemeField::Eligibility => &self.eligibility,
            SchemeField::Benefits => &self.benefits,
            SchemeField::HowToApply => &self.how_to_apply,
            SchemeField::Keywords => &self.keywords,
        }
    }

    /// Whether this record carries enough text to ground an answer.
    pub fn is_groundable(&self) -> bool {
        !self.localized_summary.trim().is_empty()
    }
}

/// A scheme as supplied by the seeding process, before the store assigns
/// an id and timestamps.
///
/// Field aliases accept the snake_case names used by older seed files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScheme {
    #[serde(alias = "scheme_name")]
    pub name: String,

    pub category: String,

    pub eligibility: String,

    pub benefits: String,

    #[serde(rename = "howToApply", alias = "how_to_apply")]
    pub how_to_apply: String,

    pub keywords: String,

    #[serde(rename = "localizedSummary", alias = "localized_summary")]
    pub localized_summary: String,
}

impl NewScheme {
    /// Trim the name and category and check that every text field is
    /// non-empty.
    pub fn validated(mut self) -> AppResult<Self> {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();

        let required = [
            ("name", &self.name),
            ("category", &self.category),
            ("eligibility", &self.eligibility),
            ("benefits", &self.benefits),
            ("howToApply", &self.how_to_apply),
            ("keywords", &self.keywords),
            ("localizedSummary", &self.localized_summary),
        ];

        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "Scheme field '{}' cannot be empty",
                    label
                )));
            }
        }

        Ok(self)
    }
}

/// A text field of a scheme that retrieval can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemeField {
    Name,
    Category,
    Eligibility,
    Benefits,
    HowToApply,
    Keywords,
}

impl SchemeField {
    /// Storage column holding this field.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Eligibility => "eligibility",
            Self::Benefits => "benefits",
            Self::HowToApply => "how_to_apply",
            Self::Keywords => "keywords",
        }
    }
}

/// Which fields a query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Keywords, name, category, eligibility and benefits
    #[default]
    Extended,

    /// Keywords, name and category only
    Legacy,
}

impl MatchPolicy {
    /// The field set searched under this policy.
    pub fn fields(&self) -> &'static [SchemeField] {
        match self {
            Self::Extended => &[
                SchemeField::Keywords,
                SchemeField::Name,
                SchemeField::Category,
                SchemeField::Eligibility,
                SchemeField::Benefits,
            ],
            Self::Legacy => &[
                SchemeField::Keywords,
                SchemeField::Name,
                SchemeField::Category,
            ],
        }
    }

    /// Parse a policy name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "extended" => Some(Self::Extended),
            "legacy" | "minimal" => Some(Self::Legacy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_dhan() -> NewScheme {
        NewScheme {
            name: "  प्रधानमंत्री जन धन योजना ".to_string(),
            category: "वित्तीय समावेशन\n".to_string(),
            eligibility: "भारत का कोई भी नागरिक जिसके पास बैंक खाता नहीं है".to_string(),
            benefits: "मुफ्त बैंक खाता, डेबिट कार्ड".to_string(),
            how_to_apply: "नजदीकी बैंक शाखा में आवेदन करें".to_string(),
            keywords: "बैंक खाता, जन धन".to_string(),
            localized_summary: "जन धन योजना बैंकिंग सेवाएं प्रदान करती है।".to_string(),
        }
    }

    #[test]
    fn test_validated_trims_name_and_category() {
        let scheme = jan_dhan().validated().unwrap();
        assert_eq!(scheme.name, "प्रधानमंत्री जन धन योजना");
        assert_eq!(scheme.category, "वित्तीय समावेशन");
    }

    #[test]
    fn test_validated_rejects_blank_summary() {
        let mut scheme = jan_dhan();
        scheme.localized_summary = "   ".to_string();

        let err = scheme.validated().unwrap_err();
        assert!(err.to_string().contains("localizedSummary"));
    }

    #[test]
    fn test_legacy_policy_is_subset_of_extended() {
        let extended = MatchPolicy::Extended.fields();
        for field in MatchPolicy::Legacy.fields() {
            assert!(extended.contains(field));
        }
        assert!(!MatchPolicy::Legacy.fields().contains(&SchemeField::Eligibility));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(MatchPolicy::parse("Extended"), Some(MatchPolicy::Extended));
        assert_eq!(MatchPolicy::parse("minimal"), Some(MatchPolicy::Legacy));
        assert_eq!(MatchPolicy::parse("ranked"), None);
    }

    #[test]
    fn test_new_scheme_accepts_snake_case_aliases() {
        let json = serde_json::json!({
            "scheme_name": "आयुष्मान भारत योजना",
            "category": "स्वास्थ्य",
            "eligibility": "गरीब और कमजोर परिवार",
            "benefits": "5 लाख रुपये तक का मुफ्त इलाज",
            "how_to_apply": "CSC केंद्र में कार्ड बनवाएं",
            "keywords": "स्वास्थ्य बीमा",
            "localized_summary": "सबसे बड़ी स्वास्थ्य बीमा योजना"
        });

        let scheme: NewScheme = serde_json::from_value(json).unwrap();
        assert_eq!(scheme.name, "आयुष्मान भारत योजना");
        assert_eq!(scheme.how_to_apply, "CSC केंद्र में कार्ड बनवाएं");
    }
}
