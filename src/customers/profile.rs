//! Customer profile consumed by the response prompt.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// One policyholder row from the customer CSV.
///
/// Field names follow the CSV column headers. Numeric columns are optional
/// and lenient: blank cells, `N/A` and other unparseable values load as
/// `None`, and whole-valued floats such as `42.0` are accepted for counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Gender", default)]
    pub gender: String,
    #[serde(rename = "Age", default, deserialize_with = "lenient_count")]
    pub age: Option<u32>,
    #[serde(rename = "Region", default)]
    pub region: String,
    #[serde(rename = "Occupation", default)]
    pub occupation: String,
    #[serde(rename = "Policy Number", default)]
    pub policy_number: String,
    #[serde(rename = "Policy Start Date", default)]
    pub policy_start_date: String,
    #[serde(rename = "Policy Expiry Date", default)]
    pub policy_expiry_date: String,
    #[serde(rename = "Premium Type", default)]
    pub premium_type: String,
    #[serde(rename = "Product Type", default)]
    pub product_type: String,
    #[serde(rename = "Satisfaction Score", default, deserialize_with = "lenient_number")]
    pub satisfaction_score: Option<f64>,
    #[serde(rename = "Number of Late Payments", default, deserialize_with = "lenient_count")]
    pub late_payments: Option<u32>,
    #[serde(rename = "Preferred Communication Channel", default)]
    pub preferred_communication: String,
    #[serde(rename = "Number of Customer Service Interactions", default, deserialize_with = "lenient_count")]
    pub customer_service_interactions: Option<u32>,
    #[serde(rename = "Number of Claims Filed", default, deserialize_with = "lenient_count")]
    pub claims_filed: Option<u32>,
    #[serde(rename = "Total Claim Amount", default, deserialize_with = "lenient_number")]
    pub total_claim_amount: Option<f64>,
    #[serde(rename = "Claim Frequency", default, deserialize_with = "lenient_number")]
    pub claim_frequency: Option<f64>,
    #[serde(rename = "Credit Score", default, deserialize_with = "lenient_number")]
    pub credit_score: Option<f64>,
    #[serde(rename = "Debt-to-Income Ratio", default, deserialize_with = "lenient_number")]
    pub debt_to_income_ratio: Option<f64>,
}

/// Accepts any scalar cell and hands back its text, `None` when empty.
struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar cell")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let v = v.trim();
        Ok((!v.is_empty()).then(|| v.to_string()))
    }
}

fn raw_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    deserializer.deserialize_option(CellVisitor)
}

fn parse_count(raw: &str) -> Option<u32> {
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    let n = raw.parse::<f64>().ok()?;
    (n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn lenient<'de, D, T>(deserializer: D, parse: fn(&str) -> Option<T>) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = raw_cell(deserializer)? else {
        return Ok(None);
    };
    let parsed = parse(&raw);
    if parsed.is_none() {
        tracing::warn!(value = %raw, "Ignoring non-numeric customer cell");
    }
    Ok(parsed)
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    lenient(deserializer, parse_count)
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    lenient(deserializer, parse_number)
}

fn or_unknown<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "unknown".to_string(),
    }
}

fn text_or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

impl CustomerProfile {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    /// "First Last", used wherever the original addressed the professional.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Render the profile as the bullet list interpolated into the prompt.
    pub fn to_prompt_section(&self) -> String {
        let rows: [(&str, String); 20] = [
            ("First Name", text_or_unknown(&self.first_name).to_string()),
            ("Last Name", text_or_unknown(&self.last_name).to_string()),
            ("Gender", text_or_unknown(&self.gender).to_string()),
            ("Age", or_unknown(&self.age)),
            ("Region", text_or_unknown(&self.region).to_string()),
            ("Occupation", text_or_unknown(&self.occupation).to_string()),
            ("Policy Number", text_or_unknown(&self.policy_number).to_string()),
            (
                "Policy Start Date",
                text_or_unknown(&self.policy_start_date).to_string(),
            ),
            (
                "Policy Expiry Date",
                text_or_unknown(&self.policy_expiry_date).to_string(),
            ),
            ("Premium Type", text_or_unknown(&self.premium_type).to_string()),
            ("Product Type", text_or_unknown(&self.product_type).to_string()),
            ("Satisfaction Score", or_unknown(&self.satisfaction_score)),
            ("Number of Late Payments", or_unknown(&self.late_payments)),
            (
                "Preferred Communication Channel",
                text_or_unknown(&self.preferred_communication).to_string(),
            ),
            (
                "Number of Customer Service Interactions",
                or_unknown(&self.customer_service_interactions),
            ),
            ("Number of Claims Filed", or_unknown(&self.claims_filed)),
            ("Total Claim Amount", or_unknown(&self.total_claim_amount)),
            ("Claim Frequency", or_unknown(&self.claim_frequency)),
            ("Credit Score", or_unknown(&self.credit_score)),
            ("Debt-to-Income Ratio", or_unknown(&self.debt_to_income_ratio)),
        ];

        rows.iter()
            .map(|(label, value)| format!("- {label}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_and_trims() {
        let profile = CustomerProfile::new(" Jane", "Doe ");
        assert_eq!(profile.full_name(), "Jane Doe");
        assert_eq!(CustomerProfile::new("Cher", "").full_name(), "Cher");
    }

    #[test]
    fn prompt_section_lists_every_field() {
        let profile = CustomerProfile {
            age: Some(42),
            total_claim_amount: Some(1250.5),
            region: "North".into(),
            ..CustomerProfile::new("Jane", "Doe")
        };
        let section = profile.to_prompt_section();
        assert_eq!(section.lines().count(), 20);
        assert!(section.contains("- First Name: Jane"));
        assert!(section.contains("- Age: 42"));
        assert!(section.contains("- Total Claim Amount: 1250.5"));
        assert!(section.contains("- Region: North"));
    }

    #[test]
    fn missing_values_render_as_unknown() {
        let section = CustomerProfile::new("Jane", "Doe").to_prompt_section();
        assert!(section.contains("- Credit Score: unknown"));
        assert!(section.contains("- Occupation: unknown"));
    }

    #[test]
    fn counts_accept_whole_floats_only() {
        assert_eq!(parse_count("42"), Some(42));
        assert_eq!(parse_count("42.0"), Some(42));
        assert_eq!(parse_count("42.5"), None);
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("N/A"), None);
    }

    #[test]
    fn numbers_reject_text_and_non_finite() {
        assert_eq!(parse_number("0.35"), Some(0.35));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("N/A"), None);
    }

    #[test]
    fn json_profiles_accept_numbers_and_strings() {
        let profile: CustomerProfile = serde_json::from_value(serde_json::json!({
            "First Name": "Jane",
            "Last Name": "Doe",
            "Age": 42,
            "Credit Score": "710",
            "Claim Frequency": null,
            "Number of Late Payments": "unknown",
        }))
        .unwrap();
        assert_eq!(profile.age, Some(42));
        assert_eq!(profile.credit_score, Some(710.0));
        assert_eq!(profile.claim_frequency, None);
        assert_eq!(profile.late_payments, None);
    }

    #[test]
    fn serializes_with_csv_column_names() {
        let json = serde_json::to_value(CustomerProfile::new("Jane", "Doe")).unwrap();
        assert_eq!(json["First Name"], "Jane");
        assert_eq!(json["Debt-to-Income Ratio"], serde_json::Value::Null);
    }
}
