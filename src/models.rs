use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::artifact::Label;

// ============ Feature Schema ============

/// Semantic type of a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Opaque identifier, passed to the model verbatim.
    Categorical,
    /// Finite floating-point number.
    Decimal,
}

/// The 18 feature columns in the exact order and spelling the model was fit against.
pub const FEATURE_SCHEMA: [(&str, FieldKind); 18] = [
    ("LanguageCode", FieldKind::Categorical),
    ("HomeOwnershipType", FieldKind::Categorical),
    ("Restructured", FieldKind::Categorical),
    ("IncomeTotal", FieldKind::Decimal),
    ("LiabilitiesTotal", FieldKind::Decimal),
    ("LoanDuration", FieldKind::Decimal),
    ("AppliedAmount", FieldKind::Decimal),
    ("Amount", FieldKind::Decimal),
    ("Interest", FieldKind::Decimal),
    ("EMI", FieldKind::Decimal),
    ("PreviousRepaymentsBeforeLoan", FieldKind::Decimal),
    ("MonthlyPaymentDay", FieldKind::Decimal),
    ("PrincipalPaymentsMade", FieldKind::Decimal),
    ("InterestAndPenaltyPaymentsMade", FieldKind::Decimal),
    ("PrincipalBalance", FieldKind::Decimal),
    ("InterestAndPenaltyBalance", FieldKind::Decimal),
    ("Bids", FieldKind::Decimal),
    ("Rating", FieldKind::Categorical),
];

/// Column names only, same order as [`FEATURE_SCHEMA`].
pub const FEATURE_NAMES: [&str; 18] = [
    "LanguageCode",
    "HomeOwnershipType",
    "Restructured",
    "IncomeTotal",
    "LiabilitiesTotal",
    "LoanDuration",
    "AppliedAmount",
    "Amount",
    "Interest",
    "EMI",
    "PreviousRepaymentsBeforeLoan",
    "MonthlyPaymentDay",
    "PrincipalPaymentsMade",
    "InterestAndPenaltyPaymentsMade",
    "PrincipalBalance",
    "InterestAndPenaltyBalance",
    "Bids",
    "Rating",
];

/// Looks up the declared kind of a feature column.
pub fn field_kind(name: &str) -> Option<FieldKind> {
    FEATURE_SCHEMA
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, kind)| *kind)
}

// ============ Feature Record ============

/// An opaque categorical value.
///
/// No whitelist is applied: unseen categories are forwarded to the model,
/// which decides how to treat them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoricalToken(String);

impl CategoricalToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CategoricalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One loan application submitted for a decision.
///
/// Constructed fresh for every request (see [`crate::validation`]) and
/// consumed by [`InferenceService::classify`](crate::services::InferenceService::classify).
/// Fields are independent of each other; no domain plausibility checks apply.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[schema(example = json!({
    "LanguageCode": "EN",
    "HomeOwnershipType": "OWNER",
    "Restructured": "0",
    "IncomeTotal": 2500.0,
    "LiabilitiesTotal": 500.0,
    "LoanDuration": 12,
    "AppliedAmount": 1000.0,
    "Amount": 1000.0,
    "Interest": 0.2,
    "EMI": 90.0,
    "PreviousRepaymentsBeforeLoan": 0.0,
    "MonthlyPaymentDay": 5,
    "PrincipalPaymentsMade": 0.0,
    "InterestAndPenaltyPaymentsMade": 0.0,
    "PrincipalBalance": 1000.0,
    "InterestAndPenaltyBalance": 0.0,
    "Bids": 3,
    "Rating": "A"
}))]
pub struct LoanApplication {
    #[schema(value_type = String)]
    pub language_code: CategoricalToken,
    #[schema(value_type = String)]
    pub home_ownership_type: CategoricalToken,
    /// Restructuring flag, kept as a token rather than a boolean.
    #[schema(value_type = String)]
    pub restructured: CategoricalToken,
    pub income_total: f64,
    pub liabilities_total: f64,
    pub loan_duration: f64,
    pub applied_amount: f64,
    /// Amount granted.
    pub amount: f64,
    pub interest: f64,
    /// Periodic installment.
    #[serde(rename = "EMI")]
    pub emi: f64,
    pub previous_repayments_before_loan: f64,
    pub monthly_payment_day: f64,
    pub principal_payments_made: f64,
    pub interest_and_penalty_payments_made: f64,
    pub principal_balance: f64,
    pub interest_and_penalty_balance: f64,
    pub bids: f64,
    /// Credit rating identifier.
    #[schema(value_type = String)]
    pub rating: CategoricalToken,
}

// ============ Decision ============

/// Binary outcome rendered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Decision {
    #[serde(rename = "Not Defaulted")]
    NotDefaulted,
    #[serde(rename = "Defaulted")]
    Defaulted,
}

impl Decision {
    /// Maps a raw model label to a decision.
    ///
    /// Only the literal label `0` means "not defaulted"; every other value,
    /// including labels outside `{0, 1}`, is treated as a default signal.
    pub fn from_label(label: Label) -> Self {
        if label == 0 {
            Decision::NotDefaulted
        } else {
            Decision::Defaulted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::NotDefaulted => "Not Defaulted",
            Decision::Defaulted => "Defaulted",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ API Responses ============

/// Response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PredictionResponse {
    #[serde(rename = "Prediction")]
    pub prediction: Decision,
}

impl From<Decision> for PredictionResponse {
    fn from(prediction: Decision) -> Self {
        Self { prediction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_schema_order() {
        let from_schema: Vec<&str> = FEATURE_SCHEMA.iter().map(|(name, _)| *name).collect();
        assert_eq!(from_schema, FEATURE_NAMES.to_vec());
    }

    #[test]
    fn only_zero_is_not_defaulted() {
        assert_eq!(Decision::from_label(0), Decision::NotDefaulted);
        assert_eq!(Decision::from_label(1), Decision::Defaulted);
        assert_eq!(Decision::from_label(2), Decision::Defaulted);
        assert_eq!(Decision::from_label(-1), Decision::Defaulted);
    }

    #[test]
    fn prediction_response_wire_shape() {
        let body = serde_json::to_value(PredictionResponse::from(Decision::NotDefaulted)).unwrap();
        assert_eq!(body, serde_json::json!({"Prediction": "Not Defaulted"}));

        let body = serde_json::to_value(PredictionResponse::from(Decision::Defaulted)).unwrap();
        assert_eq!(body, serde_json::json!({"Prediction": "Defaulted"}));
    }

    #[test]
    fn field_kind_lookup() {
        assert_eq!(field_kind("EMI"), Some(FieldKind::Decimal));
        assert_eq!(field_kind("Rating"), Some(FieldKind::Categorical));
        assert_eq!(field_kind("emi"), None);
    }
}
