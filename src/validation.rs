//! Coercion of raw JSON request bodies into [`LoanApplication`] records.
//!
//! Categorical fields accept strings verbatim and render numbers or booleans
//! to their JSON text. Decimal fields accept JSON numbers, numeric strings and
//! booleans (`true` is 1, `false` is 0).
//! Every failing field is reported; unknown fields are ignored.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::errors::{FieldIssue, IssueReason, SchemaError};
use crate::models::{CategoricalToken, LoanApplication, FEATURE_NAMES};

/// Reads a categorical token, or `None` if the value has no token form.
pub fn categorical(value: &Value) -> Option<CategoricalToken> {
    match value {
        Value::String(s) => Some(CategoricalToken::new(s.as_str())),
        Value::Number(n) => Some(CategoricalToken::new(n.to_string())),
        Value::Bool(b) => Some(CategoricalToken::new(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Reads a finite decimal number, or `None` if the value cannot be coerced.
pub fn decimal(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;

    parsed.is_finite().then_some(parsed)
}

/// Collects field values from a JSON object, recording every failure.
struct FieldReader<'a> {
    body: &'a Map<String, Value>,
    issues: Vec<FieldIssue>,
}

impl<'a> FieldReader<'a> {
    fn new(body: &'a Map<String, Value>) -> Self {
        Self {
            body,
            issues: Vec::new(),
        }
    }

    fn fail(&mut self, field: &str, reason: IssueReason) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            reason,
        });
    }

    fn token(&mut self, field: &str) -> CategoricalToken {
        match self.body.get(field) {
            None => self.fail(field, IssueReason::Missing),
            Some(value) => match categorical(value) {
                Some(token) => return token,
                None => self.fail(field, IssueReason::NotCategorical),
            },
        }
        CategoricalToken::new(String::new())
    }

    fn number(&mut self, field: &str) -> f64 {
        match self.body.get(field) {
            None => self.fail(field, IssueReason::Missing),
            Some(value) => match decimal(value) {
                Some(number) => return number,
                None => self.fail(field, IssueReason::NotDecimal),
            },
        }
        0.0
    }

    fn finish(self, record: LoanApplication) -> Result<LoanApplication, SchemaError> {
        if self.issues.is_empty() {
            Ok(record)
        } else {
            Err(SchemaError {
                issues: self.issues,
            })
        }
    }
}

impl LoanApplication {
    /// Builds a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] listing every missing or uncoercible field,
    /// or a single `$` issue if `body` is not an object.
    pub fn from_json(body: &Value) -> Result<Self, SchemaError> {
        let Some(object) = body.as_object() else {
            return Err(SchemaError {
                issues: vec![FieldIssue {
                    field: "$".to_string(),
                    reason: IssueReason::NotAnObject,
                }],
            });
        };

        for key in object.keys() {
            if !FEATURE_NAMES.contains(&key.as_str()) {
                tracing::debug!("Ignoring unknown loan application field '{}'", key);
            }
        }

        let mut reader = FieldReader::new(object);
        let record = LoanApplication {
            language_code: reader.token("LanguageCode"),
            home_ownership_type: reader.token("HomeOwnershipType"),
            restructured: reader.token("Restructured"),
            income_total: reader.number("IncomeTotal"),
            liabilities_total: reader.number("LiabilitiesTotal"),
            loan_duration: reader.number("LoanDuration"),
            applied_amount: reader.number("AppliedAmount"),
            amount: reader.number("Amount"),
            interest: reader.number("Interest"),
            emi: reader.number("EMI"),
            previous_repayments_before_loan: reader.number("PreviousRepaymentsBeforeLoan"),
            monthly_payment_day: reader.number("MonthlyPaymentDay"),
            principal_payments_made: reader.number("PrincipalPaymentsMade"),
            interest_and_penalty_payments_made: reader.number("InterestAndPenaltyPaymentsMade"),
            principal_balance: reader.number("PrincipalBalance"),
            interest_and_penalty_balance: reader.number("InterestAndPenaltyBalance"),
            bids: reader.number("Bids"),
            rating: reader.token("Rating"),
        };

        reader.finish(record)
    }
}

impl TryFrom<Value> for LoanApplication {
    type Error = SchemaError;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        LoanApplication::from_json(&body)
    }
}

impl<'de> Deserialize<'de> for LoanApplication {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let body = Value::deserialize(deserializer)?;
        LoanApplication::from_json(&body).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
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
        })
    }

    #[test]
    fn accepts_complete_record() {
        let record = LoanApplication::from_json(&valid_body()).unwrap();
        assert_eq!(record.language_code.as_str(), "EN");
        assert_eq!(record.loan_duration, 12.0);
        assert_eq!(record.emi, 90.0);
        assert_eq!(record.rating.as_str(), "A");
    }

    #[test]
    fn reports_all_missing_fields_in_order() {
        let mut body = valid_body();
        let object = body.as_object_mut().unwrap();
        object.remove("Rating");
        object.remove("EMI");

        let err = LoanApplication::from_json(&body).unwrap_err();
        let fields: Vec<&str> = err.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["EMI", "Rating"]);
        assert!(err.issues.iter().all(|i| i.reason == IssueReason::Missing));
    }

    #[test]
    fn rejects_non_numeric_token_for_decimal() {
        let mut body = valid_body();
        body["IncomeTotal"] = json!("a lot");

        let err = LoanApplication::from_json(&body).unwrap_err();
        assert_eq!(
            err.issues,
            vec![FieldIssue {
                field: "IncomeTotal".to_string(),
                reason: IssueReason::NotDecimal,
            }]
        );
    }

    #[test]
    fn null_is_never_accepted() {
        let mut body = valid_body();
        body["Restructured"] = Value::Null;
        body["Bids"] = Value::Null;

        let err = LoanApplication::from_json(&body).unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert_eq!(err.issues[0].reason, IssueReason::NotCategorical);
        assert_eq!(err.issues[1].reason, IssueReason::NotDecimal);
    }

    #[test]
    fn numeric_strings_coerce_to_decimals() {
        let mut body = valid_body();
        body["Interest"] = json!(" 0.35 ");
        body["IncomeTotal"] = json!(-120.5);

        let record = LoanApplication::from_json(&body).unwrap();
        assert_eq!(record.interest, 0.35);
        assert_eq!(record.income_total, -120.5);
    }

    #[test]
    fn non_finite_strings_are_rejected() {
        assert_eq!(decimal(&json!("NaN")), None);
        assert_eq!(decimal(&json!("inf")), None);
        assert_eq!(decimal(&json!("1e3")), Some(1000.0));
    }

    #[test]
    fn booleans_coerce_to_decimals() {
        assert_eq!(decimal(&json!(true)), Some(1.0));
        assert_eq!(decimal(&json!(false)), Some(0.0));
    }

    #[test]
    fn out_of_range_numbers_are_not_decimals() {
        let body: Value = serde_json::from_str(r#"{"IncomeTotal": 1e400}"#).unwrap();
        assert_eq!(decimal(&body["IncomeTotal"]), None);
    }

    #[test]
    fn scalar_categoricals_render_as_json_text() {
        assert_eq!(categorical(&json!(0)).unwrap().as_str(), "0");
        assert_eq!(categorical(&json!(true)).unwrap().as_str(), "true");
        assert_eq!(categorical(&json!("HR")).unwrap().as_str(), "HR");
        assert!(categorical(&json!(["A"])).is_none());
        assert!(categorical(&json!({"code": "A"})).is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut body = valid_body();
        body["LoanId"] = json!("abc-123");
        assert!(LoanApplication::from_json(&body).is_ok());
    }

    #[test]
    fn non_object_body_is_a_single_issue() {
        let err = LoanApplication::from_json(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].field, "$");
        assert_eq!(err.issues[0].reason, IssueReason::NotAnObject);
    }

    #[test]
    fn deserialize_goes_through_validation() {
        let record: LoanApplication = serde_json::from_value(valid_body()).unwrap();
        assert_eq!(record.bids, 3.0);

        let err = serde_json::from_str::<LoanApplication>("{}").unwrap_err();
        assert!(err.to_string().contains("LanguageCode"));
    }
}
