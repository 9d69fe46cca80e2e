//! Tabular input handed to a classifier.

use crate::models::{LoanApplication, FEATURE_NAMES};

/// A single value in a feature frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Token(String),
    Number(f64),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            Cell::Token(t) => Some(t),
            Cell::Number(_) => None,
        }
    }
}

/// Named columns plus rows of cells, the shape the model was fit against.
///
/// Requests always produce a single row; the type itself does not restrict
/// the row count so classifiers can report malformed input instead of
/// assuming it away.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<&'static str>,
    rows: Vec<Vec<Cell>>,
}

impl FeatureFrame {
    pub fn new(columns: Vec<&'static str>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Builds the one-row frame for a loan application, columns in feature order.
    pub fn single(record: LoanApplication) -> Self {
        Self {
            columns: FEATURE_NAMES.to_vec(),
            rows: vec![record.into_cells().to_vec()],
        }
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `row` under the column called `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        let col = self.columns.iter().position(|c| *c == name)?;
        self.rows.get(row)?.get(col)
    }
}

impl LoanApplication {
    /// Flattens the record into cells ordered like [`FEATURE_NAMES`].
    pub fn into_cells(self) -> [Cell; 18] {
        [
            Cell::Token(self.language_code.into_inner()),
            Cell::Token(self.home_ownership_type.into_inner()),
            Cell::Token(self.restructured.into_inner()),
            Cell::Number(self.income_total),
            Cell::Number(self.liabilities_total),
            Cell::Number(self.loan_duration),
            Cell::Number(self.applied_amount),
            Cell::Number(self.amount),
            Cell::Number(self.interest),
            Cell::Number(self.emi),
            Cell::Number(self.previous_repayments_before_loan),
            Cell::Number(self.monthly_payment_day),
            Cell::Number(self.principal_payments_made),
            Cell::Number(self.interest_and_penalty_payments_made),
            Cell::Number(self.principal_balance),
            Cell::Number(self.interest_and_penalty_balance),
            Cell::Number(self.bids),
            Cell::Token(self.rating.into_inner()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{field_kind, FieldKind};
    use serde_json::json;

    /// Each numeric column holds its own position so misordering shows up.
    fn indexed_record() -> LoanApplication {
        LoanApplication::from_json(&json!({
            "LanguageCode": "lang",
            "HomeOwnershipType": "home",
            "Restructured": "restructured",
            "IncomeTotal": 3,
            "LiabilitiesTotal": 4,
            "LoanDuration": 5,
            "AppliedAmount": 6,
            "Amount": 7,
            "Interest": 8,
            "EMI": 9,
            "PreviousRepaymentsBeforeLoan": 10,
            "MonthlyPaymentDay": 11,
            "PrincipalPaymentsMade": 12,
            "InterestAndPenaltyPaymentsMade": 13,
            "PrincipalBalance": 14,
            "InterestAndPenaltyBalance": 15,
            "Bids": 16,
            "Rating": "rating"
        }))
        .unwrap()
    }

    #[test]
    fn single_row_with_all_columns_in_order() {
        let frame = FeatureFrame::single(indexed_record());
        assert_eq!(frame.columns(), &FEATURE_NAMES[..]);
        assert_eq!(frame.n_rows(), 1);

        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            let cell = frame.get(0, name).unwrap();
            match field_kind(name).unwrap() {
                FieldKind::Decimal => assert_eq!(cell.as_number(), Some(i as f64)),
                FieldKind::Categorical => assert!(cell.as_token().is_some()),
            }
        }
        assert_eq!(frame.get(0, "Rating").unwrap().as_token(), Some("rating"));
        assert_eq!(frame.get(0, "LanguageCode").unwrap().as_token(), Some("lang"));
    }

    #[test]
    fn unknown_column_or_row_is_none() {
        let frame = FeatureFrame::single(indexed_record());
        assert!(frame.get(0, "LoanId").is_none());
        assert!(frame.get(1, "Rating").is_none());
    }
}
