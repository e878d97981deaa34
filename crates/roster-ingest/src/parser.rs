//! CSV user record parsing
//!
//! A source body is a CSV document whose first row must be exactly
//! `fname, lname, age`. Every later row is trimmed and validated; rows that fail
//! validation are counted as skipped instead of failing the source.

use serde::Serialize;

use crate::error::FetchError;

/// Header row, with its cells joined by `,`, that every source must start with
pub const EXPECTED_HEADER: &str = "fname, lname, age";

/// One validated user row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
}

impl User {
    /// Build a user from already-trimmed cells, rejecting empty names and age 0
    pub fn new(first_name: &str, last_name: &str, age: i64) -> Option<Self> {
        if first_name.is_empty() || last_name.is_empty() || age == 0 {
            return None;
        }
        Some(Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
        })
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.first_name, self.last_name, self.age)
    }
}

/// Users parsed from one source plus the number of rows that were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordBatch {
    pub users: Vec<User>,
    pub skipped: usize,
}

/// Parse a CSV body into a batch of users.
///
/// Fails with a fatal error when the CSV itself is malformed (including rows with a
/// different cell count than the header) or when the header does not match.
pub fn parse_records(data: &[u8]) -> Result<RecordBatch, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::None)
        .from_reader(data);

    let mut rows = reader.records();

    let header = rows.next().ok_or(FetchError::MissingHeader)??;
    let found = header.iter().collect::<Vec<_>>().join(",");
    if found != EXPECTED_HEADER {
        return Err(FetchError::InvalidHeader { found });
    }

    let mut batch = RecordBatch::default();
    for row in rows {
        let row = row?;
        let (first, last, age) = row.deserialize::<(&str, &str, &str)>(None)?;
        match parse_row(first, last, age) {
            Some(user) => batch.users.push(user),
            None => batch.skipped += 1,
        }
    }

    Ok(batch)
}

fn parse_row(first: &str, last: &str, age: &str) -> Option<User> {
    let age = age.trim().parse::<i64>().ok()?;
    User::new(first.trim(), last.trim(), age)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_valid_rows() {
        let data = b"fname, lname, age\n  Ada , Lovelace , 36 \nAlan,Turing,41\n";
        let batch = parse_records(data).unwrap();

        assert_eq!(batch.skipped, 0);
        assert_eq!(
            batch.users,
            vec![
                User::new("Ada", "Lovelace", 36).unwrap(),
                User::new("Alan", "Turing", 41).unwrap(),
            ]
        );
    }

    #[test]
    fn test_non_numeric_age_is_skipped() {
        let data = b"fname, lname, age\nAda,Lovelace,thirty\nAlan,Turing,41\n";
        let batch = parse_records(data).unwrap();

        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.users.len(), 1);
        assert_eq!(batch.users[0].first_name, "Alan");
    }

    #[test]
    fn test_empty_names_and_zero_age_are_skipped() {
        let data = b"fname, lname, age\n,Lovelace,36\nAda, ,36\nAda,Lovelace,0\nGrace,Hopper,85\n";
        let batch = parse_records(data).unwrap();

        assert_eq!(batch.skipped, 3);
        assert_eq!(batch.users, vec![User::new("Grace", "Hopper", 85).unwrap()]);
    }

    #[test]
    fn test_malformed_header_is_fatal() {
        let err = parse_records(b"a,b,c\nAda,Lovelace,36\n").unwrap_err();

        assert_eq!(err, FetchError::InvalidHeader { found: "a,b,c".into() });
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_header_spacing_must_match_exactly() {
        let err = parse_records(b"fname,lname,age\n").unwrap_err();
        assert!(matches!(err, FetchError::InvalidHeader { .. }));
    }

    #[test]
    fn test_empty_body_is_fatal() {
        assert_eq!(parse_records(b"").unwrap_err(), FetchError::MissingHeader);
    }

    #[test]
    fn test_header_only_yields_empty_batch() {
        let batch = parse_records(b"fname, lname, age\n").unwrap();
        assert_eq!(batch, RecordBatch::default());
    }

    #[test]
    fn test_uneven_row_is_fatal_csv_error() {
        let err = parse_records(b"fname, lname, age\nAda,Lovelace\n").unwrap_err();
        assert!(matches!(err, FetchError::Csv(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_short_row_fails_whole_source() {
        let err = parse_records(b"fname, lname, age\nAlan,Turing,41\nAda\nGrace,Hopper,85\n")
            .unwrap_err();
        assert!(matches!(err, FetchError::Csv(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_long_row_fails_whole_source() {
        let err = parse_records(b"fname, lname, age\nAda,Lovelace,36,extra\n").unwrap_err();
        assert!(matches!(err, FetchError::Csv(_)));
    }

    #[test]
    fn test_user_display() {
        let user = User::new("Ada", "Lovelace", 36).unwrap();
        assert_eq!(user.to_string(), "Ada Lovelace 36");
    }
}
