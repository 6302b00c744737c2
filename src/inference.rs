//! Column type inference.
//!
//! Every non-blank cell is tested against every candidate parse rule once;
//! the per-type match counts then decide the column type. Candidates are
//! considered strictest first (see [`ColumnType::PRECEDENCE`]) and the first
//! one whose share of matching cells reaches the acceptance ratio wins.
//! With a ratio of 1.0 this is the strict "every value must parse" rule;
//! below 1.0 a few outliers keep the column's type and surface as
//! mismatches in the consistency report instead.

use crate::{
    data::{self, boolean_token, is_boolean_word},
    loader::RawTable,
    schema::{ColumnProfile, ColumnType, Schema},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCandidate {
    non_empty: usize,
    boolean_matches: usize,
    boolean_words: usize,
    timestamp_matches: usize,
    date_matches: usize,
    integer_matches: usize,
    float_matches: usize,
}

impl TypeCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut candidate = Self::new();
        for value in values {
            candidate.update(value);
        }
        candidate
    }

    pub fn update(&mut self, value: &str) {
        if data::is_blank(value) {
            return;
        }
        self.non_empty += 1;
        if boolean_token(value).is_some() {
            self.boolean_matches += 1;
            if is_boolean_word(value) {
                self.boolean_words += 1;
            }
        }
        if data::parse_naive_datetime(value).is_ok() {
            self.timestamp_matches += 1;
        } else if data::parse_naive_date(value).is_ok() {
            self.date_matches += 1;
        }
        if data::parse_integer(value).is_ok() {
            self.integer_matches += 1;
        }
        if data::parse_float(value).is_ok() {
            self.float_matches += 1;
        }
    }

    pub fn non_empty(&self) -> usize {
        self.non_empty
    }

    pub fn matches(&self, ty: ColumnType) -> usize {
        match ty {
            // 0/1-only columns are numeric, not flags.
            ColumnType::Boolean if self.boolean_words == 0 => 0,
            ColumnType::Boolean => self.boolean_matches,
            ColumnType::Timestamp => self.timestamp_matches,
            ColumnType::Date => self.date_matches,
            ColumnType::Int => self.integer_matches,
            ColumnType::Float => self.float_matches,
            ColumnType::Str => self.non_empty,
        }
    }

    pub fn ratio(&self, ty: ColumnType) -> f64 {
        if self.non_empty == 0 {
            1.0
        } else {
            self.matches(ty) as f64 / self.non_empty as f64
        }
    }

    pub fn decide(&self, acceptance_ratio: f64) -> ColumnType {
        if self.non_empty == 0 {
            return ColumnType::Str;
        }
        ColumnType::PRECEDENCE
            .into_iter()
            .find(|ty| self.matches(*ty) > 0 && self.ratio(*ty) >= acceptance_ratio)
            .unwrap_or(ColumnType::Str)
    }
}

pub fn infer_column_type<'a, I>(values: I, acceptance_ratio: f64) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    TypeCandidate::from_values(values).decide(acceptance_ratio)
}

/// One profile per header cell, in header order.
pub fn infer_schema(table: &RawTable, acceptance_ratio: f64) -> Schema {
    let columns = table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let ty = infer_column_type(table.column_values(idx), acceptance_ratio);
            ColumnProfile::new(header.clone(), ty)
        })
        .collect();
    Schema { columns }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT: f64 = 1.0;
    const DEFAULT: f64 = 0.90;

    #[test]
    fn precedence_prefers_strictest_full_match() {
        assert_eq!(infer_column_type(["1", "2"], STRICT), ColumnType::Int);
        assert_eq!(infer_column_type(["10.5", "20"], STRICT), ColumnType::Float);
        assert_eq!(
            infer_column_type(["2024-01-01", "2024/01/02"], STRICT),
            ColumnType::Date
        );
        assert_eq!(
            infer_column_type(["2024-01-01 10:00:00", "2024-01-02T11:30"], STRICT),
            ColumnType::Timestamp
        );
        assert_eq!(
            infer_column_type(["Yes", "no", "1"], STRICT),
            ColumnType::Boolean
        );
    }

    #[test]
    fn zero_one_columns_stay_numeric() {
        assert_eq!(infer_column_type(["0", "1", "1"], STRICT), ColumnType::Int);
    }

    #[test]
    fn dates_mixed_with_timestamps_fall_through() {
        assert_eq!(
            infer_column_type(["2024-01-01", "2024-01-01 10:00"], STRICT),
            ColumnType::Str
        );
    }

    #[test]
    fn blanks_do_not_vote() {
        assert_eq!(infer_column_type(["", "  ", "7"], STRICT), ColumnType::Int);
        assert_eq!(infer_column_type(["", ""], STRICT), ColumnType::Str);
        assert_eq!(
            infer_column_type(std::iter::empty::<&str>(), DEFAULT),
            ColumnType::Str
        );
    }

    #[test]
    fn acceptance_ratio_controls_outlier_tolerance() {
        let mut values = vec!["12"; 99];
        values.push("n/a");
        assert_eq!(infer_column_type(values.clone(), DEFAULT), ColumnType::Int);
        assert_eq!(infer_column_type(values, STRICT), ColumnType::Str);
        assert_eq!(infer_column_type(["5", "5", "abc"], DEFAULT), ColumnType::Str);
    }

    #[test]
    fn candidate_ratios_cover_every_type() {
        let candidate = TypeCandidate::from_values(["1", "2.5", "x", ""]);
        assert_eq!(candidate.non_empty(), 3);
        assert_eq!(candidate.matches(ColumnType::Int), 1);
        assert_eq!(candidate.matches(ColumnType::Float), 2);
        assert_eq!(candidate.ratio(ColumnType::Str), 1.0);
        assert_eq!(TypeCandidate::new().ratio(ColumnType::Int), 1.0);
    }
}
