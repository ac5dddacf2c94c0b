//! `$filter` expressions for the data API.
//!
//! Filters are built from field/operator/value triples and turned into text by
//! [`Filter::render`] only. Text values are always emitted as quoted literals,
//! so caller input can never extend the expression.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::dates;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    DateTime(NaiveDateTime),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(value: NaiveDateTime) -> Self {
        FilterValue::DateTime(value)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            FilterValue::Integer(n) => write!(f, "{}", n),
            FilterValue::DateTime(dt) => f.write_str(&dates::format_cutoff(dt)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gt,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Gt => "gt",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        field: &'static str,
        op: Op,
        value: FilterValue,
    },
    Group(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<FilterValue>) -> Self {
        Filter::Compare { field, op: Op::Eq, value: value.into() }
    }

    pub fn gt(field: &'static str, value: impl Into<FilterValue>) -> Self {
        Filter::Compare { field, op: Op::Gt, value: value.into() }
    }

    /// Appends `other` with `and`, without adding parentheses around either side.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut clauses) => {
                clauses.push(other);
                Filter::And(clauses)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn grouped(self) -> Self {
        Filter::Group(Box::new(self))
    }

    /// `(field eq 'a') or (field eq 'b') ...`; `None` when there are no values.
    pub fn any_of<I, V>(field: &'static str, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        let clauses: Vec<Filter> = values
            .into_iter()
            .map(|v| Filter::eq(field, v).grouped())
            .collect();

        if clauses.is_empty() {
            None
        } else {
            Some(Filter::Or(clauses))
        }
    }

    pub fn render(&self) -> String {
        match self {
            Filter::Compare { field, op, value } => format!("{} {} {}", field, op.as_str(), value),
            Filter::Group(inner) => format!("({})", inner.render()),
            Filter::And(clauses) => join(clauses, " and "),
            Filter::Or(clauses) => join(clauses, " or "),
        }
    }
}

fn join(clauses: &[Filter], separator: &str) -> String {
    clauses
        .iter()
        .map(Filter::render)
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// How the course disjunction is combined with the time condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPrecedence {
    /// `((A) or (B)) and C`
    #[default]
    Grouped,
    /// `(A) or (B) and C`. The backend binds `and` tighter, so only the last
    /// course clause is time-filtered.
    Flat,
}

impl FromStr for FilterPrecedence {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grouped" => Ok(FilterPrecedence::Grouped),
            "flat" => Ok(FilterPrecedence::Flat),
            other => Err(AppError::Config(format!(
                "FILTER_PRECEDENCE must be 'grouped' or 'flat', got '{}'",
                other
            ))),
        }
    }
}

/// Upcoming schedules for a set of course codes.
pub fn upcoming_schedules_filter(
    course_codes: &[String],
    cutoff: NaiveDateTime,
    precedence: FilterPrecedence,
) -> Option<Filter> {
    let courses = Filter::any_of("course_code", course_codes.iter().cloned())?;
    let after_cutoff = Filter::gt("session_start", cutoff);

    let filter = match precedence {
        FilterPrecedence::Grouped => courses.grouped().and(after_cutoff),
        FilterPrecedence::Flat => {
            if course_codes.len() > 1 {
                warn!(
                    "flat filter precedence: only course '{}' is limited to upcoming sessions",
                    course_codes[course_codes.len() - 1]
                );
            }
            courses.and(after_cutoff)
        }
    };
    Some(filter)
}

pub fn class_schedules_filter(class: &str, cutoff: NaiveDateTime) -> Filter {
    Filter::eq("class", class).and(Filter::gt("session_start", cutoff))
}
