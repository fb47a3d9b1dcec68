// ********* Schema data structures ***********

use std::error::Error;
use std::fmt::Display;

/// Delimiter used when a multi-select answer is written to a single cell.
pub const MULTI_CHOICE_DELIMITER: &str = ", ";

/// The widget used to collect the answer to a question.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free text. Leading and trailing whitespace is dropped.
    Text,
    /// Exactly one of the options.
    ///
    /// `default` is the index preselected when the form is shown. When it is
    /// `None`, the question starts without a selection and counts as
    /// unanswered until one is made.
    SingleChoice {
        options: &'static [&'static str],
        default: Option<usize>,
    },
    /// Any number of the options, possibly none.
    MultiChoice { options: &'static [&'static str] },
    /// An integer in the closed range `min..=max`. A slider always holds a value.
    Slider { min: i64, max: i64, default: i64 },
}

/// A question of the form.
///
/// `column` is the exact header of the spreadsheet column the answer is written to.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Question {
    pub column: &'static str,
    pub prompt: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Question {
    /// The answer held by a freshly rendered form.
    pub fn default_answer(&self) -> Answer {
        match self.kind {
            FieldKind::Text => Answer::Text(String::new()),
            FieldKind::SingleChoice { options, default } => {
                Answer::Choice(default.and_then(|idx| options.get(idx)).map(|s| s.to_string()))
            }
            FieldKind::MultiChoice { .. } => Answer::Choices(Vec::new()),
            FieldKind::Slider { default, .. } => Answer::Scale(default),
        }
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self.kind {
            FieldKind::SingleChoice { options, .. } | FieldKind::MultiChoice { options } => {
                options
            }
            _ => &[],
        }
    }
}

// ********* Answers ***********

/// The current value of one form field.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Answer {
    Text(String),
    /// `None` is the "not yet chosen" sentinel.
    Choice(Option<String>),
    Choices(Vec<String>),
    Scale(i64),
}

impl Answer {
    /// True when the answer would be rejected for a required question.
    pub fn is_missing(&self) -> bool {
        match self {
            Answer::Text(s) => s.trim().is_empty(),
            Answer::Choice(c) => c.is_none(),
            Answer::Choices(cs) => cs.is_empty(),
            Answer::Scale(_) => false,
        }
    }

    pub fn to_cell(&self) -> CellValue {
        match self {
            Answer::Text(s) => CellValue::Text(s.trim().to_string()),
            Answer::Choice(Some(c)) => CellValue::Text(c.clone()),
            Answer::Choice(None) => CellValue::Empty,
            Answer::Choices(cs) if cs.is_empty() => CellValue::Empty,
            Answer::Choices(cs) => CellValue::Text(cs.join(MULTI_CHOICE_DELIMITER)),
            Answer::Scale(x) => CellValue::Int(*x),
        }
    }
}

// ********* Rows ***********

/// The content of a single spreadsheet cell.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Int(_) => false,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(x: i64) -> Self {
        CellValue::Int(x)
    }
}

/// One spreadsheet row, as an ordered mapping from column name to value.
///
/// The same structure is used for a freshly validated submission and for a
/// row read back from the sheet.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Record {
        Record { fields: Vec::new() }
    }

    pub fn from_pairs<K: Into<String>, V: Into<CellValue>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.insert(k, v);
        }
        r
    }

    /// Sets the value of a column. An existing column keeps its position.
    pub fn insert<K: Into<String>, V: Into<CellValue>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ******** Errors *********

/// Errors raised while collecting or validating answers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyError {
    UnknownQuestion(String),
    WrongKind {
        column: String,
        expected: &'static str,
    },
    NotAnOption {
        column: String,
        value: String,
    },
    OutOfRange {
        column: String,
        value: i64,
        min: i64,
        max: i64,
    },
    /// The required columns without an answer, in question order.
    MissingFields(Vec<String>),
}

impl Error for SurveyError {}

impl Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::UnknownQuestion(c) => write!(f, "no question for column {:?}", c),
            SurveyError::WrongKind { column, expected } => {
                write!(f, "question {:?} expects {}", column, expected)
            }
            SurveyError::NotAnOption { column, value } => {
                write!(f, "{:?} is not an option of question {:?}", value, column)
            }
            SurveyError::OutOfRange {
                column,
                value,
                min,
                max,
            } => write!(
                f,
                "{} is outside of {}..={} for question {:?}",
                value, min, max, column
            ),
            SurveyError::MissingFields(cols) => {
                write!(f, "missing answers: {}", cols.join(", "))
            }
        }
    }
}
