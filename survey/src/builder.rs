pub use crate::config::*;

use log::debug;

/// Collects the answers of one participant against a question schema.
///
/// The sheet starts with the defaults of a freshly rendered form. Every
/// setter checks the value against the schema.
///
/// ```
/// use villa_survey::builder::AnswerSheet;
/// use villa_survey::questionnaire::LOVE_ISLAND;
/// # use villa_survey::SurveyError;
///
/// let mut sheet = AnswerSheet::new(LOVE_ISLAND);
/// sheet.text("Name", "Sam")?;
/// sheet.choose("Choose your dream date", "Sunset picnic 🌅")?;
///
/// let record = sheet.finish()?;
/// assert_eq!(record.get("Name").map(|v| v.to_string()), Some("Sam".to_string()));
/// # Ok::<(), SurveyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AnswerSheet {
    schema: &'static [Question],
    answers: Vec<Answer>,
}

impl AnswerSheet {
    pub fn new(schema: &'static [Question]) -> AnswerSheet {
        AnswerSheet {
            schema,
            answers: schema.iter().map(|q| q.default_answer()).collect(),
        }
    }

    pub fn schema(&self) -> &'static [Question] {
        self.schema
    }

    pub fn answer(&self, column: &str) -> Option<&Answer> {
        self.position(column).ok().map(|idx| &self.answers[idx])
    }

    /// The questions paired with their current answers, in question order.
    pub fn iter(&self) -> impl Iterator<Item = (&Question, &Answer)> + Clone {
        self.schema.iter().zip(self.answers.iter())
    }

    pub fn text(&mut self, column: &str, value: &str) -> Result<(), SurveyError> {
        let idx = self.position(column)?;
        match self.schema[idx].kind {
            FieldKind::Text => self.set(idx, Answer::Text(value.to_string())),
            _ => wrong_kind(column, "free text"),
        }
    }

    /// Selects an option of a single choice question by its label.
    pub fn choose(&mut self, column: &str, label: &str) -> Result<(), SurveyError> {
        let idx = self.position(column)?;
        match self.schema[idx].kind {
            FieldKind::SingleChoice { options, .. } => {
                let label = find_option(column, options, label)?;
                self.set(idx, Answer::Choice(Some(label)))
            }
            _ => wrong_kind(column, "a single choice"),
        }
    }

    /// Selects an option of a single choice question by its 0-based index.
    pub fn choose_index(&mut self, column: &str, option: usize) -> Result<(), SurveyError> {
        let idx = self.position(column)?;
        match self.schema[idx].kind {
            FieldKind::SingleChoice { options, .. } => {
                let label = options
                    .get(option)
                    .ok_or_else(|| SurveyError::NotAnOption {
                        column: column.to_string(),
                        value: option.to_string(),
                    })?;
                self.set(idx, Answer::Choice(Some(label.to_string())))
            }
            _ => wrong_kind(column, "a single choice"),
        }
    }

    /// Puts a single choice question back to the "not yet chosen" state.
    pub fn clear_choice(&mut self, column: &str) -> Result<(), SurveyError> {
        let idx = self.position(column)?;
        match self.schema[idx].kind {
            FieldKind::SingleChoice { .. } => self.set(idx, Answer::Choice(None)),
            _ => wrong_kind(column, "a single choice"),
        }
    }

    /// Replaces the selection of a multi-select question.
    /// Labels are kept in the order of the options, duplicates are ignored.
    pub fn select(&mut self, column: &str, labels: &[&str]) -> Result<(), SurveyError> {
        let idx = self.position(column)?;
        match self.schema[idx].kind {
            FieldKind::MultiChoice { options } => {
                for l in labels {
                    find_option(column, options, l)?;
                }
                let selected: Vec<String> = options
                    .iter()
                    .filter(|o| labels.iter().any(|l| l.trim() == **o))
                    .map(|o| o.to_string())
                    .collect();
                self.set(idx, Answer::Choices(selected))
            }
            _ => wrong_kind(column, "a multi-select"),
        }
    }

    pub fn slide(&mut self, column: &str, value: i64) -> Result<(), SurveyError> {
        let idx = self.position(column)?;
        match self.schema[idx].kind {
            FieldKind::Slider { min, max, .. } if value < min || value > max => {
                Err(SurveyError::OutOfRange {
                    column: column.to_string(),
                    value,
                    min,
                    max,
                })
            }
            FieldKind::Slider { .. } => self.set(idx, Answer::Scale(value)),
            _ => wrong_kind(column, "a slider value"),
        }
    }

    /// Sets an answer from its textual form, whatever the kind of question.
    ///
    /// Multi-select labels are separated by `;`, slider values are parsed as integers.
    pub fn parse(&mut self, column: &str, raw: &str) -> Result<(), SurveyError> {
        let idx = self.position(column)?;
        match self.schema[idx].kind {
            FieldKind::Text => self.text(column, raw),
            FieldKind::SingleChoice { .. } => self.choose(column, raw.trim()),
            FieldKind::MultiChoice { .. } => {
                let labels: Vec<&str> = raw
                    .split(';')
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                self.select(column, &labels)
            }
            FieldKind::Slider { .. } => {
                let value =
                    raw.trim()
                        .parse::<i64>()
                        .map_err(|_| SurveyError::NotAnOption {
                            column: column.to_string(),
                            value: raw.to_string(),
                        })?;
                self.slide(column, value)
            }
        }
    }

    /// The required columns that are still unanswered, in question order.
    pub fn missing(&self) -> Vec<String> {
        crate::missing_required(self.iter())
    }

    /// Validates the answers and builds the participant record.
    pub fn finish(&self) -> Result<Record, SurveyError> {
        crate::validate(self.iter())
    }

    fn position(&self, column: &str) -> Result<usize, SurveyError> {
        self.schema
            .iter()
            .position(|q| q.column == column)
            .ok_or_else(|| SurveyError::UnknownQuestion(column.to_string()))
    }

    fn set(&mut self, idx: usize, answer: Answer) -> Result<(), SurveyError> {
        debug!(
            "AnswerSheet: {:?} <- {:?}",
            self.schema[idx].column, answer
        );
        self.answers[idx] = answer;
        Ok(())
    }
}

fn find_option(
    column: &str,
    options: &'static [&'static str],
    label: &str,
) -> Result<String, SurveyError> {
    options
        .iter()
        .find(|o| **o == label.trim())
        .map(|o| o.to_string())
        .ok_or_else(|| SurveyError::NotAnOption {
            column: column.to_string(),
            value: label.to_string(),
        })
}

fn wrong_kind(column: &str, expected: &'static str) -> Result<(), SurveyError> {
    Err(SurveyError::WrongKind {
        column: column.to_string(),
        expected,
    })
}
