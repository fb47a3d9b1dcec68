mod config;
pub mod builder;
pub mod questionnaire;
pub mod quick_start;

use log::{debug, info, warn};

use std::collections::BTreeMap;

pub use crate::config::*;

/// The participants read back from the sheet, keyed by name.
pub type Participants = BTreeMap<String, Record>;

/// Returns the required questions whose answer is missing, in question order.
///
/// Optional questions are never reported, whatever their answer.
pub fn missing_required<'a>(answers: impl Iterator<Item = (&'a Question, &'a Answer)>) -> Vec<String> {
    answers
        .filter(|(q, a)| q.required && a.is_missing())
        .map(|(q, _)| q.column.to_string())
        .collect()
}

/// Turns a complete set of answers into the record written to the sheet.
///
/// Fails with the list of all the missing required columns if any.
pub fn validate<'a>(
    answers: impl Iterator<Item = (&'a Question, &'a Answer)> + Clone,
) -> Result<Record, SurveyError> {
    let missing = missing_required(answers.clone());
    if !missing.is_empty() {
        debug!("validate: missing fields {:?}", missing);
        return Err(SurveyError::MissingFields(missing));
    }
    let mut record = Record::new();
    for (q, a) in answers {
        record.insert(q.column, a.to_cell());
    }
    Ok(record)
}

/// Lays out a record along the header row of the sheet.
///
/// Headers without a value in the record are filled with an empty cell. Values
/// of the record without a matching header are dropped.
pub fn row_for_headers(record: &Record, headers: &[String]) -> Vec<CellValue> {
    for (k, _) in record.iter() {
        if !headers.contains(k) {
            warn!("row_for_headers: dropping column {:?} absent from the sheet", k);
        }
    }
    headers
        .iter()
        .map(|h| record.get(h).cloned().unwrap_or(CellValue::Empty))
        .collect()
}

/// Builds header-keyed records out of raw rows. The first row is the header.
///
/// Short rows are padded with empty cells, cells beyond the header are ignored.
pub fn records_from_rows(rows: &[Vec<CellValue>]) -> Vec<Record> {
    let (header, body) = match rows.split_first() {
        Some(x) => x,
        None => return Vec::new(),
    };
    let headers: Vec<String> = header.iter().map(|c| c.to_string()).collect();
    body.iter()
        .map(|row| {
            Record::from_pairs(
                headers
                    .iter()
                    .enumerate()
                    .map(|(idx, h)| (h.clone(), row.get(idx).cloned().unwrap_or(CellValue::Empty))),
            )
        })
        .collect()
}

/// Indexes records by their `Name` column.
///
/// Records without a name are skipped. When several records share a name, the
/// last one is kept: there is no uniqueness constraint on names.
pub fn participants_by_name(records: Vec<Record>) -> Participants {
    let mut res = Participants::new();
    for r in records {
        let name = match r.get(questionnaire::NAME) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => {
                debug!("participants_by_name: skipping record without name {:?}", r);
                continue;
            }
        };
        if res.contains_key(&name) {
            info!("participants_by_name: name {:?} appears more than once", name);
        }
        res.insert(name, r);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    fn headers(hs: &[&str]) -> Vec<String> {
        hs.iter().map(|s| s.to_string()).collect()
    }

    const REQUIRED_NAME: &[Question] = &[Question {
        column: "Name",
        prompt: "What is your name?",
        kind: FieldKind::Text,
        required: true,
    }];

    const MIXED: &[Question] = &[
        Question {
            column: "Name",
            prompt: "",
            kind: FieldKind::Text,
            required: true,
        },
        Question {
            column: "Nickname",
            prompt: "",
            kind: FieldKind::Text,
            required: false,
        },
        Question {
            column: "Type",
            prompt: "",
            kind: FieldKind::SingleChoice {
                options: &["A", "B"],
                default: None,
            },
            required: true,
        },
        Question {
            column: "Red flags",
            prompt: "",
            kind: FieldKind::MultiChoice {
                options: &["Snoring", "Lateness"],
            },
            required: true,
        },
        Question {
            column: "Energy",
            prompt: "",
            kind: FieldKind::Slider {
                min: 0,
                max: 10,
                default: 0,
            },
            required: true,
        },
    ];

    #[test]
    fn empty_name_is_missing() {
        init();
        let answers = vec![Answer::Text("".to_string())];
        let res = validate(REQUIRED_NAME.iter().zip(answers.iter()));
        assert_eq!(
            res,
            Err(SurveyError::MissingFields(vec!["Name".to_string()]))
        );
    }

    #[test]
    fn whitespace_only_text_is_missing() {
        let answers = vec![Answer::Text("   ".to_string())];
        assert_eq!(
            missing_required(REQUIRED_NAME.iter().zip(answers.iter())),
            vec!["Name".to_string()]
        );
    }

    #[test]
    fn reports_all_missing_required_fields_in_order() {
        init();
        let answers = vec![
            Answer::Text("".to_string()),
            Answer::Text("".to_string()),
            Answer::Choice(None),
            Answer::Choices(vec![]),
            // A slider at zero still holds a value.
            Answer::Scale(0),
        ];
        assert_eq!(
            missing_required(MIXED.iter().zip(answers.iter())),
            headers(&["Name", "Type", "Red flags"])
        );
    }

    #[test]
    fn optional_fields_are_never_reported() {
        let answers = vec![
            Answer::Text("Sam".to_string()),
            Answer::Text("".to_string()),
            Answer::Choice(Some("B".to_string())),
            Answer::Choices(vec!["Snoring".to_string()]),
            Answer::Scale(3),
        ];
        let record = validate(MIXED.iter().zip(answers.iter())).unwrap();
        assert_eq!(record.get("Nickname"), Some(&text("")));
        assert_eq!(record.get("Energy"), Some(&CellValue::Int(3)));
        assert_eq!(
            record.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec!["Name", "Nickname", "Type", "Red flags", "Energy"]
        );
    }

    #[test]
    fn row_follows_the_header_order() {
        init();
        let record = Record::from_pairs([
            ("Name", "Sam"),
            ("Dream Date", "Movie night 🎬"),
            ("Extra", "x"),
        ]);
        let row = row_for_headers(&record, &headers(&["Name", "Dream Date"]));
        assert_eq!(row, vec![text("Sam"), text("Movie night 🎬")]);
    }

    #[test]
    fn headers_without_answers_are_written_empty() {
        let record = Record::from_pairs([("Dream Date", "Mystery date 🎁"), ("Name", "Kai")]);
        let row = row_for_headers(&record, &headers(&["Timestamp", "Name", "Gender", "Dream Date"]));
        assert_eq!(
            row,
            vec![
                CellValue::Empty,
                text("Kai"),
                CellValue::Empty,
                text("Mystery date 🎁")
            ]
        );
        assert!(row_for_headers(&record, &[]).is_empty());
    }

    #[test]
    fn records_are_keyed_by_header() {
        let rows = vec![
            vec![text("Name"), text("Age")],
            vec![text("Alex"), CellValue::Int(27)],
            vec![text("Jo")],
        ];
        let records = records_from_rows(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Age"), Some(&CellValue::Int(27)));
        assert_eq!(records[1].get("Age"), Some(&CellValue::Empty));
        assert!(records_from_rows(&[]).is_empty());
    }

    #[test]
    fn participants_skip_nameless_rows_and_keep_the_last_duplicate() {
        init();
        let records = vec![
            Record::from_pairs([("Name", text("Alex")), ("Round", CellValue::Int(1))]),
            Record::from_pairs([("Name", text("")), ("Round", CellValue::Int(2))]),
            Record::from_pairs([("Round", CellValue::Int(3))]),
            Record::from_pairs([("Name", text("Alex")), ("Round", CellValue::Int(4))]),
            Record::from_pairs([("Name", text("Jo")), ("Round", CellValue::Int(5))]),
        ];
        let participants = participants_by_name(records);
        assert_eq!(participants.len(), 2);
        assert_eq!(
            participants["Alex"].get("Round"),
            Some(&CellValue::Int(4))
        );
        assert!(participants.contains_key("Jo"));
        assert!(!participants.contains_key(""));
    }
}
