// Collecting answers on the command line.

use std::io::{BufRead, Write};

use log::debug;
use snafu::prelude::*;

use villa_survey::builder::AnswerSheet;
use villa_survey::{Answer, FieldKind, Question};

use crate::villa::*;

/// Builds the answers out of `Column=Value` pairs. Unlisted questions keep their default.
pub fn answers_from_pairs(
    schema: &'static [Question],
    pairs: &[String],
) -> SheetResult<AnswerSheet> {
    let mut sheet = AnswerSheet::new(schema);
    for raw in pairs {
        let (column, value) = raw
            .split_once('=')
            .context(MalformedAnswerSnafu { raw: raw.as_str() })?;
        sheet
            .parse(column.trim(), value)
            .context(InvalidAnswersSnafu {})?;
    }
    Ok(sheet)
}

/// Asks every question in order.
///
/// An empty line keeps the default of the question. Invalid choices are asked
/// again. The end of the input keeps the defaults of the remaining questions.
pub fn prompt_answers<R: BufRead, W: Write>(
    schema: &'static [Question],
    input: &mut R,
    output: &mut W,
) -> SheetResult<AnswerSheet> {
    let mut sheet = AnswerSheet::new(schema);
    for q in schema {
        loop {
            write_question(q, sheet.answer(q.column), output).context(ReadingAnswersSnafu {})?;
            let mut line = String::new();
            let read = input.read_line(&mut line).context(ReadingAnswersSnafu {})?;
            if read == 0 {
                debug!("prompt_answers: end of input at {:?}", q.column);
                return Ok(sheet);
            }
            let line = line.trim_end_matches(&['\r', '\n'][..]);
            if line.trim().is_empty() && !matches!(q.kind, FieldKind::Text) {
                break;
            }
            match apply_line(&mut sheet, q, line) {
                Ok(()) => break,
                Err(e) => {
                    writeln!(output, "  {}", e).context(ReadingAnswersSnafu {})?;
                }
            }
        }
    }
    Ok(sheet)
}

/// Options can be picked by their 1-based number or by their label.
/// Several options are separated by `,` or `;`.
fn apply_line(sheet: &mut AnswerSheet, q: &Question, line: &str) -> Result<(), SurveyError> {
    let pick = |token: &str| -> String {
        match token.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= q.options().len() => q.options()[n - 1].to_string(),
            _ => token.trim().to_string(),
        }
    };
    match q.kind {
        FieldKind::Text => sheet.text(q.column, line),
        FieldKind::SingleChoice { .. } => sheet.choose(q.column, &pick(line)),
        FieldKind::MultiChoice { .. } => {
            let labels: Vec<String> = line
                .split(&[',', ';'][..])
                .filter(|s| !s.trim().is_empty())
                .map(pick)
                .collect();
            let labels: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
            sheet.select(q.column, &labels)
        }
        FieldKind::Slider { .. } => sheet.parse(q.column, line),
    }
}

fn write_question<W: Write>(
    q: &Question,
    current: Option<&Answer>,
    output: &mut W,
) -> std::io::Result<()> {
    writeln!(output, "{}", q.prompt)?;
    match q.kind {
        FieldKind::Text => {}
        FieldKind::SingleChoice { options, .. } | FieldKind::MultiChoice { options } => {
            for (idx, o) in options.iter().enumerate() {
                writeln!(output, "  {}) {}", idx + 1, o)?;
            }
        }
        FieldKind::Slider { min, max, .. } => {
            writeln!(output, "  ({} to {})", min, max)?;
        }
    }
    match current {
        Some(Answer::Choice(Some(c))) => write!(output, "[{}] > ", c)?,
        Some(Answer::Scale(x)) => write!(output, "[{}] > ", x)?,
        _ => write!(output, "> ")?,
    }
    output.flush()
}

/// A plain listing of the questions, for `matchmaker questions`.
pub fn describe(schema: &[Question]) -> String {
    let mut res = String::new();
    for (idx, q) in schema.iter().enumerate() {
        let marker = if q.required { " *" } else { "" };
        res.push_str(&format!("{}. {}{}\n", idx + 1, q.prompt, marker));
        res.push_str(&format!("   column: {}\n", q.column));
        match q.kind {
            FieldKind::Text => res.push_str("   free text\n"),
            FieldKind::SingleChoice { options, .. } => {
                res.push_str(&format!("   one of: {}\n", options.join(" | ")))
            }
            FieldKind::MultiChoice { options } => {
                res.push_str(&format!("   any of: {}\n", options.join(" | ")))
            }
            FieldKind::Slider { min, max, default } => res.push_str(&format!(
                "   from {} to {} (default {})\n",
                min, max, default
            )),
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use villa_survey::questionnaire::LOVE_ISLAND;
    use villa_survey::CellValue;

    const EXTENDED: &[Question] = &[
        Question {
            column: "Name",
            prompt: "What is your name?",
            kind: FieldKind::Text,
            required: true,
        },
        Question {
            column: "Love languages",
            prompt: "Pick your love languages",
            kind: FieldKind::MultiChoice {
                options: &["Words", "Gifts", "Time", "Touch"],
            },
            required: true,
        },
        Question {
            column: "Jealousy",
            prompt: "How jealous are you?",
            kind: FieldKind::Slider {
                min: 1,
                max: 5,
                default: 3,
            },
            required: true,
        },
    ];

    fn prompt(schema: &'static [Question], input: &str) -> (AnswerSheet, String) {
        let mut out: Vec<u8> = Vec::new();
        let sheet = prompt_answers(schema, &mut Cursor::new(input.as_bytes()), &mut out).unwrap();
        (sheet, String::from_utf8(out).unwrap())
    }

    #[test]
    fn pairs_set_the_named_columns() {
        let pairs = vec![
            "Name=Sam".to_string(),
            "Choose your dream date=Sunset picnic 🌅".to_string(),
        ];
        let record = answers_from_pairs(LOVE_ISLAND, &pairs)
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(record.get("Name"), Some(&CellValue::from("Sam")));
        assert_eq!(
            record.get("Are you an extrovert or an introvert?"),
            Some(&CellValue::from("Introvert"))
        );
        assert_eq!(
            record.get("Choose your dream date"),
            Some(&CellValue::from("Sunset picnic 🌅"))
        );
    }

    #[test]
    fn malformed_pairs_are_validation_errors() {
        let err = answers_from_pairs(LOVE_ISLAND, &["Sam".to_string()]).unwrap_err();
        assert!(matches!(err, SheetError::MalformedAnswer { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = answers_from_pairs(LOVE_ISLAND, &["Gender=Any".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            SheetError::InvalidAnswers {
                source: SurveyError::UnknownQuestion(_)
            }
        ));
    }

    #[test]
    fn prompts_accept_numbers_labels_and_defaults() {
        let (sheet, out) = prompt(LOVE_ISLAND, "Alex\n2\n\n");
        let record = sheet.finish().unwrap();
        assert_eq!(record.get("Name"), Some(&CellValue::from("Alex")));
        assert_eq!(
            record.get("Are you an extrovert or an introvert?"),
            Some(&CellValue::from("Extrovert"))
        );
        assert_eq!(
            record.get("Choose your dream date"),
            Some(&CellValue::from("Movie night 🎬"))
        );
        assert!(out.contains("  3) Ambi-vert"));
        assert!(out.contains("[Movie night 🎬] > "));
    }

    #[test]
    fn invalid_choices_are_asked_again() {
        let (sheet, out) = prompt(LOVE_ISLAND, "Alex\n9\nAmbi-vert\n5\n");
        assert_eq!(
            sheet.answer("Are you an extrovert or an introvert?"),
            Some(&Answer::Choice(Some("Ambi-vert".to_string())))
        );
        assert_eq!(
            sheet.answer("Choose your dream date"),
            Some(&Answer::Choice(Some("Explore a neighborhood 🏙️".to_string())))
        );
        assert!(out.contains("is not an option"));
    }

    #[test]
    fn end_of_input_keeps_the_defaults() {
        let (sheet, _) = prompt(LOVE_ISLAND, "");
        assert_eq!(sheet.missing(), vec!["Name".to_string()]);
    }

    #[test]
    fn multi_select_and_slider_prompts() {
        let (sheet, out) = prompt(EXTENDED, "Kai\n4, Words\n\n");
        let record = sheet.finish().unwrap();
        assert_eq!(
            record.get("Love languages"),
            Some(&CellValue::from("Words, Touch"))
        );
        assert_eq!(record.get("Jealousy"), Some(&CellValue::Int(3)));
        assert!(out.contains("(1 to 5)"));

        let (sheet, _) = prompt(EXTENDED, "Kai\n\n7\n2\n");
        assert_eq!(sheet.missing(), vec!["Love languages".to_string()]);
        assert_eq!(sheet.answer("Jealousy"), Some(&Answer::Scale(2)));
    }

    #[test]
    fn description_lists_every_question() {
        let text = describe(LOVE_ISLAND);
        assert!(text.starts_with("1. What is your name? *\n   column: Name\n   free text\n"));
        assert!(text.contains("one of: Introvert | Extrovert | Ambi-vert"));
    }
}
