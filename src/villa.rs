use log::{debug, info, warn};

use snafu::Snafu;

use villa_survey::builder::AnswerSheet;
use villa_survey::*;

use crate::villa::client::ClientProvider;

pub mod client;
pub mod config_reader;
pub mod credentials;
pub mod form;
pub mod io_gsheets;
#[cfg(test)]
pub mod io_memory;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SheetError {
    #[snafu(display("Could not open configuration file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not parse configuration file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Could not open secrets file {path}"))]
    OpeningSecrets {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not parse secrets file {path}"))]
    ParsingSecrets {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Credential field `{field}` is missing or not a string"))]
    MissingCredentialField { field: String },
    #[snafu(display("The private key of the service account is malformed: {source}"))]
    MalformedKey {
        source: jsonwebtoken::errors::Error,
    },
    #[snafu(display("Token endpoint {token_uri} rejected the credentials (status {status}): {body}"))]
    TokenRejected {
        token_uri: String,
        status: u16,
        body: String,
    },
    #[snafu(display("Access to {url} was denied (status {status})"))]
    AccessDenied { url: String, status: u16 },
    #[snafu(display("Invalid API base URL {base}"))]
    InvalidApiBase { base: String },

    #[snafu(display("Could not find a spreadsheet key in URL {url}"))]
    InvalidSheetUrl { url: String },
    #[snafu(display("Spreadsheet not found at {url}"))]
    SpreadsheetNotFound { url: String },
    #[snafu(display("Worksheet {title:?} not found"))]
    WorksheetNotFound { title: String },

    #[snafu(display("Request to {url} failed: {source}"))]
    Http { source: reqwest::Error, url: String },
    #[snafu(display("Unexpected status {status} from {url}: {body}"))]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[snafu(display("Answer {raw:?} should look like Column=Value"))]
    MalformedAnswer { raw: String },
    #[snafu(display("{source}"))]
    InvalidAnswers { source: SurveyError },
    #[snafu(display("Could not read the answers"))]
    ReadingAnswers { source: std::io::Error },
}

pub type SheetResult<T> = Result<T, SheetError>;

/// The broad families of failures, as seen by the person filling the form.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorKind {
    /// Configuration or authentication problem.
    Auth,
    /// The spreadsheet or the worksheet does not exist.
    NotFound,
    /// Network or service failure.
    Transient,
    /// Incomplete or invalid answers. The sheet is never contacted.
    Validation,
}

impl SheetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetError::OpeningConfig { .. }
            | SheetError::ParsingConfig { .. }
            | SheetError::OpeningSecrets { .. }
            | SheetError::ParsingSecrets { .. }
            | SheetError::MissingCredentialField { .. }
            | SheetError::MalformedKey { .. }
            | SheetError::TokenRejected { .. }
            | SheetError::AccessDenied { .. }
            | SheetError::InvalidApiBase { .. } => ErrorKind::Auth,
            SheetError::InvalidSheetUrl { .. }
            | SheetError::SpreadsheetNotFound { .. }
            | SheetError::WorksheetNotFound { .. } => ErrorKind::NotFound,
            SheetError::Http { .. } | SheetError::UnexpectedStatus { .. } => ErrorKind::Transient,
            SheetError::MalformedAnswer { .. }
            | SheetError::InvalidAnswers { .. }
            | SheetError::ReadingAnswers { .. } => ErrorKind::Validation,
        }
    }
}

/// Where the participants are stored.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SheetTarget {
    pub url: String,
    pub worksheet: String,
}

/// Reads every row of the target worksheet and indexes it by participant name.
pub fn read_participants(
    provider: &mut ClientProvider,
    target: &SheetTarget,
) -> SheetResult<Participants> {
    let client = provider.get_client()?;
    let spreadsheet = client.open_by_url(&target.url)?;
    let worksheet = spreadsheet.worksheet(&target.worksheet)?;
    let records = worksheet.all_records()?;
    info!("read_participants: read {} records", records.len());
    Ok(participants_by_name(records))
}

/// Appends a record as the new last row of the target worksheet, following
/// the current header row. Returns the row as written.
///
/// Nothing prevents the same record from being appended twice.
pub fn append_participant(
    provider: &mut ClientProvider,
    target: &SheetTarget,
    record: &Record,
) -> SheetResult<Vec<CellValue>> {
    let client = provider.get_client()?;
    let spreadsheet = client.open_by_url(&target.url)?;
    let worksheet = spreadsheet.worksheet(&target.worksheet)?;
    let headers = worksheet.row_values(1)?;
    debug!("append_participant: headers: {:?}", headers);
    if headers.is_empty() {
        warn!(
            "append_participant: worksheet {:?} has no header row",
            target.worksheet
        );
    }
    let row = row_for_headers(record, &headers);
    worksheet.append_row(&row)?;
    info!("append_participant: appended {} cells", row.len());
    Ok(row)
}

/// A message for the person using the form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Notice {
    Error(String),
    Success(String),
    Info(String),
}

/// One visit of the form.
///
/// This is the only place where errors are turned into messages: all the
/// operations here degrade to empty data or a failed submission.
pub struct Session {
    provider: ClientProvider,
    target: SheetTarget,
    participants: Participants,
    notices: Vec<Notice>,
}

impl Session {
    pub fn new(provider: ClientProvider, target: SheetTarget) -> Session {
        Session {
            provider,
            target,
            participants: Participants::new(),
            notices: Vec::new(),
        }
    }

    /// The participants as of the last read.
    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn inform(&mut self, msg: &str) {
        self.notices.push(Notice::Info(msg.to_string()));
    }

    /// Refreshes the participants from the sheet. Any failure yields an empty mapping.
    pub fn load_participants(&mut self) -> Participants {
        let res = match read_participants(&mut self.provider, &self.target) {
            Ok(p) => p,
            Err(e) => {
                warn!("load_participants: {}", e);
                let msg = self.load_message(&e);
                self.notices.push(Notice::Error(msg));
                Participants::new()
            }
        };
        self.participants = res.clone();
        res
    }

    /// Writes one record to the sheet. Any failure yields `false`.
    pub fn add_participant(&mut self, record: &Record) -> bool {
        match append_participant(&mut self.provider, &self.target, record) {
            Ok(_) => true,
            Err(e) => {
                warn!("add_participant: {}", e);
                let msg = match e.kind() {
                    ErrorKind::Auth => auth_message(&e),
                    _ => format!("Error adding participant to Google Sheet: {}", e),
                };
                self.notices.push(Notice::Error(msg));
                false
            }
        }
    }

    /// Validates the answers, writes them and refreshes the participants.
    ///
    /// Returns whether a row was appended.
    pub fn submit(&mut self, answers: &AnswerSheet) -> bool {
        let record = match answers.finish() {
            Ok(r) => r,
            Err(SurveyError::MissingFields(missing)) => {
                info!("submit: missing answers {:?}", missing);
                self.notices.push(Notice::Error(format!(
                    "Please answer every required question before submitting. Missing: {}",
                    missing.join(", ")
                )));
                return false;
            }
            Err(e) => {
                self.notices.push(Notice::Error(e.to_string()));
                return false;
            }
        };

        if !self.add_participant(&record) {
            self.notices.push(Notice::Error(
                "Failed to add your profile to the Google Sheet. Please try again.".to_string(),
            ));
            return false;
        }

        let name = record
            .get(questionnaire::NAME)
            .map(|v| v.to_string())
            .unwrap_or_default();
        self.notices.push(Notice::Success(format!(
            "Thanks, {}! Your profile has been added to the Google Sheet.",
            name
        )));
        self.load_participants();
        true
    }

    fn load_message(&self, e: &SheetError) -> String {
        match e {
            SheetError::SpreadsheetNotFound { .. } | SheetError::InvalidSheetUrl { .. } => {
                format!(
                    "Google Sheet not found at URL: {}. Please check the URL.",
                    self.target.url
                )
            }
            SheetError::WorksheetNotFound { title } => format!(
                "Worksheet '{}' not found. Please check the worksheet name.",
                title
            ),
            e if e.kind() == ErrorKind::Auth => auth_message(e),
            e => format!(
                "Error loading data from Google Sheet: {}. Ensure the sheet is shared with the service account.",
                e
            ),
        }
    }
}

fn auth_message(e: &SheetError) -> String {
    format!(
        "Error authenticating with Google Sheets. Make sure the secrets file is correctly configured and the service account has access to the sheet. Error: {}",
        e
    )
}
