// Google Sheets API v4 over blocking HTTP.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use snafu::prelude::*;

use villa_survey::{records_from_rows, CellValue, Record};

use crate::villa::client::{Connector, Spreadsheet, Spreadsheets, Worksheet};
use crate::villa::credentials::CredentialBundle;
use crate::villa::*;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4";

const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

#[derive(Serialize, Debug)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Debug)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize, Debug)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize, Debug)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize, Debug)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JSValue>>,
}

/// Signs the JWT assertion exchanged for an access token.
fn sign_assertion(credentials: &CredentialBundle, now: u64) -> SheetResult<String> {
    let key =
        EncodingKey::from_rsa_pem(credentials.private_key.as_bytes()).context(MalformedKeySnafu {})?;
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(credentials.private_key_id.clone());
    let claims = Claims {
        iss: &credentials.client_email,
        scope: SCOPE,
        aud: &credentials.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    encode(&header, &claims, &key).context(MalformedKeySnafu {})
}

/// Authenticates a service account with the OAuth token endpoint of the bundle.
pub struct GoogleConnector {
    http: Client,
    api_base: String,
}

impl GoogleConnector {
    pub fn new(api_base: &str) -> GoogleConnector {
        GoogleConnector {
            http: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Connector for GoogleConnector {
    fn connect(&self, credentials: &CredentialBundle) -> SheetResult<Rc<dyn Spreadsheets>> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let assertion = sign_assertion(credentials, now)?;
        let token_uri = credentials.token_uri.as_str();
        info!("connect: requesting an access token from {}", token_uri);
        let resp = self
            .http
            .post(token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .context(HttpSnafu { url: token_uri })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return TokenRejectedSnafu {
                token_uri,
                status: status.as_u16(),
                body,
            }
            .fail();
        }
        let token: TokenResponse = resp.json().context(HttpSnafu { url: token_uri })?;
        let client: Rc<dyn Spreadsheets> = Rc::new(GoogleSheets {
            http: self.http.clone(),
            api_base: self.api_base.clone(),
            token: token.access_token,
        });
        Ok(client)
    }
}

pub struct GoogleSheets {
    http: Client,
    api_base: String,
    token: String,
}

impl GoogleSheets {
    fn endpoint(&self, segments: &[&str]) -> SheetResult<Url> {
        let mut url = Url::parse(&self.api_base).ok().context(InvalidApiBaseSnafu {
            base: self.api_base.as_str(),
        })?;
        url.path_segments_mut()
            .ok()
            .context(InvalidApiBaseSnafu {
                base: self.api_base.as_str(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends an authenticated request. `sheet_url` is the spreadsheet as known by the user.
    fn send(&self, req: RequestBuilder, sheet_url: &str) -> SheetResult<Response> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .context(HttpSnafu { url: sheet_url })?;
        let status = resp.status();
        debug!("send: {} -> {}", resp.url(), status);
        match status.as_u16() {
            _ if status.is_success() => Ok(resp),
            404 => SpreadsheetNotFoundSnafu { url: sheet_url }.fail(),
            s @ (401 | 403) => AccessDeniedSnafu {
                url: sheet_url,
                status: s,
            }
            .fail(),
            s => {
                let body = resp.text().unwrap_or_default();
                UnexpectedStatusSnafu {
                    url: sheet_url,
                    status: s,
                    body,
                }
                .fail()
            }
        }
    }
}

impl Spreadsheets for GoogleSheets {
    fn open_by_url(&self, url: &str) -> SheetResult<Box<dyn Spreadsheet + '_>> {
        let key = spreadsheet_key(url)?;
        let endpoint = self.endpoint(&["spreadsheets", &key])?;
        let req = self
            .http
            .get(endpoint)
            .query(&[("fields", "sheets.properties.title")]);
        let meta: SpreadsheetMeta = self.send(req, url)?.json().context(HttpSnafu { url })?;
        let titles: Vec<String> = meta.sheets.into_iter().map(|s| s.properties.title).collect();
        debug!("open_by_url: {:?} has worksheets {:?}", key, titles);
        Ok(Box::new(GoogleSpreadsheet {
            sheets: self,
            url: url.to_string(),
            key,
            titles,
        }))
    }
}

struct GoogleSpreadsheet<'a> {
    sheets: &'a GoogleSheets,
    url: String,
    key: String,
    titles: Vec<String>,
}

impl<'a> Spreadsheet for GoogleSpreadsheet<'a> {
    fn worksheet(&self, title: &str) -> SheetResult<Box<dyn Worksheet + '_>> {
        ensure!(
            self.titles.iter().any(|t| t == title),
            WorksheetNotFoundSnafu { title }
        );
        Ok(Box::new(GoogleWorksheet {
            book: self,
            range: quote_title(title),
        }))
    }
}

struct GoogleWorksheet<'a> {
    book: &'a GoogleSpreadsheet<'a>,
    // The whole worksheet, in A1 notation.
    range: String,
}

impl<'a> GoogleWorksheet<'a> {
    fn get_values(&self, range: &str) -> SheetResult<Vec<Vec<CellValue>>> {
        let sheets = self.book.sheets;
        let endpoint = sheets.endpoint(&["spreadsheets", &self.book.key, "values", range])?;
        let req = sheets.http.get(endpoint).query(&[
            ("majorDimension", "ROWS"),
            ("valueRenderOption", "UNFORMATTED_VALUE"),
        ]);
        let vr: ValueRange = sheets
            .send(req, &self.book.url)?
            .json()
            .context(HttpSnafu {
                url: self.book.url.as_str(),
            })?;
        Ok(vr
            .values
            .iter()
            .map(|row| row.iter().map(json_to_cell).collect())
            .collect())
    }
}

impl<'a> Worksheet for GoogleWorksheet<'a> {
    fn all_records(&self) -> SheetResult<Vec<Record>> {
        let rows = self.get_values(&self.range)?;
        debug!("all_records: {} rows in {}", rows.len(), self.range);
        Ok(records_from_rows(&rows))
    }

    fn row_values(&self, row: usize) -> SheetResult<Vec<String>> {
        let range = format!("{}!{}:{}", self.range, row, row);
        let rows = self.get_values(&range)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default())
    }

    fn append_row(&self, values: &[CellValue]) -> SheetResult<()> {
        let sheets = self.book.sheets;
        let target = format!("{}:append", self.range);
        let endpoint = sheets.endpoint(&["spreadsheets", &self.book.key, "values", &target])?;
        let body = json!({
            "majorDimension": "ROWS",
            "values": [values.iter().map(cell_to_json).collect::<Vec<JSValue>>()],
        });
        let req = sheets
            .http
            .post(endpoint)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body);
        sheets.send(req, &self.book.url)?;
        Ok(())
    }
}

/// Extracts the spreadsheet key out of a URL such as
/// `https://docs.google.com/spreadsheets/d/<key>/edit#gid=0`.
pub fn spreadsheet_key(url: &str) -> SheetResult<String> {
    let parsed = Url::parse(url).ok().context(InvalidSheetUrlSnafu { url })?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    let key = segments
        .iter()
        .position(|s| *s == "spreadsheets")
        .and_then(|start| segments[start..].windows(2).find(|w| w[0] == "d"))
        .map(|w| w[1])
        .filter(|k| !k.is_empty());
    key.map(|k| k.to_string())
        .context(InvalidSheetUrlSnafu { url })
}

/// Quotes a worksheet title for use in an A1 range.
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

pub fn json_to_cell(v: &JSValue) -> CellValue {
    match v {
        JSValue::Null => CellValue::Empty,
        JSValue::String(s) if s.is_empty() => CellValue::Empty,
        JSValue::String(s) => CellValue::Text(s.clone()),
        JSValue::Number(n) => match n.as_i64() {
            Some(x) => CellValue::Int(x),
            None => CellValue::Text(n.to_string()),
        },
        JSValue::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => CellValue::Text(other.to_string()),
    }
}

pub fn cell_to_json(c: &CellValue) -> JSValue {
    match c {
        CellValue::Empty => json!(""),
        CellValue::Text(s) => json!(s),
        CellValue::Int(x) => json!(x),
    }
}
