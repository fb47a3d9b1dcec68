// The seams between the submission pipeline and the spreadsheet service.

use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, info};

use villa_survey::{CellValue, Record};

use crate::villa::credentials::CredentialBundle;
use crate::villa::SheetResult;

/// The cache window of an authenticated client.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Where the service account credentials come from.
pub trait SecretStore {
    fn load(&self) -> SheetResult<CredentialBundle>;
}

/// Authenticates against the spreadsheet service.
pub trait Connector {
    fn connect(&self, credentials: &CredentialBundle) -> SheetResult<Rc<dyn Spreadsheets>>;
}

/// An authenticated handle to the spreadsheet service.
pub trait Spreadsheets {
    fn open_by_url(&self, url: &str) -> SheetResult<Box<dyn Spreadsheet + '_>>;
}

pub trait Spreadsheet {
    fn worksheet(&self, title: &str) -> SheetResult<Box<dyn Worksheet + '_>>;
}

pub trait Worksheet {
    /// All the rows below the header, keyed by the header.
    fn all_records(&self) -> SheetResult<Vec<Record>>;
    /// The content of a row as strings. Rows start at 1.
    fn row_values(&self, row: usize) -> SheetResult<Vec<String>>;
    /// Adds a row after the last non-empty row.
    fn append_row(&self, values: &[CellValue]) -> SheetResult<()>;
}

struct CachedClient {
    created: Instant,
    client: Rc<dyn Spreadsheets>,
}

/// Builds the authenticated client on demand and keeps it for the cache window.
///
/// Failed attempts are not kept: the next call tries again.
pub struct ClientProvider {
    secrets: Box<dyn SecretStore>,
    connector: Box<dyn Connector>,
    ttl: Duration,
    cached: Option<CachedClient>,
}

impl ClientProvider {
    pub fn new(
        secrets: impl SecretStore + 'static,
        connector: impl Connector + 'static,
        ttl: Duration,
    ) -> ClientProvider {
        ClientProvider {
            secrets: Box::new(secrets),
            connector: Box::new(connector),
            ttl,
            cached: None,
        }
    }

    pub fn get_client(&mut self) -> SheetResult<Rc<dyn Spreadsheets>> {
        if let Some(c) = &self.cached {
            if c.created.elapsed() < self.ttl {
                debug!("get_client: reusing client from {:?} ago", c.created.elapsed());
                return Ok(c.client.clone());
            }
            info!("get_client: cache window of {:?} elapsed", self.ttl);
        }
        self.cached = None;

        let credentials = self.secrets.load()?;
        debug!("get_client: connecting as {}", credentials.client_email);
        let client = self.connector.connect(&credentials)?;
        self.cached = Some(CachedClient {
            created: Instant::now(),
            client: client.clone(),
        });
        Ok(client)
    }

    /// Drops the cached client. The next call to [ClientProvider::get_client] authenticates again.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
