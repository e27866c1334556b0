pub mod range;
pub mod serde_impl;

use std::{error::Error as StdError, fmt::Display, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use google_sheets4::{
    api::{self as sheets4, RowData},
    hyper::client::HttpConnector,
    hyper_rustls::HttpsConnector,
    Error as SheetsError, FieldMask, Sheets,
};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::time::Instant;

use self::range::SheetRange;
use self::serde_impl::{Error as SerdeError, RowDeserializer, RowSerializer};
use crate::{next_version, prelude::*, retry::RetryPolicy, Rows};

pub type Hub = Sheets<HttpsConnector<HttpConnector>>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Sheets(SheetsError),
    Serde(SerdeError),
}

impl Error {
    /// Rate limits, server faults and dropped connections are worth another try.
    pub fn is_transient(&self) -> bool {
        let code_is_transient = |code: u64| code == 429 || (500..600).contains(&code);

        match self {
            Error::Sheets(SheetsError::HttpError(_)) | Error::Sheets(SheetsError::Io(_)) => true,
            Error::Sheets(SheetsError::Failure(response)) => {
                code_is_transient(response.status().as_u16() as u64)
            }
            Error::Sheets(SheetsError::BadRequest(body)) => body
                .pointer("/error/code")
                .and_then(serde_json::Value::as_u64)
                .map_or(false, code_is_transient),
            _ => false,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Sheets(e) => write!(f, "sheets error: {}", e),
            Error::Serde(e) => write!(f, "row codec error: {}", e),
        }
    }
}

impl StdError for Error {}

impl From<SerdeError> for Error {
    fn from(e: SerdeError) -> Self {
        Error::Serde(e)
    }
}

/// Where a table lives inside the spreadsheet.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SheetArgs {
    /// Numeric id of the tab, the `gid` in its url.
    pub id: i32,
    pub data_range: SheetRange,
    /// A cell whose value changes whenever the tab is edited.
    pub meta_range: Option<SheetRange>,
}

#[derive(Serialize, Deserialize)]
struct MetaEntry {
    hash: String,
}

/// One tab of a spreadsheet holding a row per entry.
pub struct Sheet<E> {
    hub: Arc<Hub>,
    spreadsheet_id: String,
    args: SheetArgs,
    retry: RetryPolicy,
    version: u64,
    version_hash: Option<String>,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Sheet<E> {
    pub fn new(hub: Arc<Hub>, spreadsheet_id: String, args: SheetArgs, retry: RetryPolicy) -> Self {
        Self {
            hub,
            spreadsheet_id,
            args,
            retry,
            version: next_version(),
            version_hash: None,
            _marker: PhantomData,
        }
    }

    pub fn args(&self) -> &SheetArgs {
        &self.args
    }

    fn field_mask() -> Option<FieldMask> {
        "userEnteredValue".parse().ok()
    }

    async fn read_values(&self, range: &SheetRange) -> Result<Vec<Vec<serde_json::Value>>> {
        let hub = &self.hub;
        let spreadsheet_id = &self.spreadsheet_id;
        let range = &range.to_string();

        let (_, value_range) = self
            .retry
            .run(&format!("read {}", range), Error::is_transient, || async move {
                hub.spreadsheets()
                    .values_get(spreadsheet_id, range)
                    .value_render_option("UNFORMATTED_VALUE")
                    .doit()
                    .await
                    .map_err(Error::Sheets)
            })
            .await?;

        Ok(value_range.values.unwrap_or_default())
    }

    async fn batch_update(&mut self, what: &str, requests: Vec<sheets4::Request>) -> Result<()> {
        let request = sheets4::BatchUpdateSpreadsheetRequest {
            include_spreadsheet_in_response: Some(false),
            requests: Some(requests),
            response_include_grid_data: Some(false),
            response_ranges: None,
        };

        let hub = &self.hub;
        let spreadsheet_id = &self.spreadsheet_id;
        let request = &request;

        self.retry
            .run(what, Error::is_transient, || async move {
                hub.spreadsheets()
                    .batch_update(request.clone(), spreadsheet_id)
                    .doit()
                    .await
                    .map_err(Error::Sheets)
            })
            .await?;

        self.fetch_version().await
    }

    async fn fetch_version(&mut self) -> Result<()> {
        let range = match self.args.meta_range {
            Some(ref range) => range.clone(),
            None => {
                self.version = next_version();
                return Ok(());
            }
        };

        let values = self.read_values(&range).await?;
        let hash = match values.first() {
            Some(cells) => MetaEntry::deserialize(&mut RowDeserializer::new(cells))?.hash,
            None => String::new(),
        };

        if self.version_hash.as_ref() != Some(&hash) {
            debug!("Meta hash of {} is now {:?}", self.args.data_range.sheet_name, hash);
            self.version = next_version();
            self.version_hash = Some(hash);
        }

        Ok(())
    }
}

fn to_rows<E: Serialize>(entries: &[E]) -> Result<Vec<RowData>> {
    entries
        .iter()
        .map(|entry| RowSerializer::row(entry).map_err(Error::Serde))
        .collect()
}

#[async_trait]
impl<E: DeserializeOwned + Send + 'static> TableFetch<E> for Sheet<E> {
    type Error = Error;

    async fn fetch(&mut self) -> Result<Rows<E>> {
        let now = Instant::now();
        let range = self.args.data_range.with_inf_end();
        let values = self.read_values(&range).await?;
        debug!("Read {} rows of {} in {:?}", values.len(), range, now.elapsed());

        let first_row = self.args.data_range.r_start + 1;
        let rows = values
            .iter()
            .enumerate()
            .map(|(offset, cells)| {
                if RowDeserializer::is_blank_row(cells) {
                    return None;
                }

                match E::deserialize(&mut RowDeserializer::new(cells)) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(
                            "Skipping row {} of {}: {}",
                            first_row + offset,
                            range.sheet_name,
                            e
                        );
                        None
                    }
                }
            })
            .collect();

        Ok(rows)
    }
}

#[async_trait]
impl<E: Serialize + Send + Sync + 'static> TableExtend<E> for Sheet<E> {
    type Error = Error;

    async fn extend(&mut self, entries: &[E]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let request = sheets4::Request {
            append_cells: Some(sheets4::AppendCellsRequest {
                sheet_id: Some(self.args.id),
                rows: Some(to_rows(entries)?),
                fields: Self::field_mask(),
            }),
            ..Default::default()
        };

        let what = format!("append to {}", self.args.data_range.sheet_name);
        self.batch_update(&what, vec![request]).await
    }
}

#[async_trait]
impl<E: Serialize + Send + Sync + 'static> TableUpdate<E> for Sheet<E> {
    type Error = Error;

    async fn update(&mut self, from_row: usize, entries: &[E]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let r_start = self.args.data_range.r_start + from_row;
        let range = self
            .args
            .data_range
            .with_rows(r_start, r_start + entries.len());

        let request = sheets4::Request {
            update_cells: Some(sheets4::UpdateCellsRequest {
                fields: Self::field_mask(),
                range: Some(range.as_grid_range(self.args.id)),
                rows: Some(to_rows(entries)?),
                start: None,
            }),
            ..Default::default()
        };

        let what = format!("update {}", range);
        self.batch_update(&what, vec![request]).await
    }
}

#[async_trait]
impl<E: Send> TableVersion for Sheet<E> {
    type Error = Error;

    async fn version(&mut self) -> Result<u64> {
        self.fetch_version().await?;
        Ok(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quota_and_server_errors_are_transient() {
        let rate_limited = Error::Sheets(SheetsError::BadRequest(json!({
            "error": { "code": 429, "message": "Quota exceeded" }
        })));
        let unavailable = Error::Sheets(SheetsError::BadRequest(json!({
            "error": { "code": 503 }
        })));

        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        let not_found = Error::Sheets(SheetsError::BadRequest(json!({
            "error": { "code": 404 }
        })));
        let codec = Error::Serde(SerdeError::ExpectedNumber);

        assert!(!not_found.is_transient());
        assert!(!codec.is_transient());
    }

    #[test]
    fn args_from_toml() {
        let args: SheetArgs = toml::from_str(
            r#"
            id = 42
            data_range = "Orders!A2:P"
            meta_range = "Meta!B2"
            "#,
        )
        .unwrap();

        assert_eq!(args.id, 42);
        assert_eq!(args.data_range.width(), 16);
        assert_eq!(args.meta_range.map(|r| r.sheet_name), Some("Meta".to_owned()));
    }
}
