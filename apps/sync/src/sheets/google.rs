//! Google Sheets v4 REST backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{Config, SheetSettings};
use crate::models::row::COLUMN_COUNT;
use crate::sheets::{check_row_count, RowSpan, SheetBackend, SheetError};

/// Last column letter of the fixed schema (22 columns → V).
const LAST_COLUMN: char = (b'A' + COLUMN_COUNT as u8 - 1) as char;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_cells: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GoogleSheets {
    client: Client,
    base_url: Url,
    settings: SheetSettings,
}

impl GoogleSheets {
    pub fn new(config: &Config) -> Result<Self, SheetError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(format!("sheet-sync/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.sheets.api_url).map_err(|e| {
            SheetError::InvalidUrl(format!("SHEETS_API_URL '{}': {e}", config.sheets.api_url))
        })?;

        Ok(Self {
            client,
            base_url,
            settings: config.sheets.clone(),
        })
    }

    /// Appends path segments to the API base. Each segment is percent-encoded,
    /// so `#`, `?` or spaces in a tab name stay inside the path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SheetError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn values_url(&self, rows: RowSpan) -> Result<Url, SheetError> {
        let range = a1_range(&self.settings.sheet_name, rows);
        self.endpoint(&[
            "v4",
            "spreadsheets",
            &self.settings.spreadsheet_id,
            "values",
            &range,
        ])
    }

    fn batch_update_url(&self) -> Result<Url, SheetError> {
        let target = format!("{}:batchUpdate", self.settings.spreadsheet_id);
        self.endpoint(&["v4", "spreadsheets", &target])
    }

    fn grid_range(&self, rows: RowSpan) -> Value {
        json!({
            "sheetId": self.settings.sheet_gid,
            "startRowIndex": rows.start,
            "endRowIndex": rows.end,
            "startColumnIndex": 0,
            "endColumnIndex": COLUMN_COUNT,
        })
    }

    async fn batch_update(&self, request: Value) -> Result<(), SheetError> {
        let body = json!({ "requests": [request] });
        let _: Value = send(
            self.client
                .post(self.batch_update_url()?)
                .json(&body),
            &self.settings.access_token,
        )
        .await?;
        Ok(())
    }
}

/// A1 notation for a row span over columns A:V. The tab name is always quoted.
pub fn a1_range(sheet_name: &str, rows: RowSpan) -> String {
    format!(
        "'{}'!A{}:{}{}",
        sheet_name.replace('\'', "''"),
        rows.start + 1,
        LAST_COLUMN,
        rows.end
    )
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, token: &str) -> Result<T, SheetError> {
    let response = request.bearer_auth(token).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(SheetError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl SheetBackend for GoogleSheets {
    async fn read_rows(&self, rows: RowSpan) -> Result<Vec<Vec<Value>>, SheetError> {
        let range: ValueRange = send(
            self.client.get(self.values_url(rows)?),
            &self.settings.access_token,
        )
        .await?;
        Ok(range.values.unwrap_or_default())
    }

    async fn write_rows(&self, rows: RowSpan, values: &[Vec<Value>]) -> Result<u64, SheetError> {
        check_row_count(rows, values)?;
        let body = json!({
            "range": a1_range(&self.settings.sheet_name, rows),
            "majorDimension": "ROWS",
            "values": values,
        });
        let response: UpdateValuesResponse = send(
            self.client
                .put(self.values_url(rows)?)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
            &self.settings.access_token,
        )
        .await?;
        let cells = response.updated_cells.unwrap_or(0);
        debug!(cells, start = rows.start, end = rows.end, "Wrote rows");
        Ok(cells)
    }

    async fn insert_blank_rows(&self, rows: RowSpan) -> Result<(), SheetError> {
        self.batch_update(json!({
            "insertRange": {
                "range": self.grid_range(rows),
                "shiftDimension": "ROWS",
            }
        }))
        .await
    }

    async fn delete_rows(&self, rows: RowSpan) -> Result<(), SheetError> {
        self.batch_update(json!({
            "deleteRange": {
                "range": self.grid_range(rows),
                "shiftDimension": "ROWS",
            }
        }))
        .await
    }

    async fn bold_rows(&self, rows: RowSpan) -> Result<(), SheetError> {
        self.batch_update(json!({
            "repeatCell": {
                "range": {
                    "sheetId": self.settings.sheet_gid,
                    "startRowIndex": rows.start,
                    "endRowIndex": rows.end,
                },
                "cell": {
                    "userEnteredFormat": { "textFormat": { "bold": true } }
                },
                "fields": "userEnteredFormat.textFormat.bold",
            }
        }))
        .await
    }
}
