//! Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::{Sheet, SheetRange, TokenProvider};
use crate::error::Res;
use anyhow::Context;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, DateTimeRenderOption, Dimension,
    ValueInputOption, ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

/// Implements the `Sheet` trait with the `sheets` crate. It holds a `TokenProvider` and rebuilds
/// the client whenever the access token changes.
pub(crate) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    access_token: String,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(crate) async fn new(
        spreadsheet_id: impl Into<String>,
        mut token_provider: TokenProvider,
    ) -> Res<Self> {
        let access_token = token_provider.token().await?;
        let client = create_sheets_client(&access_token);
        Ok(Self {
            spreadsheet_id: spreadsheet_id.into(),
            token_provider,
            access_token,
            client,
        })
    }

    /// Makes sure the client carries an access token that is not about to expire.
    async fn refresh_client(&mut self) -> Res<()> {
        let access_token = self.token_provider.token().await?;
        if access_token != self.access_token {
            trace!("Access token changed, rebuilding the sheets client");
            self.client = create_sheets_client(&access_token);
            self.access_token = access_token;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>> {
        trace!("get for {sheet_name}");
        self.refresh_client().await?;
        let range = super::range(sheet_name, "A:ZZ");
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch the '{sheet_name}' sheet"))?;
        trace!("Received {} rows from {sheet_name}", response.body.values.len());
        Ok(response.body.values)
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()> {
        trace!("write_ranges for {} ranges", data.len());
        self.refresh_client().await?;
        let value_ranges: Vec<ValueRange> = data
            .iter()
            .map(|sr| ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: sr.range.clone(),
                values: sr.values.clone(),
            })
            .collect();

        let request = BatchUpdateValuesRequest {
            data: value_ranges,
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .context("Failed to write ranges")?;
        Ok(())
    }

    async fn clear_ranges(&mut self, ranges: &[String]) -> Res<()> {
        trace!("clear_ranges for {ranges:?}");
        self.refresh_client().await?;
        let request = BatchClearValuesRequest {
            ranges: ranges.to_vec(),
        };
        self.client
            .spreadsheets()
            .values_batch_clear(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to clear ranges: {ranges:?}"))?;
        Ok(())
    }
}

/// Creates a sheets client that authenticates with `access_token`.
fn create_sheets_client(access_token: &str) -> sheets::Client {
    // The client wants OAuth client settings and a refresh token too, but only the access token is
    // used for API calls. Refreshing is handled by `TokenProvider`.
    sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    )
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::from(e).context(error_name)
}
