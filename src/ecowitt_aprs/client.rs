// ecowitt_aprs - Ecowitt weather station to APRS-IS gateway
//
// Copyright 2024 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use std::error;
use std::fmt;

#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    InvalidUrl(String),
    Unexpected(StatusCode, Url),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::InvalidUrl(u) => write!(f, "invalid APRS-IS URL {}", u),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}

/// Client for submitting packets to the HTTP port of an APRS-IS server.
#[derive(Debug)]
pub struct AprsIsClient {
    client: Client,
    url: Url,
}

impl AprsIsClient {
    const USER_AGENT: &'static str = "ecowitt_aprs (https://github.com/56quarters/ecowitt_aprs)";
    const SUBMIT_CONTENT_TYPE: &'static str = "application/octet-stream";

    pub fn new(client: Client, host: &str, port: u16) -> Result<Self, ClientError> {
        let raw = format!("http://{}:{}/", host, port);
        let url = Url::parse(&raw).map_err(|_| ClientError::InvalidUrl(raw))?;
        Ok(AprsIsClient { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Submit a login line and packet, exactly as given, to the server.
    ///
    /// Any successful (2xx) status is treated as accepted. Failed submissions are
    /// not retried.
    pub async fn send(&self, envelope: String) -> Result<(), ClientError> {
        tracing::debug!(message = "submitting packet to APRS-IS", url = %self.url, num_bytes = envelope.len());

        let res = self
            .client
            .post(self.url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(CONTENT_TYPE, Self::SUBMIT_CONTENT_TYPE)
            .body(envelope)
            .send()
            .await
            .map_err(ClientError::Internal)?;

        let status = res.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Unexpected(status, self.url.clone()))
        }
    }
}
