//! TextVerified Provider Implementation
//!
//! Rents US non-VoIP numbers through the TextVerified v2 public API and
//! reads received SMS back from it.
//!
//! ## Flow
//!
//! - `POST /api/pub/v2/auth` with the API key and username yields a bearer
//!   token, cached until shortly before it expires
//! - `POST /api/pub/v2/verifications` creates a rental and returns a link to it
//! - `GET /api/pub/v2/verifications/{id}` reports the rental state
//! - `GET /api/pub/v2/sms?reservationId={id}` lists the messages received
//! - `POST /api/pub/v2/verifications/{id}/cancel` releases the number

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use sv_core::domain::value_objects::{Money, MONEY_SCALE};
use sv_core::errors::ProviderError;
use sv_core::services::lifecycle::{
    NumberAssignment, NumberRequestOptions, ProviderStatus, SmsProvider,
};
use sv_shared::config::ProviderConfig;
use sv_shared::phone::mask_phone_number;

use crate::InfrastructureError;

/// Tokens are refreshed this long before they expire
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// The only country TextVerified rents numbers in
const SUPPORTED_COUNTRY: &str = "US";

/// TextVerified client configuration
#[derive(Debug, Clone)]
pub struct TextVerifiedConfig {
    /// API base URL, without a trailing slash
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Account username
    pub api_username: String,
    /// Timeout for API requests in seconds
    pub request_timeout_secs: u64,
}

impl TextVerifiedConfig {
    pub fn from_provider_config(config: &ProviderConfig) -> Result<Self, InfrastructureError> {
        if config.api_key.is_empty() || config.api_username.is_empty() {
            return Err(InfrastructureError::Config(
                "TextVerified requires provider.api_key and provider.api_username".to_string(),
            ));
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_username: config.api_username.clone(),
            request_timeout_secs: config.request_timeout_secs,
        })
    }
}

// Wire types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthTokenDto {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateVerificationDto {
    pub service_name: String,
    pub capability: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_code_select_option: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_select_option: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkDto {
    pub href: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerificationDto {
    pub id: String,
    pub number: String,
    pub state: String,
    pub total_cost: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SmsDto {
    #[serde(default)]
    pub sms_content: Option<String>,
    #[serde(default)]
    pub parsed_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SmsListDto {
    #[serde(default)]
    pub data: Vec<SmsDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorDto {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Coarse rental state reported by TextVerified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RentalState {
    /// Still able to receive
    Open,
    /// Completed by the provider after a message arrived
    Completed,
    TimedOut,
    /// Cancelled, refunded or reported
    Closed,
}

impl RentalState {
    pub(crate) fn parse(state: &str) -> Self {
        match state {
            "verificationCompleted" => Self::Completed,
            "verificationTimedOut" => Self::TimedOut,
            "verificationCanceled" | "verificationRefunded" | "verificationReported"
            | "verificationReactivated" => Self::Closed,
            // verificationPending, verificationReused and unknown states keep polling
            _ => Self::Open,
        }
    }
}

/// Fold a rental state and its received messages into a provider status
pub(crate) fn to_provider_status(state: RentalState, messages: &[SmsDto]) -> ProviderStatus {
    let latest = messages
        .iter()
        .rev()
        .find(|sms| sms.parsed_code.as_deref().is_some_and(|code| !code.is_empty()));

    match (state, latest) {
        (RentalState::Closed, _) => ProviderStatus::cancelled(),
        (_, Some(sms)) => ProviderStatus::received(
            sms.parsed_code.clone().unwrap_or_default(),
            sms.sms_content.clone(),
        ),
        (RentalState::TimedOut, None) => ProviderStatus::expired(),
        (RentalState::Open | RentalState::Completed, None) => ProviderStatus::waiting(),
    }
}

/// Map a non-success response to a provider error
pub(crate) fn error_for_status(
    status: StatusCode,
    body: &str,
    service: Option<&str>,
) -> ProviderError {
    let detail: ErrorDto = serde_json::from_str(body).unwrap_or_default();
    let description = detail
        .error_description
        .clone()
        .or(detail.error_code.clone())
        .unwrap_or_else(|| body.chars().take(200).collect());

    let out_of_stock = detail
        .error_code
        .as_deref()
        .is_some_and(|code| code.eq_ignore_ascii_case("OutOfStock"))
        || description.to_ascii_lowercase().contains("no numbers");

    if let (true, Some(service)) = (out_of_stock, service) {
        return ProviderError::NoNumbersAvailable {
            service: service.to_string(),
            country: SUPPORTED_COUNTRY.to_string(),
        };
    }

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return ProviderError::Unavailable {
            message: format!("TextVerified returned {}: {}", status, description),
        };
    }

    ProviderError::Error(format!("TextVerified returned {}: {}", status, description))
}

/// Map a transport error to a provider error
pub(crate) fn error_for_transport(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout
    } else if error.is_connect() {
        ProviderError::Unavailable {
            message: format!("Cannot reach TextVerified: {}", error),
        }
    } else {
        ProviderError::Error(format!("TextVerified request failed: {}", error))
    }
}

pub(crate) fn to_money(cost: Decimal) -> Result<Money, ProviderError> {
    Money::new(cost.round_dp(MONEY_SCALE))
        .map_err(|e| ProviderError::Error(format!("Invalid rental cost {}: {}", cost, e)))
}

/// Extract the rental ID from a `.../verifications/{id}` link
pub(crate) fn id_from_href(href: &str) -> Option<&str> {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now
    }
}

/// TextVerified provider client
pub struct TextVerifiedProvider {
    client: Client,
    config: TextVerifiedConfig,
    token: Mutex<Option<CachedToken>>,
}

impl TextVerifiedProvider {
    /// Create a new TextVerified client
    pub fn new(config: TextVerifiedConfig) -> Result<Self, InfrastructureError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!("TextVerified provider initialized for {}", config.base_url);

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Return a cached bearer token or fetch a new one
    async fn bearer_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }

        debug!("Requesting TextVerified bearer token");
        let response = self
            .client
            .post(self.url("/api/pub/v2/auth"))
            .header("X-API-KEY", &self.config.api_key)
            .header("X-API-USERNAME", &self.config.api_username)
            .send()
            .await
            .map_err(error_for_transport)?;

        let auth: AuthTokenDto = Self::parse(response, None).await?;
        *cached = Some(CachedToken {
            token: auth.token.clone(),
            expires_at: auth.expires_at,
        });
        Ok(auth.token)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    /// Send an authenticated request, dropping the cached token on 401
    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let token = self.bearer_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(error_for_transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("TextVerified rejected the bearer token");
            self.forget_token().await;
        }
        Ok(response)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: Response,
        service: Option<&str>,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body, service));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Error(format!("Invalid TextVerified response: {}", e)))
    }

    async fn fetch_verification(&self, id: &str) -> Result<VerificationDto, ProviderError> {
        let path = format!("/api/pub/v2/verifications/{}", id);
        let response = self.send(self.client.get(self.url(&path))).await?;
        Self::parse(response, None).await
    }

    async fn fetch_messages(&self, id: &str) -> Result<Vec<SmsDto>, ProviderError> {
        let response = self
            .send(
                self.client
                    .get(self.url("/api/pub/v2/sms"))
                    .query(&[("reservationId", id)]),
            )
            .await?;
        let list: SmsListDto = Self::parse(response, None).await?;
        Ok(list.data)
    }
}

#[async_trait]
impl SmsProvider for TextVerifiedProvider {
    async fn request_number(
        &self,
        service: &str,
        country: &str,
        options: &NumberRequestOptions,
    ) -> Result<NumberAssignment, ProviderError> {
        if !country.eq_ignore_ascii_case(SUPPORTED_COUNTRY) {
            return Err(ProviderError::NoNumbersAvailable {
                service: service.to_string(),
                country: country.to_string(),
            });
        }

        let body = CreateVerificationDto {
            service_name: service.to_string(),
            capability: "sms",
            area_code_select_option: options.area_code.clone().map(|code| vec![code]),
            carrier_select_option: options.carrier.clone().map(|carrier| vec![carrier]),
        };

        let response = self
            .send(self.client.post(self.url("/api/pub/v2/verifications")).json(&body))
            .await?;
        let link: LinkDto = Self::parse(response, Some(service)).await?;

        let id = id_from_href(&link.href).ok_or_else(|| {
            ProviderError::Error(format!("Unexpected verification link {}", link.href))
        })?;
        let rental = self.fetch_verification(id).await?;

        info!(
            provider = "textverified",
            activation_id = %rental.id,
            service = %service,
            phone = %mask_phone_number(&rental.number),
            "Number rented"
        );

        Ok(NumberAssignment {
            activation_id: rental.id,
            phone_number: rental.number,
            cost: to_money(rental.total_cost)?,
        })
    }

    async fn get_status(&self, activation_id: &str) -> Result<ProviderStatus, ProviderError> {
        let rental = self.fetch_verification(activation_id).await?;
        let state = RentalState::parse(&rental.state);

        let messages = match state {
            RentalState::Closed => Vec::new(),
            _ => self.fetch_messages(activation_id).await?,
        };

        Ok(to_provider_status(state, &messages))
    }

    async fn cancel_number(&self, activation_id: &str) -> Result<(), ProviderError> {
        let path = format!("/api/pub/v2/verifications/{}/cancel", activation_id);
        let response = self.send(self.client.post(self.url(&path))).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body, None))
    }

    fn provider_name(&self) -> &str {
        "textverified"
    }
}
