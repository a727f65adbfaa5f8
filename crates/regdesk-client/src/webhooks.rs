//! # Generation Webhooks
//!
//! Two external services turn company metadata into proposed compliance
//! records:
//!
//! | Webhook | Request | Response array |
//! |---------|---------|----------------|
//! | laws | [`LawsRequest`] | `laws_and_regulations` |
//! | control framework | [`ControlFrameworkRequest`] | `controlFramework` |
//!
//! Each call is a single JSON `POST`. Success is any 2xx status. Calls are
//! never retried: a repeated call would start a second generation run.
//!
//! Field names follow the services' wire format verbatim, including the
//! `bussinessDomain` and `actitivities` spellings.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::WebhookConfig;
use crate::error::WebhookError;

// -- Wire types -----------------------------------------------------------------

/// A name reference that the services send as a single string, an array of
/// strings, or `null`. Blank entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OneOrMany(pub Vec<String>);

impl OneOrMany {
    /// The names, in the order received.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// First name, if any.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Whether no name was given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for OneOrMany {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'de> Deserialize<'de> for OneOrMany {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<Option<String>>),
        }

        let names = match Option::<Raw>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Raw::One(name)) => vec![name],
            Some(Raw::Many(names)) => names.into_iter().flatten().collect(),
        };
        Ok(Self(
            names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        ))
    }
}

/// Body of the laws-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LawsRequest {
    /// Company website, empty when unknown.
    pub website_url: String,
    /// Company name.
    pub company_name: String,
    /// Unique domain names.
    #[serde(rename = "bussinessDomain")]
    pub business_domains: Vec<String>,
    /// Unique activity names.
    pub activities: Vec<String>,
    /// Unique market names.
    pub markets: Vec<String>,
}

/// One law proposed by the laws webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLaw {
    /// Law name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Source citation.
    #[serde(default)]
    pub source: String,
    /// Country, when the service states one.
    #[serde(default)]
    pub country: Option<String>,
    /// Domain names the law applies to.
    #[serde(default, rename = "bussinessDomain")]
    pub business_domains: OneOrMany,
    /// Activity names.
    #[serde(default)]
    pub activities: OneOrMany,
    /// Market names.
    #[serde(default)]
    pub markets: OneOrMany,
}

/// Response of the laws webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawsResponse {
    /// Proposed laws.
    #[serde(default)]
    pub laws_and_regulations: Vec<GeneratedLaw>,
}

/// Summary of an existing law sent to the control-framework webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawSummary {
    /// Law name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Country.
    pub country: String,
    /// Source citation.
    pub source: String,
    /// Joined domain name.
    #[serde(rename = "bussinessDomain")]
    pub business_domain: Option<String>,
    /// Joined activity name.
    #[serde(rename = "actitivities")]
    pub activity: Option<String>,
}

/// Body of the control-framework-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFrameworkRequest {
    /// Company website, empty when unknown.
    pub website_url: String,
    /// Company name.
    pub company_name: String,
    /// Company domains plus law-linked domains, deduplicated.
    #[serde(rename = "bussinessDomain")]
    pub business_domains: Vec<String>,
    /// Company activities plus law-linked activities, deduplicated.
    pub activities: Vec<String>,
    /// Unique market names.
    pub markets: Vec<String>,
    /// The company's current laws.
    #[serde(rename = "laws_and_regulations")]
    pub laws_and_regulations: Vec<LawSummary>,
}

/// One control proposed by the control-framework webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedControl {
    /// Compliance context.
    #[serde(default)]
    pub context: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Domain name.
    #[serde(default, rename = "bussinessDomain")]
    pub business_domain: OneOrMany,
    /// Activity name.
    #[serde(default)]
    pub activities: OneOrMany,
    /// Market name.
    #[serde(default)]
    pub markets: OneOrMany,
    /// Name of the law the control implements.
    #[serde(default)]
    pub regulations: OneOrMany,
    /// Country.
    #[serde(default)]
    pub country_applied: Option<String>,
    /// Risk-management narrative.
    #[serde(default)]
    pub risk_management: Option<String>,
    /// Referral source.
    #[serde(default)]
    pub referral_source: Option<String>,
}

/// Response of the control-framework webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFrameworkResponse {
    /// Proposed controls.
    #[serde(default)]
    pub control_framework: Vec<GeneratedControl>,
}

// -- Generator ------------------------------------------------------------------

/// Something that proposes laws and controls for a company.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Ask for the laws that apply to the described company.
    async fn generate_laws(&self, request: &LawsRequest) -> Result<LawsResponse, WebhookError>;

    /// Ask for controls covering the described company and its laws.
    async fn generate_control_framework(
        &self,
        request: &ControlFrameworkRequest,
    ) -> Result<ControlFrameworkResponse, WebhookError>;
}

/// HTTP client for the two generation webhooks.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    laws_url: String,
    control_framework_url: String,
}

impl GenerationClient {
    /// Build a client from configuration.
    pub fn new(config: &WebhookConfig) -> Result<Self, WebhookError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WebhookError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            laws_url: config.laws_url.to_string(),
            control_framework_url: config.control_framework_url.to_string(),
        })
    }

    async fn post<Req, Resp>(&self, endpoint: &str, url: &str, body: &Req) -> Result<Resp, WebhookError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let started = std::time::Instant::now();
        tracing::info!(endpoint, "calling generation webhook");

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| WebhookError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = status.as_u16(), "generation webhook failed");
            return Err(WebhookError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed = resp.json().await.map_err(|e| WebhookError::Deserialization {
            endpoint: endpoint.to_string(),
            source: e,
        })?;
        tracing::info!(
            endpoint,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation webhook answered"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl Generator for GenerationClient {
    async fn generate_laws(&self, request: &LawsRequest) -> Result<LawsResponse, WebhookError> {
        self.post("POST webhook/laws", &self.laws_url, request).await
    }

    async fn generate_control_framework(
        &self,
        request: &ControlFrameworkRequest,
    ) -> Result<ControlFrameworkResponse, WebhookError> {
        self.post(
            "POST webhook/control-framework",
            &self.control_framework_url,
            request,
        )
        .await
    }
}
