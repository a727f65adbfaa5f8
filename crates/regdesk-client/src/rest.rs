//! Typed HTTP client for the hosted relational backend.
//!
//! The backend exposes each table as a REST resource:
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/rest/v1/{table}?select=...&id_company=eq.{id}&order=created_at.desc` | List |
//! | GET    | `/rest/v1/{table}?select=...&id=eq.{id}` | Get by ID |
//! | POST   | `/rest/v1/{table}?select=...` | Insert (one object or an array) |
//! | PATCH  | `/rest/v1/{table}?id=eq.{id}` | Update |
//! | DELETE | `/rest/v1/{table}?id=eq.{id}` / `?id=in.(...)` | Delete |
//!
//! Related names are embedded through the `select` parameter
//! (`*,domains(name),...`). Writes ask for `Prefer: return=representation`
//! so the affected rows come back in the response, which is also how a
//! write against a missing row is detected.

use std::time::Duration;

use async_trait::async_trait;
use regdesk_core::{
    Company, CompanyId, CompanyPatch, ControlFramework, ControlFrameworkId, ControlFrameworkPatch,
    LawId, LawPatch, LawRegulation, NewCompany, NewControlFramework, NewLaw, NewTag, Table, Tag,
    TagId, TagKind, TagPatch,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{BackendConfig, ConfigError};
use crate::error::StoreError;
use crate::store::RecordStore;

/// Embedded joins for law rows.
const LAW_SELECT: &str = "*,domains(name),activities(name),markets(name)";

/// Embedded joins for control framework rows.
const CONTROL_FRAMEWORK_SELECT: &str =
    "*,domains(name),activities(name),markets(name),laws_and_regulations(name,description,source)";

/// Newest first.
const ORDER: &str = "created_at.desc";

/// Maximum identifiers per `id=in.(...)` filter, keeping URLs short.
const DELETE_CHUNK: usize = 100;

/// Pause before each repeat of a read or idempotent write whose transport
/// failed. Four attempts in all.
const BACKOFF_MS: [u64; 3] = [200, 400, 800];

type Query = Vec<(&'static str, String)>;

/// HTTP implementation of [`RecordStore`].
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
}

impl RestStore {
    /// Build a client from configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(config.api_key.as_str())
            .map_err(|_| ConfigError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key.as_str()))
            .map_err(|_| ConfigError::InvalidApiKey)?;
        bearer.set_sensitive(true);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.backend_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Send one request. Reads and idempotent writes retry transport
    /// failures; inserts do not.
    async fn send<B>(
        &self,
        method: Method,
        table: Table,
        query: &Query,
        body: Option<&B>,
    ) -> Result<reqwest::Response, StoreError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let endpoint = format!("{method} /{table}");
        let url = self.table_url(table);
        let request = || {
            let mut req = self.http.request(method.clone(), &url).query(query);
            if let Some(body) = body {
                req = req
                    .header("Prefer", "return=representation")
                    .json(body);
            } else if method != Method::GET {
                req = req.header("Prefer", "return=representation");
            }
            req.send()
        };

        tracing::debug!(endpoint = %endpoint, "backend request");
        let backoff: &[u64] = if method == Method::POST { &[] } else { &BACKOFF_MS };
        let mut attempt = 0;
        let result = loop {
            match request().await {
                Err(e) if attempt < backoff.len() => {
                    let wait = Duration::from_millis(backoff[attempt]);
                    attempt += 1;
                    tracing::warn!(endpoint = %endpoint, attempt, ?wait, "backend unreachable, retrying: {e}");
                    tokio::time::sleep(wait).await;
                }
                outcome => break outcome,
            }
        };
        let resp = result.map_err(|e| StoreError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(endpoint = %endpoint, status, "backend rejected request");
            return Err(StoreError::Api {
                endpoint,
                status,
                body,
            });
        }
        Ok(resp)
    }

    /// Send a request and decode the returned rows.
    async fn rows<T, B>(
        &self,
        method: Method,
        table: Table,
        query: Query,
        body: Option<&B>,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let endpoint = format!("{method} /{table}");
        let resp = self.send(method, table, &query, body).await?;
        resp.json().await.map_err(|e| StoreError::Deserialization {
            endpoint,
            source: e,
        })
    }

    async fn list<T: DeserializeOwned>(
        &self,
        table: Table,
        select: &str,
        company: Option<CompanyId>,
    ) -> Result<Vec<T>, StoreError> {
        let mut query: Query = vec![("select", select.to_string()), ("order", ORDER.to_string())];
        if let Some(company) = company {
            query.push(("id_company", format!("eq.{company}")));
        }
        self.rows::<T, ()>(Method::GET, table, query, None).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        table: Table,
        select: &str,
        id: impl std::fmt::Display,
    ) -> Result<T, StoreError> {
        let query: Query = vec![("select", select.to_string()), ("id", format!("eq.{id}"))];
        self.rows::<T, ()>(Method::GET, table, query, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(table, id))
    }

    async fn insert<T, B>(&self, table: Table, select: &str, body: &B) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let query: Query = vec![("select", select.to_string())];
        self.rows(Method::POST, table, query, Some(body)).await
    }

    async fn update<T, B>(
        &self,
        table: Table,
        select: &str,
        id: impl std::fmt::Display,
        body: &B,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let query: Query = vec![("select", select.to_string()), ("id", format!("eq.{id}"))];
        self.rows(Method::PATCH, table, query, Some(body))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(table, id))
    }

    async fn delete(&self, table: Table, id: impl std::fmt::Display) -> Result<(), StoreError> {
        let query: Query = vec![("select", "id".to_string()), ("id", format!("eq.{id}"))];
        let deleted: Vec<serde_json::Value> =
            self.rows::<_, ()>(Method::DELETE, table, query, None).await?;
        if deleted.is_empty() {
            return Err(StoreError::not_found(table, id));
        }
        Ok(())
    }
}

fn first<T>(rows: Vec<T>, table: Table) -> Result<T, StoreError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(table, "inserted row"))
}

#[async_trait]
impl RecordStore for RestStore {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        self.list(Table::Companies, "*", None).await
    }

    async fn get_company(&self, id: CompanyId) -> Result<Company, StoreError> {
        self.get(Table::Companies, "*", id).await
    }

    async fn insert_company(&self, new: &NewCompany) -> Result<Company, StoreError> {
        new.validate()?;
        first(self.insert(Table::Companies, "*", new).await?, Table::Companies)
    }

    async fn update_company(
        &self,
        id: CompanyId,
        patch: &CompanyPatch,
    ) -> Result<Company, StoreError> {
        patch.validate()?;
        self.update(Table::Companies, "*", id, patch).await
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        self.delete(Table::Companies, id).await
    }

    async fn list_tags(
        &self,
        kind: TagKind,
        company: Option<CompanyId>,
    ) -> Result<Vec<Tag>, StoreError> {
        self.list(kind.table(), "*", company).await
    }

    async fn get_tag(&self, kind: TagKind, id: TagId) -> Result<Tag, StoreError> {
        self.get(kind.table(), "*", id).await
    }

    async fn insert_tag(&self, kind: TagKind, new: &NewTag) -> Result<Tag, StoreError> {
        new.validate()?;
        first(self.insert(kind.table(), "*", new).await?, kind.table())
    }

    async fn update_tag(
        &self,
        kind: TagKind,
        id: TagId,
        patch: &TagPatch,
    ) -> Result<Tag, StoreError> {
        patch.validate()?;
        self.update(kind.table(), "*", id, patch).await
    }

    async fn delete_tag(&self, kind: TagKind, id: TagId) -> Result<(), StoreError> {
        self.delete(kind.table(), id).await
    }

    async fn list_laws(
        &self,
        company: Option<CompanyId>,
    ) -> Result<Vec<LawRegulation>, StoreError> {
        self.list(Table::Laws, LAW_SELECT, company).await
    }

    async fn get_law(&self, id: LawId) -> Result<LawRegulation, StoreError> {
        self.get(Table::Laws, LAW_SELECT, id).await
    }

    async fn insert_laws(&self, rows: &[NewLaw]) -> Result<Vec<LawRegulation>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        for row in rows {
            row.validate()?;
        }
        self.insert(Table::Laws, LAW_SELECT, rows).await
    }

    async fn update_law(
        &self,
        id: LawId,
        patch: &LawPatch,
    ) -> Result<LawRegulation, StoreError> {
        patch.validate()?;
        self.update(Table::Laws, LAW_SELECT, id, patch).await
    }

    async fn delete_law(&self, id: LawId) -> Result<(), StoreError> {
        self.delete(Table::Laws, id).await
    }

    async fn delete_laws(&self, ids: &[LawId]) -> Result<(), StoreError> {
        for chunk in ids.chunks(DELETE_CHUNK) {
            let list = chunk
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let query: Query = vec![("select", "id".to_string()), ("id", format!("in.({list})"))];
            let _: Vec<serde_json::Value> =
                self.rows::<_, ()>(Method::DELETE, Table::Laws, query, None).await?;
        }
        Ok(())
    }

    async fn list_control_frameworks(
        &self,
        company: Option<CompanyId>,
    ) -> Result<Vec<ControlFramework>, StoreError> {
        self.list(Table::ControlFrameworks, CONTROL_FRAMEWORK_SELECT, company)
            .await
    }

    async fn get_control_framework(
        &self,
        id: ControlFrameworkId,
    ) -> Result<ControlFramework, StoreError> {
        self.get(Table::ControlFrameworks, CONTROL_FRAMEWORK_SELECT, id)
            .await
    }

    async fn insert_control_frameworks(
        &self,
        rows: &[NewControlFramework],
    ) -> Result<Vec<ControlFramework>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        for row in rows {
            row.validate()?;
        }
        self.insert(Table::ControlFrameworks, CONTROL_FRAMEWORK_SELECT, rows)
            .await
    }

    async fn update_control_framework(
        &self,
        id: ControlFrameworkId,
        patch: &ControlFrameworkPatch,
    ) -> Result<ControlFramework, StoreError> {
        patch.validate()?;
        self.update(Table::ControlFrameworks, CONTROL_FRAMEWORK_SELECT, id, patch)
            .await
    }

    async fn delete_control_framework(&self, id: ControlFrameworkId) -> Result<(), StoreError> {
        self.delete(Table::ControlFrameworks, id).await
    }

    async fn verify_control_frameworks(&self, company: CompanyId) -> Result<usize, StoreError> {
        let query: Query = vec![
            ("select", "id".to_string()),
            ("id_company", format!("eq.{company}")),
            ("verified", "eq.false".to_string()),
        ];
        let body = serde_json::json!({ "verified": true });
        let changed: Vec<serde_json::Value> = self
            .rows(Method::PATCH, Table::ControlFrameworks, query, Some(&body))
            .await?;
        tracing::info!(company = %company, verified = changed.len(), "control framework submitted");
        Ok(changed.len())
    }
}
