//! [`MatchStore`] implementation over the hosted table API.
//!
//! The table store speaks PostgREST conventions: filters are query-string
//! operators (`id=eq.X`, `player2_id=is.null`), writes return the stored
//! row when asked via `Prefer: return=representation`.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::backend::store::MatchStore;
use crate::backend::{
    BackendError, CounterPatch, MatchPatch, MatchRow, NewMatch, NewMove, NewProfile, ProfileRow,
};
use crate::config::BackendConfig;

const OBJECT_ACCEPT: &str = "application/vnd.pgrst.object+json";

/// Table store client bound to one authenticated session.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: String,
}

impl RestStore {
    /// Creates a store client for the given session token.
    #[instrument(skip(config, access_token), fields(base_url = %config.base_url()))]
    pub fn new(config: &BackendConfig, access_token: String) -> Self {
        debug!("Creating RestStore");
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.api_key().clone(),
            access_token,
        }
    }

    fn table_url(&self, table: &str, query: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.base_url, table, query)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.access_token)
    }

    /// GET expecting exactly one row.
    async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<T, BackendError> {
        let url = self.table_url(table, query);
        debug!(url = %url, "Fetching single row");
        let response = self
            .authed(self.client.get(&url))
            .header("Accept", OBJECT_ACCEPT)
            .send()
            .await?;
        Self::parse_body(response).await
    }

    /// GET expecting zero or one rows.
    async fn get_maybe<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Option<T>, BackendError> {
        let url = self.table_url(table, query);
        debug!(url = %url, "Fetching optional row");
        let response = self.authed(self.client.get(&url)).send().await?;
        let mut rows: Vec<T> = Self::parse_body(response).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// POST returning the stored row.
    async fn post_returning<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        debug!(url = %url, "Inserting row");
        let response = self
            .authed(self.client.post(&url))
            .header("Accept", OBJECT_ACCEPT)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Self::parse_body(response).await
    }

    /// PATCH returning the updated row.
    async fn patch_returning<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.table_url(table, query);
        debug!(url = %url, "Updating row");
        let response = self
            .authed(self.client.patch(&url))
            .header("Accept", OBJECT_ACCEPT)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Self::parse_body(response).await
    }

    async fn parse_body<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = %status, body = %text, "Table store request rejected");
            return Err(BackendError::new(format!(
                "table store request failed with status {status}: {text}"
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl MatchStore for RestStore {
    #[instrument(skip(self))]
    async fn fetch_match(&self, id: &str) -> Result<MatchRow, BackendError> {
        self.get_one("matches", &format!("id=eq.{id}&select=*")).await
    }

    #[instrument(skip(self, new), fields(player1_id = %new.player1_id, is_private = new.is_private))]
    async fn insert_match(&self, new: NewMatch) -> Result<MatchRow, BackendError> {
        self.post_returning("matches", &new).await
    }

    #[instrument(skip(self, patch))]
    async fn update_match(&self, id: &str, patch: MatchPatch) -> Result<MatchRow, BackendError> {
        self.patch_returning("matches", &format!("id=eq.{id}"), &patch)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_match(&self, id: &str) -> Result<(), BackendError> {
        let url = self.table_url("matches", &format!("id=eq.{id}"));
        let response = self.authed(self.client.delete(&url)).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::new(format!(
                "delete failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_waiting_public(
        &self,
        exclude_player: &str,
    ) -> Result<Option<MatchRow>, BackendError> {
        let query = format!(
            "status=eq.waiting&is_private=eq.false&player1_id=neq.{exclude_player}\
             &player2_id=is.null&select=*&limit=1"
        );
        self.get_maybe("matches", &query).await
    }

    #[instrument(skip(self))]
    async fn find_waiting_by_code(&self, code: &str) -> Result<Option<MatchRow>, BackendError> {
        let query = format!("code=eq.{code}&status=eq.waiting&player2_id=is.null&select=*");
        self.get_maybe("matches", &query).await
    }

    #[instrument(skip(self))]
    async fn code_exists(&self, code: &str) -> Result<bool, BackendError> {
        let row: Option<serde_json::Value> = self
            .get_maybe("matches", &format!("code=eq.{code}&select=id"))
            .await?;
        Ok(row.is_some())
    }

    #[instrument(skip(self, mv), fields(match_id = %mv.match_id, position = mv.position))]
    async fn insert_move(&self, mv: NewMove) -> Result<(), BackendError> {
        let url = format!("{}/rest/v1/moves", self.base_url);
        let response = self.authed(self.client.post(&url)).json(&mv).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::new(format!(
                "move insert failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, BackendError> {
        self.get_maybe("user_profiles", &format!("id=eq.{user_id}&select=*"))
            .await
    }

    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    async fn insert_profile(&self, profile: NewProfile) -> Result<ProfileRow, BackendError> {
        self.post_returning("user_profiles", &profile).await
    }

    #[instrument(skip(self, counters))]
    async fn update_counters(
        &self,
        user_id: &str,
        counters: CounterPatch,
    ) -> Result<(), BackendError> {
        let _: ProfileRow = self
            .patch_returning("user_profiles", &format!("id=eq.{user_id}"), &counters)
            .await?;
        Ok(())
    }
}
