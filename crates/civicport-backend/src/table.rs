//! PostgREST-style table access
//!
//! A thin query builder over the backend's REST surface. Filters render as
//! `column=eq.value` query parameters; writes ask for the changed rows back
//! with `Prefer: return=representation`.

use crate::client::{map_send_err, BackendClient};
use civicport_core::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct SelectQuery<'a> {
    client: &'a BackendClient,
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
}

impl<'a> SelectQuery<'a> {
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn neq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("neq.{}", value.to_string())));
        self
    }

    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("gte.{}", value.to_string())));
        self
    }

    pub fn lt(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("lt.{}", value.to_string())));
        self
    }

    pub fn order(mut self, column: &str, descending: bool) -> Self {
        let dir = if descending { "desc" } else { "asc" };
        self.order = Some(format!("{column}.{dir}"));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.filters.iter().cloned());
        if let Some(ref order) = self.order {
            params.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let response = self
            .client
            .client
            .get(self.client.rest_url(&self.table))
            .query(&self.params())
            .header("apikey", &self.client.anon_key)
            .bearer_auth(self.client.table_key())
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(BackendClient::error_from(response).await);
        }
        response.json::<Vec<T>>().await.map_err(map_send_err)
    }

    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let mut rows = self.limit(1).fetch::<T>().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }
}

pub struct UpdateQuery<'a> {
    client: &'a BackendClient,
    table: String,
    filters: Vec<(String, String)>,
    patch: serde_json::Value,
}

impl<'a> UpdateQuery<'a> {
    pub fn set(mut self, patch: impl Serialize) -> Result<Self> {
        self.patch = serde_json::to_value(patch)?;
        Ok(self)
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Apply the patch, returning the updated rows.
    pub async fn execute<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let response = self
            .client
            .client
            .patch(self.client.rest_url(&self.table))
            .query(&self.filters)
            .header("apikey", &self.client.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.client.table_key())
            .json(&self.patch)
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(BackendClient::error_from(response).await);
        }
        response.json::<Vec<T>>().await.map_err(map_send_err)
    }
}

pub struct DeleteQuery<'a> {
    client: &'a BackendClient,
    table: String,
    filters: Vec<(String, String)>,
}

impl<'a> DeleteQuery<'a> {
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub async fn execute(self) -> Result<()> {
        let response = self
            .client
            .client
            .delete(self.client.rest_url(&self.table))
            .query(&self.filters)
            .header("apikey", &self.client.anon_key)
            .bearer_auth(self.client.table_key())
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(BackendClient::error_from(response).await);
        }
        Ok(())
    }
}

impl BackendClient {
    /// Start a select against a table.
    pub fn from(&self, table: &str) -> SelectQuery<'_> {
        SelectQuery {
            client: self,
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Insert rows, returning them as stored (ids, defaults filled in).
    pub async fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        rows: &[T],
    ) -> Result<Vec<R>> {
        let response = self
            .client
            .post(self.rest_url(table))
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.table_key())
            .json(rows)
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response.json::<Vec<R>>().await.map_err(map_send_err)
    }

    pub fn update(&self, table: &str) -> UpdateQuery<'_> {
        UpdateQuery {
            client: self,
            table: table.to_string(),
            filters: Vec::new(),
            patch: serde_json::Value::Null,
        }
    }

    pub fn delete(&self, table: &str) -> DeleteQuery<'_> {
        DeleteQuery {
            client: self,
            table: table.to_string(),
            filters: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        BackendClient::new("https://db.example.gov", "anon")
    }

    #[test]
    fn select_params_render_postgrest_operators() {
        let c = client();
        let q = c
            .from("appointments")
            .select("id,status")
            .eq("citizen_id", "u-1")
            .neq("status", "cancelled")
            .order("scheduled_at", false)
            .limit(20);
        let params = q.params();
        assert!(params.contains(&("select".to_string(), "id,status".to_string())));
        assert!(params.contains(&("citizen_id".to_string(), "eq.u-1".to_string())));
        assert!(params.contains(&("status".to_string(), "neq.cancelled".to_string())));
        assert!(params.contains(&("order".to_string(), "scheduled_at.asc".to_string())));
        assert!(params.contains(&("limit".to_string(), "20".to_string())));
    }

    #[test]
    fn select_defaults_to_star() {
        let c = client();
        let q = c.from("issues");
        assert!(q.params().contains(&("select".to_string(), "*".to_string())));
    }

    #[test]
    fn range_filters_render() {
        let c = client();
        let q = c
            .from("appointments")
            .gte("scheduled_at", "2026-08-05T00:00:00Z")
            .lt("scheduled_at", "2026-08-06T00:00:00Z");
        let params = q.params();
        assert!(params.contains(&(
            "scheduled_at".to_string(),
            "gte.2026-08-05T00:00:00Z".to_string()
        )));
        assert!(params.contains(&(
            "scheduled_at".to_string(),
            "lt.2026-08-06T00:00:00Z".to_string()
        )));
    }
}
