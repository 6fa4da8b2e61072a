//! Query builders for the PostgREST-style data store API

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::error::Error;
use crate::fetch::Fetch;

const CLIENT_INFO: &str = "sumbong/0.1.0";

/// Count precision requested from the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountOption {
    /// Exact count
    Exact,

    /// Planned count (estimated from query planner statistics)
    Planned,

    /// Estimated count
    Estimated,
}

impl CountOption {
    /// Convert the option to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CountOption::Exact => "exact",
            CountOption::Planned => "planned",
            CountOption::Estimated => "estimated",
        }
    }
}

/// Base query builder
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    params: HashMap<String, String>,
}

impl QueryBuilder {
    /// Create a new QueryBuilder
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
        }
    }

    /// Add a parameter to the query
    pub fn add_param(&mut self, key: &str, value: &str) {
        self.params.insert(key.to_string(), value.to_string());
    }

    /// Get the query parameters
    pub fn get_params(&self) -> &HashMap<String, String> {
        &self.params
    }
}

/// Client for operations on one table or view
pub struct TableClient {
    /// Request URL for the table
    url: String,

    /// The API key used for this table's operations
    key: String,

    /// HTTP client
    client: Client,
}

impl TableClient {
    /// Create a new TableClient
    pub(crate) fn new(url: String, key: String, client: Client) -> Self {
        Self { url, key, client }
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(
            self.url.clone(),
            self.key.clone(),
            columns,
            self.client.clone(),
        )
    }

    /// Insert data into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(
            self.url.clone(),
            self.key.clone(),
            values,
            self.client.clone(),
        )
    }

    /// Update data in the table
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(
            self.url.clone(),
            self.key.clone(),
            values,
            self.client.clone(),
        )
    }

    /// Delete data from the table
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.url.clone(), self.key.clone(), self.client.clone())
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// HTTP client
    client: Client,

    /// Query builder
    query: QueryBuilder,
}

impl SelectBuilder {
    /// Create a new SelectBuilder
    pub fn new(url: String, key: String, columns: &str, client: Client) -> Self {
        let mut query = QueryBuilder::new();
        query.add_param("select", columns);

        Self {
            url,
            key,
            client,
            query,
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(&mut self, column: &str, value: T) -> &mut Self {
        let filter = format!("eq.{}", value.to_string());
        self.query.add_param(column, &filter);
        self
    }

    /// Limit the number of rows returned
    pub fn limit(&mut self, count: u32) -> &mut Self {
        self.query.add_param("limit", &count.to_string());
        self
    }

    /// Order the results by a column
    pub fn order(&mut self, column: &str, ascending: bool) -> &mut Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.query.add_param("order", &format!("{}.{}", column, direction));
        self
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        let fetch = Fetch::get(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .query(self.query.get_params().clone());

        let result = fetch.execute::<Vec<T>>().await?;
        Ok(result)
    }

    /// Execute the query and return the first row
    pub async fn execute_one<T: DeserializeOwned>(&mut self) -> Result<Option<T>, Error> {
        self.limit(1);

        let results = self.execute::<T>().await?;
        Ok(results.into_iter().next())
    }

    /// Execute the query for its row count only. The count arrives in the
    /// `Content-Range` response header (`items 0-0/n`); no row data is
    /// read.
    pub async fn execute_count(&mut self, option: CountOption) -> Result<u64, Error> {
        self.limit(1);

        let response = Fetch::get(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header("Prefer", &format!("count={}", option.as_str()))
            .query(self.query.get_params().clone())
            .execute_raw()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(Error::persistence(format!(
                "count request failed with status {}: {}",
                status, text
            )));
        }

        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::persistence("store returned no content-range for count"))?;

        parse_content_range_total(range)
            .ok_or_else(|| Error::persistence(format!("unparseable content-range: {}", range)))
    }
}

/// The total after the `/` in a Content-Range value, e.g. `0-0/42` or `*/0`
fn parse_content_range_total(range: &str) -> Option<u64> {
    range.rsplit('/').next()?.trim().parse().ok()
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// The values to insert
    values: T,

    /// HTTP client
    client: Client,

    /// Query builder
    query: QueryBuilder,
}

impl<T: Serialize> InsertBuilder<T> {
    /// Create a new InsertBuilder
    pub fn new(url: String, key: String, values: T, client: Client) -> Self {
        Self {
            url,
            key,
            values,
            client,
            query: QueryBuilder::new(),
        }
    }

    /// Execute the query and return the inserted rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R, Error> {
        let fetch = Fetch::post(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header("Prefer", "return=representation")
            .query(self.query.get_params().clone())
            .json(&self.values)?;

        let result = fetch.execute::<R>().await?;
        Ok(result)
    }

    /// Execute the query and return the raw response. Used where the
    /// caller must branch on the status code (uniqueness violations).
    pub async fn execute_raw(&self) -> Result<reqwest::Response, Error> {
        let fetch = Fetch::post(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header("Prefer", "return=minimal")
            .query(self.query.get_params().clone())
            .json(&self.values)?;

        fetch.execute_raw().await
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// The values to update
    values: T,

    /// HTTP client
    client: Client,

    /// Query builder
    query: QueryBuilder,
}

impl<T: Serialize> UpdateBuilder<T> {
    /// Create a new UpdateBuilder
    pub fn new(url: String, key: String, values: T, client: Client) -> Self {
        Self {
            url,
            key,
            values,
            client,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(&mut self, column: &str, value: V) -> &mut Self {
        let filter = format!("eq.{}", value.to_string());
        self.query.add_param(column, &filter);
        self
    }

    /// Execute the query and return the updated rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R, Error> {
        let fetch = Fetch::patch(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header("Prefer", "return=representation")
            .query(self.query.get_params().clone())
            .json(&self.values)?;

        let result = fetch.execute::<R>().await?;
        Ok(result)
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// HTTP client
    client: Client,

    /// Query builder
    query: QueryBuilder,
}

impl DeleteBuilder {
    /// Create a new DeleteBuilder
    pub fn new(url: String, key: String, client: Client) -> Self {
        Self {
            url,
            key,
            client,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(&mut self, column: &str, value: V) -> &mut Self {
        let filter = format!("eq.{}", value.to_string());
        self.query.add_param(column, &filter);
        self
    }

    /// Execute the query without returning the deleted data
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let fetch = Fetch::delete(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header("Prefer", "return=minimal")
            .query(self.query.get_params().clone());

        let response = fetch.execute_raw().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(Error::persistence(format!(
                "delete failed with status {}: {}",
                status, text
            )));
        }
        Ok(())
    }
}
