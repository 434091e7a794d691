//! reqwest-backed implementation of the backend API

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::config::Config;
use crate::models::{
    Envelope, ListQuery, LoginResponse, PageState, Paginated, Record, RecordId, RecordPage, User,
};
use crate::session::Credential;

/// Operations the console needs from the backend.
///
/// Success is HTTP 200 or 201; every other status, and any transport
/// failure, is an error.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// Exchange a username and password for a bearer token
    async fn login(&self, name: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn logout(&self, credential: &Credential) -> Result<(), ApiError>;

    /// Profile of the logged-in user
    async fn current_user(&self, credential: &Credential) -> Result<User, ApiError>;

    /// Read one page of a resource
    async fn list(
        &self,
        credential: &Credential,
        resource: &str,
        query: ListQuery,
    ) -> Result<RecordPage, ApiError>;

    /// Read a single record
    async fn fetch(
        &self,
        credential: &Credential,
        resource: &str,
        id: &RecordId,
    ) -> Result<Record, ApiError>;

    /// Create a record; the backend may or may not echo it back
    async fn create(
        &self,
        credential: &Credential,
        resource: &str,
        draft: &Record,
    ) -> Result<Option<Record>, ApiError>;

    async fn update(
        &self,
        credential: &Credential,
        resource: &str,
        id: &RecordId,
        draft: &Record,
    ) -> Result<Option<Record>, ApiError>;

    async fn delete(
        &self,
        credential: &Credential,
        resource: &str,
        id: &RecordId,
    ) -> Result<(), ApiError>;

    /// Read an unpaginated lookup list such as `products/units`
    async fn lookup(&self, credential: &Credential, path: &str) -> Result<Vec<Record>, ApiError>;
}

/// HTTP client for the backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn request(&self, method: Method, path: &str, credential: Option<&Credential>) -> RequestBuilder {
        let url = self.config.api_url(path);
        debug!("{} {}", method, url);

        let builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");

        match credential {
            Some(credential) => builder.header(header::AUTHORIZATION, credential.bearer()),
            None => builder,
        }
    }

    /// Send a request and return the body of a successful response
    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::OK || status == StatusCode::CREATED {
            Ok(body)
        } else {
            warn!("{} answered with status {}", path, status.as_u16());
            Err(ApiError::from_response(status.as_u16(), &body))
        }
    }

    fn decode<T: DeserializeOwned>(&self, path: &str, body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|source| ApiError::Decode {
            url: self.config.api_url(path),
            source,
        })
    }

    /// Writes may answer with nothing, the record, or `{ "data": record }`
    fn decode_written(&self, path: &str, body: &str) -> Result<Option<Record>, ApiError> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = self.decode(path, body)?;
        let record = match value {
            Value::Object(mut map) => match map.remove("data") {
                Some(data @ Value::Object(_)) => Record::from_value(data),
                Some(other) => {
                    map.insert("data".to_string(), other);
                    Some(Record(map))
                }
                None => Some(Record(map)),
            },
            _ => None,
        };
        Ok(record)
    }
}

#[async_trait]
impl AdminBackend for ApiClient {
    async fn login(&self, name: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let path = "login";
        info!("Logging in as {}", name);

        let builder = self
            .request(Method::POST, path, None)
            .form(&[("name", name), ("password", password)]);
        let body = self.send(builder, path).await?;
        self.decode(path, &body)
    }

    async fn logout(&self, credential: &Credential) -> Result<(), ApiError> {
        let path = "logout";
        let builder = self.request(Method::POST, path, Some(credential));
        self.send(builder, path).await?;
        info!("Logged out");
        Ok(())
    }

    async fn current_user(&self, credential: &Credential) -> Result<User, ApiError> {
        let path = "user";
        let builder = self.request(Method::GET, path, Some(credential));
        let body = self.send(builder, path).await?;
        self.decode(path, &body)
    }

    async fn list(
        &self,
        credential: &Credential,
        resource: &str,
        query: ListQuery,
    ) -> Result<RecordPage, ApiError> {
        let builder = self
            .request(Method::GET, resource, Some(credential))
            .query(&[("page", query.page), ("per_page", query.per_page)]);
        let body = self.send(builder, resource).await?;
        let envelope: Envelope<Paginated> = self.decode(resource, &body)?;
        let paginated = envelope.data;

        let mut records = Vec::with_capacity(paginated.data.len());
        for value in paginated.data {
            match Record::from_value(value) {
                Some(record) if record.id().is_some() => records.push(record),
                _ => return Err(ApiError::MissingId(self.config.api_url(resource))),
            }
        }

        info!(
            "Fetched {} {} (page {}/{})",
            records.len(),
            resource,
            paginated.current_page,
            paginated.last_page
        );

        Ok(RecordPage {
            records,
            page: PageState::new(paginated.current_page, paginated.last_page),
            per_page: paginated.per_page,
            total: paginated.total,
        })
    }

    async fn fetch(
        &self,
        credential: &Credential,
        resource: &str,
        id: &RecordId,
    ) -> Result<Record, ApiError> {
        let path = format!("{}/{}", resource, id);
        let builder = self.request(Method::GET, &path, Some(credential));
        let body = self.send(builder, &path).await?;
        let envelope: Envelope<Value> = self.decode(&path, &body)?;

        Record::from_value(envelope.data)
            .filter(|record| record.id().is_some())
            .ok_or_else(|| ApiError::MissingId(self.config.api_url(&path)))
    }

    async fn create(
        &self,
        credential: &Credential,
        resource: &str,
        draft: &Record,
    ) -> Result<Option<Record>, ApiError> {
        let builder = self
            .request(Method::POST, resource, Some(credential))
            .json(draft);
        let body = self.send(builder, resource).await?;
        info!("Created {} record", resource);
        self.decode_written(resource, &body)
    }

    async fn update(
        &self,
        credential: &Credential,
        resource: &str,
        id: &RecordId,
        draft: &Record,
    ) -> Result<Option<Record>, ApiError> {
        let path = format!("{}/{}", resource, id);
        let builder = self.request(Method::PUT, &path, Some(credential)).json(draft);
        let body = self.send(builder, &path).await?;
        info!("Updated {} record {}", resource, id);
        self.decode_written(&path, &body)
    }

    async fn delete(
        &self,
        credential: &Credential,
        resource: &str,
        id: &RecordId,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{}", resource, id);
        let builder = self.request(Method::DELETE, &path, Some(credential));
        self.send(builder, &path).await?;
        info!("Deleted {} record {}", resource, id);
        Ok(())
    }

    async fn lookup(&self, credential: &Credential, path: &str) -> Result<Vec<Record>, ApiError> {
        let builder = self.request(Method::GET, path, Some(credential));
        let body = self.send(builder, path).await?;
        let envelope: Envelope<Vec<Value>> = self.decode(path, &body)?;
        Ok(envelope
            .data
            .into_iter()
            .filter_map(Record::from_value)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(Config::default().with_backend(&server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_list_sends_credential_and_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "10"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "data": [{"id": 11, "nama_kategori": "Snacks"}],
                    "current_page": 2,
                    "last_page": 3,
                    "per_page": 10,
                    "total": 21
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server)
            .list(&Credential::new("tok"), "categories", ListQuery::new(2, 10))
            .await
            .unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].display("nama_kategori"), "Snacks");
        assert_eq!(page.page, PageState::new(2, 3));
        assert_eq!(page.total, Some(21));
    }

    #[tokio::test]
    async fn test_list_rejects_records_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"data": [{"nama_kategori": "Nameless"}], "current_page": 1, "last_page": 1}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .list(&Credential::new("tok"), "categories", ListQuery::new(1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingId(_)));
    }

    #[tokio::test]
    async fn test_only_200_and_201_are_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/categories/4"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/categories"))
            .and(body_json(json!({"nama_kategori": "Drinks"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": 5, "nama_kategori": "Drinks"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let credential = Credential::new("tok");

        let err = client
            .delete(&credential, "categories", &RecordId::Number(4))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(204));

        let created = client
            .create(
                &credential,
                "categories",
                &Record::new().with("nama_kategori", "Drinks"),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.id(), Some(RecordId::Number(5)));
    }

    #[tokio::test]
    async fn test_fetch_single_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": 9, "nama_barang": "Teh Botol", "isi": 24}
            })))
            .mount(&server)
            .await;

        let record = client_for(&server)
            .fetch(&Credential::new("tok"), "products", &RecordId::Number(9))
            .await
            .unwrap();
        assert_eq!(record.display("isi"), "24");
    }

    #[tokio::test]
    async fn test_login_validation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "password": ["The password field is required."]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).login("admin", "").await.unwrap_err();
        assert_eq!(err.field_error("password"), Some("The password field is required."));
    }

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "t-1",
                "data": {"id": 1, "name": "admin", "role": "admin"}
            })))
            .mount(&server)
            .await;

        let response = client_for(&server).login("admin", "secret").await.unwrap();
        assert_eq!(response.token, "t-1");
        assert_eq!(response.data.unwrap().role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/units"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "nama_satuan": "PCS"}, {"id": 2, "nama_satuan": "BOX"}]
            })))
            .mount(&server)
            .await;

        let units = client_for(&server)
            .lookup(&Credential::new("tok"), "products/units")
            .await
            .unwrap();
        let names: Vec<String> = units.iter().map(|u| u.display("nama_satuan")).collect();
        assert_eq!(names, vec!["PCS", "BOX"]);
    }
}
