//! Remote tables behind a PostgREST-style HTTP API.
//!
//! Tables live under `rest/v1/<table>` and are filtered with query operators
//! (`user_id=eq.<id>`, `batch_id=in.(<a>,<b>)`). Every request carries the
//! project `apikey` plus the signed-in user's bearer token; sign-in goes
//! through `auth/v1/token?grant_type=password`.

use api_types::{
    batch::{BatchPatch, BatchRow},
    transaction::{TransactionPatch, TransactionRow},
    user::{PasswordGrant, TokenResponse},
};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::{RemotePort, RemoteResult};
use crate::{RemoteError, SessionEvent, User};

const BATCHES: &str = "batches";
const TRANSACTIONS: &str = "transactions";

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error", alias = "msg", alias = "error_description")]
    message: String,
}

/// A signed-in session: the user and the token authorizing table access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSession {
    pub user: User,
    pub access_token: String,
}

impl RestSession {
    pub fn event(&self) -> SessionEvent {
        SessionEvent::SignedIn(self.user.clone())
    }
}

#[derive(Debug, Clone)]
pub struct RestRemote {
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
    http: reqwest::Client,
}

impl RestRemote {
    pub fn new(base_url: &str, api_key: &str) -> RemoteResult<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|err| RemoteError::Server(format!("invalid base_url: {err}")))?;
        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            access_token: None,
            http: reqwest::Client::new(),
        })
    }

    pub fn with_session(mut self, session: &RestSession) -> Self {
        self.access_token = Some(session.access_token.clone());
        self
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token.is_some()
    }

    /// Exchanges email and password for a session and keeps its token for
    /// the following table calls.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> RemoteResult<RestSession> {
        let mut endpoint = self.endpoint("auth/v1/token")?;
        endpoint
            .query_pairs_mut()
            .append_pair("grant_type", "password");

        let res = self
            .http
            .post(endpoint)
            .header("apikey", &self.api_key)
            .json(&PasswordGrant {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let token: TokenResponse = check(res).await?.json().await?;

        let email = token.user.email.unwrap_or_else(|| email.to_string());
        let session = RestSession {
            user: User::new(token.user.id, email, ""),
            access_token: token.access_token,
        };
        tracing::info!(user = %session.user.id, "signed in");
        self.access_token = Some(session.access_token.clone());
        Ok(session)
    }

    /// Forgets the token; later table calls fail as unauthorized.
    pub fn sign_out(&mut self) -> SessionEvent {
        self.access_token = None;
        SessionEvent::SignedOut
    }

    fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| RemoteError::Server(format!("invalid base_url: {err}")))
    }

    /// URL of `table` with PostgREST filters, e.g. `("id", "eq.<uuid>")`.
    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> RemoteResult<Url> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (column, filter) in filters {
                pairs.append_pair(column, filter);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RemoteResult<RequestBuilder> {
        let token = self.access_token.as_ref().ok_or(RemoteError::Unauthorized)?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(token))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> RemoteResult<Vec<T>> {
        let mut filters = filters.to_vec();
        filters.push(("select", "*".to_string()));
        let url = self.table_url(table, &filters)?;
        let res = self.request(Method::GET, url)?.send().await?;
        Ok(check(res).await?.json().await?)
    }

    async fn insert<T: Serialize + DeserializeOwned>(&self, table: &str, row: &T) -> RemoteResult<T> {
        let url = self.table_url(table, &[])?;
        let res = self
            .request(Method::POST, url)?
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let mut rows: Vec<T> = check(res).await?.json().await?;
        rows.pop()
            .ok_or_else(|| RemoteError::Server(format!("empty insert response from {table}")))
    }

    /// PATCH or DELETE a single row by id; an empty representation means no
    /// row matched.
    async fn modify<B: Serialize>(
        &self,
        method: Method,
        table: &str,
        id: Uuid,
        body: Option<&B>,
    ) -> RemoteResult<()> {
        let url = self.table_url(table, &[("id", format!("eq.{id}"))])?;
        let mut request = self
            .request(method, url)?
            .header("Prefer", "return=representation");
        if let Some(body) = body {
            request = request.json(body);
        }
        let res = request.send().await?;
        let rows: Vec<serde_json::Value> = check(res).await?.json().await?;
        if rows.is_empty() {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Maps a non-success HTTP status to a remote error.
fn status_error(status: u16, message: String) -> RemoteError {
    match status {
        401 | 403 => RemoteError::Unauthorized,
        404 => RemoteError::NotFound(message),
        400 | 409 | 422 => RemoteError::Rejected(message),
        _ => RemoteError::Server(message),
    }
}

async fn check(res: Response) -> RemoteResult<Response> {
    if res.status().is_success() {
        return Ok(res);
    }

    let status = res.status();
    let message = res
        .json::<ErrorResponse>()
        .await
        .map(|err| err.message)
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(status_error(status.as_u16(), message))
}

impl RemotePort for RestRemote {
    async fn list_batches_for_user(&self, user_id: &str) -> RemoteResult<Vec<BatchRow>> {
        self.select(
            BATCHES,
            &[
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn list_transactions_for_batches(
        &self,
        batch_ids: &[Uuid],
    ) -> RemoteResult<Vec<TransactionRow>> {
        if batch_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = batch_ids.iter().map(Uuid::to_string).collect();
        self.select(
            TRANSACTIONS,
            &[
                ("batch_id", format!("in.({})", ids.join(","))),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn insert_batch(&self, row: BatchRow) -> RemoteResult<BatchRow> {
        self.insert(BATCHES, &row).await
    }

    async fn update_batch(&self, id: Uuid, patch: BatchPatch) -> RemoteResult<()> {
        self.modify(Method::PATCH, BATCHES, id, Some(&patch)).await
    }

    async fn delete_batch(&self, id: Uuid) -> RemoteResult<()> {
        self.modify::<()>(Method::DELETE, BATCHES, id, None).await
    }

    async fn insert_transaction(&self, row: TransactionRow) -> RemoteResult<TransactionRow> {
        self.insert(TRANSACTIONS, &row).await
    }

    async fn update_transaction(&self, id: Uuid, patch: TransactionPatch) -> RemoteResult<()> {
        self.modify(Method::PATCH, TRANSACTIONS, id, Some(&patch))
            .await
    }

    async fn delete_transaction(&self, id: Uuid) -> RemoteResult<()> {
        self.modify::<()>(Method::DELETE, TRANSACTIONS, id, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_encodes_filters() {
        let remote = RestRemote::new("https://demo.example.co", "anon").unwrap();
        let url = remote
            .table_url(BATCHES, &[("user_id", "eq.u-1".to_string())])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://demo.example.co/rest/v1/batches?user_id=eq.u-1"
        );
    }

    #[test]
    fn base_url_path_is_kept() {
        let remote = RestRemote::new("http://127.0.0.1:54321/project", "anon").unwrap();
        let url = remote.table_url(TRANSACTIONS, &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:54321/project/rest/v1/transactions"
        );
    }

    #[test]
    fn table_calls_need_a_session() {
        let remote = RestRemote::new("https://demo.example.co", "anon").unwrap();
        let url = remote.table_url(BATCHES, &[]).unwrap();
        assert!(matches!(
            remote.request(Method::GET, url),
            Err(RemoteError::Unauthorized)
        ));
    }

    #[test]
    fn statuses_map_to_remote_errors() {
        assert!(matches!(status_error(401, String::new()), RemoteError::Unauthorized));
        assert!(matches!(status_error(404, String::new()), RemoteError::NotFound(_)));
        assert!(matches!(
            status_error(409, "duplicate key".to_string()),
            RemoteError::Rejected(msg) if msg == "duplicate key"
        ));
        assert!(matches!(status_error(500, String::new()), RemoteError::Server(_)));
    }

    #[test]
    fn sign_out_forgets_the_token() {
        let session = RestSession {
            user: User::new("u-1", "asha@example.com", ""),
            access_token: "token".to_string(),
        };
        let mut remote = RestRemote::new("https://demo.example.co", "anon")
            .unwrap()
            .with_session(&session);
        assert!(remote.is_signed_in());

        assert_eq!(remote.sign_out(), SessionEvent::SignedOut);
        assert!(!remote.is_signed_in());
    }
}
