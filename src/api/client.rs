//! The HTTP transport core (§4.4.2-§4.4.5), grounded on the teacher's
//! `api.rs` use of `reqwest::blocking::Client` and typed JSON decoding,
//! generalized from a single chat-completion call to a GitLab-shaped REST
//! entity model with pagination and a request state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::auth::AuthInterceptor;
use super::pagination;
use super::params::{join_query, Params};
use crate::config::CopybaraConfig;
use crate::error::{CopybaraError, Result};

/// A cooperative cancellation flag, checked between pagination pages and
/// before each blocking send (§4.4.5, §5). The corpus has no async runtime
/// to hang a real `CancellationToken` off, so this is the lightest thing
/// that can be checked from a blocking call site.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
   pub fn new() -> Self {
      Self(Arc::new(AtomicBool::new(false)))
   }

   pub fn cancel(&self) {
      self.0.store(true, Ordering::SeqCst);
   }

   pub fn is_cancelled(&self) -> bool {
      self.0.load(Ordering::SeqCst)
   }

   fn check(&self) -> Result<()> {
      if self.is_cancelled() {
         return Err(CopybaraError::Other("request cancelled".to_string()));
      }
      Ok(())
   }
}

/// The transport core: one per configured endpoint.
pub struct Client {
   http: reqwest::blocking::Client,
   base_url: String,
   auth: AuthInterceptor,
}

impl Client {
   pub fn new(config: &CopybaraConfig, auth: AuthInterceptor) -> Result<Self> {
      let http = reqwest::blocking::Client::builder()
         .timeout(Duration::from_secs(config.http_timeout_secs))
         .connect_timeout(Duration::from_secs(config.http_connect_timeout_secs))
         .build()?;
      Ok(Self { http, base_url: config.api_base_url.clone(), auth })
   }

   fn full_url(&self, relative_path: &str) -> String {
      format!("{}{}", self.base_url, relative_path)
   }

   /// `Build -> Intercept(auth) -> Send -> Classify -> Decode|Terminate`
   /// for a paginated GET (§4.4.2). Aggregates every page in order.
   pub fn paginated_get<T: DeserializeOwned>(
      &self,
      path: &str,
      params: &Params,
      per_page: u32,
      cancel: &CancellationToken,
   ) -> Result<Vec<T>> {
      let mut query = params.query_string();
      if !query.is_empty() {
         query.push('&');
      }
      query.push_str(&format!("per_page={per_page}"));

      let mut relative = join_query(path, &query);
      let mut out = Vec::new();

      loop {
         cancel.check()?;
         let url = self.full_url(&relative);
         let request = self.auth.intercept(self.http.get(&url))?;
         let response = request.send()?;

         if response.status() == reqwest::StatusCode::NO_CONTENT {
            break;
         }
         if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(CopybaraError::Api { method: "GET".to_string(), url, status, body });
         }

         let next = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

         let page: Vec<T> = response.json()?;
         out.extend(page);

         match next {
            Some(link_header) => match pagination::next_link(&link_header, &url)? {
               Some(next_url) => {
                  let stripped = pagination::strip_base(&next_url, &self.base_url)?;
                  relative = stripped;
               },
               None => break,
            },
            None => break,
         }
      }

      Ok(out)
   }

   /// Single-entity GET (§4.4.3): 2xx-with-body decodes to `Some`, 204
   /// decodes to `None`, any other non-2xx is an `Api` error.
   pub fn get_entity<T: DeserializeOwned>(&self, path: &str, cancel: &CancellationToken) -> Result<Option<T>> {
      cancel.check()?;
      let url = self.full_url(path);
      let request = self.auth.intercept(self.http.get(&url))?;
      self.classify_and_decode("GET", url, request.send()?)
   }

   pub fn post_entity<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B, cancel: &CancellationToken) -> Result<Option<T>> {
      cancel.check()?;
      let url = self.full_url(path);
      let request = self.auth.intercept(self.http.post(&url).json(body))?;
      self.classify_and_decode("POST", url, request.send()?)
   }

   pub fn put_entity<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B, cancel: &CancellationToken) -> Result<Option<T>> {
      cancel.check()?;
      let url = self.full_url(path);
      let request = self.auth.intercept(self.http.put(&url).json(body))?;
      self.classify_and_decode("PUT", url, request.send()?)
   }

   fn classify_and_decode<T: DeserializeOwned>(&self, method: &'static str, url: String, response: reqwest::blocking::Response) -> Result<Option<T>> {
      if response.status() == reqwest::StatusCode::NO_CONTENT {
         return Ok(None);
      }
      if !response.status().is_success() {
         let status = response.status().as_u16();
         let body = response.text().unwrap_or_default();
         return Err(CopybaraError::Api { method: method.to_string(), url, status, body });
      }
      Ok(Some(response.json()?))
   }
}
