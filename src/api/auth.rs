//! Authentication (§4.4.4), grounded on the teacher's `api.rs` header
//! injection (`Authorization: Bearer ...`), generalized into a
//! `CredentialIssuer` trait so a caller can plug in a rotating token
//! source instead of a static one.

/// A credential as handed to the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
   pub kind: CredentialKind,
   pub secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
   Bearer,
   Basic,
}

impl Credential {
   pub fn header_value(&self) -> String {
      match self.kind {
         CredentialKind::Bearer => format!("Bearer {}", self.secret),
         CredentialKind::Basic => format!("Basic {}", self.secret),
      }
   }
}

/// Issues a credential lazily, once per request.
pub trait CredentialIssuer: Send + Sync {
   fn issue(&self) -> crate::error::Result<Credential>;
}

/// A credential issuer backed by a fixed token, the common case for a
/// CLI-configured `CopybaraConfig::api_token`.
pub struct StaticCredential(pub Credential);

impl CredentialIssuer for StaticCredential {
   fn issue(&self) -> crate::error::Result<Credential> {
      Ok(self.0.clone())
   }
}

/// Sets the `Authorization` header on every outgoing request, per §4.4.5's
/// `Build -> Intercept(auth) -> Send` state machine.
pub struct AuthInterceptor {
   issuer: Box<dyn CredentialIssuer>,
}

impl AuthInterceptor {
   pub fn new(issuer: Box<dyn CredentialIssuer>) -> Self {
      Self { issuer }
   }

   pub fn intercept(&self, builder: reqwest::blocking::RequestBuilder) -> crate::error::Result<reqwest::blocking::RequestBuilder> {
      let credential = self.issuer.issue()?;
      Ok(builder.header("Authorization", credential.header_value()))
   }
}
