//! Round-robin pool of provider credentials.

use crate::error::AqGridError;
use crate::types::credential::Credential;

/// Environment variable read by [`CredentialPool::from_env`] by default.
pub const DEFAULT_CREDENTIALS_VAR: &str = "API_KEYS";

/// An ordered, non-empty list of credentials, immutable after construction.
///
/// Request `i` is always served by credential `i mod len`, which spreads load
/// evenly regardless of the order in which requests complete.
///
/// # Examples
///
/// ```
/// use aqgrid::CredentialPool;
///
/// let pool = CredentialPool::from_delimited("key-a, key-b,,").unwrap();
/// assert_eq!(pool.len(), 2);
/// assert_eq!(pool.assign(0).expose(), "key-a");
/// assert_eq!(pool.assign(3).expose(), "key-b");
/// ```
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    /// # Errors
    ///
    /// Returns [`AqGridError::NoCredentials`] if `credentials` is empty.
    pub fn new(credentials: Vec<Credential>) -> Result<Self, AqGridError> {
        if credentials.is_empty() {
            return Err(AqGridError::NoCredentials);
        }
        Ok(Self { credentials })
    }

    /// Parses a comma-delimited list. Entries are trimmed and blanks dropped.
    pub fn from_delimited(list: &str) -> Result<Self, AqGridError> {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(Credential::new)
                .collect(),
        )
    }

    /// Reads a comma-delimited list from the environment variable `var`.
    /// An unset variable is treated like an empty one.
    pub fn from_env(var: &str) -> Result<Self, AqGridError> {
        Self::from_delimited(&std::env::var(var).unwrap_or_default())
    }

    pub fn assign(&self, request_index: usize) -> &Credential {
        &self.credentials[request_index % self.credentials.len()]
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether the pool holds no credentials. Construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
