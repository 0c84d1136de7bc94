//! Validation Module
//!
//! Security checks applied to untrusted input reaching the authentication
//! flow. Today that is the `returnUrl` query parameter, which would otherwise
//! let a crafted link bounce a freshly signed-in user to another site.
//!
//! # Usage
//!
//! ```
//! use remote_authenticator::validation::resolve_return_url;
//!
//! let url = resolve_return_url(
//!     None,
//!     "https://app.example/authentication/login?returnUrl=https://app.example/orders",
//!     "https://app.example/",
//!     None,
//! )
//! .unwrap();
//! assert_eq!(url, "https://app.example/orders");
//! ```

pub mod return_url;

pub use return_url::{
    query_parameter, resolve_return_url, validate_return_url, RETURN_URL_PARAMETER,
};
