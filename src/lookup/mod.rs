//! Profile lookup pipeline.
//!
//! # Data Flow
//! ```text
//! raw username
//!     → username.rs (trim, strip '@', validate)
//!     → service.rs (cache check, retry(fetch), normalize, cache store)
//!         → profile.rs (RawItem → Profile)
//!         → error.rs (UpstreamFailure → category + HTTP status)
//!     → LookupOutcome | LookupError
//! ```

pub mod error;
pub mod profile;
pub mod service;
pub mod username;

pub use error::{classify, ClassifiedError, ErrorCategory, LookupError};
pub use profile::{Profile, RawItem};
pub use service::{LookupMode, LookupOutcome, LookupService};
pub use username::{InvalidUsername, Username};
