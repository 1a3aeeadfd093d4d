//! Problem Details documents for HTTP APIs
//!
//! This crate provides a pure data model for RFC 7807 / RFC 9457 problem details,
//! with no dependencies on HTTP frameworks. It includes:
//! - `Problem`: the five standard members plus an open extension map
//! - JSON and XML codecs that round-trip extension members
//! - Problem type catalog support (`ProblemType`)
//!
//! ```
//! use api_problem::Problem;
//!
//! let mut problem = Problem::with_title_and_type("Out of credit", "https://example.com/probs/out-of-credit")
//!     .with_status(403);
//! problem.set(&["balance"], 30)?;
//! problem.set(&["account", "id"], "12345")?;
//!
//! let parsed = Problem::from_json(&problem.to_json(false)?)?;
//! assert_eq!(parsed["account"]["id"], "12345");
//! # Ok::<(), api_problem::ProblemError>(())
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod config;
pub mod error;
mod json;
pub mod problem;
pub mod xml;

// Re-export commonly used types
pub use catalog::ProblemType;
pub use config::{KeyPolicy, XmlOptions};
pub use error::{ProblemError, Result};
pub use problem::{
    ABOUT_BLANK, APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, FIXED_FIELDS, Problem,
    is_fixed_field,
};

/// Helper to attach the request instance URI to a problem before it is sent.
pub fn finalize(mut p: Problem, instance: &str) -> Problem {
    p.set_instance(instance);
    p
}
