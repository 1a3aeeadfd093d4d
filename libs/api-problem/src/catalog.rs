//! Problem type catalog support (static `ProblemType` definitions)

use crate::problem::Problem;

/// Static definition of a problem type: the parts shared by every occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemType {
    pub status: u16,
    pub title: &'static str,
    pub type_url: &'static str,
}

impl ProblemType {
    #[must_use]
    pub const fn new(status: u16, title: &'static str, type_url: &'static str) -> Self {
        Self {
            status,
            title,
            type_url,
        }
    }

    /// Produce a problem of this type for one occurrence.
    #[inline]
    pub fn instantiate(&self, detail: impl Into<String>) -> Problem {
        Problem::new()
            .with_type(self.type_url)
            .with_title(self.title)
            .with_status(self.status)
            .with_detail(detail)
    }
}
