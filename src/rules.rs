use std::collections::HashSet;
use std::fmt;

use crate::jobs::PrintJob;

/// Keywords, watched users and page threshold, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// Stored lowercased.
    keywords: Vec<String>,
    watched_users: HashSet<String>,
    max_pages: i64,
}

impl RuleSet {
    pub fn new<K, U>(keywords: K, watched_users: U, max_pages: i64) -> Self
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            watched_users: watched_users.into_iter().map(Into::into).collect(),
            max_pages,
        }
    }

    pub fn max_pages(&self) -> i64 {
        self.max_pages
    }

    /// Run every check against `job`. Warnings come back in check order:
    /// sensitive document, watched user, oversized job.
    pub fn evaluate(&self, job: &PrintJob) -> Vec<Warning> {
        let mut warnings = Vec::new();

        if self.is_sensitive(&job.document_name) {
            warnings.push(Warning::SensitiveDocument {
                document: job.document_name.clone(),
                user: job.user_name.clone(),
                printer: job.printer_name.clone(),
            });
        }

        if self.watched_users.contains(&job.user_name) {
            warnings.push(Warning::WatchedUser {
                user: job.user_name.clone(),
                document: job.document_name.clone(),
                printer: job.printer_name.clone(),
            });
        }

        // The -1 "unknown" sentinel never exceeds a positive threshold.
        if job.total_pages > self.max_pages {
            warnings.push(Warning::OversizedJob {
                document: job.document_name.clone(),
                pages: job.total_pages,
                user: job.user_name.clone(),
                printer: job.printer_name.clone(),
            });
        }

        warnings
    }

    fn is_sensitive(&self, document_name: &str) -> bool {
        let folded = document_name.to_lowercase();
        self.keywords.iter().any(|k| folded.contains(k.as_str()))
    }
}

/// Evaluate one job against ad-hoc rule inputs.
pub fn evaluate<K, U>(job: &PrintJob, keywords: K, watched_users: U, max_pages: i64) -> Vec<Warning>
where
    K: IntoIterator,
    K::Item: AsRef<str>,
    U: IntoIterator,
    U::Item: Into<String>,
{
    RuleSet::new(keywords, watched_users, max_pages).evaluate(job)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    SensitiveDocument {
        document: String,
        user: String,
        printer: String,
    },
    WatchedUser {
        user: String,
        document: String,
        printer: String,
    },
    OversizedJob {
        document: String,
        pages: i64,
        user: String,
        printer: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SensitiveDocument {
                document,
                user,
                printer,
            } => write!(
                f,
                "Sensitive document '{document}' printed by user '{user}' on printer '{printer}'."
            ),
            Warning::WatchedUser {
                user,
                document,
                printer,
            } => write!(
                f,
                "Suspicious user '{user}' printed document '{document}' on printer '{printer}'."
            ),
            Warning::OversizedJob {
                document,
                pages,
                user,
                printer,
            } => write!(
                f,
                "Unusually large print job: '{document}' ({pages} pages) printed by user '{user}' on printer '{printer}'."
            ),
        }
    }
}
