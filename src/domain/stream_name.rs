use std::fmt;

const PROJECT_STREAM_PREFIX: &str = "project/";

/// A chat stream's human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamName(String);

impl StreamName {
    /// A stream name taken as given, e.g. from a badge request.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The stream belonging to a repository: `project/<repository>`.
    pub fn for_project(repository_name: &str) -> Self {
        Self(format!("{PROJECT_STREAM_PREFIX}{repository_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
