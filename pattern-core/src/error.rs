//! Error types for pattern import/export operations

use thiserror::Error;

/// Main error type for pattern import/export operations
#[derive(Error, Debug)]
pub enum PatternError {
    /// More than one record matched an identifier predicate
    #[error("Too many {model} found for the key/value: {pairs}")]
    DuplicateMatch {
        /// Record type that was searched
        model: String,
        /// Identifier key/value pairs used for the search
        pairs: String,
    },

    /// Malformed pattern definition or configuration
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Non-monotonic repeat index while building a tree
    #[error("Index {index} out of order for group '{group}', next allowed index is {allowed}")]
    Index {
        /// Name of the repeated group
        group: String,
        /// 1-based index that was requested
        index: usize,
        /// Highest index that would have been accepted
        allowed: usize,
    },

    /// A path segment conflicts with the structure built so far
    #[error("Conflicting structure at '{0}'")]
    Structure(String),

    /// Unknown or invalid record identifier in an explicit id column
    #[error("Unknown database identifier '{0}'")]
    UnknownIdentifier(String),

    /// Worksheet name exceeds the spreadsheet limit
    #[error("Sheet name '{name}' is too long, maximum name length is 31 characters")]
    SheetName {
        /// Offending sheet name
        name: String,
    },

    /// Input data could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Output data could not be rendered
    #[error("Render error: {0}")]
    Render(String),

    /// The persistence collaborator failed a search
    #[error("Search error: {0}")]
    Search(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for pattern import/export operations
pub type Result<T> = std::result::Result<T, PatternError>;

impl PatternError {
    /// Create a duplicate-match error from the identifier pairs in use
    #[must_use]
    pub fn duplicate_match(model: impl Into<String>, pairs: impl Into<String>) -> Self {
        Self::DuplicateMatch {
            model: model.into(),
            pairs: pairs.into(),
        }
    }

    /// Create an invalid-pattern error
    #[must_use]
    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::InvalidPattern(message.into())
    }

    /// Create an index error for a repeated group
    #[must_use]
    pub fn index(group: impl Into<String>, index: usize, allowed: usize) -> Self {
        Self::Index {
            group: group.into(),
            index,
            allowed,
        }
    }

    /// Create a structure-conflict error
    #[must_use]
    pub fn structure(key: impl Into<String>) -> Self {
        Self::Structure(key.into())
    }

    /// Create an unknown-identifier error
    #[must_use]
    pub fn unknown_identifier(identifier: impl Into<String>) -> Self {
        Self::UnknownIdentifier(identifier.into())
    }

    /// Create a sheet-name overflow error
    #[must_use]
    pub fn sheet_name(name: impl Into<String>) -> Self {
        Self::SheetName { name: name.into() }
    }

    /// Create a parse error
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a render error
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Create a search error
    #[must_use]
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search(message.into())
    }
}

impl From<serde_json::Error> for PatternError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
