use std::fmt;

use bytes::Bytes;

/// Whether the server compares the stored value itself or its digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonFunction {
    /// By-value comparison (`IFEQ`, `IFNE`).
    Value,
    /// By-digest comparison (`IFDEQ`, `IFDNE`).
    Digest,
}

impl ComparisonFunction {
    /// Return the lowercase name of the function.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Digest => "digest",
        }
    }
}

impl fmt::Display for ComparisonFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate applied between the stored data and the comparand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
}

impl ComparisonOperator {
    /// Return the lowercase name of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not-equals",
        }
    }

    /// Apply the operator to the outcome of an equality check.
    pub fn apply(self, equal: bool) -> bool {
        match self {
            Self::Equals => equal,
            Self::NotEquals => !equal,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparand of a [`CompareCondition`], keeping its original representation.
///
/// Raw values stay as bytes and digests stay as the hex string returned by
/// the server, so neither is converted before it reaches the wire encoder.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A serialized value. May be empty (compares against the empty string).
    Bytes(Bytes),
    /// A hexadecimal digest as produced by the `DIGEST` command. Not validated
    /// locally; a malformed digest is rejected by the server.
    Digest(String),
}

impl Value {
    /// Return the wire representation of the comparand.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Digest(digest) => digest.as_bytes(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Self::Digest(digest) => f.write_str(digest),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Digest(digest) => f.debug_tuple("Digest").field(digest).finish(),
        }
    }
}

/// A precondition the server evaluates atomically with a mutation.
///
/// Instances can only be built through the four named constructors, which pin
/// the comparison function, the operator and the comparand representation
/// together. A digest condition always carries a [`Value::Digest`] and a value
/// condition always carries [`Value::Bytes`].
///
/// ```
/// use redbind_core::{CompareCondition, ComparisonFunction, ComparisonOperator};
///
/// let condition = CompareCondition::if_equals("v1");
/// assert_eq!(condition.comparison(), ComparisonFunction::Value);
/// assert_eq!(condition.operator(), ComparisonOperator::Equals);
/// assert_eq!(condition.value().as_bytes(), b"v1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompareCondition {
    function: ComparisonFunction,
    operator: ComparisonOperator,
    value: Value,
}

impl CompareCondition {
    /// Match if the stored value equals `value`.
    pub fn if_equals(value: impl Into<Bytes>) -> Self {
        Self {
            function: ComparisonFunction::Value,
            operator: ComparisonOperator::Equals,
            value: Value::Bytes(value.into()),
        }
    }

    /// Match if the stored value does not equal `value`.
    pub fn if_not_equals(value: impl Into<Bytes>) -> Self {
        Self {
            function: ComparisonFunction::Value,
            operator: ComparisonOperator::NotEquals,
            value: Value::Bytes(value.into()),
        }
    }

    /// Match if the digest of the stored value equals `digest`.
    ///
    /// The digest is expected in hexadecimal form, as returned by `DIGEST`.
    pub fn if_digest_equals(digest: impl Into<String>) -> Self {
        Self {
            function: ComparisonFunction::Digest,
            operator: ComparisonOperator::Equals,
            value: Value::Digest(digest.into()),
        }
    }

    /// Match if the digest of the stored value does not equal `digest`.
    pub fn if_digest_not_equals(digest: impl Into<String>) -> Self {
        Self {
            function: ComparisonFunction::Digest,
            operator: ComparisonOperator::NotEquals,
            value: Value::Digest(digest.into()),
        }
    }

    pub fn comparison(&self) -> ComparisonFunction {
        self.function
    }

    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Return the command modifier selecting this condition on the server.
    pub fn keyword(&self) -> &'static str {
        match (self.function, self.operator) {
            (ComparisonFunction::Value, ComparisonOperator::Equals) => "IFEQ",
            (ComparisonFunction::Value, ComparisonOperator::NotEquals) => "IFNE",
            (ComparisonFunction::Digest, ComparisonOperator::Equals) => "IFDEQ",
            (ComparisonFunction::Digest, ComparisonOperator::NotEquals) => "IFDNE",
        }
    }
}

impl fmt::Display for CompareCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword(), self.value)
    }
}
