use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The source file could not be opened or the sink could not be created.
    BadFile,
    /// The markup itself is broken.
    MalformedDocument,
    MultiRoot,
    MissingAttribute,
    Conversion,
    InvalidAttributeValue,
    InvalidIdentifier,
    DuplicateIdentifier,
    MandatoryElementNotFound,
    MultipleElement,
    MalformedReference,
    SelfBond,
    DanglingReference,
    IncompleteCoordinate,
    AggregateMismatch,
    /// The supplier has already produced its molecule or was closed.
    EndOfInput,
    /// Post-construction normalisation rejected the molecule.
    Sanitize,
    /// Serialising to the output sink failed.
    Write,
}

/// Every failure raised while reading or writing CML.
///
/// `locator` is an XPath-like path to the offending node or attribute and
/// `value` holds the literal that was rejected, when there is one.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct CmlError {
    pub kind: ErrorKind,
    pub locator: String,
    pub value: Option<String>,
    message: String,
    #[source]
    source: Option<std::io::Error>,
}

pub type CmlResult<T> = Result<T, CmlError>;

impl CmlError {
    fn new(kind: ErrorKind, locator: impl Display, message: String) -> Self {
        Self {
            kind,
            locator: locator.to_string(),
            value: None,
            message,
            source: None,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn bad_file(path: impl Display, source: std::io::Error) -> Self {
        let mut err = Self::new(ErrorKind::BadFile, &path, format!("Bad file {path}: {source}"));
        err.source = Some(source);
        err
    }

    pub fn malformed(details: impl Display) -> Self {
        Self::new(
            ErrorKind::MalformedDocument,
            "/",
            format!("malformed XML: {details}"),
        )
    }

    pub fn multi_root(count: usize) -> Self {
        Self::new(
            ErrorKind::MultiRoot,
            "/",
            format!("XML must not have multiple roots (found {count})"),
        )
    }

    pub fn missing_attribute(path: &XPath) -> Self {
        Self::new(ErrorKind::MissingAttribute, path, format!("{path} is missing"))
    }

    pub fn conversion(path: &XPath, value: &str, expected: &str) -> Self {
        Self::new(
            ErrorKind::Conversion,
            path,
            format!("{path} (= \"{value}\") is not convertible to {expected}"),
        )
        .with_value(value)
    }

    pub fn invalid_value(path: &XPath, value: impl Display, reason: &str) -> Self {
        let value = value.to_string();
        Self::new(
            ErrorKind::InvalidAttributeValue,
            path,
            format!("{path} (= \"{value}\") {reason}"),
        )
        .with_value(value)
    }

    pub fn zero(path: &XPath) -> Self {
        Self::new(ErrorKind::InvalidAttributeValue, path, format!("{path} is zero"))
            .with_value("0")
    }

    pub fn invalid_identifier(path: &XPath, id: &str) -> Self {
        Self::new(
            ErrorKind::InvalidIdentifier,
            path,
            format!("{path} (= \"{id}\") is invalid"),
        )
        .with_value(id)
    }

    pub fn duplicate_identifier(path: &XPath, id: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateIdentifier,
            path,
            format!("{path} (= \"{id}\") is not unique"),
        )
        .with_value(id)
    }

    pub fn mandatory_element(path: &XPath, element: &str) -> Self {
        Self::new(
            ErrorKind::MandatoryElementNotFound,
            path,
            format!("{path} has no {element} elements"),
        )
    }

    pub fn multiple_elements(path: &XPath, element: &str) -> Self {
        Self::new(
            ErrorKind::MultipleElement,
            path,
            format!("{path} has multiple {element} elements"),
        )
    }

    pub fn malformed_reference(path: &XPath, refs: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::MalformedReference,
            path,
            format!("{path} (= \"{refs}\") {reason}"),
        )
        .with_value(refs)
    }

    pub fn self_bond(path: &XPath, refs: &str) -> Self {
        Self::new(
            ErrorKind::SelfBond,
            path,
            format!("{path} (= \"{refs}\") is self-bond"),
        )
        .with_value(refs)
    }

    pub fn dangling_reference(path: &XPath, refs: &str, id: &str) -> Self {
        Self::new(
            ErrorKind::DanglingReference,
            path,
            format!(
                "{path} (= \"{refs}\") refers to non-existing ../../../atomArray/atom[@id=\"{id}\"]"
            ),
        )
        .with_value(id)
    }

    pub fn incomplete_coordinates(path: &XPath) -> Self {
        Self::new(
            ErrorKind::IncompleteCoordinate,
            path,
            format!("{path} does not have all of x3, y3 and z3 attributes"),
        )
    }

    pub fn aggregate_mismatch(
        path: &XPath,
        declared: impl Display,
        derivation: &str,
        computed: impl Display,
    ) -> Self {
        Self::new(
            ErrorKind::AggregateMismatch,
            path,
            format!("{path} (= {declared}) is not equal to {derivation} (= {computed})"),
        )
        .with_value(declared.to_string())
    }

    pub fn end_of_input() -> Self {
        Self::new(ErrorKind::EndOfInput, "/", "end of input reached".to_string())
    }

    pub fn sanitize(path: &XPath, details: impl Display) -> Self {
        Self::new(
            ErrorKind::Sanitize,
            path,
            format!("{path} cannot be sanitized: {details}"),
        )
    }

    pub fn write(details: impl Display) -> Self {
        Self::new(
            ErrorKind::Write,
            "/",
            format!("failed to write CML: {details}"),
        )
    }
}

/// An XPath-like locator, extended one step at a time as the traversal descends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XPath(String);

impl XPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Descend into a child element.
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}/{name}", self.0))
    }

    /// Point at an attribute of this element.
    pub fn attribute(&self, name: &str) -> Self {
        Self(format!("{}/@{name}", self.0))
    }

    /// Qualify the last step with the element's identifier.
    pub fn with_id(&self, id: &str) -> Self {
        Self(format!("{}[@id=\"{id}\"]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for XPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}
