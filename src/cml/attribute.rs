use super::error::{CmlError, CmlResult, XPath};
use super::tree::Node;

/// Scalar types an attribute value can be read as.
pub trait FromAttribute: Sized {
    /// Human-readable name of the type, used in conversion errors.
    const EXPECTED: &'static str;

    fn from_attribute(value: &str) -> Option<Self>;
}

impl FromAttribute for String {
    const EXPECTED: &'static str = "a string";

    fn from_attribute(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromAttribute for i32 {
    const EXPECTED: &'static str = "an integer";

    fn from_attribute(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl FromAttribute for u32 {
    const EXPECTED: &'static str = "an unsigned integer";

    fn from_attribute(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl FromAttribute for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_attribute(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

/// Read an optional attribute of `node`, whose own locator is `element`.
///
/// Absent attributes give `Ok(None)`. A present value that does not convert is an
/// error naming the attribute path and the literal; nothing is defaulted.
pub fn get_attribute<T: FromAttribute>(
    node: &Node,
    name: &str,
    element: &XPath,
) -> CmlResult<Option<T>> {
    match node.attribute(name) {
        None => Ok(None),
        Some(value) => T::from_attribute(value)
            .map(Some)
            .ok_or_else(|| CmlError::conversion(&element.attribute(name), value, T::EXPECTED)),
    }
}

/// Like [`get_attribute`], but absence is a `MissingAttribute` error.
pub fn require_attribute<T: FromAttribute>(
    node: &Node,
    name: &str,
    element: &XPath,
) -> CmlResult<T> {
    get_attribute(node, name, element)?
        .ok_or_else(|| CmlError::missing_attribute(&element.attribute(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cml::ErrorKind;

    fn atom() -> Node {
        Node::new("atom")
            .with_attribute("formalCharge", "-1")
            .with_attribute("spinMultiplicity", "abc")
            .with_attribute("isotopeNumber", "-2")
            .with_attribute("x3", "1.25")
    }

    #[test]
    fn test_typed_values() {
        let path = XPath::root().child("atom");
        assert_eq!(get_attribute::<i32>(&atom(), "formalCharge", &path).expect("int"), Some(-1));
        assert_eq!(get_attribute::<f64>(&atom(), "x3", &path).expect("double"), Some(1.25));
        assert_eq!(get_attribute::<String>(&atom(), "x3", &path).expect("string").as_deref(), Some("1.25"));
        assert_eq!(get_attribute::<u32>(&atom(), "hydrogenCount", &path).expect("absent"), None);
    }

    #[test]
    fn test_conversion_failures_are_located() {
        let path = XPath::root().child("atom");
        let err = get_attribute::<u32>(&atom(), "spinMultiplicity", &path).expect_err("not numeric");
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert_eq!(err.locator, "/atom/@spinMultiplicity");
        assert_eq!(err.value.as_deref(), Some("abc"));

        let err = get_attribute::<u32>(&atom(), "isotopeNumber", &path).expect_err("negative");
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert!(err.to_string().contains("(= \"-2\") is not convertible"));
    }

    #[test]
    fn test_required_attribute() {
        let path = XPath::root().child("atom");
        let err = require_attribute::<String>(&atom(), "id", &path).expect_err("no id");
        assert_eq!(err.kind, ErrorKind::MissingAttribute);
        assert_eq!(err.to_string(), "/atom/@id is missing");
    }
}
