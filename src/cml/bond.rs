use super::attribute::{get_attribute, require_attribute};
use super::error::{CmlError, CmlResult, XPath};
use super::identifier::{validate_id, IdScope};
use super::tree::Node;
use crate::model::{Bond, BondOrder, BondStereo};
use tracing::*;

/// One `bond` element with its endpoints resolved to atom positions.
#[derive(Debug, Clone, PartialEq)]
pub struct BondRecord {
    pub path: XPath,
    pub begin: usize,
    pub end: usize,
    pub bond: Bond,
}

/// Map an `order` token to a bond order. The integer and half-integer orders
/// above triple are extensions of the molecular convention.
pub fn parse_bond_order(token: &str) -> Option<BondOrder> {
    Some(match token {
        "1" | "S" => BondOrder::Single,
        "2" | "D" => BondOrder::Double,
        "3" | "T" => BondOrder::Triple,
        "A" => BondOrder::Aromatic,
        "4" => BondOrder::Quadruple,
        "5" => BondOrder::Quintuple,
        "6" => BondOrder::Hextuple,
        "1.5" => BondOrder::OneAndAHalf,
        "2.5" => BondOrder::TwoAndAHalf,
        "3.5" => BondOrder::ThreeAndAHalf,
        "4.5" => BondOrder::FourAndAHalf,
        "5.5" => BondOrder::FiveAndAHalf,
        _ => return None,
    })
}

/// Interpret the text of a `bondStereo` child. Unsupported values are logged
/// and leave the bond without stereo.
pub fn parse_bond_stereo(path: &XPath, token: &str) -> BondStereo {
    match token {
        "C" => BondStereo::Cis,
        "T" => BondStereo::Trans,
        "W" => BondStereo::Wedge,
        "H" => BondStereo::Hash,
        "undefined" => BondStereo::None,
        "other" => {
            warn!("{} (= \"other\") is not implemented", path.child("bondStereo"));
            BondStereo::None
        }
        _ => {
            warn!("{} (= \"{token}\") is unrecognizable", path.child("bondStereo"));
            BondStereo::None
        }
    }
}

/// Build the bond at `index` from `node`.
///
/// `atom_ids` must already hold every atom of the molecule. A bond id is
/// optional but, when given, has to be valid and unique in `bond_ids`.
pub fn build_bond(
    node: &Node,
    path: &XPath,
    index: usize,
    atom_ids: &IdScope,
    bond_ids: &mut IdScope,
) -> CmlResult<BondRecord> {
    let path = match get_attribute::<String>(node, "id", path)? {
        None => {
            info!("{} is missing", path.attribute("id"));
            path.clone()
        }
        Some(id) => {
            validate_id(&path.attribute("id"), &id)?;
            bond_ids.register(&path.attribute("id"), &id, index)?;
            path.with_id(&id)
        }
    };

    let order_token: String = require_attribute(node, "order", &path)?;
    let order = parse_bond_order(&order_token).unwrap_or_else(|| {
        warn!("{} (= \"{order_token}\") is unrecognizable", path.attribute("order"));
        BondOrder::Unspecified
    });

    let refs: String = require_attribute(node, "atomRefs2", &path)?;
    let (begin, end) = resolve_refs(&path.attribute("atomRefs2"), &refs, atom_ids)?;

    let stereo = node
        .first_child("bondStereo")
        .map(|child| parse_bond_stereo(&path, &child.text))
        .unwrap_or_default();

    Ok(BondRecord {
        path,
        begin,
        end,
        bond: Bond { order, stereo },
    })
}

/// Split `atomRefs2` into exactly two distinct, known atom ids.
fn resolve_refs(path: &XPath, refs: &str, atom_ids: &IdScope) -> CmlResult<(usize, usize)> {
    let mut tokens = refs.split_whitespace();
    let (Some(first), Some(second)) = (tokens.next(), tokens.next()) else {
        return Err(CmlError::malformed_reference(
            path,
            refs,
            "does not have two ids separated by space",
        ));
    };
    if tokens.next().is_some() {
        return Err(CmlError::malformed_reference(path, refs, "has three or more ids"));
    }
    if first == second {
        return Err(CmlError::self_bond(path, refs));
    }

    let resolve = |id: &str| {
        atom_ids
            .resolve(id)
            .ok_or_else(|| CmlError::dangling_reference(path, refs, id))
    };
    Ok((resolve(first)?, resolve(second)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cml::ErrorKind;

    fn bond_path() -> XPath {
        XPath::root().child("molecule").child("bondArray").child("bond")
    }

    fn atoms() -> IdScope {
        let path = XPath::root().child("atom").attribute("id");
        let mut ids = IdScope::new();
        for (index, id) in ["a0", "a1", "a2"].into_iter().enumerate() {
            ids.register(&path, id, index).expect("unique");
        }
        ids
    }

    fn bond(refs: &str, order: &str) -> Node {
        Node::new("bond")
            .with_attribute("atomRefs2", refs)
            .with_attribute("order", order)
    }

    fn build(node: Node) -> CmlResult<BondRecord> {
        build_bond(&node, &bond_path(), 0, &atoms(), &mut IdScope::new())
    }

    #[test]
    fn test_order_tokens() {
        assert_eq!(parse_bond_order("S"), Some(BondOrder::Single));
        assert_eq!(parse_bond_order("D"), Some(BondOrder::Double));
        assert_eq!(parse_bond_order("3"), Some(BondOrder::Triple));
        assert_eq!(parse_bond_order("A"), Some(BondOrder::Aromatic));
        assert_eq!(parse_bond_order("6"), Some(BondOrder::Hextuple));
        assert_eq!(parse_bond_order("3.5"), Some(BondOrder::ThreeAndAHalf));
        assert_eq!(parse_bond_order("a"), None);
        assert_eq!(parse_bond_order("7"), None);
    }

    #[test]
    fn test_resolves_positions() {
        let record = build(bond("a2  a0", "2")).expect("valid bond");
        assert_eq!((record.begin, record.end), (2, 0));
        assert_eq!(record.bond.order, BondOrder::Double);
        assert_eq!(record.bond.stereo, BondStereo::None);
        assert_eq!(record.path, bond_path());
    }

    #[test]
    fn test_unrecognised_order_is_lenient() {
        let record = build(bond("a0 a1", "quadruple")).expect("only a warning");
        assert_eq!(record.bond.order, BondOrder::Unspecified);
    }

    #[test]
    fn test_reference_errors() {
        let err = build(bond("a0", "1")).expect_err("one id");
        assert_eq!(err.kind, ErrorKind::MalformedReference);
        assert!(err.to_string().ends_with("does not have two ids separated by space"));

        let err = build(bond("a0 a1 a2", "1")).expect_err("three ids");
        assert_eq!(err.kind, ErrorKind::MalformedReference);
        assert!(err.to_string().ends_with("has three or more ids"));

        let err = build(bond("a0 a0", "1")).expect_err("self-bond");
        assert_eq!(err.kind, ErrorKind::SelfBond);

        let err = build(bond("a0 a9", "1")).expect_err("dangling");
        assert_eq!(err.kind, ErrorKind::DanglingReference);
        assert_eq!(err.value.as_deref(), Some("a9"));
        assert_eq!(
            err.to_string(),
            "/molecule/bondArray/bond/@atomRefs2 (= \"a0 a9\") refers to non-existing ../../../atomArray/atom[@id=\"a9\"]"
        );
    }

    #[test]
    fn test_missing_order() {
        let node = Node::new("bond")
            .with_attribute("id", "b0")
            .with_attribute("atomRefs2", "a0 a1");
        let err = build(node).expect_err("order is mandatory");
        assert_eq!(err.kind, ErrorKind::MissingAttribute);
        assert_eq!(
            err.to_string(),
            "/molecule/bondArray/bond[@id=\"b0\"]/@order is missing"
        );
    }

    #[test]
    fn test_bond_ids() {
        let atom_ids = atoms();
        let mut bond_ids = IdScope::new();
        let node = bond("a0 a1", "1").with_attribute("id", "b0");
        let record = build_bond(&node, &bond_path(), 0, &atom_ids, &mut bond_ids).expect("first");
        assert_eq!(record.path.as_str(), "/molecule/bondArray/bond[@id=\"b0\"]");

        let again = bond("a1 a2", "1").with_attribute("id", "b0");
        let err = build_bond(&again, &bond_path(), 1, &atom_ids, &mut bond_ids).expect_err("duplicate");
        assert_eq!(err.kind, ErrorKind::DuplicateIdentifier);

        let invalid = bond("a1 a2", "1").with_attribute("id", "b 1");
        let err = build_bond(&invalid, &bond_path(), 1, &atom_ids, &mut bond_ids).expect_err("invalid");
        assert_eq!(err.kind, ErrorKind::InvalidIdentifier);
    }

    #[test]
    fn test_stereo_child() {
        let mut node = bond("a0 a1", "2");
        node.push_child(Node::new("bondStereo").with_text("T"));
        assert_eq!(build(node).expect("trans").bond.stereo, BondStereo::Trans);

        for token in ["other", "undefined", "X"] {
            let mut node = bond("a0 a1", "2");
            node.push_child(Node::new("bondStereo").with_text(token));
            assert_eq!(build(node).expect(token).bond.stereo, BondStereo::None);
        }
    }
}
