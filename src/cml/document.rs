use super::error::{CmlError, CmlResult, XPath};
use super::molecule::{CmlParserParams, MoleculeBuilder};
use super::tree::{Document, Node};
use crate::model::Molecule;
use tracing::*;

/// Find the `molecule` element to read and its locator.
///
/// The root is either a bare `molecule` or a wrapper (normally `cml`) whose
/// first `molecule` child is used. A wrapper without one yields `Ok(None)`.
pub fn find_molecule(doc: &Document) -> CmlResult<Option<(XPath, &Node)>> {
    let root = match doc.roots.as_slice() {
        [] => return Err(CmlError::malformed("document has no root element")),
        [root] => root,
        roots => return Err(CmlError::multi_root(roots.len())),
    };
    let root_path = XPath::root().child(&root.name);
    if root.name == "molecule" {
        return Ok(Some((root_path, root)));
    }

    if root.name != "cml" {
        warn!("XML root element is {}", root.name);
    }
    let Some(molecule) = root.first_child("molecule") else {
        warn!("{} is not found", root_path.child("molecule"));
        return Ok(None);
    };
    if root.count_children("molecule") > 1 {
        warn!("{root_path} has multiple molecule elements");
    }
    Ok(Some((root_path.child("molecule"), molecule)))
}

/// Build the molecule found in `doc`, if there is one.
pub fn mol_from_document(doc: &Document, params: CmlParserParams) -> CmlResult<Option<Molecule>> {
    match find_molecule(doc)? {
        Some((path, node)) => MoleculeBuilder::new(node, path, params).build().map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cml::ErrorKind;

    fn locate(xml: &str) -> CmlResult<Option<String>> {
        let doc = Document::parse_str(xml).expect("well-formed");
        find_molecule(&doc).map(|found| found.map(|(path, _)| path.to_string()))
    }

    #[test]
    fn test_routing() {
        assert_eq!(locate("<molecule/>").expect("bare"), Some("/molecule".to_string()));
        assert_eq!(
            locate("<cml><molecule id=\"m1\"/><molecule id=\"m2\"/></cml>").expect("wrapped"),
            Some("/cml/molecule".to_string())
        );
        assert_eq!(
            locate("<document><molecule/></document>").expect("odd root is a warning"),
            Some("/document/molecule".to_string())
        );
        assert_eq!(locate("<cml><reaction/></cml>").expect("nothing to read"), None);
    }

    #[test]
    fn test_first_molecule_wins() {
        let doc = Document::parse_str(
            "<cml><molecule id=\"m1\"/><molecule id=\"m2\"/></cml>",
        )
        .expect("well-formed");
        let (_, node) = find_molecule(&doc).expect("routable").expect("present");
        assert_eq!(node.attribute("id"), Some("m1"));
    }

    #[test]
    fn test_multiple_roots() {
        let err = locate("<molecule/><molecule/>").expect_err("two roots");
        assert_eq!(err.kind, ErrorKind::MultiRoot);
    }

    #[test]
    fn test_empty_document() {
        let err = find_molecule(&Document::default()).expect_err("no root");
        assert_eq!(err.kind, ErrorKind::MalformedDocument);
    }
}
