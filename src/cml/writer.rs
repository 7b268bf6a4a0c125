use super::error::{CmlError, CmlResult};
use super::tree::{Document, Node};
use crate::model::{BondOrder, BondStereo, Conformer, Molecule};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::*;

const CML_NAMESPACE: &str = "http://www.xml-cml.org/schema";
const CONVENTION_NAMESPACE: &str = "http://www.xml-cml.org/convention/";
const MOLECULAR_CONVENTION: &str = "convention:molecular";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CmlWriterParams {
    /// Write `unknown` for bond orders outside the molecular convention
    /// instead of their extension tokens.
    pub strict_bond_orders: bool,
}

/// The `order` token for a bond order.
pub fn bond_order_token(order: BondOrder, strict: bool) -> &'static str {
    match order {
        BondOrder::Single => "1",
        BondOrder::Double => "2",
        BondOrder::Triple => "3",
        BondOrder::Aromatic => "A",
        BondOrder::Unspecified => "unknown",
        _ if strict => "unknown",
        BondOrder::Quadruple => "4",
        BondOrder::Quintuple => "5",
        BondOrder::Hextuple => "6",
        BondOrder::OneAndAHalf => "1.5",
        BondOrder::TwoAndAHalf => "2.5",
        BondOrder::ThreeAndAHalf => "3.5",
        BondOrder::FourAndAHalf => "4.5",
        BondOrder::FiveAndAHalf => "5.5",
    }
}

fn bond_stereo_token(stereo: BondStereo) -> Option<&'static str> {
    match stereo {
        BondStereo::None => None,
        BondStereo::Cis => Some("C"),
        BondStereo::Trans => Some("T"),
        BondStereo::Wedge => Some("W"),
        BondStereo::Hash => Some("H"),
    }
}

fn coordinate(value: f64) -> String {
    format!("{value:.6}")
}

/// Accumulates molecules into one `cml` document and serialises it to a sink.
///
/// Identifiers are regenerated as `m{n}`, `a{i}` and `b{i}`. A writer dropped
/// with unwritten molecules writes them, logging any failure.
pub struct CmlWriter<W: Write> {
    sink: W,
    params: CmlWriterParams,
    root: Node,
    num_molecules: usize,
    written: bool,
}

impl CmlWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>, params: CmlWriterParams) -> CmlResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| CmlError::bad_file(path.display(), err))?;
        Ok(Self::new(BufWriter::new(file), params))
    }
}

impl<W: Write> CmlWriter<W> {
    pub fn new(sink: W, params: CmlWriterParams) -> Self {
        let root = Node::new("cml")
            .with_attribute("xmlns", CML_NAMESPACE)
            .with_attribute("xmlns:convention", CONVENTION_NAMESPACE)
            .with_attribute("convention", MOLECULAR_CONVENTION);
        Self {
            sink,
            params,
            root,
            num_molecules: 0,
            written: true,
        }
    }

    pub fn num_molecules(&self) -> usize {
        self.num_molecules
    }

    /// Append a molecule, with the coordinates of conformer `conf_id`
    /// (the first one when `None`).
    pub fn add(&mut self, mol: &Molecule, conf_id: Option<usize>) -> CmlResult<()> {
        let conformer = mol.conformer(conf_id);
        if let (Some(id), None) = (conf_id, conformer) {
            return Err(CmlError::write(format!("molecule has no conformer {id}")));
        }

        let node = self.molecule_node(mol, conformer);
        self.root.push_child(node);
        self.num_molecules += 1;
        self.written = false;
        Ok(())
    }

    /// Serialise the whole document accumulated so far and flush the sink.
    pub fn write(&mut self) -> CmlResult<()> {
        let doc = Document::new(self.root.clone());
        doc.write(&mut self.sink)?;
        self.sink.flush().map_err(CmlError::write)?;
        self.written = true;
        debug!("wrote {} molecules", self.num_molecules);
        Ok(())
    }

    fn molecule_node(&self, mol: &Molecule, conformer: Option<&Conformer>) -> Node {
        let mut node = Node::new("molecule")
            .with_attribute("id", format!("m{}", self.num_molecules))
            .with_attribute("formalCharge", mol.total_formal_charge());
        if mol.atoms().any(|atom| atom.num_radical_electrons > 1) {
            warn!("spinMultiplicity of molecule m{} cannot be derived", self.num_molecules);
        } else {
            node.set_attribute("spinMultiplicity", 1 + mol.total_radical_electrons());
        }
        if let Some(name) = &mol.name {
            node.push_child(Node::new("name").with_text(name.as_str()));
        }

        if mol.num_atoms() > 0 {
            let mut atom_array = Node::new("atomArray");
            for index in 0..mol.num_atoms() {
                atom_array.push_child(atom_node(mol, index, conformer));
            }
            node.push_child(atom_array);
        }

        if mol.num_bonds() > 0 {
            let mut bond_array = Node::new("bondArray");
            for (index, (begin, end, bond)) in mol.bonds().enumerate() {
                let mut bond_node = Node::new("bond")
                    .with_attribute("id", format!("b{index}"))
                    .with_attribute("atomRefs2", format!("a{begin} a{end}"))
                    .with_attribute(
                        "order",
                        bond_order_token(bond.order, self.params.strict_bond_orders),
                    );
                if let Some(stereo) = bond_stereo_token(bond.stereo) {
                    bond_node.push_child(Node::new("bondStereo").with_text(stereo));
                }
                bond_array.push_child(bond_node);
            }
            node.push_child(bond_array);
        }
        node
    }
}

fn atom_node(mol: &Molecule, index: usize, conformer: Option<&Conformer>) -> Node {
    let atom = mol.atom(index);
    let mut node = Node::new("atom")
        .with_attribute("id", format!("a{index}"))
        .with_attribute("elementType", atom.symbol())
        .with_attribute("formalCharge", atom.formal_charge);

    match atom.num_radical_electrons {
        radicals @ (0 | 1) => node.set_attribute("spinMultiplicity", radicals + 1),
        radicals => warn!("spinMultiplicity of atom a{index} with {radicals} radical electrons cannot be derived"),
    }
    if let Some(implicit) = atom.implicit_hydrogens {
        let total = implicit.saturating_add(mol.explicit_hydrogen_neighbors(index));
        node.set_attribute("hydrogenCount", total);
    }
    if let Some(isotope) = atom.isotope {
        node.set_attribute("isotopeNumber", isotope);
    }

    if let Some((conformer, [x, y, z])) = conformer.and_then(|c| Some((c, c.position(index)?))) {
        if conformer.is_3d() {
            node.set_attribute("x3", coordinate(x));
            node.set_attribute("y3", coordinate(y));
            node.set_attribute("z3", coordinate(z));
        } else {
            node.set_attribute("x2", coordinate(x));
            node.set_attribute("y2", coordinate(y));
        }
    }
    node
}

impl<W: Write> Drop for CmlWriter<W> {
    fn drop(&mut self) {
        if !self.written {
            if let Err(err) = self.write() {
                error!("{err}");
            }
        }
    }
}

/// Render a single molecule as a CML document.
pub fn mol_to_cml_block(
    mol: &Molecule,
    params: CmlWriterParams,
    conf_id: Option<usize>,
) -> CmlResult<String> {
    let mut out = Vec::new();
    {
        let mut writer = CmlWriter::new(&mut out, params);
        writer.add(mol, conf_id)?;
        writer.write()?;
    }
    String::from_utf8(out).map_err(CmlError::write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cml::{mol_from_cml_block, CmlParserParams};
    use crate::model::{Atom, Bond};

    fn hydroxyl() -> Molecule {
        let mut mol = Molecule::new();
        let o = mol.add_atom(Atom::new(8));
        let h = mol.add_atom(Atom::new(1));
        mol.add_bond(o, h, Bond::new(BondOrder::Single));
        mol.add_conformer(Conformer::from_positions(
            vec![[1.099, -0.0544, 0.0016], [2.0388, -0.0544, 0.0016]],
            true,
        ));
        mol
    }

    #[test]
    fn test_document_shape() {
        let mut mol = hydroxyl();
        mol.name = Some("OH".to_string());
        mol.atom_mut(0).num_radical_electrons = 1;
        mol.atom_mut(0).isotope = Some(17);
        let xml = mol_to_cml_block(&mol, CmlWriterParams::default(), None).expect("writable");

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            r#"<cml xmlns="http://www.xml-cml.org/schema" xmlns:convention="http://www.xml-cml.org/convention/" convention="convention:molecular">"#
        ));
        assert!(xml.contains(r#"<molecule id="m0" formalCharge="0" spinMultiplicity="2">"#));
        assert!(xml.contains("<name>OH</name>"));
        assert!(xml.contains(
            r#"id="a0" elementType="O" formalCharge="0" spinMultiplicity="2" isotopeNumber="17" x3="1.099000" y3="-0.054400" z3="0.001600""#
        ));
        assert!(xml.contains(r#"id="b0" atomRefs2="a0 a1" order="1""#));
    }

    #[test]
    fn test_round_trip() {
        let params = CmlParserParams {
            sanitize: true,
            remove_hs: false,
        };
        let original = hydroxyl();
        let xml = mol_to_cml_block(&original, CmlWriterParams::default(), None).expect("writable");
        let mol = mol_from_cml_block(&xml, params)
            .expect("parsable")
            .expect("has a molecule");

        assert_eq!(mol.num_atoms(), 2);
        assert_eq!(mol.num_bonds(), 1);
        assert_eq!(mol.bond(0).map(|(b, e, bond)| (b, e, bond.order)), Some((0, 1, BondOrder::Single)));
        let before = original.conformer(None).expect("conformer");
        let after = mol.conformer(None).expect("conformer");
        for index in 0..2 {
            let (p, q) = (before.position(index).expect("set"), after.position(index).expect("read"));
            for axis in 0..3 {
                assert!((p[axis] - q[axis]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_bond_order_tokens() {
        assert_eq!(bond_order_token(BondOrder::Aromatic, true), "A");
        assert_eq!(bond_order_token(BondOrder::Quadruple, false), "4");
        assert_eq!(bond_order_token(BondOrder::Quadruple, true), "unknown");
        assert_eq!(bond_order_token(BondOrder::TwoAndAHalf, false), "2.5");
        assert_eq!(bond_order_token(BondOrder::Unspecified, false), "unknown");
    }

    #[test]
    fn test_hydrogen_count_and_stereo() {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom(Atom::new(6));
        let c2 = mol.add_atom(Atom::new(6));
        let mut bond = Bond::new(BondOrder::Double);
        bond.stereo = BondStereo::Trans;
        mol.add_bond(c1, c2, bond);
        mol.sanitize().expect("ethene");

        let xml = mol_to_cml_block(&mol, CmlWriterParams::default(), None).expect("writable");
        assert!(xml.contains(r#"elementType="C" formalCharge="0" spinMultiplicity="1" hydrogenCount="2""#));
        assert!(xml.contains("<bondStereo>T</bondStereo>"));
        assert!(!xml.contains("x3="));
    }

    #[test]
    fn test_diradical_atom_omits_spin() {
        let mut mol = Molecule::new();
        let mut carbene = Atom::new(6);
        carbene.num_radical_electrons = 2;
        carbene.implicit_hydrogens = Some(2);
        mol.add_atom(carbene);

        let mut out = Vec::new();
        {
            let mut writer = CmlWriter::new(&mut out, CmlWriterParams::default());
            writer.add(&mol, None).expect("only logged");
            writer.write().expect("writable");
        }
        let xml = String::from_utf8(out).expect("utf-8");
        assert!(xml.contains(r#"<molecule id="m0" formalCharge="0">"#));
        assert!(xml.contains(r#"<atom id="a0" elementType="C" formalCharge="0" hydrogenCount="2"/>"#));
        assert!(!xml.contains("spinMultiplicity"));
    }

    #[test]
    fn test_huge_hydrogen_count_is_saturated() {
        let mut mol = hydroxyl();
        mol.atom_mut(0).implicit_hydrogens = Some(u32::MAX);
        let xml = mol_to_cml_block(&mol, CmlWriterParams::default(), None).expect("writable");
        assert!(xml.contains(r#"hydrogenCount="4294967295""#));
    }

    #[test]
    fn test_flat_conformer() {
        let mut mol = Molecule::new();
        mol.add_atom(Atom::new(6));
        mol.add_conformer(Conformer::from_positions(vec![[1.0, 2.0, 0.0]], false));
        let xml = mol_to_cml_block(&mol, CmlWriterParams::default(), None).expect("writable");
        assert!(xml.contains(r#"x2="1.000000" y2="2.000000""#));
        assert!(!xml.contains("z3="));

        let err = mol_to_cml_block(&mol, CmlWriterParams::default(), Some(3)).expect_err("no such conformer");
        assert_eq!(err.kind, crate::cml::ErrorKind::Write);
    }

    #[test]
    fn test_sequential_identifiers_and_drop() {
        let mut out = Vec::new();
        {
            let mut writer = CmlWriter::new(&mut out, CmlWriterParams::default());
            writer.add(&hydroxyl(), None).expect("first");
            writer.add(&hydroxyl(), None).expect("second");
            assert_eq!(writer.num_molecules(), 2);
        }
        let xml = String::from_utf8(out).expect("utf-8");
        assert!(xml.contains(r#"<molecule id="m0""#));
        assert!(xml.contains(r#"<molecule id="m1""#));
        assert_eq!(xml.matches("<?xml").count(), 1);
    }

    #[test]
    fn test_create_in_missing_directory() {
        let err = CmlWriter::create("/nonexistent/dir/out.cml", CmlWriterParams::default())
            .err()
            .expect("cannot create");
        assert_eq!(err.kind, crate::cml::ErrorKind::BadFile);
    }
}
