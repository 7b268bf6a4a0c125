//! The in-memory molecule model populated by the readers and consumed by the writers.
//!
//! Atoms live in an undirected petgraph graph. The node index of an atom is its
//! positional index, which is the order atoms were added in; bonds refer to atoms
//! by these indices only.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

mod element;
pub use element::*;

mod ops;
pub use ops::*;

/// A Cartesian position in Angstrom.
pub type Point3D = [f64; 3];

pub type MoleculeGraph = UnGraph<Atom, Bond>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    /// Atomic number; zero marks a dummy or R-group placeholder.
    pub atomic_num: u8,
    /// Mass number, `None` for natural abundance.
    pub isotope: Option<u32>,
    pub formal_charge: i32,
    pub num_radical_electrons: u32,
    /// Hydrogens carried by the atom that are not nodes of the graph.
    /// `None` until declared by the input or perceived by [`Molecule::sanitize`].
    pub implicit_hydrogens: Option<u32>,
}

impl Atom {
    pub fn new(atomic_num: u8) -> Self {
        Self {
            atomic_num,
            ..Self::default()
        }
    }

    pub fn dummy() -> Self {
        Self::new(0)
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        atomic_number(symbol).map(Self::new)
    }

    /// The element symbol, or `Du` for placeholder atoms.
    pub fn symbol(&self) -> &'static str {
        symbol(self.atomic_num).unwrap_or(DUMMY_SYMBOL)
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_num == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Unspecified,
    Single,
    Double,
    Triple,
    Quadruple,
    Quintuple,
    Hextuple,
    OneAndAHalf,
    TwoAndAHalf,
    ThreeAndAHalf,
    FourAndAHalf,
    FiveAndAHalf,
    Aromatic,
}

impl BondOrder {
    /// Bond order in units of half a bond, so fractional orders stay integral.
    pub fn half_units(self) -> u32 {
        match self {
            BondOrder::Unspecified => 0,
            BondOrder::Single => 2,
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Quadruple => 8,
            BondOrder::Quintuple => 10,
            BondOrder::Hextuple => 12,
            BondOrder::OneAndAHalf | BondOrder::Aromatic => 3,
            BondOrder::TwoAndAHalf => 5,
            BondOrder::ThreeAndAHalf => 7,
            BondOrder::FourAndAHalf => 9,
            BondOrder::FiveAndAHalf => 11,
        }
    }

    pub fn as_f64(self) -> f64 {
        self.half_units() as f64 / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Cis,
    Trans,
    Wedge,
    Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bond {
    pub order: BondOrder,
    pub stereo: BondStereo,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            stereo: BondStereo::None,
        }
    }
}

/// A set of coordinates with one slot per atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformer {
    positions: Vec<Point3D>,
    is_3d: bool,
}

impl Conformer {
    /// A conformer with every atom at the origin.
    pub fn new(num_atoms: usize, is_3d: bool) -> Self {
        Self {
            positions: vec![[0.0; 3]; num_atoms],
            is_3d,
        }
    }

    pub fn from_positions(positions: Vec<Point3D>, is_3d: bool) -> Self {
        Self { positions, is_3d }
    }

    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> Option<Point3D> {
        self.positions.get(index).copied()
    }

    /// Set the position of an atom, growing the conformer if needed.
    pub fn set_position(&mut self, index: usize, position: Point3D) {
        if index >= self.positions.len() {
            self.positions.resize(index + 1, [0.0; 3]);
        }
        self.positions[index] = position;
    }

    pub fn positions(&self) -> &[Point3D] {
        &self.positions
    }

    pub(crate) fn retain_atoms(&mut self, keep: &[bool]) {
        let mut index = 0;
        self.positions.retain(|_| {
            let kept = keep.get(index).copied().unwrap_or(true);
            index += 1;
            kept
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct Molecule {
    graph: MoleculeGraph,
    conformers: Vec<Conformer>,
    pub name: Option<String>,
    /// Total formal charge as declared by the source document.
    pub formal_charge: Option<i32>,
    /// Total spin multiplicity as declared by the source document.
    pub spin_multiplicity: Option<u32>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }

    /// Append an atom and return its positional index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.graph.add_node(atom).index()
    }

    /// Connect two existing atoms and return the bond index.
    ///
    /// Panics if either index is out of range.
    pub fn add_bond(&mut self, begin: usize, end: usize, bond: Bond) -> usize {
        self.graph
            .add_edge(NodeIndex::new(begin), NodeIndex::new(end), bond)
            .index()
    }

    pub fn num_atoms(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_bonds(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn atom(&self, index: usize) -> &Atom {
        &self.graph[NodeIndex::new(index)]
    }

    pub fn atom_mut(&mut self, index: usize) -> &mut Atom {
        &mut self.graph[NodeIndex::new(index)]
    }

    /// Atoms in positional order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.graph.node_weights()
    }

    /// The endpoints and data of a bond, `None` if the index is out of range.
    pub fn bond(&self, index: usize) -> Option<(usize, usize, &Bond)> {
        let edge = EdgeIndex::new(index);
        let (begin, end) = self.graph.edge_endpoints(edge)?;
        Some((begin.index(), end.index(), &self.graph[edge]))
    }

    /// Bonds in insertion order as `(begin, end, bond)`.
    pub fn bonds(&self) -> impl Iterator<Item = (usize, usize, &Bond)> {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index(), edge.weight()))
    }

    /// Whether `begin` and `end` are already bonded.
    pub fn has_bond(&self, begin: usize, end: usize) -> bool {
        self.graph
            .find_edge(NodeIndex::new(begin), NodeIndex::new(end))
            .is_some()
    }

    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors(NodeIndex::new(index))
            .map(|neighbor| neighbor.index())
    }

    pub fn degree(&self, index: usize) -> usize {
        self.graph.edges(NodeIndex::new(index)).count()
    }

    /// Number of hydrogen atoms bonded to an atom as graph nodes.
    pub fn explicit_hydrogen_neighbors(&self, index: usize) -> u32 {
        self.neighbors(index)
            .filter(|&neighbor| self.atom(neighbor).is_hydrogen())
            .count() as u32
    }

    /// Attach a conformer and return its id.
    pub fn add_conformer(&mut self, conformer: Conformer) -> usize {
        self.conformers.push(conformer);
        self.conformers.len() - 1
    }

    pub fn num_conformers(&self) -> usize {
        self.conformers.len()
    }

    /// A conformer by id; `None` selects the first one.
    pub fn conformer(&self, id: Option<usize>) -> Option<&Conformer> {
        self.conformers.get(id.unwrap_or(0))
    }

    pub fn total_formal_charge(&self) -> i64 {
        self.atoms().map(|atom| i64::from(atom.formal_charge)).sum()
    }

    pub fn total_radical_electrons(&self) -> u32 {
        self.atoms().map(|atom| atom.num_radical_electrons).sum()
    }
}
