//! Construction of one molecule from a `molecule` element.
//!
//! The builder walks the element in a fixed order of stages and ends in
//! [`Stage::Done`] or [`Stage::Failed`]. A failure discards the partially built
//! molecule.

use super::atom::build_atom;
use super::attribute::get_attribute;
use super::bond::build_bond;
use super::error::{CmlError, CmlResult, XPath};
use super::identifier::{is_valid_id, IdScope};
use super::tree::Node;
use crate::model::{Conformer, Molecule};
use tracing::*;

/// Post-construction normalisation applied by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmlParserParams {
    /// Check valences and perceive implicit hydrogens.
    pub sanitize: bool,
    /// Fold plain explicit hydrogens into their neighbours. Needs `sanitize`.
    pub remove_hs: bool,
}

impl Default for CmlParserParams {
    fn default() -> Self {
        Self {
            sanitize: true,
            remove_hs: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ValidatingHeader,
    BuildingAtoms,
    BuildingBonds,
    Reconciling,
    Finalizing,
    Done,
    Failed,
}

pub struct MoleculeBuilder<'a> {
    node: &'a Node,
    path: XPath,
    params: CmlParserParams,
    stage: Stage,
    molecule: Molecule,
    atom_ids: IdScope,
    bond_ids: IdScope,
    formal_charge_sum: i64,
    /// Sum of `spinMultiplicity - 1` over the atoms declaring one.
    unpaired_sum: u64,
    hydrogen_counts: Vec<(XPath, Option<u32>)>,
    conformer: Option<Conformer>,
}

impl<'a> MoleculeBuilder<'a> {
    /// `path` locates `node` in its document, without an id qualifier.
    pub fn new(node: &'a Node, path: XPath, params: CmlParserParams) -> Self {
        Self {
            node,
            path,
            params,
            stage: Stage::Init,
            molecule: Molecule::new(),
            atom_ids: IdScope::new(),
            bond_ids: IdScope::new(),
            formal_charge_sum: 0,
            unpaired_sum: 0,
            hydrogen_counts: Vec::new(),
            conformer: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run every stage and hand over the molecule. Only a fresh builder can
    /// build; afterwards it reports end of input.
    pub fn build(&mut self) -> CmlResult<Molecule> {
        if self.stage != Stage::Init {
            return Err(CmlError::end_of_input());
        }
        match self.run() {
            Ok(()) => {
                self.advance(Stage::Done);
                Ok(std::mem::take(&mut self.molecule))
            }
            Err(err) => {
                debug!("{} failed while {:?}: {err}", self.path, self.stage);
                self.advance(Stage::Failed);
                Err(err)
            }
        }
    }

    fn run(&mut self) -> CmlResult<()> {
        self.advance(Stage::ValidatingHeader);
        self.validate_header()?;
        self.advance(Stage::BuildingAtoms);
        self.build_atoms()?;
        self.advance(Stage::BuildingBonds);
        self.build_bonds()?;
        self.advance(Stage::Reconciling);
        self.reconcile_hydrogen_counts();
        self.advance(Stage::Finalizing);
        self.finalize()
    }

    fn advance(&mut self, stage: Stage) {
        trace!("{}: {:?} -> {:?}", self.path, self.stage, stage);
        self.stage = stage;
    }

    fn validate_header(&mut self) -> CmlResult<()> {
        match self.node.attribute("id") {
            None => warn!("{} is missing", self.path.attribute("id")),
            Some(id) if !is_valid_id(id) => {
                warn!("{} (= \"{id}\") is invalid", self.path.attribute("id"))
            }
            Some(id) => self.path = self.path.with_id(id),
        }

        let formal_charge = get_attribute::<i32>(self.node, "formalCharge", &self.path)?;
        if formal_charge.is_none() {
            warn!("{} is missing", self.path.attribute("formalCharge"));
        }
        let spin_multiplicity = get_attribute::<u32>(self.node, "spinMultiplicity", &self.path)?;
        match spin_multiplicity {
            None => warn!("{} is missing", self.path.attribute("spinMultiplicity")),
            Some(0) => return Err(CmlError::zero(&self.path.attribute("spinMultiplicity"))),
            Some(_) => {}
        }
        self.molecule.formal_charge = formal_charge;
        self.molecule.spin_multiplicity = spin_multiplicity;

        // Only the first name is kept.
        self.molecule.name = self
            .node
            .first_child("name")
            .map(|name| name.text.clone())
            .filter(|name| !name.is_empty());
        Ok(())
    }

    /// The single child called `name`, if any.
    fn get_array(&self, name: &str) -> CmlResult<Option<&'a Node>> {
        let node: &'a Node = self.node;
        match node.count_children(name) {
            0 => {
                info!("{} is missing", self.path.child(name));
                Ok(None)
            }
            1 => Ok(node.first_child(name)),
            _ => Err(CmlError::multiple_elements(&self.path, name)),
        }
    }

    fn build_atoms(&mut self) -> CmlResult<()> {
        let Some(array) = self.get_array("atomArray")? else {
            return Ok(());
        };
        let array_path = self.path.child("atomArray");
        log_ignored_attributes(array, &array_path);

        let num_atoms = array.count_children("atom");
        if num_atoms == 0 {
            return Err(CmlError::mandatory_element(&array_path, "atom"));
        }

        let atom_path = array_path.child("atom");
        let mut conformer = Conformer::new(num_atoms, true);
        let mut has_positions = false;
        for child in &array.children {
            if child.name != "atom" {
                info!("{array_path}/{} is ignored", child.name);
                continue;
            }

            let index = self.molecule.num_atoms();
            let record = build_atom(child, &atom_path, index, &mut self.atom_ids)?;
            self.formal_charge_sum += i64::from(record.atom.formal_charge);
            if let Some(spin) = record.spin_multiplicity {
                self.unpaired_sum += u64::from(spin - 1);
            }
            if let Some(position) = record.position {
                conformer.set_position(index, position);
                has_positions = true;
            }
            self.hydrogen_counts.push((record.path, record.hydrogen_count));
            self.molecule.add_atom(record.atom);
        }
        if has_positions {
            self.conformer = Some(conformer);
        }

        self.reconcile_aggregates()
    }

    /// Compare the molecule-level totals with what the atoms add up to.
    fn reconcile_aggregates(&self) -> CmlResult<()> {
        if let Some(declared) = self.molecule.formal_charge {
            if i64::from(declared) != self.formal_charge_sum {
                return Err(CmlError::aggregate_mismatch(
                    &self.path.attribute("formalCharge"),
                    declared,
                    "sum of ../atomArray/atom/@formalCharge",
                    self.formal_charge_sum,
                ));
            }
        }
        if let Some(declared) = self.molecule.spin_multiplicity {
            let derived = 1 + self.unpaired_sum;
            if u64::from(declared) != derived {
                return Err(CmlError::aggregate_mismatch(
                    &self.path.attribute("spinMultiplicity"),
                    declared,
                    "1 + sum of (../atomArray/atom/@spinMultiplicity - 1)",
                    derived,
                ));
            }
        }
        Ok(())
    }

    fn build_bonds(&mut self) -> CmlResult<()> {
        let Some(array) = self.get_array("bondArray")? else {
            return Ok(());
        };
        let array_path = self.path.child("bondArray");
        log_ignored_attributes(array, &array_path);

        if array.count_children("bond") == 0 {
            return Err(CmlError::mandatory_element(&array_path, "bond"));
        }

        let bond_path = array_path.child("bond");
        for child in &array.children {
            if child.name != "bond" {
                info!("{array_path}/{} is ignored", child.name);
                continue;
            }

            let index = self.molecule.num_bonds();
            let record = build_bond(child, &bond_path, index, &self.atom_ids, &mut self.bond_ids)?;
            if self.molecule.has_bond(record.begin, record.end) {
                let refs = child.attribute("atomRefs2").unwrap_or_default();
                return Err(CmlError::malformed_reference(
                    &record.path.attribute("atomRefs2"),
                    refs,
                    "duplicates an earlier bond",
                ));
            }
            self.molecule.add_bond(record.begin, record.end, record.bond);
        }
        Ok(())
    }

    /// Turn declared total hydrogen counts into implicit counts.
    fn reconcile_hydrogen_counts(&mut self) {
        for (index, (path, declared)) in self.hydrogen_counts.iter().enumerate() {
            let Some(declared) = *declared else {
                continue;
            };
            let explicit = self.molecule.explicit_hydrogen_neighbors(index);
            if declared < explicit {
                warn!(
                    "{}/@hydrogenCount (= {declared}) is less than the number of explicitly connected hydrogens (= {explicit})",
                    path
                );
            } else {
                self.molecule.atom_mut(index).implicit_hydrogens = Some(declared - explicit);
            }
        }
    }

    fn finalize(&mut self) -> CmlResult<()> {
        if let Some(conformer) = self.conformer.take() {
            self.molecule.add_conformer(conformer);
        }

        if self.params.sanitize {
            let result = if self.params.remove_hs {
                self.molecule.remove_hs()
            } else {
                self.molecule.sanitize()
            };
            result.map_err(|err| CmlError::sanitize(&self.path, err))?;
        }
        Ok(())
    }
}

fn log_ignored_attributes(node: &Node, path: &XPath) {
    for (name, value) in &node.attributes {
        info!("{path}/@{name} (= \"{value}\") is ignored");
    }
}
