use super::attribute::{get_attribute, require_attribute};
use super::error::{CmlError, CmlResult, XPath};
use super::identifier::{validate_id, IdScope};
use super::tree::Node;
use crate::model::{Atom, Point3D};
use tracing::*;

/// Element types that stand for a placeholder rather than a real element.
const PLACEHOLDER_TYPES: [&str; 2] = ["Du", "R"];

/// One `atom` element turned into model data, plus the pieces the
/// molecule builder reconciles after every atom has been read.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// Locator of the element, qualified with its `id`.
    pub path: XPath,
    pub atom: Atom,
    pub position: Option<Point3D>,
    /// Declared `hydrogenCount`, applied once bonds are known.
    pub hydrogen_count: Option<u32>,
    pub spin_multiplicity: Option<u32>,
}

/// Build the atom at positional `index` from `node`, registering its id in `ids`.
///
/// `path` locates the unqualified `atom` element.
pub fn build_atom(node: &Node, path: &XPath, index: usize, ids: &mut IdScope) -> CmlResult<AtomRecord> {
    let id: String = require_attribute(node, "id", path)?;
    validate_id(&path.attribute("id"), &id)?;
    ids.register(&path.attribute("id"), &id, index)?;
    let path = path.with_id(&id);

    let element_type: String = require_attribute(node, "elementType", &path)?;
    let mut atom = if PLACEHOLDER_TYPES.contains(&element_type.as_str()) {
        Atom::dummy()
    } else {
        Atom::from_symbol(&element_type).ok_or_else(|| {
            CmlError::invalid_value(
                &path.attribute("elementType"),
                &element_type,
                "is not an element symbol",
            )
        })?
    };

    atom.isotope = get_attribute(node, "isotopeNumber", &path)?;
    if let Some(charge) = get_attribute(node, "formalCharge", &path)? {
        atom.formal_charge = charge;
    }

    let spin_multiplicity: Option<u32> = get_attribute(node, "spinMultiplicity", &path)?;
    match spin_multiplicity {
        Some(0) => return Err(CmlError::zero(&path.attribute("spinMultiplicity"))),
        Some(spin @ (1 | 2)) => atom.num_radical_electrons = spin - 1,
        Some(spin) => warn!(
            "{} (= {spin}) is ignored",
            path.attribute("spinMultiplicity")
        ),
        None => {}
    }

    let hydrogen_count = get_attribute(node, "hydrogenCount", &path)?;
    let position = read_position(node, &path)?;

    Ok(AtomRecord {
        path,
        atom,
        position,
        hydrogen_count,
        spin_multiplicity,
    })
}

/// The `x3`/`y3`/`z3` triple, which must be complete or absent.
fn read_position(node: &Node, path: &XPath) -> CmlResult<Option<Point3D>> {
    let x = get_attribute::<f64>(node, "x3", path)?;
    let y = get_attribute::<f64>(node, "y3", path)?;
    let z = get_attribute::<f64>(node, "z3", path)?;
    match (x, y, z) {
        (Some(x), Some(y), Some(z)) => {
            trace!("{path} ({x}, {y}, {z})");
            Ok(Some([x, y, z]))
        }
        (None, None, None) => {
            info!("{path} does not have geometrical info (x2 and y2 are ignored if exist)");
            Ok(None)
        }
        _ => Err(CmlError::incomplete_coordinates(path)),
    }
}
