//! Chemical JSON output.
//!
//! Only the writer exists. Atoms are listed by atomic number and charge, bonds
//! as flat index pairs with numeric orders.

use crate::model::{BondOrder, Molecule};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::*;

const CHEMICAL_JSON_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CjsonError {
    #[error("atoms.coords.{0} is not supported yet")]
    Unsupported(&'static str),
    #[error("molecule has no conformer {0}")]
    MissingConformer(usize),
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type CjsonResult<T> = Result<T, CjsonError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CjsonCoords {
    /// Cartesian coordinates in Angstrom.
    #[default]
    ThreeD,
    /// Coordinates relative to a unit cell.
    ThreeDFractional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CjsonWriterParams {
    pub coords: CjsonCoords,
}

fn bond_order_value(order: BondOrder) -> Value {
    match order {
        BondOrder::Unspecified => json!(0),
        BondOrder::Single => json!(1),
        BondOrder::Double => json!(2),
        BondOrder::Triple => json!(3),
        BondOrder::Quadruple => json!(4),
        BondOrder::Quintuple => json!(5),
        BondOrder::Hextuple => json!(6),
        fractional => json!(fractional.as_f64()),
    }
}

/// Build the Chemical JSON object for `mol`, using conformer `conf_id`
/// (the first one when `None`).
pub fn mol_to_cjson_value(
    mol: &Molecule,
    params: CjsonWriterParams,
    conf_id: Option<usize>,
) -> CjsonResult<Value> {
    let conformer = mol.conformer(conf_id);
    if let (Some(id), None) = (conf_id, conformer) {
        return Err(CjsonError::MissingConformer(id));
    }

    if params.coords == CjsonCoords::ThreeDFractional {
        return Err(CjsonError::Unsupported("3dFractional"));
    }

    // Without a conformer the coordinate array is present but empty.
    let coords: Vec<f64> = conformer
        .map(|conformer| {
            (0..mol.num_atoms())
                .flat_map(|index| conformer.position(index).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let mut atoms = Map::new();
    atoms.insert("coords".to_string(), json!({ "3d": coords }));
    let numbers: Vec<u8> = mol.atoms().map(|atom| atom.atomic_num).collect();
    let charges: Vec<i32> = mol.atoms().map(|atom| atom.formal_charge).collect();
    atoms.insert("elements".to_string(), json!({ "number": numbers }));
    atoms.insert("formalCharges".to_string(), json!(charges));

    let mut connections = Vec::with_capacity(2 * mol.num_bonds());
    let mut orders = Vec::with_capacity(mol.num_bonds());
    for (begin, end, bond) in mol.bonds() {
        connections.push(begin.min(end));
        connections.push(begin.max(end));
        orders.push(bond_order_value(bond.order));
    }

    let mut root = Map::new();
    root.insert("chemicalJson".to_string(), json!(CHEMICAL_JSON_VERSION));
    if let Some(name) = mol.name.as_ref().filter(|name| !name.is_empty()) {
        root.insert("name".to_string(), json!(name));
    }
    root.insert("atoms".to_string(), Value::Object(atoms));
    root.insert(
        "bonds".to_string(),
        json!({ "connections": { "index": connections }, "order": orders }),
    );
    root.insert(
        "properties".to_string(),
        json!({ "totalCharge": mol.total_formal_charge() }),
    );
    Ok(Value::Object(root))
}

/// Render `mol` as one line of Chemical JSON.
pub fn mol_to_cjson_block(
    mol: &Molecule,
    params: CjsonWriterParams,
    conf_id: Option<usize>,
) -> CjsonResult<String> {
    let value = mol_to_cjson_value(mol, params, conf_id)?;
    Ok(format!("{}\n", serde_json::to_string(&value)?))
}

pub fn mol_to_cjson_file(
    mol: &Molecule,
    path: impl AsRef<Path>,
    params: CjsonWriterParams,
    conf_id: Option<usize>,
) -> CjsonResult<()> {
    let path = path.as_ref();
    let block = mol_to_cjson_block(mol, params, conf_id)?;
    let io_error = |source| CjsonError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(block.as_bytes()).map_err(io_error)?;
    debug!("wrote {}", path.display());
    Ok(())
}
