//! Chemical Markup Language (CML) reading and writing on a petgraph molecule
//! model, with a Chemical JSON writer.

mod model;
pub use model::*;

pub mod cml;
pub use cml::{
    mol_from_cml_block, mol_from_cml_file, mol_from_cml_reader, mol_to_cml_block, CmlError,
    CmlParserParams, CmlResult, CmlSupplier, CmlWriter, CmlWriterParams, ErrorKind,
};

pub mod cjson;
pub use cjson::{mol_to_cjson_block, mol_to_cjson_file, CjsonCoords, CjsonError, CjsonWriterParams};

use tracing::Level;

/// Install a formatting subscriber at `level` (`"trace"`, `"debug"`, ...).
/// Unknown levels fall back to `info`; a second call is a no-op.
pub fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
