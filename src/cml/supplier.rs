use super::document::mol_from_document;
use super::error::{CmlError, CmlResult};
use super::molecule::CmlParserParams;
use super::tree::Document;
use crate::model::Molecule;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::*;

/// Reads the molecule of one CML document.
///
/// A document holds at most one molecule, so the supplier is single-shot: the
/// first call to [`CmlSupplier::next_molecule`] consumes the source and every
/// later call fails with `EndOfInput`. As an [`Iterator`] it simply ends.
pub struct CmlSupplier<R> {
    source: Option<R>,
    params: CmlParserParams,
}

impl<R: BufRead> CmlSupplier<R> {
    pub fn new(source: R, params: CmlParserParams) -> Self {
        Self {
            source: Some(source),
            params,
        }
    }

    pub fn params(&self) -> CmlParserParams {
        self.params
    }

    pub fn at_end(&self) -> bool {
        self.source.is_none()
    }

    /// Parse the document. `Ok(None)` means it was valid but held no molecule.
    pub fn next_molecule(&mut self) -> CmlResult<Option<Molecule>> {
        let source = self.source.take().ok_or_else(CmlError::end_of_input)?;
        let doc = Document::parse(source)?;
        mol_from_document(&doc, self.params)
    }

    /// Release the source. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("CML supplier closed");
        }
    }
}

impl CmlSupplier<BufReader<File>> {
    pub fn from_file(path: impl AsRef<Path>, params: CmlParserParams) -> CmlResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| CmlError::bad_file(path.display(), err))?;
        Ok(Self::new(BufReader::new(file), params))
    }
}

impl<R: BufRead> Iterator for CmlSupplier<R> {
    type Item = CmlResult<Molecule>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at_end() {
            return None;
        }
        self.next_molecule().transpose()
    }
}

pub fn mol_from_cml_reader<R: BufRead>(
    source: R,
    params: CmlParserParams,
) -> CmlResult<Option<Molecule>> {
    CmlSupplier::new(source, params).next_molecule()
}

pub fn mol_from_cml_block(block: &str, params: CmlParserParams) -> CmlResult<Option<Molecule>> {
    mol_from_cml_reader(block.as_bytes(), params)
}

pub fn mol_from_cml_file(
    path: impl AsRef<Path>,
    params: CmlParserParams,
) -> CmlResult<Option<Molecule>> {
    CmlSupplier::from_file(path, params)?.next_molecule()
}
