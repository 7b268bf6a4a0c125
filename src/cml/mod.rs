//! Reading and writing the molecular convention of Chemical Markup Language.
//!
//! ```text
//! <cml>
//!   <molecule id="m0" formalCharge="0" spinMultiplicity="1">
//!     <atomArray><atom id="a0" elementType="O" x3=".." y3=".." z3=".."/></atomArray>
//!     <bondArray><bond id="b0" atomRefs2="a0 a1" order="1"/></bondArray>
//!   </molecule>
//! </cml>
//! ```
//!
//! Every violation of the convention is reported as a [`CmlError`] whose
//! locator is an XPath-like path to the offending element or attribute.

mod error;
pub use error::*;

mod tree;
pub use tree::*;

mod attribute;
pub use attribute::*;

mod identifier;
pub use identifier::*;

mod atom;
pub use atom::*;

mod bond;
pub use bond::*;

mod molecule;
pub use molecule::*;

mod document;
pub use document::*;

mod supplier;
pub use supplier::*;

mod writer;
pub use writer::*;
