use lazy_static::lazy_static;
use std::collections::HashMap;

/// Element symbols indexed by `atomic number - 1`.
static SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", // 1-10
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", // 11-20
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", // 21-30
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", // 31-40
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", // 41-50
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", // 51-60
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", // 61-70
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", // 71-80
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", // 81-90
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", // 91-100
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", // 101-110
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og", // 111-118
];

lazy_static! {
    static ref ATOMIC_NUMBERS: HashMap<&'static str, u8> = SYMBOLS
        .iter()
        .enumerate()
        .map(|(i, symbol)| (*symbol, i as u8 + 1))
        .collect();
}

/// Symbol written for atoms with atomic number zero.
pub const DUMMY_SYMBOL: &str = "Du";

/// Look up the atomic number of an element symbol. Symbols are case-sensitive.
pub fn atomic_number(symbol: &str) -> Option<u8> {
    ATOMIC_NUMBERS.get(symbol).copied()
}

/// The element symbol for an atomic number, `None` for zero or anything past oganesson.
pub fn symbol(atomic_num: u8) -> Option<&'static str> {
    match atomic_num {
        0 => None,
        n => SYMBOLS.get(n as usize - 1).copied(),
    }
}

/// Allowed valences of the neutral element, smallest first.
///
/// Empty for elements where no sensible default exists (metals, noble gases);
/// those atoms are skipped by valence checks.
pub fn default_valences(atomic_num: u8) -> &'static [u32] {
    match atomic_num {
        1 => &[1],
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        9 | 17 | 35 | 85 => &[1],
        14 | 32 => &[4],
        15 | 33 => &[3, 5],
        16 | 34 | 52 => &[2, 4, 6],
        53 => &[1, 3, 5, 7],
        _ => &[],
    }
}
