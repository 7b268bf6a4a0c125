use super::*;
use thiserror::Error;
use tracing::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("explicit valence for atom #{index} {symbol} is {valence}, greater than permitted {max}")]
    Valence {
        index: usize,
        symbol: &'static str,
        valence: u32,
        max: u32,
    },
}

impl Molecule {
    /// Valence from bonds and radical electrons, rounding fractional bond orders up.
    pub fn explicit_valence(&self, index: usize) -> u32 {
        let half_units: u32 = self
            .graph
            .edges(NodeIndex::new(index))
            .map(|edge| edge.weight().order.half_units())
            .sum();
        (half_units + 1) / 2 + self.atom(index).num_radical_electrons
    }

    /// Check valences and perceive implicit hydrogen counts.
    ///
    /// Atoms whose count was declared keep it; the others receive the number of
    /// hydrogens needed to reach the smallest allowed valence. Charged atoms and
    /// elements without default valences are not checked and default to zero.
    pub fn sanitize(&mut self) -> Result<(), SanitizeError> {
        for index in 0..self.num_atoms() {
            let atom = self.atom(index);
            let valences = default_valences(atom.atomic_num);
            let (Some(&max), 0) = (valences.last(), atom.formal_charge) else {
                self.atom_mut(index).implicit_hydrogens.get_or_insert(0);
                continue;
            };

            let explicit = self.explicit_valence(index);
            let declared = atom.implicit_hydrogens;
            let total = explicit.saturating_add(declared.unwrap_or(0));
            if total > max {
                return Err(SanitizeError::Valence {
                    index,
                    symbol: atom.symbol(),
                    valence: total,
                    max,
                });
            }

            if declared.is_none() {
                let target = valences
                    .iter()
                    .copied()
                    .find(|&valence| valence >= explicit)
                    .unwrap_or(explicit);
                trace!("atom #{index}: {} implicit hydrogens", target - explicit);
                self.atom_mut(index).implicit_hydrogens = Some(target - explicit);
            }
        }
        Ok(())
    }

    /// Sanitize, then fold plain terminal hydrogens into their heavy neighbour.
    ///
    /// Hydrogens with an isotope label, a charge, a radical, or anything other than
    /// a single bond to one non-hydrogen atom stay in the graph.
    pub fn remove_hs(&mut self) -> Result<(), SanitizeError> {
        self.sanitize()?;

        let removable: Vec<bool> = (0..self.num_atoms())
            .map(|index| self.is_removable_hydrogen(index))
            .collect();
        if !removable.contains(&true) {
            return Ok(());
        }

        for index in (0..self.num_atoms()).filter(|&index| removable[index]) {
            let heavy = self.neighbors(index).next();
            if let Some(heavy) = heavy {
                let count = self.atom_mut(heavy).implicit_hydrogens.get_or_insert(0);
                *count = count.saturating_add(1);
            }
        }

        self.graph = self.graph.filter_map(
            |node, atom| (!removable[node.index()]).then(|| atom.clone()),
            |_, bond| Some(*bond),
        );
        let keep: Vec<bool> = removable.iter().map(|removed| !removed).collect();
        for conformer in &mut self.conformers {
            conformer.retain_atoms(&keep);
        }
        debug!(
            "removed {} explicit hydrogens",
            removable.iter().filter(|&&removed| removed).count()
        );
        Ok(())
    }

    fn is_removable_hydrogen(&self, index: usize) -> bool {
        let atom = self.atom(index);
        if !atom.is_hydrogen()
            || atom.isotope.is_some()
            || atom.formal_charge != 0
            || atom.num_radical_electrons != 0
        {
            return false;
        }

        let mut edges = self.graph.edges(NodeIndex::new(index));
        match (edges.next(), edges.next()) {
            (Some(edge), None) => {
                let other = if edge.source().index() == index {
                    edge.target()
                } else {
                    edge.source()
                };
                edge.weight().order == BondOrder::Single && !self.graph[other].is_hydrogen()
            }
            _ => false,
        }
    }
}
