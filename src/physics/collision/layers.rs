//! Named collision layers and the matrix of which layers may collide.

use crate::physics::bitmatrix::{BitMatrix, BitMatrixParams};
use std::collections::HashMap;

/// Interned identifier of a named collision layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) usize);

/// A symmetric table of which layers are tested against which.
///
/// Layer names are interned the first time they're seen,
/// whether they appear in the matrix or only on a collider.
/// A matrix built from an empty rule set with [`allow_all`][Self::allow_all]
/// lets every layer collide with every layer, including itself.
#[derive(Clone, Debug)]
pub struct LayerMatrix {
    ids: HashMap<String, LayerId>,
    // None means no gating at all
    rules: Option<Vec<(LayerId, LayerId)>>,
    masks: BitMatrix,
}

impl Default for LayerMatrix {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl LayerMatrix {
    /// A matrix where every layer collides with every other layer.
    pub fn allow_all() -> Self {
        Self {
            ids: HashMap::new(),
            rules: None,
            masks: BitMatrix::default(),
        }
    }

    /// A matrix where only the listed pairs of layers collide.
    /// Pairs are symmetric, so listing `("player", "ground")`
    /// also lets ground collide with players.
    /// For a layer to collide with itself it must be paired with itself.
    pub fn from_pairs<A, B>(pairs: impl IntoIterator<Item = (A, B)>) -> Self
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut matrix = Self {
            rules: Some(Vec::new()),
            ..Self::allow_all()
        };
        let rules: Vec<(LayerId, LayerId)> = pairs
            .into_iter()
            .map(|(a, b)| (matrix.intern(a.as_ref()), matrix.intern(b.as_ref())))
            .collect();
        matrix.rules = Some(rules);
        matrix.rebuild_masks();
        matrix
    }

    /// Get the id for a layer name, registering it if it's new.
    pub fn intern(&mut self, name: &str) -> LayerId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = LayerId(self.ids.len());
        self.ids.insert(name.to_string(), id);
        if let Some(rules) = &self.rules {
            if !rules.is_empty() && !rules.iter().any(|(a, b)| *a == id || *b == id) {
                log::warn!("Layer {name:?} is not in the collision matrix and won't collide with anything");
            }
            self.rebuild_masks();
        }
        id
    }

    /// Look up an already registered layer.
    #[inline]
    pub fn id(&self, name: &str) -> Option<LayerId> {
        self.ids.get(name).copied()
    }

    /// Check if colliders on these two layers are allowed to collide.
    #[inline]
    pub fn allows(&self, a: LayerId, b: LayerId) -> bool {
        match self.rules {
            None => true,
            Some(_) => a.0 < self.masks.row_count() && self.masks.row(a.0).contains(b.0),
        }
    }

    fn rebuild_masks(&mut self) {
        let rules = match &self.rules {
            Some(rules) => rules,
            None => return,
        };
        let layer_count = self.ids.len();
        self.masks.reset(BitMatrixParams {
            bits_per_row: layer_count,
            row_count: layer_count,
        });
        for &(a, b) in rules {
            self.masks.set(a.0, b.0);
            self.masks.set(b.0, a.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_symmetric() {
        let mut matrix = LayerMatrix::from_pairs([("player", "ground"), ("player", "coin")]);
        let player = matrix.intern("player");
        let ground = matrix.intern("ground");
        let coin = matrix.intern("coin");
        assert!(matrix.allows(player, ground));
        assert!(matrix.allows(ground, player));
        assert!(matrix.allows(coin, player));
        assert!(!matrix.allows(ground, coin));
        // not paired with itself
        assert!(!matrix.allows(player, player));
    }

    #[test]
    fn unknown_layers_collide_with_nothing_when_gated() {
        let mut matrix = LayerMatrix::from_pairs([("a", "a")]);
        let a = matrix.intern("a");
        let stranger = matrix.intern("stranger");
        assert!(matrix.allows(a, a));
        assert!(!matrix.allows(a, stranger));
        assert!(!matrix.allows(stranger, stranger));
        assert_eq!(matrix.id("stranger"), Some(stranger));
    }

    #[test]
    fn ungated_matrix_allows_everything() {
        let mut matrix = LayerMatrix::allow_all();
        let a = matrix.intern("a");
        let b = matrix.intern("b");
        assert!(matrix.allows(a, b) && matrix.allows(b, b));
        assert_eq!(matrix.id("a"), Some(a));
        assert_eq!(matrix.id("c"), None);
    }
}
