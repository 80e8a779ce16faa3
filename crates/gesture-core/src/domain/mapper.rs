//! Active gestures → symbol names.
//!
//! A [`MappingRule`] fires when every gesture index it lists is active in the
//! current frame.  The mapper returns the union of the symbols of all fired
//! rules, without duplicates, in the order they first appear.  No precedence
//! is implied between rules: two rules that fire together both contribute.
//!
//! ```text
//! active = {5, 13}
//! rules  = [ [5] → ["i"], [5, 13] → ["left_shift", "i"], [7] → ["space"] ]
//! output = ["i", "left_shift"]
//! ```

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::template::{GestureIndex, GestureMatch, GestureTemplate};

/// Emits `symbols` while all of `required` are active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    #[serde(alias = "indices")]
    pub required: Vec<GestureIndex>,
    #[serde(alias = "keys")]
    pub symbols: Vec<String>,
}

impl MappingRule {
    pub fn new(required: Vec<GestureIndex>, symbols: Vec<String>) -> Self {
        Self { required, symbols }
    }

    /// A rule with no required indices never fires.
    pub fn is_satisfied_by(&self, active: &BTreeSet<GestureIndex>) -> bool {
        !self.required.is_empty() && self.required.iter().all(|i| active.contains(i))
    }
}

/// Ordered rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureMapper {
    rules: Vec<MappingRule>,
}

impl GestureMapper {
    pub fn new(rules: Vec<MappingRule>) -> Self {
        Self { rules }
    }

    /// Builds the table from explicit `rules` followed by one single-index
    /// rule per template that lists `keys`.
    pub fn from_templates(templates: &[GestureTemplate], rules: Vec<MappingRule>) -> Self {
        let mut all = rules;
        all.extend(
            templates
                .iter()
                .filter(|t| !t.keys.is_empty())
                .map(|t| MappingRule::new(vec![t.index], t.keys.clone())),
        );
        Self::new(all)
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Symbols for the gestures matched in one frame.
    pub fn map(&self, matches: &[GestureMatch]) -> Vec<String> {
        let active: BTreeSet<GestureIndex> = matches.iter().map(|m| m.index).collect();
        self.map_indices(&active)
    }

    /// Deduplicated union of the symbols of every satisfied rule.
    pub fn map_indices(&self, active: &BTreeSet<GestureIndex>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for rule in self.rules.iter().filter(|r| r.is_satisfied_by(active)) {
            for symbol in &rule.symbols {
                if seen.insert(symbol.as_str()) {
                    out.push(symbol.clone());
                }
            }
        }
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::keypoint::Joint;
    use crate::domain::template::FovTag;

    fn rule(required: &[GestureIndex], symbols: &[&str]) -> MappingRule {
        MappingRule::new(
            required.to_vec(),
            symbols.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn active(indices: &[GestureIndex]) -> BTreeSet<GestureIndex> {
        indices.iter().copied().collect()
    }

    #[test]
    fn test_rule_fires_only_when_all_indices_present() {
        let mapper = GestureMapper::new(vec![rule(&[1, 2], &["a"])]);
        assert!(mapper.map_indices(&active(&[1])).is_empty());
        assert_eq!(mapper.map_indices(&active(&[1, 2, 3])), vec!["a"]);
    }

    #[test]
    fn test_union_is_deduplicated_in_first_seen_order() {
        // Arrange
        let mapper = GestureMapper::new(vec![
            rule(&[5], &["i"]),
            rule(&[5, 13], &["left_shift", "i"]),
            rule(&[7], &["space"]),
        ]);

        // Act
        let symbols = mapper.map_indices(&active(&[5, 13]));

        // Assert
        assert_eq!(symbols, vec!["i", "left_shift"]);
    }

    #[test]
    fn test_no_rule_fired_yields_no_symbols() {
        let mapper = GestureMapper::new(vec![rule(&[1], &["a"])]);
        assert!(mapper.map_indices(&active(&[])).is_empty());
        assert!(mapper.map_indices(&active(&[9])).is_empty());
    }

    #[test]
    fn test_rule_with_no_required_indices_never_fires() {
        let mapper = GestureMapper::new(vec![rule(&[], &["a"])]);
        assert!(mapper.map_indices(&active(&[])).is_empty());
        assert!(mapper.map_indices(&active(&[1, 2])).is_empty());
    }

    #[test]
    fn test_simultaneous_rules_both_contribute() {
        // Forward and strafe can be active together; neither wins.
        let mapper = GestureMapper::new(vec![rule(&[1], &["w"]), rule(&[2], &["a"])]);
        assert_eq!(mapper.map_indices(&active(&[1, 2])), vec!["w", "a"]);
    }

    #[test]
    fn test_from_templates_appends_implicit_rules_after_explicit_ones() {
        // Arrange
        let template = GestureTemplate {
            name: "RightHandUp".to_string(),
            index: 5,
            base_joint: Joint::RightShoulder,
            core_joints: vec![Joint::RightWrist],
            reference_vector: BTreeMap::from([(Joint::RightWrist, [0.0, -100.0])]),
            similarity_threshold: 0.95,
            fov: FovTag::Standard,
            enabled: true,
            internal: false,
            keys: vec!["i".to_string()],
        };
        let mut silent = template.clone();
        silent.index = 6;
        silent.keys.clear();

        // Act
        let mapper = GestureMapper::from_templates(&[template, silent], vec![rule(&[5, 6], &["j"])]);

        // Assert
        assert_eq!(mapper.rules(), &[rule(&[5, 6], &["j"]), rule(&[5], &["i"])]);
    }

    #[test]
    fn test_map_uses_match_indices() {
        let mapper = GestureMapper::new(vec![rule(&[13], &["a"])]);
        let matches = vec![GestureMatch::new(13, "LeftLean")];
        assert_eq!(mapper.map(&matches), vec!["a"]);
    }

    #[test]
    fn test_rule_deserializes_from_authoring_field_names() {
        let r: MappingRule = serde_json::from_str(r#"{"indices": [1, 2], "keys": ["w"]}"#).unwrap();
        assert_eq!(r, rule(&[1, 2], &["w"]));
    }
}
