use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// Atomic composition of one molecule: element symbol -> number of atoms.
/// Zero counts are never stored.
pub type ElementCount = HashMap<String, usize>;

/// Errors that can occur while parsing a single molecule formula
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoleculeErrorKind {
    /// ')' found with no open group to close
    #[error("unmatched closing parenthesis")]
    UnmatchedClosingParen,
    /// '(' was never closed before the end of the formula
    #[error("unmatched opening parenthesis")]
    UnmatchedOpeningParen,
    /// the formula parsed to zero elements (empty or garbage-only input)
    #[error("no elements found in the formula")]
    NoElements,
    /// strict mode only: a character outside [A-Za-z0-9()]
    #[error("forbidden character '{0}' in the formula")]
    ForbiddenChar(char),
}

/// Switches for the formula parser. Strict mode (the default) rejects any
/// character outside letters, digits and parentheses; permissive mode skips
/// such characters silently, which is handy for formulas with parsing
/// artifacts from databases, e.g. phase marks like "H2O(g)".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub permissive: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig { permissive: false }
    }
}

impl ParserConfig {
    pub fn strict() -> Self {
        ParserConfig::default()
    }
    pub fn permissive() -> Self {
        ParserConfig { permissive: true }
    }
}

// Define a struct to hold element data
struct Element {
    name: &'static str,
    atomic_mass: f64,
}

// Define a list of elements and their atomic masses
const ELEMENTS: &[Element] = &[
    Element { name: "H", atomic_mass: 1.008 },
    Element { name: "He", atomic_mass: 4.0026 },
    Element { name: "Li", atomic_mass: 6.94 },
    Element { name: "Be", atomic_mass: 9.0122 },
    Element { name: "B", atomic_mass: 10.81 },
    Element { name: "C", atomic_mass: 12.011 },
    Element { name: "N", atomic_mass: 14.007 },
    Element { name: "O", atomic_mass: 15.999 },
    Element { name: "F", atomic_mass: 18.998 },
    Element { name: "Ne", atomic_mass: 20.18 },
    Element { name: "Na", atomic_mass: 22.99 },
    Element { name: "Mg", atomic_mass: 24.305 },
    Element { name: "Al", atomic_mass: 26.98 },
    Element { name: "Si", atomic_mass: 28.085 },
    Element { name: "P", atomic_mass: 30.974 },
    Element { name: "S", atomic_mass: 32.065 },
    Element { name: "Cl", atomic_mass: 35.45 },
    Element { name: "Ar", atomic_mass: 39.948 },
    Element { name: "K", atomic_mass: 39.102 },
    Element { name: "Ca", atomic_mass: 40.08 },
    Element { name: "Sc", atomic_mass: 44.9559 },
    Element { name: "Ti", atomic_mass: 47.867 },
    Element { name: "V", atomic_mass: 50.9415 },
    Element { name: "Cr", atomic_mass: 51.9961 },
    Element { name: "Mn", atomic_mass: 54.938 },
    Element { name: "Fe", atomic_mass: 55.845 },
    Element { name: "Co", atomic_mass: 58.933 },
    Element { name: "Ni", atomic_mass: 58.69 },
    Element { name: "Cu", atomic_mass: 63.546 },
    Element { name: "Zn", atomic_mass: 65.38 },
    Element { name: "Ga", atomic_mass: 69.723 },
    Element { name: "Ge", atomic_mass: 72.64 },
    Element { name: "As", atomic_mass: 74.9216 },
    Element { name: "Se", atomic_mass: 78.96 },
    Element { name: "Br", atomic_mass: 79.904 },
    Element { name: "Kr", atomic_mass: 83.798 },
    Element { name: "Rb", atomic_mass: 85.4678 },
    Element { name: "Sr", atomic_mass: 87.62 },
    Element { name: "Y", atomic_mass: 88.9059 },
    Element { name: "Zr", atomic_mass: 91.224 },
    Element { name: "Nb", atomic_mass: 92.9064 },
    Element { name: "Mo", atomic_mass: 95.94 },
    Element { name: "Tc", atomic_mass: 98.0 },
    Element { name: "Ru", atomic_mass: 101.07 },
    // Add more elements here...
];

// Chemical formulae may contain special names for chemical groups i.e. groups of atoms,
// e.g. Me (methyl) group, which is converted into {"C":1, "H":3},
// so we need to convert them into regular elements
pub fn handle_groups(
    mut counts: ElementCount,
    groups: Option<&HashMap<String, ElementCount>>,
) -> ElementCount {
    if let Some(groups) = groups {
        let mut to_remove = Vec::new();

        for (chemical_group, atomic_composition) in groups.iter() {
            // if a group is found in the counts we get rid of it and turn it into regular elements
            if let Some(&number_of_chemical_groups) = counts.get(chemical_group) {
                to_remove.push(chemical_group.clone());
                for (atom, &quantity) in atomic_composition.iter() {
                    *counts.entry(atom.clone()).or_insert(0) +=
                        quantity * number_of_chemical_groups;
                }
            }
        }

        for group in to_remove {
            counts.remove(&group);
        }
    }
    counts
}

// reads a run of digits starting at position i; absent digits mean 1
fn read_number(chars: &[char], i: usize) -> (usize, usize) {
    let mut end = i;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    if end == i {
        return (1, i);
    }
    let number: usize = chars[i..end].iter().collect::<String>().parse().unwrap_or(1);
    (number, end)
}

/// Parses a chemical formula and returns a map of elements and their counts.
/// Handles arbitrarily nested parenthesized groups with multipliers, e.g.
/// "Ca3(PO4)2" -> {"Ca": 3, "P": 2, "O": 8}.
///
/// The optional `groups` argument is needed if the formula contains special
/// names for chemical groups like Me, Ph, etc. In that case it should contain
/// the names of these groups and their atomic composition, e.g.
/// {"Me": {"C": 1, "H": 3}}.
pub fn parse_formula(
    formula: &str,
    config: ParserConfig,
    groups: Option<&HashMap<String, ElementCount>>,
) -> Result<ElementCount, MoleculeErrorKind> {
    let chars: Vec<char> = chars_of(formula);

    if !config.permissive {
        let allowed = Regex::new(r"^[A-Za-z0-9()]*$").unwrap();
        if !allowed.is_match(formula) {
            let bad = chars
                .iter()
                .copied()
                .find(|&c| !(c.is_ascii_alphanumeric() || c == '(' || c == ')'))
                .unwrap_or('?');
            return Err(MoleculeErrorKind::ForbiddenChar(bad));
        }
    }

    // stack of accumulators; the bottom one is the implicit outermost group
    let mut stack: Vec<ElementCount> = vec![HashMap::new()];
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '(' {
            // a nested group begins
            stack.push(HashMap::new());
            i += 1;
        } else if c == ')' {
            if stack.len() == 1 {
                return Err(MoleculeErrorKind::UnmatchedClosingParen);
            }
            let group = stack.pop().unwrap();
            i += 1;
            let (multiplier, next_i) = read_number(&chars, i);
            i = next_i;
            let top = stack.last_mut().unwrap();
            for (element, count) in group {
                let total = count * multiplier;
                if total > 0 {
                    *top.entry(element).or_insert(0) += total;
                }
            }
        } else if c.is_ascii_uppercase() {
            // one uppercase letter plus optional lowercase letters is an element symbol
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            let element: String = chars[start..i].iter().collect();
            let (count, next_i) = read_number(&chars, i);
            i = next_i;
            if count > 0 {
                *stack.last_mut().unwrap().entry(element).or_insert(0) += count;
            }
        } else {
            debug!("skipping character '{}' at position {} in '{}'", c, i, formula);
            i += 1;
        }
    }

    if stack.len() != 1 {
        return Err(MoleculeErrorKind::UnmatchedOpeningParen);
    }
    let counts = handle_groups(stack.pop().unwrap(), groups);
    if counts.is_empty() {
        return Err(MoleculeErrorKind::NoElements);
    }
    Ok(counts)
}

fn chars_of(formula: &str) -> Vec<char> {
    formula.chars().collect()
}

/// Element symbols of a molecule string in order of first appearance.
/// Used to keep the row order of the stoichiometric matrix deterministic.
pub fn element_order(formula: &str) -> Vec<String> {
    let chars = chars_of(formula);
    let mut order: Vec<String> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_uppercase() {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            let symbol: String = chars[start..i].iter().collect();
            if !order.contains(&symbol) {
                order.push(symbol);
            }
        } else {
            i += 1;
        }
    }
    order
}

/// Molar mass in g/mol of an already parsed composition.
/// Elements missing from the built-in table contribute nothing (with a warning).
pub fn molar_mass(counts: &ElementCount) -> f64 {
    let mut mass = 0.0;
    for (element, count) in counts {
        match ELEMENTS.iter().find(|e| e.name == element) {
            Some(e) => mass += e.atomic_mass * *count as f64,
            None => warn!("no atomic mass for element '{}', skipping it", element),
        }
    }
    mass
}

/// Calculates the molar mass of a substance given its chemical formula,
/// returning the mass together with the parsed composition
pub fn calculate_molar_mass(
    formula: &str,
    config: ParserConfig,
    groups: Option<&HashMap<String, ElementCount>>,
) -> Result<(f64, ElementCount), MoleculeErrorKind> {
    let counts = parse_formula(formula, config, groups)?;
    let mass = molar_mass(&counts);
    Ok((mass, counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(formula: &str) -> Result<ElementCount, MoleculeErrorKind> {
        parse_formula(formula, ParserConfig::strict(), None)
    }

    #[test]
    fn test_parse_formula() {
        let expected_counts = HashMap::from([
            ("C".to_string(), 6),
            ("H".to_string(), 8),
            ("O".to_string(), 6),
        ]);
        assert_eq!(strict("C6H8O6").unwrap(), expected_counts);

        let expected_counts = HashMap::from([
            ("Na".to_string(), 1),
            ("N".to_string(), 2),
            ("O".to_string(), 6),
        ]);
        assert_eq!(strict("Na(NO3)2").unwrap(), expected_counts);

        let expected_counts = HashMap::from([("H".to_string(), 2), ("O".to_string(), 1)]);
        assert_eq!(strict("H2O").unwrap(), expected_counts);

        let expected_counts = HashMap::from([
            ("C".to_string(), 5),
            ("H".to_string(), 7),
            ("O".to_string(), 2),
        ]);
        assert_eq!(strict("C5H6OOH").unwrap(), expected_counts);
    }

    #[test]
    fn test_nested_groups() {
        let expected_counts = HashMap::from([
            ("Ca".to_string(), 3),
            ("P".to_string(), 2),
            ("O".to_string(), 8),
        ]);
        assert_eq!(strict("Ca3(PO4)2").unwrap(), expected_counts);

        // two levels of nesting
        let expected_counts = HashMap::from([
            ("C".to_string(), 4),
            ("H".to_string(), 12),
            ("O".to_string(), 2),
        ]);
        assert_eq!(strict("((CH3)2O)2").unwrap(), expected_counts);
    }

    #[test]
    fn test_parser_is_idempotent() {
        let first = strict("Ca(OH)2").unwrap();
        let second = strict("Ca(OH)2").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unmatched_parentheses() {
        assert_eq!(
            strict("Ca(OH2"),
            Err(MoleculeErrorKind::UnmatchedOpeningParen)
        );
        assert_eq!(
            strict("CaOH)2"),
            Err(MoleculeErrorKind::UnmatchedClosingParen)
        );
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert_eq!(strict(""), Err(MoleculeErrorKind::NoElements));
        assert_eq!(
            parse_formula("123", ParserConfig::permissive(), None),
            Err(MoleculeErrorKind::NoElements)
        );
    }

    #[test]
    fn test_strict_vs_permissive() {
        assert_eq!(strict("H2O!"), Err(MoleculeErrorKind::ForbiddenChar('!')));

        // the permissive parser skips what it does not recognize
        let expected_counts = HashMap::from([("H".to_string(), 2), ("O".to_string(), 1)]);
        assert_eq!(
            parse_formula("H2O!", ParserConfig::permissive(), None).unwrap(),
            expected_counts
        );
        assert_eq!(
            parse_formula("H2*O", ParserConfig::permissive(), None).unwrap(),
            expected_counts
        );
    }

    #[test]
    fn test_with_groups() {
        let toluol = "C6H5Me";
        let expected_counts =
            HashMap::from([("H".to_string(), 8), ("C".to_string(), 7)]);
        let groups = HashMap::from([(
            "Me".to_string(),
            HashMap::from([("C".to_string(), 1), ("H".to_string(), 3)]),
        )]);
        assert_eq!(
            parse_formula(toluol, ParserConfig::strict(), Some(&groups)).unwrap(),
            expected_counts
        );

        let xylole = "C6H4(Me)2";
        let expected_counts =
            HashMap::from([("H".to_string(), 10), ("C".to_string(), 8)]);
        assert_eq!(
            parse_formula(xylole, ParserConfig::strict(), Some(&groups)).unwrap(),
            expected_counts
        );
    }

    #[test]
    fn test_element_order() {
        assert_eq!(
            element_order("Ca(OH)2"),
            vec!["Ca".to_string(), "O".to_string(), "H".to_string()]
        );
        // repeated symbols are reported once
        assert_eq!(
            element_order("C5H6OOH"),
            vec!["C".to_string(), "H".to_string(), "O".to_string()]
        );
    }

    #[test]
    fn test_calculate_molar_mass() {
        let (molar_mass, _) =
            calculate_molar_mass("H2O", ParserConfig::strict(), None).unwrap();
        assert!((molar_mass - 18.01528).abs() < 1e-2);

        let (molar_mass, _) =
            calculate_molar_mass("NaCl", ParserConfig::strict(), None).unwrap();
        assert!((molar_mass - 58.44).abs() < 1e-2);

        let (molar_mass, _) =
            calculate_molar_mass("Ca(NO3)2", ParserConfig::strict(), None).unwrap();
        assert!((molar_mass - 164.093).abs() < 1e-2);
    }
}
