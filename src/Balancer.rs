/// Module to parse a chemical formula into its atomic composition.
/// Handles nested parenthesized groups with multipliers, optional chemical
/// group names (Me, Ph, etc.) and molar mass calculation.
///
///  # Examples
/// ```
/// use ChemEq::Balancer::formula_parser::{parse_formula, ParserConfig};
/// let atomic_composition = parse_formula("Ca3(PO4)2", ParserConfig::strict(), None).unwrap();
/// println!("{:?}", atomic_composition);
/// use ChemEq::Balancer::formula_parser::calculate_molar_mass;
/// let (molar_mass, element_composition) =
///     calculate_molar_mass("C6H8O6", ParserConfig::strict(), None).unwrap();
/// println!("Element counts: {:?}", element_composition);
/// println!("Molar mass: {:?} g/mol", molar_mass);
/// ```
pub mod formula_parser;

/// The module takes the parsed molecules of both sides of an equation and
/// produces the conservation-of-mass matrix: one row per distinct element
/// (first-seen order, so identical input gives an identical matrix), one
/// column per molecule, reactant entries positive and product entries
/// negative. A coefficient vector x balances the equation exactly when
/// matrix * x = 0.
pub mod stoich_matrix;

/// Exact rational solver for the conservation system. Gauss-Jordan
/// elimination over BigRational fractions (never floating point), an
/// explicit rank check for the single degree of freedom, LCD scaling to the
/// smallest positive integer vector.
pub mod solver;

/// Balancing pipeline and the public entry points of the crate
///
///  # Examples
/// ```
/// use ChemEq::Balancer::equation::balance_equation;
/// let result = balance_equation("Ca(OH)2+H3PO4=Ca3(PO4)2+H2O").unwrap();
/// assert_eq!(result.coefficients, vec![3, 2, 1, 6]);
/// println!("{}", result.balanced);
/// ```
pub mod equation;
