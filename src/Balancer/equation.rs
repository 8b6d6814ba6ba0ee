use super::formula_parser::{ElementCount, MoleculeErrorKind, ParserConfig, parse_formula};
use super::solver::{SolverErrorKind, solve};
use super::stoich_matrix::{StoichMatrix, ordered_element_union};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::iter::zip;
use thiserror::Error;

/// Errors produced while balancing an equation. Every error is terminal for
/// the request that produced it: the input is malformed or unsolvable, not
/// transient, so there is nothing to retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BalanceError {
    #[error("equation must contain exactly one '='")]
    MissingEquals,
    #[error("the {0} side of the equation is empty")]
    EmptySide(&'static str),
    #[error("empty molecule token on the {0} side")]
    EmptyMolecule(&'static str),
    #[error("molecule '{molecule}': {reason}")]
    MoleculeSyntax {
        molecule: String,
        reason: MoleculeErrorKind,
    },
    #[error("could not balance the equation: {0}")]
    Solver(#[from] SolverErrorKind),
}

impl BalanceError {
    /// Machine-readable code for the HTTP layer: ERR01 is malformed equation
    /// syntax, ERR02 a solving failure, ERR03 invalid molecule syntax
    pub fn code(&self) -> &'static str {
        match self {
            BalanceError::MissingEquals
            | BalanceError::EmptySide(_)
            | BalanceError::EmptyMolecule(_) => "ERR01",
            BalanceError::Solver(_) => "ERR02",
            BalanceError::MoleculeSyntax { .. } => "ERR03",
        }
    }
}

/// Final answer for one equation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancedResult {
    /// the equation as the user entered it (trimmed)
    pub equation: String,
    /// one positive integer per molecule, reactants first, input order
    pub coefficients: Vec<i64>,
    /// the reconstructed equation; coefficient 1 is omitted as in
    /// conventional chemical notation
    pub balanced: String,
}

/// The struct EquationBalancer collects everything needed to balance one
/// chemical equation: the molecule tokens of both sides, their parsed atomic
/// compositions, the conservation matrix and finally the solved coefficients.
/// The stages can be run one by one (parse_molecules -> build_matrix ->
/// solve_coefficients) or all at once with balance(). Every instance is
/// created fresh per equation, nothing is shared between calls.
#[derive(Debug, Clone)]
pub struct EquationBalancer {
    pub equation: String,
    pub reactants: Vec<String>,
    pub products: Vec<String>,
    pub config: ParserConfig,
    pub groups: Option<HashMap<String, ElementCount>>,
    pub reactant_compositions: Vec<ElementCount>,
    pub product_compositions: Vec<ElementCount>,
    pub stoich: Option<StoichMatrix>,
    pub coefficients: Option<Vec<i64>>,
}

impl EquationBalancer {
    /// Splits the input of the form "A+B=C+D" into reactant and product
    /// tokens. Both sides are trimmed; a missing '=' sign, an empty side or
    /// an empty token between '+' signs is rejected here.
    pub fn new(equation: &str) -> Result<Self, BalanceError> {
        let trimmed = equation.trim();
        let sides: Vec<&str> = trimmed.split('=').collect();
        if sides.len() != 2 {
            return Err(BalanceError::MissingEquals);
        }
        let reactants = split_side(sides[0], "reactant")?;
        let products = split_side(sides[1], "product")?;
        Ok(EquationBalancer {
            equation: trimmed.to_string(),
            reactants,
            products,
            config: ParserConfig::default(),
            groups: None,
            reactant_compositions: Vec::new(),
            product_compositions: Vec::new(),
            stoich: None,
            coefficients: None,
        })
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_groups(mut self, groups: HashMap<String, ElementCount>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// parse every molecule on both sides into element counts
    pub fn parse_molecules(&mut self) -> Result<(), BalanceError> {
        self.reactant_compositions =
            parse_side(&self.reactants, self.config, self.groups.as_ref())?;
        self.product_compositions =
            parse_side(&self.products, self.config, self.groups.as_ref())?;
        Ok(())
    }

    /// build the signed conservation matrix from the parsed compositions
    pub fn build_matrix(&mut self) {
        let tokens: Vec<String> = self
            .reactants
            .iter()
            .chain(self.products.iter())
            .cloned()
            .collect();
        let all: Vec<ElementCount> = self
            .reactant_compositions
            .iter()
            .chain(self.product_compositions.iter())
            .cloned()
            .collect();
        let elements = ordered_element_union(&tokens, &all);
        self.stoich = Some(StoichMatrix::build(
            &self.reactant_compositions,
            &self.product_compositions,
            elements,
        ));
    }

    /// run the exact rational solver on the conservation matrix
    pub fn solve_coefficients(&mut self) -> Result<Vec<i64>, BalanceError> {
        if self.stoich.is_none() {
            self.build_matrix();
        }
        let stoich = self.stoich.as_ref().unwrap();
        let coefficients = solve(stoich)?;
        self.coefficients = Some(coefficients.clone());
        Ok(coefficients)
    }

    /// the balanced equation as a string, None until solved
    pub fn balanced_string(&self) -> Option<String> {
        let coefficients = self.coefficients.as_ref()?;
        let (reactant_coeffs, product_coeffs) = coefficients.split_at(self.reactants.len());
        Some(format!(
            "{}={}",
            render_side(&self.reactants, reactant_coeffs),
            render_side(&self.products, product_coeffs)
        ))
    }

    /// full pipeline: parse, build the matrix, solve, render
    pub fn balance(&mut self) -> Result<BalancedResult, BalanceError> {
        info!("balancing equation '{}'", self.equation);
        self.parse_molecules()?;
        self.build_matrix();
        let coefficients = self.solve_coefficients()?;
        let balanced = self.balanced_string().unwrap();
        info!("balanced: {}", balanced);
        Ok(BalancedResult {
            equation: self.equation.clone(),
            coefficients,
            balanced,
        })
    }
}

fn split_side(side: &str, side_name: &'static str) -> Result<Vec<String>, BalanceError> {
    let side = side.trim();
    if side.is_empty() {
        return Err(BalanceError::EmptySide(side_name));
    }
    let mut tokens = Vec::new();
    for token in side.split('+') {
        let token = token.trim();
        if token.is_empty() {
            return Err(BalanceError::EmptyMolecule(side_name));
        }
        tokens.push(token.to_string());
    }
    Ok(tokens)
}

fn parse_side(
    tokens: &[String],
    config: ParserConfig,
    groups: Option<&HashMap<String, ElementCount>>,
) -> Result<Vec<ElementCount>, BalanceError> {
    let mut compositions = Vec::with_capacity(tokens.len());
    for token in tokens {
        let counts =
            parse_formula(token, config, groups).map_err(|reason| BalanceError::MoleculeSyntax {
                molecule: token.clone(),
                reason,
            })?;
        compositions.push(counts);
    }
    Ok(compositions)
}

fn render_side(tokens: &[String], coefficients: &[i64]) -> String {
    zip(tokens, coefficients)
        .map(|(token, &c)| {
            if c == 1 {
                token.clone()
            } else {
                format!("{}{}", c, token)
            }
        })
        .collect::<Vec<String>>()
        .join("+")
}

/// Balances one equation; this is the single logical operation the
/// surrounding service calls
///
/// # Example
/// ```
/// use ChemEq::Balancer::equation::balance_equation;
///
/// let result = balance_equation("H2O2=H2O+O2").unwrap();
/// assert_eq!(result.coefficients, vec![2, 2, 1]);
/// assert_eq!(result.balanced, "2H2O2=2H2O+O2");
/// ```
pub fn balance_equation(equation: &str) -> Result<BalancedResult, BalanceError> {
    EquationBalancer::new(equation)?.balance()
}

/// Balances a batch of equations; every equation is independent, one failing
/// does not affect the others
pub fn balance_many(equations: &[String]) -> Vec<Result<BalancedResult, BalanceError>> {
    equations.iter().map(|eq| balance_equation(eq)).collect()
}

/// Success/failure envelope in the shape the HTTP route serializes
pub fn balance_to_json(equation: &str) -> Value {
    match balance_equation(equation) {
        Ok(result) => json!({
            "ok": true,
            "equation": result.equation,
            "coefficients": result.coefficients,
            "balanced": result.balanced,
        }),
        Err(e) => json!({
            "ok": false,
            "code": e.code(),
            "message": e.to_string(),
        }),
    }
}
