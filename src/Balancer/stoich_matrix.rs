use super::formula_parser::{ElementCount, element_order};
use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use std::iter::zip;

/// Conservation-of-mass linear system for one equation.
/// Rows are distinct elements in first-seen order (reactants before products,
/// left to right), columns are molecules (reactants first). Reactant entries
/// are positive, product entries negative, so a coefficient vector x balances
/// the equation exactly when matrix * x = 0.
#[derive(Debug, Clone, PartialEq)]
pub struct StoichMatrix {
    pub elements: Vec<String>,
    pub matrix: DMatrix<i64>,
    pub n_reactants: usize,
}

/// Union of all element symbols across the molecules, in first-seen order.
/// `tokens` are the molecule strings and `compositions` their parsed counts,
/// in the same order (reactants before products). The symbol order within a
/// molecule comes from the token itself; atoms introduced only by group
/// substitution never appear verbatim in a token, those are appended in
/// alphabetical order.
pub fn ordered_element_union(tokens: &[String], compositions: &[ElementCount]) -> Vec<String> {
    let mut elements: Vec<String> = Vec::new();
    for (token, counts) in zip(tokens, compositions) {
        for symbol in element_order(token) {
            if counts.contains_key(&symbol) && !elements.contains(&symbol) {
                elements.push(symbol);
            }
        }
        let mut leftover: Vec<String> = counts
            .keys()
            .filter(|k| !elements.contains(*k))
            .cloned()
            .collect();
        leftover.sort();
        elements.extend(leftover);
    }
    elements
}

impl StoichMatrix {
    /// Builds the signed conservation matrix from the parsed molecules of both
    /// sides. `elements` fixes the row order; any well-formed set of
    /// compositions produces a matrix, rank deficiency is detected by the solver.
    pub fn build(
        reactants: &[ElementCount],
        products: &[ElementCount],
        elements: Vec<String>,
    ) -> StoichMatrix {
        let n_reactants = reactants.len();
        let n_cols = reactants.len() + products.len();
        let mut matrix = DMatrix::<i64>::zeros(elements.len(), n_cols);
        for (j, counts) in reactants.iter().chain(products.iter()).enumerate() {
            let sign: i64 = if j < n_reactants { 1 } else { -1 };
            for (i, element) in elements.iter().enumerate() {
                if let Some(&count) = counts.get(element) {
                    matrix[(i, j)] = sign * count as i64;
                }
            }
        }
        StoichMatrix {
            elements,
            matrix,
            n_reactants,
        }
    }

    /// Prints the matrix as a table with element rows and molecule columns
    pub fn pretty_print(&self, molecules: &[String]) {
        let mut table = Table::new();

        let mut header: Vec<Cell> = vec![Cell::new("element")];
        header.extend(molecules.iter().map(|m| Cell::new(m)));
        table.add_row(Row::new(header));

        for (i, element) in self.elements.iter().enumerate() {
            let mut row: Vec<Cell> = vec![Cell::new(element)];
            for j in 0..self.matrix.ncols() {
                row.push(Cell::new(&self.matrix[(i, j)].to_string()));
            }
            table.add_row(Row::new(row));
        }

        table.printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Balancer::formula_parser::{ParserConfig, parse_formula};

    fn compositions(tokens: &[&str]) -> Vec<ElementCount> {
        tokens
            .iter()
            .map(|t| parse_formula(t, ParserConfig::strict(), None).unwrap())
            .collect()
    }

    #[test]
    fn test_matrix_shape_and_signs() {
        // H2O2 = H2O + O2
        let reactants = compositions(&["H2O2"]);
        let products = compositions(&["H2O", "O2"]);
        let tokens: Vec<String> = ["H2O2", "H2O", "O2"].iter().map(|s| s.to_string()).collect();
        let all: Vec<ElementCount> = reactants.iter().chain(products.iter()).cloned().collect();
        let elements = ordered_element_union(&tokens, &all);
        assert_eq!(elements, vec!["H".to_string(), "O".to_string()]);

        let stoich = StoichMatrix::build(&reactants, &products, elements);
        assert_eq!(stoich.n_reactants, 1);
        assert_eq!(stoich.matrix.nrows(), 2);
        assert_eq!(stoich.matrix.ncols(), 3);
        // H row
        assert_eq!(stoich.matrix[(0, 0)], 2);
        assert_eq!(stoich.matrix[(0, 1)], -2);
        assert_eq!(stoich.matrix[(0, 2)], 0);
        // O row
        assert_eq!(stoich.matrix[(1, 0)], 2);
        assert_eq!(stoich.matrix[(1, 1)], -1);
        assert_eq!(stoich.matrix[(1, 2)], -2);
    }

    #[test]
    fn test_element_row_order_is_first_seen() {
        let reactants = compositions(&["Ca(OH)2", "H3PO4"]);
        let products = compositions(&["Ca3(PO4)2", "H2O"]);
        let tokens: Vec<String> = ["Ca(OH)2", "H3PO4", "Ca3(PO4)2", "H2O"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let all: Vec<ElementCount> = reactants.iter().chain(products.iter()).cloned().collect();
        let elements = ordered_element_union(&tokens, &all);
        assert_eq!(
            elements,
            vec![
                "Ca".to_string(),
                "O".to_string(),
                "H".to_string(),
                "P".to_string()
            ]
        );

        // identical input gives an identical matrix
        let first = StoichMatrix::build(&reactants, &products, elements.clone());
        let second = StoichMatrix::build(&reactants, &products, elements);
        assert_eq!(first, second);
    }
}
