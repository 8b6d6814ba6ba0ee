use super::stoich_matrix::StoichMatrix;
use log::{debug, info};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use thiserror::Error;

/// Errors that can occur during solving the conservation system
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SolverErrorKind {
    /// the system only has the trivial all-zero solution
    #[error("the conservation system has no nontrivial solution")]
    SingularSystem,
    /// more than one free variable, e.g. two independent reactions written as one
    #[error("the equation has more than one degree of freedom")]
    MultipleDegreesOfFreedom,
    /// the integer coefficients do not fit into i64
    #[error("stoichiometric coefficients are too large")]
    CoefficientOverflow,
    /// no strictly positive coefficient vector balances the equation
    #[error("no positive set of coefficients balances the equation")]
    Unbalanceable,
}

/// Solves matrix * x = 0 for the smallest strictly positive integer vector x.
///
/// All arithmetic is exact rational: floating point would silently corrupt
/// coefficients on larger molecules through rounding. The matrix is copied
/// into BigRational entries, reduced by Gauss-Jordan elimination, the single
/// free variable is fixed to 1 and the resulting fractions are scaled by the
/// least common denominator into integers.
pub fn solve(stoich: &StoichMatrix) -> Result<Vec<i64>, SolverErrorKind> {
    let m = stoich.matrix.nrows();
    let n = stoich.matrix.ncols();

    // exact copy of the integer matrix, every v becomes v/1
    let mut a: Vec<Vec<BigRational>> = (0..m)
        .map(|i| {
            (0..n)
                .map(|j| BigRational::from_integer(BigInt::from(stoich.matrix[(i, j)])))
                .collect()
        })
        .collect();

    // forward elimination; the pivot row is normalized so the pivot entry is
    // exactly 1 and the pivot column is cleared from every other row. Any
    // nonzero pivot will do since there is no rounding to worry about.
    let mut pivot_cols: Vec<usize> = Vec::new();
    let mut row = 0;
    for col in 0..n {
        if row >= m {
            break;
        }
        let pivot = match (row..m).find(|&r| !a[r][col].is_zero()) {
            Some(r) => r,
            // no pivot in this column, it stays a free variable
            None => continue,
        };
        a.swap(row, pivot);
        let p = a[row][col].clone();
        for j in col..n {
            a[row][j] = &a[row][j] / &p;
        }
        for r in 0..m {
            if r != row && !a[r][col].is_zero() {
                let f = a[r][col].clone();
                for j in col..n {
                    let sub = &f * &a[row][j];
                    a[r][j] -= sub;
                }
            }
        }
        pivot_cols.push(col);
        row += 1;
    }

    // a balanceable equation has exactly one degree of freedom
    let rank = pivot_cols.len();
    if rank == n {
        debug!("conservation matrix has full column rank, only the trivial solution exists");
        return Err(SolverErrorKind::SingularSystem);
    }
    if n - rank > 1 {
        debug!(
            "conservation matrix has {} free variables, refusing to guess",
            n - rank
        );
        return Err(SolverErrorKind::MultipleDegreesOfFreedom);
    }

    // with rank == n - 1 the single free column is the one without a pivot;
    // for a chemical equation this is the last column
    let free_col = match (0..n).find(|c| !pivot_cols.contains(c)) {
        Some(c) => c,
        None => return Err(SolverErrorKind::SingularSystem),
    };

    // fix the free variable to 1 and back-substitute from the last pivot row up
    let mut coeffs: Vec<BigRational> = vec![BigRational::zero(); n];
    coeffs[free_col] = BigRational::one();
    for r in (0..rank).rev() {
        let pivot_col = pivot_cols[r];
        let mut acc = BigRational::zero();
        for j in (pivot_col + 1)..n {
            if !a[r][j].is_zero() {
                acc += &a[r][j] * &coeffs[j];
            }
        }
        coeffs[pivot_col] = -acc;
    }

    // clear all denominators at once with their least common multiple
    let mut lcd = BigInt::one();
    for c in coeffs.iter() {
        lcd = lcd.lcm(c.denom());
    }
    let lcd = BigRational::from_integer(lcd);
    let mut ints: Vec<BigInt> = coeffs.iter().map(|c| (c * &lcd).to_integer()).collect();

    // the LCD scaling must not leave a common factor behind
    let mut g = BigInt::zero();
    for v in ints.iter() {
        g = g.gcd(v);
    }
    if !g.is_zero() && !g.is_one() {
        for v in ints.iter_mut() {
            *v = &*v / &g;
        }
    }

    if ints.iter().any(|v| v.is_zero()) {
        return Err(SolverErrorKind::Unbalanceable);
    }
    if ints.iter().any(|v| v.is_negative()) {
        // known heuristic: the null-space basis may come out with flipped
        // signs. Take the magnitudes, but keep the result only if every
        // element is still conserved exactly; otherwise the equation truly
        // needs negative coefficients and cannot be balanced.
        info!("negative coefficients in the null-space vector, trying sign-flip recovery");
        for v in ints.iter_mut() {
            *v = v.abs();
        }
        if !verify_conservation_big(stoich, &ints) {
            return Err(SolverErrorKind::Unbalanceable);
        }
    }

    let mut out = Vec::with_capacity(n);
    for v in ints.iter() {
        match v.to_i64() {
            Some(x) => out.push(x),
            None => return Err(SolverErrorKind::CoefficientOverflow),
        }
    }
    Ok(out)
}

/// Checks that matrix * coefficients = 0, i.e. every element is conserved
pub fn verify_conservation(stoich: &StoichMatrix, coefficients: &[i64]) -> bool {
    let big: Vec<BigInt> = coefficients.iter().map(|&c| BigInt::from(c)).collect();
    verify_conservation_big(stoich, &big)
}

fn verify_conservation_big(stoich: &StoichMatrix, coefficients: &[BigInt]) -> bool {
    if coefficients.len() != stoich.matrix.ncols() {
        return false;
    }
    for i in 0..stoich.matrix.nrows() {
        let mut acc = BigInt::zero();
        for j in 0..stoich.matrix.ncols() {
            acc += BigInt::from(stoich.matrix[(i, j)]) * &coefficients[j];
        }
        if !acc.is_zero() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Balancer::formula_parser::{ElementCount, ParserConfig, parse_formula};
    use crate::Balancer::stoich_matrix::StoichMatrix;
    use crate::Balancer::stoich_matrix::ordered_element_union;
    use num_integer::Integer;

    fn matrix_for(reactants: &[&str], products: &[&str]) -> StoichMatrix {
        let parse = |tokens: &[&str]| -> Vec<ElementCount> {
            tokens
                .iter()
                .map(|t| parse_formula(t, ParserConfig::strict(), None).unwrap())
                .collect()
        };
        let r = parse(reactants);
        let p = parse(products);
        let tokens: Vec<String> = reactants
            .iter()
            .chain(products.iter())
            .map(|s| s.to_string())
            .collect();
        let all: Vec<ElementCount> = r.iter().chain(p.iter()).cloned().collect();
        let elements = ordered_element_union(&tokens, &all);
        StoichMatrix::build(&r, &p, elements)
    }

    #[test]
    fn test_simple_decomposition() {
        // 2H2O2 = 2H2O + O2
        let stoich = matrix_for(&["H2O2"], &["H2O", "O2"]);
        let coefficients = solve(&stoich).unwrap();
        assert_eq!(coefficients, vec![2, 2, 1]);
        assert!(verify_conservation(&stoich, &coefficients));
    }

    #[test]
    fn test_phosphate_neutralization() {
        // 3Ca(OH)2 + 2H3PO4 = Ca3(PO4)2 + 6H2O
        let stoich = matrix_for(&["Ca(OH)2", "H3PO4"], &["Ca3(PO4)2", "H2O"]);
        let coefficients = solve(&stoich).unwrap();
        assert_eq!(coefficients, vec![3, 2, 1, 6]);
        assert!(verify_conservation(&stoich, &coefficients));
    }

    #[test]
    fn test_combustion() {
        // 2C2H6 + 7O2 = 4CO2 + 6H2O
        let stoich = matrix_for(&["C2H6", "O2"], &["CO2", "H2O"]);
        let coefficients = solve(&stoich).unwrap();
        assert_eq!(coefficients, vec![2, 7, 4, 6]);
        assert!(verify_conservation(&stoich, &coefficients));
    }

    #[test]
    fn test_minimality_and_positivity() {
        let cases: [(&[&str], &[&str]); 4] = [
            (&["H2", "O2"], &["H2O"]),
            (&["Fe", "O2"], &["Fe2O3"]),
            (&["KMnO4", "HCl"], &["KCl", "MnCl2", "H2O", "Cl2"]),
            (&["C2H6", "O2"], &["CO2", "H2O"]),
        ];
        for (reactants, products) in cases {
            let stoich = matrix_for(reactants, products);
            let coefficients = solve(&stoich).unwrap();
            assert!(coefficients.iter().all(|&c| c >= 1));
            let gcd = coefficients.iter().fold(0i64, |acc, &c| acc.gcd(&c));
            assert_eq!(gcd, 1);
            assert!(verify_conservation(&stoich, &coefficients));
        }
    }

    #[test]
    fn test_two_degrees_of_freedom_is_rejected() {
        // C + O2 = CO + CO2 mixes two independent oxidation reactions;
        // the null space is two-dimensional and the solver must refuse to
        // guess instead of blindly fixing the last column
        let stoich = matrix_for(&["C", "O2"], &["CO", "CO2"]);
        assert_eq!(
            solve(&stoich),
            Err(SolverErrorKind::MultipleDegreesOfFreedom)
        );
    }

    #[test]
    fn test_trivial_only_solution_is_rejected() {
        let stoich = matrix_for(&["H2O"], &["NaCl"]);
        assert_eq!(solve(&stoich), Err(SolverErrorKind::SingularSystem));
    }

    #[test]
    fn test_sign_flip_recovery_never_returns_wrong_vector() {
        // O2 + H2O = H2 solves only with a negative O2 coefficient; taking
        // magnitudes would break oxygen conservation, so the solver must fail
        let stoich = matrix_for(&["O2", "H2O"], &["H2"]);
        assert_eq!(solve(&stoich), Err(SolverErrorKind::Unbalanceable));
    }

    #[test]
    fn test_verify_conservation_rejects_wrong_vector() {
        let stoich = matrix_for(&["H2O2"], &["H2O", "O2"]);
        assert!(!verify_conservation(&stoich, &[1, 1, 1]));
        assert!(!verify_conservation(&stoich, &[2, 2]));
    }
}
