pub fn balancer_examples(task: usize) {
    //

    match task {
        0 => {
            // BALANCING CLASSIC TEXTBOOK EQUATIONS
            use crate::Balancer::equation::balance_equation;
            let equations = [
                "H2O2=H2O+O2",
                "Fe+O2=Fe2O3",
                "C2H6+O2=CO2+H2O",
                "Ca(OH)2+H3PO4=Ca3(PO4)2+H2O",
                "KMnO4+HCl=KCl+MnCl2+H2O+Cl2",
            ];
            for equation in equations {
                match balance_equation(equation) {
                    Ok(result) => println!("{}  ->  {}", equation, result.balanced),
                    Err(e) => println!("{}  ->  [{}] {}", equation, e.code(), e),
                }
            }
        }
        1 => {
            // ATOMIC COMPOSITION AND MOLAR MASSES
            use crate::Balancer::formula_parser::{
                ParserConfig, calculate_molar_mass, parse_formula,
            };
            let atomic_composition =
                parse_formula("Na(NO3)2", ParserConfig::strict(), None).unwrap();
            println!("{:?}", atomic_composition);

            let formulae = ["H2O", "NaCl", "C6H8O6", "Ca(NO3)2"];
            for formula in formulae {
                let (molar_mass, element_composition) =
                    calculate_molar_mass(formula, ParserConfig::strict(), None).unwrap();
                println!("Element counts: {:?}", element_composition);
                println!("Molar mass: {:?} g/mol", molar_mass);
            }
        }
        2 => {
            // CONSERVATION MATRIX PRETTY PRINT
            use crate::Balancer::equation::EquationBalancer;
            let mut balancer = EquationBalancer::new("Ca(OH)2+H3PO4=Ca3(PO4)2+H2O").unwrap();
            balancer.parse_molecules().unwrap();
            balancer.build_matrix();
            let molecules: Vec<String> = balancer
                .reactants
                .iter()
                .chain(balancer.products.iter())
                .cloned()
                .collect();
            balancer.stoich.as_ref().unwrap().pretty_print(&molecules);
            println!("element rows: {:?}", balancer.stoich.as_ref().unwrap().elements);
        }
        3 => {
            // JSON ENVELOPES AS THE HTTP ROUTE WOULD SEE THEM
            use crate::Balancer::equation::balance_to_json;
            println!("{}", balance_to_json("H2O2=H2O+O2"));
            println!("{}", balance_to_json("H2O2H2O+O2"));
            println!("{}", balance_to_json("C+O2=CO+CO2"));
        }
        _ => {
            println!("there is no example with number {}", task);
        }
    }
}
