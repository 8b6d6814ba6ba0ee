use crate::Balancer::equation::{EquationBalancer, balance_equation, balance_many};
use crate::Balancer::formula_parser::{ParserConfig, calculate_molar_mass};
use crate::Examples::balancer_examples::balancer_examples;
use crate::Utils::load_from_file::load_equations_from_file;
use std::io::{self, Write};

pub fn run_interactive_menu() {
    loop {
        show_main_menu();
        let choice = get_user_input();

        match choice.trim() {
            "1" => balance_menu(),
            "2" => batch_menu(),
            "3" => inspect_menu(),
            "4" => matrix_menu(),
            "5" => examples_menu(),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}

fn show_main_menu() {
    println!(
        "\x1b[34m\n Wellcome to ChemEq: chemical equation balancer \n
    enter an equation like Ca(OH)2+H3PO4=Ca3(PO4)2+H2O and get \n
    the minimal integer stoichiometric coefficients back \n \x1b[0m"
    );
    println!("\x1b[33m1. Balance an equation\x1b[0m");
    println!("\x1b[33m2. Balance a batch of equations from a file\x1b[0m");
    println!("\x1b[33m3. Inspect a molecule (composition and molar mass)\x1b[0m");
    println!("\x1b[33m4. Show the conservation matrix of an equation\x1b[0m");
    println!("\x1b[33m5. Examples\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    print!("\x1b[36mEnter your choice: \x1b[0m");
    io::stdout().flush().unwrap();
}

fn get_user_input() -> String {
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .expect("Failed to read input");
    input
}

fn balance_menu() {
    print!("\x1b[36mEnter the equation: \x1b[0m");
    io::stdout().flush().unwrap();
    let input = get_user_input();
    match balance_equation(input.trim()) {
        Ok(result) => {
            println!("\x1b[32m{}\x1b[0m", result.balanced);
            println!("coefficients: {:?}", result.coefficients);
        }
        Err(e) => println!("\x1b[31m[{}] {}\x1b[0m", e.code(), e),
    }
}

fn batch_menu() {
    print!("\x1b[36mEnter the file name (one equation per line): \x1b[0m");
    io::stdout().flush().unwrap();
    let input = get_user_input();
    let equations = match load_equations_from_file(input.trim()) {
        Ok(equations) => equations,
        Err(e) => {
            println!("\x1b[31m{}\x1b[0m", e);
            return;
        }
    };
    for (equation, result) in equations.iter().zip(balance_many(&equations)) {
        match result {
            Ok(result) => println!("\x1b[32m{}\x1b[0m", result.balanced),
            Err(e) => println!("\x1b[31m{}  ->  [{}] {}\x1b[0m", equation, e.code(), e),
        }
    }
}

fn inspect_menu() {
    print!("\x1b[36mEnter the molecule formula: \x1b[0m");
    io::stdout().flush().unwrap();
    let input = get_user_input();
    match calculate_molar_mass(input.trim(), ParserConfig::strict(), None) {
        Ok((molar_mass, composition)) => {
            println!("Element counts: {:?}", composition);
            println!("Molar mass: {:.3} g/mol", molar_mass);
        }
        Err(e) => println!("\x1b[31m{}\x1b[0m", e),
    }
}

fn matrix_menu() {
    print!("\x1b[36mEnter the equation: \x1b[0m");
    io::stdout().flush().unwrap();
    let input = get_user_input();
    let balancer = EquationBalancer::new(input.trim()).and_then(|mut balancer| {
        balancer.parse_molecules()?;
        balancer.build_matrix();
        Ok(balancer)
    });
    match balancer {
        Ok(balancer) => {
            let molecules: Vec<String> = balancer
                .reactants
                .iter()
                .chain(balancer.products.iter())
                .cloned()
                .collect();
            if let Some(stoich) = &balancer.stoich {
                stoich.pretty_print(&molecules);
            }
        }
        Err(e) => println!("\x1b[31m[{}] {}\x1b[0m", e.code(), e),
    }
}

fn examples_menu() {
    print!("\x1b[36mEnter the example number (0..=3): \x1b[0m");
    io::stdout().flush().unwrap();
    let input = get_user_input();
    let task: usize = input.trim().parse().unwrap_or(0);
    balancer_examples(task);
}
