use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Error};
use clap::{App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info, Level, LevelFilter, Record};

use dpll::{Rules, Solver, SolverConfig, Status};
use dpll_dimacs::DimacsParser;

fn main() {
    std::process::exit(main_with_err());
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(env_var) = std::env::var("DPLL_LOG") {
        builder.parse_filters(&env_var);
    }

    builder.init();
}

fn banner() {
    info!("This is dpll {}", env!("DPLL_VERSION"));
    info!(
        "  {} build - {}",
        env!("DPLL_PROFILE"),
        env!("DPLL_RUSTC_VERSION")
    );
}

fn main_with_err() -> i32 {
    let matches = App::new("dpll")
        .version(env!("DPLL_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg(
            Arg::from_usage("<INPUT>... 'DIMACS CNF files to solve'")
                .help("One or more DIMACS CNF files to solve"),
        )
        .arg_from_usage(
            "--remove-trivial 'Drop tautological clauses before the search starts'",
        )
        .arg_from_usage("--remove-pure 'Propagate pure literals at every node'")
        .arg_from_usage(
            "--recursive 'Use the recursive driver instead of the iterative one'",
        )
        .get_matches();

    init_logging();
    banner();

    let mut rules = Rules::REMOVE_SINGULAR;
    if matches.is_present("remove-trivial") {
        rules |= Rules::REMOVE_TRIVIAL;
    }
    if matches.is_present("remove-pure") {
        rules |= Rules::REMOVE_PURE;
    }
    if matches.is_present("recursive") {
        rules |= Rules::RECURSIVE_SOLVING;
    }

    let config = SolverConfig {
        rules,
        complexity_limit: None,
    };

    let mut had_failure = false;

    for path in matches.values_of("INPUT").unwrap() {
        match solve_file(path, config) {
            Ok(status) => print_status(status),
            Err(err) => {
                error!("failed to load '{}': {}", path, err);
                had_failure = true;
            }
        }
    }

    if had_failure {
        1
    } else {
        0
    }
}

fn solve_file(path: &str, config: SolverConfig) -> Result<Status, Error> {
    info!("Reading file '{}'", path);
    let file = fs::File::open(path).with_context(|| format!("could not open '{}'", path))?;
    let formula = DimacsParser::parse(io::BufReader::new(file))
        .with_context(|| format!("could not parse '{}'", path))?;

    let mut solver = Solver::new(config);
    let status = solver.solve(&formula);
    info!("complexity: {}", solver.complexity());
    Ok(status)
}

fn print_status(status: Status) {
    match status {
        Status::Sat => println!("SAT"),
        Status::Unsat => println!("UNSAT"),
        // Legacy misspelling preserved for output compatibility.
        Status::Unknown => println!("UNKOWN"),
    }
}
