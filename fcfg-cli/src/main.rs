//! Command-line interface for fcfg
//! This binary compiles feature grammars and runs them against sentences.
//!
//! Usage:
//!   fcfg check `<grammar>`                                  - Compile and report on a grammar
//!   fcfg parse `<grammar>` `<root>` `<sentence>...`         - Parse a sentence into a value
//!   fcfg suggest `<grammar>` `<root>` [`<prefix>`...]       - List possible next words
//!   fcfg enumerate `<grammar>` `<root>` [--depth N] [--limit N] - Show expansion trees
//!   fcfg random `<grammar>` `<root>` [--seed N]             - Generate a random sentence
//!
//! Open classes can be filled from the command line with `--class name=phrase,phrase`.
//! Settings come from `fcfg.toml` in the working directory, then `--config`, then flags.

mod output;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use fcfg_config::{ConfigError, FcfgConfig, Loader};
use fcfg_parser::{LoadError, MatchError, Parser};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = build_cli().get_matches();

    init_logging(matches.get_flag("verbose"));
    let config = load_config(&matches);

    match matches.subcommand() {
        Some(("check", sub)) => handle_check_command(sub, &config),
        Some(("parse", sub)) => handle_parse_command(sub, &config),
        Some(("suggest", sub)) => handle_suggest_command(sub, &config),
        Some(("enumerate", sub)) => handle_enumerate_command(sub, &config),
        Some(("random", sub)) => handle_random_command(sub, &config),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn build_cli() -> Command {
    let grammar = Arg::new("grammar")
        .help("Path to the grammar file")
        .required(true)
        .index(1);
    let root = Arg::new("root")
        .help("Rule to start from")
        .required(true)
        .index(2);

    Command::new("fcfg")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for compiling and running feature context-free grammars")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults")
                .global(true),
        )
        .arg(
            Arg::new("case-sensitive")
                .long("case-sensitive")
                .help("Match terminals exactly instead of case-insensitively")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .help("Maximum nesting of rule references")
                .value_parser(value_parser!(usize))
                .global(true),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format for parse results")
                .value_parser(output::AVAILABLE_FORMATS.to_vec())
                .global(true),
        )
        .arg(
            Arg::new("class")
                .long("class")
                .help("Fill an open class, e.g. --class person=rein,mister brown")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log matching progress to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("check")
                .about("Compile a grammar and report its rules and open classes")
                .arg(grammar.clone()),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a sentence and print its value")
                .arg(grammar.clone())
                .arg(root.clone())
                .arg(
                    Arg::new("sentence")
                        .help("Words of the sentence")
                        .required(true)
                        .num_args(1..)
                        .trailing_var_arg(true)
                        .index(3),
                ),
        )
        .subcommand(
            Command::new("suggest")
                .about("List the words that can follow a sentence prefix")
                .arg(grammar.clone())
                .arg(root.clone())
                .arg(
                    Arg::new("prefix")
                        .help("Words typed so far")
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .index(3),
                ),
        )
        .subcommand(
            Command::new("enumerate")
                .about("Show the expansion trees of a rule")
                .arg(grammar.clone())
                .arg(root.clone())
                .arg(
                    Arg::new("depth")
                        .long("depth")
                        .short('d')
                        .help("Nested rule expansions to show (default from config)")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .short('n')
                        .help("Stop after this many trees")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("random")
                .about("Generate a random sentence")
                .arg(grammar)
                .arg(root)
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for reproducible output")
                        .value_parser(value_parser!(u64)),
                ),
        )
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("FCFG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Project-local configuration picked up from the working directory when present
const LOCAL_CONFIG: &str = "fcfg.toml";

/// Layer `fcfg.toml`, the `--config` file and flag overrides over the embedded defaults
fn load_config(matches: &ArgMatches) -> FcfgConfig {
    build_config(matches).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    })
}

fn build_config(matches: &ArgMatches) -> Result<FcfgConfig, ConfigError> {
    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG);
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if matches.get_flag("case-sensitive") {
        loader = loader.set_override("matching.case_sensitive", true)?;
    }
    if let Some(depth) = matches.get_one::<usize>("max-depth") {
        loader = loader.set_override("matching.max_depth", *depth as i64)?;
    }
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.set_override("output.format", format.as_str())?;
    }
    loader.build()
}

/// Compile the grammar named by the subcommand and fill open classes from `--class`
fn load_parser(matches: &ArgMatches, config: &FcfgConfig) -> Parser {
    let path = matches
        .get_one::<String>("grammar")
        .expect("grammar is a required argument");

    let mut parser = Parser::from_file(path).unwrap_or_else(|e| {
        match &e {
            LoadError::Syntax(error) => {
                let source = fs::read_to_string(path).unwrap_or_default();
                eprintln!("{}: {}", path, error.render(&source).trim_end());
            }
            LoadError::Io { .. } => eprintln!("{}", e),
        }
        process::exit(1);
    });

    for spec in matches.get_many::<String>("class").into_iter().flatten() {
        let (name, phrases) = output::parse_class_spec(spec).unwrap_or_else(|e| {
            eprintln!("{}", e);
            process::exit(2);
        });
        debug!(class = %name, phrases = phrases.len(), "registering open class");
        parser.registry_mut().register_words(name, phrases);
    }

    parser.with_options(config.matching.to_options())
}

fn words<'a>(matches: &'a ArgMatches, id: &str) -> Vec<&'a str> {
    matches
        .get_many::<String>(id)
        .into_iter()
        .flatten()
        .flat_map(|arg| arg.split_whitespace())
        .collect()
}

fn root(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("root")
        .expect("root is a required argument")
}

/// Handle the check command
fn handle_check_command(matches: &ArgMatches, config: &FcfgConfig) {
    let parser = load_parser(matches, config);
    let grammar = parser.grammar();

    println!(
        "{} rules, {} entries",
        grammar.len(),
        grammar.entry_count()
    );
    let open = parser.unresolved_references();
    if !open.is_empty() {
        println!("\nOpen classes (need a resolver):");
        for name in open {
            println!("  {}", name);
        }
    }
}

/// Handle the parse command
fn handle_parse_command(matches: &ArgMatches, config: &FcfgConfig) {
    let parser = load_parser(matches, config);
    let tokens = words(matches, "sentence");

    match parser.parse_tokens(root(matches), &tokens) {
        Ok(value) => {
            let formatted = output::format_value(&value, &config.output).unwrap_or_else(|e| {
                eprintln!("{}", e);
                process::exit(1);
            });
            println!("{}", formatted);
        }
        Err(error @ MatchError::NoDerivation { .. }) => {
            eprintln!("{}", error);
            process::exit(1);
        }
        Err(error) => {
            eprintln!("error: {}", error);
            process::exit(2);
        }
    }
}

/// Handle the suggest command
fn handle_suggest_command(matches: &ArgMatches, config: &FcfgConfig) {
    let parser = load_parser(matches, config);
    let prefix = words(matches, "prefix").join(" ");

    let suggestions = parser.suggest(root(matches), &prefix).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        process::exit(2);
    });
    for word in suggestions {
        println!("{}", word);
    }
}

/// Handle the enumerate command
fn handle_enumerate_command(matches: &ArgMatches, config: &FcfgConfig) {
    let parser = load_parser(matches, config);
    let depth = matches
        .get_one::<usize>("depth")
        .copied()
        .unwrap_or(config.enumerate.depth);
    let limit = matches.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);

    let trees: Vec<_> = parser
        .enumerate(root(matches), depth)
        .iter()
        .take(limit)
        .collect();
    print!("{}", output::format_trees(&trees));
}

/// Handle the random command
fn handle_random_command(matches: &ArgMatches, config: &FcfgConfig) {
    let parser = load_parser(matches, config);
    let mut rng = match matches.get_one::<u64>("seed") {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_entropy(),
    };

    match parser.random_sentence(root(matches), &mut rng) {
        Ok(sentence) => println!("{}", sentence),
        Err(error) => {
            eprintln!("error: {}", error);
            process::exit(1);
        }
    }
}
