//! The ASDL Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::Path;
use std::sync::Arc;
use std::{fs, process};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::args::{AsdlArgs, Command};
use crate::convert::domain_to_generic;
use crate::errors::{print_error, AsdlError, SourceContext};
use crate::grammar::{Grammar, GrammarConfig};
use crate::json::JsonLanguage;
use crate::transition::{LanguageAdapter, LanguageTransitionSystem};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = AsdlArgs::parse();
    init_tracing(args.verbose);

    let result = load_config(args.config.as_deref()).and_then(|config| match &args.command {
        Command::Check { grammar } => handle_check(grammar, config),
        Command::Actions { grammar, tree } => handle_actions(grammar, tree, config),
        Command::Replay { grammar, tree } => handle_replay(grammar, tree, config),
    });

    if let Err(e) = result {
        print_error(e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn handle_check(path: &Path, config: GrammarConfig) -> Result<(), AsdlError> {
    let grammar = load_grammar(path, config)?;

    output::print_heading(&format!("grammar {}", path.display()));
    print!("{}", grammar);
    let composite = grammar.types().iter().filter(|t| t.is_composite()).count();
    println!(
        "{} composite types, {} productions, root type {}",
        composite,
        grammar.productions().len(),
        grammar.type_name(grammar.root_type())
    );
    output::print_warnings(&grammar.lint());
    output::print_status(true, "grammar ok");
    Ok(())
}

fn handle_actions(grammar_path: &Path, tree_path: &Path, config: GrammarConfig) -> Result<(), AsdlError> {
    let language = load_language(grammar_path, config)?;
    let tree = read_tree(&language, tree_path)?;

    let actions = language.system().get_actions(&tree);
    output::print_heading(&format!("{} actions", actions.len()));
    output::print_actions(&actions, language.grammar());
    Ok(())
}

fn handle_replay(grammar_path: &Path, tree_path: &Path, config: GrammarConfig) -> Result<(), AsdlError> {
    let language = load_language(grammar_path, config)?;
    let tree = read_tree(&language, tree_path)?;

    let rebuilt = language.system().round_trip(&tree)?;
    println!("{}", language.ast_to_surface_code(&rebuilt)?);

    let identical = rebuilt == tree;
    let same_code = language.compare_ast(&rebuilt, &tree)?;
    output::print_status(
        identical && same_code,
        if identical && same_code {
            "replay reproduced the input tree"
        } else {
            "replay diverged from the input tree"
        },
    );
    if !identical {
        return Err(AsdlError::violation("replayed tree differs from the input"));
    }
    Ok(())
}

// ============================================================================
// LOADING
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<GrammarConfig, AsdlError> {
    match path {
        Some(path) => GrammarConfig::load(path),
        None => Ok(GrammarConfig::default()),
    }
}

fn load_grammar(path: &Path, config: GrammarConfig) -> Result<Grammar, AsdlError> {
    let text = read(path)?;
    Grammar::from_source(&SourceContext::from_file(path.display().to_string(), text), config)
}

fn load_language(
    path: &Path,
    config: GrammarConfig,
) -> Result<LanguageTransitionSystem<JsonLanguage>, AsdlError> {
    let grammar = Arc::new(load_grammar(path, config)?);
    let adapter = JsonLanguage::new(&grammar);
    Ok(LanguageTransitionSystem::new(grammar, adapter))
}

fn read_tree(
    language: &LanguageTransitionSystem<JsonLanguage>,
    path: &Path,
) -> Result<crate::ast::GenericNode, AsdlError> {
    let node = language.adapter().parse(&read(path)?)?;
    let tree = domain_to_generic(&node, language.grammar())?;
    tree.validate(language.grammar())?;
    Ok(tree)
}

fn read(path: &Path) -> Result<String, AsdlError> {
    fs::read_to_string(path).map_err(|e| AsdlError::io(path.display().to_string(), &e))
}
