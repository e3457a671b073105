//! Handles all user-facing output for the CLI.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::action::Action;
use crate::grammar::Grammar;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

pub fn print_heading(text: &str) {
    print_colored(text, Color::Yellow, true);
}

/// Numbered action listing, one per line.
pub fn print_actions(actions: &[Action], grammar: &Grammar) {
    for (step, action) in actions.iter().enumerate() {
        println!("{:>4}  {}", step, action.display(grammar));
    }
}

pub fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    print_colored("warnings:", Color::Yellow, true);
    for warning in warnings {
        println!("  - {}", warning);
    }
}

pub fn print_status(ok: bool, message: &str) {
    let color = if ok { Color::Green } else { Color::Red };
    print_colored(message, color, true);
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_colored(text: &str, color: Color, bold: bool) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
    let _ = writeln!(stdout, "{}", text);
    let _ = stdout.reset();
}
