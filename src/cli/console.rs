use colored::*;
use std::io::{self, Write};

/// Console handles all terminal I/O with colored formatting
pub struct Console {
    user_color: Color,
    assistant_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            user_color: Color::Cyan,
            assistant_color: Color::Green,
        }
    }

    /// Print a user message with colored formatting
    pub fn print_user(&self, message: &str) {
        println!("{} {}", "User:".color(self.user_color).bold(), message);
    }

    /// Print an assistant message with colored formatting
    pub fn print_assistant(&self, message: &str) {
        println!(
            "{} {}",
            "Agent:".color(self.assistant_color).bold(),
            message.color(self.assistant_color)
        );
    }

    /// Print a tool invocation
    pub fn print_tool_call(&self, name: &str) {
        println!("{} {}", "Tool:".magenta().bold(), name);
    }

    /// Print a tool result, dimmed, with errors highlighted
    pub fn print_tool_result(&self, output: &str, is_error: bool) {
        if is_error {
            println!("  {}", output.red());
        } else {
            for line in output.lines() {
                println!("  {}", line.bright_black());
            }
        }
    }

    /// Print a newline
    pub fn println(&self) {
        println!();
    }

    /// Print a system message (errors, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Read a line of input from the user
    pub fn read_input(&self) -> io::Result<String> {
        print!("{} ", ">".color(self.user_color).bold());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    /// Print a welcome banner
    pub fn print_banner(&self) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "  Sourdough - a tool-calling agent starter".bright_blue().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!();
        println!("Type your message and press Enter. Type 'exit' or 'quit' to end the session.");
        println!();
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(60).bright_black());
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
