//! Terminal output for the sentinel-server CLI.
//!
//! Status lines are a marker followed by a message. With colors off the
//! marker becomes a bracketed tag such as `[OK]`.

use owo_colors::OwoColorize;

pub struct Output {
    pub colored: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Startup banner with the crate version.
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "SENTINEL".bright_cyan().bold(),
                version.dimmed(),
                "OSINT research task server".bright_white()
            );
        } else {
            println!("\n   SENTINEL {}\n   OSINT research task server\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        self.status_line("[OK]", message, || {
            format!("{} {}", "✓".green().bold(), message.green())
        });
    }

    pub fn warning(&self, message: &str) {
        self.status_line("[WARN]", message, || {
            format!("{} {}", "⚠".yellow().bold(), message.yellow())
        });
    }

    /// Errors go to stderr.
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    pub fn created(&self, what: &str, path: &str) {
        let message = format!("{} {}", what, path);
        self.status_line("[CREATED]", &message, || {
            format!("{} {} {}", "✓".green().bold(), what.dimmed(), path.bright_white())
        });
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn hint(&self, message: &str) {
        println!();
        self.status_line("[TIP]", message, || {
            format!("{} {}", "hint:".dimmed(), message.dimmed().italic())
        });
    }

    /// A shell command the user can copy.
    pub fn command(&self, cmd: &str) {
        let line = format!("$ {}", cmd);
        if self.colored {
            println!("     {}", line.bright_cyan());
        } else {
            println!("     {}", line);
        }
    }

    fn status_line(&self, tag: &str, message: &str, styled: impl FnOnce() -> String) {
        if self.colored {
            println!("  {}", styled());
        } else {
            println!("  {} {}", tag, message);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_modes() {
        assert!(Output::new().colored);
        assert!(!Output::no_color().colored);
    }

    #[test]
    fn test_output_methods_no_panic() {
        for output in [Output::no_color(), Output::new()] {
            output.banner();
            output.success("tool server reachable");
            output.warning("tool server unreachable");
            output.error("config invalid");
            output.created("config", "sentinel.toml");
            output.header("Tool Server");
            output.kv("base_url", "http://localhost:8000");
            output.hint("run init first");
            output.command("sentinel-server init");
        }
    }
}
