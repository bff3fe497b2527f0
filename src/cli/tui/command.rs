//! TUI slash command registry and handler

use crate::cli::tui::app::App;
use anyhow::Result;

/// A slash command definition.
pub struct Command {
    pub name: &'static str,
    pub handler: fn(&mut App, &[&str]) -> Result<()>,
}

pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            commands: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.commands.push(Command {
            name: "help",
            handler: |app, _| {
                let mut help_text = String::from("Available commands:\n");
                help_text.push_str("  /prompts [n]     List example prompts / insert prompt n\n");
                help_text.push_str("  /end             End the backend session, start fresh\n");
                help_text.push_str("  /clear           Clear chat\n");
                help_text.push_str("  /help            Show this help\n");
                help_text.push_str("  /quit            Exit\n");
                help_text.push_str("\nKeys:\n");
                help_text.push_str("  \u{2191}/\u{2193} (empty input) Input history\n");
                help_text.push_str("  \u{2191}/\u{2193} (otherwise)   Scroll chat\n");
                help_text.push_str("  PageUp/PageDn    Scroll chat fast\n");
                help_text.push_str("  Ctrl+\u{2191}/Ctrl+\u{2193}  Scroll trace panel\n");
                help_text.push_str("  F1               Toggle trace panel\n");
                help_text.push_str("  F2               Toggle mouse capture\n");
                help_text.push_str("  Ctrl+L           Clear screen\n");
                help_text.push_str("  Ctrl+C / Esc     Quit");

                app.push_system(help_text);
                Ok(())
            },
        });

        self.commands.push(Command {
            name: "clear",
            handler: |app, _| {
                app.messages.clear();
                app.scroll_offset = 0;
                app.push_system("Chat cleared.".into());
                Ok(())
            },
        });

        self.commands.push(Command {
            name: "prompts",
            handler: |app, args| {
                match args.first().map(|a| a.parse::<usize>()) {
                    Some(Ok(index)) => {
                        if !app.insert_prompt(index) {
                            app.push_system(format!(
                                "No prompt {index}; /prompts lists the available ones."
                            ));
                        }
                    }
                    Some(Err(_)) => {
                        app.push_system("Usage: /prompts [n]".into());
                    }
                    None => app.list_prompts(),
                }
                Ok(())
            },
        });

        self.commands.push(Command {
            name: "end",
            handler: |app, _| {
                app.end_session();
                Ok(())
            },
        });

        self.commands.push(Command {
            name: "quit",
            handler: |app, _| {
                app.should_quit = true;
                Ok(())
            },
        });
    }

    pub fn handle(&self, app: &mut App, input: &str) -> Result<()> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(());
        }

        let cmd_name = parts[0].strip_prefix('/').unwrap_or(parts[0]);
        let args = &parts[1..];

        if let Some(cmd) = self.commands.iter().find(|c| c.name == cmd_name) {
            (cmd.handler)(app, args)?;
        } else {
            app.push_system(format!("Unknown command: /{}", cmd_name));
        }

        Ok(())
    }

    pub fn get_suggestions(&self, input: &str) -> Vec<&'static str> {
        if !input.starts_with('/') {
            return Vec::new();
        }
        let search = input.strip_prefix('/').unwrap_or("");
        self.commands
            .iter()
            .filter(|c| c.name.starts_with(search))
            .map(|c| c.name)
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
