//! Slash command definitions and reply formatting.

use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption};

use steward_core::{CommandError, Intent, Outcome};

/// Discord caps string-option choices at 25; beyond that the option becomes
/// free text and unknown names fall through to NotFound.
const MAX_CHOICES: usize = 25;

/// The four commands the bot registers.
pub fn command_definitions(server_names: &[&str]) -> Vec<CreateCommand> {
    vec![
        command("start", "Start a managed game server", server_names),
        command("stop", "Stop a managed game server", server_names),
        command("restart", "Restart a managed game server", server_names),
        command("status", "Show the status of a managed game server", server_names),
    ]
}

fn command(name: &'static str, description: &str, server_names: &[&str]) -> CreateCommand {
    let mut option =
        CreateCommandOption::new(CommandOptionType::String, "server", "Name of the server")
            .required(true);
    if server_names.len() <= MAX_CHOICES {
        for server in server_names {
            option = option.add_string_choice(*server, *server);
        }
    }
    CreateCommand::new(name)
        .description(description)
        .add_option(option)
}

/// Map a received command name back to an intent.
pub fn parse_intent(command_name: &str) -> Option<Intent> {
    match command_name {
        "start" => Some(Intent::Start),
        "stop" => Some(Intent::Stop),
        "restart" => Some(Intent::Restart),
        "status" => Some(Intent::Status),
        _ => None,
    }
}

pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Started { server } => format!("✅ Starting {server}"),
        Outcome::Stopped { server } => format!("🛑 Stopping {server}"),
        Outcome::Restarted { server } => format!("🔁 Restarting {server}"),
        Outcome::Status { server, state } => format!("📊 {server} is {state}"),
    }
}

/// Errors keep their stable user-safe `Display` text; only the prefix
/// differs.
pub fn format_error(err: &CommandError) -> String {
    match err {
        CommandError::Unauthorized => format!("⛔ {err}"),
        CommandError::NotFound | CommandError::Upstream => format!("❌ {err}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use steward_core::PowerState;

    use super::*;

    #[test]
    fn four_commands_defined() {
        let defs = command_definitions(&["smp", "creative"]);
        assert_eq!(defs.len(), 4);
        let names: Vec<String> = defs
            .iter()
            .map(|d| {
                serde_json::to_value(d).unwrap()["name"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(names, vec!["start", "stop", "restart", "status"]);
    }

    #[test]
    fn server_names_become_choices() {
        let defs = command_definitions(&["smp"]);
        let json = serde_json::to_value(&defs[0]).unwrap();
        let choices = &json["options"][0]["choices"];
        assert_eq!(choices[0]["value"], "smp");
    }

    #[test]
    fn too_many_servers_fall_back_to_free_text() {
        let names: Vec<String> = (0..30).map(|i| format!("server-{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let defs = command_definitions(&refs);
        let json = serde_json::to_value(&defs[0]).unwrap();
        assert!(json["options"][0]["choices"].as_array().is_none_or(Vec::is_empty));
    }

    #[test]
    fn intents_round_trip() {
        assert_eq!(parse_intent("start"), Some(Intent::Start));
        assert_eq!(parse_intent("stop"), Some(Intent::Stop));
        assert_eq!(parse_intent("restart"), Some(Intent::Restart));
        assert_eq!(parse_intent("status"), Some(Intent::Status));
        assert_eq!(parse_intent("reload-config"), None);
    }

    #[test]
    fn outcome_formatting() {
        assert_eq!(
            format_outcome(&Outcome::Started {
                server: "smp".into()
            }),
            "✅ Starting smp"
        );
        assert_eq!(
            format_outcome(&Outcome::Status {
                server: "smp".into(),
                state: PowerState::Running,
            }),
            "📊 smp is running"
        );
    }

    #[test]
    fn error_formatting_is_generic() {
        let msg = format_error(&CommandError::Upstream);
        assert!(msg.starts_with('❌'));
        // No upstream detail leaks into the reply.
        assert!(!msg.contains("HTTP"));
    }
}
