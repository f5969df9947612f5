/// The inbound Telegram commands named in §4.10. Parsing only extracts
/// structure; each variant's handler reads persistence or invokes a
/// controller elsewhere — none bypass the engine's concurrency discipline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Estado,
    Balance { exchange: Option<String> },
    Cartera,
    Posiciones,
    Ganancias,
    Exposicion,
    Ultimas { n: Option<u32>, exchange: Option<String> },
    Logs { n: Option<u32>, level: Option<String>, kind: Option<String>, page: Option<u32> },
    Log { id: String },
    Config,
    Uptime,
    Menu,
    Channels,
    Pausar,
    Reanudar,
    InformeFiscal,
    RefreshCommands,
    Ayuda,
}

/// Parses a raw inbound message body into a `Command`, or `None` if it is
/// not a recognized command. Unknown `/foo` text falls through to `None`
/// rather than an error — the caller replies with the `/ayuda` text.
pub fn parse(text: &str) -> Option<Command> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let mut parts = text.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default().trim_start_matches('/').to_lowercase();
    let verb = verb.split('@').next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();
    let args = parse_kv_args(rest);

    match verb {
        "estado" => Some(Command::Estado),
        "balance" => Some(Command::Balance { exchange: first_positional(rest) }),
        "cartera" => Some(Command::Cartera),
        "posiciones" => Some(Command::Posiciones),
        "ganancias" => Some(Command::Ganancias),
        "exposicion" => Some(Command::Exposicion),
        "ultimas" => Some(Command::Ultimas {
            n: first_positional(rest).and_then(|s| s.parse().ok()),
            exchange: args.get("exchange").cloned(),
        }),
        "logs" => Some(Command::Logs {
            n: first_positional(rest).and_then(|s| s.parse().ok()),
            level: args.get("level").cloned(),
            kind: args.get("type").cloned(),
            page: args.get("page").and_then(|s| s.parse().ok()),
        }),
        "log" => first_positional(rest).map(|id| Command::Log { id }),
        "config" => Some(Command::Config),
        "uptime" => Some(Command::Uptime),
        "menu" => Some(Command::Menu),
        "channels" => Some(Command::Channels),
        "pausar" => Some(Command::Pausar),
        "reanudar" => Some(Command::Reanudar),
        "informe_fiscal" | "informefiscal" | "fiscal" => Some(Command::InformeFiscal),
        "refresh_commands" | "refreshcommands" => Some(Command::RefreshCommands),
        "ayuda" | "help" | "start" => Some(Command::Ayuda),
        _ => None,
    }
}

fn first_positional(rest: &str) -> Option<String> {
    rest.split_whitespace().find(|token| !token.contains('=')).map(|s| s.to_string())
}

fn parse_kv_args(rest: &str) -> std::collections::HashMap<String, String> {
    rest.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .map(|(k, v)| (k.to_lowercase(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands_case_insensitively() {
        assert_eq!(parse("/estado"), Some(Command::Estado));
        assert_eq!(parse("/Uptime"), Some(Command::Uptime));
    }

    #[test]
    fn strips_bot_username_suffix() {
        assert_eq!(parse("/estado@my_bot"), Some(Command::Estado));
    }

    #[test]
    fn parses_balance_with_exchange_argument() {
        assert_eq!(
            parse("/balance kraken"),
            Some(Command::Balance { exchange: Some("kraken".to_string()) })
        );
    }

    #[test]
    fn parses_logs_with_keyword_arguments() {
        assert_eq!(
            parse("/logs 20 level=error type=order page=2"),
            Some(Command::Logs {
                n: Some(20),
                level: Some("error".to_string()),
                kind: Some("order".to_string()),
                page: Some(2),
            })
        );
    }

    #[test]
    fn non_command_text_returns_none() {
        assert_eq!(parse("hello there"), None);
    }

    #[test]
    fn unknown_command_returns_none() {
        assert_eq!(parse("/nonexistent"), None);
    }
}
