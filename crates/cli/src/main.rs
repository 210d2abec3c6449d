use clap::{Parser, Subcommand};
use notifyme::prompt::{self, ChannelConfigValue, PromptRequest, ValidationResult};
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "notifyme")]
#[command(about = "NotifyMe prompt validation service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json.
    Init {
        /// Config file path (default: NOTIFYME_CONFIG_PATH or ~/.notifyme/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the HTTP gateway (POST /api/v1/validate-prompt, GET /api/v1/health).
    Serve {
        /// Config file path (default: NOTIFYME_CONFIG_PATH or ~/.notifyme/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Validate a prompt locally, without the gateway, and print the result as JSON.
    Validate {
        /// Free-text notification prompt (10–1000 characters).
        #[arg(long)]
        prompt: String,

        /// Requester email.
        #[arg(long)]
        email: String,

        /// IANA timezone (e.g. Europe/Rome). Unknown zones fall back to UTC.
        #[arg(long)]
        timezone: Option<String>,

        /// Delivery channel; repeat for several (e.g. --channel email --channel sms).
        #[arg(long = "channel", value_name = "NAME")]
        channels: Vec<String>,

        /// Per-channel config as KEY=VALUE; VALUE is read as a JSON scalar when it parses, else as text.
        #[arg(long = "channel-config", value_name = "KEY=VALUE", value_parser = parse_channel_config)]
        channel_configs: Vec<(String, ChannelConfigValue)>,

        /// Print the decoded payload instead of the raw result envelope.
        #[arg(long)]
        decode: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("notifyme {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("gateway failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Validate {
            prompt,
            email,
            timezone,
            channels,
            channel_configs,
            decode,
        }) => {
            let request = PromptRequest {
                prompt,
                email,
                timezone,
                channels: (!channels.is_empty()).then_some(channels),
                channel_configs: (!channel_configs.is_empty())
                    .then(|| channel_configs.into_iter().collect::<BTreeMap<_, _>>()),
            };
            if let Err(e) = run_validate(request, decode) {
                log::error!("validate failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn parse_channel_config(s: &str) -> Result<(String, ChannelConfigValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("channel config key is empty".to_string());
    }
    let value = serde_json::from_str::<ChannelConfigValue>(value)
        .unwrap_or_else(|_| ChannelConfigValue::Text(value.to_string()));
    Ok((key.to_string(), value))
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(notifyme::config::default_config_path);
    let dir = notifyme::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = notifyme::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    if let Some(b) = bind {
        config.server.bind = b;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.server.bind,
        config.server.port,
        path.display()
    );
    notifyme::gateway::run_gateway(config).await
}

fn run_validate(request: PromptRequest, decode: bool) -> anyhow::Result<()> {
    let (result, out) = render_validation(request, decode, chrono::Utc::now())?;
    println!("{}", out);
    if !result.success {
        anyhow::bail!("{}", result.message);
    }
    Ok(())
}

/// Evaluate at `now` and render the result (or, with `decode`, its payload) as pretty JSON.
fn render_validation(
    request: PromptRequest,
    decode: bool,
    now: chrono::DateTime<chrono::Utc>,
) -> anyhow::Result<(ValidationResult, String)> {
    let normalized = prompt::normalize(request)?;
    let result = prompt::evaluate(&normalized, now);
    let out = if decode && result.success {
        serde_json::to_string_pretty(&result.payload()?)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    Ok((result, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_config_values_parse_as_scalars() {
        assert_eq!(
            parse_channel_config("retries=3").unwrap(),
            ("retries".to_string(), ChannelConfigValue::Number(3.into()))
        );
        assert_eq!(
            parse_channel_config("loud=true").unwrap().1,
            ChannelConfigValue::Bool(true)
        );
        assert_eq!(
            parse_channel_config("hook=https://a.example/x?y=1").unwrap().1,
            ChannelConfigValue::Text("https://a.example/x?y=1".to_string())
        );
        assert!(parse_channel_config("novalue").is_err());
        assert!(parse_channel_config("=x").is_err());
    }

    fn request(prompt: &str) -> PromptRequest {
        PromptRequest {
            prompt: prompt.to_string(),
            email: "a@b.com".to_string(),
            timezone: Some("Europe/Rome".to_string()),
            channels: None,
            channel_configs: None,
        }
    }

    fn noon() -> chrono::DateTime<chrono::Utc> {
        "2026-01-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn short_prompt_fails_validation() {
        let err = run_validate(request("short"), false).unwrap_err();
        assert!(
            err.to_string().contains("Prompt must be between 10 and 1000 characters"),
            "{}",
            err
        );
    }

    #[test]
    fn decode_prints_the_payload() {
        let (result, out) = render_validation(request("Remind me to call mom"), true, noon()).unwrap();
        assert!(result.success);
        let payload: notifyme::prompt::ValidationPayload = serde_json::from_str(&out).unwrap();
        assert_eq!(payload.response_type, "validation_result");
        assert_eq!(payload.user_timezone, "Europe/Rome");
        assert_eq!(payload.when_notify.date_time, "2026-01-16T09:00:00+01:00");
    }

    #[test]
    fn without_decode_prints_the_envelope() {
        let (_, out) = render_validation(request("Remind me to call mom"), false, noon()).unwrap();
        let envelope: ValidationResult = serde_json::from_str(&out).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.message, "Prompt validated successfully for channels: email");
        assert!(envelope.payload().is_ok());
    }

    #[test]
    fn cli_parses_repeated_channels() {
        let cli = Cli::try_parse_from([
            "notifyme",
            "validate",
            "--prompt",
            "Remind me to call mom",
            "--email",
            "a@b.com",
            "--channel",
            "email",
            "--channel",
            "sms",
        ])
        .unwrap();
        let Some(Commands::Validate { channels, .. }) = cli.command else {
            panic!("expected validate subcommand");
        };
        assert_eq!(channels, vec!["email", "sms"]);
    }
}
