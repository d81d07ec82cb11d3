use clap::Parser;
use phone_intel::config::{CliConfig, Command, PhoneIntelConfig};
use phone_intel::utils::logger;
use phone_intel::utils::validation::{self, Validate};
use phone_intel::{
    detect, sanitize_digits, validate, AvailabilityChecker, AvailabilityField, AvailabilityState,
    FieldStatus, HttpChannelVerifier, PhoneValidator, PrefixTable, Result,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting phone-intel CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(&config).await {
        tracing::error!("❌ {}", e);
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

async fn run(config: &CliConfig) -> Result<()> {
    config.validate()?;

    let file = match &config.config {
        Some(path) => {
            let file = PhoneIntelConfig::from_file(path)?;
            file.validate()?;
            Some(file)
        }
        None => None,
    };

    if let Some(file) = &file {
        if file.prefix_table_path().is_some() {
            PrefixTable::install(file.load_prefix_table()?)?;
        }
    }

    match &config.command {
        Command::Detect { digits } => print_json(&detect(&sanitize_digits(digits))),
        Command::Validate {
            number,
            calling_code,
        } => {
            let validator = PhoneValidator::global();
            let result = match calling_code {
                Some(code) => validator.validate_parts(code, number),
                None => validator.validate(number),
            };
            print_json(&result)
        }
        Command::Check { number } => {
            let checker = build_checker(config, file.as_ref())?;
            let result = checker.check_availability(number).await;
            print_json(&result)
        }
        Command::Watch => watch_stdin(build_checker(config, file.as_ref())?).await,
    }
}

fn build_checker(
    config: &CliConfig,
    file: Option<&PhoneIntelConfig>,
) -> Result<AvailabilityChecker<HttpChannelVerifier>> {
    let endpoint = config.resolve_endpoint(file);
    let endpoint = validation::validate_required_field("verification.endpoint", &endpoint)?;
    let settings = config.resolve_settings(file);

    let mut verifier = HttpChannelVerifier::new(*endpoint, settings.timeout)?;
    if let Some(token) = file.and_then(|f| f.api_token()) {
        verifier = verifier.with_api_token(token);
    }
    tracing::debug!("Using verification endpoint {}", verifier.endpoint());

    Ok(AvailabilityChecker::new(verifier, settings))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Each stdin line is treated as the field's new content.
async fn watch_stdin(checker: AvailabilityChecker<HttpChannelVerifier>) -> Result<()> {
    let grace = checker.settings().debounce + checker.settings().timeout;
    let field = AvailabilityField::new(Arc::new(checker));
    let mut statuses = field.subscribe();

    let printer = tokio::spawn(async move {
        while statuses.changed().await.is_ok() {
            let status = statuses.borrow_and_update().clone();
            match status {
                FieldStatus::Idle => {}
                FieldStatus::Checking { value } => println!("⏳ Checking… {}", value),
                FieldStatus::Settled { value, result, .. } => {
                    if result.state == AvailabilityState::Reachable {
                        println!("✅ Has channel: {}", value);
                    } else {
                        println!("·  {}", value);
                    }
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let digits = sanitize_digits(&line);
        let candidate = validate(&line)
            .formatted
            .or_else(|| detect(&digits).formatted_number)
            .unwrap_or(digits);
        field.on_input(candidate);
    }

    tokio::time::sleep(grace + Duration::from_millis(100)).await;
    printer.abort();
    Ok(())
}
