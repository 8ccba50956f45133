use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smartpay_client::IntentClient;
use smartpay_core::{classify_intent, Classification};
use smartpay_observability::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "smartpay")]
#[command(about = "SmartPay intent classifier CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a message locally.
    Classify {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Classify a message through a running intent service.
    Remote {
        #[arg(long, env = "AI_URL", default_value = smartpay_client::DEFAULT_BASE_URL)]
        url: String,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Classify one message per line until `exit`.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("smartpay_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Classify { text } => {
            print_classification(&classify_intent(&text.join(" ")))?;
        }
        Command::Remote { url, text } => {
            let client = IntentClient::new(url).context("failed to build intent client")?;
            let classification = client
                .parse_intent(&text.join(" "))
                .await
                .with_context(|| format!("intent request to {} failed", client.base_url()))?;
            print_classification(&classification)?;
        }
        Command::Chat => run_chat()?,
    }

    Ok(())
}

fn run_chat() -> Result<()> {
    println!("SmartPay intent chat. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        print_classification(&classify_intent(message))?;
    }

    Ok(())
}

fn print_classification(classification: &Classification) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(classification)?);
    Ok(())
}
