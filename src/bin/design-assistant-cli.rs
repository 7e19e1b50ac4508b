use anyhow::{anyhow, Result};
use clap::Parser;
use design_assistant::client::AssistantClient;
use design_assistant::images;
use design_assistant::preferences::{DesignSource, RawFields};
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "design-assistant-cli")]
#[command(about = "CLI form host for the design assistant gRPC service")]
struct Cli {
    /// Server address (e.g., "http://localhost:50051")
    #[arg(short, long, default_value = "http://localhost:50051")]
    server: String,

    /// Raw form fields as JSON (use "-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Write the plan to {style}_home_design.md in the current directory
    #[arg(long)]
    save: bool,

    /// Request timeout in seconds for the generation call
    #[arg(short, long, default_value = "60")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let input_json = if cli.input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow!("Failed to read from stdin: {e}"))?;
        buffer
    } else {
        std::fs::read_to_string(&cli.input)
            .map_err(|e| anyhow!("Failed to read input file {}: {e}", cli.input))?
    };

    let raw: RawFields = serde_json::from_str(&input_json)
        .map_err(|e| anyhow!("Failed to parse input JSON: {e}"))?;

    println!("Connecting to design assistant server at {}...", cli.server);
    let mut client = AssistantClient::connect(cli.server.clone())
        .await
        .map_err(|e| anyhow!("Failed to connect: {e}"))?;

    // Validation errors come back as invalid-argument before any upstream
    // call is made.
    let descriptor = client.aggregate(&raw).await?;

    println!("Creating your design...");
    let timeout = std::time::Duration::from_secs(cli.timeout);
    let result = client.generate(&descriptor, timeout).await?;

    println!();
    println!("{}", result.markdown);

    if result.source == DesignSource::Fallback {
        eprintln!("warning: upstream generation was unavailable, showing the local template");
    }

    let image_set = client.fetch_images(&descriptor).await?;
    println!("Visual inspiration:");
    if image_set.is_empty() {
        eprintln!("warning: image search returned nothing, using a fallback image");
        println!("  {}", images::default_images().urls()[0]);
    } else {
        for url in image_set.urls() {
            println!("  {url}");
        }
    }

    if cli.save {
        let file_name = descriptor.download_file_name();
        std::fs::write(&file_name, &result.markdown)
            .map_err(|e| anyhow!("Failed to write {file_name}: {e}"))?;
        println!("Saved design plan to {file_name}");
    }

    Ok(())
}
