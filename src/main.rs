//! qrgen command-line entrypoint

use clap::Parser;
use qrgen::output::{describe_outcome, describe_receipt, receipt_value, render_view};
use qrgen::{
    Color, DirectorySaver, Error, ExportReceipt, GenerateOutcome, QrApp, QrEncoder, QrSize,
    QrgenConfig, Result, logging,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

type App = QrApp<QrEncoder, DirectorySaver>;

#[derive(Parser, Debug)]
#[command(
    name = "qrgen",
    version,
    about = "Generate QR codes from text or URLs and save them as PNG"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to qrgen.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// URL or text to encode
    #[arg(short, long)]
    text: Option<String>,

    /// Image size in pixels (100-400, snapped to steps of 10)
    #[arg(short, long, value_name = "PX")]
    size: Option<u32>,

    /// Color of the QR modules (#rrggbb)
    #[arg(long, value_name = "COLOR")]
    foreground: Option<String>,

    /// Background color (#rrggbb)
    #[arg(long, value_name = "COLOR")]
    background: Option<String>,

    /// Directory the PNG is saved into
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Generate and preview only; do not save a file
    #[arg(long)]
    no_download: bool,

    /// Output results as formatted JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Edit the form with line commands instead of generating once
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = QrgenConfig::load(cli.config.as_deref())?;

    if let Some(ref text) = cli.text {
        config.form.text = Some(text.clone());
    }
    if let Some(size) = cli.size {
        config.form.size = Some(size);
    }
    if let Some(ref color) = cli.foreground {
        config.form.foreground = Some(color.clone());
    }
    if let Some(ref color) = cli.background {
        config.form.background = Some(color.clone());
    }
    if let Some(ref dir) = cli.output_dir {
        config.export.output_dir = dir.clone();
    }

    logging::init(&config.logging)?;

    let settings = config.form_settings()?;
    let encoder = config.encoder()?;
    let saver = DirectorySaver::new(config.export.output_dir.clone());
    info!(?settings, output_dir = %saver.dir().display(), "Starting qrgen");

    let app = Arc::new(QrApp::new(settings, encoder, saver));

    if cli.interactive {
        run_interactive(app, cli.json).await
    } else {
        run_once(&app, cli.json, !cli.no_download).await
    }
}

async fn run_once(app: &App, json: bool, download: bool) -> Result<()> {
    let outcome = app.generate().await;
    let receipt = if download { app.download()? } else { None };

    if json {
        let rendered = render_view(&app.view());
        let payload = json!({
            "view": rendered.json,
            "export": receipt_value(receipt.as_ref()),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    print_outcome(&outcome);
    for line in render_view(&app.view()).human {
        println!("{line}");
    }
    if download {
        println!("{}", describe_receipt(receipt.as_ref()));
    }
    Ok(())
}

async fn run_interactive(app: Arc<App>, json: bool) -> Result<()> {
    let renderer = {
        let app = Arc::clone(&app);
        let mut changes = app.changes();
        tokio::spawn(async move {
            while changes.changed().await {
                print_view(&app, json);
            }
        })
    };

    print_view(&app, json);
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let (command, arg) = match line.trim().split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line.trim(), ""),
        };

        match command {
            "" => {}
            "text" => app.set_text(arg),
            "size" => match arg.parse::<u32>() {
                Ok(px) => app.set_size(QrSize::clamped(px)),
                Err(_) => println!("Size must be a number of pixels"),
            },
            "fg" => match Color::parse(arg) {
                Ok(color) => app.set_foreground(color),
                Err(err) => println!("{err}"),
            },
            "bg" => match Color::parse(arg) {
                Ok(color) => app.set_background(color),
                Err(err) => println!("{err}"),
            },
            "generate" => {
                if !app.can_generate() {
                    println!("Generate is disabled");
                    continue;
                }
                let app = Arc::clone(&app);
                tokio::spawn(async move {
                    let outcome = app.generate().await;
                    print_outcome(&outcome);
                });
            }
            "download" => match app.download() {
                Ok(receipt) => print_receipt(receipt.as_ref(), json),
                Err(err) => println!("Failed to save QR code: {err}"),
            },
            "show" => print_view(&app, json),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("Unknown command '{other}'. Type `help` for commands."),
        }
    }

    renderer.abort();
    Ok(())
}

fn print_view(app: &App, json: bool) {
    let rendered = render_view(&app.view());
    if json {
        match serde_json::to_string(&rendered.json) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!(error = %Error::from(err), "Failed to serialise view"),
        }
    } else {
        for line in rendered.human {
            println!("{line}");
        }
    }
}

fn print_outcome(outcome: &GenerateOutcome) {
    let message = describe_outcome(outcome);
    if !message.is_empty() {
        println!("{message}");
    }
}

fn print_receipt(receipt: Option<&ExportReceipt>, json: bool) {
    if json {
        println!("{}", receipt_value(receipt));
    } else {
        println!("{}", describe_receipt(receipt));
    }
}

fn print_help() {
    println!("Commands:");
    println!("  text <value>   set the URL or text");
    println!("  size <px>      set the size (100-400, step 10)");
    println!("  fg <color>     set the QR color (#rrggbb)");
    println!("  bg <color>     set the background color (#rrggbb)");
    println!("  generate       generate the QR code");
    println!("  download       save the QR code as {{text}}-QR.png");
    println!("  show           print the form");
    println!("  quit           exit");
}
