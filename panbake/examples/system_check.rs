//! System check: connect to a VM-Series appliance and verify it is usable.
//!
//! Waits for a freshly launched appliance to finish booting, prints
//! `show system info` and checks that the instance is licensed and has a
//! serial number.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example system_check -- --host 203.0.113.10 --user admin --key ~/.ssh/vmseries.pem
//! ```
//!
//! Optionally verify installed versions:
//! ```bash
//! cargo run --example system_check -- --host 203.0.113.10 --key key.pem --sw 10.1.3 --plugin 2.1.3
//! ```

use std::env;
use std::path::PathBuf;

use panbake::DeviceBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for wire-level output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = DeviceBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user);

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }

    let mut device = builder.build()?;

    println!("Waiting for {} to accept a session...", args.host);
    device.open_when_ready().await?;

    let info = device.system_info().await?;
    println!("{}", "-".repeat(50));
    for (key, value) in info.iter() {
        println!("{key:>24}: {value}");
    }
    println!("{}", "-".repeat(50));

    device.verify_system().await?;
    if let Some(sw) = &args.sw {
        device.verify_versions(sw, args.plugin.as_deref()).await?;
    }

    device.close().await?;
    println!("Done!");
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    sw: Option<String>,
    plugin: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Args {
            host: "localhost".to_string(),
            port: 22,
            user: "admin".to_string(),
            password: None,
            key: None,
            sw: None,
            plugin: None,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => parsed.host = value.unwrap_or(parsed.host),
                "--port" | "-p" => {
                    parsed.port = value.and_then(|v| v.parse().ok()).unwrap_or(22);
                }
                "--user" | "-u" => parsed.user = value.unwrap_or(parsed.user),
                "--password" | "-P" => parsed.password = value,
                "--key" | "-k" => parsed.key = value.map(PathBuf::from),
                "--sw" => parsed.sw = value,
                "--plugin" => parsed.plugin = value,
                other => {
                    eprintln!("Unknown argument: {other}");
                    std::process::exit(1);
                }
            }
            i += 2;
        }
        parsed
    }
}
