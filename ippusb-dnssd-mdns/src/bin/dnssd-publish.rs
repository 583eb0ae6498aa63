// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Publish a printer's IPP service over mDNS
//!
//! This binary:
//! 1. Loads (or initializes) the saved instance name
//! 2. Publishes `_ipp._tcp` and `_http._tcp` services for the given port
//! 3. Keeps them published, resolving name collisions, until Ctrl-C

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use ippusb_dnssd::{
    FileNameStore, NameState, Publisher, PublisherConfig, ServiceDescriptor, ServiceSet,
    TxtRecord,
};
use ippusb_dnssd_mdns::MdnsBackend;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "dnssd-publish")]
#[command(about = "Publish an IPP printer via DNS-SD", long_about = None)]
struct Args {
    /// Device name (becomes the service instance name)
    #[arg(long, default_value = "IPP-over-USB Printer")]
    name: String,

    /// File keeping the published instance name across restarts
    #[arg(long, default_value = ".ippusb/dnssd.toml")]
    state_file: PathBuf,

    /// TCP port the printer is served on
    #[arg(short, long, default_value_t = 60000)]
    port: u16,

    /// mDNS port (5353 for production, custom port like 5454 for development)
    #[arg(long, default_value_t = 5353)]
    mdns_port: u16,

    /// Delay between failed publication attempts, in milliseconds
    #[arg(long, default_value_t = 1000)]
    retry_ms: u64,

    /// Advertise on loopback only
    #[arg(long)]
    loopback: bool,

    /// Comma-separated list of supported document formats
    #[arg(long, default_value = "application/pdf,image/urf,image/pwg-raster")]
    pdl: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    println!();
    println!("{}", "=== DNS-SD Publisher ===".bright_cyan().bold());
    println!("{}: {}", "Name".bright_white(), args.name.bright_white());
    println!("{}: {}", "Port".bright_white(), args.port);
    println!();

    let store = FileNameStore::new(&args.state_file);
    let state = NameState::load_or_init(&store, &args.name)
        .with_context(|| format!("Failed to load {}", args.state_file.display()))?;

    let backend = MdnsBackend::new_with_port(args.mdns_port).context("Failed to start mDNS")?;
    let config = PublisherConfig {
        retry_interval: Duration::from_millis(args.retry_ms),
    };

    let mut publisher = Publisher::new(backend, state, Box::new(store), printer_services(&args))
        .with_config(config);
    publisher.publish().context("Failed to start publisher")?;

    println!("OK: Publishing, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for Ctrl-C")?;

    publisher.unpublish().await;
    println!();
    println!("OK: Publisher stopped");
    Ok(())
}

fn printer_services(args: &Args) -> ServiceSet {
    let admin_url = format!("http://localhost:{}/", args.port);

    let mut ipp = TxtRecord::new();
    ipp.add("txtvers", "1");
    ipp.add_if_not_empty("ty", &args.name);
    ipp.add_url_if_not_empty("adminurl", &admin_url);
    ipp.add("rp", "ipp/print");
    ipp.add_pdl("pdl", &args.pdl);

    let mut http = TxtRecord::new();
    http.add("path", "/");

    let mut services = ServiceSet::new();
    for (service, txt) in [
        (ServiceDescriptor::new("_ipp._tcp", args.port).with_sub_type("_print"), ipp),
        (ServiceDescriptor::new("_http._tcp", args.port), http),
    ] {
        let service = service.with_txt(txt);
        services.add(if args.loopback {
            service.loopback_only()
        } else {
            service
        });
    }
    services
}
