/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Sluice CLI - plan and run interval-partitioned log extractions.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::PlanArgs;

/// Sluice - interval-partitioned extraction planning for warehouse query logs
#[derive(Parser)]
#[command(name = "sluice")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an extraction plan and print its manifest
    Plan {
        #[command(flatten)]
        plan: PlanArgs,

        /// Write the manifest to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build an extraction plan and materialize every job's query as a file
    Run {
        #[command(flatten)]
        plan: PlanArgs,

        /// Directory that receives one `.sql` file per job and the manifest
        #[arg(long)]
        out_dir: PathBuf,

        /// Maximum number of jobs running at once
        #[arg(long, default_value_t = 4)]
        max_concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Plan { plan, output } => commands::plan::run(&plan, output.as_deref())?,
        Commands::Run {
            plan,
            out_dir,
            max_concurrent,
        } => commands::run::run(&plan, &out_dir, max_concurrent).await?,
    }

    Ok(())
}
