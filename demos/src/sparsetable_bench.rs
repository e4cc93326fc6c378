// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Fills a huge sparse table with random keys, iterates it, and writes it to
//! disk; on later runs reads the file back instead of filling.
//!
//! ```text
//! $ sparsetable_bench table.bin      # first run: fill, iterate, write
//! $ sparsetable_bench table.bin      # second run: read, iterate, write
//! ```
//!
//! Delete the file to start again.

use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use sparsetable::SparseTable;
use sparsetable::random::RandomSource;
use sparsetable::random::XorShift64;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sparsetable_bench")]
#[command(about = "Measure filling, iterating, reading and writing a huge sparse table")]
struct Args {
    /// Table file, read if it exists and always written back
    path: PathBuf,

    /// Virtual size of the table
    #[arg(long, default_value_t = u64::from(u32::MAX))]
    width: u64,

    /// Number of random writes when filling [default: width / 8]
    #[arg(long)]
    count: Option<u64>,

    /// Seed of the random index generator
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let width = usize::try_from(args.width).context("width does not fit in memory")?;

    let table = if args.path.exists() {
        read_table(&args.path)?
    } else {
        let count = args.count.unwrap_or(args.width / 8);
        let mut rng = XorShift64::seeded(args.seed);
        fill_table(width, count, &mut rng)?
    };

    let start = Instant::now();
    let iterated = table.iter_nonempty().count();
    info!(
        "Iterated {} stored keys in a sparsetable of width {} in {} seconds",
        iterated,
        table.size(),
        start.elapsed().as_secs()
    );

    let start = Instant::now();
    table
        .save(&args.path)
        .with_context(|| format!("failed to write {}", args.path.display()))?;
    info!(
        "Wrote {} stored keys to a sparsetable of width {} in {} seconds",
        table.num_nonempty(),
        table.size(),
        start.elapsed().as_secs()
    );
    Ok(())
}

/// Stores a running counter at `count` indices drawn uniformly from
/// `[0, width)`. Repeated indices are overwritten.
fn fill_table<R: RandomSource>(width: usize, count: u64, rng: &mut R) -> Result<SparseTable<u64>> {
    let start = Instant::now();
    let mut table = SparseTable::with_size(width);
    if width > 0 {
        for value in 0..count {
            let index = rng.next_below(width as u64) as usize;
            table.set(index, value)?;
        }
    }
    info!(
        "Added {} random keys to a sparsetable of width {} in {} seconds",
        count,
        width,
        start.elapsed().as_secs()
    );
    Ok(table)
}

fn read_table(path: &Path) -> Result<SparseTable<u64>> {
    let start = Instant::now();
    let table = SparseTable::load(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    info!(
        "Read {} stored keys from a sparsetable of width {} in {} seconds",
        table.num_nonempty(),
        table.size(),
        start.elapsed().as_secs()
    );
    Ok(table)
}
