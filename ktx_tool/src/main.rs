use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, Result, anyhow};
use binrw::Endian;
use clap::{Parser, Subcommand};
use ktx_lib::Bundle;
use log::{error, info};
use rayon::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logs including the offsets of each parsed section.
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header, key value data, and image sizes.
    Info {
        /// The input KTX file.
        input: String,
    },
    /// Check that all KTX files in a folder parse and write identical bytes.
    Check {
        /// The folder to search recursively for .ktx files.
        folder: String,
    },
    /// Edit key value data and save to a new file.
    Rewrite {
        /// The input KTX file.
        input: String,
        /// The output KTX file.
        output: String,

        /// Write integers in big endian byte order.
        #[arg(long)]
        big_endian: bool,

        /// Remove all entries with this key before adding new entries.
        #[arg(long = "remove-key")]
        remove_keys: Vec<String>,

        /// Add an entry with a string value like "KTXorientation=S=r,T=d".
        #[arg(long = "key-value", value_parser = parse_key_value)]
        key_values: Vec<(String, String)>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE but found {s:?}"))?;
    Ok((key.to_string(), value.to_string()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    simple_logger::SimpleLogger::new()
        .with_level(if cli.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Warn
        })
        .init()
        .unwrap();

    match cli.command {
        Commands::Info { input } => print_info(&input),
        Commands::Check { folder } => check_folder(&folder),
        Commands::Rewrite {
            input,
            output,
            big_endian,
            remove_keys,
            key_values,
        } => rewrite(&input, &output, big_endian, &remove_keys, &key_values),
    }
}

fn read_bundle<P: AsRef<Path>>(path: P) -> Result<Bundle> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {path:?}"))?;
    Bundle::from_bytes(bytes).with_context(|| format!("failed to parse {path:?}"))
}

fn print_info(input: &str) -> Result<()> {
    let bundle = read_bundle(input)?;

    println!("{:#?}", bundle.header());
    println!("cube map: {}", bundle.is_cubemap());

    for entry in bundle.metadata() {
        println!("{}: {}", entry.key(), format_value(entry.value()));
    }

    for (index, data) in bundle.blobs().iter() {
        match data {
            Some(data) => println!("{index}: {} bytes", data.len()),
            None => println!("{index}: empty"),
        }
    }

    Ok(())
}

/// Show values as text if possible and hex otherwise.
fn format_value(value: &[u8]) -> String {
    let text = value.strip_suffix(&[0]).unwrap_or(value);
    match std::str::from_utf8(text) {
        Ok(s) if !s.chars().any(char::is_control) => format!("{s:?}"),
        _ => value.iter().map(|b| format!("{b:02x}")).collect(),
    }
}

fn check_folder(folder: &str) -> Result<()> {
    let start = std::time::Instant::now();

    let paths: Vec<PathBuf> = globwalk::GlobWalkerBuilder::from_patterns(folder, &["*.ktx"])
        .build()?
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .collect();

    let failed = AtomicUsize::new(0);
    paths.par_iter().for_each(|path| {
        if let Err(e) = check_file(path) {
            error!("{path:?}: {e:?}");
            failed.fetch_add(1, Ordering::Relaxed);
        }
    });

    let failed = failed.into_inner();
    info!("Checked {} files in {:?}", paths.len(), start.elapsed());
    println!("{} of {} files passed", paths.len() - failed, paths.len());

    if failed > 0 {
        Err(anyhow!("{failed} files failed"))
    } else {
        Ok(())
    }
}

fn check_file(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let bundle = Bundle::from_bytes(&bytes)?;

    // Files written in big endian or with trailing data won't match exactly.
    let mut writer = std::io::Cursor::new(Vec::new());
    let endian = if bytes[12] == 0x01 {
        Endian::Little
    } else {
        Endian::Big
    };
    bundle.write_endian(&mut writer, endian)?;
    let new_bytes = writer.into_inner();

    if !bytes.starts_with(&new_bytes) {
        return Err(anyhow!("written bytes do not match original file"));
    }

    let new_bundle = Bundle::from_bytes(&new_bytes)?;
    if new_bundle != bundle {
        return Err(anyhow!("written bundle does not match original bundle"));
    }

    Ok(())
}

fn rewrite(
    input: &str,
    output: &str,
    big_endian: bool,
    remove_keys: &[String],
    key_values: &[(String, String)],
) -> Result<()> {
    let mut bundle = read_bundle(input)?;

    for key in remove_keys {
        let count = bundle.metadata_mut().remove(key);
        info!("Removed {count} entries for {key:?}");
    }

    // Null terminate text values like the standard KTX keys.
    for (key, value) in key_values {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        bundle.metadata_mut().push(key.as_str(), bytes)?;
    }

    let endian = if big_endian {
        Endian::Big
    } else {
        Endian::Little
    };

    let mut writer = BufWriter::new(std::fs::File::create(output)?);
    bundle.write_endian(&mut writer, endian)?;
    writer.flush()?;

    Ok(())
}
