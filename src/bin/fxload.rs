use clap::Parser;
use fxload::{Chip, Context, DecoderConfig, DeviceFilter, Loader, Records, Step, TargetFinder};
use log::{info, LevelFilter};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Download firmware into the RAM of an EZ-USB (AN21xx, FX, FX2, FX2LP) microcontroller.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Intel HEX firmware image.
    #[arg(value_name = "FILE")]
    image: PathBuf,

    /// Select the device by vendor and product ID, given as hex (e.g. 04b4:8613).
    #[arg(short = 'D', long, value_name = "VID:PID", value_parser = parse_ids)]
    device: Option<(u16, u16)>,

    /// Select the device by USB bus number.
    #[arg(long)]
    bus: Option<u8>,

    /// Select the device by USB device address.
    #[arg(long)]
    address: Option<u8>,

    /// Microcontroller family: an21, fx or fx2.
    #[arg(short = 't', long, default_value_t = Chip::Fx2)]
    chip: Chip,

    /// Accept images which end without an end-of-file record.
    #[arg(long)]
    permissive: bool,

    /// Increase verbosity (-v for debug, -vv for trace output).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_ids(s: &str) -> Result<(u16, u16), String> {
    let (vendor_id, product_id) = s
        .split_once(':')
        .ok_or_else(|| format!("expected VID:PID, got `{}`", s))?;
    let parse = |id: &str| {
        u16::from_str_radix(id.trim_start_matches("0x"), 16)
            .map_err(|e| format!("invalid ID `{}`: {}", id, e))
    };
    Ok((parse(vendor_id)?, parse(product_id)?))
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let filter = DeviceFilter {
        vendor_id: cli.device.map(|(vendor_id, _)| vendor_id),
        product_id: cli.device.map(|(_, product_id)| product_id),
        bus_number: cli.bus,
        address: cli.address,
    };

    let image = BufReader::new(File::open(&cli.image)?);
    let records = Records::with_config(
        image,
        DecoderConfig {
            strict_eof: !cli.permissive,
        },
    );

    let context = Context::new()?;
    let target = context.pick_target(&filter)?;
    info!("Using {}", target);
    let mut target_handle = target.open(&context)?;

    let mut bytes = 0;
    for step in Loader::new(cli.chip).start(&mut target_handle, records) {
        if let Step::Write { length, .. } = step? {
            bytes += length;
        }
    }

    info!("Loaded {} bytes from {}", bytes, cli.image.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("fxload: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_ids() {
        assert_eq!(parse_ids("04b4:8613"), Ok((0x04b4, 0x8613)));
        assert_eq!(parse_ids("0x0547:0x2131"), Ok((0x0547, 0x2131)));
        assert!(parse_ids("04b4").is_err());
        assert!(parse_ids("04b4:xyz").is_err());
    }

    #[test]
    fn command_line() {
        let cli = Cli::try_parse_from(["fxload", "-t", "an21", "--permissive", "-vv", "fw.ihx"])
            .unwrap();
        assert_eq!(cli.chip, Chip::An21);
        assert!(cli.permissive);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.device, None);
    }
}
