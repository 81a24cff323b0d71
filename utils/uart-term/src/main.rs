use std::{io::Write, path::PathBuf};

use clap::{Parser, Subcommand};
use uart_term::{baud_rate_for, choose_device, find_uart, minicom_version, open_minicom, Choice};
use xshell::Shell;

/// Board serial terminal launcher
///
/// Finds the board UART among the host serial devices, skipping the debug
/// probe interfaces, and opens minicom on it.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = false)]
struct Cli {
    /// Actual command
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List serial devices that may carry the board UART
    List,
    /// Open minicom on the board UART
    Connect {
        /// Device path, discovered automatically if omitted
        #[arg(short, long, value_name = "PATH")]
        device: Option<PathBuf>,
        /// Index of the discovered device to connect to
        #[arg(short, long, conflicts_with = "device")]
        index: Option<usize>,
        /// Baud rate, chosen by the device type if omitted
        #[arg(short, long)]
        baud_rate: Option<u32>,
    },
}

fn prompt_device(devices: &[PathBuf]) -> anyhow::Result<Option<usize>> {
    print!("Device to connect [0..{}]: ", devices.len() - 1);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().parse().ok())
}

/// Picks the device to connect to, `None` means there is nothing to do.
fn select_device(sh: &Shell, index: Option<usize>) -> anyhow::Result<Option<PathBuf>> {
    let devices = find_uart(sh)?;

    println!("Found {} UART terminal(s)", devices.len());
    for (index, device) in devices.iter().enumerate() {
        println!("{}\t{}", index, device.display());
    }

    match choose_device(devices.len(), index, || prompt_device(&devices))? {
        Choice::Index(index) => Ok(Some(devices[index].clone())),
        Choice::NoDevices => {
            println!("No devices found");
            Ok(None)
        }
        Choice::Cancelled => {
            println!("Exit");
            Ok(None)
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let sh = Shell::new()?;
    match cli.command {
        Command::List => {
            for device in find_uart(&sh)? {
                println!("{}", device.display());
            }
        }

        Command::Connect {
            device,
            index,
            baud_rate,
        } => {
            let version = minicom_version(&sh)?;
            println!("Board UART connector (minicom version {})", version);

            let device = match device {
                Some(device) => device,
                None => match select_device(&sh, index)? {
                    Some(device) => device,
                    None => return Ok(()),
                },
            };

            let baud_rate = baud_rate.unwrap_or_else(|| baud_rate_for(&device));
            log::info!("Connecting to {} at {} baud", device.display(), baud_rate);
            open_minicom(&sh, &device, baud_rate)?;
        }
    }

    Ok(())
}
