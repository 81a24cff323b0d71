use std::{
    fmt::{self, Display},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use xshell::{cmd, Shell};

pub use uart_printf::DEFAULT_BAUD_RATE;

pub mod msp430;

/// Baud rate of the Cypress USB-UART bridges.
pub const CYPRESS_BAUD_RATE: u32 = 115_200;

// USB IDs from the XDS110 Windows driver INF files.
pub const XDS110_DEBUG_PORTS: &[&str] = &[
    // xds110_ports.inf
    r"USB\VID_0451&PID_BEF3&MI_03",
    r"USB\VID_0451&PID_BEF4&MI_03",
    r"USB\VID_1CBE&PID_029E&MI_03",
    r"USB\VID_1CBE&PID_02A5&MI_04",
    // xds110_cmsis20.inf
    r"USB\VID_1CBE&PID_02A5&MI_00",
    // xds110_debug.inf
    r"USB\VID_0451&PID_BEF3&MI_02",
    r"USB\VID_0451&PID_BEF4&MI_02",
    r"USB\VID_1CBE&PID_029E&MI_02",
    r"USB\VID_1CBE&PID_029F&MI_00",
    r"USB\VID_1CBE&PID_029F&MI_01",
];

// USB IDs from the CP210x driver INF file (slabvcp.inf), these bridges belong
// to lab equipment rather than to boards.
pub const CP210X_PORTS: &[&str] = &[
    r"USB\VID_10C4&PID_EA60&MI_00",
    r"USB\VID_10C4&PID_EA63&MI_00",
    r"USB\VID_10C4&PID_EA70&MI_00",
    r"USB\VID_10C4&PID_EA70&MI_01",
    r"USB\VID_10C4&PID_EA71&MI_00",
    r"USB\VID_10C4&PID_EA71&MI_01",
    r"USB\VID_10C4&PID_EA71&MI_02",
    r"USB\VID_10C4&PID_EA71&MI_03",
    r"USB\VID_10C4&PID_EA7A&MI_00",
    r"USB\VID_10C4&PID_EA7A&MI_01",
    r"USB\VID_10C4&PID_EA7B&MI_00",
    r"USB\VID_10C4&PID_EA7B&MI_01",
    r"USB\VID_10C4&PID_EA7B&MI_02",
    r"USB\VID_10C4&PID_EA7B&MI_03",
];

const SERIAL_BY_ID: &str = "/dev/serial/by-id";

/// Serial interfaces that never carry the board UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredPort {
    Xds110Debug,
    Cp210x,
}

/// USB interface identifier in the Windows driver notation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsbInterfaceId {
    pub vendor_id: Option<String>,
    pub model_id: Option<String>,
    pub interface_num: Option<String>,
}

impl UsbInterfaceId {
    /// Collects the interface identifier from the `udevadm info` output.
    pub fn from_udev_info(info: &str) -> Self {
        let mut id = Self::default();
        for line in info.lines() {
            let Some((_, entry)) = line.split_once(':') else {
                continue;
            };
            let Some((key, value)) = entry.trim().split_once('=') else {
                continue;
            };

            match key {
                "ID_VENDOR_ID" => id.vendor_id = Some(value.to_uppercase()),
                "ID_MODEL_ID" => id.model_id = Some(value.to_uppercase()),
                "ID_USB_INTERFACE_NUM" => id.interface_num = Some(value.to_owned()),
                _ => {}
            }
        }
        id
    }

    pub fn ignored_port(&self) -> Option<IgnoredPort> {
        let id = self.to_string();
        if XDS110_DEBUG_PORTS.contains(&id.as_str()) {
            Some(IgnoredPort::Xds110Debug)
        } else if CP210X_PORTS.contains(&id.as_str()) {
            Some(IgnoredPort::Cp210x)
        } else {
            None
        }
    }
}

impl Display for UsbInterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |value: &Option<String>| value.clone().unwrap_or_else(|| "None".to_owned());
        write!(
            f,
            r"USB\VID_{}&PID_{}&MI_{}",
            part(&self.vendor_id),
            part(&self.model_id),
            part(&self.interface_num)
        )
    }
}

/// Drops the debug probe interfaces from the candidate list.
pub fn filter_debug_ports<F>(
    candidates: Vec<PathBuf>,
    mut udev_info: F,
) -> anyhow::Result<Vec<PathBuf>>
where
    F: FnMut(&Path) -> anyhow::Result<String>,
{
    let mut ports = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let id = UsbInterfaceId::from_udev_info(&udev_info(candidate.as_path())?);
        log::debug!("Full ID of {}: {}", candidate.display(), id);

        match id.ignored_port() {
            Some(IgnoredPort::Xds110Debug) => {
                log::info!(
                    "{} is an XDS110 debug port ({}), skipping",
                    candidate.display(),
                    id
                );
            }
            Some(IgnoredPort::Cp210x) => {
                log::info!("{} is a CP210x port ({}), skipping", candidate.display(), id);
            }
            None => ports.push(candidate),
        }
    }

    ports.sort();
    Ok(ports)
}

/// Picks the UART terminals out of the macOS `/dev` entries.
pub fn macos_candidates<I, S>(dev_dir: &Path, entries: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ports: Vec<_> = entries
        .into_iter()
        .filter(|name| {
            let name = name.as_ref();
            name.starts_with("cu.usbmodem") && name.ends_with("03")
        })
        .map(|name| dev_dir.join(name.as_ref()))
        .collect();
    ports.sort();
    ports
}

fn find_uart_linux(sh: &Shell) -> anyhow::Result<Vec<PathBuf>> {
    let dir = Path::new(SERIAL_BY_ID);
    if !dir.exists() {
        log::debug!("{} does not exist, no serial devices", SERIAL_BY_ID);
        return Ok(Vec::new());
    }

    let candidates = fs::read_dir(dir)
        .with_context(|| format!("Unable to list {}", SERIAL_BY_ID))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;

    let interfaces = msp430::debug_interfaces();
    let candidates = msp430::skip_debug_interfaces(candidates, &interfaces, |path| {
        fs::read_link(path).with_context(|| format!("Unable to resolve {}", path.display()))
    })?;

    filter_debug_ports(candidates, |path| {
        cmd!(sh, "udevadm info --name {path}")
            .read()
            .with_context(|| format!("Unable to query udev about {}", path.display()))
    })
}

fn find_uart_macos() -> anyhow::Result<Vec<PathBuf>> {
    let dir = Path::new("/dev");
    let names = fs::read_dir(dir)
        .context("Unable to list /dev")?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(macos_candidates(dir, names))
}

/// Returns the serial devices that may carry the board UART.
pub fn find_uart(sh: &Shell) -> anyhow::Result<Vec<PathBuf>> {
    match std::env::consts::OS {
        "linux" => find_uart_linux(sh),
        "macos" => find_uart_macos(),
        other => bail!("Serial device discovery is not supported on {}", other),
    }
}

/// Outcome of choosing a device among the discovered ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Index(usize),
    NoDevices,
    /// The user did not answer with a device index.
    Cancelled,
}

/// Chooses the device: the requested one, the only one, or the one the user
/// picks through `prompt` when there are several.
pub fn choose_device<F>(count: usize, index: Option<usize>, prompt: F) -> anyhow::Result<Choice>
where
    F: FnOnce() -> anyhow::Result<Option<usize>>,
{
    let index = match (index, count) {
        (_, 0) => return Ok(Choice::NoDevices),
        (Some(index), _) => index,
        (None, 1) => 0,
        (None, _) => match prompt()? {
            Some(index) => index,
            None => return Ok(Choice::Cancelled),
        },
    };

    if index >= count {
        bail!("There is no device with index {}", index);
    }
    Ok(Choice::Index(index))
}

/// Returns the baud rate the device is expected to talk at.
pub fn baud_rate_for(device: &Path) -> u32 {
    if device.to_string_lossy().contains("Cypress") {
        CYPRESS_BAUD_RATE
    } else {
        DEFAULT_BAUD_RATE
    }
}

/// Extracts the version from the `minicom -v` output.
pub fn parse_minicom_version(output: &str) -> Option<&str> {
    output.split_whitespace().nth(2)
}

/// Builds the minicom command line arguments.
pub fn minicom_args(device: &Path, baud_rate: u32, os: &str) -> Vec<String> {
    let mut args = vec![
        format!("--device={}", device.display()),
        "--baudrate".to_owned(),
        baud_rate.to_string(),
    ];
    if os == "macos" {
        // Enables the meta key on the macOS terminals.
        args.push("-m".to_owned());
    }
    args
}

/// Returns the installed minicom version.
pub fn minicom_version(sh: &Shell) -> anyhow::Result<String> {
    let output = cmd!(sh, "minicom -v")
        .ignore_status()
        .read()
        .context("Minicom is not installed")?;

    parse_minicom_version(&output)
        .map(ToOwned::to_owned)
        .with_context(|| format!("Unexpected minicom version output: {:?}", output))
}

/// Opens minicom on the device, returns when the user quits minicom.
pub fn open_minicom(sh: &Shell, device: &Path, baud_rate: u32) -> anyhow::Result<()> {
    let args = minicom_args(device, baud_rate, std::env::consts::OS);
    log::info!("Opening minicom with {:?}", args);

    cmd!(sh, "minicom {args...}").run()?;
    Ok(())
}
