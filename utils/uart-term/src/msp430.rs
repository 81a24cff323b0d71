//! Debug interfaces of the MSP430 debug probes (eZ-FET, MSP-FET).
//!
//! The probes expose their debug channel as an ordinary CDC ACM device, the
//! only reliable way to tell it apart from the board UART is to ask the TI
//! `libmsp430.so` driver which interfaces it owns.

use std::{
    ffi::{c_char, CStr},
    fs,
    path::{Path, PathBuf},
    ptr,
};

use anyhow::bail;
use libloading::{Library, Symbol};

pub const LIBRARY_NAME: &str = "libmsp430.so";

const STATUS_OK: i32 = 0;

type GetNumberOfUsbIfs = unsafe extern "C" fn(number: *mut i32) -> i32;
type GetNameOfUsbIf =
    unsafe extern "C" fn(idx: i32, name: *mut *mut c_char, status: *mut i32) -> i32;
type ErrorNumber = unsafe extern "C" fn() -> i32;

/// Returns the driver library paths to try, in order.
///
/// The bare library name goes through the dynamic linker search path, then
/// come the drivers of the Code Composer Studio installations in `~/ti`.
pub fn library_candidates(home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LIBRARY_NAME)];
    if let Some(home) = home {
        candidates.extend(ccs_libraries(&home.join("ti")));
    }
    candidates
}

// Expands `<ti_dir>/*/ccs/ccs_base/DebugServer/drivers/libmsp430.so`.
fn ccs_libraries(ti_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(ti_dir) else {
        return Vec::new();
    };

    let mut libraries: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| {
            entry
                .path()
                .join("ccs/ccs_base/DebugServer/drivers")
                .join(LIBRARY_NAME)
        })
        .filter(|path| path.is_file())
        .collect();
    libraries.sort();
    libraries
}

fn load_library(candidates: &[PathBuf]) -> Option<Library> {
    candidates.iter().find_map(|candidate| {
        // Safety: loading the TI driver runs no initialization routines that
        // could break the process.
        match unsafe { Library::new(candidate) } {
            Ok(library) => Some(library),
            Err(err) => {
                log::debug!("Unable to load {}: {}", candidate.display(), err);
                None
            }
        }
    })
}

unsafe fn query_interfaces(library: &Library) -> anyhow::Result<Vec<String>> {
    let get_number: Symbol<GetNumberOfUsbIfs> = library.get(b"MSP430_GetNumberOfUsbIfs\0")?;
    let get_name: Symbol<GetNameOfUsbIf> = library.get(b"MSP430_GetNameOfUsbIf\0")?;
    let error_number: Symbol<ErrorNumber> = library.get(b"MSP430_Error_Number\0")?;

    let mut number = 0;
    if get_number(&mut number) != STATUS_OK {
        bail!(
            "Could not determine number of USB interfaces, error {}",
            error_number()
        );
    }

    let mut names = Vec::new();
    for idx in 0..number {
        let mut name: *mut c_char = ptr::null_mut();
        let mut status = 0;
        if get_name(idx, &mut name, &mut status) != STATUS_OK || name.is_null() {
            log::error!(
                "Could not obtain port name of USB interface {}, error {}",
                idx,
                error_number()
            );
            continue;
        }
        names.push(CStr::from_ptr(name).to_string_lossy().into_owned());
    }

    log::debug!(
        "Found {} USB debugging interfaces: {}",
        number,
        names.join(", ")
    );
    Ok(names)
}

/// Lists the device names (`ttyACM0`) of the attached MSP430 debug interfaces.
///
/// Returns an empty list if the driver library is not installed.
pub fn debug_interfaces() -> Vec<String> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let Some(library) = load_library(&library_candidates(home.as_deref())) else {
        log::info!(
            "{} is not found, skipping detection of MSP430 debugging interfaces",
            LIBRARY_NAME
        );
        return Vec::new();
    };

    match unsafe { query_interfaces(&library) } {
        Ok(names) => names,
        Err(err) => {
            log::error!("{:#}", err);
            Vec::new()
        }
    }
}

/// Drops the serial devices that link to one of the debug interfaces.
///
/// `resolve` returns the target of a `/dev/serial/by-id` link.
pub fn skip_debug_interfaces<F>(
    candidates: Vec<PathBuf>,
    interfaces: &[String],
    mut resolve: F,
) -> anyhow::Result<Vec<PathBuf>>
where
    F: FnMut(&Path) -> anyhow::Result<PathBuf>,
{
    if interfaces.is_empty() {
        return Ok(candidates);
    }

    let mut ports = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let target = resolve(&candidate)?;
        let is_debug = target
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| interfaces.iter().any(|interface| interface == name));

        if is_debug {
            log::info!(
                "{} ({}) is an MSP430 debugging interface, skipping",
                candidate.display(),
                target.display()
            );
        } else {
            ports.push(candidate);
        }
    }
    Ok(ports)
}
