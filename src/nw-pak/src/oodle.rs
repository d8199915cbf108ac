//! Oodle decompression ports
//!
//! Entries that are neither stored nor deflated hold a single Oodle block
//! whose decoded length is the entry's uncompressed size. Decoding is done
//! by whatever [`OodleDecompressor`] the [`Extractor`](crate::Extractor) was
//! built with:
//! - [`OozextractBackend`]: built-in pure Rust decoder (default)
//! - `NativeBackend`: `OodleLZ_Decompress` from the game's DLL (Windows only)
//! - [`ExecBackend`]: an external helper process, e.g. the DLL under Wine
//!
//! Backends only fill a caller-owned buffer. Sizing that buffer, bounding
//! it by [`MAX_ENTRY_SIZE`] and checking the decoded length all happen once
//! in [`OodleDecompressor::decompress`].

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use crate::{Error, Result, MAX_ENTRY_SIZE};

/// Decoder for one Oodle block
pub trait OodleDecompressor: Send + Sync {
    /// Decode `compressed` into `output`
    ///
    /// Returns the decoded length. A backend that can tell the block decodes
    /// to more than `output.len()` bytes reports the full length.
    fn decode(&self, compressed: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Decode an entry payload that must come out at exactly `size` bytes
    fn decompress(&self, compressed: &[u8], size: usize) -> Result<Vec<u8>> {
        let mut output = output_buffer(size)?;
        let actual = self.decode(compressed, &mut output)?;
        if actual != size {
            return Err(Error::DecompressionSize {
                expected: size,
                actual,
            });
        }
        Ok(output)
    }
}

/// Zeroed buffer for a decoded entry, refusing sizes no real entry has
pub(crate) fn output_buffer(size: usize) -> Result<Vec<u8>> {
    if size as u64 > MAX_ENTRY_SIZE {
        return Err(Error::Decompression(format!(
            "entry claims {} bytes, limit is {}",
            size, MAX_ENTRY_SIZE
        )));
    }

    let mut output = Vec::new();
    output
        .try_reserve_exact(size)
        .map_err(|e| Error::Decompression(format!("cannot allocate {} bytes: {}", size, e)))?;
    output.resize(size, 0);
    Ok(output)
}

/// Built-in decoder
///
/// `oozextract::Extractor` keeps scratch state between calls, so workers
/// take turns on one instance.
pub struct OozextractBackend {
    decoder: Mutex<oozextract::Extractor>,
}

impl OozextractBackend {
    pub fn new() -> Self {
        Self {
            decoder: Mutex::new(oozextract::Extractor::new()),
        }
    }
}

impl Default for OozextractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OodleDecompressor for OozextractBackend {
    fn decode(&self, compressed: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut decoder = self
            .decoder
            .lock()
            .map_err(|_| Error::Decompression("oozextract: decoder lock poisoned".into()))?;
        decoder
            .read_from_slice(compressed, output)
            .map_err(|e| Error::Decompression(format!("oozextract: {:?}", e)))
    }

    fn name(&self) -> &'static str {
        "oozextract"
    }
}

#[cfg(target_os = "windows")]
pub use native::NativeBackend;

#[cfg(target_os = "windows")]
mod native {
    use std::ffi::c_void;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use super::OodleDecompressor;
    use crate::{Error, Result};

    // OodleLZ_Decompress(comp, comp_len, raw, raw_len, fuzz, crc, verbosity,
    //     dec_base, dec_size, cb, cb_data, mem, mem_size, thread_phase)
    type DecompressFn = unsafe extern "C" fn(
        *const u8,
        isize,
        *mut u8,
        isize,
        i32,
        i32,
        i32,
        *mut u8,
        isize,
        *mut c_void,
        *mut c_void,
        *mut u8,
        isize,
        i32,
    ) -> isize;

    /// Both decoder thread phases in one call
    const THREAD_PHASE_ALL: i32 = 3;

    /// `OodleLZ_Decompress` resolved from a DLL such as `oo2core_8_win64.dll`
    pub struct NativeBackend {
        decompress: DecompressFn,
    }

    impl NativeBackend {
        pub fn load(dll: &Path) -> Result<Self> {
            let wide: Vec<u16> = dll
                .as_os_str()
                .encode_wide()
                .chain(std::iter::once(0))
                .collect();
            let symbol = b"OodleLZ_Decompress\0";

            // The module stays loaded for the life of the process
            let decompress = unsafe {
                let module = winapi::um::libloaderapi::LoadLibraryW(wide.as_ptr());
                if module.is_null() {
                    return Err(Error::Decompression(format!(
                        "cannot load {}",
                        dll.display()
                    )));
                }
                let proc = winapi::um::libloaderapi::GetProcAddress(
                    module,
                    symbol.as_ptr() as *const i8,
                );
                if proc.is_null() {
                    return Err(Error::Decompression(format!(
                        "{} does not export OodleLZ_Decompress",
                        dll.display()
                    )));
                }
                std::mem::transmute::<_, DecompressFn>(proc)
            };

            Ok(Self { decompress })
        }
    }

    impl OodleDecompressor for NativeBackend {
        fn decode(&self, compressed: &[u8], output: &mut [u8]) -> Result<usize> {
            let decoded = unsafe {
                (self.decompress)(
                    compressed.as_ptr(),
                    compressed.len() as isize,
                    output.as_mut_ptr(),
                    output.len() as isize,
                    0,
                    0,
                    0,
                    std::ptr::null_mut(),
                    0,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                    0,
                    THREAD_PHASE_ALL,
                )
            };
            usize::try_from(decoded).map_err(|_| {
                Error::Decompression(format!("OodleLZ_Decompress returned {}", decoded))
            })
        }

        fn name(&self) -> &'static str {
            "native"
        }
    }
}

/// Oodle helper run as a child process, one process per block
///
/// Invoked as `<program> [args..] decompress <size>` with the block on
/// stdin; the decoded bytes are read from stdout. A non-zero exit status
/// fails the block and carries the helper's stderr into the error.
#[derive(Debug)]
pub struct ExecBackend {
    program: String,
    args: Vec<String>,
}

impl ExecBackend {
    /// Split a command line such as `wine oodle_helper.exe` into program and arguments
    pub fn new(command: &str) -> Result<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| Error::Decompression("empty Oodle helper command".into()))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    fn spawn(&self, size: usize) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .arg("decompress")
            .arg(size.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Decompression(format!("cannot start {}: {}", self.program, e)))
    }
}

impl OodleDecompressor for ExecBackend {
    fn decode(&self, compressed: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut child = self.spawn(output.len())?;
        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Decompression(format!("{}: stdout not captured", self.program)))?;

        // Feed stdin and drain stderr while stdout is read, so no pipe fills up
        let (decoded, fed, messages) = std::thread::scope(|scope| {
            let feeder = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(compressed),
                None => Ok(()),
            });
            let drainer = scope.spawn(move || {
                let mut text = String::new();
                if let Some(mut stderr) = stderr {
                    let _ = stderr.read_to_string(&mut text);
                }
                text
            });

            let decoded = read_decoded(&mut stdout, output);
            let fed = feeder.join().unwrap_or_else(|_| Err(io::ErrorKind::Other.into()));
            (decoded, fed, drainer.join().unwrap_or_default())
        });

        let status = child
            .wait()
            .map_err(|e| Error::Decompression(format!("{}: {}", self.program, e)))?;
        if !status.success() {
            return Err(Error::Decompression(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                messages.trim()
            )));
        }

        fed.map_err(|e| Error::Decompression(format!("{}: writing block: {}", self.program, e)))?;
        decoded.map_err(|e| Error::Decompression(format!("{}: reading output: {}", self.program, e)))
    }

    fn name(&self) -> &'static str {
        "exec"
    }
}

/// Fill `output` from `reader`, counting (and discarding) any bytes past its end
fn read_decoded<R: Read>(reader: &mut R, output: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < output.len() {
        match reader.read(&mut output[filled..]) {
            Ok(0) => return Ok(filled),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    let excess = io::copy(reader, &mut io::sink())?;
    Ok(filled + excess as usize)
}

/// The built-in decoder
pub fn default_backend() -> Box<dyn OodleDecompressor> {
    Box::new(OozextractBackend::new())
}

/// Decoder backed by the game's Oodle DLL
#[cfg(target_os = "windows")]
pub fn native_backend(dll: &Path) -> Result<Box<dyn OodleDecompressor>> {
    Ok(Box::new(NativeBackend::load(dll)?))
}

#[cfg(not(target_os = "windows"))]
pub fn native_backend(dll: &Path) -> Result<Box<dyn OodleDecompressor>> {
    Err(Error::Decompression(format!(
        "{}: loading the Oodle DLL needs Windows, use --oodle-exec with a helper instead",
        dll.display()
    )))
}

/// Decoder that runs `command` once per block
pub fn exec_backend(command: &str) -> Result<Box<dyn OodleDecompressor>> {
    Ok(Box::new(ExecBackend::new(command)?))
}
