//! # Module Container Codec
//!
//! Account code encoding for program modules: a 3-byte magic prefix
//! distinguishes a module from ordinary EVM bytecode, and the remaining
//! bytes are a zstd-compressed module. Decompression is bounded, so
//! oversized or malformed code is a normal recoverable error, never a
//! panic.

use crate::errors::ProgramError;
use shared_types::Bytes;
use std::io::Read;

/// Magic prefix marking account code as a compressed program module.
pub const MODULE_MAGIC: [u8; 3] = [0xEF, 0xF0, 0x00];

/// Maximum decompressed module size.
pub const MAX_MODULE_SIZE: usize = 64 * 1024;

/// Compression level for deployment encoding.
const COMPRESSION_LEVEL: i32 = 3;

/// True if `code` carries the module magic prefix.
#[must_use]
pub fn is_module_code(code: &[u8]) -> bool {
    code.len() > MODULE_MAGIC.len() && code[..MODULE_MAGIC.len()] == MODULE_MAGIC
}

/// Wraps raw module bytecode into deployable account code.
pub fn encode_module(module: &[u8]) -> Result<Bytes, ProgramError> {
    if module.len() > MAX_MODULE_SIZE {
        return Err(ProgramError::Oversized {
            limit: MAX_MODULE_SIZE,
        });
    }
    let compressed = zstd::encode_all(module, COMPRESSION_LEVEL)
        .map_err(|err| ProgramError::Malformed(err.to_string()))?;
    let mut code = Vec::with_capacity(MODULE_MAGIC.len() + compressed.len());
    code.extend_from_slice(&MODULE_MAGIC);
    code.extend_from_slice(&compressed);
    Ok(code)
}

/// Strips the magic prefix and decompresses the module body, bounded to
/// [`MAX_MODULE_SIZE`].
pub fn decode_module(code: &[u8]) -> Result<Bytes, ProgramError> {
    if !is_module_code(code) {
        return Err(ProgramError::NotAModule);
    }
    let body = &code[MODULE_MAGIC.len()..];
    let decoder =
        zstd::stream::Decoder::new(body).map_err(|err| ProgramError::Malformed(err.to_string()))?;
    let mut module = Vec::new();
    decoder
        .take(MAX_MODULE_SIZE as u64 + 1)
        .read_to_end(&mut module)
        .map_err(|err| ProgramError::Malformed(err.to_string()))?;
    if module.len() > MAX_MODULE_SIZE {
        return Err(ProgramError::Oversized {
            limit: MAX_MODULE_SIZE,
        });
    }
    Ok(module)
}

// =============================================================================
// TESTS
// =============================================================================
