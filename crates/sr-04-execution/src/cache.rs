//! # Compiled-Module Cache
//!
//! Process-wide LRU over deserialized artifacts, keyed by
//! (engine version, code hash). The artifact store is write-once, so a
//! cached entry can never go stale; a version bump simply keys new
//! entries.

use crate::errors::CompileError;
use crate::vm::module::CompiledModule;
use lazy_static::lazy_static;
use lru::LruCache;
use parking_lot::Mutex;
use shared_types::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Modules kept hot at once.
const CACHE_ENTRIES: usize = 64;

lazy_static! {
    static ref MODULE_CACHE: Mutex<LruCache<(u32, Hash), Arc<CompiledModule>>> = Mutex::new(
        LruCache::new(NonZeroUsize::new(CACHE_ENTRIES).expect("cache capacity is nonzero"))
    );
}

/// Returns the cached module for (version, code hash), deserializing and
/// inserting it on a miss.
pub fn load(
    version: u32,
    code_hash: Hash,
    artifact: &[u8],
) -> Result<Arc<CompiledModule>, CompileError> {
    if let Some(module) = MODULE_CACHE.lock().get(&(version, code_hash)) {
        return Ok(module.clone());
    }
    let module: CompiledModule =
        bincode::deserialize(artifact).map_err(|err| CompileError::Decode(err.to_string()))?;
    let module = Arc::new(module);
    MODULE_CACHE.lock().put((version, code_hash), module.clone());
    Ok(module)
}

/// Empties the cache (tests and reorg handling).
pub fn clear() {
    MODULE_CACHE.lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompileParams;
    use crate::vm::instr::op;

    #[test]
    fn test_load_caches_deserialization() {
        let params = CompileParams {
            version: 1,
            page_limit: 128,
            debug: false,
        };
        let mut bytes = vec![crate::vm::module::FORMAT_VERSION, 0, 0, 1, 0];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(op::NOP);
        let module = CompiledModule::compile(&bytes, &params).unwrap();
        let artifact = bincode::serialize(&module).unwrap();

        let key = Hash::from_u64(0xCAFE);
        let first = load(1, key, &artifact).unwrap();
        // a second load returns the cached Arc even for garbage bytes
        let second = load(1, key, b"garbage").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_corrupt_artifact_is_an_error() {
        assert!(matches!(
            load(1, Hash::from_u64(0xBAD0), b"not bincode"),
            Err(CompileError::Decode(_))
        ));
    }
}
