//! Write protection under static-call context.

#![cfg(test)]

use super::harness::{call_program, deploy_module, init_chain, storage_module};
use shared_types::{Address, Hash};
use sr_03_programs::ProgramError;

#[test]
fn static_call_cannot_write_storage() {
    let (state, db) = init_chain();
    let program = Address::new([0x42; 20]);
    deploy_module(&db, program, &storage_module());
    state.programs().compile_program(&db, program, false).unwrap();

    let mut calldata = Vec::new();
    calldata.extend_from_slice(Hash::from_u64(0x77).as_bytes());
    calldata.extend_from_slice(Hash::from_u64(0xBEEF).as_bytes());

    let mut gas = 1_000_000;
    let err = call_program(&state, &db, program, &calldata, &mut gas, true).unwrap_err();
    let ProgramError::Revert(reason) = err else {
        panic!("expected a revert, got {err:?}");
    };
    assert_eq!(reason, b"write operation in static context");

    // no side effects happened: the slot was never written
    assert_eq!(db.get_state(program, Hash::from_u64(0x77)), Hash::ZERO);
}

#[test]
fn normal_call_writes_storage() {
    let (state, db) = init_chain();
    let program = Address::new([0x43; 20]);
    deploy_module(&db, program, &storage_module());
    state.programs().compile_program(&db, program, false).unwrap();

    let mut calldata = Vec::new();
    calldata.extend_from_slice(Hash::from_u64(0x01).as_bytes());
    calldata.extend_from_slice(Hash::from_u64(0x02).as_bytes());

    let mut gas = 1_000_000;
    let output = call_program(&state, &db, program, &calldata, &mut gas, false).unwrap();
    assert_eq!(output, Hash::from_u64(0x02).as_bytes());
    // the write landed in the program's own storage
    assert_eq!(
        db.get_state(program, Hash::from_u64(0x01)),
        Hash::from_u64(0x02)
    );
}
