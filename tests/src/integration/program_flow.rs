//! Deploy / compile / call lifecycle against a live chain.

#![cfg(test)]

use super::harness::{call_program, deploy_module, echo_module, init_chain, keccak_module};
use shared_types::{keccak256, Address};
use sr_03_programs::ProgramError;

#[test]
fn deploy_compile_call_keccak() {
    let (state, db) = init_chain();
    let program = Address::new([0x42; 20]);
    deploy_module(&db, program, &keccak_module());

    // calling before compiling is rejected
    let mut gas = 1_000_000;
    assert_eq!(
        call_program(&state, &db, program, b"input", &mut gas, false),
        Err(ProgramError::NotCompiled)
    );

    // compile, then the call returns the known hash
    state.programs().compile_program(&db, program, false).unwrap();
    let input = b"hello stratum";
    let mut gas = 1_000_000;
    let output = call_program(&state, &db, program, input, &mut gas, false).unwrap();
    assert_eq!(output, keccak256(input).as_bytes());
    assert!(gas < 1_000_000);
}

#[test]
fn compile_is_monotone_per_engine_version() {
    let (state, db) = init_chain();
    let program = Address::new([0x43; 20]);
    deploy_module(&db, program, &echo_module());

    state.programs().compile_program(&db, program, false).unwrap();
    // a second compile at the same version does no redundant work
    assert_eq!(
        state.programs().compile_program(&db, program, false),
        Err(ProgramError::UpToDate)
    );

    // a version bump makes the same call succeed again
    state.programs().set_engine_version(2).unwrap();
    assert_eq!(
        state.programs().compile_program(&db, program, false).unwrap(),
        2
    );
}

#[test]
fn stale_programs_are_rejected_until_recompiled() {
    let (state, db) = init_chain();
    let program = Address::new([0x44; 20]);
    deploy_module(&db, program, &echo_module());
    state.programs().compile_program(&db, program, false).unwrap();

    // any mismatch between recorded and live version rejects the call
    for live in [2u32, 3, 9] {
        state.programs().set_engine_version(live).unwrap();
        let mut gas = 1_000_000;
        assert_eq!(
            call_program(&state, &db, program, b"x", &mut gas, false),
            Err(ProgramError::OutOfDate { recorded: 1, live })
        );
    }

    // recompiling at the live version restores callability
    state.programs().compile_program(&db, program, false).unwrap();
    let mut gas = 1_000_000;
    let output = call_program(&state, &db, program, b"still here", &mut gas, false).unwrap();
    assert_eq!(output, b"still here");
}

#[test]
fn artifacts_are_kept_per_version() {
    let (state, db) = init_chain();
    let program = Address::new([0x45; 20]);
    deploy_module(&db, program, &echo_module());
    state.programs().compile_program(&db, program, false).unwrap();
    state.programs().set_engine_version(2).unwrap();
    state.programs().compile_program(&db, program, false).unwrap();

    // both generations remain in the append-only store
    let code_hash = db.code_hash(program);
    assert!(db.compiled_module(1, code_hash).is_some());
    assert!(db.compiled_module(2, code_hash).is_some());
}

#[test]
fn oversized_and_malformed_modules_fail_cleanly() {
    let (state, db) = init_chain();

    // plain EVM bytecode is not a module
    let evm_contract = Address::new([0x50; 20]);
    db.set_code(evm_contract, vec![0x60, 0x80, 0x60, 0x40]);
    assert_eq!(
        state.programs().compile_program(&db, evm_contract, false),
        Err(ProgramError::NotAModule)
    );

    // a module container with a corrupt body is malformed, not a panic
    let corrupt = Address::new([0x51; 20]);
    let mut code = sr_03_programs::MODULE_MAGIC.to_vec();
    code.extend_from_slice(b"garbage body");
    db.set_code(corrupt, code);
    assert!(matches!(
        state.programs().compile_program(&db, corrupt, false),
        Err(ProgramError::Malformed(_))
    ));
}

#[test]
fn program_version_is_tracked_per_address() {
    let (state, db) = init_chain();
    let a = Address::new([0x60; 20]);
    let b = Address::new([0x61; 20]);
    deploy_module(&db, a, &echo_module());
    deploy_module(&db, b, &keccak_module());

    state.programs().compile_program(&db, a, false).unwrap();
    assert_eq!(state.programs().program_version(a).unwrap(), 1);
    assert_eq!(state.programs().program_version(b).unwrap(), 0);
}
