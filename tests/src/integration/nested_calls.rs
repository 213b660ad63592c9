//! Programs calling programs through the call router.

#![cfg(test)]

use super::harness::{deploy_module, echo_module, init_chain, LoopbackRouter};
use shared_types::Address;
use sr_03_programs::{ExecutionScope, TxContext};
use sr_04_execution::asm::ModuleBuilder;
use sr_04_execution::vm::instr::op;
use sr_04_execution::EvmData;
use std::sync::Arc;

/// A module that forwards 4 bytes of its calldata to the address given in
/// its first 20 bytes, then returns the callee's return data.
fn forwarder_module() -> Vec<u8> {
    let mut builder = ModuleBuilder::new(1);
    // calldata: 20-byte target address || 4-byte payload
    builder.push(0).op(op::READ_ARGS);
    builder
        .push(0) // target address at memory 0
        .push(20) // payload right after it
        .push(4)
        .push(1024) // value pointer (a zero word)
        .push(u64::MAX); // forward all gas
    builder.op(op::CALL_CONTRACT).op(op::POP);
    builder.push(2048).push(0).push(4).op(op::READ_RETURN_DATA).op(op::POP);
    builder.push(2048).push(4).op(op::RETURN);
    builder.build()
}

#[test]
fn program_calls_another_program() {
    let (state, db) = init_chain();
    let callee = Address::new([0x21; 20]);
    let caller = Address::new([0x20; 20]);
    deploy_module(&db, callee, &echo_module());
    deploy_module(&db, caller, &forwarder_module());
    state.programs().compile_program(&db, callee, false).unwrap();
    state.programs().compile_program(&db, caller, false).unwrap();

    let mut calldata = callee.as_bytes().to_vec();
    calldata.extend_from_slice(b"ping");

    let tx = TxContext::new();
    let mut gas = 2_000_000;
    let mut scope = ExecutionScope {
        db: db.clone(),
        router: Arc::new(LoopbackRouter {
            db: db.clone(),
            tx: tx.clone(),
        }),
        tx,
        evm_data: EvmData::default(),
        read_only: false,
        debug: false,
        tracer: None,
        gas: &mut gas,
    };
    let output = state
        .programs()
        .call_program(&mut scope, caller, &calldata)
        .unwrap();
    assert_eq!(output, b"ping");
    drop(scope);
    // the nested call and its access costs came out of one budget
    assert!(gas < 2_000_000);
}
