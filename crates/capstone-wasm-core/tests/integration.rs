//! Integration tests for capstone-wasm-core.
//!
//! These tests exercise the bridge against small WAT modules:
//! - Lazy export resolution and caching
//! - Integer argument narrowing and result widening
//! - Traps on the checked and unchecked call paths
//! - Guest memory access through `MemoryAccess`

use capstone_wasm_common::{EngineConfig, RuntimeError};
use capstone_wasm_core::{DecoderRuntime, ExportedFunction, MemoryAccess, ModuleInstance};

const WAT: &str = r#"
    (module
        (memory (export "memory") 1)
        (data (i32.const 64) "hello\00world\00")
        (global $calls (mut i32) (i32.const 0))

        (func (export "add") (param i32 i32) (result i32)
            (global.set $calls (i32.add (global.get $calls) (i32.const 1)))
            (i32.add (local.get 0) (local.get 1)))

        (func (export "wide") (param i64) (result i64)
            (i64.add (local.get 0) (i64.const 1)))

        (func (export "negative") (result i32)
            (i32.const -1))

        (func (export "poke") (param $addr i32) (param $value i32)
            (i32.store8 (local.get $addr) (local.get $value)))

        (func (export "grow") (param $pages i32) (result i32)
            (memory.grow (local.get $pages)))

        (func (export "calls") (result i32) (global.get $calls))

        (func (export "boom") (param i32) (result i32)
            unreachable)

        (func (export "float") (param f32) (result i32)
            (i32.const 0))
    )
"#;

fn instance() -> ModuleInstance {
    let config = EngineConfig {
        cache_compiled_modules: false,
        ..Default::default()
    };
    DecoderRuntime::from_wat(&config, WAT)
        .unwrap()
        .instantiate()
        .unwrap()
}

// ============================================================================
// Test: Resolution
// ============================================================================

#[test]
fn test_export_resolved_once() {
    let mut instance = instance();
    let mut add = ExportedFunction::new("add");

    assert!(!add.is_resolved());
    assert_eq!(add.call(&mut instance, [2, 3]), 5);
    assert!(add.is_resolved());
    assert_eq!(add.call(&mut instance, [40, 2]), 42);

    // Both calls went to the same export.
    let mut calls = ExportedFunction::new("calls");
    assert_eq!(calls.call(&mut instance, []), 2);
}

#[test]
#[should_panic(expected = "does not export `cs_open`")]
fn test_missing_export_panics() {
    let mut instance = instance();
    ExportedFunction::new("cs_open").call(&mut instance, [0, 0, 0]);
}

#[test]
#[should_panic(expected = "takes 2 arguments, called with 1")]
fn test_arity_mismatch_panics() {
    let mut instance = instance();
    ExportedFunction::new("add").call(&mut instance, [1]);
}

#[test]
#[should_panic(expected = "non-integer parameter")]
fn test_float_parameter_panics() {
    let mut instance = instance();
    ExportedFunction::new("float").call(&mut instance, [0]);
}

// ============================================================================
// Test: Argument and Result Conversion
// ============================================================================

#[test]
fn test_i32_result_is_zero_extended() {
    let mut instance = instance();
    let result = ExportedFunction::new("negative").call(&mut instance, []);

    assert_eq!(result, 0xffff_ffff);
}

#[test]
fn test_i64_round_trip() {
    let mut instance = instance();
    let result = ExportedFunction::new("wide").call(&mut instance, [u64::from(u32::MAX)]);

    assert_eq!(result, 0x1_0000_0000);
}

#[test]
fn test_i32_argument_is_truncated() {
    let mut instance = instance();
    let result = ExportedFunction::new("add").call(&mut instance, [0x1_0000_0001, 1]);

    assert_eq!(result, 2);
}

#[test]
fn test_no_result_returns_zero() {
    let mut instance = instance();
    let result = ExportedFunction::new("poke").call(&mut instance, [128, 0x41]);

    assert_eq!(result, 0);
    assert_eq!(instance.memory().read_byte(128).unwrap(), 0x41);
}

// ============================================================================
// Test: Traps
// ============================================================================

#[test]
fn test_try_call_reports_trap() {
    let mut instance = instance();
    let err = ExportedFunction::new("boom")
        .try_call(&mut instance, [0])
        .unwrap_err();

    assert!(matches!(err, RuntimeError::Trap { .. }));
    assert!(err.to_string().contains("`boom` trapped"));
}

#[test]
#[should_panic(expected = "`boom` trapped")]
fn test_call_panics_on_trap() {
    let mut instance = instance();
    ExportedFunction::new("boom").call(&mut instance, [0]);
}

// ============================================================================
// Test: Guest Memory
// ============================================================================

#[test]
fn test_read_guest_cstrings() {
    let instance = instance();

    assert_eq!(instance.memory().read_cstring(64).unwrap(), b"hello");
    assert_eq!(instance.memory().read_cstring(70).unwrap(), b"world");
}

#[test]
fn test_memory_growth_is_visible() {
    let mut instance = instance();
    assert_eq!(instance.memory_size(), 65536);
    assert!(instance.memory().read_byte(65536).is_err());

    let previous = ExportedFunction::new("grow").call(&mut instance, [1]);

    assert_eq!(previous, 1);
    assert_eq!(instance.memory_size(), 2 * 65536);
    instance.memory_mut().write(65536, b"ok\0").unwrap();
    assert_eq!(instance.memory().read_cstring(65536).unwrap(), b"ok");
}
