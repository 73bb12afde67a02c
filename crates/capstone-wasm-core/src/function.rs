//! Lazily resolved module exports.
//!
//! The decoder's C ABI passes integers and pointers only, so every export is
//! called with a fixed number of `u64` arguments and yields one `u64` result.
//! Arguments are narrowed to the export's declared `i32`/`i64` parameter
//! types on the way in, and the result is zero-extended on the way out.

use tracing::trace;
use wasmtime::{Func, Val, ValType};

use crate::ModuleInstance;
use capstone_wasm_common::RuntimeError;

/// A handle to one exported function, resolved on first call.
///
/// A handle belongs to the instance it was first resolved against; using it
/// with another instance is a programming error.
#[derive(Debug, Clone)]
pub struct ExportedFunction {
    name: &'static str,
    func: Option<Func>,
}

impl ExportedFunction {
    /// Create an unresolved handle for the export called `name`.
    pub const fn new(name: &'static str) -> Self {
        Self { name, func: None }
    }

    /// Name of the export.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` once the export has been looked up.
    pub fn is_resolved(&self) -> bool {
        self.func.is_some()
    }

    /// Resolve the export, looking it up only the first time.
    ///
    /// # Panics
    ///
    /// Panics if the instance has no such function export. The set of exports
    /// is fixed at build time, so this is never a runtime condition.
    pub fn resolve(&mut self, instance: &mut ModuleInstance) -> Func {
        if let Some(func) = self.func {
            return func;
        }

        let func = instance
            .get_func(self.name)
            .unwrap_or_else(|| panic!("decoder module does not export `{}`", self.name));
        trace!(export = self.name, instance_id = %instance.id(), "Export resolved");

        *self.func.insert(func)
    }

    /// Call the export.
    ///
    /// # Panics
    ///
    /// Panics if the export is missing, its signature is not integer-only with
    /// exactly `N` parameters, or the call traps.
    pub fn call<const N: usize>(&mut self, instance: &mut ModuleInstance, args: [u64; N]) -> u64 {
        match self.try_call(instance, args) {
            Ok(result) => result,
            Err(e) => panic!("{e}"),
        }
    }

    /// Call the export, reporting a trap as an error instead of panicking.
    ///
    /// Used on cleanup paths that may run while already unwinding.
    ///
    /// # Panics
    ///
    /// Panics if the export is missing or its signature does not match.
    pub fn try_call<const N: usize>(
        &mut self,
        instance: &mut ModuleInstance,
        args: [u64; N],
    ) -> Result<u64, RuntimeError> {
        let func = self.resolve(instance);
        let ty = func.ty(instance.store());

        assert!(
            ty.params().len() == N,
            "`{}` takes {} arguments, called with {N}",
            self.name,
            ty.params().len()
        );

        let params: Vec<Val> = ty
            .params()
            .zip(args)
            .map(|(param, arg)| self.lower(&param, arg))
            .collect();
        let mut results = vec![Val::I32(0); ty.results().len()];

        func.call(instance.store_mut(), &params, &mut results)
            .map_err(|e| RuntimeError::trap(format!("`{}` trapped: {e:#}", self.name)))?;

        Ok(results.first().map_or(0, |val| self.lift(val)))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn lower(&self, ty: &ValType, arg: u64) -> Val {
        match ty {
            ValType::I32 => Val::I32(arg as u32 as i32),
            ValType::I64 => Val::I64(arg as i64),
            other => panic!("`{}` has non-integer parameter type {other}", self.name),
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn lift(&self, val: &Val) -> u64 {
        match val {
            Val::I32(v) => u64::from(*v as u32),
            Val::I64(v) => *v as u64,
            other => panic!("`{}` returned non-integer value {other:?}", self.name),
        }
    }
}
