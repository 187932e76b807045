//! Handler engine: compiles handler modules and invokes their entry point.
//!
//! A handler module is a Rhai script defining `fn handler(req)` (returns a
//! response) or `fn handler(req, res)` (writes into the legacy builder).
//! The calling convention is detected once, when the module is compiled,
//! and recorded as a [`HandlerKind`].

use crate::error::{ScriptError, ScriptResult};
use crate::request::EdgeRequest;
use crate::response::{ResponseBuilder, ResponseValue, response_from_map};
use crate::state::StateHandle;
use crate::{convert, request, response, state, stdlib};
use edge_kernel::gateway::{AdaptedRequest, HandlerOutput, ReturnedValue};
use rhai::{AST, CallFnOptions, Dynamic, Engine, Map, Scope};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Name of the function every handler module must define.
pub const ENTRY_POINT: &str = "handler";

// ============================================================================
// Limits
// ============================================================================

/// Operation budgets applied to every handler run.
///
/// These bound runaway scripts by work done, not by wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptLimits {
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
    /// Nesting depth of expressions at the top level of a module.
    pub max_expr_depth: usize,
    /// Nesting depth of expressions inside function bodies.
    pub max_function_expr_depth: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 1_000_000,
            max_call_levels: 64,
            max_string_size: 1024 * 1024,
            max_array_size: 10_000,
            max_map_size: 10_000,
            max_expr_depth: 128,
            max_function_expr_depth: 64,
        }
    }
}

// ============================================================================
// Compiled modules
// ============================================================================

/// The function a handler module exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
}

/// Calling convention of a handler module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    /// `handler(req)`: the return value is the response.
    ReturnsResponse(EntryPoint),
    /// `handler(req, res)`: the handler writes into `res`.
    WritesResponse(EntryPoint),
}

impl HandlerKind {
    pub fn entry_point(&self) -> &EntryPoint {
        match self {
            HandlerKind::ReturnsResponse(entry) | HandlerKind::WritesResponse(entry) => entry,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HandlerKind::ReturnsResponse(_) => "returns-response",
            HandlerKind::WritesResponse(_) => "writes-response",
        }
    }
}

/// One compiled version of a handler module file.
#[derive(Debug)]
pub struct HandlerModule {
    pub path: PathBuf,
    /// Starts at 1 and grows each time the file's content changes.
    pub version: u64,
    /// Hex SHA-256 of the source this version was compiled from.
    pub digest: String,
    pub kind: HandlerKind,
    ast: AST,
}

impl HandlerModule {
    pub fn ast(&self) -> &AST {
        &self.ast
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Shared, thread-safe handler engine.
pub struct HandlerEngine {
    engine: Engine,
    limits: ScriptLimits,
}

impl Default for HandlerEngine {
    fn default() -> Self {
        Self::new(ScriptLimits::default())
    }
}

impl HandlerEngine {
    pub fn new(limits: ScriptLimits) -> Self {
        let mut engine = Engine::new();
        Self::apply_limits(&mut engine, &limits);
        stdlib::register(&mut engine);
        request::register(&mut engine);
        response::register(&mut engine);
        state::register(&mut engine);
        Self { engine, limits }
    }

    fn apply_limits(engine: &mut Engine, limits: &ScriptLimits) {
        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
    }

    pub fn limits(&self) -> &ScriptLimits {
        &self.limits
    }

    /// Compile a module's source and detect its calling convention.
    pub fn compile(
        &self,
        path: &Path,
        source: &str,
        digest: impl Into<String>,
        version: u64,
    ) -> ScriptResult<HandlerModule> {
        let module_name = path.display().to_string();
        let mut ast = self
            .engine
            .compile(source)
            .map_err(|e| ScriptError::Compile {
                path: module_name.clone(),
                message: e.to_string(),
            })?;
        ast.set_source(module_name.as_str());
        let kind = detect_kind(&module_name, &ast)?;
        debug!(module = %module_name, version, kind = kind.label(), "Handler module compiled");

        Ok(HandlerModule {
            path: path.to_path_buf(),
            version,
            digest: digest.into(),
            kind,
            ast,
        })
    }

    /// Run one request through a compiled module.
    ///
    /// The module's top-level statements run first, in a fresh scope; a
    /// failure there is reported as [`ScriptError::Evaluate`]. The entry
    /// point is then called according to the module's [`HandlerKind`].
    /// Blocks the calling thread for as long as the handler runs.
    pub fn invoke(
        &self,
        module: &HandlerModule,
        request: Arc<AdaptedRequest>,
        state: StateHandle,
    ) -> ScriptResult<HandlerOutput> {
        let mut scope = Scope::new();
        self.engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &module.ast)
            .map_err(ScriptError::evaluate)?;

        let req = EdgeRequest::new(request, state);
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);

        match &module.kind {
            HandlerKind::ReturnsResponse(entry) => {
                let value: Dynamic = self
                    .engine
                    .call_fn_with_options(options, &mut scope, &module.ast, &entry.name, (req,))
                    .map_err(ScriptError::runtime)?;
                Ok(HandlerOutput::returned(classify(value)))
            }
            HandlerKind::WritesResponse(entry) => {
                let res = ResponseBuilder::new();
                let value: Dynamic = self
                    .engine
                    .call_fn_with_options(
                        options,
                        &mut scope,
                        &module.ast,
                        &entry.name,
                        (req, res.clone()),
                    )
                    .map_err(ScriptError::runtime)?;
                let record = res.snapshot();
                Ok(HandlerOutput {
                    returned: classify(value),
                    record: record.touched.then_some(record),
                })
            }
        }
    }
}

fn detect_kind(path: &str, ast: &AST) -> ScriptResult<HandlerKind> {
    let arities: Vec<usize> = ast
        .iter_functions()
        .filter(|f| f.name == ENTRY_POINT)
        .map(|f| f.params.len())
        .collect();

    let entry = || EntryPoint {
        name: ENTRY_POINT.to_string(),
    };
    if arities.contains(&1) {
        Ok(HandlerKind::ReturnsResponse(entry()))
    } else if arities.contains(&2) {
        Ok(HandlerKind::WritesResponse(entry()))
    } else if let Some(&arity) = arities.first() {
        Err(ScriptError::UnsupportedArity {
            path: path.to_string(),
            arity,
        })
    } else {
        Err(ScriptError::MissingEntryPoint(path.to_string()))
    }
}

/// Sort whatever the entry point returned into the shapes the translator
/// understands.
fn classify(value: Dynamic) -> ReturnedValue {
    if value.is_unit() || value.is::<ResponseBuilder>() {
        return ReturnedValue::Nothing;
    }
    if value.is::<ResponseValue>() {
        return match value.try_cast::<ResponseValue>() {
            Some(response) => ReturnedValue::Response(response.into_returned()),
            None => ReturnedValue::Nothing,
        };
    }
    if let Some(map) = value.read_lock::<Map>() {
        if let Some(response) = response_from_map(&map) {
            return ReturnedValue::Response(response);
        }
    }
    ReturnedValue::Value(convert::dynamic_to_json(&value))
}

// ============================================================================
// Tests
// ============================================================================
