//! sandboxed expression context for target rect evaluation
//!
//! one `ScriptContext` lives for a whole apply run. init scripts run into it
//! once; functions they define and top-level variables they declare stay
//! visible to every later expression. the monitor variables are pushed as
//! constants above that base and rewound before each rebinding.

use rhai::{Dynamic, Engine, Scope, AST};
use thiserror::Error;
use tracing::{debug, info};

use crate::display::LiveMonitor;
use crate::window::ProgramWindow;

/// variable holding the read-only snapshot of all discovered windows
pub const PROGRAM_WINDOWS_VAR: &str = "programWindows";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("{what} does not compile: {message}")]
    Compile { what: String, message: String },

    #[error("{what} failed: {message}")]
    Runtime { what: String, message: String },

    #[error("{what} evaluated to {type_name}, expected a number")]
    NotNumeric { what: String, type_name: String },

    #[error("{what} evaluated to {value}, which is not a usable coordinate")]
    OutOfRange { what: String, value: String },
}

/// per-monitor values bound before each window's expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorVars {
    pub dpi_x: i64,
    pub dpi_y: i64,
    pub width: i64,
    pub height: i64,
    pub work_area_width: i64,
    pub work_area_height: i64,
}

impl MonitorVars {
    pub fn of(monitor: &LiveMonitor) -> Self {
        Self {
            dpi_x: i64::from(monitor.dpi_x),
            dpi_y: i64::from(monitor.dpi_y),
            width: i64::from(monitor.monitor_rect.width()),
            height: i64::from(monitor.monitor_rect.height()),
            work_area_width: i64::from(monitor.work_area_rect.width()),
            work_area_height: i64::from(monitor.work_area_rect.height()),
        }
    }

    fn bindings(&self) -> [(&'static str, i64); 6] {
        [
            ("monitorDpiX", self.dpi_x),
            ("monitorDpiY", self.dpi_y),
            ("monitorWidth", self.width),
            ("monitorHeight", self.height),
            ("workAreaWidth", self.work_area_width),
            ("workAreaHeight", self.work_area_height),
        ]
    }
}

pub struct ScriptContext {
    engine: Engine,
    scope: Scope<'static>,
    /// functions accumulated from init scripts
    functions: AST,
    /// scope length below which entries persist across windows
    base_len: usize,
}

impl ScriptContext {
    /// fresh context exposing `windows` as the `programWindows` constant
    pub fn new(windows: &[ProgramWindow]) -> Result<Self, ScriptError> {
        let mut engine = Engine::new();
        configure_engine(&mut engine);

        let snapshot = rhai::serde::to_dynamic(windows).map_err(|e| ScriptError::Runtime {
            what: PROGRAM_WINDOWS_VAR.to_string(),
            message: e.to_string(),
        })?;

        let mut scope = Scope::new();
        scope.push_constant_dynamic(PROGRAM_WINDOWS_VAR, snapshot);
        let base_len = scope.len();

        Ok(Self {
            engine,
            scope,
            functions: AST::empty(),
            base_len,
        })
    }

    /// run one init script into the persistent context
    pub fn run_init_script(&mut self, index: usize, source: &str) -> Result<(), ScriptError> {
        let what = format!("engine init script #{}", index + 1);
        let ast = self.compile(&what, source)?;

        self.scope.rewind(self.base_len);
        let merged = self.functions.merge(&ast);
        self.engine
            .run_ast_with_scope(&mut self.scope, &merged)
            .map_err(|e| ScriptError::Runtime {
                what: what.clone(),
                message: e.to_string(),
            })?;

        self.functions.combine(ast.clone_functions_only());
        self.base_len = self.scope.len();
        debug!(script = index + 1, "init script executed");
        Ok(())
    }

    /// rebind the monitor variables for the next window
    pub fn bind_monitor(&mut self, vars: &MonitorVars) {
        self.scope.rewind(self.base_len);
        for (name, value) in vars.bindings() {
            self.scope.push_constant(name, value);
        }
    }

    /// evaluate `source` and truncate the numeric result to an integer
    pub fn eval_number(&mut self, what: &str, source: &str) -> Result<i32, ScriptError> {
        let ast = self.compile(what, source)?;
        let merged = self.functions.merge(&ast);
        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut self.scope, &merged)
            .map_err(|e| ScriptError::Runtime {
                what: what.to_string(),
                message: e.to_string(),
            })?;

        to_coordinate(what, &value)
    }

    /// check `source` parses, without running it
    pub fn check_compiles(what: &str, source: &str) -> Result<(), ScriptError> {
        let mut engine = Engine::new();
        configure_engine(&mut engine);
        engine
            .compile(source)
            .map(|_| ())
            .map_err(|e| ScriptError::Compile {
                what: what.to_string(),
                message: e.to_string(),
            })
    }

    fn compile(&self, what: &str, source: &str) -> Result<AST, ScriptError> {
        self.engine
            .compile(source)
            .map_err(|e| ScriptError::Compile {
                what: what.to_string(),
                message: e.to_string(),
            })
    }
}

fn configure_engine(engine: &mut Engine) {
    engine.on_print(|s| info!(target: "bwm::script", "{}", s));
    engine.on_debug(|s, src, pos| {
        debug!(target: "bwm::script", "{} @ {:?}:{:?}", s, src, pos);
    });

    // no operation limit: long-running user expressions are the user's call
    engine.set_max_call_levels(64);
    engine.set_max_expr_depths(128, 64);
}

fn to_coordinate(what: &str, value: &Dynamic) -> Result<i32, ScriptError> {
    let out_of_range = || ScriptError::OutOfRange {
        what: what.to_string(),
        value: value.to_string(),
    };

    if let Ok(int) = value.as_int() {
        return i32::try_from(int).map_err(|_| out_of_range());
    }
    if let Ok(float) = value.as_float() {
        let truncated = float.trunc();
        if !truncated.is_finite()
            || truncated < f64::from(i32::MIN)
            || truncated > f64::from(i32::MAX)
        {
            return Err(out_of_range());
        }
        return Ok(truncated as i32);
    }

    Err(ScriptError::NotNumeric {
        what: what.to_string(),
        type_name: value.type_name().to_string(),
    })
}
