//! Built-in callables shipped with the host.

use serde::Deserialize;
use serde_json::{Number, Value, json};

use super::{CallFut, Callable, CallableError, CallableRegistry, parse_args};

#[derive(Debug, Deserialize)]
struct GreetArgs {
    name: String,
}

/// `greet(env, args) = "hello " + args.name`
pub struct GreetFunction;

impl Callable for GreetFunction {
    fn name(&self) -> &str {
        "greet"
    }

    fn description(&self) -> &str {
        "Greet someone by name"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Who to greet" }
            },
            "required": ["name"]
        })
    }

    fn call<'a>(&'a self, _env: Value, args: Value) -> CallFut<'a> {
        Box::pin(async move {
            let typed: GreetArgs = parse_args(args)?;
            Ok(Value::String(format!("hello {}", typed.name)))
        })
    }
}

#[derive(Debug, Deserialize)]
struct AddArgs {
    a: Number,
    b: Number,
}

/// Asynchronous `args.a + args.b`.
///
/// Integer operands stay integers; anything else is summed as `f64`.
pub struct AddFunction;

impl AddFunction {
    fn sum(&self, a: &Number, b: &Number) -> Result<Number, CallableError> {
        if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
            return a
                .checked_add(b)
                .map(Number::from)
                .ok_or_else(|| CallableError::failed(self.name(), "integer overflow"));
        }
        let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) else {
            return Err(CallableError::failed(self.name(), "operands are not numbers"));
        };
        integral_or_float(a + b)
            .ok_or_else(|| CallableError::failed(self.name(), "sum is not a finite number"))
    }
}

/// Largest magnitude below which every integral `f64` is exact in `i64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Integral sums encode without a fractional part (`5`, not `5.0`).
#[allow(clippy::cast_possible_truncation)]
fn integral_or_float(sum: f64) -> Option<Number> {
    if sum.is_finite() && sum.fract() == 0.0 && sum.abs() < MAX_SAFE_INTEGER {
        Some(Number::from(sum as i64))
    } else {
        Number::from_f64(sum)
    }
}

impl Callable for AddFunction {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two numbers"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" }
            },
            "required": ["a", "b"]
        })
    }

    fn call<'a>(&'a self, _env: Value, args: Value) -> CallFut<'a> {
        Box::pin(async move {
            let typed: AddArgs = parse_args(args)?;
            tokio::task::yield_now().await;
            self.sum(&typed.a, &typed.b).map(Value::Number)
        })
    }
}

/// Returns both inputs untouched.
pub struct EchoFunction;

impl Callable for EchoFunction {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Return the environment and arguments as received"
    }

    fn call<'a>(&'a self, env: Value, args: Value) -> CallFut<'a> {
        Box::pin(async move { Ok(json!({ "env": env, "args": args })) })
    }
}

#[derive(Debug, Deserialize)]
struct EnvGetArgs {
    key: String,
}

/// Looks up `args.key` in the environment object; missing keys are null.
pub struct EnvGetFunction;

impl Callable for EnvGetFunction {
    fn name(&self) -> &str {
        "env_get"
    }

    fn description(&self) -> &str {
        "Read a single key from the environment payload"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" }
            },
            "required": ["key"]
        })
    }

    fn call<'a>(&'a self, env: Value, args: Value) -> CallFut<'a> {
        Box::pin(async move {
            let typed: EnvGetArgs = parse_args(args)?;
            Ok(env.get(&typed.key).cloned().unwrap_or(Value::Null))
        })
    }
}

pub fn register_builtins(registry: &mut CallableRegistry) -> Result<(), CallableError> {
    registry.register(Box::new(GreetFunction))?;
    registry.register(Box::new(AddFunction))?;
    registry.register(Box::new(EchoFunction))?;
    registry.register(Box::new(EnvGetFunction))?;
    Ok(())
}
