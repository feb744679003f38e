/// jspr - a homoiconic JSON/YAML language evaluator
///
/// This library provides a tree-walking evaluator for JSPR, a language whose
/// programs are ordinary JSON/YAML documents. Code and data share one value
/// representation: every expression is an atom, an ordered sequence, or a
/// string-keyed mapping, interpreted as code or data depending on its shape.
///
/// # Architecture
///
/// The evaluator is organized leaves-first, mirroring spec.md §2:
///
/// 1. **Value model** (`value` module) — the tagged union shared by code and
///    data, plus the `Arguments`/`KeywordSequence` call-site shapes.
/// 2. **Environment** (`environment` module) — lexically-scoped name tables
///    with parent links and the snapshot-clone closures capture.
/// 3. **Key normalizer** (`key_normalizer` module) — rewrites mapping keys
///    bearing trailing sigils (`'`, `` ` ``, `:`, `=`) into canonical
///    `(name, expression)` pairs.
/// 4. **Reducer** (`eval` module) — `eval(expr, env)`, the dispatcher that
///    drives everything else.
/// 5. **Callables** (`callable` module) — Function, SpecialForm, Closure,
///    Macro, Module: the tagged sum of argument-evaluation policies.
/// 6. **Kernel** (`kernel` module) — registration of every built-in special
///    form and function `load_kernel` installs into a root environment.
///
/// # Example
///
/// ```rust
/// use jspr::{environment::Environment, eval::eval, kernel::load_kernel, value::Value};
///
/// let env = Environment::new();
/// load_kernel(&env);
///
/// let expr = Value::sequence(vec![Value::string("+"), Value::Int(3), Value::Int(4)]);
/// assert_eq!(eval(&expr, &env).unwrap(), Value::Int(7));
/// ```
///
/// # Error handling
///
/// Every fallible operation returns `error::JsprResult<Value>`; a raised
/// error always carries a JSPR `Value` payload shaped `[kind, ...context]`
/// (spec.md §7).
pub mod callable;
pub mod document;
pub mod environment;
pub mod error;
pub mod eval;
pub mod kernel;
pub mod key_normalizer;
pub mod repl;
pub mod value;

pub use callable::Callable;
pub use environment::Environment;
pub use error::{JsprError, JsprResult};
pub use eval::eval;
pub use kernel::load_kernel;
pub use value::{Arguments, KeywordSequence, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn root() -> Environment {
        let env = Environment::new();
        load_kernel(&env);
        env
    }

    #[test]
    fn scenario_arithmetic() {
        let env = root();
        let expr = Value::sequence(vec![Value::string("+"), Value::Int(3), Value::Int(4)]);
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(7));
    }

    fn one_entry_map(key: &str, value: Value) -> Value {
        let mut m = IndexMap::new();
        m.insert(key.to_string(), value);
        Value::mapping(m)
    }

    /// spec.md §8 scenario 6: `{a=: [{do: [[{let: 'a'}, {"be'": [{foo:
    /// 'bar'}]}], '.a']}]}` binds `a` to `[{foo: bar}]`.
    #[test]
    fn scenario_auto_sequence_dash_sugar_binds_and_reads_back() {
        let env = root();

        let let_pair = one_entry_map("let", Value::string("a"));
        let quoted_data = Value::sequence(vec![one_entry_map("foo", Value::string("bar"))]);
        let be_pair = one_entry_map("be'", quoted_data);
        let let_call = Value::sequence(vec![let_pair, be_pair]);

        let do_args = Value::sequence(vec![let_call, Value::string(".a")]);
        let do_call = one_entry_map("do", do_args);
        let expr = Value::sequence(vec![do_call]);
        let definition = one_entry_map("a=", expr);

        let result = eval(&definition, &env).unwrap();
        let expected = Value::sequence(vec![one_entry_map("foo", Value::string("bar"))]);
        assert_eq!(result, expected);
        assert_eq!(env.lookup("a"), Some(expected));
    }
}
