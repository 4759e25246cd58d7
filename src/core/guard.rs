use crate::context::FlowContext;
use crate::core::StepKey;
use crate::core::cnpj;
use crate::core::value::Value;
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl GuardIssue {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn step(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for GuardIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Read-only view a guard is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    step: &'a StepKey,
    data: &'a IndexMap<String, Value>,
    flow: &'a FlowContext,
}

impl<'a> GuardContext<'a> {
    pub fn new(
        step: &'a StepKey,
        data: &'a IndexMap<String, Value>,
        flow: &'a FlowContext,
    ) -> Self {
        Self { step, data, flow }
    }

    pub fn step(&self) -> &StepKey {
        self.step
    }

    pub fn flow(&self) -> &FlowContext {
        self.flow
    }

    pub fn value(&self, field: &str) -> Option<&'a Value> {
        self.data.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&'a str> {
        self.value(field).and_then(Value::as_text)
    }

    pub fn bool_value(&self, field: &str) -> Option<bool> {
        self.value(field).and_then(Value::as_bool)
    }

    pub fn is_empty(&self, field: &str) -> bool {
        self.value(field).is_none_or(Value::is_empty)
    }
}

/// Returns the reasons the step cannot be left yet. An empty list means the
/// guard is satisfied.
pub type StepGuard = Box<dyn Fn(&GuardContext<'_>) -> Vec<GuardIssue> + Send + Sync>;

pub fn always() -> StepGuard {
    Box::new(|_: &GuardContext<'_>| -> Vec<GuardIssue> { Vec::new() })
}

pub fn required(field: impl Into<String>, message: impl Into<String>) -> StepGuard {
    let field = field.into();
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        if ctx.is_empty(&field) {
            vec![GuardIssue::field(&field, &message)]
        } else {
            Vec::new()
        }
    })
}

pub fn is_true(field: impl Into<String>, message: impl Into<String>) -> StepGuard {
    let field = field.into();
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        if ctx.bool_value(&field) == Some(true) {
            Vec::new()
        } else {
            vec![GuardIssue::field(&field, &message)]
        }
    })
}

pub fn equals(field: impl Into<String>, expected: Value, message: impl Into<String>) -> StepGuard {
    let field = field.into();
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        if ctx.value(&field) == Some(&expected) {
            Vec::new()
        } else {
            vec![GuardIssue::field(&field, &message)]
        }
    })
}

pub fn matches(field: impl Into<String>, pattern: Regex, message: impl Into<String>) -> StepGuard {
    let field = field.into();
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        let ok = ctx
            .value(&field)
            .and_then(Value::to_text)
            .is_some_and(|text| pattern.is_match(&text));
        if ok {
            Vec::new()
        } else {
            vec![GuardIssue::field(&field, &message)]
        }
    })
}

pub fn min_length(field: impl Into<String>, min: usize, message: impl Into<String>) -> StepGuard {
    let field = field.into();
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        let len = ctx
            .value(&field)
            .and_then(Value::to_text)
            .map(|text| text.trim().chars().count())
            .unwrap_or(0);
        if len >= min {
            Vec::new()
        } else {
            vec![GuardIssue::field(&field, &message)]
        }
    })
}

pub fn valid_cnpj(field: impl Into<String>, message: impl Into<String>) -> StepGuard {
    let field = field.into();
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        let valid = ctx
            .value(&field)
            .and_then(Value::to_text)
            .is_some_and(|text| cnpj::is_valid(&text));
        if valid {
            Vec::new()
        } else {
            vec![GuardIssue::field(&field, &message)]
        }
    })
}

pub fn attachment_present(field: impl Into<String>, message: impl Into<String>) -> StepGuard {
    let field = field.into();
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        if ctx.value(&field).and_then(Value::as_attachment).is_some() {
            Vec::new()
        } else {
            vec![GuardIssue::field(&field, &message)]
        }
    })
}

/// Satisfied when every inner guard is; reports all of their issues.
pub fn all_of(guards: Vec<StepGuard>) -> StepGuard {
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        guards.iter().flat_map(|guard| guard(ctx)).collect()
    })
}

/// Satisfied when at least one inner guard is.
pub fn any_of(guards: Vec<StepGuard>, message: impl Into<String>) -> StepGuard {
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        if guards.is_empty() || guards.iter().any(|guard| guard(ctx).is_empty()) {
            Vec::new()
        } else {
            vec![GuardIssue::step(&message)]
        }
    })
}

pub fn custom(
    predicate: impl Fn(&GuardContext<'_>) -> bool + Send + Sync + 'static,
    message: impl Into<String>,
) -> StepGuard {
    let message = message.into();
    Box::new(move |ctx: &GuardContext<'_>| -> Vec<GuardIssue> {
        if predicate(ctx) {
            Vec::new()
        } else {
            vec![GuardIssue::step(&message)]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(guard: &StepGuard, data: &IndexMap<String, Value>) -> Vec<GuardIssue> {
        let step = StepKey::from("s");
        let flow = FlowContext::default();
        guard(&GuardContext::new(&step, data, &flow))
    }

    fn data(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        let guard = required("name", "name is required");
        assert_eq!(eval(&guard, &data(&[])).len(), 1);
        assert_eq!(eval(&guard, &data(&[("name", Value::from("  "))])).len(), 1);
        assert!(eval(&guard, &data(&[("name", Value::from("Acme"))])).is_empty());
    }

    #[test]
    fn is_true_needs_literal_true() {
        let guard = is_true("ok", "confirm first");
        assert!(!eval(&guard, &data(&[("ok", Value::from("true"))])).is_empty());
        assert!(!eval(&guard, &data(&[("ok", Value::Bool(false))])).is_empty());
        assert!(eval(&guard, &data(&[("ok", Value::Bool(true))])).is_empty());
    }

    #[test]
    fn matches_uses_text_form() {
        let guard = matches("code", Regex::new(r"^\d{4}$").expect("regex"), "four digits");
        assert!(eval(&guard, &data(&[("code", Value::Number(1234))])).is_empty());
        assert!(!eval(&guard, &data(&[("code", Value::from("12a4"))])).is_empty());
    }

    #[test]
    fn cnpj_accepts_unquoted_digits() {
        let guard = valid_cnpj("cnpj", "invalid CNPJ");
        assert!(eval(&guard, &data(&[("cnpj", Value::Number(11222333000181))])).is_empty());
        assert!(eval(&guard, &data(&[("cnpj", Value::from("11.222.333/0001-81"))])).is_empty());
        assert!(!eval(&guard, &data(&[("cnpj", Value::Number(11222333000182))])).is_empty());
        assert!(!eval(&guard, &data(&[("cnpj", Value::Bool(true))])).is_empty());
    }

    #[test]
    fn min_length_counts_numbers_as_text() {
        let guard = min_length("code", 4, "too short");
        assert!(eval(&guard, &data(&[("code", Value::Number(12345))])).is_empty());
        assert!(!eval(&guard, &data(&[("code", Value::Number(123))])).is_empty());
        assert!(!eval(&guard, &data(&[("code", Value::from("  ab  "))])).is_empty());
    }

    #[test]
    fn all_of_collects_every_issue() {
        let guard = all_of(vec![required("a", "a"), required("b", "b")]);
        let issues = eval(&guard, &data(&[]));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field.as_deref(), Some("a"));
        assert_eq!(issues[1].field.as_deref(), Some("b"));
    }

    #[test]
    fn any_of_passes_on_first_satisfied() {
        let guard = any_of(
            vec![required("a", "a"), required("b", "b")],
            "fill a or b",
        );
        assert!(eval(&guard, &data(&[("b", Value::from("x"))])).is_empty());
        assert_eq!(eval(&guard, &data(&[])), vec![GuardIssue::step("fill a or b")]);
    }

    #[test]
    fn custom_sees_flow_context() {
        let guard = custom(
            |ctx| ctx.flow().company.as_deref() == Some("acme"),
            "company missing",
        );
        let step = StepKey::from("s");
        let empty = IndexMap::new();
        let flow = FlowContext::new().with_company("acme");
        assert!(guard(&GuardContext::new(&step, &empty, &flow)).is_empty());
        let other = FlowContext::new();
        assert!(!guard(&GuardContext::new(&step, &empty, &other)).is_empty());
    }
}
