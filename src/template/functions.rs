//! The closed registry of template functions.
//!
//! Every function has a `self_` twin that takes the button's bound
//! `entity_id` as its implicit first argument.

use super::{TemplateContext, Value};
use crate::error::TemplateError;
use crate::models::EntityState;

type Handler = fn(&EntityState, &[Value], &str) -> Result<Value, TemplateError>;

/// A registered template function.
pub struct Function {
    /// Name as written in templates (without `self_`)
    pub name: &'static str,
    /// Arguments after the entity id
    pub extra_args: usize,
    handler: Handler,
}

const REGISTRY: [Function; 4] = [
    Function {
        name: "states",
        extra_args: 0,
        handler: states,
    },
    Function {
        name: "state_attr",
        extra_args: 1,
        handler: state_attr,
    },
    Function {
        name: "is_state",
        extra_args: 1,
        handler: is_state,
    },
    Function {
        name: "binary_text",
        extra_args: 2,
        handler: binary_text,
    },
];

/// Names accepted by the engine, including `self_` variants.
#[must_use]
pub fn names() -> Vec<String> {
    REGISTRY
        .iter()
        .flat_map(|f| [f.name.to_string(), format!("self_{}", f.name)])
        .collect()
}

/// Calls `name` with already evaluated arguments.
///
/// # Errors
///
/// Unknown names, wrong argument counts or types, unknown entities and
/// `self_` calls on unbound buttons all return a [`TemplateError`].
pub fn call(ctx: &TemplateContext<'_>, name: &str, args: &[Value]) -> Result<Value, TemplateError> {
    let (base, bound) = match name.strip_prefix("self_") {
        Some(base) => (base, true),
        None => (name, false),
    };
    let function = REGISTRY
        .iter()
        .find(|f| f.name == base)
        .ok_or_else(|| TemplateError::UnknownFunction(name.to_string()))?;

    let (entity_id, rest) = if bound {
        let entity_id = ctx
            .entity_id
            .ok_or_else(|| TemplateError::NoBoundEntity(name.to_string()))?;
        check_arity(name, function.extra_args, args.len())?;
        (entity_id.to_string(), args)
    } else {
        check_arity(name, function.extra_args + 1, args.len())?;
        let entity_id = expect_str(name, &args[0])?;
        (entity_id, &args[1..])
    };

    let entity = ctx
        .snapshot
        .get(&entity_id)
        .ok_or(TemplateError::UnknownEntity(entity_id))?;
    (function.handler)(entity, rest, name)
}

fn check_arity(name: &str, expected: usize, got: usize) -> Result<(), TemplateError> {
    if expected == got {
        Ok(())
    } else {
        Err(TemplateError::Arity {
            function: name.to_string(),
            expected,
            got,
        })
    }
}

fn expect_str(name: &str, value: &Value) -> Result<String, TemplateError> {
    match value {
        Value::Str(text) => Ok(text.clone()),
        _ => Err(TemplateError::TypeMismatch {
            function: name.to_string(),
            expected: "string",
        }),
    }
}

fn states(entity: &EntityState, _: &[Value], _: &str) -> Result<Value, TemplateError> {
    Ok(Value::Str(entity.state.clone()))
}

fn state_attr(entity: &EntityState, args: &[Value], name: &str) -> Result<Value, TemplateError> {
    let attr = expect_str(name, &args[0])?;
    Ok(entity
        .attributes
        .get(&attr)
        .map_or(Value::None, Value::from_json))
}

fn is_state(entity: &EntityState, args: &[Value], _: &str) -> Result<Value, TemplateError> {
    Ok(Value::Bool(Value::Str(entity.state.clone()) == args[0]))
}

fn binary_text(entity: &EntityState, args: &[Value], _: &str) -> Result<Value, TemplateError> {
    Ok(if entity.state == "on" {
        args[0].clone()
    } else {
        args[1].clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntitySnapshot;
    use serde_json::json;

    fn snapshot() -> EntitySnapshot {
        EntitySnapshot::from_states([
            EntityState::new("light.x", "on").with_attribute("brightness", json!(128)),
            EntityState::new("switch.y", "off"),
        ])
    }

    fn s(text: &str) -> Value {
        Value::Str(text.into())
    }

    #[test]
    fn test_self_variant_matches_explicit() {
        let snapshot = snapshot();
        let ctx = TemplateContext::new(&snapshot, Some("light.x"));
        assert_eq!(
            call(&ctx, "self_states", &[]).unwrap(),
            call(&ctx, "states", &[s("light.x")]).unwrap()
        );
    }

    #[test]
    fn test_state_attr_and_binary_text() {
        let snapshot = snapshot();
        let ctx = TemplateContext::new(&snapshot, Some("switch.y"));
        assert_eq!(
            call(&ctx, "state_attr", &[s("light.x"), s("brightness")]).unwrap(),
            Value::Num(128.0)
        );
        assert_eq!(
            call(&ctx, "state_attr", &[s("light.x"), s("missing")]).unwrap(),
            Value::None
        );
        assert_eq!(
            call(&ctx, "self_binary_text", &[s("On"), s("Off")]).unwrap(),
            s("Off")
        );
        assert_eq!(
            call(&ctx, "is_state", &[s("light.x"), s("on")]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_errors() {
        let snapshot = snapshot();
        let unbound = TemplateContext::new(&snapshot, None);
        assert_eq!(
            call(&unbound, "self_states", &[]),
            Err(TemplateError::NoBoundEntity("self_states".into()))
        );
        assert_eq!(
            call(&unbound, "states", &[s("light.nope")]),
            Err(TemplateError::UnknownEntity("light.nope".into()))
        );
        assert_eq!(
            call(&unbound, "now", &[]),
            Err(TemplateError::UnknownFunction("now".into()))
        );
        assert!(matches!(
            call(&unbound, "is_state", &[s("light.x")]),
            Err(TemplateError::Arity { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            call(&unbound, "states", &[Value::Num(1.0)]),
            Err(TemplateError::TypeMismatch { expected: "string", .. })
        ));
    }

    #[test]
    fn test_registry_names() {
        let names = names();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"self_state_attr".to_string()));
    }
}
