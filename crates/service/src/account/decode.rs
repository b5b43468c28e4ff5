//! Field-by-field decoding of JSON request bodies.
//!
//! A value of the wrong type is reported under its own field name, so the
//! client gets the same `{"field": [...]}` payload as for any other
//! validation failure. Unknown keys are ignored and `null` counts as absent.

use serde_json::{Map, Value};

use super::domain::{Gender, LoginInput, UserInput};
use super::validation::{messages, FieldErrors, NON_FIELD_ERRORS};

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

struct Fields {
    map: Map<String, Value>,
    errors: FieldErrors,
}

impl Fields {
    fn new(body: Value) -> Result<Self, FieldErrors> {
        match body {
            Value::Object(map) => Ok(Self { map, errors: FieldErrors::new() }),
            other => Err(FieldErrors::single(NON_FIELD_ERRORS, messages::expected_object(json_type(&other)))),
        }
    }

    fn take(&mut self, field: &str) -> Option<Value> {
        self.map.remove(field).filter(|v| !v.is_null())
    }

    /// Strings pass through; numbers are accepted in their decimal form.
    fn string(&mut self, field: &str) -> Option<String> {
        match self.take(field)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                self.errors.add(field, messages::INVALID_STRING);
                None
            }
        }
    }

    /// Integers, or strings holding one. Out-of-range integers saturate so
    /// the range rule reports them.
    fn integer(&mut self, field: &str) -> Option<i32> {
        let value = self.take(field)?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) => Some(i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })),
            None => {
                self.errors.add(field, messages::INVALID_INTEGER);
                None
            }
        }
    }

    fn pk(&mut self, field: &str) -> Option<i32> {
        let value = self.take(field)?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) => match i32::try_from(n) {
                Ok(id) => Some(id),
                Err(_) => {
                    self.errors.add(field, messages::invalid_pk(n));
                    None
                }
            },
            None => {
                self.errors.add(field, messages::incorrect_pk_type(json_type(&value)));
                None
            }
        }
    }

    fn gender(&mut self, field: &str) -> Option<Gender> {
        let value = self.take(field)?;
        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        match text.parse::<Gender>() {
            Ok(gender) => Some(gender),
            Err(_) => {
                self.errors.add(field, messages::invalid_choice(&text));
                None
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

impl UserInput {
    /// Decode a registration or profile body, collecting type errors per field.
    pub fn from_json(body: Value) -> Result<Self, FieldErrors> {
        let mut f = Fields::new(body)?;
        let input = UserInput {
            username: f.string("username"),
            first_name: f.string("first_name"),
            last_name: f.string("last_name"),
            email: f.string("email"),
            gender: f.gender("gender"),
            age: f.integer("age"),
            country: f.pk("country"),
            city: f.pk("city"),
            password: f.string("password"),
            confirm_password: f.string("confirm_password"),
            current_password: f.string("current_password"),
        };
        f.finish(input)
    }
}

impl LoginInput {
    pub fn from_json(body: Value) -> Result<Self, FieldErrors> {
        let mut f = Fields::new(body)?;
        let input = LoginInput { email: f.string("email"), password: f.string("password") };
        f.finish(input)
    }
}
