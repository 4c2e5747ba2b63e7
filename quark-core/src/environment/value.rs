use std::cmp::Ordering;
use std::fmt::Display;

use crate::eval::error::EvalError;

pub const TRUE: Value = Value::Boolean { value: true };
pub const FALSE: Value = Value::Boolean { value: false };

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer {
        value: i64
    },
    Real {
        value: f64,
    },
    Complex {
        re: f64,
        im: f64,
    },
    String {
        value: String,
    },
    Boolean {
        value: bool
    },
    List {
        items: Vec<Value>
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Real,
    Complex,
    String,
    Boolean,
    List,
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer { value } => write!(f, "{value}"),
            Value::Real { value } => write!(f, "{value}"),
            Value::Complex { re, im } => {
                if *re == 0.0 {
                    write!(f, "{im}im")
                } else if *im < 0.0 {
                    write!(f, "{re}-{}im", -im)
                } else {
                    write!(f, "{re}+{im}im")
                }
            },
            Value::String { value } => write!(f, "{value}"),
            Value::Boolean { value } => write!(f, "{value}"),
            Value::List { items } => {
                let items = items.iter()
                    .map(|item| item.to_string())
                    .collect::<Vec<String>>();

                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

// Both operands of an arithmetic operator, promoted to their common
// numeric kind: integer -> real -> complex.
enum NumericPair {
    Integers(i64, i64),
    Reals(f64, f64),
    Complexes((f64, f64), (f64, f64)),
}

fn numeric_pair(left: &Value, right: &Value) -> Option<NumericPair> {
    if let (Value::Integer { value: a }, Value::Integer { value: b }) = (left, right) {
        return Some(NumericPair::Integers(*a, *b));
    }

    let a = left.as_complex()?;
    let b = right.as_complex()?;

    if matches!(left, Value::Complex { .. }) || matches!(right, Value::Complex { .. }) {
        Some(NumericPair::Complexes(a, b))
    } else {
        Some(NumericPair::Reals(a.0, b.0))
    }
}

fn floored_quotient(a: i64, b: i64) -> i64 {
    let quotient = a / b;

    if a % b != 0 && (a < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

impl Value {
    pub fn integer(lexeme: &str) -> Result<Value, EvalError> {
        lexeme.parse::<i64>()
            .map(|value| Value::Integer { value })
            .map_err(|_| EvalError::InvalidLiteral { lexeme: lexeme.to_string() })
    }

    pub fn real(lexeme: &str) -> Result<Value, EvalError> {
        lexeme.parse::<f64>()
            .map(|value| Value::Real { value })
            .map_err(|_| EvalError::InvalidLiteral { lexeme: lexeme.to_string() })
    }

    pub fn complex(lexeme: &str) -> Result<Value, EvalError> {
        let digits = lexeme.strip_suffix("im").unwrap_or(lexeme);

        digits.parse::<f64>()
            .map(|im| Value::Complex { re: 0.0, im })
            .map_err(|_| EvalError::InvalidLiteral { lexeme: lexeme.to_string() })
    }

    pub fn string(lexeme: &str) -> Value {
        let value = lexeme.strip_prefix('"').unwrap_or(lexeme);
        let value = value.strip_suffix('"').unwrap_or(value);

        Value::String { value: value.to_string() }
    }

    pub fn boolean(normalized: u8) -> Value {
        Value::Boolean { value: normalized != 0 }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Integer { .. } => ValueType::Integer,
            Self::Real { .. } => ValueType::Real,
            Self::Complex { .. } => ValueType::Complex,
            Self::String { .. } => ValueType::String,
            Self::Boolean { .. } => ValueType::Boolean,
            Self::List { .. } => ValueType::List,
        }
    }

    pub fn coerce_boolean(&self) -> bool {
        match self {
            Self::Integer { value } => *value != 0,
            Self::Real { value } => *value != 0.0,
            Self::Complex { re, im } => *re != 0.0 || *im != 0.0,
            Self::String { value } => !value.is_empty(),
            Self::Boolean { value } => *value,
            Self::List { items } => !items.is_empty(),
        }
    }

    fn as_complex(&self) -> Option<(f64, f64)> {
        match self {
            Self::Integer { value } => Some((*value as f64, 0.0)),
            Self::Real { value } => Some((*value, 0.0)),
            Self::Complex { re, im } => Some((*re, *im)),
            _ => None,
        }
    }

    fn invalid_operands(&self, operation: &'static str, other: &Value) -> EvalError {
        EvalError::InvalidOperands {
            operation,
            left: self.value_type(),
            right: other.value_type(),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, EvalError> {
        match (self, other) {
            (Value::String { value: a }, Value::String { value: b }) => {
                Ok(Value::String { value: format!("{a}{b}") })
            },
            (Value::List { items: a }, Value::List { items: b }) => {
                let mut items = a.clone();
                items.extend(b.iter().cloned());
                Ok(Value::List { items })
            },
            _ => match numeric_pair(self, other) {
                Some(NumericPair::Integers(a, b)) => Ok(Value::Integer { value: a + b }),
                Some(NumericPair::Reals(a, b)) => Ok(Value::Real { value: a + b }),
                Some(NumericPair::Complexes((ar, ai), (br, bi))) => {
                    Ok(Value::Complex { re: ar + br, im: ai + bi })
                },
                None => Err(self.invalid_operands("+", other)),
            }
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, EvalError> {
        match numeric_pair(self, other) {
            Some(NumericPair::Integers(a, b)) => Ok(Value::Integer { value: a - b }),
            Some(NumericPair::Reals(a, b)) => Ok(Value::Real { value: a - b }),
            Some(NumericPair::Complexes((ar, ai), (br, bi))) => {
                Ok(Value::Complex { re: ar - br, im: ai - bi })
            },
            None => Err(self.invalid_operands("-", other)),
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value, EvalError> {
        match numeric_pair(self, other) {
            Some(NumericPair::Integers(a, b)) => Ok(Value::Integer { value: a * b }),
            Some(NumericPair::Reals(a, b)) => Ok(Value::Real { value: a * b }),
            Some(NumericPair::Complexes((ar, ai), (br, bi))) => {
                Ok(Value::Complex {
                    re: ar * br - ai * bi,
                    im: ar * bi + ai * br,
                })
            },
            None => Err(self.invalid_operands("*", other)),
        }
    }

    pub fn div(&self, other: &Value) -> Result<Value, EvalError> {
        match numeric_pair(self, other) {
            Some(NumericPair::Integers(a, b)) => {
                if b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Real { value: a as f64 / b as f64 })
            },
            Some(NumericPair::Reals(a, b)) => Ok(Value::Real { value: a / b }),
            Some(NumericPair::Complexes((ar, ai), (br, bi))) => {
                let denominator = br * br + bi * bi;
                if denominator == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Complex {
                    re: (ar * br + ai * bi) / denominator,
                    im: (ai * br - ar * bi) / denominator,
                })
            },
            None => Err(self.invalid_operands("/", other)),
        }
    }

    pub fn floor_div(&self, other: &Value) -> Result<Value, EvalError> {
        match numeric_pair(self, other) {
            Some(NumericPair::Integers(a, b)) => {
                if b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Integer { value: floored_quotient(a, b) })
            },
            Some(NumericPair::Reals(a, b)) => Ok(Value::Real { value: (a / b).floor() }),
            Some(NumericPair::Complexes(..)) | None => Err(self.invalid_operands("//", other)),
        }
    }

    pub fn pow(&self, other: &Value) -> Result<Value, EvalError> {
        match numeric_pair(self, other) {
            Some(NumericPair::Integers(a, b)) => {
                if b >= 0 {
                    let value = u32::try_from(b)
                        .ok()
                        .and_then(|exponent| a.checked_pow(exponent));

                    match value {
                        Some(value) => Ok(Value::Integer { value }),
                        // Out of the integer range, promote
                        None => Ok(Value::Real { value: (a as f64).powf(b as f64) }),
                    }
                } else {
                    Ok(Value::Real { value: (a as f64).powf(b as f64) })
                }
            },
            Some(NumericPair::Reals(a, b)) => Ok(Value::Real { value: a.powf(b) }),
            Some(NumericPair::Complexes(..)) | None => Err(self.invalid_operands("**", other)),
        }
    }

    pub fn rem(&self, other: &Value) -> Result<Value, EvalError> {
        match numeric_pair(self, other) {
            Some(NumericPair::Integers(a, b)) => {
                if b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Integer { value: a - b * floored_quotient(a, b) })
            },
            Some(NumericPair::Reals(a, b)) => Ok(Value::Real { value: a - b * (a / b).floor() }),
            Some(NumericPair::Complexes(..)) | None => Err(self.invalid_operands("%", other)),
        }
    }

    pub fn equals(&self, other: &Value) -> Result<Value, EvalError> {
        match numeric_pair(self, other) {
            Some(NumericPair::Integers(a, b)) => Ok(Value::Boolean { value: a == b }),
            Some(NumericPair::Reals(a, b)) => Ok(Value::Boolean { value: a == b }),
            Some(NumericPair::Complexes(a, b)) => Ok(Value::Boolean { value: a == b }),
            None => match (self, other) {
                (Value::String { value: a }, Value::String { value: b }) => {
                    Ok(Value::Boolean { value: a == b })
                },
                (Value::Boolean { value: a }, Value::Boolean { value: b }) => {
                    Ok(Value::Boolean { value: a == b })
                },
                (Value::List { items: a }, Value::List { items: b }) => {
                    Ok(Value::Boolean { value: a == b })
                },
                _ => Err(self.invalid_operands("==", other)),
            }
        }
    }

    pub fn not_equals(&self, other: &Value) -> Result<Value, EvalError> {
        match self.equals(other)? {
            Value::Boolean { value } => Ok(Value::Boolean { value: !value }),
            _ => unreachable!("equality always reduces to a boolean"),
        }
    }

    fn compare(&self, other: &Value, operation: &'static str) -> Result<Ordering, EvalError> {
        match numeric_pair(self, other) {
            Some(NumericPair::Integers(a, b)) => Ok(a.cmp(&b)),
            Some(NumericPair::Reals(a, b)) => {
                a.partial_cmp(&b).ok_or_else(|| self.invalid_operands(operation, other))
            },
            // Complex values have no ordering
            Some(NumericPair::Complexes(..)) => Err(self.invalid_operands(operation, other)),
            None => match (self, other) {
                (Value::String { value: a }, Value::String { value: b }) => Ok(a.cmp(b)),
                _ => Err(self.invalid_operands(operation, other)),
            }
        }
    }

    pub fn greater_than(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::Boolean { value: self.compare(other, ">")?.is_gt() })
    }

    pub fn less_than(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::Boolean { value: self.compare(other, "<")?.is_lt() })
    }

    pub fn greater_equal(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::Boolean { value: self.compare(other, ">=")?.is_ge() })
    }

    pub fn less_equal(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::Boolean { value: self.compare(other, "<=")?.is_le() })
    }

    pub fn negate(&self) -> Result<Value, EvalError> {
        match self {
            Self::Integer { value } => Ok(Value::Integer { value: -value }),
            Self::Real { value } => Ok(Value::Real { value: -value }),
            Self::Complex { re, im } => Ok(Value::Complex { re: -re, im: -im }),
            _ => Err(EvalError::InvalidOperand {
                operation: "-",
                operand: self.value_type(),
            }),
        }
    }

    pub fn logical_not(&self) -> Value {
        Value::Boolean { value: !self.coerce_boolean() }
    }

    pub fn head(&self) -> Result<Value, EvalError> {
        match self {
            Self::List { items } => items.first()
                .cloned()
                .ok_or(EvalError::EmptyList { operation: "head" }),
            _ => Err(EvalError::InvalidOperand {
                operation: "head",
                operand: self.value_type(),
            }),
        }
    }

    pub fn tail(&self) -> Result<Value, EvalError> {
        match self {
            Self::List { items } if !items.is_empty() => {
                Ok(Value::List { items: items[1..].to_vec() })
            },
            Self::List { .. } => Err(EvalError::EmptyList { operation: "tail" }),
            _ => Err(EvalError::InvalidOperand {
                operation: "tail",
                operand: self.value_type(),
            }),
        }
    }

    pub fn is_nil(&self) -> Result<Value, EvalError> {
        match self {
            Self::List { items } => Ok(Value::Boolean { value: items.is_empty() }),
            _ => Err(EvalError::InvalidOperand {
                operation: "nil",
                operand: self.value_type(),
            }),
        }
    }
}
