//! Constructor arguments: from the loosely typed values in `heimdahl.json` to
//! ABI-encoded bytes.
//!
//! Coercion happens in two steps. [`coerce`] looks only at the type declared
//! next to each value and produces a [`SolArgument`]. [`encode_constructor_args`]
//! then matches those against the constructor in the contract's ABI and hands
//! the result to the ABI encoder.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::{JsonAbi, Param},
    primitives::{Address, I256, U256},
};
use serde_json::Value;

use crate::{error::DeployError, project::ConstructorArgument};

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A constructor argument value, shaped by its declared Solidity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolArgument {
    Uint(U256),
    Int(I256),
    String(String),
    Bool(bool),
    /// Address text, validated only when encoding.
    Address(String),
    /// Hex text, validated only when encoding.
    Bytes(String),
    Array(Vec<SolArgument>),
    /// Components in declaration order.
    Tuple(Vec<(String, SolArgument)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Uint,
    Int,
    String,
    Bool,
    Address,
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Scalar(Scalar),
    Array(Scalar),
    Tuple,
}

fn integer_width(bits: &str) -> bool {
    bits.is_empty()
        || bits
            .parse::<usize>()
            .is_ok_and(|n| (8..=256).contains(&n) && n % 8 == 0)
}

fn scalar(ty: &str) -> Option<Scalar> {
    match ty {
        "string" => Some(Scalar::String),
        "bool" => Some(Scalar::Bool),
        "address" => Some(Scalar::Address),
        "bytes" => Some(Scalar::Bytes),
        _ => {
            if let Some(bits) = ty.strip_prefix("uint") {
                integer_width(bits).then_some(Scalar::Uint)
            } else if let Some(bits) = ty.strip_prefix("int") {
                integer_width(bits).then_some(Scalar::Int)
            } else {
                None
            }
        }
    }
}

fn kind(ty: &str) -> Option<Kind> {
    if ty == "tuple" {
        return Some(Kind::Tuple);
    }
    if let Some(element) = ty.strip_suffix("[]") {
        return scalar(element).map(Kind::Array);
    }
    scalar(ty).map(Kind::Scalar)
}

/// Shapes a configured argument according to its declared type.
///
/// No I/O and no validation beyond what the shape requires: addresses and
/// byte strings are kept as text.
pub fn coerce(argument: &ConstructorArgument) -> Result<SolArgument, DeployError> {
    let ty = argument.ty.trim();
    match kind(ty).ok_or_else(|| DeployError::UnsupportedType(ty.to_owned()))? {
        Kind::Scalar(scalar) => coerce_scalar(scalar, &argument.name, ty, &argument.value),
        Kind::Array(element) => {
            let Value::Array(values) = &argument.value else {
                return Err(invalid(&argument.name, ty, "expected an array"));
            };
            let element_ty = &ty[..ty.len() - 2];
            values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    coerce_scalar(element, &format!("{}[{i}]", argument.name), element_ty, value)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SolArgument::Array)
        }
        Kind::Tuple => argument
            .components
            .iter()
            .map(|component| Ok((component.name.clone(), coerce(component)?)))
            .collect::<Result<Vec<_>, DeployError>>()
            .map(SolArgument::Tuple),
    }
}

fn invalid(name: &str, ty: &str, reason: impl Into<String>) -> DeployError {
    DeployError::InvalidArgument {
        name: name.to_owned(),
        ty: ty.to_owned(),
        reason: reason.into(),
    }
}

fn coerce_scalar(
    scalar: Scalar,
    name: &str,
    ty: &str,
    value: &Value,
) -> Result<SolArgument, DeployError> {
    match scalar {
        Scalar::Uint => {
            let text = integer_text(value).map_err(|reason| invalid(name, ty, reason))?;
            let parsed = match text.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(&text, 10),
            };
            parsed
                .map(SolArgument::Uint)
                .map_err(|e| invalid(name, ty, format!("`{text}` is not an unsigned integer: {e}")))
        }
        Scalar::Int => {
            let text = integer_text(value).map_err(|reason| invalid(name, ty, reason))?;
            let parsed = if text.trim_start_matches('-').starts_with("0x") {
                I256::from_hex_str(&text)
            } else {
                I256::from_dec_str(&text)
            };
            parsed
                .map(SolArgument::Int)
                .map_err(|e| invalid(name, ty, format!("`{text}` is not an integer: {e}")))
        }
        Scalar::String => match value {
            Value::String(s) => Ok(SolArgument::String(s.clone())),
            Value::Number(n) => Ok(SolArgument::String(n.to_string())),
            Value::Bool(b) => Ok(SolArgument::String(b.to_string())),
            _ => Err(invalid(name, ty, "expected a string")),
        },
        Scalar::Bool => match value {
            Value::Bool(b) => Ok(SolArgument::Bool(*b)),
            Value::String(s) if s == "true" => Ok(SolArgument::Bool(true)),
            Value::String(s) if s == "false" => Ok(SolArgument::Bool(false)),
            _ => Err(invalid(name, ty, "expected true or false")),
        },
        Scalar::Address => match value {
            Value::String(s) => Ok(SolArgument::Address(s.clone())),
            _ => Err(invalid(name, ty, "expected an address string")),
        },
        Scalar::Bytes => match value {
            Value::String(s) => Ok(SolArgument::Bytes(s.clone())),
            _ => Err(invalid(name, ty, "expected a hex string")),
        },
    }
}

/// The textual digits of an integer argument.
///
/// JSON numbers keep their exact digits. Numbers written with a fraction or an
/// exponent are accepted only when they denote an integer an `f64` represents
/// exactly; anything else is refused instead of truncated.
fn integer_text(value: &Value) -> Result<String, String> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            if !text.contains(['.', 'e', 'E']) {
                return Ok(text);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
                    Ok(format!("{}", f as i64))
                }
                _ => Err(format!("{text} is not an integer")),
            }
        }
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
        _ => Err("expected an integer".to_owned()),
    }
}

/// ABI-encodes `args` for the constructor of `abi`.
///
/// Returns no bytes when no arguments are configured. Otherwise the argument
/// count must match the constructor's inputs.
pub fn encode_constructor_args(
    contract: &str,
    abi: &JsonAbi,
    args: &[ConstructorArgument],
) -> Result<Vec<u8>, DeployError> {
    if args.is_empty() {
        return Ok(Vec::new());
    }

    let encoding = |reason: String| DeployError::Encoding {
        contract: contract.to_owned(),
        reason,
    };

    let constructor = abi
        .constructor()
        .ok_or_else(|| encoding("arguments are configured but the ABI has no constructor".into()))?;
    if constructor.inputs.len() != args.len() {
        return Err(encoding(format!(
            "constructor expects {} arguments, got {}",
            constructor.inputs.len(),
            args.len()
        )));
    }

    let mut values = Vec::with_capacity(args.len());
    for (arg, param) in args.iter().zip(&constructor.inputs) {
        let coerced = coerce(arg)?;
        let value = to_sol_value(&coerced, param)
            .map_err(|reason| encoding(format!("argument `{}`: {reason}", arg.name)))?;
        values.push(value);
    }

    constructor
        .abi_encode_input(&values)
        .map_err(|e| encoding(e.to_string()))
}

fn to_sol_value(argument: &SolArgument, param: &Param) -> Result<DynSolValue, String> {
    let ty = param.resolve().map_err(|e| e.to_string())?;
    to_value(argument, &ty, &param.components)
}

fn to_value(
    argument: &SolArgument,
    ty: &DynSolType,
    components: &[Param],
) -> Result<DynSolValue, String> {
    match (argument, ty) {
        (SolArgument::Uint(value), DynSolType::Uint(bits)) => {
            if value.bit_len() > *bits {
                return Err(format!("{value} does not fit in uint{bits}"));
            }
            Ok(DynSolValue::Uint(*value, *bits))
        }
        (SolArgument::Int(value), DynSolType::Int(bits)) => {
            let max = I256::MAX.asr(256 - bits);
            if *value > max || *value < -max - I256::ONE {
                return Err(format!("{value} does not fit in int{bits}"));
            }
            Ok(DynSolValue::Int(*value, *bits))
        }
        (SolArgument::String(value), DynSolType::String) => Ok(DynSolValue::String(value.clone())),
        (SolArgument::Bool(value), DynSolType::Bool) => Ok(DynSolValue::Bool(*value)),
        (SolArgument::Address(value), DynSolType::Address) => value
            .trim()
            .parse::<Address>()
            .map(DynSolValue::Address)
            .map_err(|e| format!("invalid address `{value}`: {e}")),
        (SolArgument::Bytes(value), DynSolType::Bytes) => {
            let value = value.trim();
            hex::decode(value.strip_prefix("0x").unwrap_or(value))
                .map(DynSolValue::Bytes)
                .map_err(|e| format!("invalid bytes `{value}`: {e}"))
        }
        (SolArgument::Array(items), DynSolType::Array(element)) => items
            .iter()
            .map(|item| to_value(item, element, components))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (SolArgument::Tuple(fields), DynSolType::Tuple(types)) => {
            if fields.len() != types.len() {
                return Err(format!(
                    "tuple expects {} components, got {}",
                    types.len(),
                    fields.len()
                ));
            }
            // Follow the ABI's component order; fall back to position for
            // unnamed components.
            types
                .iter()
                .enumerate()
                .map(|(i, ty)| {
                    let component = components.get(i);
                    let field = match component.map(|c| c.name.as_str()) {
                        Some(name) if !name.is_empty() => fields
                            .iter()
                            .find(|(field, _)| field == name)
                            .map(|(_, value)| value)
                            .ok_or_else(|| format!("missing tuple component `{name}`"))?,
                        _ => &fields[i].1,
                    };
                    let nested = component.map(|c| c.components.as_slice()).unwrap_or(&[]);
                    to_value(field, ty, nested)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        (argument, ty) => Err(format!(
            "configured value {argument:?} does not match constructor type {}",
            ty.sol_type_name()
        )),
    }
}
