//! Function-call routing
//!
//! The live voice model emits named calls with arbitrary JSON arguments.
//! Every call is decoded into a closed [`FunctionCall`] variant before any
//! field is touched; anything that doesn't decode is rejected with a
//! warning instead of an error, since the caller is a probabilistic model.

use std::sync::Arc;

use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;

use crate::lights::{ColorResolver, DeviceActuator, DeviceTarget, LightPayload, ZoneTable};

/// A call request forwarded by the client, untrusted
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionCallRequest {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// A validated function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionCall {
    /// End the live session (`turn_off_self`)
    TurnOffSelf,
    /// Change lights in a named zone (`change_lights`)
    ChangeLights { target: String, action: LightAction },
    /// Switch the fireplace light (`control_fireplace`)
    ControlFireplace { on: bool },
}

/// What to do to the lights in a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightAction {
    Power(bool),
    Brightness(u8),
    Color(String),
}

/// Argument shape for `change_lights`
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ChangeLightsArgs {
    TurnOn {
        #[serde(rename = "type")]
        target: String,
    },
    TurnOff {
        #[serde(rename = "type")]
        target: String,
    },
    DimLight {
        #[serde(rename = "type")]
        target: String,
        metadata: AmountMetadata,
    },
    BrightenLight {
        #[serde(rename = "type")]
        target: String,
        metadata: AmountMetadata,
    },
    ColorLight {
        #[serde(rename = "type")]
        target: String,
        metadata: ColorMetadata,
    },
}

#[derive(Deserialize)]
struct AmountMetadata {
    amount: Amount,
}

/// The model sends amounts as `"40"`, `"40%"` or `40`
#[derive(Deserialize)]
#[serde(untagged)]
enum Amount {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
struct ColorMetadata {
    color: String,
}

/// Argument shape for `control_fireplace`
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum FireplaceArgs {
    TurnOn,
    TurnOff,
}

impl FunctionCall {
    /// Decode a named call with untyped arguments
    ///
    /// Returns `None` for unknown names and for argument sets that are
    /// missing a required field.
    #[must_use]
    pub fn decode(name: &str, args: &Value) -> Option<Self> {
        let args = normalize_args(args);

        match name {
            "turn_off_self" => Some(Self::TurnOffSelf),
            "change_lights" => {
                let (target, action) = match ChangeLightsArgs::deserialize(&args).ok()? {
                    ChangeLightsArgs::TurnOn { target } => (target, LightAction::Power(true)),
                    ChangeLightsArgs::TurnOff { target } => (target, LightAction::Power(false)),
                    ChangeLightsArgs::DimLight { target, metadata }
                    | ChangeLightsArgs::BrightenLight { target, metadata } => {
                        (target, LightAction::Brightness(metadata.amount.percent()?))
                    }
                    ChangeLightsArgs::ColorLight { target, metadata } => {
                        if metadata.color.trim().is_empty() {
                            return None;
                        }
                        (target, LightAction::Color(metadata.color))
                    }
                };
                Some(Self::ChangeLights { target, action })
            }
            "control_fireplace" => {
                let on = matches!(FireplaceArgs::deserialize(&args).ok()?, FireplaceArgs::TurnOn);
                Some(Self::ControlFireplace { on })
            }
            _ => None,
        }
    }
}

impl Amount {
    /// Brightness percentage, clamped to `0..=100`
    ///
    /// Text follows leading-integer parsing: `"40%"` is 40, `"abc"` is rejected.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn percent(&self) -> Option<u8> {
        let value = match self {
            Self::Number(n) if n.is_finite() => n.trunc(),
            Self::Number(_) => return None,
            Self::Text(s) => leading_integer(s)?,
        };
        Some(value.clamp(0.0, 100.0) as u8)
    }
}

#[allow(clippy::cast_precision_loss)]
fn leading_integer(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Anything that overflows is far above 100 and gets clamped anyway
    let magnitude = digits[..end].parse::<u64>().map_or(f64::MAX, |n| n as f64);
    Some(if negative { -magnitude } else { magnitude })
}

/// Arguments may arrive as the model's raw argument string; parse it leniently
fn normalize_args(args: &Value) -> Value {
    match args {
        Value::String(raw) => serde_yaml::from_str::<Value>(raw).unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// How a dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Unknown name or invalid arguments
    Rejected,
    /// A device action was issued (possibly to zero devices)
    Actuated,
    /// The model asked to end the live session
    Deactivate,
}

impl Dispatched {
    /// The boolean outcome reported for a call
    #[must_use]
    pub const fn succeeded(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Routes validated calls to the device actuator and color resolver
#[derive(Clone)]
pub struct FunctionRouter {
    zones: Arc<ZoneTable>,
    actuator: DeviceActuator,
    colors: Arc<ColorResolver>,
}

impl FunctionRouter {
    /// Create a router over the zone table and device collaborators
    #[must_use]
    pub fn new(zones: Arc<ZoneTable>, actuator: DeviceActuator, colors: Arc<ColorResolver>) -> Self {
        Self {
            zones,
            actuator,
            colors,
        }
    }

    /// Zone table the router resolves targets against
    #[must_use]
    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    /// Dispatch a call and report success
    pub async fn dispatch(&self, name: &str, args: &Value) -> bool {
        self.route(name, args).await.succeeded()
    }

    /// Dispatch a call, distinguishing session deactivation from device actions
    pub async fn route(&self, name: &str, args: &Value) -> Dispatched {
        tracing::debug!(name, %args, "handling function call");

        let Some(call) = FunctionCall::decode(name, args) else {
            tracing::warn!(name, %args, "unknown function call or invalid arguments");
            return Dispatched::Rejected;
        };

        match call {
            FunctionCall::TurnOffSelf => Dispatched::Deactivate,
            FunctionCall::ChangeLights { target, action } => {
                let device_ids = self.zones.resolve(&target);
                if device_ids.is_empty() {
                    // Still reported as success
                    tracing::warn!(zone = %target, "target matched no devices");
                }

                let payload = match action {
                    LightAction::Power(on) => LightPayload::power(on),
                    LightAction::Brightness(percent) => LightPayload::brightness(percent),
                    LightAction::Color(color) => {
                        LightPayload::color(self.colors.resolve(&color).await)
                    }
                };

                self.actuate_all(device_ids, payload).await;
                Dispatched::Actuated
            }
            FunctionCall::ControlFireplace { on } => {
                let device_ids = self.zones.device_ids(DeviceTarget::Fireplace);
                self.actuate_all(device_ids, LightPayload::power(on)).await;
                Dispatched::Actuated
            }
        }
    }

    async fn actuate_all(&self, device_ids: &[String], payload: LightPayload) {
        join_all(
            device_ids
                .iter()
                .map(|id| self.actuator.actuate(id, payload)),
        )
        .await;
    }
}
