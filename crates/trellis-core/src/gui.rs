//! JSON message bridge between a plugin UI and the main-side parameters.
//!
//! The bridge does no windowing. A UI (web view, native toolkit, remote
//! controller) exchanges JSON with it:
//!
//! - [`GuiBridge::parameters_json`]: full parameter dump for initial render
//! - [`GuiBridge::handle_message`]: `param:set`, `param:begin`, `param:end`,
//!   plus `invoke`/`event` forwarded to a [`GuiHandler`]
//! - [`GuiBridge::changed_since_last_poll`]: values that moved since the
//!   previous poll, meant to be called from a periodic timer
//!
//! Parameter edits go through [`MainParameters`], so they reach the audio
//! side and the host through the ordinary change channel.

use serde_json::{json, Value};

use crate::parameter_info::ParameterId;
use crate::parameter_store::MainParameters;

/// Handler for custom UI messages.
///
/// Parameter sync is handled by the bridge and does not require this trait.
pub trait GuiHandler: Send {
    /// Handle `{"type":"invoke","method":..,"args":[..]}`.
    ///
    /// `Ok(value)` is returned to the UI as `{"ok": value}`,
    /// `Err(message)` as `{"err": message}`.
    fn on_invoke(&mut self, _method: &str, _args: &[Value]) -> Result<Value, String> {
        Ok(Value::Null)
    }

    /// Handle `{"type":"event","name":..,"data":..}`.
    fn on_event(&mut self, _name: &str, _data: &Value) {}
}

/// Main-thread JSON bridge.
pub struct GuiBridge {
    handler: Option<Box<dyn GuiHandler>>,
    last_values: Vec<f64>,
}

impl GuiBridge {
    pub fn new(handler: Option<Box<dyn GuiHandler>>) -> Self {
        Self {
            handler,
            last_values: Vec::new(),
        }
    }

    /// Every parameter as a JSON array. Resets the change poll.
    pub fn parameters_json(&mut self, params: &mut MainParameters) -> String {
        params.flush_from_audio();
        let registry = std::sync::Arc::clone(params.registry());
        let entries: Vec<Value> = registry
            .iter()
            .map(|desc| {
                let value = params.peek(desc.id);
                json!({
                    "id": desc.id,
                    "key": desc.key,
                    "name": desc.name,
                    "value": value,
                    "text": desc.value_to_text(value),
                    "min": desc.raw_min(),
                    "max": desc.raw_max(),
                    "default": desc.raw_default(),
                    "stepped": desc.flags.stepped,
                })
            })
            .collect();
        self.last_values = params.values().to_vec();
        Value::Array(entries).to_string()
    }

    /// Values that changed since the previous poll, as
    /// `[{"id", "value", "text"}, ..]`. The first poll reports everything.
    pub fn changed_since_last_poll(&mut self, params: &mut MainParameters) -> String {
        params.flush_from_audio();
        let count = params.count();
        if self.last_values.len() != count {
            // NAN never compares equal, so every slot is reported once.
            self.last_values = vec![f64::NAN; count];
        }
        let registry = std::sync::Arc::clone(params.registry());
        let mut changes = Vec::new();
        for desc in registry.iter() {
            let value = params.peek(desc.id);
            let last = &mut self.last_values[desc.id as usize];
            if *last != value {
                *last = value;
                changes.push(json!({
                    "id": desc.id,
                    "value": value,
                    "text": desc.value_to_text(value),
                }));
            }
        }
        Value::Array(changes).to_string()
    }

    /// Handle one UI message. Returns a JSON reply for `invoke` messages.
    pub fn handle_message(&mut self, params: &mut MainParameters, message: &str) -> Option<String> {
        let Ok(msg) = serde_json::from_str::<Value>(message) else {
            log::warn!("invalid GUI message JSON: {message}");
            return None;
        };
        let msg_type = msg.get("type").and_then(Value::as_str)?;
        let id = || {
            msg.get("id")
                .and_then(Value::as_u64)
                .and_then(|v| ParameterId::try_from(v).ok())
        };

        match msg_type {
            "param:set" => {
                let id = id()?;
                let value = msg.get("value").and_then(Value::as_f64)?;
                params.set(id, value);
                None
            }
            "param:begin" => {
                params.start_gesture(id()?);
                None
            }
            "param:end" => {
                params.stop_gesture(id()?);
                None
            }
            "invoke" => {
                let method = msg.get("method").and_then(Value::as_str)?;
                let args = msg
                    .get("args")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let result = match &mut self.handler {
                    Some(handler) => handler.on_invoke(method, &args),
                    None => Ok(Value::Null),
                };
                let reply = match result {
                    Ok(value) => json!({ "ok": value }),
                    Err(err) => json!({ "err": err }),
                };
                Some(reply.to_string())
            }
            "event" => {
                let name = msg.get("name").and_then(Value::as_str)?;
                let data = msg.get("data").cloned().unwrap_or(Value::Null);
                if let Some(handler) = &mut self.handler {
                    handler.on_event(name, &data);
                }
                None
            }
            _ => {
                log::debug!("unknown GUI message type: {msg_type}");
                None
            }
        }
    }
}

impl std::fmt::Debug for GuiBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuiBridge")
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::{Event, EventBody, OutputEvents};
    use crate::parameter_info::ParameterDescriptor;
    use crate::parameter_registry::ParameterRegistry;
    use crate::parameter_store::{parameter_stores, AudioParameters};

    fn stores() -> (MainParameters, AudioParameters) {
        let mut registry = ParameterRegistry::new(2);
        registry
            .configure(0, ParameterDescriptor::percent("mix", "Mix", 0.5))
            .unwrap();
        registry
            .configure(1, ParameterDescriptor::integer("voices", "Voices", 1, 8, 4))
            .unwrap();
        registry.validate().unwrap();
        parameter_stores(Arc::new(registry), 16)
    }

    #[test]
    fn test_parameters_json() {
        let (mut main, _audio) = stores();
        let mut bridge = GuiBridge::new(None);
        let dump: Value = serde_json::from_str(&bridge.parameters_json(&mut main)).unwrap();
        let entries = dump.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["key"], "mix");
        assert_eq!(entries[0]["text"], "50.00%");
        assert_eq!(entries[1]["max"], 8.0);
        assert_eq!(entries[1]["stepped"], true);
    }

    #[test]
    fn test_param_messages_reach_audio_side() {
        let (mut main, mut audio) = stores();
        let mut bridge = GuiBridge::new(None);
        bridge.handle_message(&mut main, r#"{"type":"param:begin","id":0}"#);
        bridge.handle_message(&mut main, r#"{"type":"param:set","id":0,"value":0.2}"#);
        bridge.handle_message(&mut main, r#"{"type":"param:end","id":0}"#);
        assert_eq!(main.peek(0), 0.2);

        let mut out = OutputEvents::with_capacity(8);
        audio.flush_from_main(&mut out);
        assert_eq!(
            out.as_slice(),
            &[
                Event::new(0, EventBody::GestureBegin { id: 0 }),
                Event::new(0, EventBody::ParamValue { id: 0, value: 0.2 }),
                Event::new(0, EventBody::GestureEnd { id: 0 }),
            ]
        );
    }

    #[test]
    fn test_malformed_messages_are_ignored() {
        let (mut main, _audio) = stores();
        let mut bridge = GuiBridge::new(None);
        assert_eq!(bridge.handle_message(&mut main, "{not json"), None);
        assert_eq!(bridge.handle_message(&mut main, r#"{"type":"param:set","id":0}"#), None);
        assert_eq!(bridge.handle_message(&mut main, r#"{"type":"mystery"}"#), None);
        assert_eq!(main.peek(0), 0.5);

        // ids past the id type's range do not wrap onto real parameters
        let wide = r#"{"type":"param:set","id":4294967296,"value":0.9}"#;
        assert_eq!(bridge.handle_message(&mut main, wide), None);
        assert_eq!(main.peek(0), 0.5);
    }

    #[test]
    fn test_change_polling() {
        let (mut main, mut audio) = stores();
        let mut bridge = GuiBridge::new(None);
        let first: Value = serde_json::from_str(&bridge.changed_since_last_poll(&mut main)).unwrap();
        assert_eq!(first.as_array().unwrap().len(), 2);
        assert_eq!(bridge.changed_since_last_poll(&mut main), "[]");

        audio.set(1, 6.0);
        let changed: Value = serde_json::from_str(&bridge.changed_since_last_poll(&mut main)).unwrap();
        assert_eq!(changed, json!([{ "id": 1, "value": 6.0, "text": "6" }]));
    }

    #[test]
    fn test_invoke_and_event_handler() {
        struct Echo {
            events: Vec<String>,
        }
        impl GuiHandler for Echo {
            fn on_invoke(&mut self, method: &str, args: &[Value]) -> Result<Value, String> {
                match method {
                    "echo" => Ok(args.first().cloned().unwrap_or(Value::Null)),
                    other => Err(format!("no method {other}")),
                }
            }
            fn on_event(&mut self, name: &str, _data: &Value) {
                self.events.push(name.to_owned());
            }
        }

        let (mut main, _audio) = stores();
        let mut bridge = GuiBridge::new(Some(Box::new(Echo { events: Vec::new() })));
        let reply = bridge
            .handle_message(&mut main, r#"{"type":"invoke","method":"echo","args":[3]}"#)
            .unwrap();
        assert_eq!(reply, r#"{"ok":3}"#);
        let reply = bridge
            .handle_message(&mut main, r#"{"type":"invoke","method":"nope"}"#)
            .unwrap();
        assert_eq!(reply, r#"{"err":"no method nope"}"#);
        assert_eq!(
            bridge.handle_message(&mut main, r#"{"type":"event","name":"resize"}"#),
            None
        );
    }
}
