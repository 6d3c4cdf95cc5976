//! TP-Link Kasa bulbs over the legacy local protocol.
//!
//! ## Wire format
//!
//! Each request opens a TCP connection to port 9999 and sends one frame:
//! a 4-byte big-endian length followed by the JSON payload encrypted with
//! Kasa's XOR autokey cipher (initial key 171, each ciphertext byte becomes the
//! key for the next). The bulb answers with a frame in the same format and
//! closes the connection.
//!
//! ## Commands used
//!
//! - `{"system":{"get_sysinfo":{}}}` for alias, model and light state
//! - `{"smartlife.iot.smartbulb.lightingservice":{"transition_light_state":{..}}}`
//!   for power, brightness and color temperature, always with a zero transition
//!   period so each paced step lands immediately
//!
//! Firmware that only speaks the newer KLAP/AES transport is not supported.

use serde_json::{Value, json};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{DeviceConnector, DeviceError, LightDevice, LightState};
use crate::constants::{
    KASA_INITIAL_KEY, KASA_MAX_RESPONSE_BYTES, KASA_PORT, MAXIMUM_TEMP, MINIMUM_TEMP,
};

const LIGHTING_SERVICE: &str = "smartlife.iot.smartbulb.lightingservice";
const TRANSITION_LIGHT_STATE: &str = "transition_light_state";

/// Encrypt a payload and prepend the length header.
pub fn encrypt(plaintext: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(plaintext.len() + 4);
    frame.extend_from_slice(&(plaintext.len() as u32).to_be_bytes());

    let mut key = KASA_INITIAL_KEY;
    for &byte in plaintext {
        key ^= byte;
        frame.push(key);
    }
    frame
}

/// Decrypt a payload (without its length header).
pub fn decrypt(ciphertext: &[u8]) -> Vec<u8> {
    let mut key = KASA_INITIAL_KEY;
    ciphertext
        .iter()
        .map(|&byte| {
            let plain = key ^ byte;
            key = byte;
            plain
        })
        .collect()
}

/// Resolve `host` or `host:port` to a socket address, defaulting to port 9999.
pub fn resolve_address(address: &str) -> Result<SocketAddr, DeviceError> {
    let unreachable = |reason: String| DeviceError::Connection {
        address: address.to_string(),
        reason,
    };

    if let Ok(socket) = address.parse::<SocketAddr>() {
        return Ok(socket);
    }

    let candidates = if address.contains(':') {
        address.to_socket_addrs()
    } else {
        (address, KASA_PORT).to_socket_addrs()
    };

    candidates
        .map_err(|e| unreachable(format!("invalid address: {e}")))?
        .next()
        .ok_or_else(|| unreachable("address did not resolve".to_string()))
}

/// Opens [`KasaBulb`]s with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct KasaConnector {
    pub timeout: Duration,
    pub debug_enabled: bool,
}

impl KasaConnector {
    pub fn new(timeout: Duration, debug_enabled: bool) -> Self {
        Self {
            timeout,
            debug_enabled,
        }
    }
}

impl DeviceConnector for KasaConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn LightDevice>, DeviceError> {
        let bulb = KasaBulb::connect(address, self.timeout, self.debug_enabled)?;
        Ok(Box::new(bulb))
    }
}

/// A Kasa bulb reachable over the local network.
#[derive(Debug)]
pub struct KasaBulb {
    address: String,
    socket: SocketAddr,
    timeout: Duration,
    state: LightState,
    temperature_range: (u16, u16),
    debug_enabled: bool,
}

impl KasaBulb {
    /// Resolve the address and fetch the bulb's system info.
    ///
    /// Any failure here is reported as a connection error: the bulb is either
    /// absent or not a bulb we can drive.
    pub fn connect(
        address: &str,
        timeout: Duration,
        debug_enabled: bool,
    ) -> Result<Self, DeviceError> {
        let socket = resolve_address(address)?;
        let mut bulb = Self {
            address: address.to_string(),
            socket,
            timeout,
            state: LightState::default(),
            temperature_range: (MINIMUM_TEMP, MAXIMUM_TEMP),
            debug_enabled,
        };

        bulb.refresh_state().map_err(|e| match e {
            DeviceError::Connection { .. } => e,
            other => DeviceError::Connection {
                address: address.to_string(),
                reason: other.to_string(),
            },
        })?;

        if debug_enabled {
            log_debug!(
                "Connected to '{}' ({}) at {}, {}-{}K",
                bulb.state.alias,
                bulb.state.model,
                bulb.socket,
                bulb.temperature_range.0,
                bulb.temperature_range.1
            );
        }

        Ok(bulb)
    }

    pub fn state(&self) -> &LightState {
        &self.state
    }

    /// One request/response exchange.
    fn request(&self, payload: &Value) -> Result<Value, DeviceError> {
        let body = payload.to_string();
        if self.debug_enabled {
            log_indented!("→ {body}");
        }

        let mut stream = TcpStream::connect_timeout(&self.socket, self.timeout).map_err(|e| {
            DeviceError::Connection {
                address: self.address.clone(),
                reason: e.to_string(),
            }
        })?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(io_error)?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(io_error)?;

        stream.write_all(&encrypt(body.as_bytes())).map_err(io_error)?;

        let mut header = [0u8; 4];
        stream.read_exact(&mut header).map_err(io_error)?;
        let length = u32::from_be_bytes(header) as usize;
        if length > KASA_MAX_RESPONSE_BYTES {
            return Err(DeviceError::Protocol(format!(
                "response length {length} exceeds {KASA_MAX_RESPONSE_BYTES} bytes"
            )));
        }

        let mut ciphertext = vec![0u8; length];
        stream.read_exact(&mut ciphertext).map_err(io_error)?;
        let plaintext = decrypt(&ciphertext);

        if self.debug_enabled {
            log_indented!("← {}", String::from_utf8_lossy(&plaintext));
        }

        serde_json::from_slice(&plaintext)
            .map_err(|e| DeviceError::Protocol(format!("invalid JSON: {e}")))
    }

    /// Send a `transition_light_state` update and fold the reply into the cache.
    fn transition(&mut self, mut fields: serde_json::Map<String, Value>) -> Result<(), DeviceError> {
        fields.insert("transition_period".to_string(), json!(0));
        let payload = json!({
            "smartlife.iot.smartbulb.lightingservice": { "transition_light_state": fields }
        });
        let response = self.request(&payload)?;

        let reply = response
            .get(LIGHTING_SERVICE)
            .and_then(|service| service.get(TRANSITION_LIGHT_STATE))
            .ok_or_else(|| DeviceError::Protocol("missing transition_light_state reply".into()))?;
        check_error_code(reply)?;
        apply_light_state(&mut self.state, reply);
        Ok(())
    }
}

impl LightDevice for KasaBulb {
    fn refresh_state(&mut self) -> Result<LightState, DeviceError> {
        let response = self.request(&json!({ "system": { "get_sysinfo": {} } }))?;
        let sysinfo = response
            .get("system")
            .and_then(|system| system.get("get_sysinfo"))
            .ok_or_else(|| DeviceError::Protocol("missing get_sysinfo reply".into()))?;
        check_error_code(sysinfo)?;

        let light_state = sysinfo.get("light_state").ok_or_else(|| {
            DeviceError::Protocol(format!("device at {} is not a smart bulb", self.address))
        })?;

        let model = sysinfo
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        self.state.alias = sysinfo
            .get("alias")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.temperature_range = temperature_range_for_model(&model);
        self.state.model = model;
        apply_light_state(&mut self.state, light_state);

        Ok(self.state.clone())
    }

    fn is_on(&self) -> bool {
        self.state.is_on
    }

    fn turn_on(&mut self) -> Result<(), DeviceError> {
        let mut fields = serde_json::Map::new();
        fields.insert("on_off".into(), json!(1));
        self.transition(fields)
    }

    fn turn_off(&mut self) -> Result<(), DeviceError> {
        let mut fields = serde_json::Map::new();
        fields.insert("on_off".into(), json!(0));
        self.transition(fields)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DeviceError> {
        let mut fields = serde_json::Map::new();
        fields.insert("brightness".into(), json!(percent.clamp(1, 100)));
        fields.insert("ignore_default".into(), json!(1));
        self.transition(fields)
    }

    fn set_color_temperature(&mut self, kelvin: u16) -> Result<(), DeviceError> {
        let (low, high) = self.temperature_range;
        let mut fields = serde_json::Map::new();
        fields.insert("color_temp".into(), json!(kelvin.clamp(low, high)));
        fields.insert("ignore_default".into(), json!(1));
        self.transition(fields)
    }

    fn temperature_range(&self) -> (u16, u16) {
        self.temperature_range
    }
}

fn io_error(err: io::Error) -> DeviceError {
    DeviceError::Communication(err.to_string())
}

fn check_error_code(reply: &Value) -> Result<(), DeviceError> {
    match reply.get("err_code").and_then(Value::as_i64) {
        Some(0) | None => Ok(()),
        Some(code) => {
            let message = reply
                .get("err_msg")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            Err(DeviceError::Protocol(format!("error {code}: {message}")))
        }
    }
}

// Powered-off bulbs report their levels under `dft_on_state` instead.
fn apply_light_state(state: &mut LightState, light_state: &Value) {
    if let Some(on_off) = light_state.get("on_off").and_then(Value::as_u64) {
        state.is_on = on_off == 1;
    }

    let levels = light_state.get("dft_on_state").unwrap_or(light_state);
    if let Some(brightness) = levels.get("brightness").and_then(Value::as_u64) {
        state.brightness = u8::try_from(brightness).ok();
    }
    if let Some(kelvin) = levels.get("color_temp").and_then(Value::as_u64) {
        state.color_temperature = u16::try_from(kelvin).ok();
    }
}

/// Supported color temperature range by hardware model.
pub fn temperature_range_for_model(model: &str) -> (u16, u16) {
    let family = model.split('(').next().unwrap_or_default();
    match family {
        "KL130" | "KB130" | "LB130" | "LB230" => (2500, 9000),
        "KL120" | "LB120" => (2700, 6500),
        _ => (2500, 6500),
    }
}
