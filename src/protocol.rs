use crate::error::{Result, YeelightError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Control methods understood by the bulbs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    GetProp,
    SetPower,
    Toggle,
    SetBright,
    SetRgb,
    SetCtAbx,
    SetHsv,
    SetName,
}

/// Number of positional parameters a method takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

impl Method {
    /// Wire name, as it also appears in the `support` discovery header
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GetProp => "get_prop",
            Method::SetPower => "set_power",
            Method::Toggle => "toggle",
            Method::SetBright => "set_bright",
            Method::SetRgb => "set_rgb",
            Method::SetCtAbx => "set_ct_abx",
            Method::SetHsv => "set_hsv",
            Method::SetName => "set_name",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Method::GetProp => Arity::AtLeast(1),
            Method::Toggle => Arity::Exactly(0),
            Method::SetName => Arity::Exactly(1),
            Method::SetPower | Method::SetBright | Method::SetRgb | Method::SetCtAbx => {
                Arity::Exactly(3)
            }
            Method::SetHsv => Arity::Exactly(4),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command request, sent as one JSON line
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Request {
    /// Correlation id. Assigned by the channel when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub method: Method,
    pub params: Vec<Value>,
}

impl Request {
    /// Create a new request with no parameters
    pub fn new(method: Method) -> Self {
        Self {
            id: None,
            method,
            params: Vec::new(),
        }
    }

    /// Set the correlation id
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Append one positional parameter
    pub fn param(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Append several positional parameters
    pub fn params<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.params.extend(values.into_iter().map(Into::into));
        self
    }

    /// Check the parameter count against the method's arity
    pub fn validate(&self) -> Result<()> {
        let arity = self.method.arity();
        if arity.accepts(self.params.len()) {
            Ok(())
        } else {
            Err(YeelightError::InvalidParams {
                method: self.method.as_str(),
                expected: arity,
                actual: self.params.len(),
            })
        }
    }

    /// Encode as a single line, terminator included
    pub fn encode(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push_str("\r\n");
        Ok(line)
    }
}

/// Error payload reported by the bulb
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub code: i64,
    pub message: String,
}

/// Successful reply, shaped by the method family that was called
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// `["ok"]` acknowledgement of a control method
    Ack,
    /// `get_prop` values, aligned with the requested property names
    Properties(Vec<String>),
}

/// Either half of a reply: what the bulb returned, or the error it reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `result` payload, validated for the called method
    Success(Payload),
    /// `error` payload
    Failure(ErrorPayload),
}

/// Decoded command reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: u32,
    pub outcome: Outcome,
}

/// Reply as it appears on the wire, before validation
#[derive(Debug, Deserialize)]
struct RawResponse {
    id: Option<u32>,
    result: Option<Vec<Value>>,
    error: Option<ErrorPayload>,
    method: Option<String>,
}

impl Response {
    /// Decode a reply line to `request`, validating the payload shape
    /// against the method family that was called.
    pub fn decode(line: &str, request: &Request) -> Result<Self> {
        let raw: RawResponse = serde_json::from_str(line.trim_end())?;

        let id = match (raw.id, raw.method) {
            (Some(id), _) => id,
            (None, Some(method)) => {
                return Err(YeelightError::InvalidResponse(format!(
                    "expected a reply, got a '{method}' notification"
                )))
            }
            (None, None) => {
                return Err(YeelightError::InvalidResponse("reply has no id".to_string()))
            }
        };

        let outcome = match (raw.result, raw.error) {
            (Some(result), None) => Outcome::Success(Self::payload(result, request)?),
            (None, Some(error)) => Outcome::Failure(error),
            (Some(_), Some(_)) => {
                return Err(YeelightError::InvalidResponse(
                    "reply has both result and error".to_string(),
                ))
            }
            (None, None) => {
                return Err(YeelightError::InvalidResponse(
                    "reply has neither result nor error".to_string(),
                ))
            }
        };

        Ok(Self { id, outcome })
    }

    fn payload(result: Vec<Value>, request: &Request) -> Result<Payload> {
        match request.method {
            Method::GetProp => {
                if result.len() != request.params.len() {
                    return Err(YeelightError::InvalidResponse(format!(
                        "requested {} properties, got {}",
                        request.params.len(),
                        result.len()
                    )));
                }
                result
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| match value {
                        Value::String(s) => Ok(s),
                        other => Err(YeelightError::InvalidResponse(format!(
                            "property {index} is not a string: {other}"
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Payload::Properties)
            }
            _ => match result.as_slice() {
                [Value::String(ok)] if ok == "ok" => Ok(Payload::Ack),
                _ => Err(YeelightError::InvalidResponse(format!(
                    "expected [\"ok\"] for {}, got {:?}",
                    request.method, result
                ))),
            },
        }
    }

    /// Turn a device error into `YeelightError::Device`
    pub fn into_payload(self) -> Result<Payload> {
        match self.outcome {
            Outcome::Success(payload) => Ok(payload),
            Outcome::Failure(ErrorPayload { code, message }) => {
                Err(YeelightError::Device { code, message })
            }
        }
    }

    /// Expect a control acknowledgement
    pub fn into_ack(self) -> Result<()> {
        match self.into_payload()? {
            Payload::Ack => Ok(()),
            Payload::Properties(_) => Err(YeelightError::InvalidResponse(
                "expected acknowledgement, got property list".to_string(),
            )),
        }
    }

    /// Expect exactly `expected` property values
    pub fn into_properties(self, expected: usize) -> Result<Vec<String>> {
        match self.into_payload()? {
            Payload::Properties(values) if values.len() == expected => Ok(values),
            Payload::Properties(values) => Err(YeelightError::InvalidResponse(format!(
                "expected {expected} properties, got {}",
                values.len()
            ))),
            Payload::Ack => Err(YeelightError::InvalidResponse(
                "expected property list, got acknowledgement".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_power() -> Request {
        Request::new(Method::SetPower).params([json!("on"), json!("smooth"), json!(500)])
    }

    #[test]
    fn encodes_single_line() {
        let line = set_power().with_id(7).encode().unwrap();
        assert_eq!(
            line,
            "{\"id\":7,\"method\":\"set_power\",\"params\":[\"on\",\"smooth\",500]}\r\n"
        );
    }

    #[test]
    fn method_names_match_wire_format() {
        assert_eq!(serde_json::to_value(Method::SetCtAbx).unwrap(), json!("set_ct_abx"));
        assert_eq!(serde_json::to_value(Method::GetProp).unwrap(), json!("get_prop"));
        assert_eq!(Method::SetBright.as_str(), "set_bright");
    }

    #[test]
    fn validate_rejects_wrong_arity() {
        let err = Request::new(Method::SetBright).param(50).validate().unwrap_err();
        assert!(matches!(
            err,
            YeelightError::InvalidParams { method: "set_bright", actual: 1, .. }
        ));
        assert!(Request::new(Method::Toggle).validate().is_ok());
        assert!(Request::new(Method::GetProp).validate().is_err());
        assert!(Request::new(Method::GetProp).param("power").validate().is_ok());
    }

    #[test]
    fn decodes_ack() {
        let response =
            Response::decode("{\"id\":7,\"result\":[\"ok\"]}\r\n", &set_power()).unwrap();
        assert_eq!(response.id, 7);
        assert_eq!(response.outcome, Outcome::Success(Payload::Ack));
    }

    #[test]
    fn decodes_properties() {
        let request = Request::new(Method::GetProp).params(["power", "bright"]);
        let response =
            Response::decode("{\"id\":1,\"result\":[\"on\",\"80\"]}", &request).unwrap();
        assert_eq!(
            response.into_properties(2).unwrap(),
            vec!["on".to_string(), "80".to_string()]
        );
    }

    #[test]
    fn property_count_mismatch_is_decode_error() {
        let request = Request::new(Method::GetProp).params(["power", "bright"]);
        let err = Response::decode("{\"id\":1,\"result\":[\"on\"]}", &request).unwrap_err();
        assert!(err.is_decode());

        let err = Response::decode("{\"id\":1,\"result\":[]}", &request).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn non_string_property_is_decode_error() {
        let request = Request::new(Method::GetProp).params(["power", "bright"]);
        let err = Response::decode("{\"id\":1,\"result\":[\"on\",80]}", &request).unwrap_err();
        assert!(matches!(err, YeelightError::InvalidResponse(_)));
    }

    #[test]
    fn device_error_surfaces() {
        let response = Response::decode(
            "{\"id\":3,\"error\":{\"code\":-1,\"message\":\"unsupported method\"}}",
            &set_power(),
        )
        .unwrap();
        match response.into_ack().unwrap_err() {
            YeelightError::Device { code, message } => {
                assert_eq!(code, -1);
                assert_eq!(message, "unsupported method");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn both_or_neither_payload_is_decode_error() {
        let both = "{\"id\":1,\"result\":[\"ok\"],\"error\":{\"code\":1,\"message\":\"x\"}}";
        assert!(Response::decode(both, &set_power()).unwrap_err().is_decode());
        assert!(Response::decode("{\"id\":1}", &set_power()).unwrap_err().is_decode());
    }

    #[test]
    fn notification_is_not_a_reply() {
        let line = "{\"method\":\"props\",\"params\":{\"power\":\"on\"}}";
        assert!(matches!(
            Response::decode(line, &set_power()),
            Err(YeelightError::InvalidResponse(_))
        ));
    }

    #[test]
    fn garbage_is_json_error() {
        assert!(matches!(
            Response::decode("not json", &set_power()),
            Err(YeelightError::Json(_))
        ));
    }
}
