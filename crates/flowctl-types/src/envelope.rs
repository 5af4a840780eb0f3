use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire shape for workflow (and activity) call input: positional `args` plus
/// keyword `kwargs`, matching `{"args":[...],"kwargs":{...}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallEnvelope {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: serde_json::Map<String, Value>,
}

impl CallEnvelope {
    pub fn new(args: Vec<Value>) -> Self {
        Self {
            args,
            kwargs: serde_json::Map::new(),
        }
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("CallEnvelope always serializes")
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_positional_args_envelope() {
        let env = CallEnvelope::new(vec![json!(1), json!(2)]);
        assert_eq!(env.encode(), r#"{"args":[1,2],"kwargs":{}}"#);
    }

    #[test]
    fn decodes_envelope_missing_kwargs() {
        let env = CallEnvelope::decode(r#"{"args":[1,2]}"#).unwrap();
        assert_eq!(env.args, vec![json!(1), json!(2)]);
        assert!(env.kwargs.is_empty());
    }
}
